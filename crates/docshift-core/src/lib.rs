//! # docshift core
//!
//! Shared vocabulary for the docshift converter: the five supported formats,
//! the per-request data model, the server-mode policy gate and the error type
//! every other crate reports through.
//!
//! ## Quick Start
//!
//! ```rust
//! use docshift_core::{available_targets, adjust_target, Format};
//!
//! let source = Format::from_file_name("report.pdf").unwrap();
//! assert_eq!(source.mime_type(), "application/pdf");
//!
//! // The source is never offered as a target
//! assert!(!available_targets(source).contains(&Format::Pdf));
//!
//! // A colliding selection is moved to the next format
//! assert_eq!(adjust_target(source, Format::Pdf), Format::Docx);
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Extension | MIME |
//! |--------|-----------|------|
//! | PDF | `.pdf` | `application/pdf` |
//! | DOCX | `.docx` | Office Open XML word-processing |
//! | TXT | `.txt` | `text/plain` |
//! | RTF | `.rtf` | `application/rtf` |
//! | ODT | `.odt` | `OpenDocument` text |

pub mod document;
pub mod error;
pub mod format;
pub mod health;
pub mod policy;

pub use document::*;
pub use error::*;
pub use format::*;
pub use health::HealthStatus;
