//! # docshift backend
//!
//! Client-side conversion for docshift: text extraction from the five
//! supported formats, regeneration into any of them, layout-preserving PDF to
//! DOCX, and the HTTP bridge used for server-mode conversion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docshift_backend::Converter;
//! use docshift_core::{ConvertOptions, Format, SourceDocument};
//!
//! let document = SourceDocument::from_path("notes.rtf")?;
//! let converter = Converter::new();
//! let artifact = converter.convert(&document, Format::Rtf, Format::Pdf, &ConvertOptions::default())?;
//! std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! # Ok::<(), docshift_core::ConversionError>(())
//! ```
//!
//! ## Engines
//!
//! PDF reading goes through [`PdfEngine`] ([`PdfiumEngine`] by default), OCR
//! through [`OcrEngine`] (`TesseractOcr` with the `tesseract` feature) and
//! password entry through [`PasswordPrompt`]. All three can be replaced with
//! test doubles.

pub mod bridge;
pub mod builder;
pub mod charset;
pub mod container;
pub mod converter;
pub mod docx;
pub mod extractor;
pub mod layout;
#[cfg(feature = "tesseract")]
pub mod ocr;
pub mod opendocument;
pub mod pdf;
pub mod pdf_writer;
pub mod pdfium_adapter;
pub mod rtf;
pub mod traits;
pub mod txt;

pub use bridge::ServerBridge;
pub use converter::Converter;
pub use extractor::TextExtractor;
#[cfg(feature = "tesseract")]
pub use ocr::TesseractOcr;
pub use pdf::{needs_ocr, PdfTextExtractor};
pub use pdfium_adapter::PdfiumEngine;
pub use traits::{
    FixedPassword, NoPassword, OcrEngine, PasswordPrompt, PasswordReason, PdfEngine, PdfOpenError,
    PdfPages,
};
