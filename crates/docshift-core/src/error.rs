//! Error types for document conversion operations.
//!
//! A conversion request ends in exactly one terminal error; there are no
//! retries at the dispatcher layer. Extraction problems (missing ZIP parts,
//! malformed markup, a cancelled password prompt) never surface here: the
//! extractor degrades to empty or partial text instead.

use crate::format::Format;
use thiserror::Error;

/// Error types that can occur during document conversion.
///
/// # Examples
///
/// ```rust,ignore
/// use docshift_core::ConversionError;
///
/// match converter.convert(&doc, source, target, &options) {
///     Ok(artifact) => std::fs::write(artifact.file_name, artifact.bytes)?,
///     Err(e) if e.is_policy() => eprintln!("Not allowed: {e}"),
///     Err(e) => {
///         eprintln!("Conversion failed: {e}");
///         for hint in e.hints() {
///             eprintln!("  hint: {hint}");
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Server mode was requested while the last known health status says the
    /// conversion server is unavailable. No network call was made.
    #[error("Server conversion is unavailable: {0}")]
    ServerUnavailable(String),

    /// The (source, target) pair is permanently blocked in server mode.
    #[error(
        "Server conversion from {source_format} to {target} is not supported. \
         Use client mode, or enable layout preservation for PDF to DOCX"
    )]
    BlockedPair {
        /// Requested source format
        source_format: Format,
        /// Requested target format
        target: Format,
    },

    /// Format detection or unsupported format error.
    #[error("Format detection error: {0}")]
    FormatError(String),

    /// A PDF or OCR engine could not be loaded or failed outright.
    #[error("Engine error: {0}")]
    EngineError(String),

    /// The target document could not be generated.
    #[error("Build error: {0}")]
    BuildError(String),

    /// The conversion server answered with a failure.
    #[error("Server conversion failed: {message}")]
    ServerError {
        /// HTTP status returned by the server, when one was received
        status: Option<u16>,
        /// Error text reported by the server
        message: String,
        /// Remediation hints reported by the server
        hints: Vec<String>,
    },

    /// The conversion server could not be reached.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ConversionError {
    /// Whether this is a policy rejection the user can fix by changing the
    /// mode or options
    #[inline]
    #[must_use = "returns whether the error is a policy rejection"]
    pub const fn is_policy(&self) -> bool {
        matches!(self, Self::ServerUnavailable(_) | Self::BlockedPair { .. })
    }

    /// Remediation hints attached to the error
    #[must_use = "returns the remediation hints"]
    pub fn hints(&self) -> &[String] {
        match self {
            Self::ServerError { hints, .. } => hints,
            _ => &[],
        }
    }
}

/// Type alias for [`Result<T, ConversionError>`].
pub type Result<T> = std::result::Result<T, ConversionError>;
