//! Conversion data model
//!
//! Everything here lives for a single request: the uploaded source document,
//! the options of one conversion attempt, the provenance header and the
//! produced artifact.

use crate::error::Result;
use crate::format::Format;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Original file name, as uploaded
    pub file_name: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// Format declared by the caller, if any
    pub declared_format: Option<Format>,
}

impl SourceDocument {
    /// Create a document from in-memory bytes
    #[must_use = "creates a source document"]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            declared_format: None,
        }
    }

    /// Read a document from disk
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }

    /// Declare the format explicitly instead of relying on the file name
    #[inline]
    #[must_use = "returns the document with a declared format"]
    pub const fn with_declared_format(mut self, format: Format) -> Self {
        self.declared_format = Some(format);
        self
    }

    /// Format inferred from the file name extension
    #[inline]
    #[must_use = "returns the inferred format, if any"]
    pub fn inferred_format(&self) -> Option<Format> {
        Format::from_file_name(&self.file_name)
    }

    /// Declared format, falling back to the inferred one
    #[inline]
    #[must_use = "returns the effective format, if any"]
    pub fn format(&self) -> Option<Format> {
        self.declared_format.or_else(|| self.inferred_format())
    }

    /// File name without its extension
    #[must_use = "returns the file stem"]
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }
}

/// Where the conversion runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Local text extraction and regeneration
    #[default]
    Client,
    /// Delegate to the office-suite conversion server
    Server,
}

impl std::fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
        }
    }
}

/// Provenance block prepended to extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Original file name
    pub original_name: String,
    /// Source format
    pub source: Format,
    /// Target format
    pub target: Format,
    /// Conversion time
    pub timestamp: DateTime<Utc>,
}

impl Header {
    /// Header stamped with an explicit time
    #[must_use = "creates a header"]
    pub fn new(
        original_name: impl Into<String>,
        source: Format,
        target: Format,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            source,
            target,
            timestamp,
        }
    }

    /// Header stamped with the current time
    #[must_use = "creates a header"]
    pub fn now(original_name: impl Into<String>, source: Format, target: Format) -> Self {
        Self::new(original_name, source, target, Utc::now())
    }

    /// Render the header text, including the trailing blank line
    #[must_use = "returns the rendered header"]
    pub fn render(&self) -> String {
        format!(
            "Original file: {}\nConversion: {} -> {}\nDate: {}\n\n",
            self.original_name,
            self.source,
            self.target,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Options of one conversion attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Client or server conversion
    pub mode: ConversionMode,
    /// Embed rendered page images for PDF to DOCX
    pub preserve_layout: bool,
    /// Provenance header; a fresh one is stamped when absent
    pub header: Option<Header>,
}

impl ConvertOptions {
    /// Set the conversion mode
    #[inline]
    #[must_use = "returns options with the mode configured"]
    pub const fn with_mode(mut self, mode: ConversionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Request layout preservation
    #[inline]
    #[must_use = "returns options with layout preservation configured"]
    pub const fn with_preserve_layout(mut self, enable: bool) -> Self {
        self.preserve_layout = enable;
        self
    }

    /// Use a fixed provenance header
    #[inline]
    #[must_use = "returns options with the header configured"]
    pub fn with_header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }
}

/// The produced output payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedArtifact {
    /// File content
    pub bytes: Vec<u8>,
    /// Output format
    pub format: Format,
    /// Suggested download name
    pub file_name: String,
}

impl ConvertedArtifact {
    /// Create an artifact named after the original file
    #[must_use = "creates an artifact"]
    pub fn new(bytes: Vec<u8>, format: Format, original_name: &str) -> Self {
        Self {
            bytes,
            format,
            file_name: suggested_file_name(original_name, format),
        }
    }

    /// MIME type of the payload
    #[inline]
    #[must_use = "returns the MIME type"]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Payload size in bytes
    #[inline]
    #[must_use = "returns the payload size"]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty
    #[inline]
    #[must_use = "returns whether the payload is empty"]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Original stem plus the target extension (`converted` when there is no stem)
#[must_use = "returns the suggested file name"]
pub fn suggested_file_name(original_name: &str, target: Format) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("converted");
    format!("{stem}.{}", target.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_source_document_format_inference() {
        let doc = SourceDocument::new("Report.PDF", vec![1, 2, 3]);
        assert_eq!(doc.inferred_format(), Some(Format::Pdf));
        assert_eq!(doc.format(), Some(Format::Pdf));
        assert_eq!(doc.stem(), "Report");

        let declared = doc.with_declared_format(Format::Txt);
        assert_eq!(declared.format(), Some(Format::Txt));
        assert_eq!(declared.inferred_format(), Some(Format::Pdf));
    }

    #[test]
    fn test_source_document_without_extension() {
        let doc = SourceDocument::new("README", b"hi".to_vec());
        assert_eq!(doc.format(), None);
    }

    #[test]
    fn test_source_document_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let doc = SourceDocument::from_path(&path).unwrap();
        assert_eq!(doc.file_name, "notes.txt");
        assert_eq!(doc.bytes, b"hello");
        assert_eq!(doc.format(), Some(Format::Txt));
    }

    #[test]
    fn test_source_document_missing_file() {
        let result = SourceDocument::from_path("/definitely/not/here.pdf");
        assert!(result.is_err());
    }

    #[test]
    fn test_header_render() {
        let header = Header::new("scan.pdf", Format::Pdf, Format::Txt, fixed_time());
        assert_eq!(
            header.render(),
            "Original file: scan.pdf\nConversion: PDF -> TXT\nDate: 2024-03-01T12:30:00Z\n\n"
        );
    }

    #[test]
    fn test_options_builders() {
        let header = Header::new("a.txt", Format::Txt, Format::Pdf, fixed_time());
        let options = ConvertOptions::default()
            .with_mode(ConversionMode::Server)
            .with_preserve_layout(true)
            .with_header(header.clone());
        assert_eq!(options.mode, ConversionMode::Server);
        assert!(options.preserve_layout);
        assert_eq!(options.header, Some(header));
    }

    #[test]
    fn test_suggested_file_name() {
        assert_eq!(suggested_file_name("report.pdf", Format::Docx), "report.docx");
        assert_eq!(suggested_file_name("a.b.c.rtf", Format::Txt), "a.b.c.txt");
        assert_eq!(suggested_file_name("", Format::Odt), "converted.odt");
    }

    #[test]
    fn test_artifact_mime() {
        let artifact = ConvertedArtifact::new(b"x".to_vec(), Format::Rtf, "memo.txt");
        assert_eq!(artifact.mime_type(), "application/rtf");
        assert_eq!(artifact.file_name, "memo.rtf");
        assert_eq!(artifact.len(), 1);
        assert!(!artifact.is_empty());
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&ConversionMode::Server).unwrap(), "\"server\"");
        assert_eq!(ConversionMode::default(), ConversionMode::Client);
    }
}
