//! Format catalog
//!
//! This module defines the [`Format`] enum which represents the five document
//! formats docshift can read and write, together with their file extensions
//! and MIME types.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Format {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text
    Txt,
    /// Rich Text Format (.rtf)
    Rtf,
    /// `OpenDocument` Text (.odt)
    Odt,
}

impl Format {
    /// Every catalog format, in display order
    pub const ALL: [Self; 5] = [Self::Pdf, Self::Docx, Self::Txt, Self::Rtf, Self::Odt];

    /// Look up a format by file extension (case-insensitive, leading dot allowed)
    #[must_use = "returns the detected format, if any"]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.');
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" => Some(Self::Txt),
            "rtf" => Some(Self::Rtf),
            "odt" => Some(Self::Odt),
            _ => None,
        }
    }

    /// Infer the format from a path's extension
    #[must_use = "returns the detected format, if any"]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Infer the format from an uploaded file name
    #[inline]
    #[must_use = "returns the detected format, if any"]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::from_path(Path::new(name))
    }

    /// Canonical file extension (without the dot)
    #[inline]
    #[must_use = "returns the file extension"]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Rtf => "rtf",
            Self::Odt => "odt",
        }
    }

    /// MIME type used for downloads and HTTP responses
    #[inline]
    #[must_use = "returns the MIME type"]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Txt => "text/plain",
            Self::Rtf => "application/rtf",
            Self::Odt => "application/vnd.oasis.opendocument.text",
        }
    }

    /// Whether the format is a ZIP container on disk
    #[inline]
    #[must_use = "returns whether the format is a ZIP container"]
    pub const fn is_zip_container(&self) -> bool {
        matches!(self, Self::Docx | Self::Odt)
    }
}

impl std::fmt::Display for Format {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Txt => "TXT",
            Self::Rtf => "RTF",
            Self::Odt => "ODT",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    /// Accepts a label (`PDF`) or an extension (`pdf`, `.pdf`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            format!("Unknown format '{s}'. Expected one of: pdf, docx, txt, rtf, odt")
        })
    }
}

/// Target formats that may be offered for a given source
///
/// The source format itself is never part of the result.
#[must_use = "returns the list of valid target formats"]
pub fn available_targets(source: Format) -> Vec<Format> {
    Format::ALL.into_iter().filter(|f| *f != source).collect()
}

/// Resolve a target selection so that it never collides with the source
///
/// Returns `requested` unchanged when it differs from `source`, otherwise the
/// first catalog format that does.
#[must_use = "returns the adjusted target format"]
pub fn adjust_target(source: Format, requested: Format) -> Format {
    if requested != source {
        return requested;
    }
    let adjusted = available_targets(source)[0];
    tracing::debug!(%source, %requested, %adjusted, "target collided with source, adjusted");
    adjusted
}
