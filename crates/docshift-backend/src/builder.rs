//! Document generation dispatch by target format

use crate::{docx, opendocument, pdf_writer, rtf, txt};
use docshift_core::{ConvertedArtifact, Format, Header, Result};
use tracing::debug;

/// Generate a `target` document holding the rendered header followed by `text`
///
/// # Errors
///
/// Returns [`docshift_core::ConversionError::BuildError`] if the DOCX or PDF
/// writer fails.
pub fn build(text: &str, target: Format, header: &Header) -> Result<ConvertedArtifact> {
    let header_text = header.render();
    let bytes = match target {
        Format::Txt => txt::write_text(&header_text, text),
        Format::Rtf => rtf::write_rtf(&header_text, text),
        Format::Docx => docx::write_docx(&header_text, text)?,
        Format::Odt => opendocument::write_odt(&header_text, text),
        Format::Pdf => pdf_writer::write_pdf(&header_text, text)?,
    };
    debug!("Built {target} document of {} bytes", bytes.len());
    Ok(ConvertedArtifact::new(bytes, target, &header.original_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn header(target: Format) -> Header {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Header::new("notes.txt", Format::Txt, target, ts)
    }

    #[test]
    fn test_txt_is_header_plus_text() {
        let artifact = build("body", Format::Txt, &header(Format::Txt)).unwrap();
        assert_eq!(
            String::from_utf8(artifact.bytes).unwrap(),
            "Original file: notes.txt\nConversion: TXT -> TXT\nDate: 2024-01-02T03:04:05Z\n\nbody"
        );
        assert_eq!(artifact.file_name, "notes.txt");
    }

    #[test]
    fn test_every_target_non_empty_with_mime() {
        for target in Format::ALL {
            let artifact = build("Some text\nover two lines", target, &header(target)).unwrap();
            assert!(!artifact.is_empty(), "{target} artifact is empty");
            assert_eq!(artifact.mime_type(), target.mime_type());
            assert_eq!(artifact.file_name, format!("notes.{}", target.extension()));
        }
    }

    #[test]
    fn test_empty_text_still_builds() {
        for target in Format::ALL {
            let artifact = build("", target, &header(target)).unwrap();
            assert!(!artifact.is_empty());
        }
    }

    #[test]
    fn test_rtf_carries_header() {
        let artifact = build("x", Format::Rtf, &header(Format::Rtf)).unwrap();
        let out = String::from_utf8(artifact.bytes).unwrap();
        assert!(out.contains("Original file: notes.txt\\par"));
    }
}
