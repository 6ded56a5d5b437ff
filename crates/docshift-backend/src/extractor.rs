//! Text extraction dispatch by source format
//!
//! Extraction degrades instead of failing: a malformed package or markup
//! yields empty text and a warning. The only error is an unavailable PDF
//! engine.

use crate::pdf::PdfTextExtractor;
use crate::traits::{OcrEngine, PasswordPrompt, PdfEngine};
use crate::{docx, opendocument, rtf, txt};
use docshift_core::{Format, Result, SourceDocument};
use tracing::{debug, warn};

/// Extracts plain text from any supported source format
pub struct TextExtractor<'e> {
    pdf: PdfTextExtractor<'e>,
}

impl<'e> TextExtractor<'e> {
    /// Create an extractor over the given engines
    #[must_use = "creates a text extractor"]
    pub fn new(
        pdf_engine: &'e dyn PdfEngine,
        ocr: Option<&'e dyn OcrEngine>,
        prompt: &'e dyn PasswordPrompt,
    ) -> Self {
        Self {
            pdf: PdfTextExtractor::new(pdf_engine, ocr, prompt),
        }
    }

    /// Extract the text of `document`, read as `format`
    ///
    /// # Errors
    ///
    /// Returns [`docshift_core::ConversionError::EngineError`] if a PDF source
    /// needs the PDF engine and it cannot be loaded.
    pub fn extract(&self, document: &SourceDocument, format: Format) -> Result<String> {
        let bytes = document.bytes.as_slice();
        let text = match format {
            Format::Txt => txt::extract_text(bytes),
            Format::Rtf => rtf::extract_text(bytes),
            Format::Docx => degrade(format, &document.file_name, docx::extract_text(bytes)),
            Format::Odt => degrade(format, &document.file_name, opendocument::extract_text(bytes)),
            Format::Pdf => self.pdf.extract(bytes)?,
        };
        debug!(
            "Extracted {} characters from {} ({format})",
            text.chars().count(),
            document.file_name
        );
        Ok(text)
    }
}

fn degrade(format: Format, file_name: &str, result: Result<String>) -> String {
    result.unwrap_or_else(|e| {
        warn!("Could not read {format} content of {file_name}: {e}");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::test_support::FakePdf;
    use crate::traits::NoPassword;

    fn extract(name: &str, bytes: &[u8], format: Format) -> String {
        let pdf = FakePdf::new(&["A PDF page with a real text layer on it."]);
        let extractor = TextExtractor::new(&pdf, None, &NoPassword);
        extractor
            .extract(&SourceDocument::new(name, bytes.to_vec()), format)
            .unwrap()
    }

    #[test]
    fn test_txt_passthrough() {
        assert_eq!(extract("a.txt", b"hello\nworld", Format::Txt), "hello\nworld");
    }

    #[test]
    fn test_rtf_dispatch() {
        assert_eq!(extract("a.rtf", br"{\rtf1 Hi\par there}", Format::Rtf), "Hi\nthere");
    }

    #[test]
    fn test_pdf_dispatch() {
        assert_eq!(
            extract("a.pdf", b"%PDF", Format::Pdf),
            "A PDF page with a real text layer on it."
        );
    }

    #[test]
    fn test_malformed_docx_degrades_to_empty() {
        assert_eq!(extract("a.docx", b"not a zip", Format::Docx), "");
    }

    #[test]
    fn test_malformed_odt_degrades_to_empty() {
        assert_eq!(extract("a.odt", b"PK\x03\x04 truncated", Format::Odt), "");
    }

    #[test]
    fn test_declared_format_wins_over_name() {
        // A .docx name carrying RTF bytes is read as RTF when declared so
        assert_eq!(extract("a.docx", br"{\rtf1 text}", Format::Rtf), "text");
    }
}
