//! PDF text extraction with OCR fallback
//!
//! Pages are read one at a time. A page whose text layer is short or mostly
//! non-alphanumeric is treated as scanned: it is rendered and recognized,
//! and non-empty OCR output replaces the text layer.

use crate::traits::{
    OcrEngine, PasswordPrompt, PasswordReason, PdfEngine, PdfOpenError, PdfPages, RENDER_SCALE,
};
use docshift_core::{ConversionError, Result};
use tracing::{debug, warn};

/// Text layers shorter than this (trimmed, in characters) trigger OCR
pub const MIN_TEXT_CHARS: usize = 20;

/// Text layers with fewer than one alphanumeric character in this many trigger OCR
const ALNUM_DENSITY_DIVISOR: usize = 5;

/// Separator between page texts
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Whether a page's text layer looks like a scan
///
/// True when the trimmed text has fewer than [`MIN_TEXT_CHARS`] characters or
/// fewer than 20% of them are alphanumeric.
#[must_use]
pub fn needs_ocr(text: &str) -> bool {
    let trimmed = text.trim();
    let total = trimmed.chars().count();
    if total < MIN_TEXT_CHARS {
        return true;
    }
    let alnum = trimmed.chars().filter(|c| c.is_alphanumeric()).count();
    alnum * ALNUM_DENSITY_DIVISOR < total
}

/// Open a PDF, asking for a password until it opens or the prompt cancels,
/// then run `read` over its pages
///
/// Returns `Ok(None)` when the prompt is cancelled or the document is not a
/// readable PDF.
///
/// # Errors
///
/// Returns [`ConversionError::EngineError`] if the PDF engine itself is
/// unavailable.
pub fn with_unlocked_pdf<T>(
    engine: &dyn PdfEngine,
    prompt: &dyn PasswordPrompt,
    bytes: &[u8],
    read: impl FnOnce(&dyn PdfPages) -> T,
) -> Result<Option<T>> {
    let mut password: Option<String> = None;
    loop {
        let error = match engine.open(bytes, password.as_deref()) {
            Ok(pages) => return Ok(Some(read(pages.as_ref()))),
            Err(error) => error,
        };

        match error {
            PdfOpenError::PasswordRequired => {
                let reason = if password.is_some() {
                    PasswordReason::Incorrect
                } else {
                    PasswordReason::Required
                };
                debug!("PDF is password protected ({reason:?}), prompting");
                match prompt.request_password(reason) {
                    Some(entered) => password = Some(entered),
                    None => {
                        warn!("Password prompt cancelled, no text extracted");
                        return Ok(None);
                    }
                }
            }
            PdfOpenError::Invalid(message) => {
                warn!("Unreadable PDF: {message}");
                return Ok(None);
            }
            PdfOpenError::Engine(message) => return Err(ConversionError::EngineError(message)),
        }
    }
}

/// Extracts text from PDFs through the injected engines
pub struct PdfTextExtractor<'e> {
    engine: &'e dyn PdfEngine,
    ocr: Option<&'e dyn OcrEngine>,
    prompt: &'e dyn PasswordPrompt,
}

impl<'e> PdfTextExtractor<'e> {
    /// Create an extractor; without an OCR engine scanned pages keep their text layer
    #[must_use = "creates a PDF text extractor"]
    pub fn new(
        engine: &'e dyn PdfEngine,
        ocr: Option<&'e dyn OcrEngine>,
        prompt: &'e dyn PasswordPrompt,
    ) -> Self {
        Self {
            engine,
            ocr,
            prompt,
        }
    }

    /// Extract the text of every page, joined by a blank line
    ///
    /// # Errors
    ///
    /// Returns an error only if the PDF engine is unavailable; unreadable or
    /// locked documents yield empty text.
    pub fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = with_unlocked_pdf(self.engine, self.prompt, bytes, |pages| {
            let count = pages.page_count();
            debug!("Extracting text from {count} PDF pages");
            (0..count)
                .map(|index| self.page_text(pages, index))
                .collect::<Vec<_>>()
                .join(PAGE_SEPARATOR)
        })?;
        Ok(text.unwrap_or_default())
    }

    fn page_text(&self, pages: &dyn PdfPages, index: usize) -> String {
        let layer = match pages.page_text(index) {
            Ok(text) => text.replace("\r\n", "\n"),
            Err(e) => {
                warn!("Failed to read text layer of page {}: {e}", index + 1);
                String::new()
            }
        };

        if !needs_ocr(&layer) {
            return layer;
        }

        let Some(ocr) = self.ocr else {
            debug!("Page {} looks scanned but no OCR engine is configured", index + 1);
            return layer;
        };

        debug!("Page {} looks scanned, running OCR", index + 1);
        match pages
            .render_page(index, RENDER_SCALE)
            .and_then(|image| ocr.recognize(&image))
        {
            Ok(recognized) if !recognized.trim().is_empty() => recognized.replace("\r\n", "\n"),
            Ok(_) => {
                debug!("OCR found no text on page {}", index + 1);
                layer
            }
            Err(e) => {
                warn!("OCR failed for page {}: {e}", index + 1);
                layer
            }
        }
    }
}
