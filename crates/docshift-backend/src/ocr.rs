//! Tesseract OCR engine (feature `tesseract`)

use crate::layout::encode_png;
use crate::traits::OcrEngine;
use docshift_core::ConversionError;
use image::DynamicImage;
use leptess::{LepTess, Variable};
use tracing::debug;

/// Fully automatic page segmentation
const PSM_AUTO: &str = "3";

/// OCR engine backed by Tesseract through `leptess`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TesseractOcr {
    language: String,
}

impl TesseractOcr {
    /// Create an engine for the given Tesseract language code (e.g. "eng")
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::EngineError`] if Tesseract cannot be
    /// initialized with the language (missing language data).
    pub fn new(language: impl Into<String>) -> Result<Self, ConversionError> {
        let language = language.into();
        LepTess::new(None, &language).map_err(|e| {
            ConversionError::EngineError(format!(
                "Failed to initialize Tesseract with language '{language}': {e}. \
                 Make sure the language data is installed"
            ))
        })?;
        Ok(Self { language })
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ConversionError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ConversionError::EngineError(format!(
                "Image dimensions must be non-zero (got {}x{})",
                image.width(),
                image.height()
            )));
        }

        let mut lt = LepTess::new(None, &self.language)
            .map_err(|e| ConversionError::EngineError(format!("Failed to initialize Tesseract: {e}")))?;
        lt.set_variable(Variable::TesseditPagesegMode, PSM_AUTO)
            .map_err(|e| ConversionError::EngineError(format!("Failed to set PSM: {e}")))?;

        let png = encode_png(image)?;
        lt.set_image_from_mem(&png)
            .map_err(|e| ConversionError::EngineError(format!("Failed to set image from memory: {e}")))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| ConversionError::EngineError(format!("Failed to run OCR: {e}")))?;
        debug!("Tesseract recognized {} characters", text.len());
        Ok(text)
    }
}
