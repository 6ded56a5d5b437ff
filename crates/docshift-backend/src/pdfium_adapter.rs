//! `PDFium` implementation of the PDF engine traits
//!
//! The library is bound on first use: a copy next to the working directory
//! wins, then the system-wide install. Binding failure is an engine error,
//! not an unreadable document.

use crate::traits::{PdfEngine, PdfOpenError, PdfPages};
use docshift_core::ConversionError;
use image::DynamicImage;
use once_cell::unsync::OnceCell;
use pdfium_render::prelude::*;

/// PDF engine backed by `pdfium-render`
#[derive(Default)]
pub struct PdfiumEngine {
    pdfium: OnceCell<Pdfium>,
}

impl std::fmt::Debug for PdfiumEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfiumEngine")
            .field("bound", &self.pdfium.get().is_some())
            .finish()
    }
}

impl PdfiumEngine {
    /// Create an engine; the library is bound lazily
    #[inline]
    #[must_use = "creates a PDF engine"]
    pub fn new() -> Self {
        Self::default()
    }

    fn pdfium(&self) -> Result<&Pdfium, PdfOpenError> {
        self.pdfium.get_or_try_init(|| {
            let bindings =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|e| PdfOpenError::Engine(format!("Failed to bind pdfium library: {e}")))?;
            tracing::debug!("pdfium library bound");
            Ok(Pdfium::new(bindings))
        })
    }
}

/// Map a load failure onto the open-error categories
fn classify_load_error(error: &PdfiumError) -> PdfOpenError {
    match error {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            PdfOpenError::PasswordRequired
        }
        other => PdfOpenError::Invalid(other.to_string()),
    }
}

impl PdfEngine for PdfiumEngine {
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Box<dyn PdfPages + 'a>, PdfOpenError> {
        let pdfium = self.pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| classify_load_error(&e))?;
        Ok(Box::new(PdfiumPages { document }))
    }
}

struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumPages<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, ConversionError> {
        let page_index = PdfPageIndex::try_from(index)
            .map_err(|_| ConversionError::EngineError(format!("Page index {index} out of range")))?;
        self.document
            .pages()
            .get(page_index)
            .map_err(|e| ConversionError::EngineError(format!("Failed to load page {index}: {e}")))
    }
}

impl PdfPages for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        usize::from(self.document.pages().len())
    }

    fn page_text(&self, index: usize) -> Result<String, ConversionError> {
        let page = self.page(index)?;
        let text = page
            .text()
            .map_err(|e| ConversionError::EngineError(format!("Failed to read text of page {index}: {e}")))?;
        Ok(text.all())
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, ConversionError> {
        let page = self.page(index)?;
        let bitmap = page
            .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(scale))
            .map_err(|e| ConversionError::EngineError(format!("Failed to render page {index}: {e}")))?;
        Ok(bitmap.as_image())
    }
}
