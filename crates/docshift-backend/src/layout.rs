//! Layout-preserving PDF to DOCX: one rendered page image per paragraph

use crate::docx;
use crate::pdf::with_unlocked_pdf;
use crate::traits::{PasswordPrompt, PdfEngine, PdfPages, RENDER_SCALE};
use docshift_core::{ConversionError, Result};
use docx_rs::{Docx, Paragraph, Pic, Run};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, info};

/// Display width of every embedded page image, in pixels
pub const PAGE_IMAGE_WIDTH_PX: u32 = 600;

/// English Metric Units per pixel at 96 DPI
const EMU_PER_PX: u32 = 9525;

/// Encode an image as PNG
///
/// # Errors
///
/// Returns [`ConversionError::BuildError`] if encoding fails.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ConversionError::BuildError(format!("Failed to encode image to PNG: {e}")))?;
    Ok(buf.into_inner())
}

/// Display size for a rendered page: fixed width, proportional height
#[must_use]
pub fn display_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 {
        return (PAGE_IMAGE_WIDTH_PX, 0);
    }
    let scaled = (u64::from(height) * u64::from(PAGE_IMAGE_WIDTH_PX) + u64::from(width) / 2)
        / u64::from(width);
    (
        PAGE_IMAGE_WIDTH_PX,
        u32::try_from(scaled).unwrap_or(u32::MAX),
    )
}

/// Display size in EMUs, saturating for extreme aspect ratios
#[must_use]
pub fn emu_size(width: u32, height: u32) -> (u32, u32) {
    (width.saturating_mul(EMU_PER_PX), height.saturating_mul(EMU_PER_PX))
}

struct RenderedPage {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

fn render_pages(pages: &dyn PdfPages) -> Result<Vec<RenderedPage>> {
    let count = pages.page_count();
    (0..count)
        .map(|index| {
            debug!("Rendering page {}/{count} for layout", index + 1);
            let image = pages.render_page(index, RENDER_SCALE)?;
            Ok(RenderedPage {
                png: encode_png(&image)?,
                width: image.width(),
                height: image.height(),
            })
        })
        .collect()
}

/// Render every page and embed the images in a new DOCX package
///
/// A cancelled password prompt or unreadable PDF yields a document without
/// pages.
///
/// # Errors
///
/// Returns an error if the PDF engine is unavailable, a page cannot be
/// rendered, or the package cannot be written.
pub fn build_layout_docx(
    engine: &dyn PdfEngine,
    prompt: &dyn PasswordPrompt,
    bytes: &[u8],
) -> Result<Vec<u8>> {
    let rendered = with_unlocked_pdf(engine, prompt, bytes, render_pages)?
        .transpose()?
        .unwrap_or_default();
    info!("Embedding {} page images", rendered.len());

    let mut document = Docx::new();
    for page in rendered {
        let (width, height) = display_size(page.width, page.height);
        let (cx, cy) = emu_size(width, height);
        let pic = Pic::new(&page.png).size(cx, cy);
        document = document.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
    }
    docx::pack(document)
}
