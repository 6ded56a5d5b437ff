//! Plain-text PDF generation
//!
//! US Letter pages, 50 pt margins, 12 pt Helvetica (standard Type 1 font,
//! `WinAnsiEncoding`). Lines are word-wrapped to the text width using the
//! Helvetica advance widths and paginated when the bottom margin is reached.

use crate::charset::encode_cp1252;
use docshift_core::{ConversionError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// US Letter width in points
pub const PAGE_WIDTH: f32 = 612.0;
/// US Letter height in points
pub const PAGE_HEIGHT: f32 = 792.0;
/// Margin on every side in points
pub const MARGIN: f32 = 50.0;
/// Body font size in points
pub const FONT_SIZE: f32 = 12.0;
/// Baseline-to-baseline distance
pub const LEADING: f32 = FONT_SIZE * 1.2;

const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const TAB_SPACES: &str = "    ";
const FONT_NAME: &str = "F1";

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a-z
    334, 260, 334, 584, // {..~
];

/// Width used for characters outside the ASCII table
const DEFAULT_WIDTH: u16 = 556;

fn char_width(ch: char) -> f32 {
    let units = match u32::from(ch) {
        code @ 32..=126 => usize::try_from(code - 32)
            .ok()
            .and_then(|i| HELVETICA_WIDTHS.get(i).copied())
            .unwrap_or(DEFAULT_WIDTH),
        _ => DEFAULT_WIDTH,
    };
    f32::from(units) * FONT_SIZE / 1000.0
}

/// Rendered width of a string in points
#[must_use]
pub fn text_width(text: &str) -> f32 {
    text.chars().map(char_width).sum()
}

/// Number of lines that fit between the top and bottom margins
#[must_use]
pub fn lines_per_page() -> usize {
    let first_baseline = PAGE_HEIGHT - MARGIN - FONT_SIZE;
    let extra = ((first_baseline - MARGIN) / LEADING).floor();
    // Positive and far below usize::MAX for any sane page geometry
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let extra = extra.max(0.0) as usize;
    extra + 1
}

/// Word-wrap text to the page text width
///
/// Each input line yields at least one output line (empty lines are kept);
/// words wider than the text width are broken by character.
#[must_use]
pub fn wrap_text(text: &str, max_width: f32) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.replace('\t', TAB_SPACES);
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in line.split_whitespace() {
            let candidate_width = if current.is_empty() {
                text_width(word)
            } else {
                text_width(&current) + char_width(' ') + text_width(word)
            };

            if candidate_width <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                continue;
            }

            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }

            if text_width(word) <= max_width {
                current.push_str(word);
            } else {
                // Over-long word: fill lines character by character
                for ch in word.chars() {
                    if !current.is_empty() && text_width(&current) + char_width(ch) > max_width {
                        out.push(std::mem::take(&mut current));
                    }
                    current.push(ch);
                }
            }
        }
        out.push(current);
    }
    out
}

/// Encode a line for the WinAnsi font, replacing unsupported characters with `?`
fn encode_line(line: &str) -> Vec<u8> {
    line.chars()
        .map(|ch| encode_cp1252(ch).unwrap_or(b'?'))
        .collect()
}

fn page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT_NAME.into(), Object::Real(FONT_SIZE)]),
        Operation::new("TL", vec![Object::Real(LEADING)]),
        Operation::new(
            "Td",
            vec![
                Object::Real(MARGIN),
                Object::Real(PAGE_HEIGHT - MARGIN - FONT_SIZE),
            ],
        ),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        if !line.is_empty() {
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_line(line))],
            ));
        }
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, lines: &[String]) -> Result<ObjectId> {
    let content = page_content(lines)
        .encode()
        .map_err(|e| ConversionError::BuildError(format!("Failed to encode page content: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Generate a PDF from header and body text
///
/// # Errors
///
/// Returns [`ConversionError::BuildError`] if the document cannot be encoded.
pub fn write_pdf(header: &str, text: &str) -> Result<Vec<u8>> {
    let mut body = String::with_capacity(header.len() + text.len());
    body.push_str(header);
    body.push_str(text);
    let lines = wrap_text(&body, TEXT_WIDTH);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_NAME => font_id },
    });

    let per_page = lines_per_page();
    let mut kids: Vec<Object> = Vec::new();
    if lines.is_empty() {
        kids.push(add_page(&mut doc, pages_id, &[])?.into());
    }
    for chunk in lines.chunks(per_page) {
        kids.push(add_page(&mut doc, pages_id, chunk)?.into());
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(PAGE_WIDTH), Object::Real(PAGE_HEIGHT)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ConversionError::BuildError(format!("Failed to write PDF: {e}")))?;
    Ok(out)
}
