//! Microsoft Word (DOCX) reading and writing
//!
//! Reading walks `word/document.xml` with `quick-xml`: text runs are
//! concatenated and each paragraph end becomes a newline. Writing uses
//! `docx-rs` with one default-styled paragraph per line.

use crate::{charset, container};
use docshift_core::{ConversionError, Result};
use docx_rs::{Docx, Paragraph, Run};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Cursor;

/// Main document part inside the package
const DOCUMENT_PART: &str = "word/document.xml";

/// Extract plain text from DOCX bytes
///
/// # Errors
///
/// Returns an error if the package or its main part cannot be read, or the
/// markup is malformed.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let xml = container::read_part(bytes, DOCUMENT_PART)?;
    parse_document_xml(&xml)
}

/// Text content of a `word/document.xml` part
fn parse_document_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_run_text = false;
    // Tab stop definitions (w:tabs/w:tab) are not content
    let mut in_tab_stops = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = true,
                b"w:tabs" => in_tab_stops = true,
                b"w:tab" if !in_tab_stops => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if !in_tab_stops => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| ConversionError::FormatError(format!("Malformed DOCX text: {err}")))?;
                text.push_str(&unescaped);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:tabs" => in_tab_stops = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConversionError::FormatError(format!(
                    "Malformed DOCX markup at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text.trim_end().to_string())
}

/// Generate a DOCX package: header lines, then one paragraph per text line
///
/// # Errors
///
/// Returns [`ConversionError::BuildError`] if the package cannot be written.
pub fn write_docx(header: &str, text: &str) -> Result<Vec<u8>> {
    let mut docx = Docx::new();
    let (header, text) = (charset::xml_text(header), charset::xml_text(text));
    for line in header.lines().chain(text.lines()) {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
    }
    pack(docx)
}

/// Serialize a document model into package bytes
pub(crate) fn pack(docx: Docx) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| ConversionError::BuildError(format!("Failed to write DOCX: {e}")))?;
    Ok(cursor.into_inner())
}
