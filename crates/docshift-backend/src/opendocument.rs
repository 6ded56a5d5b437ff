//! `OpenDocument` Text (ODT) reading and writing
//!
//! Reading iterates the `text:p` and `text:h` elements of `content.xml`,
//! one line per element. Writing produces a single namespaced XML document,
//! not a zipped package.

use crate::{charset, container};
use docshift_core::{ConversionError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Content part inside the package
const CONTENT_PART: &str = "content.xml";

const DOCUMENT_OPEN: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"<office:document xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
    r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" "#,
    r#"office:version="1.2" office:mimetype="application/vnd.oasis.opendocument.text">"#,
    "<office:body><office:text>\n",
);

const DOCUMENT_CLOSE: &str = "</office:text></office:body></office:document>\n";

/// ZIP local file header signature
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Extract plain text from ODT bytes
///
/// Zipped packages are read through `content.xml`; anything else is parsed
/// as a flat (single XML document) ODT, the form [`write_odt`] produces.
///
/// # Errors
///
/// Returns an error if the package or `content.xml` cannot be read, or the
/// markup is malformed.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(ZIP_MAGIC) {
        let xml = container::read_part(bytes, CONTENT_PART)?;
        parse_content(&xml)
    } else {
        parse_content(&String::from_utf8_lossy(bytes))
    }
}

/// Longest run a single `text:s` may expand to
const MAX_SPACE_RUN: usize = 1024;

/// `text:s` expands to `text:c` spaces (default 1, capped at [`MAX_SPACE_RUN`])
fn space_count(e: &BytesStart<'_>) -> usize {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"text:c")
        .and_then(|attr| std::str::from_utf8(&attr.value).ok()?.trim().parse::<u64>().ok())
        .map_or(1, |count| usize::try_from(count).unwrap_or(MAX_SPACE_RUN).min(MAX_SPACE_RUN))
}

/// Text content of an ODT `content.xml` (or flat `office:document`) part
pub(crate) fn parse_content(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    // Nesting depth of text:p / text:h (notes and frames can nest paragraphs)
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"text:p" | b"text:h" => depth += 1,
                b"text:s" if depth > 0 => current.push_str(&" ".repeat(space_count(&e))),
                b"text:tab" if depth > 0 => current.push('\t'),
                b"text:line-break" if depth > 0 => current.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"text:p" | b"text:h" if depth == 0 => lines.push(String::new()),
                b"text:s" if depth > 0 => current.push_str(&" ".repeat(space_count(&e))),
                b"text:tab" if depth > 0 => current.push('\t'),
                b"text:line-break" if depth > 0 => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if depth > 0 => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| ConversionError::FormatError(format!("Malformed ODT text: {err}")))?;
                current.push_str(&unescaped);
            }
            Ok(Event::End(e)) => {
                if matches!(e.name().as_ref(), b"text:p" | b"text:h") && depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        lines.push(std::mem::take(&mut current));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConversionError::FormatError(format!(
                    "Malformed ODT markup at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(lines.join("\n").trim_end().to_string())
}

/// Entity-escape `&` and `<`
fn escape_xml(line: &str) -> String {
    line.replace('&', "&amp;").replace('<', "&lt;")
}

/// Generate the flat ODT XML document: one `text:p` per line
#[must_use = "returns the encoded document"]
pub fn write_odt(header: &str, text: &str) -> Vec<u8> {
    let mut out = String::from(DOCUMENT_OPEN);
    let (header, text) = (charset::xml_text(header), charset::xml_text(text));
    for line in header.lines().chain(text.lines()) {
        out.push_str("<text:p>");
        out.push_str(&escape_xml(line));
        out.push_str("</text:p>\n");
    }
    out.push_str(DOCUMENT_CLOSE);
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::test_support::zip_with;

    fn content(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:text>{body}</office:text></office:body></office:document-content>"#
        )
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let xml = content("<text:h>Title</text:h><text:p>Body text</text:p>");
        assert_eq!(parse_content(&xml).unwrap(), "Title\nBody text");
    }

    #[test]
    fn test_inline_tags_keep_text() {
        let xml = content(r#"<text:p>Some <text:span text:style-name="T1">styled</text:span> text</text:p>"#);
        assert_eq!(parse_content(&xml).unwrap(), "Some styled text");
    }

    #[test]
    fn test_spaces_tabs_breaks() {
        let xml = content(r#"<text:p>a<text:s text:c="3"/>b<text:s/>c<text:tab/>d<text:line-break/>e</text:p>"#);
        assert_eq!(parse_content(&xml).unwrap(), "a   b c\td\ne");
    }

    #[test]
    fn test_huge_space_count_is_capped() {
        let xml = content(r#"<text:p>a<text:s text:c="18446744073709551615"/>b<text:s text:c="2000000000"/>c</text:p>"#);
        let text = parse_content(&xml).unwrap();
        let run = " ".repeat(MAX_SPACE_RUN);
        assert_eq!(text, format!("a{run}b{run}c"));
    }

    #[test]
    fn test_empty_paragraph_is_blank_line() {
        let xml = content("<text:p>one</text:p><text:p/><text:p>two</text:p>");
        assert_eq!(parse_content(&xml).unwrap(), "one\n\ntwo");
    }

    #[test]
    fn test_text_outside_paragraphs_ignored() {
        let xml = content("<text:sequence-decls>ignored</text:sequence-decls><text:p>kept</text:p>");
        assert_eq!(parse_content(&xml).unwrap(), "kept");
    }

    #[test]
    fn test_extract_from_package() {
        let xml = content("<text:p>Packaged &amp; zipped</text:p>");
        let bytes = zip_with(&[("mimetype", "application/vnd.oasis.opendocument.text"), ("content.xml", xml.as_str())]);
        assert_eq!(extract_text(&bytes).unwrap(), "Packaged & zipped");
    }

    #[test]
    fn test_write_escapes_and_splits_lines() {
        let out = String::from_utf8(write_odt("H\n\n", "a & b\n<c>")).unwrap();
        assert!(out.contains("xmlns:text=\"urn:oasis:names:tc:opendocument:xmlns:text:1.0\""));
        assert!(out.contains("<text:p>a &amp; b</text:p>"));
        assert!(out.contains("<text:p>&lt;c></text:p>"));
        assert!(out.contains("<text:p></text:p>"));
    }

    #[test]
    fn test_written_document_parses_back() {
        let out = write_odt("", "first\nsecond & third");
        assert_eq!(extract_text(&out).unwrap(), "first\nsecond & third");
    }

    #[test]
    fn test_write_drops_control_characters() {
        let out = write_odt("", "page one\x0cpage two\x01");
        assert!(!out.iter().any(|b| *b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')));
        assert_eq!(extract_text(&out).unwrap(), "page one\npage two");
    }

    #[test]
    fn test_truncated_package_is_error() {
        assert!(extract_text(b"PK\x03\x04 truncated").is_err());
    }
}
