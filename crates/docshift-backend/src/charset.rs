//! Character mappings
//!
//! Windows-1252 (WinAnsi) is used by RTF hex escapes on the way in and by the
//! PDF writer's standard Helvetica font on the way out. [`xml_text`] filters
//! text for the DOCX and ODT writers.

use std::borrow::Cow;

/// Code points for 0x80..=0x9F (None where the code page is undefined)
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20ac}'),
    None,
    Some('\u{201a}'),
    Some('\u{0192}'),
    Some('\u{201e}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02c6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017d}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201c}'),
    Some('\u{201d}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02dc}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203a}'),
    Some('\u{0153}'),
    None,
    Some('\u{017e}'),
    Some('\u{0178}'),
];

/// Decode one byte (undefined positions fall back to Latin-1)
#[inline]
#[must_use]
pub fn decode_cp1252(byte: u8) -> char {
    match byte {
        0x80..=0x9f => CP1252_HIGH[usize::from(byte - 0x80)].unwrap_or(char::from(byte)),
        _ => char::from(byte),
    }
}

/// Encode one character, `None` when the code page has no slot for it
#[must_use]
pub fn encode_cp1252(ch: char) -> Option<u8> {
    match u32::from(ch) {
        0x20..=0x7e | 0xa0..=0xff => u8::try_from(u32::from(ch)).ok(),
        _ => CP1252_HIGH
            .iter()
            .position(|c| *c == Some(ch))
            .and_then(|i| u8::try_from(i + 0x80).ok()),
    }
}

/// Whether XML 1.0 allows `ch` in character data
fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..)
}

/// Text restricted to characters XML 1.0 can carry
///
/// Form feeds (page breaks in PDF text layers) become line breaks; other
/// control characters and noncharacters `U+FFFE`/`U+FFFF` are dropped.
#[must_use = "returns the filtered text"]
pub fn xml_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .filter_map(|ch| match ch {
                '\u{c}' => Some('\n'),
                c if is_xml_char(c) => Some(c),
                _ => None,
            })
            .collect(),
    )
}
