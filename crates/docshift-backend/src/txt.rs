//! Plain text reading and writing

/// UTF-8 byte order mark
const BOM: &str = "\u{feff}";

/// Decode plain text (lossy for invalid UTF-8, BOM stripped)
#[must_use = "returns the decoded text"]
pub fn extract_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix(BOM).unwrap_or(&text).to_string()
}

/// Header followed by the text, verbatim
#[must_use = "returns the encoded document"]
pub fn write_text(header: &str, text: &str) -> Vec<u8> {
    let mut out = String::with_capacity(header.len() + text.len());
    out.push_str(header);
    out.push_str(text);
    out.into_bytes()
}
