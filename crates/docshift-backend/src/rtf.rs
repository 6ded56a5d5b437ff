//! Rich Text Format reading and writing
//!
//! Extraction is a single-pass scanner, not a full RTF parser: destination
//! groups (font and color tables, stylesheets, pictures, headers, `{\*...}`
//! groups) are dropped, paragraph and tab control words become whitespace,
//! escapes are decoded and every other control word is removed.

use crate::charset::decode_cp1252;
use once_cell::sync::Lazy;
use regex::Regex;

/// Groups whose content is never document text
const DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "filetbl",
    "revtbl",
    "object",
];

/// Fixed preamble of every generated document
const PREAMBLE: &str = "{\\rtf1\\ansi\\deff0{\\fonttbl{\\f0 Helvetica;}}\\f0\\fs24 ";

static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("Invalid blank line regex"));

/// Extract approximate plain text from RTF bytes
#[must_use = "returns the extracted text"]
pub fn extract_text(bytes: &[u8]) -> String {
    let source = String::from_utf8_lossy(bytes);
    let chars: Vec<char> = source.chars().collect();
    let mut scanner = Scanner {
        chars: &chars,
        pos: 0,
        out: String::with_capacity(chars.len() / 2),
        unicode_skip: 1,
    };
    scanner.run();

    // High surrogates never followed by their low half
    let out: String = scanner
        .out
        .chars()
        .map(|c| if pending_high_surrogate(c).is_some() { char::REPLACEMENT_CHARACTER } else { c })
        .collect();
    let text = EXCESS_BLANK_LINES.replace_all(&out, "\n\n");
    text.trim_end().to_string()
}

struct Scanner<'a> {
    chars: &'a [char],
    pos: usize,
    out: String,
    /// Fallback characters following each `\uN` (set by `\ucN`)
    unicode_skip: usize,
}

impl Scanner<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(&mut self) {
        while let Some(ch) = self.peek(0) {
            match ch {
                '{' => {
                    if self.is_destination_group() {
                        self.skip_group();
                    } else {
                        self.pos += 1;
                    }
                }
                '}' | '\r' | '\n' => self.pos += 1,
                '\\' => self.control(),
                _ => {
                    self.out.push(ch);
                    self.pos += 1;
                }
            }
        }
    }

    /// Whether the group opening at `pos` is an ignorable destination
    fn is_destination_group(&self) -> bool {
        let mut i = self.pos + 1;
        while self.chars.get(i).is_some_and(|c| c.is_ascii_whitespace()) {
            i += 1;
        }
        if self.chars.get(i) != Some(&'\\') {
            return false;
        }
        if self.chars.get(i + 1) == Some(&'*') {
            return true;
        }
        let start = i + 1;
        let mut end = start;
        while self.chars.get(end).is_some_and(char::is_ascii_alphabetic) {
            end += 1;
        }
        let word: String = self.chars[start..end].iter().collect();
        DESTINATIONS.contains(&word.as_str())
    }

    /// Skip a whole group including nested groups and escaped braces
    fn skip_group(&mut self) {
        let mut depth = 0usize;
        while let Some(ch) = self.peek(0) {
            match ch {
                '\\' => {
                    self.pos += 2;
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn control(&mut self) {
        // Positioned at the backslash
        let Some(next) = self.peek(1) else {
            self.pos += 1;
            return;
        };

        if next.is_ascii_alphabetic() {
            let (word, param) = self.read_control_word();
            self.apply_control_word(&word, param);
            return;
        }

        self.pos += 2;
        match next {
            '\\' | '{' | '}' => self.out.push(next),
            '\'' => {
                if let Some(ch) = self.read_hex_escape() {
                    self.out.push(ch);
                }
            }
            '~' => self.out.push(' '),
            '_' => self.out.push('-'),
            '\r' | '\n' => self.out.push('\n'),
            // \- optional hyphen, \* and other symbols carry no text
            _ => {}
        }
    }

    /// Read `\word[-N][ ]`, leaving `pos` after the delimiter
    fn read_control_word(&mut self) -> (String, Option<i32>) {
        self.pos += 1;
        let start = self.pos;
        while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        let param_start = self.pos;
        if self.peek(0) == Some('-') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let param = if self.pos > param_start {
            let digits: String = self.chars[param_start..self.pos].iter().collect();
            digits.parse::<i32>().ok()
        } else {
            None
        };

        if self.peek(0) == Some(' ') {
            self.pos += 1;
        }
        (word, param)
    }

    /// Decode `hh` after `\'`, leaving `pos` after the two digits
    fn read_hex_escape(&mut self) -> Option<char> {
        let hi = self.peek(0)?.to_digit(16)?;
        let lo = self.peek(1)?.to_digit(16)?;
        self.pos += 2;
        u8::try_from(hi * 16 + lo).ok().map(decode_cp1252)
    }

    fn apply_control_word(&mut self, word: &str, param: Option<i32>) {
        match word {
            "par" | "line" | "sect" | "page" | "row" => self.out.push('\n'),
            "tab" | "cell" => self.out.push('\t'),
            "emdash" => self.out.push('\u{2014}'),
            "endash" => self.out.push('\u{2013}'),
            "bullet" => self.out.push('\u{2022}'),
            "lquote" => self.out.push('\u{2018}'),
            "rquote" => self.out.push('\u{2019}'),
            "ldblquote" => self.out.push('\u{201c}'),
            "rdblquote" => self.out.push('\u{201d}'),
            "uc" => {
                self.unicode_skip = param.and_then(|n| usize::try_from(n).ok()).unwrap_or(1);
            }
            "u" => {
                if let Some(n) = param {
                    self.push_unicode(n);
                    self.skip_fallback();
                }
            }
            _ => {}
        }
    }

    fn push_unicode(&mut self, value: i32) {
        // Values above 32767 are written as negative signed 16-bit integers
        let unit = if value < 0 { value + 65_536 } else { value };
        let Ok(unit) = u16::try_from(unit) else {
            return;
        };

        if (0xdc00..0xe000).contains(&unit) {
            // Low surrogate: combine with a pending high surrogate
            if let Some(high) = self.out.pop() {
                if let Some(code) = pending_high_surrogate(high) {
                    let combined = 0x10000 + ((code - 0xd800) << 10) + (u32::from(unit) - 0xdc00);
                    if let Some(ch) = char::from_u32(combined) {
                        self.out.push(ch);
                    }
                    return;
                }
                self.out.push(high);
            }
            return;
        }

        if (0xd800..0xdc00).contains(&unit) {
            // Held in the private-use marker range until the low half arrives
            if let Some(marker) = char::from_u32(PENDING_BASE + (u32::from(unit) - 0xd800)) {
                self.out.push(marker);
            }
            return;
        }

        if let Some(ch) = char::from_u32(u32::from(unit)) {
            self.out.push(ch);
        }
    }

    /// Skip the ANSI fallback characters that follow `\uN`
    fn skip_fallback(&mut self) {
        for _ in 0..self.unicode_skip {
            match self.peek(0) {
                Some('\\') if self.peek(1) == Some('\'') => {
                    self.pos += 4.min(self.chars.len() - self.pos);
                }
                Some('\\' | '{' | '}') | None => return,
                Some(_) => self.pos += 1,
            }
        }
    }
}

/// Supplementary private-use plane holds unpaired high surrogates
const PENDING_BASE: u32 = 0x10_fc00;

fn pending_high_surrogate(ch: char) -> Option<u32> {
    let value = u32::from(ch);
    (PENDING_BASE..PENDING_BASE + 0x400)
        .contains(&value)
        .then(|| value - PENDING_BASE + 0xd800)
}

/// Generate an RTF document from header and body text
#[must_use = "returns the encoded document"]
pub fn write_rtf(header: &str, text: &str) -> Vec<u8> {
    let mut out = String::with_capacity(PREAMBLE.len() + header.len() + text.len() + 16);
    out.push_str(PREAMBLE);
    escape_into(&mut out, header);
    escape_into(&mut out, text);
    out.push('}');
    out.into_bytes()
}

fn escape_into(out: &mut String, text: &str) {
    let mut units = [0u16; 2];
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\r' => {}
            '\n' => out.push_str("\\par\n"),
            '\t' => out.push_str("\\tab "),
            c if u32::from(c) > 0x7f => {
                for unit in c.encode_utf16(&mut units).iter() {
                    // RTF takes signed 16-bit values
                    let signed = i32::from(*unit as i16);
                    out.push_str(&format!("\\u{signed}?"));
                }
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(rtf: &str) -> String {
        extract_text(rtf.as_bytes())
    }

    #[test]
    fn test_extract_simple() {
        let rtf = r"{\rtf1\ansi\deff0 {\fonttbl {\f0 Times New Roman;}}
\f0\fs60 Hello, World!
}";
        assert_eq!(extract(rtf), "Hello, World!");
    }

    #[test]
    fn test_extract_paragraphs() {
        let rtf = r"{\rtf1\ansi First paragraph.\par Second paragraph.\par}";
        assert_eq!(extract(rtf), "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_extract_drops_tables_and_ignorable_groups() {
        let rtf = r"{\rtf1{\colortbl;\red255\green0\blue0;}{\stylesheet{\s0 Normal;}}{\*\generator Writer;}{\info{\title Secret}}Body}";
        assert_eq!(extract(rtf), "Body");
    }

    #[test]
    fn test_extract_formatting_removed() {
        let rtf = r"{\rtf1 Some {\b bold} and {\i italic\i0} text.}";
        assert_eq!(extract(rtf), "Some bold and italic text.");
    }

    #[test]
    fn test_extract_escapes() {
        let rtf = r"{\rtf1 a\\b \{c\} caf\'e9 \'93q\'94}";
        assert_eq!(extract(rtf), "a\\b {c} caf\u{e9} \u{201c}q\u{201d}");
    }

    #[test]
    fn test_extract_tab_and_line() {
        let rtf = r"{\rtf1 a\tab b\line c}";
        assert_eq!(extract(rtf), "a\tb\nc");
    }

    #[test]
    fn test_extract_unicode_with_fallback() {
        let rtf = r"{\rtf1 na\u239?ve \u-10179?\u-8704?}";
        assert_eq!(extract(rtf), "na\u{ef}ve \u{1f600}");
    }

    #[test]
    fn test_extract_unpaired_high_surrogate_replaced() {
        assert_eq!(extract(r"{\rtf1 a\u-10179?b}"), "a\u{fffd}b");
        assert_eq!(extract(r"{\rtf1 a\u-10179?}"), "a\u{fffd}");
    }

    #[test]
    fn test_extract_unicode_skip_count() {
        let rtf = r"{\rtf1\uc2 x\u8364 EUy}";
        assert_eq!(extract(rtf), "x\u{20ac}y");
    }

    #[test]
    fn test_extract_collapses_blank_lines() {
        let rtf = r"{\rtf1 a\par\par\par\par\par b}";
        assert_eq!(extract(rtf), "a\n\nb");
    }

    #[test]
    fn test_extract_trims_trailing_whitespace() {
        assert_eq!(extract(r"{\rtf1 text\par\par  }"), "text");
    }

    #[test]
    fn test_extract_not_rtf() {
        assert_eq!(extract("plain words"), "plain words");
        assert_eq!(extract(""), "");
    }

    #[test]
    fn test_write_structure() {
        let out = String::from_utf8(write_rtf("", "Hello")).unwrap();
        assert!(out.starts_with("{\\rtf1\\ansi\\deff0{\\fonttbl{\\f0 Helvetica;}}"));
        assert!(out.ends_with("Hello}"));
    }

    #[test]
    fn test_write_escapes() {
        let out = String::from_utf8(write_rtf("", "a{b}\\c\nd")).unwrap();
        assert!(out.contains("a\\{b\\}\\\\c\\par\nd"));
    }

    #[test]
    fn test_write_non_ascii() {
        let out = String::from_utf8(write_rtf("", "caf\u{e9} \u{1f600}")).unwrap();
        assert!(out.contains("caf\\u233?"));
        assert!(out.contains("\\u-10179?\\u-8704?"));
    }

    #[test]
    fn test_write_then_extract_recovers_text() {
        let text = "Line one {x}\nLine \u{e9}two\tend";
        let out = write_rtf("Header\n\n", text);
        assert_eq!(extract_text(&out), format!("Header\n\n{text}"));
    }
}
