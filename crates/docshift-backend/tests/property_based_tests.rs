//! Property-Based Tests
//!
//! Builder and extraction invariants:
//! - Every target yields a non-empty artifact with the target's MIME type
//! - TXT output is the rendered header followed by the text, deterministically
//! - The scan heuristic never flags long alphanumeric text
//! - RTF escaping keeps braces and words readable by the RTF reader

use chrono::{TimeZone, Utc};
use docshift_backend::{builder, needs_ocr, rtf};
use docshift_core::{Format, Header};
use proptest::prelude::*;

fn any_format() -> impl Strategy<Value = Format> {
    prop::sample::select(Format::ALL.to_vec())
}

fn fixed_header(source: Format, target: Format) -> Header {
    let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    Header::new("input.bin", source, target, ts)
}

/// Property: any text builds into every target format
#[test]
fn proptest_build_non_empty_with_mime() {
    proptest!(ProptestConfig::with_cases(32), |(
        text in "[a-zA-Z0-9 .,\n]{0,200}",
        source in any_format(),
        target in any_format(),
    )| {
        let artifact = builder::build(&text, target, &fixed_header(source, target)).unwrap();
        prop_assert!(!artifact.is_empty());
        prop_assert_eq!(artifact.format, target);
        prop_assert_eq!(artifact.mime_type(), target.mime_type());
    });
}

/// Property: TXT output is header then text, identical across runs
#[test]
fn proptest_txt_output_is_header_plus_text() {
    proptest!(|(text in "\\PC{0,120}")| {
        let header = fixed_header(Format::Txt, Format::Txt);
        let first = builder::build(&text, Format::Txt, &header).unwrap();
        let second = builder::build(&text, Format::Txt, &header).unwrap();

        prop_assert_eq!(&first.bytes, &second.bytes);
        let expected = format!("{}{text}", header.render());
        prop_assert_eq!(String::from_utf8(first.bytes).unwrap(), expected);
    });
}

/// Property: dense text at or above the length threshold keeps its text layer
#[test]
fn proptest_dense_text_skips_ocr() {
    proptest!(|(text in "[a-zA-Z0-9]{20,300}")| {
        prop_assert!(!needs_ocr(&text));
    });
}

/// Property: short text always falls back to OCR
#[test]
fn proptest_short_text_needs_ocr() {
    proptest!(|(text in "[a-zA-Z0-9 ]{0,19}")| {
        prop_assert!(needs_ocr(&text));
    });
}

/// Property: braces survive RTF escaping and are read back as text
#[test]
fn proptest_rtf_escapes_braces() {
    proptest!(|(word in "[a-zA-Z0-9{}]{1,40}")| {
        let bytes = rtf::write_rtf("", &word);
        let text = rtf::extract_text(&bytes);
        prop_assert!(text.contains(&word), "{:?} not found in {:?}", word, text);
    });
}
