//! ZIP container access for the word-processing packages (DOCX, ODT)

use docshift_core::{ConversionError, Result};
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Read one part of a ZIP package as text (lossy UTF-8)
///
/// # Errors
///
/// Returns [`ConversionError::FormatError`] if the bytes are not a ZIP
/// archive or the part is missing, and [`ConversionError::IoError`] if the
/// part cannot be decompressed.
pub fn read_part(bytes: &[u8], name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ConversionError::FormatError(format!("Not a ZIP container: {e}")))?;

    let mut file = archive
        .by_name(name)
        .map_err(|_| ConversionError::FormatError(format!("Missing part: {name}")))?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(String::from_utf8_lossy(&content).into_owned())
}


#[cfg(test)]
mod tests {
    use super::test_support::zip_with;
    use super::*;

    #[test]
    fn test_read_part() {
        let bytes = zip_with(&[("content.xml", "<doc/>"), ("meta.xml", "<meta/>")]);
        assert_eq!(read_part(&bytes, "content.xml").unwrap(), "<doc/>");
    }

    #[test]
    fn test_missing_part() {
        let bytes = zip_with(&[("other.xml", "<x/>")]);
        let err = read_part(&bytes, "content.xml").unwrap_err();
        assert!(matches!(err, ConversionError::FormatError(_)));
        assert!(err.to_string().contains("content.xml"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = read_part(b"definitely not a zip", "content.xml").unwrap_err();
        assert!(matches!(err, ConversionError::FormatError(_)));
    }
}
