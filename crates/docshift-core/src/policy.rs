//! Policy rules for which conversions may run where
//!
//! The gate is evaluated before any work is done. The blocked server pairs are
//! enforced both by the dispatcher and by the conversion endpoint.

use crate::document::ConversionMode;
use crate::error::{ConversionError, Result};
use crate::format::Format;
use crate::health::HealthStatus;

/// Whether a (source, target) pair is refused in server mode
///
/// PDF to DOCX and PDF to ODT never go through the office suite, whatever the
/// server health.
#[inline]
#[must_use = "returns whether the pair is blocked"]
pub const fn is_server_blocked(source: Format, target: Format) -> bool {
    matches!(
        (source, target),
        (Format::Pdf, Format::Docx | Format::Odt)
    )
}

/// Check a request against the server-mode rules
///
/// Client-mode requests always pass. Server-mode requests fail when the last
/// known health is unavailable, then when the pair is blocked.
///
/// # Errors
///
/// Returns [`ConversionError::ServerUnavailable`] or
/// [`ConversionError::BlockedPair`].
pub fn gate(
    mode: ConversionMode,
    source: Format,
    target: Format,
    health: &HealthStatus,
) -> Result<()> {
    if mode != ConversionMode::Server {
        return Ok(());
    }
    if !health.available {
        let reason = health
            .message
            .clone()
            .unwrap_or_else(|| "the conversion server did not report healthy".to_string());
        return Err(ConversionError::ServerUnavailable(reason));
    }
    if is_server_blocked(source, target) {
        return Err(ConversionError::BlockedPair {
            source_format: source,
            target,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_pairs() {
        assert!(is_server_blocked(Format::Pdf, Format::Docx));
        assert!(is_server_blocked(Format::Pdf, Format::Odt));
        assert!(!is_server_blocked(Format::Pdf, Format::Txt));
        assert!(!is_server_blocked(Format::Docx, Format::Pdf));
        assert!(!is_server_blocked(Format::Odt, Format::Docx));
    }

    #[test]
    fn test_client_mode_always_passes() {
        let down = HealthStatus::unavailable("down");
        assert!(gate(ConversionMode::Client, Format::Pdf, Format::Docx, &down).is_ok());
    }

    #[test]
    fn test_unavailable_checked_first() {
        let down = HealthStatus::unavailable("soffice missing");
        let err = gate(ConversionMode::Server, Format::Pdf, Format::Docx, &down).unwrap_err();
        match err {
            ConversionError::ServerUnavailable(msg) => assert_eq!(msg, "soffice missing"),
            other => panic!("Expected ServerUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_blocked_pair_when_healthy() {
        let up = HealthStatus::available();
        let err = gate(ConversionMode::Server, Format::Pdf, Format::Odt, &up).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::BlockedPair {
                source_format: Format::Pdf,
                target: Format::Odt
            }
        ));
    }

    #[test]
    fn test_allowed_server_pair() {
        let up = HealthStatus::available();
        assert!(gate(ConversionMode::Server, Format::Docx, Format::Pdf, &up).is_ok());
    }
}
