//! Conversion dispatcher
//!
//! [`Converter::convert`] applies the policy gate, then picks exactly one
//! strategy: the conversion server, layout-preserving PDF to DOCX, or text
//! extraction followed by document generation. There are no retries; the
//! first failure is the result.

use crate::bridge::ServerBridge;
use crate::builder;
use crate::extractor::TextExtractor;
use crate::layout;
use crate::pdfium_adapter::PdfiumEngine;
use crate::traits::{NoPassword, OcrEngine, PasswordPrompt, PdfEngine};
use docshift_core::policy;
use docshift_core::{
    ConversionError, ConversionMode, ConvertOptions, ConvertedArtifact, Format, HealthStatus,
    Header, Result, SourceDocument,
};
use tracing::info;

/// Conversion dispatcher owning the engines and the server health cache
pub struct Converter {
    pdf_engine: Box<dyn PdfEngine>,
    ocr: Option<Box<dyn OcrEngine>>,
    prompt: Box<dyn PasswordPrompt>,
    bridge: Option<ServerBridge>,
    health: HealthStatus,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("ocr", &self.ocr.is_some())
            .field("bridge", &self.bridge)
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// Converter with the `PDFium` engine, no OCR, no password prompt and no server
    #[must_use = "creates a converter"]
    pub fn new() -> Self {
        Self {
            pdf_engine: Box::new(PdfiumEngine::new()),
            ocr: None,
            prompt: Box::new(NoPassword),
            bridge: None,
            health: HealthStatus::unknown(),
        }
    }

    /// Replace the PDF engine
    #[must_use = "returns the converter with the PDF engine configured"]
    pub fn with_pdf_engine(mut self, engine: impl PdfEngine + 'static) -> Self {
        self.pdf_engine = Box::new(engine);
        self
    }

    /// Enable OCR fallback for scanned PDF pages
    #[must_use = "returns the converter with OCR configured"]
    pub fn with_ocr(mut self, ocr: impl OcrEngine + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    /// Ask for passwords of protected PDFs
    #[must_use = "returns the converter with the password prompt configured"]
    pub fn with_password_prompt(mut self, prompt: impl PasswordPrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Enable server mode through the given bridge
    #[must_use = "returns the converter with the server bridge configured"]
    pub fn with_bridge(mut self, bridge: ServerBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Last known server health
    #[inline]
    #[must_use]
    pub fn health(&self) -> &HealthStatus {
        &self.health
    }

    /// Replace the cached server health
    pub fn set_health(&mut self, health: HealthStatus) {
        self.health = health;
    }

    /// Probe the server and cache the result
    pub fn refresh_health(&mut self) -> &HealthStatus {
        self.health = match &self.bridge {
            Some(bridge) => bridge.health(),
            None => HealthStatus::unavailable("No conversion server configured"),
        };
        info!(
            "Server health: {}",
            if self.health.available {
                "available"
            } else {
                "unavailable"
            }
        );
        &self.health
    }

    /// Convert `document` from `source` to `target`
    ///
    /// # Errors
    ///
    /// Returns a policy error ([`ConversionError::ServerUnavailable`],
    /// [`ConversionError::BlockedPair`]) before any work is done, or the
    /// failure of the chosen strategy.
    pub fn convert(
        &self,
        document: &SourceDocument,
        source: Format,
        target: Format,
        options: &ConvertOptions,
    ) -> Result<ConvertedArtifact> {
        info!(
            "Converting {} from {source} to {target} ({} mode)",
            document.file_name, options.mode
        );
        policy::gate(options.mode, source, target, &self.health)?;

        if options.mode == ConversionMode::Server {
            let bridge = self.bridge.as_ref().ok_or_else(|| {
                ConversionError::ServerUnavailable("No conversion server configured".to_string())
            })?;
            return bridge.convert(document, source, target);
        }

        if source == Format::Pdf && target == Format::Docx && options.preserve_layout {
            let bytes =
                layout::build_layout_docx(self.pdf_engine.as_ref(), self.prompt.as_ref(), &document.bytes)?;
            return Ok(ConvertedArtifact::new(bytes, target, &document.file_name));
        }

        let extractor = TextExtractor::new(
            self.pdf_engine.as_ref(),
            self.ocr.as_deref(),
            self.prompt.as_ref(),
        );
        let text = extractor.extract(document, source)?;
        let header = options
            .header
            .clone()
            .unwrap_or_else(|| Header::now(document.file_name.clone(), source, target));
        builder::build(&text, target, &header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::test_support::{FakeOcr, FakePdf, ScriptedPrompt};
    use chrono::TimeZone;

    fn fixed_header(name: &str, source: Format, target: Format) -> Header {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        Header::new(name, source, target, ts)
    }

    fn converter() -> Converter {
        Converter::new().with_pdf_engine(FakePdf::new(&["Page text that is long enough to keep."]))
    }

    #[test]
    fn test_client_txt_to_rtf() {
        let doc = SourceDocument::new("notes.txt", b"hello {world}".to_vec());
        let options = ConvertOptions::default().with_header(fixed_header("notes.txt", Format::Txt, Format::Rtf));
        let artifact = converter().convert(&doc, Format::Txt, Format::Rtf, &options).unwrap();
        assert_eq!(artifact.format, Format::Rtf);
        assert_eq!(artifact.file_name, "notes.rtf");
        let out = String::from_utf8(artifact.bytes).unwrap();
        assert!(out.contains("hello \\{world\\}"));
    }

    #[test]
    fn test_txt_to_txt_is_deterministic_with_fixed_header() {
        let doc = SourceDocument::new("a.txt", b"same bytes\n".to_vec());
        let options = ConvertOptions::default().with_header(fixed_header("a.txt", Format::Txt, Format::Txt));
        let conv = converter();
        let first = conv.convert(&doc, Format::Txt, Format::Txt, &options).unwrap();
        let second = conv.convert(&doc, Format::Txt, Format::Txt, &options).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_server_mode_unavailable_fails_without_bridge_call() {
        let doc = SourceDocument::new("a.txt", b"x".to_vec());
        let options = ConvertOptions::default().with_mode(ConversionMode::Server);
        let conv = converter().with_bridge(ServerBridge::new("http://127.0.0.1:9").unwrap());
        let err = conv.convert(&doc, Format::Txt, Format::Pdf, &options).unwrap_err();
        assert!(matches!(err, ConversionError::ServerUnavailable(_)));
    }

    #[test]
    fn test_server_mode_blocked_pair_even_when_healthy() {
        let doc = SourceDocument::new("a.pdf", b"%PDF".to_vec());
        let options = ConvertOptions::default().with_mode(ConversionMode::Server);
        let mut conv = converter().with_bridge(ServerBridge::new("http://127.0.0.1:9").unwrap());
        conv.set_health(HealthStatus::available());
        for target in [Format::Docx, Format::Odt] {
            let err = conv.convert(&doc, Format::Pdf, target, &options).unwrap_err();
            assert!(matches!(err, ConversionError::BlockedPair { .. }));
        }
    }

    #[test]
    fn test_server_mode_without_bridge() {
        let doc = SourceDocument::new("a.txt", b"x".to_vec());
        let options = ConvertOptions::default().with_mode(ConversionMode::Server);
        let mut conv = converter();
        conv.set_health(HealthStatus::available());
        let err = conv.convert(&doc, Format::Txt, Format::Pdf, &options).unwrap_err();
        assert!(err.to_string().contains("No conversion server configured"));
    }

    #[test]
    fn test_refresh_health_without_bridge() {
        let mut conv = converter();
        conv.set_health(HealthStatus::available());
        assert!(!conv.refresh_health().available);
        assert!(!conv.health().available);
    }

    #[test]
    fn test_layout_path_skips_text_extraction() {
        let mut pdf = FakePdf::new(&["ignored text layer"]);
        pdf.page_size = (20, 20);
        let ocr = FakeOcr::returning("never used");
        let conv = Converter::new().with_pdf_engine(pdf).with_ocr(ocr);
        let doc = SourceDocument::new("scan.pdf", b"%PDF".to_vec());
        let options = ConvertOptions::default().with_preserve_layout(true);
        let artifact = conv.convert(&doc, Format::Pdf, Format::Docx, &options).unwrap();
        assert_eq!(artifact.file_name, "scan.docx");
        assert_eq!(crate::docx::extract_text(&artifact.bytes).unwrap(), "");
    }

    #[test]
    fn test_pdf_password_flow_through_converter() {
        let pdf = FakePdf::new(&["Locked page content with enough text."]).with_password("pw");
        let conv = Converter::new()
            .with_pdf_engine(pdf)
            .with_password_prompt(ScriptedPrompt::new(&[Some("pw")]));
        let doc = SourceDocument::new("locked.pdf", b"%PDF".to_vec());
        let options = ConvertOptions::default().with_header(fixed_header("locked.pdf", Format::Pdf, Format::Txt));
        let artifact = conv.convert(&doc, Format::Pdf, Format::Txt, &options).unwrap();
        let out = String::from_utf8(artifact.bytes).unwrap();
        assert!(out.ends_with("Locked page content with enough text."));
    }
}
