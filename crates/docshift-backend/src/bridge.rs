//! HTTP client for the conversion server
//!
//! Server mode uploads the source document to `POST {base}/convert` and
//! returns the converted bytes. Liveness comes from `GET {base}/convert/health`,
//! which never fails: every problem reads as "unavailable".

use docshift_core::{ConversionError, ConvertedArtifact, Format, HealthStatus, Result, SourceDocument};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for a conversion round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Timeout for a health probe
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    hints: Vec<String>,
}

/// Health body returned by the server
#[derive(Debug, Deserialize)]
struct HealthBody {
    ok: bool,
    #[serde(default)]
    server: Option<HealthStatus>,
}

/// Client for a docshift conversion server
#[derive(Debug, Clone)]
pub struct ServerBridge {
    base_url: String,
    client: Client,
}

impl ServerBridge {
    /// Create a bridge with the default timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::NetworkError`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a bridge with an explicit request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::NetworkError`] if the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConversionError::NetworkError(format!("Failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    /// Server base URL (without trailing slash)
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Convert a document on the server
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::NetworkError`] when the server cannot be
    /// reached and [`ConversionError::ServerError`] when it answers with a
    /// failure.
    pub fn convert(
        &self,
        document: &SourceDocument,
        source: Format,
        target: Format,
    ) -> Result<ConvertedArtifact> {
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(source.mime_type())
            .map_err(|e| ConversionError::NetworkError(format!("Invalid upload MIME type: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("sourceExt", source.extension())
            .text("targetExt", target.extension());

        info!(
            "Uploading {} ({} bytes) for {source} -> {target} conversion",
            document.file_name,
            document.bytes.len()
        );
        let response = self
            .client
            .post(self.url("/convert"))
            .multipart(form)
            .send()
            .map_err(|e| ConversionError::NetworkError(format!("Failed to reach conversion server: {e}")))?;

        let status = response.status();
        if status.is_success() {
            let bytes = response
                .bytes()
                .map_err(|e| ConversionError::NetworkError(format!("Failed to read conversion result: {e}")))?;
            debug!("Server returned {} bytes", bytes.len());
            return Ok(ConvertedArtifact::new(
                bytes.to_vec(),
                target,
                &document.file_name,
            ));
        }

        let body = response.text().unwrap_or_default();
        let error = server_error(status.as_u16(), &body);
        warn!("Server conversion failed with status {status}: {error}");
        Err(error)
    }

    /// Probe the server; failures are reported as unavailable
    #[must_use = "returns the probed health status"]
    pub fn health(&self) -> HealthStatus {
        let response = match self
            .client
            .get(self.url("/convert/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                return HealthStatus::unavailable(format!("Failed to reach conversion server: {e}"))
            }
        };

        let status = response.status();
        let body = response.text().unwrap_or_default();
        let health = match serde_json::from_str::<HealthBody>(&body) {
            Ok(HealthBody {
                server: Some(server),
                ..
            }) => server,
            Ok(HealthBody { ok: true, .. }) => HealthStatus::available(),
            Ok(HealthBody { ok: false, .. }) => {
                HealthStatus::unavailable(format!("Conversion server reported unhealthy ({status})"))
            }
            Err(e) => HealthStatus::unavailable(format!(
                "Unexpected health response ({status}): {e}"
            )),
        };
        debug!("Server health: {health:?}");
        health
    }
}

/// Build the error for a non-success response
fn server_error(status: u16, body: &str) -> ConversionError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => ConversionError::ServerError {
            status: Some(status),
            message: parsed.error,
            hints: parsed.hints,
        },
        Err(_) => {
            let trimmed = body.trim();
            let message = if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            };
            ConversionError::ServerError {
                status: Some(status),
                message,
                hints: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_json() {
        let err = server_error(502, r#"{"error":"soffice not found","hints":["Install LibreOffice"]}"#);
        match err {
            ConversionError::ServerError {
                status,
                message,
                hints,
            } => {
                assert_eq!(status, Some(502));
                assert_eq!(message, "soffice not found");
                assert_eq!(hints, vec!["Install LibreOffice".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_server_error_raw_body() {
        let err = server_error(500, "  boom  ");
        assert_eq!(err.to_string(), "Server conversion failed: boom");
        assert!(err.hints().is_empty());
    }

    #[test]
    fn test_server_error_empty_body() {
        assert!(server_error(413, "").to_string().contains("HTTP 413"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let bridge = ServerBridge::new("http://localhost:8080/").unwrap();
        assert_eq!(bridge.base_url(), "http://localhost:8080");
        assert_eq!(bridge.url("/convert"), "http://localhost:8080/convert");
    }
}
