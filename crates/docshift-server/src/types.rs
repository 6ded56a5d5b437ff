//! API response types

use crate::office::OfficeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docshift_core::HealthStatus;
use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

/// Extra health information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDetails {
    /// Binary that ran (or failed) the probe conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
}

/// Body of `GET /convert/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub server: HealthStatus,
    pub details: HealthDetails,
}

/// Handler failure rendered as `{error, hints?}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                hints: Vec::new(),
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.body.hints.push(hint.into());
        self
    }
}

/// Office-suite failures are 502, internal I/O failures 500
impl From<OfficeError> for ApiError {
    fn from(err: OfficeError) -> Self {
        let status = if err.is_internal() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_GATEWAY
        };
        Self {
            status,
            body: ErrorResponse {
                error: err.to_string(),
                hints: err.hints(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
