//! Server-conversion availability

use serde::{Deserialize, Serialize};

/// Liveness of the office-suite conversion path
///
/// Refreshed on demand; readers take whatever was written last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether server conversion can be used
    pub available: bool,
    /// Human-readable detail (error text when unavailable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    /// Server reported healthy
    #[must_use = "creates a health status"]
    pub const fn available() -> Self {
        Self {
            available: true,
            message: None,
        }
    }

    /// Server unavailable, with the reason
    #[must_use = "creates a health status"]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: Some(message.into()),
        }
    }

    /// Status before any probe ran
    #[must_use = "creates a health status"]
    pub fn unknown() -> Self {
        Self::unavailable("Server health has not been checked yet")
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::unknown()
    }
}
