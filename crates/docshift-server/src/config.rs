//! Server configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default bind address
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Default upload limit (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default office-suite run limit in seconds
pub const DEFAULT_SOFFICE_TIMEOUT_SECS: u64 = 120;

/// Default delay between output-file checks in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default number of output-file checks
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;

/// Invalid configuration value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value for {key}: {value:?} ({reason})")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Runtime settings of the conversion server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on (`DOCSHIFT_ADDR`)
    pub addr: String,
    /// Explicit office-suite binary, tried before the platform candidates (`SOFFICE_PATH`)
    pub soffice_path: Option<PathBuf>,
    /// Request body limit (`DOCSHIFT_MAX_UPLOAD_BYTES`)
    pub max_upload_bytes: usize,
    /// Kill the office suite after this long (`DOCSHIFT_SOFFICE_TIMEOUT_SECS`)
    pub soffice_timeout: Duration,
    /// Delay between output checks (`DOCSHIFT_POLL_INTERVAL_MS`)
    pub poll_interval: Duration,
    /// Number of output checks (`DOCSHIFT_POLL_ATTEMPTS`)
    pub poll_attempts: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            soffice_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            soffice_timeout: Duration::from_secs(DEFAULT_SOFFICE_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup` (unset and empty values use defaults)
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable does not parse or is zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            addr: get("DOCSHIFT_ADDR").unwrap_or(defaults.addr),
            soffice_path: get("SOFFICE_PATH").map(PathBuf::from),
            max_upload_bytes: parse_positive(
                "DOCSHIFT_MAX_UPLOAD_BYTES",
                get("DOCSHIFT_MAX_UPLOAD_BYTES"),
                defaults.max_upload_bytes,
            )?,
            soffice_timeout: Duration::from_secs(parse_positive(
                "DOCSHIFT_SOFFICE_TIMEOUT_SECS",
                get("DOCSHIFT_SOFFICE_TIMEOUT_SECS"),
                DEFAULT_SOFFICE_TIMEOUT_SECS,
            )?),
            poll_interval: Duration::from_millis(parse_positive(
                "DOCSHIFT_POLL_INTERVAL_MS",
                get("DOCSHIFT_POLL_INTERVAL_MS"),
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            poll_attempts: parse_positive(
                "DOCSHIFT_POLL_ATTEMPTS",
                get("DOCSHIFT_POLL_ATTEMPTS"),
                DEFAULT_POLL_ATTEMPTS,
            )?,
        })
    }
}

fn parse_positive<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<T>() {
        Ok(parsed) if parsed == T::default() => Err(ConfigError {
            key,
            value,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError {
            key,
            value,
            reason: e.to_string(),
        }),
    }
}
