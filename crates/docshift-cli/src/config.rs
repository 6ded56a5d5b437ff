//! Configuration files (`.docshift.toml`)
//!
//! Precedence, highest first: command-line flags, `./.docshift.toml`,
//! `~/.docshift.toml`, built-in defaults.

use anyhow::{Context, Result};
use colored::Colorize;
use docshift_core::ConversionMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name looked up in the current and home directories
pub const CONFIG_FILE_NAME: &str = ".docshift.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for the convert command
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Base URL of the conversion server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Default mode (client or server)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ConversionMode>,

    /// Render PDF pages as images when converting PDF to DOCX
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_layout: Option<bool>,

    /// Directory for converted files (defaults to the input's directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Parse a config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `~/.docshift.toml` and `./.docshift.toml`, project values winning
    pub fn discover() -> Self {
        let user = dirs::home_dir().and_then(|home| Self::load_optional(&home.join(CONFIG_FILE_NAME)));
        let project = Self::load_optional(Path::new(CONFIG_FILE_NAME));
        user.unwrap_or_default().merge(project.unwrap_or_default())
    }

    /// Unreadable files are reported and skipped
    fn load_optional(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("{} {e:#}", "Warning:".yellow().bold());
                None
            }
        }
    }

    /// Field-wise merge: values set in `over` replace those in `self`
    #[must_use]
    pub fn merge(self, over: Self) -> Self {
        Self {
            convert: ConvertConfig {
                server_url: over.convert.server_url.or(self.convert.server_url),
                mode: over.convert.mode.or(self.convert.mode),
                preserve_layout: over.convert.preserve_layout.or(self.convert.preserve_layout),
                output_dir: over.convert.output_dir.or(self.convert.output_dir),
            },
        }
    }
}
