//! Configuration Management
//!
//! Non-secret connection defaults stored on disk. Credentials never end up
//! here; they come from flags or the environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// ManageIQ base URL
    #[serde(default)]
    pub url: Option<String>,
    /// Verify TLS certificates (defaults to true)
    #[serde(default)]
    pub verify_ssl: Option<bool>,
    /// CA bundle used to verify the server
    #[serde(default)]
    pub ca_bundle_path: Option<PathBuf>,
    /// Group to act as
    #[serde(default)]
    pub group: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("miq-vmdb").join("config.json"))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get effective URL (CLI/env > config)
    pub fn effective_url(&self, cli: Option<String>) -> Option<String> {
        cli.or_else(|| self.url.clone())
    }

    /// Get effective TLS verification (CLI opt-out > config > true)
    pub fn effective_verify_ssl(&self, no_verify_flag: bool) -> bool {
        !no_verify_flag && self.verify_ssl.unwrap_or(true)
    }

    /// Get effective CA bundle (CLI > config)
    pub fn effective_ca_bundle(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.ca_bundle_path.clone())
    }

    /// Get effective group (CLI/env > config)
    pub fn effective_group(&self, cli: Option<String>) -> Option<String> {
        cli.or_else(|| self.group.clone())
    }
}
