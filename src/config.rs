//! Configuration Management
//!
//! Handles persistent configuration storage for restform.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::DEFAULT_TIMEOUT;

/// Environment variable holding the control-plane endpoint.
pub const ENDPOINT_ENV: &str = "RESTFORM_URL";

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Control-plane base URL
    #[serde(default)]
    pub endpoint: Option<String>,
    /// File holding the API token
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Default log level when `--log-level` is not given
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("restform").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path. Missing or malformed files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Get effective endpoint (CLI > config > RESTFORM_URL > default)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> String {
        Self::pick_endpoint(cli, self.endpoint.as_deref(), std::env::var(ENDPOINT_ENV).ok())
    }

    fn pick_endpoint(cli: Option<&str>, file: Option<&str>, env: Option<String>) -> String {
        cli.filter(|e| !e.trim().is_empty())
            .or(file.filter(|e| !e.trim().is_empty()))
            .map(str::to_string)
            .or(env.filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Set endpoint and save
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        self.endpoint = Some(endpoint.to_string());
        self.save()
    }
}
