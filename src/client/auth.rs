//! Control-plane authentication
//!
//! A static bearer token, resolved once at startup from the command line,
//! the environment or a token file.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "RESTFORM_TOKEN";

/// Bearer credentials for control-plane calls.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    /// No Authorization header at all.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Resolve the token: explicit value > `RESTFORM_TOKEN` > token file.
    ///
    /// A missing default token file means anonymous access; a missing file
    /// that was asked for explicitly is an error.
    pub fn resolve(explicit: Option<&str>, token_file: Option<&Path>) -> Result<Self> {
        Self::resolve_with(explicit, std::env::var(TOKEN_ENV).ok(), token_file)
    }

    fn resolve_with(
        explicit: Option<&str>,
        env: Option<String>,
        token_file: Option<&Path>,
    ) -> Result<Self> {
        if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            return Ok(Self::from_token(token));
        }

        if let Some(token) = env.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            tracing::debug!("Using token from {}", TOKEN_ENV);
            return Ok(Self::from_token(token));
        }

        let path = match token_file {
            Some(path) => path.to_path_buf(),
            None => match default_token_file() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::anonymous()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        let token = content.trim();
        if token.is_empty() {
            tracing::warn!("Token file {} is empty", path.display());
            return Ok(Self::anonymous());
        }

        tracing::debug!("Using token from {}", path.display());
        Ok(Self::from_token(token))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `~/.config/restform/token` on Linux.
pub fn default_token_file() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("restform").join("token"))
}
