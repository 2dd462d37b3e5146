//! Transport boundary
//!
//! The engine never talks HTTP itself. It hands a method, a fully-qualified
//! URL and an optional JSON payload to a [`Transport`] and gets back either
//! the raw response body or a [`TransportError`].

use async_trait::async_trait;
use serde_json::Value;

use super::error::{TransportError, UrlError};
use super::step::HttpMethod;

/// Client-side context URL factories resolve endpoints against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    base_url: String,
}

impl ClientContext {
    /// Create a context for the given control-plane base URL.
    ///
    /// The URL must be absolute (`https://host[:port][/prefix]`).
    pub fn new(base_url: &str) -> Result<Self, UrlError> {
        let parsed = url::Url::parse(base_url).map_err(|source| UrlError::Invalid {
            url: base_url.to_string(),
            source,
        })?;

        if parsed.cannot_be_a_base() {
            return Err(UrlError::Invalid {
                url: base_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path onto the base URL. Absolute URLs pass through unchanged.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Authenticated request execution against the control plane.
///
/// Implementations attach authorization, apply timeouts and decide how to
/// log bodies. A flow awaits each call before starting the next step.
#[async_trait]
pub trait Transport: Send + Sync {
    fn context(&self) -> &ClientContext;

    /// Execute one request, returning the raw body (possibly empty).
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<Vec<u8>, TransportError>;
}
