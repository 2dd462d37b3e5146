//! Control-plane client
//!
//! Combines the endpoint context, credentials and HTTP client into the
//! [`Transport`] every flow runs against.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::auth::Credentials;
use super::http::ApiHttpClient;
use crate::engine::{ClientContext, HttpMethod, Transport, TransportError};

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct HttpTransport {
    context: ClientContext,
    http: ApiHttpClient,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(endpoint: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let context = ClientContext::new(endpoint)
            .with_context(|| format!("Invalid control-plane endpoint '{}'", endpoint))?;
        let http = ApiHttpClient::new(timeout)?;

        if credentials.is_anonymous() {
            tracing::warn!("No API token configured, requests are unauthenticated");
        }

        Ok(Self {
            context,
            http,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn context(&self) -> &ClientContext {
        &self.context
    }

    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<Vec<u8>, TransportError> {
        self.http
            .send(method, url, self.credentials.token(), payload)
            .await
    }
}
