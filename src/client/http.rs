//! HTTP utilities for control-plane REST calls

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::engine::{HttpMethod, TransportError};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body for logging and strip control characters.
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = match body.char_indices().nth(MAX_LOG_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... [truncated, {} bytes total]", &body[..cut], body.len()),
        None => body.to_string(),
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, `error.message`, `error` (string) and
/// `errors[0].message`, then falls back to the sanitized raw body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let candidates = [
            json.get("message"),
            json.pointer("/error/message"),
            json.get("error"),
            json.pointer("/errors/0/message"),
        ];
        if let Some(message) = candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        {
            return Some(message.to_string());
        }
    }

    Some(sanitize_for_log(body))
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn network_error(action: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::network_with_source(format!("{} timed out", action), error);
    }
    TransportError::network_with_source(format!("failed to {}", action), error)
}

/// HTTP client wrapper for control-plane API calls
#[derive(Clone, Debug)]
pub struct ApiHttpClient {
    client: Client,
}

impl ApiHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("restform/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Send one request and return the raw response body.
    pub async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, TransportError> {
        tracing::debug!("{} {}", method.as_str(), url);

        let mut request = self.client.request(to_reqwest(method), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| network_error("send request", e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error("read response body", e))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            // Only the sanitized body reaches the log.
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            let message =
                extract_error_message(&text).unwrap_or_else(|| reason(status).to_string());
            return Err(TransportError::http(status.as_u16(), message).with_body(text.trim()));
        }

        tracing::debug!("{} {} -> {} ({} bytes)", method.as_str(), url, status, bytes.len());
        Ok(bytes.to_vec())
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("request failed")
}

/// Format a transport error for display on the command line.
pub fn format_api_error(error: &TransportError) -> String {
    match error.status() {
        Some(401) => "Authentication failed. Check your API token.".to_string(),
        Some(403) => "Permission denied. The token lacks access to this resource.".to_string(),
        Some(404) => "Resource not found.".to_string(),
        Some(409) => "Resource conflict. The resource may already exist.".to_string(),
        Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
        Some(status) if status >= 500 => {
            "Control plane temporarily unavailable. Please try again.".to_string()
        }
        Some(_) => {
            let message: String = error
                .message()
                .chars()
                .filter(|c| !c.is_control())
                .take(80)
                .collect();
            format!("Invalid request: {}", message)
        }
        None => "Request failed. Check your network connection and endpoint.".to_string(),
    }
}
