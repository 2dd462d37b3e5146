//! Shared test helpers: a scripted, recording transport.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use restform::engine::{ClientContext, HttpMethod, Transport, TransportError};

pub const BASE_URL: &str = "https://cp.test";

/// One call seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: HttpMethod,
    pub url: String,
    pub payload: Option<Value>,
}

/// Answers calls from a queue of scripted replies, in order.
///
/// Once the queue is empty every further call fails with a network error.
pub struct MockTransport {
    context: ClientContext,
    replies: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            context: ClientContext::new(BASE_URL).unwrap(),
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn push(mut self, reply: Result<Vec<u8>, TransportError>) -> Self {
        self.replies.get_mut().unwrap().push_back(reply);
        self
    }

    pub fn reply_json(self, body: Value) -> Self {
        self.push(Ok(serde_json::to_vec(&body).unwrap()))
    }

    pub fn reply_raw(self, body: &str) -> Self {
        self.push(Ok(body.as_bytes().to_vec()))
    }

    pub fn reply_empty(self) -> Self {
        self.push(Ok(Vec::new()))
    }

    pub fn reply_status(self, status: u16, message: &str) -> Self {
        self.push(Err(TransportError::http(status, message)))
    }

    pub fn reply_network(self, message: &str) -> Self {
        self.push(Err(TransportError::network(message)))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// `(method, url)` pairs in call order.
    pub fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.calls()
            .into_iter()
            .map(|c| (c.method, c.url))
            .collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn context(&self) -> &ClientContext {
        &self.context
    }

    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            payload: payload.cloned(),
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("no scripted reply")))
    }
}

/// Full URL below the mock base.
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}
