//! Engine error types
//!
//! Typed errors raised by transports, records, schema adapters and URL
//! factories, plus the flow-level error that wraps them with the resource
//! name and operation kind.

use thiserror::Error;

use super::step::OperationKind;

/// Boxed error used for opaque sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a [`Transport`](super::transport::Transport) call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The control plane answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Raw response body, when it said more than `message`.
        body: Option<String>,
    },

    /// The request never produced an HTTP response (connection, TLS, timeout,
    /// body encoding). Never matched by request error handlers.
    #[error("transport failure: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl TransportError {
    /// Create an HTTP error with the given status and message.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Attach the raw response body to an HTTP error.
    pub fn with_body(self, raw: impl Into<String>) -> Self {
        match self {
            Self::Http {
                status, message, ..
            } => {
                let raw = raw.into();
                let body = (!raw.trim().is_empty() && raw != message).then_some(raw);
                Self::Http {
                    status,
                    message,
                    body,
                }
            }
            network => network,
        }
    }

    /// Create a network error without an underlying source.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error wrapping its cause.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// HTTP status code, if the control plane answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network { .. } => None,
        }
    }

    /// The error message without the status prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Http { message, .. } | Self::Network { message, .. } => message,
        }
    }

    /// Raw response body of an HTTP error, if kept.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } => body.as_deref(),
            Self::Network { .. } => None,
        }
    }

    /// Whether the message or the raw body mentions `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.message().contains(needle) || self.body().is_some_and(|b| b.contains(needle))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Status codes reported by RPC-style backends that wrap their outcome in a
/// response envelope instead of using HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCode {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    PermissionDenied,
    Unavailable,
    Internal,
}

impl RpcCode {
    /// Parse the status string used in response envelopes (`NOT_FOUND`, ...).
    pub fn from_status(status: &str) -> Option<Self> {
        match status.to_ascii_uppercase().as_str() {
            "NOT_FOUND" => Some(Self::NotFound),
            "ALREADY_EXISTS" => Some(Self::AlreadyExists),
            "INVALID_ARGUMENT" => Some(Self::InvalidArgument),
            "PERMISSION_DENIED" => Some(Self::PermissionDenied),
            "UNAVAILABLE" => Some(Self::Unavailable),
            "INTERNAL" => Some(Self::Internal),
            _ => None,
        }
    }
}

/// Protocol-level failure status.
#[derive(Debug, Clone, Error)]
#[error("rpc status {code:?}: {message}")]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == RpcCode::NotFound
    }
}

/// Error raised while reading or writing record attributes.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Stored value has a different type than the key declares.
    #[error("attribute '{name}' expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A required attribute is absent or null.
    #[error("attribute '{name}' is required")]
    Missing { name: String },
}

/// Error raised by schema readers and writers.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload lacks a field the writer depends on.
    #[error("payload has no '{field}' field")]
    MissingField { field: String },

    #[error("{0}")]
    Invalid(String),
}

/// Error raised while resolving an endpoint.
#[derive(Debug, Error)]
pub enum UrlError {
    /// Identity-based URL requested before the record has an identity.
    #[error("resource has no identity yet")]
    MissingId,

    /// Template placeholder with no attribute value on the record.
    #[error("no value for placeholder '{0}'")]
    MissingPlaceholder(String),

    #[error("invalid endpoint '{url}': {source}")]
    Invalid {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Unrecovered failure of a flow, tagged with the resource and the kind of
/// the step that failed.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("unable to build {operation} payload for {resource}")]
    Marshal {
        resource: String,
        operation: OperationKind,
        #[source]
        source: SchemaError,
    },

    #[error("unable to apply {operation} response to {resource}")]
    Unmarshal {
        resource: String,
        operation: OperationKind,
        #[source]
        source: SchemaError,
    },

    #[error("unable to resolve {operation} endpoint for {resource}")]
    Url {
        resource: String,
        operation: OperationKind,
        #[source]
        source: UrlError,
    },

    #[error("{operation} {resource} failed")]
    Request {
        resource: String,
        operation: OperationKind,
        #[source]
        source: TransportError,
    },

    #[error("{operation} {resource} failed")]
    Callback {
        resource: String,
        operation: OperationKind,
        #[source]
        source: BoxError,
    },

    #[error("{operation} is not supported by {resource}")]
    Unsupported {
        resource: String,
        operation: OperationKind,
    },
}

impl FlowError {
    pub fn resource(&self) -> &str {
        match self {
            Self::Marshal { resource, .. }
            | Self::Unmarshal { resource, .. }
            | Self::Url { resource, .. }
            | Self::Request { resource, .. }
            | Self::Callback { resource, .. }
            | Self::Unsupported { resource, .. } => resource,
        }
    }

    pub fn operation(&self) -> OperationKind {
        match self {
            Self::Marshal { operation, .. }
            | Self::Unmarshal { operation, .. }
            | Self::Url { operation, .. }
            | Self::Request { operation, .. }
            | Self::Callback { operation, .. }
            | Self::Unsupported { operation, .. } => *operation,
        }
    }

    /// The transport error behind a request failure, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Request { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_status() {
        assert_eq!(TransportError::http(404, "gone").status(), Some(404));
        assert!(TransportError::http(404, "gone").is_not_found());
        assert!(TransportError::http(409, "exists").is_conflict());
        assert_eq!(TransportError::network("refused").status(), None);
    }

    #[test]
    fn test_transport_error_display_keeps_message() {
        let err = TransportError::http(500, "database is on fire");
        assert_eq!(err.to_string(), "HTTP 500: database is on fire");
        assert_eq!(err.message(), "database is on fire");
    }

    #[test]
    fn test_body_is_kept_only_when_it_adds_something() {
        let err = TransportError::http(400, "bad").with_body("bad");
        assert_eq!(err.body(), None);

        let err = TransportError::http(400, "bad").with_body(r#"{"message":"bad","hint":"x"}"#);
        assert_eq!(err.body(), Some(r#"{"message":"bad","hint":"x"}"#));
        assert!(err.mentions("hint"));
        assert_eq!(err.to_string(), "HTTP 400: bad");

        let err = TransportError::network("down").with_body("ignored");
        assert_eq!(err.body(), None);
    }

    #[test]
    fn test_rpc_code_from_status() {
        assert_eq!(RpcCode::from_status("NOT_FOUND"), Some(RpcCode::NotFound));
        assert_eq!(RpcCode::from_status("not_found"), Some(RpcCode::NotFound));
        assert_eq!(RpcCode::from_status("OK"), None);
    }

    #[test]
    fn test_flow_error_accessors() {
        let err = FlowError::Request {
            resource: "repository".to_string(),
            operation: OperationKind::Read,
            source: TransportError::http(500, "boom"),
        };
        assert_eq!(err.resource(), "repository");
        assert_eq!(err.operation(), OperationKind::Read);
        assert_eq!(err.transport_error().and_then(|e| e.status()), Some(500));
        assert_eq!(err.to_string(), "read repository failed");
    }
}
