//! Request error handlers
//!
//! A handler sees the HTTP error of a failed step and either swallows it or
//! hands an error back. Network failures never reach a handler. Handlers can
//! only downgrade a failure: they are not consulted for successful steps.

use std::fmt;
use std::sync::Arc;

use super::error::TransportError;
use super::record::{Record, RecordExt};
use super::step::OperationKind;

type CustomFn =
    dyn Fn(TransportError, OperationKind, &mut dyn Record) -> Result<(), TransportError> + Send + Sync;

/// Error policy attached to one step.
#[derive(Clone, Default)]
pub enum RequestErrorHandler {
    /// Every error fails the flow.
    #[default]
    Propagate,

    /// A 404 on a read step means the resource is gone: clear the identity so
    /// the surrounding system re-creates it, and succeed.
    IgnoreNotFoundOnRead { resource: String },

    /// A 404 on a delete step means the resource is already deleted.
    IgnoreNotFoundOnDelete { resource: String },

    /// Any HTTP error whose message contains `substring` is treated as
    /// not-found for the listed operations. For endpoints that answer 400 or
    /// 500 where they mean 404.
    IgnoreByMessage {
        resource: String,
        substring: String,
        operations: Vec<OperationKind>,
    },

    /// Caller-supplied policy, e.g. adopting an existing resource on 409.
    Custom {
        resource: String,
        handler: Arc<CustomFn>,
    },
}

impl RequestErrorHandler {
    pub fn ignore_not_found_on_read(resource: impl Into<String>) -> Self {
        Self::IgnoreNotFoundOnRead {
            resource: resource.into(),
        }
    }

    pub fn ignore_not_found_on_delete(resource: impl Into<String>) -> Self {
        Self::IgnoreNotFoundOnDelete {
            resource: resource.into(),
        }
    }

    pub fn ignore_by_message(
        resource: impl Into<String>,
        substring: impl Into<String>,
        operations: &[OperationKind],
    ) -> Self {
        Self::IgnoreByMessage {
            resource: resource.into(),
            substring: substring.into(),
            operations: operations.to_vec(),
        }
    }

    pub fn custom<F>(resource: impl Into<String>, handler: F) -> Self
    where
        F: Fn(TransportError, OperationKind, &mut dyn Record) -> Result<(), TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self::Custom {
            resource: resource.into(),
            handler: Arc::new(handler),
        }
    }

    /// Handle a failed request. `Ok(())` means the failure was absorbed.
    pub fn handle(
        &self,
        error: TransportError,
        operation: OperationKind,
        record: &mut dyn Record,
    ) -> Result<(), TransportError> {
        if matches!(error, TransportError::Network { .. }) {
            return Err(error);
        }

        match self {
            Self::Propagate => Err(error),
            Self::IgnoreNotFoundOnRead { resource } => {
                if operation == OperationKind::Read && error.is_not_found() {
                    suppress(resource, operation, &error, record);
                    Ok(())
                } else {
                    Err(error)
                }
            }
            Self::IgnoreNotFoundOnDelete { resource } => {
                if operation == OperationKind::Delete && error.is_not_found() {
                    suppress(resource, operation, &error, record);
                    Ok(())
                } else {
                    Err(error)
                }
            }
            Self::IgnoreByMessage {
                resource,
                substring,
                operations,
            } => {
                if operations.contains(&operation) && error.mentions(substring) {
                    suppress(resource, operation, &error, record);
                    Ok(())
                } else {
                    Err(error)
                }
            }
            Self::Custom { resource, handler } => {
                tracing::debug!(resource = %resource, operation = %operation, "Delegating to custom error handler");
                handler(error, operation, record)
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::IgnoreNotFoundOnRead { .. } => "ignore-not-found-on-read",
            Self::IgnoreNotFoundOnDelete { .. } => "ignore-not-found-on-delete",
            Self::IgnoreByMessage { .. } => "ignore-by-message",
            Self::Custom { .. } => "custom",
        }
    }
}

fn suppress(resource: &str, operation: OperationKind, error: &TransportError, record: &mut dyn Record) {
    tracing::warn!(
        resource = %resource,
        operation = %operation,
        id = %record.id(),
        "Resource not found ({}), clearing identity",
        error
    );
    record.clear_id();
}

impl fmt::Debug for RequestErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
