//! Generic callbacks
//!
//! For resources whose backing calls are not one-shot REST verbs. Each CRUD
//! operation is a free-form async function over the record and the
//! transport. Errors pass through one not-found translator, so these
//! resources disappear from state the same way REST-backed ones do.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::Instrument;

use crate::engine::{
    Diagnostics, FlowError, OperationKind, Record, RecordExt, RpcStatus, Transport,
    TransportError,
};

/// One CRUD callback.
pub type Callback = Arc<
    dyn for<'a> Fn(&'a mut dyn Record, &'a dyn Transport) -> BoxFuture<'a, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Wrap a function as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: for<'a> Fn(&'a mut dyn Record, &'a dyn Transport) -> BoxFuture<'a, anyhow::Result<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// True when anything in the error chain is an HTTP 404 or a protocol-level
/// not-found status.
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(transport) = cause.downcast_ref::<TransportError>() {
            return transport.is_not_found();
        }
        cause
            .downcast_ref::<RpcStatus>()
            .is_some_and(RpcStatus::is_not_found)
    })
}

#[derive(Clone)]
pub struct GenericHandler {
    resource: String,
    create: Callback,
    read: Callback,
    update: Callback,
    delete: Callback,
}

impl GenericHandler {
    pub fn new(
        resource: impl Into<String>,
        create: Callback,
        read: Callback,
        update: Callback,
        delete: Callback,
    ) -> Self {
        Self {
            resource: resource.into(),
            create,
            read,
            update,
            delete,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub async fn create(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.invoke(OperationKind::Create, &self.create, record, transport)
            .await
    }

    pub async fn read(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.invoke(OperationKind::Read, &self.read, record, transport)
            .await
    }

    pub async fn update(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.invoke(OperationKind::Update, &self.update, record, transport)
            .await
    }

    pub async fn delete(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.invoke(OperationKind::Delete, &self.delete, record, transport)
            .await
    }

    async fn invoke(
        &self,
        operation: OperationKind,
        callback: &Callback,
        record: &mut dyn Record,
        transport: &dyn Transport,
    ) -> Diagnostics {
        let span = tracing::info_span!(
            "callback",
            resource = %self.resource,
            operation = %operation,
        );

        async move {
            match callback(&mut *record, transport).await {
                Ok(()) => {
                    tracing::info!(id = %record.id(), "Callback succeeded");
                    Diagnostics::new()
                }
                Err(error) if is_not_found(&error) => {
                    tracing::warn!(id = %record.id(), "Resource not found ({:#}), clearing identity", error);
                    record.clear_id();
                    Diagnostics::new()
                }
                Err(error) => {
                    let error = FlowError::Callback {
                        resource: self.resource.clone(),
                        operation,
                        source: error.into(),
                    };
                    tracing::error!("Callback failed: {}", error);
                    Diagnostics::from_error(operation, &error)
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for GenericHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericHandler")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
