//! Context handlers
//!
//! A context handler turns a handful of per-resource parameters into the four
//! CRUD flows. Every resource picks one of three conventions:
//!
//! - [`rest`] - `POST {base}`, `GET/PUT/DELETE {base}/{id}`
//! - [`http`] - REST plus PATCH updates, per-verb error handlers, custom
//!   item URLs and read-only data sources
//! - [`generic`] - free-form async callbacks
//!
//! # Example
//!
//! ```ignore
//! use restform::engine::{ResourceData, UrlFactory};
//! use restform::handler::{ContextHandler, RestHandler};
//!
//! async fn create(transport: &dyn restform::engine::Transport) {
//!     let handler: ContextHandler =
//!         RestHandler::new("widget", UrlFactory::path("/widgets")).into();
//!     let mut record = ResourceData::new();
//!     let diagnostics = handler.create(&mut record, transport).await;
//!     assert!(diagnostics.is_empty());
//! }
//! ```

pub mod generic;
pub mod http;
pub mod rest;

pub use generic::{callback, is_not_found, Callback, GenericHandler};
pub use http::HttpHandler;
pub use rest::RestHandler;

use crate::engine::{Diagnostics, Flow, FlowError, OperationKind, Record, Transport};

/// Resource handler, one variant per convention.
#[derive(Debug, Clone)]
pub enum ContextHandler {
    Rest(RestHandler),
    Http(HttpHandler),
    Generic(GenericHandler),
}

impl ContextHandler {
    pub fn resource(&self) -> &str {
        match self {
            Self::Rest(h) => h.resource(),
            Self::Http(h) => h.resource_name(),
            Self::Generic(h) => h.resource(),
        }
    }

    pub fn is_data_source(&self) -> bool {
        matches!(self, Self::Http(h) if h.is_data_source())
    }

    /// The declarative flow for an operation. Generic handlers have none.
    pub fn flow(&self, operation: OperationKind) -> Option<Result<Flow, FlowError>> {
        match self {
            Self::Rest(h) => Some(Ok(match operation {
                OperationKind::Create => h.create_flow(),
                OperationKind::Read => h.read_flow(),
                OperationKind::Update => h.update_flow(),
                OperationKind::Delete => h.delete_flow(),
            })),
            Self::Http(h) => Some(match operation {
                OperationKind::Create => h.create_flow(),
                OperationKind::Read => Ok(h.read_flow()),
                OperationKind::Update => h.update_flow(),
                OperationKind::Delete => h.delete_flow(),
            }),
            Self::Generic(_) => None,
        }
    }

    /// Run one CRUD operation against `record`.
    pub async fn apply(
        &self,
        operation: OperationKind,
        record: &mut dyn Record,
        transport: &dyn Transport,
    ) -> Diagnostics {
        if let Self::Generic(h) = self {
            return match operation {
                OperationKind::Create => h.create(record, transport).await,
                OperationKind::Read => h.read(record, transport).await,
                OperationKind::Update => h.update(record, transport).await,
                OperationKind::Delete => h.delete(record, transport).await,
            };
        }

        match self.flow(operation) {
            Some(Ok(flow)) => flow.execute(record, transport).await,
            Some(Err(error)) => Diagnostics::from_error(operation, &error),
            None => Diagnostics::new(),
        }
    }

    pub async fn create(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.apply(OperationKind::Create, record, transport).await
    }

    pub async fn read(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.apply(OperationKind::Read, record, transport).await
    }

    pub async fn update(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.apply(OperationKind::Update, record, transport).await
    }

    pub async fn delete(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        self.apply(OperationKind::Delete, record, transport).await
    }
}

impl From<RestHandler> for ContextHandler {
    fn from(handler: RestHandler) -> Self {
        Self::Rest(handler)
    }
}

impl From<HttpHandler> for ContextHandler {
    fn from(handler: HttpHandler) -> Self {
        Self::Http(handler)
    }
}

impl From<GenericHandler> for ContextHandler {
    fn from(handler: GenericHandler) -> Self {
        Self::Generic(handler)
    }
}
