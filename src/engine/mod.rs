//! Resource-operation engine
//!
//! Leaf-first: URL factories and schema adapters are pure leaves, an
//! [`OperationStep`] composes them into one HTTP call, a [`Flow`] sequences
//! steps against a [`Record`] through a [`Transport`].
//!
//! # Module Structure
//!
//! - [`record`] - Record boundary, typed attribute keys, in-memory record
//! - [`schema`] - Schema readers/writers and the serde model adapter
//! - [`url`] - Endpoint construction
//! - [`error_handler`] - Per-step error policies
//! - [`step`] - Step model
//! - [`flow`] - Step executor
//! - [`transport`] - Transport boundary and client context
//! - [`diagnostics`] - Flow results
//! - [`error`] - Error taxonomy

pub mod diagnostics;
pub mod error;
pub mod error_handler;
pub mod flow;
pub mod record;
pub mod schema;
pub mod step;
pub mod transport;
pub mod url;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{FlowError, RecordError, RpcCode, RpcStatus, SchemaError, TransportError, UrlError};
pub use error_handler::RequestErrorHandler;
pub use flow::{Flow, FlowOutcome, FlowState};
pub use record::{AttrKey, AttrType, AttrValue, Record, RecordExt, ResourceData};
pub use schema::{
    IdFieldWriter, ModelSchema, ReaderFactory, ResourceModel, SchemaReader, SchemaWriter,
    WriterFactory,
};
pub use step::{HttpMethod, OperationKind, OperationStep, ResponseWriter};
pub use transport::{ClientContext, Transport};
pub use url::UrlFactory;
