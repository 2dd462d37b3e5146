//! Operation steps
//!
//! An [`OperationStep`] declares one HTTP call: which verb, which endpoint,
//! how to build the outbound payload and what to do with the response.
//! Steps are plain values, rebuilt every time a handler assembles a flow.

use std::fmt;

use super::error_handler::RequestErrorHandler;
use super::schema::{IdFieldWriter, ReaderFactory, SchemaWriter, WriterFactory};
use super::url::UrlFactory;

/// Logical CRUD operation, used for diagnostics and error-handler dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP verb of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb normally carry a body.
    pub fn implies_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a step does with a successful response body.
#[derive(Clone, Default)]
pub enum ResponseWriter {
    /// Ignore the body.
    #[default]
    Discard,
    /// Assume the body is a JSON object with an `id` field and adopt it as
    /// the record identity. Default for create steps.
    IdField,
    /// Apply the body through a resource-specific schema writer.
    Schema(WriterFactory),
}

impl ResponseWriter {
    pub fn instantiate(&self) -> Option<Box<dyn SchemaWriter>> {
        match self {
            Self::Discard => None,
            Self::IdField => Some(Box::new(IdFieldWriter)),
            Self::Schema(factory) => Some(factory()),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::IdField => "id-field",
            Self::Schema(_) => "schema",
        }
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One declarative HTTP call within a flow.
#[derive(Clone)]
pub struct OperationStep {
    name: String,
    kind: OperationKind,
    method: HttpMethod,
    url: UrlFactory,
    reader: Option<ReaderFactory>,
    writer: ResponseWriter,
    error_handler: RequestErrorHandler,
}

impl OperationStep {
    /// Create a step with no payload and no error handler.
    ///
    /// Create steps start with [`ResponseWriter::IdField`]; every other kind
    /// discards its response until a writer is configured.
    pub fn new(
        name: impl Into<String>,
        kind: OperationKind,
        method: HttpMethod,
        url: UrlFactory,
    ) -> Self {
        let writer = match kind {
            OperationKind::Create => ResponseWriter::IdField,
            _ => ResponseWriter::Discard,
        };

        Self {
            name: name.into(),
            kind,
            method,
            url,
            reader: None,
            writer,
            error_handler: RequestErrorHandler::Propagate,
        }
    }

    pub fn with_reader(mut self, reader: ReaderFactory) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_optional_reader(mut self, reader: Option<ReaderFactory>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_writer(mut self, writer: ResponseWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_error_handler(mut self, handler: RequestErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &UrlFactory {
        &self.url
    }

    pub fn reader(&self) -> Option<&ReaderFactory> {
        self.reader.as_ref()
    }

    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn error_handler(&self) -> &RequestErrorHandler {
        &self.error_handler
    }
}

impl fmt::Debug for OperationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationStep")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer)
            .field("error_handler", &self.error_handler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_step_defaults_to_id_field_writer() {
        let step = OperationStep::new(
            "create widget",
            OperationKind::Create,
            HttpMethod::Post,
            UrlFactory::path("/widgets"),
        );
        assert!(matches!(step.writer(), ResponseWriter::IdField));
        assert!(step.reader().is_none());
    }

    #[test]
    fn test_other_steps_discard_responses() {
        for kind in [OperationKind::Read, OperationKind::Update, OperationKind::Delete] {
            let step = OperationStep::new("s", kind, HttpMethod::Get, UrlFactory::path("/x"));
            assert!(matches!(step.writer(), ResponseWriter::Discard));
        }
    }

    #[test]
    fn test_methods_implying_body() {
        assert!(HttpMethod::Post.implies_body());
        assert!(HttpMethod::Patch.implies_body());
        assert!(!HttpMethod::Get.implies_body());
        assert!(!HttpMethod::Delete.implies_body());
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Update.to_string(), "update");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }
}
