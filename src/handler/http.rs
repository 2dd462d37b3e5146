//! HTTP convention
//!
//! Superset of the REST convention: configurable update verb, error handlers
//! per verb, a URL factory that fully replaces `{base}/{id}` synthesis, and
//! read-only data sources backed by a free-standing query endpoint.

use std::fmt;

use crate::engine::{
    Flow, FlowError, HttpMethod, ModelSchema, OperationKind, OperationStep, ReaderFactory,
    RequestErrorHandler, ResourceModel, ResponseWriter, UrlFactory, WriterFactory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Resource,
    DataSource,
}

/// Error handler per verb.
#[derive(Debug, Clone)]
struct VerbHandlers {
    get: RequestErrorHandler,
    post: RequestErrorHandler,
    update: RequestErrorHandler,
    delete: RequestErrorHandler,
}

#[derive(Clone)]
pub struct HttpHandler {
    resource: String,
    mode: Mode,
    base_url: UrlFactory,
    read_update_delete_url: Option<UrlFactory>,
    update_method: HttpMethod,
    create_reader: Option<ReaderFactory>,
    create_writer: ResponseWriter,
    update_reader: Option<ReaderFactory>,
    read_writer: ResponseWriter,
    handlers: VerbHandlers,
}

impl HttpHandler {
    /// Managed resource: POST to `base_url`, GET/update/DELETE on
    /// `{base_url}/{id}` unless [`with_read_update_delete_url`](Self::with_read_update_delete_url)
    /// says otherwise. GET and DELETE swallow 404 by default.
    pub fn resource(resource: impl Into<String>, base_url: UrlFactory) -> Self {
        let resource = resource.into();
        Self {
            handlers: VerbHandlers {
                get: RequestErrorHandler::ignore_not_found_on_read(&resource),
                post: RequestErrorHandler::Propagate,
                update: RequestErrorHandler::Propagate,
                delete: RequestErrorHandler::ignore_not_found_on_delete(&resource),
            },
            resource,
            mode: Mode::Resource,
            base_url,
            read_update_delete_url: None,
            update_method: HttpMethod::Put,
            create_reader: None,
            create_writer: ResponseWriter::IdField,
            update_reader: None,
            read_writer: ResponseWriter::Discard,
        }
    }

    /// Read-only data source querying `query_url`. Only the read flow exists;
    /// its errors propagate since there is no identity to clear.
    pub fn data_source(resource: impl Into<String>, query_url: UrlFactory) -> Self {
        let mut handler = Self::resource(resource, query_url);
        handler.mode = Mode::DataSource;
        handler.handlers.get = RequestErrorHandler::Propagate;
        handler.handlers.delete = RequestErrorHandler::Propagate;
        handler
    }

    pub fn with_model<M: ResourceModel>(self) -> Self {
        self.with_create_reader(ModelSchema::<M>::reader_factory())
            .with_update_reader(ModelSchema::<M>::reader_factory())
            .with_read_writer(ModelSchema::<M>::writer_factory())
    }

    /// `PUT` by default; `PATCH` for partial-update endpoints.
    pub fn with_update_method(mut self, method: HttpMethod) -> Self {
        self.update_method = method;
        self
    }

    /// Endpoint for GET, update and DELETE, e.g. `/policies/{type}/{id}`.
    pub fn with_read_update_delete_url(mut self, url: UrlFactory) -> Self {
        self.read_update_delete_url = Some(url);
        self
    }

    pub fn with_create_reader(mut self, reader: ReaderFactory) -> Self {
        self.create_reader = Some(reader);
        self
    }

    pub fn with_create_writer(mut self, writer: WriterFactory) -> Self {
        self.create_writer = ResponseWriter::Schema(writer);
        self
    }

    pub fn with_update_reader(mut self, reader: ReaderFactory) -> Self {
        self.update_reader = Some(reader);
        self
    }

    pub fn with_read_writer(mut self, writer: WriterFactory) -> Self {
        self.read_writer = ResponseWriter::Schema(writer);
        self
    }

    pub fn with_get_error_handler(mut self, handler: RequestErrorHandler) -> Self {
        self.handlers.get = handler;
        self
    }

    pub fn with_post_error_handler(mut self, handler: RequestErrorHandler) -> Self {
        self.handlers.post = handler;
        self
    }

    pub fn with_update_error_handler(mut self, handler: RequestErrorHandler) -> Self {
        self.handlers.update = handler;
        self
    }

    pub fn with_delete_error_handler(mut self, handler: RequestErrorHandler) -> Self {
        self.handlers.delete = handler;
        self
    }

    pub fn resource_name(&self) -> &str {
        &self.resource
    }

    pub fn is_data_source(&self) -> bool {
        self.mode == Mode::DataSource
    }

    fn item_url(&self) -> UrlFactory {
        match (&self.read_update_delete_url, self.mode) {
            (Some(url), _) => url.clone(),
            (None, Mode::DataSource) => self.base_url.clone(),
            (None, Mode::Resource) => self.base_url.with_id(),
        }
    }

    fn read_step(&self) -> OperationStep {
        OperationStep::new(
            format!("read {}", self.resource),
            OperationKind::Read,
            HttpMethod::Get,
            self.item_url(),
        )
        .with_writer(self.read_writer.clone())
        .with_error_handler(self.handlers.get.clone())
    }

    fn managed_only(&self, operation: OperationKind) -> Result<(), FlowError> {
        match self.mode {
            Mode::Resource => Ok(()),
            Mode::DataSource => Err(FlowError::Unsupported {
                resource: self.resource.clone(),
                operation,
            }),
        }
    }

    pub fn create_flow(&self) -> Result<Flow, FlowError> {
        self.managed_only(OperationKind::Create)?;

        let create = OperationStep::new(
            format!("create {}", self.resource),
            OperationKind::Create,
            HttpMethod::Post,
            self.base_url.clone(),
        )
        .with_optional_reader(self.create_reader.clone())
        .with_writer(self.create_writer.clone())
        .with_error_handler(self.handlers.post.clone());

        Ok(Flow::new(
            &self.resource,
            OperationKind::Create,
            vec![create, self.read_step()],
        ))
    }

    pub fn read_flow(&self) -> Flow {
        Flow::new(&self.resource, OperationKind::Read, vec![self.read_step()])
    }

    pub fn update_flow(&self) -> Result<Flow, FlowError> {
        self.managed_only(OperationKind::Update)?;

        let update = OperationStep::new(
            format!("update {}", self.resource),
            OperationKind::Update,
            self.update_method,
            self.item_url(),
        )
        .with_optional_reader(self.update_reader.clone())
        .with_error_handler(self.handlers.update.clone());

        Ok(Flow::new(
            &self.resource,
            OperationKind::Update,
            vec![update, self.read_step()],
        ))
    }

    pub fn delete_flow(&self) -> Result<Flow, FlowError> {
        self.managed_only(OperationKind::Delete)?;

        let delete = OperationStep::new(
            format!("delete {}", self.resource),
            OperationKind::Delete,
            HttpMethod::Delete,
            self.item_url(),
        )
        .with_error_handler(self.handlers.delete.clone());

        Ok(Flow::new(&self.resource, OperationKind::Delete, vec![delete]))
    }
}

impl fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandler")
            .field("resource", &self.resource)
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("read_update_delete_url", &self.read_update_delete_url)
            .field("update_method", &self.update_method)
            .field("create_reader", &self.create_reader.is_some())
            .field("create_writer", &self.create_writer)
            .field("update_reader", &self.update_reader.is_some())
            .field("read_writer", &self.read_writer)
            .field("handlers", &self.handlers)
            .finish()
    }
}
