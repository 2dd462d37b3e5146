//! Default REST convention
//!
//! `POST {base}`, then `GET/PUT/DELETE {base}/{id}`.

use std::fmt;

use crate::engine::{
    Flow, HttpMethod, ModelSchema, OperationKind, OperationStep, ReaderFactory,
    RequestErrorHandler, ResourceModel, ResponseWriter, UrlFactory, WriterFactory,
};

/// Handler for resources following the plain REST convention.
///
/// Without [`with_create_writer`](Self::with_create_writer) the POST
/// response goes through [`ResponseWriter::IdField`]: it must be a JSON
/// object carrying the new resource's `id`.
#[derive(Clone)]
pub struct RestHandler {
    resource: String,
    base_url: UrlFactory,
    id_url: Option<UrlFactory>,
    create_reader: Option<ReaderFactory>,
    create_writer: ResponseWriter,
    update_reader: Option<ReaderFactory>,
    read_writer: ResponseWriter,
    read_error_handler: RequestErrorHandler,
}

impl RestHandler {
    pub fn new(resource: impl Into<String>, base_url: UrlFactory) -> Self {
        let resource = resource.into();
        Self {
            read_error_handler: RequestErrorHandler::ignore_not_found_on_read(&resource),
            resource,
            base_url,
            id_url: None,
            create_reader: None,
            create_writer: ResponseWriter::IdField,
            update_reader: None,
            read_writer: ResponseWriter::Discard,
        }
    }

    /// Use one serde model for POST/PUT payloads and GET responses.
    pub fn with_model<M: ResourceModel>(self) -> Self {
        self.with_create_reader(ModelSchema::<M>::reader_factory())
            .with_update_reader(ModelSchema::<M>::reader_factory())
            .with_read_writer(ModelSchema::<M>::writer_factory())
    }

    /// Replace the `{base}/{id}` synthesis for GET, PUT and DELETE.
    pub fn with_id_url(mut self, url: UrlFactory) -> Self {
        self.id_url = Some(url);
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

    /// Override the error handler of every GET step (404 suppression by default).
    pub fn with_read_error_handler(mut self, handler: RequestErrorHandler) -> Self {
        self.read_error_handler = handler;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    fn id_url(&self) -> UrlFactory {
        self.id_url
            .clone()
            .unwrap_or_else(|| self.base_url.with_id())
    }

    fn read_step(&self) -> OperationStep {
        OperationStep::new(
            format!("read {}", self.resource),
            OperationKind::Read,
            HttpMethod::Get,
            self.id_url(),
        )
        .with_writer(self.read_writer.clone())
        .with_error_handler(self.read_error_handler.clone())
    }

    pub fn create_flow(&self) -> Flow {
        let create = OperationStep::new(
            format!("create {}", self.resource),
            OperationKind::Create,
            HttpMethod::Post,
            self.base_url.clone(),
        )
        .with_optional_reader(self.create_reader.clone())
        .with_writer(self.create_writer.clone());

        Flow::new(&self.resource, OperationKind::Create, vec![create, self.read_step()])
    }

    pub fn read_flow(&self) -> Flow {
        Flow::new(&self.resource, OperationKind::Read, vec![self.read_step()])
    }

    pub fn update_flow(&self) -> Flow {
        let update = OperationStep::new(
            format!("update {}", self.resource),
            OperationKind::Update,
            HttpMethod::Put,
            self.id_url(),
        )
        .with_optional_reader(self.update_reader.clone());

        Flow::new(&self.resource, OperationKind::Update, vec![update, self.read_step()])
    }

    pub fn delete_flow(&self) -> Flow {
        let delete = OperationStep::new(
            format!("delete {}", self.resource),
            OperationKind::Delete,
            HttpMethod::Delete,
            self.id_url(),
        )
        .with_error_handler(RequestErrorHandler::ignore_not_found_on_delete(&self.resource));

        Flow::new(&self.resource, OperationKind::Delete, vec![delete])
    }
}

impl fmt::Debug for RestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestHandler")
            .field("resource", &self.resource)
            .field("base_url", &self.base_url)
            .field("id_url", &self.id_url)
            .field("create_reader", &self.create_reader.is_some())
            .field("create_writer", &self.create_writer)
            .field("update_reader", &self.update_reader.is_some())
            .field("read_writer", &self.read_writer)
            .field("read_error_handler", &self.read_error_handler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> RestHandler {
        RestHandler::new("widget", UrlFactory::path("/widgets"))
    }

    fn shape(flow: &Flow) -> Vec<(OperationKind, HttpMethod)> {
        flow.steps().iter().map(|s| (s.kind(), s.method())).collect()
    }

    #[test]
    fn test_canonical_flow_shapes() {
        let h = handler();
        assert_eq!(
            shape(&h.create_flow()),
            vec![
                (OperationKind::Create, HttpMethod::Post),
                (OperationKind::Read, HttpMethod::Get)
            ]
        );
        assert_eq!(shape(&h.read_flow()), vec![(OperationKind::Read, HttpMethod::Get)]);
        assert_eq!(
            shape(&h.update_flow()),
            vec![
                (OperationKind::Update, HttpMethod::Put),
                (OperationKind::Read, HttpMethod::Get)
            ]
        );
        assert_eq!(
            shape(&h.delete_flow()),
            vec![(OperationKind::Delete, HttpMethod::Delete)]
        );
    }

    #[test]
    fn test_create_step_uses_id_field_policy_by_default() {
        let flow = handler().create_flow();
        assert!(matches!(flow.steps()[0].writer(), ResponseWriter::IdField));
    }

    #[test]
    fn test_default_error_handlers() {
        let h = handler();
        assert!(matches!(
            h.read_flow().steps()[0].error_handler(),
            RequestErrorHandler::IgnoreNotFoundOnRead { .. }
        ));
        assert!(matches!(
            h.delete_flow().steps()[0].error_handler(),
            RequestErrorHandler::IgnoreNotFoundOnDelete { .. }
        ));
        assert!(matches!(
            h.create_flow().steps()[0].error_handler(),
            RequestErrorHandler::Propagate
        ));
    }

    #[test]
    fn test_read_error_handler_override() {
        let flow = handler()
            .with_read_error_handler(RequestErrorHandler::Propagate)
            .create_flow();
        assert!(matches!(
            flow.steps()[1].error_handler(),
            RequestErrorHandler::Propagate
        ));
    }

    #[test]
    fn test_debug_reports_readers_without_closures() {
        let rendered = format!("{:?}", handler());
        assert!(rendered.contains("resource: \"widget\""));
        assert!(rendered.contains("create_reader: false"));
        assert!(rendered.contains("create_writer: id-field"));
    }
}
