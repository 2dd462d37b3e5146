//! Repository lookup data source.
//!
//! `GET /api/v1/repositories[?packageType=...]`, keeping only the keys of
//! the matches. The record id is derived from the query so repeated reads
//! of the same lookup keep a stable identity.

use std::sync::Arc;

use serde_json::Value;

use super::api_path;
use crate::engine::{
    AttrKey, Record, RecordExt, SchemaError, SchemaWriter, UrlFactory, WriterFactory,
};
use crate::handler::{ContextHandler, HttpHandler};

pub const KIND: &str = "repositories";

/// Optional filter
pub const PACKAGE_TYPE: AttrKey<String> = AttrKey::new("package_type");
/// Matched repository keys
pub const KEYS: AttrKey<Vec<String>> = AttrKey::new("keys");

/// Writes the matched keys; accepts a bare array or `{"items": [...]}`.
#[derive(Debug, Default)]
pub struct RepositoryListWriter;

impl RepositoryListWriter {
    pub fn factory() -> WriterFactory {
        Arc::new(|| Box::new(Self) as Box<dyn SchemaWriter>)
    }
}

impl SchemaWriter for RepositoryListWriter {
    fn write(&self, payload: &Value, record: &mut dyn Record) -> Result<(), SchemaError> {
        let items = match payload {
            Value::Array(items) => items,
            other => other
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| SchemaError::MissingField {
                    field: "items".to_string(),
                })?,
        };

        let keys = items
            .iter()
            .map(|item| {
                item.get("key")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| SchemaError::Invalid("repository entry without key".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let package_type = record.get_attr(PACKAGE_TYPE)?;
        record.set_attr(KEYS, keys)?;
        record.set_id(&format!(
            "repositories/{}",
            package_type.as_deref().unwrap_or("all")
        ));
        Ok(())
    }
}

pub fn handler() -> ContextHandler {
    let query =
        UrlFactory::path(api_path("repositories")).with_query_attr("packageType", PACKAGE_TYPE);

    HttpHandler::data_source(KIND, query)
        .with_read_writer(RepositoryListWriter::factory())
        .into()
}
