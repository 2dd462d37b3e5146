//! Schema readers and writers
//!
//! A [`SchemaReader`] turns a record into the JSON payload sent to the
//! control plane, a [`SchemaWriter`] applies a response payload back onto the
//! record. Steps hold factories rather than instances so every execution
//! starts from a fresh adapter.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::{RecordError, SchemaError};
use super::record::Record;

/// Extracts the outbound payload from a record.
pub trait SchemaReader: Send + Sync {
    fn read(&self, record: &dyn Record) -> Result<Value, SchemaError>;
}

/// Applies an inbound payload onto a record, identity included.
pub trait SchemaWriter: Send + Sync {
    fn write(&self, payload: &Value, record: &mut dyn Record) -> Result<(), SchemaError>;
}

pub type ReaderFactory = Arc<dyn Fn() -> Box<dyn SchemaReader> + Send + Sync>;
pub type WriterFactory = Arc<dyn Fn() -> Box<dyn SchemaWriter> + Send + Sync>;

/// Writer behind [`ResponseWriter::IdField`](super::step::ResponseWriter::IdField).
///
/// Contract: the payload is a JSON object whose `id` field is a string or an
/// integer. Anything else is an unmarshal failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdFieldWriter;

impl IdFieldWriter {
    pub const FIELD: &'static str = "id";
}

impl SchemaWriter for IdFieldWriter {
    fn write(&self, payload: &Value, record: &mut dyn Record) -> Result<(), SchemaError> {
        let id = match payload.get(Self::FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(SchemaError::MissingField {
                    field: Self::FIELD.to_string(),
                })
            }
        };
        record.set_id(&id);
        Ok(())
    }
}

/// Typed resource model mapped onto record attributes.
pub trait ResourceModel: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Build the model from the record's attributes.
    fn from_record(record: &dyn Record) -> Result<Self, RecordError>;

    /// Copy the model's fields onto the record.
    fn apply(&self, record: &mut dyn Record) -> Result<(), RecordError>;

    /// Server-assigned identity carried by the model, if any.
    fn identity(&self) -> Option<String> {
        None
    }
}

/// Serde-backed reader and writer for a [`ResourceModel`].
///
/// With [`ModelSchema::at`] the writer looks for the model under a JSON
/// pointer, for endpoints that wrap their response (`{"integration": {...}}`).
pub struct ModelSchema<M> {
    pointer: Option<&'static str>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: ResourceModel> ModelSchema<M> {
    pub fn new() -> Self {
        Self {
            pointer: None,
            _marker: PhantomData,
        }
    }

    pub fn at(pointer: &'static str) -> Self {
        Self {
            pointer: Some(pointer),
            _marker: PhantomData,
        }
    }

    pub fn reader_factory() -> ReaderFactory {
        Arc::new(|| Box::new(Self::new()) as Box<dyn SchemaReader>)
    }

    pub fn writer_factory() -> WriterFactory {
        Arc::new(|| Box::new(Self::new()) as Box<dyn SchemaWriter>)
    }

    pub fn writer_factory_at(pointer: &'static str) -> WriterFactory {
        Arc::new(move || Box::new(Self::at(pointer)) as Box<dyn SchemaWriter>)
    }
}

impl<M: ResourceModel> Default for ModelSchema<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ResourceModel> SchemaReader for ModelSchema<M> {
    fn read(&self, record: &dyn Record) -> Result<Value, SchemaError> {
        let model = M::from_record(record)?;
        Ok(serde_json::to_value(model)?)
    }
}

impl<M: ResourceModel> SchemaWriter for ModelSchema<M> {
    fn write(&self, payload: &Value, record: &mut dyn Record) -> Result<(), SchemaError> {
        let payload = match self.pointer {
            Some(pointer) => payload.pointer(pointer).ok_or_else(|| SchemaError::MissingField {
                field: pointer.trim_start_matches('/').replace('/', "."),
            })?,
            None => payload,
        };

        let model: M = serde_json::from_value(payload.clone())?;
        model.apply(record)?;
        if let Some(id) = model.identity() {
            record.set_id(&id);
        }
        Ok(())
    }
}
