//! Log forwarding integrations.
//!
//! POST answers `{"integration": {...}}` while GET returns the bare object,
//! and the API key is write-only: it never comes back from the server.

use serde::{Deserialize, Serialize};

use super::{api_path, deserialize_id};
use crate::engine::{AttrKey, ModelSchema, Record, RecordError, RecordExt, ResourceModel, UrlFactory};
use crate::handler::{ContextHandler, RestHandler};

pub const KIND: &str = "logging_integration";

/// Where the created integration sits in the POST response.
pub const CREATE_RESPONSE_POINTER: &str = "/integration";

pub const NAME: AttrKey<String> = AttrKey::new("name");
pub const DESTINATION: AttrKey<String> = AttrKey::new("destination");
pub const API_KEY: AttrKey<String> = AttrKey::new("api_key");
pub const ENABLED: AttrKey<bool> = AttrKey::new("enabled");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingIntegration {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing)]
    pub id: Option<String>,
    pub name: String,
    pub destination: String,
    #[serde(default, rename = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl ResourceModel for LoggingIntegration {
    fn from_record(record: &dyn Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: None,
            name: record.require(NAME)?,
            destination: record.require(DESTINATION)?,
            api_key: record.get_attr(API_KEY)?,
            enabled: record.get_attr(ENABLED)?.unwrap_or(false),
        })
    }

    fn apply(&self, record: &mut dyn Record) -> Result<(), RecordError> {
        record.set_attr(NAME, self.name.clone())?;
        record.set_attr(DESTINATION, self.destination.clone())?;
        record.set_attr(ENABLED, self.enabled)?;
        // write-only
        if let Some(key) = &self.api_key {
            record.set_attr(API_KEY, key.clone())?;
        }
        Ok(())
    }

    fn identity(&self) -> Option<String> {
        self.id.clone()
    }
}

pub fn handler() -> ContextHandler {
    RestHandler::new(KIND, UrlFactory::path(api_path("integrations/logging")))
        .with_model::<LoggingIntegration>()
        .with_create_writer(ModelSchema::<LoggingIntegration>::writer_factory_at(
            CREATE_RESPONSE_POINTER,
        ))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ResourceData, SchemaWriter};
    use serde_json::json;

    #[test]
    fn test_create_response_is_unwrapped() {
        let mut record = ResourceData::new();
        ModelSchema::<LoggingIntegration>::at(CREATE_RESPONSE_POINTER)
            .write(
                &json!({"integration": {"id": "li-1", "name": "siem", "destination": "https://siem"}}),
                &mut record,
            )
            .unwrap();
        assert_eq!(record.id(), "li-1");
    }

    #[test]
    fn test_read_keeps_write_only_key() {
        let mut record = ResourceData::new().with(API_KEY, "secret".to_string());
        ModelSchema::<LoggingIntegration>::new()
            .write(
                &json!({"id": "li-1", "name": "siem", "destination": "https://siem", "enabled": true}),
                &mut record,
            )
            .unwrap();
        assert_eq!(record.require(API_KEY).unwrap(), "secret");
        assert!(record.require(ENABLED).unwrap());
    }
}
