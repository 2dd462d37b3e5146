//! Package repository: plain REST at `/api/v1/repositories`.

use serde::{Deserialize, Serialize};

use super::{api_path, deserialize_id};
use crate::engine::{AttrKey, Record, RecordError, RecordExt, ResourceModel, UrlFactory};
use crate::handler::{ContextHandler, RestHandler};

pub const KIND: &str = "repository";

pub const KEY: AttrKey<String> = AttrKey::new("key");
pub const DESCRIPTION: AttrKey<String> = AttrKey::new("description");
pub const PACKAGE_TYPE: AttrKey<String> = AttrKey::new("package_type");
pub const PUBLIC: AttrKey<bool> = AttrKey::new("public");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub package_type: String,
    #[serde(default)]
    pub public: bool,
}

impl ResourceModel for Repository {
    fn from_record(record: &dyn Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: None,
            key: record.require(KEY)?,
            description: record.get_attr(DESCRIPTION)?,
            package_type: record.require(PACKAGE_TYPE)?,
            public: record.get_attr(PUBLIC)?.unwrap_or(false),
        })
    }

    fn apply(&self, record: &mut dyn Record) -> Result<(), RecordError> {
        record.set_attr(KEY, self.key.clone())?;
        record.set_opt(DESCRIPTION, self.description.clone())?;
        record.set_attr(PACKAGE_TYPE, self.package_type.clone())?;
        record.set_attr(PUBLIC, self.public)
    }

    fn identity(&self) -> Option<String> {
        self.id.clone()
    }
}

pub fn handler() -> ContextHandler {
    RestHandler::new(KIND, UrlFactory::path(api_path("repositories")))
        .with_model::<Repository>()
        .into()
}
