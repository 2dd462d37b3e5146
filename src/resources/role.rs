//! Access roles. Updates are partial, so they go out as PATCH.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{api_path, deserialize_id};
use crate::engine::{
    AttrKey, HttpMethod, Record, RecordError, RecordExt, ResourceModel, UrlFactory,
};
use crate::handler::{ContextHandler, HttpHandler};

pub const KIND: &str = "role";

pub const NAME: AttrKey<String> = AttrKey::new("name");
pub const DESCRIPTION: AttrKey<String> = AttrKey::new("description");
pub const PERMISSIONS: AttrKey<BTreeSet<String>> = AttrKey::new("permissions");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl ResourceModel for Role {
    fn from_record(record: &dyn Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: None,
            name: record.require(NAME)?,
            description: record.get_attr(DESCRIPTION)?,
            permissions: record.get_attr(PERMISSIONS)?.unwrap_or_default(),
        })
    }

    fn apply(&self, record: &mut dyn Record) -> Result<(), RecordError> {
        record.set_attr(NAME, self.name.clone())?;
        record.set_opt(DESCRIPTION, self.description.clone())?;
        record.set_attr(PERMISSIONS, self.permissions.clone())
    }

    fn identity(&self) -> Option<String> {
        self.id.clone()
    }
}

pub fn handler() -> ContextHandler {
    HttpHandler::resource(KIND, UrlFactory::path(api_path("roles")))
        .with_model::<Role>()
        .with_update_method(HttpMethod::Patch)
        .into()
}
