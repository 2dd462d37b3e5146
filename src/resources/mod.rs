//! Resource registry
//!
//! Maps resource kinds to freshly built context handlers. Each resource
//! module declares its attribute keys, its wire model and which handler
//! convention its endpoints follow.
//!
//! # Example
//!
//! ```ignore
//! use restform::resources;
//!
//! let handler = resources::handler_for("repository").unwrap();
//! assert_eq!(handler.resource(), "repository");
//! ```

pub mod api_token;
pub mod logging_integration;
pub mod policy;
pub mod repositories;
pub mod repository;
pub mod role;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::handler::ContextHandler;

/// Path prefix shared by every control-plane endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Registered resource kind
#[derive(Debug, Clone, Copy)]
pub struct ResourceDef {
    pub kind: &'static str,
    pub description: &'static str,
    /// Read-only lookups; create/update/delete are rejected.
    pub data_source: bool,
    build: fn() -> ContextHandler,
}

impl ResourceDef {
    pub fn handler(&self) -> ContextHandler {
        (self.build)()
    }
}

const RESOURCES: &[ResourceDef] = &[
    ResourceDef {
        kind: repository::KIND,
        description: "Package repository",
        data_source: false,
        build: repository::handler,
    },
    ResourceDef {
        kind: role::KIND,
        description: "Access role with a permission set",
        data_source: false,
        build: role::handler,
    },
    ResourceDef {
        kind: policy::KIND,
        description: "Typed policy (security, retention, ...)",
        data_source: false,
        build: policy::handler,
    },
    ResourceDef {
        kind: logging_integration::KIND,
        description: "Log forwarding integration",
        data_source: false,
        build: logging_integration::handler,
    },
    ResourceDef {
        kind: api_token::KIND,
        description: "API access token",
        data_source: false,
        build: api_token::handler,
    },
    ResourceDef {
        kind: repositories::KIND,
        description: "Repository lookup by package type",
        data_source: true,
        build: repositories::handler,
    },
];

/// Get a resource definition by kind
pub fn get_resource(kind: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().find(|r| r.kind == kind)
}

/// All registered kinds, in registration order
pub fn resource_kinds() -> Vec<&'static str> {
    RESOURCES.iter().map(|r| r.kind).collect()
}

pub fn resources() -> &'static [ResourceDef] {
    RESOURCES
}

/// Build the handler for a resource kind
pub fn handler_for(kind: &str) -> Option<ContextHandler> {
    get_resource(kind).map(ResourceDef::handler)
}

/// Full endpoint path below the API prefix.
pub(crate) fn api_path(path: &str) -> String {
    format!("{}/{}", API_PREFIX, path.trim_start_matches('/'))
}

/// Identities arrive as strings or integers depending on the endpoint.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
