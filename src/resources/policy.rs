//! Typed policies under `/api/v1/policies/{type}`.
//!
//! The policy endpoint reports a missing policy as HTTP 400 with
//! "policy not found" in the body, so read and delete match on the message
//! instead of the status.

use serde::{Deserialize, Serialize};

use super::{api_path, deserialize_id};
use crate::engine::{
    AttrKey, OperationKind, Record, RecordError, RecordExt, RequestErrorHandler, ResourceModel,
    UrlFactory,
};
use crate::handler::{ContextHandler, HttpHandler};

pub const KIND: &str = "policy";

/// Body substring the endpoint uses for missing policies.
pub const NOT_FOUND_MESSAGE: &str = "policy not found";

pub const POLICY_TYPE: AttrKey<String> = AttrKey::new("policy_type");
pub const NAME: AttrKey<String> = AttrKey::new("name");
pub const DESCRIPTION: AttrKey<String> = AttrKey::new("description");
pub const ENABLED: AttrKey<bool> = AttrKey::new("enabled");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl ResourceModel for Policy {
    fn from_record(record: &dyn Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: None,
            name: record.require(NAME)?,
            policy_type: record.require(POLICY_TYPE)?,
            description: record.get_attr(DESCRIPTION)?,
            enabled: record.get_attr(ENABLED)?.unwrap_or(true),
        })
    }

    fn apply(&self, record: &mut dyn Record) -> Result<(), RecordError> {
        record.set_attr(NAME, self.name.clone())?;
        record.set_attr(POLICY_TYPE, self.policy_type.clone())?;
        record.set_opt(DESCRIPTION, self.description.clone())?;
        record.set_attr(ENABLED, self.enabled)
    }

    fn identity(&self) -> Option<String> {
        self.id.clone()
    }
}

pub fn handler() -> ContextHandler {
    let not_found = RequestErrorHandler::ignore_by_message(
        KIND,
        NOT_FOUND_MESSAGE,
        &[OperationKind::Read, OperationKind::Delete],
    );

    HttpHandler::resource(KIND, UrlFactory::template(api_path("policies/{policy_type}")))
        .with_read_update_delete_url(UrlFactory::template(api_path(
            "policies/{policy_type}/{id}",
        )))
        .with_model::<Policy>()
        .with_get_error_handler(not_found.clone())
        .with_delete_error_handler(not_found)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ClientContext, ResourceData};

    #[test]
    fn test_mid_path_urls() {
        let ctx = ClientContext::new("https://cp.test").unwrap();
        let record = ResourceData::new()
            .with_id("p 1")
            .with(POLICY_TYPE, "security".to_string());

        let handler = handler();
        let create = handler.flow(OperationKind::Create).unwrap().unwrap();
        assert_eq!(
            create.steps()[0].url().resolve(&record, &ctx).unwrap(),
            "https://cp.test/api/v1/policies/security"
        );

        let delete = handler.flow(OperationKind::Delete).unwrap().unwrap();
        assert_eq!(
            delete.steps()[0].url().resolve(&record, &ctx).unwrap(),
            "https://cp.test/api/v1/policies/security/p%201"
        );
    }

    #[test]
    fn test_read_and_delete_match_message() {
        let handler = handler();
        for operation in [OperationKind::Read, OperationKind::Delete] {
            let flow = handler.flow(operation).unwrap().unwrap();
            assert!(matches!(
                flow.steps()[0].error_handler(),
                RequestErrorHandler::IgnoreByMessage { .. }
            ));
        }
    }
}
