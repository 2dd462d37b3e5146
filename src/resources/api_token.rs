//! API tokens.
//!
//! Tokens do not map onto one-shot REST verbs. Creation returns the secret
//! exactly once and a second call fetches the metadata; revocation goes
//! through an RPC-style endpoint that reports failures in a status envelope
//! instead of the HTTP status.

use std::collections::BTreeSet;

use anyhow::Context;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use super::{api_path, deserialize_id};
use crate::engine::{
    AttrKey, HttpMethod, Record, RecordExt, RpcCode, RpcStatus, Transport,
};
use crate::handler::{callback, ContextHandler, GenericHandler};

pub const KIND: &str = "api_token";

pub const NAME: AttrKey<String> = AttrKey::new("name");
pub const SCOPES: AttrKey<BTreeSet<String>> = AttrKey::new("scopes");
pub const EXPIRES_AT: AttrKey<String> = AttrKey::new("expires_at");
/// Token secret, only known right after creation.
pub const SECRET: AttrKey<String> = AttrKey::new("secret");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    name: String,
    scopes: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

impl TokenRequest {
    fn from_record(record: &dyn Record) -> anyhow::Result<Self> {
        Ok(Self {
            name: record.require(NAME)?,
            scopes: record.get_attr(SCOPES)?.unwrap_or_default(),
            expires_at: record.get_attr(EXPIRES_AT)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IssuedToken {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenMetadata {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    scopes: BTreeSet<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

/// `{"status": "NOT_FOUND", "message": "..."}`
#[derive(Debug, Default, Deserialize)]
struct StatusEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: String,
}

impl StatusEnvelope {
    fn into_result(self) -> Result<(), RpcStatus> {
        match self.status.as_deref().and_then(RpcCode::from_status) {
            Some(code) => Err(RpcStatus::new(code, self.message)),
            None => Ok(()),
        }
    }
}

fn tokens_url(transport: &dyn Transport) -> String {
    transport.context().endpoint(&api_path("tokens"))
}

fn token_url(record: &dyn Record, transport: &dyn Transport) -> anyhow::Result<String> {
    if !record.has_id() {
        anyhow::bail!("token has no id");
    }
    Ok(format!(
        "{}/{}",
        tokens_url(transport),
        urlencoding::encode(record.id())
    ))
}

async fn fetch(record: &mut dyn Record, transport: &dyn Transport) -> anyhow::Result<()> {
    let url = token_url(record, transport)?;
    let body = transport
        .execute(HttpMethod::Get, &url, None)
        .await
        .context("reading token metadata")?;
    let meta: TokenMetadata =
        serde_json::from_slice(&body).context("parsing token metadata")?;

    record.set_attr(NAME, meta.name)?;
    record.set_attr(SCOPES, meta.scopes)?;
    record.set_opt(EXPIRES_AT, meta.expires_at)?;
    if let Some(id) = meta.id {
        record.set_id(&id);
    }
    Ok(())
}

fn create<'a>(
    record: &'a mut dyn Record,
    transport: &'a dyn Transport,
) -> BoxFuture<'a, anyhow::Result<()>> {
    async move {
        let payload = serde_json::to_value(TokenRequest::from_record(record)?)?;
        let body = transport
            .execute(HttpMethod::Post, &tokens_url(transport), Some(&payload))
            .await
            .context("issuing token")?;
        let issued: IssuedToken = serde_json::from_slice(&body).context("parsing issued token")?;
        let id = issued.id.context("issued token has no id")?;

        record.set_id(&id);
        record.set_attr(SECRET, issued.token)?;
        fetch(record, transport).await
    }
    .boxed()
}

fn read<'a>(
    record: &'a mut dyn Record,
    transport: &'a dyn Transport,
) -> BoxFuture<'a, anyhow::Result<()>> {
    fetch(record, transport).boxed()
}

fn update<'a>(
    record: &'a mut dyn Record,
    transport: &'a dyn Transport,
) -> BoxFuture<'a, anyhow::Result<()>> {
    async move {
        let url = token_url(record, transport)?;
        let payload = serde_json::to_value(TokenRequest::from_record(record)?)?;
        transport
            .execute(HttpMethod::Patch, &url, Some(&payload))
            .await
            .context("updating token")?;
        fetch(record, transport).await
    }
    .boxed()
}

fn revoke<'a>(
    record: &'a mut dyn Record,
    transport: &'a dyn Transport,
) -> BoxFuture<'a, anyhow::Result<()>> {
    async move {
        let url = format!("{}/revoke", token_url(record, transport)?);
        let body = transport
            .execute(HttpMethod::Post, &url, None)
            .await
            .context("revoking token")?;

        let envelope = if body.iter().all(u8::is_ascii_whitespace) {
            StatusEnvelope::default()
        } else {
            serde_json::from_slice(&body).context("parsing revoke response")?
        };
        envelope.into_result()?;
        Ok(())
    }
    .boxed()
}

pub fn handler() -> ContextHandler {
    GenericHandler::new(
        KIND,
        callback(create),
        callback(read),
        callback(update),
        callback(revoke),
    )
    .into()
}
