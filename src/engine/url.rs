//! URL factories
//!
//! Endpoint construction is decoupled from step execution: a [`UrlFactory`]
//! is a pure function of the record and the client context. The common REST
//! shapes are available as constructors.

use std::fmt;
use std::sync::Arc;

use super::error::UrlError;
use super::record::{AttrKey, Record};
use super::transport::ClientContext;

type UrlFn = dyn Fn(&dyn Record, &ClientContext) -> Result<String, UrlError> + Send + Sync;

/// Resolves a fully-qualified endpoint for a step.
#[derive(Clone)]
pub struct UrlFactory(Arc<UrlFn>);

impl UrlFactory {
    /// Wrap an arbitrary resolution function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Record, &ClientContext) -> Result<String, UrlError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Fixed path below the control-plane base URL.
    pub fn path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(move |_, ctx| Ok(ctx.endpoint(&path)))
    }

    /// Path template with `{attribute}` placeholders filled from the record.
    ///
    /// `{id}` resolves to the record identity; every other placeholder reads
    /// the attribute of that name. Values are percent-encoded.
    pub fn template(template: impl Into<String>) -> Self {
        let template = template.into();
        Self::new(move |record, ctx| Ok(ctx.endpoint(&expand_template(&template, record)?)))
    }

    /// This factory's URL followed by `/{id}`.
    pub fn with_id(&self) -> Self {
        let base = self.clone();
        Self::new(move |record, ctx| {
            let id = record.id();
            if id.is_empty() {
                return Err(UrlError::MissingId);
            }
            let base = base.resolve(record, ctx)?;
            Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                urlencoding::encode(id)
            ))
        })
    }

    /// This factory's URL with a `param=value` query pair taken from a
    /// string attribute. Absent attributes leave the URL untouched.
    pub fn with_query_attr(&self, param: &'static str, key: AttrKey<String>) -> Self {
        let base = self.clone();
        Self::new(move |record, ctx| {
            let url = base.resolve(record, ctx)?;
            let Some(value) = record.get(key.name()).and_then(|v| v.to_plain_string()) else {
                return Ok(url);
            };

            let mut parsed = url::Url::parse(&url).map_err(|source| UrlError::Invalid {
                url: url.clone(),
                source,
            })?;
            parsed.query_pairs_mut().append_pair(param, &value);
            Ok(parsed.to_string())
        })
    }

    pub fn resolve(&self, record: &dyn Record, ctx: &ClientContext) -> Result<String, UrlError> {
        (self.0)(record, ctx)
    }
}

impl fmt::Debug for UrlFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UrlFactory")
    }
}

/// Expand `{name}` placeholders. An unmatched `{` is kept literally.
fn expand_template(template: &str, record: &dyn Record) -> Result<String, UrlError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let name = &after[..end];
        let value = placeholder_value(name, record)?;
        out.push_str(&urlencoding::encode(&value));
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn placeholder_value(name: &str, record: &dyn Record) -> Result<String, UrlError> {
    let value = if name == "id" {
        Some(record.id().to_string()).filter(|id| !id.is_empty())
    } else {
        record.get(name).and_then(|v| v.to_plain_string())
    };

    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ if name == "id" => Err(UrlError::MissingId),
        _ => Err(UrlError::MissingPlaceholder(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::record::ResourceData;

    const TYPE: AttrKey<String> = AttrKey::new("type");

    fn ctx() -> ClientContext {
        ClientContext::new("https://cp.example.com").unwrap()
    }

    #[test]
    fn test_path_factory() {
        let url = UrlFactory::path("/api/v1/roles")
            .resolve(&ResourceData::new(), &ctx())
            .unwrap();
        assert_eq!(url, "https://cp.example.com/api/v1/roles");
    }

    #[test]
    fn test_with_id_appends_identity() {
        let record = ResourceData::new().with_id("r 1");
        let url = UrlFactory::path("/api/v1/roles/")
            .with_id()
            .resolve(&record, &ctx())
            .unwrap();
        assert_eq!(url, "https://cp.example.com/api/v1/roles/r%201");
    }

    #[test]
    fn test_with_id_requires_identity() {
        let err = UrlFactory::path("/api/v1/roles")
            .with_id()
            .resolve(&ResourceData::new(), &ctx())
            .unwrap_err();
        assert!(matches!(err, UrlError::MissingId));
    }

    #[test]
    fn test_template_embeds_id_mid_path() {
        let record = ResourceData::new()
            .with_id("p1")
            .with(TYPE, "security".to_string());
        let url = UrlFactory::template("/api/v1/policies/{type}/{id}")
            .resolve(&record, &ctx())
            .unwrap();
        assert_eq!(url, "https://cp.example.com/api/v1/policies/security/p1");
    }

    #[test]
    fn test_template_missing_placeholder() {
        let record = ResourceData::new().with_id("p1");
        let err = UrlFactory::template("/api/v1/policies/{type}/{id}")
            .resolve(&record, &ctx())
            .unwrap_err();
        assert!(matches!(err, UrlError::MissingPlaceholder(name) if name == "type"));
    }

    #[test]
    fn test_template_keeps_unclosed_brace() {
        let record = ResourceData::new().with_id("x");
        let url = UrlFactory::template("/odd/{id}/{tail")
            .resolve(&record, &ctx())
            .unwrap();
        assert_eq!(url, "https://cp.example.com/odd/x/{tail");
    }

    #[test]
    fn test_query_attr() {
        let base = UrlFactory::path("/api/v1/repositories").with_query_attr("packageType", TYPE);

        let url = base.resolve(&ResourceData::new(), &ctx()).unwrap();
        assert_eq!(url, "https://cp.example.com/api/v1/repositories");

        let record = ResourceData::new().with(TYPE, "npm & co".to_string());
        let url = base.resolve(&record, &ctx()).unwrap();
        assert_eq!(
            url,
            "https://cp.example.com/api/v1/repositories?packageType=npm+%26+co"
        );
    }
}
