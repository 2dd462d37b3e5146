//! State documents
//!
//! A resource's desired and observed state lives in one file, JSON or YAML
//! depending on the extension:
//!
//! ```yaml
//! kind: repository
//! id: "42"
//! attributes:
//!   key: libs-release
//!   package_type: maven
//! updated_at: 2026-10-18T09:30:00Z
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{AttrValue, ResourceData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFormat {
    Json,
    Yaml,
}

impl StateFormat {
    /// `.yaml`/`.yml` are YAML, everything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StateDocument {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: String::new(),
            attributes: BTreeMap::new(),
            updated_at: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        Self::parse(&content, StateFormat::from_path(path))
            .with_context(|| format!("Failed to parse state file {}", path.display()))
    }

    pub fn parse(content: &str, format: StateFormat) -> Result<Self> {
        let doc: Self = match format {
            StateFormat::Json => serde_json::from_str(content)?,
            StateFormat::Yaml => serde_yaml::from_str(content)?,
        };
        if doc.kind.trim().is_empty() {
            bail!("state document has no kind");
        }
        Ok(doc)
    }

    pub fn render(&self, format: StateFormat) -> Result<String> {
        Ok(match format {
            StateFormat::Json => serde_json::to_string_pretty(self)?,
            StateFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(StateFormat::from_path(path))?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write state file {}", path.display()))
    }

    /// Split into the record the flows operate on.
    pub fn to_record(&self) -> ResourceData {
        ResourceData::from_parts(self.id.clone(), self.attributes.clone())
    }

    /// Take the record's id and attributes and stamp the update time.
    pub fn update_from(&mut self, record: ResourceData) {
        let (id, attributes) = record.into_parts();
        self.id = id;
        self.attributes = attributes;
        self.updated_at = Some(Utc::now());
    }
}
