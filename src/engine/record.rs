//! Configuration records
//!
//! A record is one resource instance's state: an identity plus named
//! attributes. Attribute values are a small tagged union, and [`AttrKey`]
//! gives readers and writers a typed handle on each attribute so a model
//! that reads a `bool` where the record holds a string fails on the key
//! declaration, not deep inside a payload.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RecordError;

/// Value of a single record attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<AttrValue>),
    /// Unordered set of strings.
    Set(BTreeSet<String>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render a scalar for use inside a URL or message.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::UInt(u) => Some(u.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Self::Int(i),
                (None, Some(u)) => Self::UInt(u),
                _ => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::UInt(u) => Value::from(*u),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Set(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<AttrValue> for Value {
    fn from(value: AttrValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Rust types that can be stored in a record attribute.
pub trait AttrType: Sized {
    const TYPE_NAME: &'static str;

    fn from_attr(value: &AttrValue) -> Option<Self>;

    fn into_attr(self) -> AttrValue;
}

impl AttrType for String {
    const TYPE_NAME: &'static str = "string";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn into_attr(self) -> AttrValue {
        AttrValue::String(self)
    }
}

impl AttrType for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn into_attr(self) -> AttrValue {
        AttrValue::Bool(self)
    }
}

impl AttrType for i64 {
    const TYPE_NAME: &'static str = "int";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn into_attr(self) -> AttrValue {
        AttrValue::Int(self)
    }
}

impl AttrType for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    fn into_attr(self) -> AttrValue {
        AttrValue::Float(self)
    }
}

impl AttrType for Vec<String> {
    const TYPE_NAME: &'static str = "list of strings";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::List(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    fn into_attr(self) -> AttrValue {
        AttrValue::List(self.into_iter().map(AttrValue::String).collect())
    }
}

// Sets round-trip through state files as plain arrays, so lists of strings
// are accepted too.
impl AttrType for BTreeSet<String> {
    const TYPE_NAME: &'static str = "set of strings";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Set(items) => Some(items.clone()),
            AttrValue::List(_) => Vec::<String>::from_attr(value).map(|v| v.into_iter().collect()),
            _ => None,
        }
    }

    fn into_attr(self) -> AttrValue {
        AttrValue::Set(self)
    }
}

impl AttrType for BTreeMap<String, String> {
    const TYPE_NAME: &'static str = "map of strings";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Map(map) => map
                .iter()
                .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
            _ => None,
        }
    }

    fn into_attr(self) -> AttrValue {
        AttrValue::Map(
            self.into_iter()
                .map(|(k, v)| (k, AttrValue::String(v)))
                .collect(),
        )
    }
}

/// Typed name of a record attribute.
///
/// ```ignore
/// const NAME: AttrKey<String> = AttrKey::new("name");
/// let name: Option<String> = record.get_attr(NAME)?;
/// ```
pub struct AttrKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AttrKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for AttrKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttrKey<T> {}

impl<T> std::fmt::Debug for AttrKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AttrKey({})", self.name)
    }
}

/// Mutable state of one resource instance.
///
/// Flows own their record exclusively for the duration of an invocation.
pub trait Record: Send {
    /// Raw attribute value, `None` when the attribute was never set.
    fn get(&self, name: &str) -> Option<&AttrValue>;

    fn set(&mut self, name: &str, value: AttrValue) -> Result<(), RecordError>;

    /// Current identity, empty when the resource does not exist remotely.
    fn id(&self) -> &str;

    fn set_id(&mut self, id: &str);
}

/// Typed accessors available on every [`Record`], including `dyn Record`.
pub trait RecordExt {
    /// Read a typed attribute; absent and null both yield `Ok(None)`.
    fn get_attr<T: AttrType>(&self, key: AttrKey<T>) -> Result<Option<T>, RecordError>;

    /// Read a typed attribute that must be present.
    fn require<T: AttrType>(&self, key: AttrKey<T>) -> Result<T, RecordError>;

    fn set_attr<T: AttrType>(&mut self, key: AttrKey<T>, value: T) -> Result<(), RecordError>;

    /// Set the attribute, or null it when `value` is `None`.
    fn set_opt<T: AttrType>(&mut self, key: AttrKey<T>, value: Option<T>) -> Result<(), RecordError>;

    fn has_id(&self) -> bool;

    fn clear_id(&mut self);
}

impl<R: Record + ?Sized> RecordExt for R {
    fn get_attr<T: AttrType>(&self, key: AttrKey<T>) -> Result<Option<T>, RecordError> {
        match self.get(key.name()) {
            None | Some(AttrValue::Null) => Ok(None),
            Some(value) => T::from_attr(value)
                .map(Some)
                .ok_or_else(|| RecordError::TypeMismatch {
                    name: key.name().to_string(),
                    expected: T::TYPE_NAME,
                    found: value.type_name(),
                }),
        }
    }

    fn require<T: AttrType>(&self, key: AttrKey<T>) -> Result<T, RecordError> {
        self.get_attr(key)?.ok_or_else(|| RecordError::Missing {
            name: key.name().to_string(),
        })
    }

    fn set_attr<T: AttrType>(&mut self, key: AttrKey<T>, value: T) -> Result<(), RecordError> {
        self.set(key.name(), value.into_attr())
    }

    fn set_opt<T: AttrType>(&mut self, key: AttrKey<T>, value: Option<T>) -> Result<(), RecordError> {
        match value {
            Some(value) => self.set_attr(key, value),
            None => self.set(key.name(), AttrValue::Null),
        }
    }

    fn has_id(&self) -> bool {
        !self.id().is_empty()
    }

    fn clear_id(&mut self) {
        self.set_id("");
    }
}

/// In-memory record backed by an ordered attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, AttrValue>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set an attribute using builder pattern.
    pub fn with<T: AttrType>(mut self, key: AttrKey<T>, value: T) -> Self {
        self.attributes.insert(key.name().to_string(), value.into_attr());
        self
    }

    pub fn from_parts(id: impl Into<String>, attributes: BTreeMap<String, AttrValue>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    pub fn into_parts(self) -> (String, BTreeMap<String, AttrValue>) {
        (self.id, self.attributes)
    }
}

impl Record for ResourceData {
    fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    fn set(&mut self, name: &str, value: AttrValue) -> Result<(), RecordError> {
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: AttrKey<String> = AttrKey::new("name");
    const ENABLED: AttrKey<bool> = AttrKey::new("enabled");
    const TAGS: AttrKey<BTreeSet<String>> = AttrKey::new("tags");
    const SIZE: AttrKey<i64> = AttrKey::new("size");

    #[test]
    fn test_typed_get_and_set() {
        let mut record = ResourceData::new();
        record.set_attr(NAME, "alpha".to_string()).unwrap();
        record.set_attr(ENABLED, true).unwrap();

        assert_eq!(record.get_attr(NAME).unwrap(), Some("alpha".to_string()));
        assert_eq!(record.get_attr(ENABLED).unwrap(), Some(true));
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let record = ResourceData::new().with(NAME, "alpha".to_string());
        let wrong: AttrKey<bool> = AttrKey::new("name");

        let err = record.get_attr(wrong).unwrap_err();
        assert!(matches!(
            err,
            RecordError::TypeMismatch {
                expected: "bool",
                found: "string",
                ..
            }
        ));
    }

    #[test]
    fn test_null_reads_as_absent() {
        let mut record = ResourceData::new();
        record.set_opt(NAME, None).unwrap();
        assert_eq!(record.get_attr(NAME).unwrap(), None);
        assert!(matches!(
            record.require(NAME),
            Err(RecordError::Missing { .. })
        ));
    }

    #[test]
    fn test_set_accepts_list_of_strings() {
        let mut record = ResourceData::new();
        record
            .set("tags", AttrValue::from_json(&json!(["b", "a", "b"])))
            .unwrap();

        let tags = record.get_attr(TAGS).unwrap().unwrap();
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_json_conversion_keeps_integers() {
        let value = AttrValue::from_json(&json!({"count": 3, "ratio": 0.5}));
        let AttrValue::Map(map) = &value else {
            panic!("expected map");
        };
        assert_eq!(map.get("count"), Some(&AttrValue::Int(3)));
        assert_eq!(map.get("ratio"), Some(&AttrValue::Float(0.5)));
        assert_eq!(value.to_json(), json!({"count": 3, "ratio": 0.5}));
    }

    #[test]
    fn test_json_conversion_keeps_large_unsigned_integers() {
        let value = AttrValue::from_json(&json!(u64::MAX));
        assert_eq!(value, AttrValue::UInt(u64::MAX));
        assert_eq!(value.to_json(), json!(18446744073709551615u64));
        assert_eq!(value.to_plain_string().as_deref(), Some("18446744073709551615"));

        let record = ResourceData::new().with(SIZE, 7);
        let written = serde_json::to_string(&record).unwrap();
        let mut reread: ResourceData = serde_json::from_str(&written).unwrap();
        reread
            .set("size", AttrValue::from_json(&json!(18446744073709551615u64)))
            .unwrap();
        let written = serde_json::to_string(&reread).unwrap();
        assert!(written.contains("18446744073709551615"));
    }

    #[test]
    fn test_clear_id() {
        let mut record = ResourceData::new().with_id("r1");
        assert!(record.has_id());
        record.clear_id();
        assert_eq!(record.id(), "");
        assert!(!record.has_id());
    }
}
