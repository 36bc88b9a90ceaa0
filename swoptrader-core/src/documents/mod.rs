//! Loosely-typed document mapping for the cloud store.
//!
//! Every entity has a [`DocumentCodec`] pair. Writing is explicit per field;
//! reading goes through [`FieldReader`], which substitutes a fixed default
//! for any missing or mistyped field so that partially written or
//! schema-evolved documents still decode. Only a handful of linkage fields
//! (owner ids, parent ids) are required; a document missing one of those is
//! a [`DecodeError`] and gets skipped by list queries.

mod chat;
mod comment;
mod item;
mod offer;
mod trade_history;
mod user;

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::models::now_millis;

/// A cloud-store document body: string keys to JSON values.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Document '{0}' is not a map")]
    NotAMap(String),
    #[error("Document '{id}' is missing required field '{field}'")]
    MissingField { id: String, field: &'static str },
}

/// Conversion between an entity and its document representation.
pub trait DocumentCodec: Sized {
    fn to_document(&self) -> Document;

    /// Decodes a document body. `id` is the document key, which wins over any
    /// `id` field inside the body.
    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError>;

    fn from_value(id: &str, value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(doc) => Self::from_document(id, doc),
            _ => Err(DecodeError::NotAMap(id.to_string())),
        }
    }
}

/// Unwraps a `json!({...})` literal into a document.
pub(crate) fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Defensive field accessors over a document.
#[derive(Clone, Copy)]
pub struct FieldReader<'a> {
    id: &'a str,
    doc: &'a Document,
}

impl<'a> FieldReader<'a> {
    pub fn new(id: &'a str, doc: &'a Document) -> Self {
        Self { id, doc }
    }

    pub fn id(&self) -> &'a str {
        self.id
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.doc.get(key).filter(|v| !v.is_null())
    }

    pub fn opt_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn string(&self, key: &str) -> String {
        self.opt_string(key).unwrap_or_default()
    }

    /// A non-empty string the entity cannot exist without.
    pub fn required_string(&self, key: &'static str) -> Result<String, DecodeError> {
        self.opt_string(key)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DecodeError::MissingField {
                id: self.id.to_string(),
                field: key,
            })
    }

    pub fn opt_i64(&self, key: &str) -> Option<i64> {
        self.get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
    }

    pub fn i64(&self, key: &str) -> i64 {
        self.opt_i64(key).unwrap_or(0)
    }

    pub fn opt_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn f64(&self, key: &str) -> f64 {
        self.opt_f64(key).unwrap_or(0.0)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Epoch-millis timestamp, defaulting to the current time.
    pub fn millis_or_now(&self, key: &str) -> i64 {
        self.opt_i64(key).unwrap_or_else(now_millis)
    }

    /// Enum stored as a label; unknown or missing labels map to `T::default()`.
    pub fn enumeration<T: FromStr + Default>(&self, key: &str) -> T {
        self.get(key)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// String list; non-string elements are dropped.
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn map(&self, key: &str) -> Option<FieldReader<'a>> {
        self.get(key)
            .and_then(Value::as_object)
            .map(|doc| FieldReader { id: self.id, doc })
    }

    /// List of nested maps; non-map elements are dropped.
    pub fn maps(&self, key: &str) -> Vec<FieldReader<'a>> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|doc| FieldReader { id: self.id, doc })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// String-keyed counter map; non-numeric values are dropped.
    pub fn counts(&self, key: &str) -> BTreeMap<String, i64> {
        self.get(key)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_i64().map(|n| (k.clone(), n)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
