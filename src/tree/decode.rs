//! Typed decoding of leaf field maps.
//!
//! Store reads return untyped field maps. Each consumer declares the schema it
//! expects through [`FromFields`]; any mismatch becomes
//! [`StoreError::MalformedValue`] naming the path and field.

use serde_json::Value as JsonValue;

use super::model::{TemplateContent, Value};
use crate::store::{Fields, Result, StoreError};

/// Leaf schemas decodable from a store field map.
pub trait FromFields: Sized {
    fn from_fields(path: &str, fields: &Fields) -> Result<Self>;
}

/// `{verified: bool}` stored under `verification/<service>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationRecord {
    pub verified: bool,
}

impl FromFields for TemplateContent {
    fn from_fields(path: &str, fields: &Fields) -> Result<Self> {
        Ok(Self {
            data: string_field(path, fields, "data")?.to_string(),
            ext: string_field(path, fields, "ext")?.to_string(),
        })
    }
}

impl FromFields for VerificationRecord {
    fn from_fields(path: &str, fields: &Fields) -> Result<Self> {
        match fields.get("verified") {
            Some(JsonValue::Bool(verified)) => Ok(Self { verified: *verified }),
            _ => Err(StoreError::malformed(path, "verified", "bool")),
        }
    }
}

/// Every field of a file's leaf data, each required to be a string.
///
/// Field order follows the map returned by the store.
pub fn decode_values(path: &str, fields: &Fields) -> Result<Vec<Value>> {
    fields
        .iter()
        .map(|(key, value)| match value {
            JsonValue::String(s) => Ok(Value { key: key.clone(), value: s.clone() }),
            _ => Err(StoreError::malformed(path, key.as_str(), "string")),
        })
        .collect()
}

fn string_field<'a>(path: &str, fields: &'a Fields, name: &str) -> Result<&'a str> {
    fields
        .get(name)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| StoreError::malformed(path, name, "string"))
}
