//! Identifier and payload types shared by every resource.
//!
//! # Design
//! Backends disagree on whether ids are strings or integers, and the same
//! backend often mixes both (`{"id": 5}` in one response, `"5"` in a URL).
//! `ResourceId` normalizes both into their decimal text so that equality and
//! URL formatting do not depend on the wire representation.

use std::fmt;

use serde_json::Value;

use crate::error::ApiError;

/// A loosely typed backend record: a JSON object.
pub type Payload = serde_json::Map<String, Value>;

/// Field name carrying the identifier in backend payloads.
pub const ID_FIELD: &str = "id";

/// Identifier of a persisted record.
///
/// The text is inserted into item URLs verbatim, without percent-encoding,
/// so ids containing `/`, spaces or `?` produce a different path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret a JSON value as an id. `Ok(None)` for `null`.
    ///
    /// Integral floats such as `5.0` normalize to `"5"`.
    pub fn from_value(value: &Value) -> Result<Option<Self>, ApiError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(ResourceId(s.clone()))),
            Value::Number(n) if n.is_u64() || n.is_i64() => Ok(Some(ResourceId(n.to_string()))),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                    Ok(Some(ResourceId(format!("{f:.0}"))))
                }
                _ => Err(ApiError::InvalidId(n.to_string())),
            },
            other => Err(ApiError::InvalidId(other.to_string())),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        ResourceId(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        ResourceId(s)
    }
}

impl From<u64> for ResourceId {
    fn from(n: u64) -> Self {
        ResourceId(n.to_string())
    }
}

/// Remove the `id` field from `payload` and return it.
///
/// Returns `Ok(None)` when the field is absent or `null`.
pub fn take_id(payload: &mut Payload) -> Result<Option<ResourceId>, ApiError> {
    match payload.remove(ID_FIELD) {
        Some(value) => ResourceId::from_value(&value),
        None => Ok(None),
    }
}
