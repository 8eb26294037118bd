//! Remote representations: records read from the inventory and payloads
//! written to it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ReconcileError, ReconcileResult};
use crate::ids::ObjectId;

/// One object as returned by the inventory: a numeric id plus fields.
///
/// Fields may be missing or `null`; both mean "absent".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteRecord {
    pub id: ObjectId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RemoteRecord {
    /// Decode a record from a JSON object carrying a numeric `id`.
    pub fn from_json(value: Value) -> ReconcileResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ReconcileError::invalid_response("expected a JSON object"));
        };
        let id = fields
            .remove("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ReconcileError::invalid_response("record has no numeric 'id'"))?;
        Ok(Self {
            id: ObjectId::new(id),
            fields,
        })
    }

    /// Look up a field by dotted path. `null` at any step counts as absent.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.fields, path)
    }
}

impl<'de> Deserialize<'de> for RemoteRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RemoteRecord::from_json(value).map_err(serde::de::Error::custom)
    }
}

/// Body of a create or update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemotePayload(Map<String, Value>);

impl RemotePayload {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a field by dotted path, creating intermediate objects.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let mut segments = path.split('.').peekable();
        let mut current = &mut self.0;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), value);
                return;
            }
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            current = next;
        }
    }

    /// Look up a field by dotted path.
    ///
    /// Unlike [`RemoteRecord::get_path`], an explicit `null` is returned as is:
    /// in a payload it is the absence marker, not a missing field.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether a top-level or nested field is present (even if `null`).
    pub fn contains(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn lookup_path<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = fields.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}
