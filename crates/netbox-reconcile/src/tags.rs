//! Tag/set synchronizer
//!
//! Tag sets are reconciled by full replacement: every create and update
//! submits the complete desired set and the remote replaces the object's
//! whole tag assignment. Names are resolved against the tag catalogue first;
//! if any name fails to resolve, nothing is submitted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use crate::api::{InventoryApi, ListQuery};
use crate::error::{ReconcileError, ReconcileResult};
use crate::ids::ObjectId;
use crate::lookup::{fetch_unique, LOOKUP_LIMIT};
use crate::record::{RemotePayload, RemoteRecord};
use crate::schema::ResourceSpec;
use crate::state::LocalState;

/// Endpoint of the remote tag catalogue.
pub const TAG_ENDPOINT: &str = "extras/tags";

/// A resolved tag reference, as submitted in write payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
}

impl TagRef {
    fn from_record(record: &RemoteRecord) -> ReconcileResult<Self> {
        let name = record
            .get_path("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ReconcileError::invalid_response("tag record has no name"))?;
        let slug = record
            .get_path("slug")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(Self {
            id: record.id,
            name: name.to_string(),
            slug: slug.to_string(),
        })
    }
}

/// Resolves tag names and writes tag-set attributes into payloads.
pub struct TagSynchronizer<'a, A: InventoryApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: InventoryApi + ?Sized> TagSynchronizer<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Resolve one tag name to its reference.
    pub async fn resolve(&self, name: &str) -> ReconcileResult<TagRef> {
        let query = ListQuery::new().filter("name", name).limit(LOOKUP_LIMIT);
        let record = fetch_unique(self.api, "tag", TAG_ENDPOINT, &query)
            .await
            .map_err(|err| match err {
                ReconcileError::NotFound { resource, .. } => {
                    ReconcileError::not_found(resource, format!("no tag named '{name}'"))
                }
                other => other,
            })?;
        TagRef::from_record(&record)
    }

    /// Resolve every name, failing on the first that does not resolve.
    pub async fn resolve_all(&self, names: &BTreeSet<String>) -> ReconcileResult<Vec<TagRef>> {
        let mut refs = Vec::with_capacity(names.len());
        for name in names {
            refs.push(self.resolve(name).await?);
        }
        Ok(refs)
    }

    /// Write the tag-set attributes of `state` into `payload`.
    ///
    /// A declared empty set is written as `[]` and clears the remote
    /// assignment. A tag-set attribute that was never set is left out.
    pub async fn apply(
        &self,
        state: &LocalState,
        spec: &ResourceSpec,
        payload: &mut RemotePayload,
    ) -> ReconcileResult<()> {
        let mut resolved = Vec::new();
        for attr in spec.tag_attributes() {
            let Some(value) = state.get(&attr.name) else {
                continue;
            };
            let names = value.as_set().ok_or_else(|| {
                ReconcileError::validation(attr.name.as_str(), "expected a set of tag names")
            })?;
            let refs = self.resolve_all(names).await?;
            debug!(resource = %spec.name(), attribute = %attr.name, count = refs.len(), "Resolved tags");
            resolved.push((attr.remote_path.as_str(), refs));
        }

        // Only touch the payload once every name has resolved.
        for (path, refs) in resolved {
            let value = serde_json::to_value(&refs)
                .map_err(|e| ReconcileError::invalid_response(e.to_string()))?;
            payload.set_path(path, value);
        }
        Ok(())
    }
}

/// Tag names in a remote tag field: an array of objects carrying `name`, or
/// of bare strings.
pub(crate) fn tag_names(json: &Value) -> Option<BTreeSet<String>> {
    json.as_array()?
        .iter()
        .map(|item| match item {
            Value::String(name) => Some(name.clone()),
            Value::Object(fields) => fields.get("name")?.as_str().map(str::to_string),
            _ => None,
        })
        .collect()
}
