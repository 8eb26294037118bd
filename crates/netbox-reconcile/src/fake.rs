//! In-memory inventory for unit tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::api::{InventoryApi, ListPage, ListQuery};
use crate::error::{ReconcileError, ReconcileResult};
use crate::ids::ObjectId;
use crate::record::{RemotePayload, RemoteRecord};

#[derive(Default)]
struct Inner {
    next_id: i64,
    objects: BTreeMap<String, BTreeMap<i64, Map<String, Value>>>,
    calls: Vec<String>,
    list_limits: Vec<Option<u32>>,
    reported_count: Option<u64>,
    uppercase: BTreeSet<String>,
    failures: BTreeMap<&'static str, u16>,
}

/// Stores objects per endpoint with ids from a single counter.
#[derive(Default)]
pub struct FakeInventory {
    inner: Mutex<Inner>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Seed an object, bypassing the call log. Returns its id.
    pub fn insert(&self, endpoint: &str, fields: Value) -> i64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let Value::Object(fields) = fields else {
            panic!("seed objects must be JSON objects");
        };
        inner
            .objects
            .entry(endpoint.to_string())
            .or_default()
            .insert(id, fields);
        id
    }

    /// Delete out-of-band.
    pub fn remove(&self, endpoint: &str, id: i64) {
        if let Some(objects) = self.lock().objects.get_mut(endpoint) {
            objects.remove(&id);
        }
    }

    /// Modify out-of-band.
    pub fn patch(&self, endpoint: &str, id: i64, fields: Value) {
        let mut inner = self.lock();
        let object = inner
            .objects
            .get_mut(endpoint)
            .and_then(|objects| objects.get_mut(&id))
            .expect("patched object exists");
        if let Value::Object(fields) = fields {
            object.extend(fields);
        }
    }

    pub fn get(&self, endpoint: &str, id: i64) -> Option<Value> {
        self.lock()
            .objects
            .get(endpoint)
            .and_then(|objects| objects.get(&id))
            .map(|fields| Value::Object(fields.clone()))
    }

    /// Calls seen so far, e.g. `"read extras/webhooks 1"`. Tag catalogue
    /// listings are not recorded.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn list_limits(&self) -> Vec<Option<u32>> {
        self.lock().list_limits.clone()
    }

    /// Override the `count` reported by listings.
    pub fn set_reported_count(&self, count: Option<u64>) {
        self.lock().reported_count = count;
    }

    /// Store this string field upper-cased, like a server-side normalization.
    pub fn uppercase_field(&self, field: &str) {
        self.lock().uppercase.insert(field.to_string());
    }

    /// Make the next call of `operation` fail with an HTTP-like status.
    pub fn fail_next(&self, operation: &'static str, status: u16) {
        self.lock().failures.insert(operation, status);
    }

    fn check_failure(inner: &mut Inner, operation: &'static str) -> ReconcileResult<()> {
        match inner.failures.remove(operation) {
            None => Ok(()),
            Some(404) => Err(ReconcileError::not_found("object", "injected")),
            Some(status) if status >= 500 => Err(ReconcileError::unavailable(format!(
                "injected HTTP {status}"
            ))),
            Some(status) => Err(ReconcileError::Rejected {
                status,
                detail: "injected".to_string(),
            }),
        }
    }

    fn store(inner: &Inner, payload: &RemotePayload) -> Map<String, Value> {
        let mut fields = payload.as_map().clone();
        for name in &inner.uppercase {
            if let Some(Value::String(s)) = fields.get_mut(name) {
                *s = s.to_uppercase();
            }
        }
        fields
    }

    fn record(id: i64, fields: &Map<String, Value>) -> RemoteRecord {
        RemoteRecord {
            id: ObjectId::new(id),
            fields: fields.clone(),
        }
    }
}

fn field_matches(fields: &Map<String, Value>, param: &str, expected: &str) -> bool {
    let value = fields
        .get(param)
        .or_else(|| {
            let (head, tail) = param.split_once('_')?;
            fields.get(head)?.get(tail)
        });
    match value {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

#[async_trait]
impl InventoryApi for FakeInventory {
    async fn list(&self, endpoint: &str, query: &ListQuery) -> ReconcileResult<ListPage> {
        let mut inner = self.lock();
        if endpoint != crate::tags::TAG_ENDPOINT {
            inner.calls.push(format!("list {endpoint}"));
            inner.list_limits.push(query.limit);
        }
        Self::check_failure(&mut inner, "list")?;

        let matches: Vec<RemoteRecord> = inner
            .objects
            .get(endpoint)
            .into_iter()
            .flatten()
            .filter(|(_, fields)| {
                query
                    .filters
                    .iter()
                    .all(|(param, value)| field_matches(fields, param, value))
            })
            .map(|(id, fields)| Self::record(*id, fields))
            .collect();

        let count = inner.reported_count.unwrap_or(matches.len() as u64);
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(ListPage {
            count,
            results: matches.into_iter().take(limit).collect(),
        })
    }

    async fn create(&self, endpoint: &str, payload: &RemotePayload) -> ReconcileResult<RemoteRecord> {
        let mut inner = self.lock();
        inner.calls.push(format!("create {endpoint}"));
        Self::check_failure(&mut inner, "create")?;

        inner.next_id += 1;
        let id = inner.next_id;
        let fields = Self::store(&inner, payload);
        let record = Self::record(id, &fields);
        inner
            .objects
            .entry(endpoint.to_string())
            .or_default()
            .insert(id, fields);
        Ok(record)
    }

    async fn read(&self, endpoint: &str, id: ObjectId) -> ReconcileResult<RemoteRecord> {
        let mut inner = self.lock();
        inner.calls.push(format!("read {endpoint} {id}"));
        Self::check_failure(&mut inner, "read")?;

        inner
            .objects
            .get(endpoint)
            .and_then(|objects| objects.get(&id.get()))
            .map(|fields| Self::record(id.get(), fields))
            .ok_or_else(|| ReconcileError::not_found(endpoint, format!("no object {id}")))
    }

    async fn update(
        &self,
        endpoint: &str,
        id: ObjectId,
        payload: &RemotePayload,
    ) -> ReconcileResult<RemoteRecord> {
        let mut inner = self.lock();
        inner.calls.push(format!("update {endpoint} {id}"));
        Self::check_failure(&mut inner, "update")?;

        let fields = Self::store(&inner, payload);
        let slot = inner
            .objects
            .get_mut(endpoint)
            .and_then(|objects| objects.get_mut(&id.get()))
            .ok_or_else(|| ReconcileError::not_found(endpoint, format!("no object {id}")))?;
        *slot = fields;
        Ok(Self::record(id.get(), slot))
    }

    async fn delete(&self, endpoint: &str, id: ObjectId) -> ReconcileResult<()> {
        let mut inner = self.lock();
        inner.calls.push(format!("delete {endpoint} {id}"));
        Self::check_failure(&mut inner, "delete")?;

        inner
            .objects
            .get_mut(endpoint)
            .and_then(|objects| objects.remove(&id.get()))
            .map(|_| ())
            .ok_or_else(|| ReconcileError::not_found(endpoint, format!("no object {id}")))
    }
}
