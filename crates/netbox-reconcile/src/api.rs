//! Remote inventory boundary
//!
//! The core never talks HTTP itself. It drives any implementation of
//! [`InventoryApi`], which the caller passes in explicitly.

use async_trait::async_trait;

use crate::error::ReconcileResult;
use crate::ids::ObjectId;
use crate::record::{RemotePayload, RemoteRecord};

/// Filter and size parameters for a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Query parameters, in insertion order.
    pub filters: Vec<(String, String)>,
    /// Maximum number of results to return.
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter parameter.
    pub fn filter(mut self, param: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((param.into(), value.into()));
        self
    }

    /// Cap the number of returned results.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One page of list results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Total number of matches reported by the remote, independent of the limit.
    pub count: u64,
    pub results: Vec<RemoteRecord>,
}

impl ListPage {
    /// Number of matches, trusting whichever of the reported total and the
    /// returned results is larger.
    #[must_use]
    pub fn match_count(&self) -> u64 {
        self.count.max(self.results.len() as u64)
    }
}

/// Per-endpoint CRUD and list operations of the remote inventory.
///
/// Implementations report a missing object as
/// [`ReconcileError::NotFound`](crate::error::ReconcileError::NotFound) so
/// that it can be told apart from every other failure.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// List objects on an endpoint.
    async fn list(&self, endpoint: &str, query: &ListQuery) -> ReconcileResult<ListPage>;

    /// Create an object and return the stored record.
    async fn create(&self, endpoint: &str, payload: &RemotePayload)
        -> ReconcileResult<RemoteRecord>;

    /// Fetch one object by id.
    async fn read(&self, endpoint: &str, id: ObjectId) -> ReconcileResult<RemoteRecord>;

    /// Replace an object by id.
    async fn update(
        &self,
        endpoint: &str,
        id: ObjectId,
        payload: &RemotePayload,
    ) -> ReconcileResult<RemoteRecord>;

    /// Delete an object by id.
    async fn delete(&self, endpoint: &str, id: ObjectId) -> ReconcileResult<()>;
}
