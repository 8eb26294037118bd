//! CRUD reconciler
//!
//! Drives one resource instance through its lifecycle:
//!
//! ```text
//!           create                 delete
//!  Absent ─────────▶ Present ─────────────▶ Absent
//!     ▲                │  ▲
//!     └── read (404) ──┘  └── update / read
//! ```
//!
//! Create and update are always followed by a read, so the local state ends
//! up holding whatever the remote actually stored (including server-side
//! normalization), not what was submitted.

use tracing::{debug, info, warn};

use crate::api::InventoryApi;
use crate::error::{ReconcileError, ReconcileResult};
use crate::ids::ObjectId;
use crate::mapper::FieldMapper;
use crate::record::RemotePayload;
use crate::schema::ResourceSpec;
use crate::state::{LocalState, ResourceState};
use crate::tags::TagSynchronizer;

/// Outcome of a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The remote record exists and the local state now mirrors it.
    Present {
        /// Attributes whose value differed from the previous local state.
        drifted: Vec<String>,
    },
    /// The remote record no longer exists; the local id has been cleared.
    Gone,
}

impl ReadOutcome {
    pub fn is_gone(&self) -> bool {
        matches!(self, ReadOutcome::Gone)
    }
}

/// Reconciles local states of one resource type against the remote inventory.
pub struct Reconciler<'a, A: InventoryApi + ?Sized> {
    api: &'a A,
    spec: &'a ResourceSpec,
}

impl<'a, A: InventoryApi + ?Sized> Reconciler<'a, A> {
    pub fn new(api: &'a A, spec: &'a ResourceSpec) -> Self {
        Self { api, spec }
    }

    pub fn spec(&self) -> &ResourceSpec {
        self.spec
    }

    /// Create the remote object for an absent state, then read it back.
    ///
    /// If the create itself fails the state stays absent. Once the remote
    /// has confirmed the create the id is kept, even when the read-back
    /// fails, so a later read can converge on the existing object.
    pub async fn create(&self, state: &mut LocalState) -> ReconcileResult<()> {
        if state.state() != ResourceState::Absent {
            return Err(ReconcileError::InvalidState {
                operation: "create",
                state: state.state(),
            });
        }

        let payload = self.build_payload(state).await?;
        info!(resource = %self.spec.name(), "Creating remote object");
        let record = self.api.create(self.spec.endpoint(), &payload).await?;

        state.set_id(record.id);
        info!(resource = %self.spec.name(), id = %record.id, "Created remote object");

        self.converge(state, "create").await
    }

    /// Refresh the local state from the remote record.
    ///
    /// A remote 404 is drift, not an error: the id is cleared and
    /// [`ReadOutcome::Gone`] returned.
    pub async fn read(&self, state: &mut LocalState) -> ReconcileResult<ReadOutcome> {
        let id = self.require_present(state, "read")?;

        let record = match self.api.read(self.spec.endpoint(), id).await {
            Ok(record) => record,
            Err(err) if err.is_not_found() => {
                warn!(
                    resource = %self.spec.name(),
                    id = %id,
                    "Remote object no longer exists, clearing local id"
                );
                state.clear_id();
                return Ok(ReadOutcome::Gone);
            }
            Err(err) => return Err(err),
        };

        if record.id != id {
            return Err(ReconcileError::invalid_response(format!(
                "requested {} {id}, remote returned id {}",
                self.spec.name(),
                record.id
            )));
        }

        let fresh = FieldMapper::from_remote(&record, self.spec)?;
        let drifted = FieldMapper::drifted(state.attributes(), fresh.attributes());
        if drifted.is_empty() {
            debug!(resource = %self.spec.name(), id = %id, "Local state matches remote");
        } else {
            info!(
                resource = %self.spec.name(),
                id = %id,
                drifted = ?drifted,
                "Remote state differs from local state"
            );
        }

        state.replace_attributes(fresh.attributes().clone());
        Ok(ReadOutcome::Present { drifted })
    }

    /// Submit the local state to the existing remote object, then read it back.
    ///
    /// On failure the local state is left untouched.
    pub async fn update(&self, state: &mut LocalState) -> ReconcileResult<()> {
        let id = self.require_present(state, "update")?;

        let payload = self.build_payload(state).await?;
        info!(resource = %self.spec.name(), id = %id, "Updating remote object");
        self.api.update(self.spec.endpoint(), id, &payload).await?;

        self.converge(state, "update").await
    }

    /// Delete the remote object and clear the local id.
    ///
    /// On failure the record is assumed to still exist and the id is kept.
    pub async fn delete(&self, state: &mut LocalState) -> ReconcileResult<()> {
        let id = self.require_present(state, "delete")?;

        self.api.delete(self.spec.endpoint(), id).await?;
        state.clear_id();
        info!(resource = %self.spec.name(), id = %id, "Deleted remote object");
        Ok(())
    }

    /// Build a fully populated local state from an existing remote object.
    pub async fn import(&self, id: &str) -> ReconcileResult<LocalState> {
        let id = ObjectId::parse_local(id)
            .map_err(|e| ReconcileError::validation("id", e.to_string()))?
            .ok_or_else(|| ReconcileError::validation("id", "an identifier is required"))?;

        info!(resource = %self.spec.name(), id = %id, "Importing remote object");
        let record = self.api.read(self.spec.endpoint(), id).await?;
        FieldMapper::from_remote(&record, self.spec)
    }

    async fn build_payload(&self, state: &LocalState) -> ReconcileResult<RemotePayload> {
        let mut payload = FieldMapper::to_remote(state, self.spec)?;
        TagSynchronizer::new(self.api)
            .apply(state, self.spec, &mut payload)
            .await?;
        Ok(payload)
    }

    /// The mandatory read after a write.
    async fn converge(&self, state: &mut LocalState, operation: &str) -> ReconcileResult<()> {
        let id = state.id_string();
        match self.read(state).await? {
            ReadOutcome::Present { .. } => Ok(()),
            ReadOutcome::Gone => Err(ReconcileError::not_found(
                self.spec.name(),
                format!("object {id} disappeared right after {operation}"),
            )),
        }
    }

    fn require_present(&self, state: &LocalState, operation: &'static str) -> ReconcileResult<ObjectId> {
        state.id().ok_or(ReconcileError::InvalidState {
            operation,
            state: ResourceState::Absent,
        })
    }
}
