//! # NetBox Reconciliation Core
//!
//! Generic reconciliation and lookup of NetBox objects against a declared
//! configuration.
//!
//! Every resource type repeats the same pattern: map a declarative attribute
//! set to a partially-optional remote record and back, detect drift on read,
//! converge after writes, and resolve lookups without guessing. This crate
//! implements that pattern once, driven by per-resource descriptors.
//!
//! ## Architecture
//!
//! - [`FieldMapper`](mapper::FieldMapper) - Descriptor-driven local/remote translation
//! - [`TagSynchronizer`](tags::TagSynchronizer) - Full-replace tag set reconciliation
//! - [`Reconciler`](reconciler::Reconciler) - Create/Read/Update/Delete state machine
//! - [`LookupResolver`](lookup::LookupResolver) - Exactly-one-match lookups
//!
//! All of them talk to the inventory through [`InventoryApi`](api::InventoryApi),
//! which the caller passes in explicitly. The `netbox-client` crate provides
//! the HTTP implementation.
//!
//! ## Example
//!
//! ```ignore
//! use netbox_reconcile::prelude::*;
//!
//! let mut state = VlanGroupConfig::new("core", "core")
//!     .with_tag("net")
//!     .to_state()?;
//!
//! let reconciler = Reconciler::new(&client, &VLAN_GROUP);
//! reconciler.create(&mut state).await?;
//! assert_eq!(state.state(), ResourceState::Present);
//!
//! let prefix = lookup(&client, &PrefixFilter::by_cidr("10.0.0.0/24")).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`ids`] - Remote object identifiers
//! - [`error`] - Error types with transient/permanent classification
//! - [`value`] - Local attribute values
//! - [`schema`] - Resource descriptors
//! - [`state`] - Local resource state
//! - [`record`] - Remote records and write payloads
//! - [`api`] - The remote inventory boundary
//! - [`resources`] - The resource catalogue

pub mod api;
pub mod error;
pub mod ids;
pub mod lookup;
pub mod mapper;
pub mod reconciler;
pub mod record;
pub mod resources;
pub mod schema;
pub mod state;
pub mod tags;
pub mod value;

#[cfg(test)]
pub(crate) mod fake;

/// Prelude module for convenient imports.
///
/// ```
/// use netbox_reconcile::prelude::*;
/// ```
pub mod prelude {
    // IDs
    pub use crate::ids::ObjectId;

    // Error handling
    pub use crate::error::{ReconcileError, ReconcileResult};

    // Values and state
    pub use crate::state::{LocalState, ResourceState};
    pub use crate::value::{AttributeSet, AttributeValue, ScopeReference};

    // Schema
    pub use crate::schema::{AttributeKind, AttributeSpec, Presence, ResourceSpec, Validator};

    // Remote boundary
    pub use crate::api::{InventoryApi, ListPage, ListQuery};
    pub use crate::record::{RemotePayload, RemoteRecord};

    // Components
    pub use crate::lookup::{FilterPredicate, LookupResolver};
    pub use crate::mapper::FieldMapper;
    pub use crate::reconciler::{ReadOutcome, Reconciler};
    pub use crate::tags::{TagRef, TagSynchronizer};

    // Resources
    pub use crate::resources::prefix::{Prefix, PrefixFilter, PREFIX};
    pub use crate::resources::tenant::{
        Tenant, TenantConfig, TenantFilter, TENANT, TENANT_RESOURCE,
    };
    pub use crate::resources::tenant_group::{TenantGroup, TenantGroupFilter, TENANT_GROUP};
    pub use crate::resources::vlan_group::{VlanGroupConfig, VLAN_GROUP};
    pub use crate::resources::webhook::{WebhookConfig, WEBHOOK};
    pub use crate::resources::{lookup, LookupFilter, LookupRecord, ResourceConfig};
}

// Re-export async_trait for implementors of InventoryApi
pub use async_trait::async_trait;
