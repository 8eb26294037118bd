//! Resource catalogue
//!
//! Each resource type is a process-wide [`ResourceSpec`] plus a typed record
//! that converts to and from a validated [`LocalState`]. Reconciled types
//! implement [`ResourceConfig`]; lookup-only types pair a [`LookupFilter`]
//! with a [`LookupRecord`].

pub mod prefix;
pub mod tenant;
pub mod tenant_group;
pub mod vlan_group;
pub mod webhook;

use std::collections::BTreeSet;

use crate::api::InventoryApi;
use crate::error::{ReconcileError, ReconcileResult};
use crate::lookup::{FilterPredicate, LookupResolver};
use crate::schema::ResourceSpec;
use crate::state::LocalState;
use crate::value::AttributeSet;

/// Typed configuration of a reconciled resource.
pub trait ResourceConfig: Sized {
    /// The resource descriptor.
    fn spec() -> &'static ResourceSpec;

    /// Declared attributes. Fields left as `None` are never set.
    fn to_attributes(&self) -> AttributeSet;

    /// Rebuild the typed record from attributes.
    fn from_attributes(attrs: &AttributeSet) -> ReconcileResult<Self>;

    /// Validate into a fresh, absent local state.
    fn to_state(&self) -> ReconcileResult<LocalState> {
        LocalState::declare(Self::spec(), self.to_attributes())
    }

    fn from_state(state: &LocalState) -> ReconcileResult<Self> {
        Self::from_attributes(state.attributes())
    }
}

/// Typed filter of a lookup-only resource.
pub trait LookupFilter {
    type Output: LookupRecord;

    /// The resource descriptor.
    fn spec() -> &'static ResourceSpec;

    /// Candidate filter attributes. Fields left as `None` are not sent.
    fn candidates(&self) -> AttributeSet;

    /// Validate into a predicate.
    fn predicate(&self) -> ReconcileResult<FilterPredicate> {
        FilterPredicate::new(Self::spec(), &self.candidates())
    }
}

/// Typed result of a lookup.
pub trait LookupRecord: Sized {
    fn from_state(state: &LocalState) -> ReconcileResult<Self>;
}

/// Resolve a typed filter to its single matching record.
pub async fn lookup<F, A>(api: &A, filter: &F) -> ReconcileResult<F::Output>
where
    F: LookupFilter,
    A: InventoryApi + ?Sized,
{
    let predicate = filter.predicate()?;
    let state = LookupResolver::new(api, F::spec()).resolve(&predicate).await?;
    F::Output::from_state(&state)
}

/// Reconciled resource types.
pub fn resources() -> [&'static ResourceSpec; 3] {
    [
        &vlan_group::VLAN_GROUP,
        &webhook::WEBHOOK,
        &tenant::TENANT_RESOURCE,
    ]
}

/// Lookup-only resource types. A name may also appear in [`resources`].
pub fn lookups() -> [&'static ResourceSpec; 3] {
    [&prefix::PREFIX, &tenant::TENANT, &tenant_group::TENANT_GROUP]
}

/// Find a reconciled resource type by name (e.g. "netbox_webhook").
pub fn find_resource(name: &str) -> Option<&'static ResourceSpec> {
    resources().into_iter().find(|spec| spec.name() == name)
}

/// Find a lookup by name (e.g. "netbox_prefix").
pub fn find_lookup(name: &str) -> Option<&'static ResourceSpec> {
    lookups().into_iter().find(|spec| spec.name() == name)
}

// Attribute accessors shared by the typed records.

fn missing(name: &str) -> ReconcileError {
    ReconcileError::validation(name, "attribute is not set")
}

pub(crate) fn required_string(attrs: &AttributeSet, name: &str) -> ReconcileResult<String> {
    attrs
        .get_string(name)
        .map(str::to_string)
        .ok_or_else(|| missing(name))
}

pub(crate) fn optional_string(attrs: &AttributeSet, name: &str) -> Option<String> {
    attrs.get_string(name).map(str::to_string)
}

pub(crate) fn optional_integer(attrs: &AttributeSet, name: &str) -> Option<i64> {
    attrs.get_integer(name)
}

pub(crate) fn optional_boolean(attrs: &AttributeSet, name: &str) -> Option<bool> {
    attrs.get_boolean(name)
}

pub(crate) fn required_set(attrs: &AttributeSet, name: &str) -> ReconcileResult<BTreeSet<String>> {
    attrs.get_set(name).cloned().ok_or_else(|| missing(name))
}

/// The id of a resolved state, which lookups always set.
pub(crate) fn resolved_id(state: &LocalState) -> ReconcileResult<crate::ids::ObjectId> {
    state
        .id()
        .ok_or_else(|| ReconcileError::invalid_response("resolved record has no id"))
}
