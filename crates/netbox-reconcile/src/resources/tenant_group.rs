//! `netbox_tenant_group`: tenant group lookup by name or slug.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::{optional_integer, optional_string, resolved_id, LookupFilter, LookupRecord};
use crate::error::ReconcileResult;
use crate::ids::ObjectId;
use crate::schema::{AttributeKind, AttributeSpec, ResourceSpec};
use crate::state::LocalState;
use crate::value::AttributeSet;

pub static TENANT_GROUP: LazyLock<ResourceSpec> = LazyLock::new(|| {
    ResourceSpec::new("netbox_tenant_group", "tenancy/tenant-groups")
        .with_attribute(AttributeSpec::optional("name", AttributeKind::String).filter("name"))
        .with_attribute(AttributeSpec::optional("slug", AttributeKind::String).filter("slug"))
        .with_attribute(AttributeSpec::computed("description", AttributeKind::String))
        .with_attribute(
            AttributeSpec::computed("parent_id", AttributeKind::Integer).remote("parent.id"),
        )
        .at_least_one_of(&["name", "slug"])
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantGroupFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl TenantGroupFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            slug: None,
        }
    }

    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self {
            name: None,
            slug: Some(slug.into()),
        }
    }
}

impl LookupFilter for TenantGroupFilter {
    type Output = TenantGroup;

    fn spec() -> &'static ResourceSpec {
        &TENANT_GROUP
    }

    fn candidates(&self) -> AttributeSet {
        AttributeSet::new()
            .with_opt("name", self.name.clone())
            .with_opt("slug", self.slug.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantGroup {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Zero for a top-level group.
    pub parent_id: i64,
}

impl LookupRecord for TenantGroup {
    fn from_state(state: &LocalState) -> ReconcileResult<Self> {
        let attrs = state.attributes();
        Ok(Self {
            id: resolved_id(state)?,
            name: optional_string(attrs, "name").unwrap_or_default(),
            slug: optional_string(attrs, "slug").unwrap_or_default(),
            description: optional_string(attrs, "description").unwrap_or_default(),
            parent_id: optional_integer(attrs, "parent_id").unwrap_or_default(),
        })
    }
}
