//! `netbox_tenant`: reconciled tenants, and tenant lookup by name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::{
    optional_integer, optional_string, required_set, required_string, resolved_id, LookupFilter,
    LookupRecord, ResourceConfig,
};
use crate::error::ReconcileResult;
use crate::ids::ObjectId;
use crate::schema::{AttributeKind, AttributeSpec, ResourceSpec, Validator};
use crate::state::LocalState;
use crate::value::AttributeSet;

/// Tenants as a reconciled resource.
pub static TENANT_RESOURCE: LazyLock<ResourceSpec> = LazyLock::new(|| {
    ResourceSpec::new("netbox_tenant", "tenancy/tenants")
        .with_attribute(AttributeSpec::required("name", AttributeKind::String))
        .with_attribute(AttributeSpec::required("slug", AttributeKind::String))
        .with_attribute(
            AttributeSpec::optional("description", AttributeKind::String).default_value(""),
        )
        .with_attribute(
            AttributeSpec::optional("group_id", AttributeKind::Integer)
                .remote("group.id")
                .nullable()
                .validate(Validator::IntRange {
                    min: 1,
                    max: i64::MAX,
                }),
        )
        .with_attribute(
            AttributeSpec::optional("tags", AttributeKind::TagSet)
                .default_value(BTreeSet::<String>::new()),
        )
});

/// Tenants as a lookup.
pub static TENANT: LazyLock<ResourceSpec> = LazyLock::new(|| {
    ResourceSpec::new("netbox_tenant", "tenancy/tenants")
        .with_attribute(AttributeSpec::required("name", AttributeKind::String).filter("name"))
        .with_attribute(AttributeSpec::computed("slug", AttributeKind::String))
        .with_attribute(AttributeSpec::computed("description", AttributeKind::String))
        .with_attribute(AttributeSpec::computed("group_id", AttributeKind::Integer).remote("group.id"))
});

/// Declared configuration of a tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub name: String,
    /// Derived from the name when not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TenantConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

impl ResourceConfig for TenantConfig {
    fn spec() -> &'static ResourceSpec {
        &TENANT_RESOURCE
    }

    fn to_attributes(&self) -> AttributeSet {
        let slug = self.slug.clone().unwrap_or_else(|| slugify(&self.name));
        AttributeSet::new()
            .with("name", self.name.as_str())
            .with("slug", slug)
            .with_opt("description", self.description.clone())
            .with_opt("group_id", self.group_id)
            .with("tags", self.tags.clone())
    }

    fn from_attributes(attrs: &AttributeSet) -> ReconcileResult<Self> {
        Ok(Self {
            name: required_string(attrs, "name")?,
            slug: Some(required_string(attrs, "slug")?),
            description: optional_string(attrs, "description"),
            group_id: optional_integer(attrs, "group_id").filter(|id| *id != 0),
            tags: required_set(attrs, "tags")?,
        })
    }
}

/// Lower-case the name, turn whitespace into `-`, and drop anything else
/// that is not allowed in a slug.
fn slugify(name: &str) -> String {
    name.trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            '-' | '_' => Some(c),
            c if c.is_whitespace() => Some('-'),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantFilter {
    pub name: String,
}

impl TenantFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl LookupFilter for TenantFilter {
    type Output = Tenant;

    fn spec() -> &'static ResourceSpec {
        &TENANT
    }

    fn candidates(&self) -> AttributeSet {
        AttributeSet::new().with("name", self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Zero when the tenant belongs to no group.
    pub group_id: i64,
}

impl LookupRecord for Tenant {
    fn from_state(state: &LocalState) -> ReconcileResult<Self> {
        let attrs = state.attributes();
        Ok(Self {
            id: resolved_id(state)?,
            name: optional_string(attrs, "name").unwrap_or_default(),
            slug: optional_string(attrs, "slug").unwrap_or_default(),
            description: optional_string(attrs, "description").unwrap_or_default(),
            group_id: optional_integer(attrs, "group_id").unwrap_or_default(),
        })
    }
}
