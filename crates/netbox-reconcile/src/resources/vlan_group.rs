//! `netbox_vlan_group`: reconciled VLAN groups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::{optional_integer, optional_string, required_set, required_string, ResourceConfig};
use crate::error::ReconcileResult;
use crate::schema::{AttributeKind, AttributeSpec, ResourceSpec, Validator};
use crate::value::{AttributeSet, ScopeReference};

/// Lowest valid VLAN id.
pub const MIN_VID: i64 = 1;
/// Highest valid VLAN id.
pub const MAX_VID: i64 = 4094;

/// Content types a VLAN group can be scoped to.
pub const SCOPE_TYPES: &[&str] = &[
    "dcim.location",
    "dcim.rack",
    "dcim.region",
    "dcim.site",
    "dcim.sitegroup",
    "virtualization.cluster",
    "virtualization.clustergroup",
];

pub static VLAN_GROUP: LazyLock<ResourceSpec> = LazyLock::new(|| {
    let vid_range = Validator::IntRange {
        min: MIN_VID,
        max: MAX_VID,
    };
    ResourceSpec::new("netbox_vlan_group", "ipam/vlan-groups")
        .with_attribute(AttributeSpec::required("name", AttributeKind::String))
        .with_attribute(AttributeSpec::required("slug", AttributeKind::String))
        .with_attribute(
            AttributeSpec::optional("description", AttributeKind::String).default_value(""),
        )
        .with_attribute(
            AttributeSpec::optional("min_vid", AttributeKind::Integer)
                .default_value(MIN_VID)
                .validate(vid_range.clone())
                .with_description("Lowest permissible VLAN id in the group"),
        )
        .with_attribute(
            AttributeSpec::optional("max_vid", AttributeKind::Integer)
                .default_value(MAX_VID)
                .validate(vid_range)
                .with_description("Highest permissible VLAN id in the group"),
        )
        .with_attribute(
            AttributeSpec::optional("scope_type", AttributeKind::String)
                .nullable()
                .validate(Validator::one_of(SCOPE_TYPES)),
        )
        .with_attribute(AttributeSpec::optional("scope_id", AttributeKind::Integer).nullable())
        .with_attribute(AttributeSpec::required("tags", AttributeKind::TagSet))
        .with_scope("scope_type", "scope_id")
});

/// Declared configuration of a VLAN group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanGroupConfig {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_vid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_vid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeReference>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl VlanGroupConfig {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope_type: impl Into<String>, scope_id: i64) -> Self {
        self.scope = Some(ScopeReference::new(scope_type, scope_id));
        self
    }

    #[must_use]
    pub fn with_vid_range(mut self, min_vid: i64, max_vid: i64) -> Self {
        self.min_vid = Some(min_vid);
        self.max_vid = Some(max_vid);
        self
    }
}

impl ResourceConfig for VlanGroupConfig {
    fn spec() -> &'static ResourceSpec {
        &VLAN_GROUP
    }

    fn to_attributes(&self) -> AttributeSet {
        AttributeSet::new()
            .with("name", self.name.as_str())
            .with("slug", self.slug.as_str())
            .with_opt("description", self.description.clone())
            .with_opt("min_vid", self.min_vid)
            .with_opt("max_vid", self.max_vid)
            .with_opt("scope_type", self.scope.as_ref().map(|s| s.scope_type.clone()))
            .with_opt("scope_id", self.scope.as_ref().map(|s| s.scope_id))
            .with("tags", self.tags.clone())
    }

    fn from_attributes(attrs: &AttributeSet) -> ReconcileResult<Self> {
        let scope = match (
            optional_string(attrs, "scope_type").filter(|t| !t.is_empty()),
            optional_integer(attrs, "scope_id").filter(|id| *id != 0),
        ) {
            (Some(scope_type), Some(scope_id)) => Some(ScopeReference::new(scope_type, scope_id)),
            _ => None,
        };
        Ok(Self {
            name: required_string(attrs, "name")?,
            slug: required_string(attrs, "slug")?,
            description: optional_string(attrs, "description"),
            min_vid: optional_integer(attrs, "min_vid"),
            max_vid: optional_integer(attrs, "max_vid"),
            scope,
            tags: required_set(attrs, "tags")?,
        })
    }
}
