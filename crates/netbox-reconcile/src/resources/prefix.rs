//! `netbox_prefix`: prefix lookup by CIDR and/or VLAN id.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::vlan_group::{MAX_VID, MIN_VID};
use super::{optional_integer, optional_string, resolved_id, LookupFilter, LookupRecord};
use crate::error::ReconcileResult;
use crate::ids::ObjectId;
use crate::schema::{AttributeKind, AttributeSpec, ResourceSpec, Validator};
use crate::state::LocalState;
use crate::value::AttributeSet;

pub static PREFIX: LazyLock<ResourceSpec> = LazyLock::new(|| {
    ResourceSpec::new("netbox_prefix", "ipam/prefixes")
        .with_attribute(
            AttributeSpec::optional("cidr", AttributeKind::String)
                .remote("prefix")
                .filter("prefix")
                .validate(Validator::Cidr),
        )
        .with_attribute(
            AttributeSpec::optional("vlan_vid", AttributeKind::Integer)
                .remote("vlan.vid")
                .filter("vlan_vid")
                .validate(Validator::IntRange {
                    min: MIN_VID,
                    max: MAX_VID,
                }),
        )
        .with_attribute(AttributeSpec::computed("vrf_id", AttributeKind::Integer).remote("vrf.id"))
        .at_least_one_of(&["cidr", "vlan_vid"])
});

/// Prefix lookup filter. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_vid: Option<i64>,
}

impl PrefixFilter {
    pub fn by_cidr(cidr: impl Into<String>) -> Self {
        Self {
            cidr: Some(cidr.into()),
            vlan_vid: None,
        }
    }

    pub fn by_vlan_vid(vlan_vid: i64) -> Self {
        Self {
            cidr: None,
            vlan_vid: Some(vlan_vid),
        }
    }
}

impl LookupFilter for PrefixFilter {
    type Output = Prefix;

    fn spec() -> &'static ResourceSpec {
        &PREFIX
    }

    fn candidates(&self) -> AttributeSet {
        AttributeSet::new()
            .with_opt("cidr", self.cidr.clone())
            .with_opt("vlan_vid", self.vlan_vid)
    }
}

/// A resolved prefix. Zero means the remote left the field empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefix {
    pub id: ObjectId,
    pub cidr: String,
    pub vlan_vid: i64,
    pub vrf_id: i64,
}

impl LookupRecord for Prefix {
    fn from_state(state: &LocalState) -> ReconcileResult<Self> {
        let attrs = state.attributes();
        Ok(Self {
            id: resolved_id(state)?,
            cidr: optional_string(attrs, "cidr").unwrap_or_default(),
            vlan_vid: optional_integer(attrs, "vlan_vid").unwrap_or_default(),
            vrf_id: optional_integer(attrs, "vrf_id").unwrap_or_default(),
        })
    }
}
