//! Resource descriptors
//!
//! A [`ResourceSpec`] is the static description of one resource type: its
//! remote endpoint and an attribute table. Everything that differs between
//! resource types is expressed here as data; the mapper, reconciler, and
//! lookup resolver are generic over it.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};
use crate::value::{AttributeSet, AttributeValue};

/// Semantic type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Integer,
    Boolean,
    /// Unordered set of plain strings, written to the remote as-is.
    StringSet,
    /// Unordered set of tag names, resolved to tag references on write.
    TagSet,
}

impl AttributeKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Boolean => "boolean",
            AttributeKind::StringSet => "set of string",
            AttributeKind::TagSet => "tag set",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who supplies an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Must be declared locally.
    Required,
    /// May be declared locally.
    Optional,
    /// Only ever populated from the remote record.
    Computed,
}

/// Value check applied to a declared attribute before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Validator {
    /// IPv4/IPv6 network in `address/length` notation.
    Cidr,
    /// Inclusive integer range.
    IntRange { min: i64, max: i64 },
    /// Membership in a fixed set of strings.
    OneOf {
        values: Vec<String>,
        #[serde(default)]
        ignore_case: bool,
    },
}

impl Validator {
    /// Build a membership validator.
    pub fn one_of(values: &[&str]) -> Self {
        Validator::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
            ignore_case: false,
        }
    }

    /// Build a case-insensitive membership validator.
    pub fn one_of_ignore_case(values: &[&str]) -> Self {
        Validator::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
            ignore_case: true,
        }
    }

    /// Check a value against this validator.
    pub fn check(&self, attribute: &str, value: &AttributeValue) -> ReconcileResult<()> {
        match self {
            Validator::Cidr => {
                let s = value.as_str().ok_or_else(|| {
                    ReconcileError::validation(attribute, "CIDR validator expects a string")
                })?;
                if !s.contains('/') || s.parse::<IpNetwork>().is_err() {
                    return Err(ReconcileError::validation(
                        attribute,
                        format!("expected a valid CIDR, got '{s}'"),
                    ));
                }
                Ok(())
            }
            Validator::IntRange { min, max } => {
                let i = value.as_integer().ok_or_else(|| {
                    ReconcileError::validation(attribute, "range validator expects an integer")
                })?;
                if i < *min || i > *max {
                    return Err(ReconcileError::validation(
                        attribute,
                        format!("expected a value in the range {min}-{max}, got {i}"),
                    ));
                }
                Ok(())
            }
            Validator::OneOf {
                values,
                ignore_case,
            } => {
                let candidates: Vec<&str> = match value {
                    AttributeValue::String(s) => vec![s.as_str()],
                    AttributeValue::Set(set) => set.iter().map(String::as_str).collect(),
                    _ => {
                        return Err(ReconcileError::validation(
                            attribute,
                            "membership validator expects a string or a set",
                        ))
                    }
                };
                for candidate in candidates {
                    let allowed = values.iter().any(|v| {
                        if *ignore_case {
                            v.eq_ignore_ascii_case(candidate)
                        } else {
                            v == candidate
                        }
                    });
                    if !allowed {
                        return Err(ReconcileError::validation(
                            attribute,
                            format!("expected one of [{}], got '{candidate}'", values.join(" ")),
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

/// One entry of a resource's attribute table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Local attribute name.
    pub name: String,

    /// Dotted path of the field in the remote record (e.g. "vrf.id").
    pub remote_path: String,

    /// Semantic type.
    pub kind: AttributeKind,

    /// Required, optional, or computed.
    pub presence: Presence,

    /// Value used when the attribute is not declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<AttributeValue>,

    /// Checks run on declared values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,

    /// Whether the remote field may be absent (`null`). A local zero value
    /// for such a field is written as an explicit `null`.
    #[serde(default)]
    pub nullable: bool,

    /// Query parameter used when this attribute acts as a lookup filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_param: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttributeSpec {
    fn new(name: impl Into<String>, kind: AttributeKind, presence: Presence) -> Self {
        let name = name.into();
        Self {
            remote_path: name.clone(),
            name,
            kind,
            presence,
            default: None,
            validators: Vec::new(),
            nullable: false,
            filter_param: None,
            description: None,
        }
    }

    /// A required attribute.
    pub fn required(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self::new(name, kind, Presence::Required)
    }

    /// An optional attribute.
    pub fn optional(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self::new(name, kind, Presence::Optional)
    }

    /// A computed (remote-only) attribute.
    pub fn computed(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self::new(name, kind, Presence::Computed)
    }

    /// Map to a different remote path.
    pub fn remote(mut self, path: impl Into<String>) -> Self {
        self.remote_path = path.into();
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<AttributeValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Add a validator.
    #[must_use]
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Mark the remote field as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Expose this attribute as a lookup filter under the given query parameter.
    pub fn filter(mut self, param: impl Into<String>) -> Self {
        self.filter_param = Some(param.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the attribute is only ever populated from the remote.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }

    /// Type-check and validate a declared value.
    ///
    /// A zero value on a nullable field is the absence marker and skips the
    /// validators.
    pub fn check(&self, value: &AttributeValue) -> ReconcileResult<()> {
        if !value.matches_kind(self.kind) {
            return Err(ReconcileError::validation(
                &self.name,
                format!("expected {}, got {}", self.kind, value.type_name()),
            ));
        }
        if self.nullable && value.is_zero() {
            return Ok(());
        }
        for validator in &self.validators {
            validator.check(&self.name, value)?;
        }
        Ok(())
    }
}

/// The two attributes forming a scope pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSpec {
    pub type_attribute: String,
    pub id_attribute: String,
}

/// Static descriptor of one resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource type name (e.g. "netbox_vlan_group").
    name: String,

    /// Remote endpoint, relative to the API root (e.g. "ipam/vlan-groups").
    endpoint: String,

    attributes: Vec<AttributeSpec>,

    /// Groups of attributes of which at least one must be non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    at_least_one_of: Vec<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<ScopeSpec>,
}

impl ResourceSpec {
    /// Create a new resource descriptor with no attributes.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            attributes: Vec::new(),
            at_least_one_of: Vec::new(),
            scope: None,
        }
    }

    /// Add an attribute using builder pattern.
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Require at least one of the named attributes to be non-empty.
    #[must_use]
    pub fn at_least_one_of(mut self, names: &[&str]) -> Self {
        self.at_least_one_of
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Declare a scope pair. Both attributes must already be in the table.
    #[must_use]
    pub fn with_scope(mut self, type_attribute: &str, id_attribute: &str) -> Self {
        self.scope = Some(ScopeSpec {
            type_attribute: type_attribute.to_string(),
            id_attribute: id_attribute.to_string(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn scope(&self) -> Option<&ScopeSpec> {
        self.scope.as_ref()
    }

    /// Find an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes holding tag references.
    pub fn tag_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes
            .iter()
            .filter(|a| a.kind == AttributeKind::TagSet)
    }

    /// Resolve an attribute name, failing on names the table does not declare.
    pub fn require_attribute(&self, name: &str) -> ReconcileResult<&AttributeSpec> {
        self.attribute(name).ok_or_else(|| {
            ReconcileError::validation(name, format!("unknown attribute for {}", self.name))
        })
    }

    /// Check every at-least-one-of group against a set of attributes.
    pub fn check_at_least_one_of(&self, attrs: &AttributeSet) -> ReconcileResult<()> {
        for group in &self.at_least_one_of {
            let satisfied = group
                .iter()
                .any(|name| attrs.get(name).is_some_and(|v| !v.is_zero()));
            if !satisfied {
                return Err(ReconcileError::validation(
                    group.join(","),
                    format!("at least one of [{}] must be specified", group.join(", ")),
                ));
            }
        }
        Ok(())
    }

    /// Check that a scope pair is either fully declared or not at all.
    pub fn check_scope(&self, attrs: &AttributeSet) -> ReconcileResult<()> {
        if let Some(scope) = &self.scope {
            let has_type = attrs
                .get(&scope.type_attribute)
                .is_some_and(|v| !v.is_zero());
            let has_id = attrs.get(&scope.id_attribute).is_some_and(|v| !v.is_zero());
            if has_type != has_id {
                return Err(ReconcileError::validation(
                    format!("{},{}", scope.type_attribute, scope.id_attribute),
                    "scope type and scope id must be set together",
                ));
            }
        }
        Ok(())
    }
}
