//! Local resource state
//!
//! [`LocalState`] is the orchestrator-owned view of one resource instance:
//! its declared attributes plus the id of the remote record, if any.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ReconcileError, ReconcileResult};
use crate::ids::ObjectId;
use crate::schema::{Presence, ResourceSpec};
use crate::value::{AttributeSet, AttributeValue, ScopeReference};

/// Lifecycle state of a resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// No remote record corresponds to this instance.
    Absent,
    /// A remote record is believed to exist.
    Present,
}

impl ResourceState {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::Absent => "absent",
            ResourceState::Present => "present",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared attributes of one resource instance plus its remote identity.
///
/// The id is `None` exactly when no remote record corresponds to the
/// instance; its external form is [`LocalState::id_string`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    attributes: AttributeSet,
}

impl LocalState {
    /// Build a state from declared configuration.
    ///
    /// Every declared attribute is checked against the spec, required
    /// attributes must be present, computed attributes must not be, and
    /// defaults fill in whatever was left undeclared.
    pub fn declare(spec: &ResourceSpec, declared: AttributeSet) -> ReconcileResult<Self> {
        for (name, _) in declared.iter() {
            let attr = spec.require_attribute(name)?;
            if attr.presence == Presence::Computed {
                return Err(ReconcileError::validation(
                    name.as_str(),
                    "attribute is computed and cannot be declared",
                ));
            }
        }

        let mut attributes = declared;
        for attr in spec.attributes() {
            if attributes.has(&attr.name) {
                continue;
            }
            if let Some(default) = &attr.default {
                attributes.set(attr.name.clone(), default.clone());
            }
        }

        let state = Self {
            id: None,
            attributes,
        };
        state.validate(spec)?;
        Ok(state)
    }

    /// Re-attach a persisted identifier to declared configuration.
    pub fn declare_with_id(
        spec: &ResourceSpec,
        id: &str,
        declared: AttributeSet,
    ) -> ReconcileResult<Self> {
        let id = ObjectId::parse_local(id).map_err(|e| ReconcileError::validation("id", e.to_string()))?;
        let mut state = Self::declare(spec, declared)?;
        state.id = id;
        Ok(state)
    }

    /// Assemble a state without validation. Used for remote projections.
    pub(crate) fn from_parts(id: Option<ObjectId>, attributes: AttributeSet) -> Self {
        Self { id, attributes }
    }

    /// Check the current attributes against the spec.
    pub fn validate(&self, spec: &ResourceSpec) -> ReconcileResult<()> {
        for (name, value) in self.attributes.iter() {
            spec.require_attribute(name)?.check(value)?;
        }
        for attr in spec.attributes() {
            if attr.presence == Presence::Required && !self.attributes.has(&attr.name) {
                return Err(ReconcileError::validation(
                    attr.name.as_str(),
                    "required attribute is not set",
                ));
            }
        }
        spec.check_scope(&self.attributes)?;
        spec.check_at_least_one_of(&self.attributes)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        if self.id.is_some() {
            ResourceState::Present
        } else {
            ResourceState::Absent
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// The id in its decimal string form; empty when absent.
    #[must_use]
    pub fn id_string(&self) -> String {
        ObjectId::to_local(self.id)
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub(crate) fn replace_attributes(&mut self, attributes: AttributeSet) {
        self.attributes = attributes;
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Change a declared attribute, re-validating it against the spec.
    pub fn set(
        &mut self,
        spec: &ResourceSpec,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> ReconcileResult<()> {
        let attr = spec.require_attribute(name)?;
        if attr.presence == Presence::Computed {
            return Err(ReconcileError::validation(
                name,
                "attribute is computed and cannot be declared",
            ));
        }
        let value = value.into();
        attr.check(&value)?;
        self.attributes.set(name, value);
        Ok(())
    }

    /// The scope pair, when both halves are set.
    #[must_use]
    pub fn scope(&self, spec: &ResourceSpec) -> Option<ScopeReference> {
        let scope = spec.scope()?;
        let scope_type = self.attributes.get_string(&scope.type_attribute)?;
        let scope_id = self.attributes.get_integer(&scope.id_attribute)?;
        if scope_type.is_empty() || scope_id == 0 {
            return None;
        }
        Some(ScopeReference::new(scope_type, scope_id))
    }
}
