//! Local attribute values
//!
//! Typed values for the declarative side of a resource: attribute sets,
//! single values, and the scope pair.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::AttributeKind;

/// A set of local attributes for one resource instance.
///
/// An attribute missing from the set was never set locally. An attribute
/// holding a zero value was set, explicitly, to "nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(flatten)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    /// Create a new empty attribute set.
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute only when a value is given.
    pub fn with_opt<V: Into<AttributeValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Get a string attribute.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    /// Get an integer attribute.
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_integer())
    }

    /// Get a boolean attribute.
    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_boolean())
    }

    /// Get a set-valued attribute.
    pub fn get_set(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.get(name).and_then(|v| v.as_set())
    }

    /// Check if an attribute was set.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Remove an attribute.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over all attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter()
    }
}

/// A single local attribute value.
///
/// Sets are ordered internally so equality is membership equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Set(BTreeSet<String>),
}

impl AttributeValue {
    /// The zero value of a semantic type.
    pub fn zero(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::String => AttributeValue::String(String::new()),
            AttributeKind::Integer => AttributeValue::Integer(0),
            AttributeKind::Boolean => AttributeValue::Boolean(false),
            AttributeKind::StringSet | AttributeKind::TagSet => AttributeValue::Set(BTreeSet::new()),
        }
    }

    /// Check if this is the zero value of its type.
    pub fn is_zero(&self) -> bool {
        match self {
            AttributeValue::String(s) => s.is_empty(),
            AttributeValue::Integer(i) => *i == 0,
            AttributeValue::Boolean(b) => !*b,
            AttributeValue::Set(s) => s.is_empty(),
        }
    }

    /// Check whether this value can hold an attribute of the given type.
    pub fn matches_kind(&self, kind: AttributeKind) -> bool {
        matches!(
            (self, kind),
            (AttributeValue::String(_), AttributeKind::String)
                | (AttributeValue::Integer(_), AttributeKind::Integer)
                | (AttributeValue::Boolean(_), AttributeKind::Boolean)
                | (
                    AttributeValue::Set(_),
                    AttributeKind::StringSet | AttributeKind::TagSet
                )
        )
    }

    /// Short type name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Set(_) => "set",
        }
    }

    /// Get as a string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a set if this is set-valued.
    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            AttributeValue::Set(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i64::from(i))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<BTreeSet<String>> for AttributeValue {
    fn from(set: BTreeSet<String>) -> Self {
        AttributeValue::Set(set)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(items: Vec<&str>) -> Self {
        AttributeValue::Set(items.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(items: Vec<String>) -> Self {
        AttributeValue::Set(items.into_iter().collect())
    }
}

/// Polymorphic parent reference: a content-type tag plus a numeric id.
///
/// Both halves are always present together; a missing scope is `None` at the
/// use site, never a half-filled value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeReference {
    pub scope_type: String,
    pub scope_id: i64,
}

impl ScopeReference {
    pub fn new(scope_type: impl Into<String>, scope_id: i64) -> Self {
        Self {
            scope_type: scope_type.into(),
            scope_id,
        }
    }
}
