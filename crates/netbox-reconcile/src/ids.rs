//! Remote object identifiers
//!
//! The inventory assigns numeric ids; the orchestrator stores them as their
//! decimal string, with the empty string meaning "no remote record".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a remote inventory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(i64);

impl ObjectId {
    /// Wrap a raw remote id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner numeric value.
    pub fn get(&self) -> i64 {
        self.0
    }

    /// Parse the local identifier form.
    ///
    /// The empty string is the "no remote record" marker and yields `None`.
    pub fn parse_local(s: &str) -> Result<Option<Self>, ParseObjectIdError> {
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    /// Render an optional id in the local identifier form.
    pub fn to_local(id: Option<Self>) -> String {
        id.map(|id| id.to_string()).unwrap_or_default()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only plain decimal digits; i64::from_str would also accept a sign.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseObjectIdError(s.to_string()));
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| ParseObjectIdError(s.to_string()))
    }
}

impl From<i64> for ObjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ObjectId> for i64 {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Error parsing an object id from its decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id '{0}', expected a decimal number")]
pub struct ParseObjectIdError(String);
