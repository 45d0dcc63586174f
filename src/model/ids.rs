//! Document identifiers
//!
//! Identifiers are opaque and globally unique. They are rendered as
//! hyphenated lowercase strings when stored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the stored string form. Returns `None` for malformed input.
    ///
    /// Only the hyphenated lowercase form is accepted, so every identifier
    /// has exactly one spelling in stored documents and index keys.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s)
            .ok()
            .map(Self)
            .filter(|id| id.to_string() == s)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Error returned when a string is not a stored identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed object id: {0}")]
pub struct ParseObjectIdError(String);

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseObjectIdError(s.to_string()))
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::String(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ObjectId::new(), ObjectId::new());
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let id = ObjectId::new();
        assert_eq!(ObjectId::parse(&id.to_string()), Some(id));
        assert_eq!(id.to_string().parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn test_malformed_id_rejected() {
        assert!(ObjectId::parse("not-an-id").is_none());
        assert!(ObjectId::parse("").is_none());
    }

    #[test]
    fn test_only_canonical_spelling_accepted() {
        let id = ObjectId::new();
        let canonical = id.to_string();
        let simple_upper = canonical.replace('-', "").to_uppercase();

        assert!(ObjectId::parse(&canonical.to_uppercase()).is_none());
        assert!(ObjectId::parse(&simple_upper).is_none());
        assert!(ObjectId::parse(&format!("{{{}}}", canonical)).is_none());
        assert!(ObjectId::parse(&format!("urn:uuid:{}", canonical)).is_none());
        assert!(simple_upper.parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = ObjectId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, Value::String(id.to_string()));
        assert_eq!(Value::from(id), json);
    }
}
