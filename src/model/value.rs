//! Free-form mapping values
//!
//! Used for `Issue.issue_links` and `NodeTypeCount.nodeTypeCounts`. The
//! content is intentionally open-ended: the catalog only checks that such a
//! field is a mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from string key to [`FreeValue`].
pub type FreeMap = BTreeMap<String, FreeValue>;

/// A value inside a free-form mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FreeValue {
    /// Integer value
    Int(i64),
    /// String value
    String(String),
    /// Nested mapping
    Map(FreeMap),
}

impl FreeValue {
    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FreeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FreeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested mapping if this is a `Map`.
    pub fn as_map(&self) -> Option<&FreeMap> {
        match self {
            FreeValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<i64> for FreeValue {
    fn from(v: i64) -> Self {
        FreeValue::Int(v)
    }
}

impl From<&str> for FreeValue {
    fn from(v: &str) -> Self {
        FreeValue::String(v.to_string())
    }
}

impl From<String> for FreeValue {
    fn from(v: String) -> Self {
        FreeValue::String(v)
    }
}

impl From<FreeMap> for FreeValue {
    fn from(v: FreeMap) -> Self {
        FreeValue::Map(v)
    }
}
