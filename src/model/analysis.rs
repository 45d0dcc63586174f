//! Derived analysis artifacts, one record per (commit, file) pair

use serde::{Deserialize, Serialize};

use super::{document, FreeMap, ObjectId};
use crate::schema::EntityType;

/// Test dependency state of one test file at one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestState {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub file_id: ObjectId,
    pub commit_id: ObjectId,
    pub long_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Transitive dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ObjectId>,
    /// Direct dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub direct_imp: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mock_cut_dep: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mocked_modules: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_mock: Option<bool>,
    /// Set when mining this file at this commit failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl TestState {
    pub fn new(file_id: ObjectId, commit_id: ObjectId, long_name: impl Into<String>) -> Self {
        Self {
            id: None,
            file_id,
            commit_id,
            long_name: long_name.into(),
            file_type: None,
            depends_on: Vec::new(),
            direct_imp: Vec::new(),
            mock_cut_dep: Vec::new(),
            mocked_modules: Vec::new(),
            uses_mock: None,
            error: None,
        }
    }
}

document!(TestState, EntityType::TestState);

/// Import statements of one file at one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub commit_id: ObjectId,
    pub file_id: ObjectId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

impl Import {
    pub fn new(commit_id: ObjectId, file_id: ObjectId, imports: Vec<String>) -> Self {
        Self {
            id: None,
            commit_id,
            file_id,
            imports,
        }
    }
}

document!(Import, EntityType::Import);

/// AST node-type histogram of one file at one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeCount {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub commit_id: ObjectId,
    pub file_id: ObjectId,
    /// Total number of nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<i64>,
    #[serde(default, skip_serializing_if = "FreeMap::is_empty")]
    pub node_type_counts: FreeMap,
}

impl NodeTypeCount {
    pub fn new(commit_id: ObjectId, file_id: ObjectId) -> Self {
        Self {
            id: None,
            commit_id,
            file_id,
            node_count: None,
            node_type_counts: FreeMap::new(),
        }
    }

    /// Returns the count recorded for a node type, if it is an integer.
    pub fn count_of(&self, node_type: &str) -> Option<i64> {
        self.node_type_counts.get(node_type).and_then(|v| v.as_int())
    }
}

document!(NodeTypeCount, EntityType::NodeTypeCount);
