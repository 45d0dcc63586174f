//! Version-control history records

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{document, ObjectId};
use crate::schema::{EntityType, ValidationError};

/// A mined software repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub url: String,
    pub name: String,
    #[serde(rename = "repositoryType", default, skip_serializing_if = "Option::is_none")]
    pub repository_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mailing_urls: Vec<String>,
}

impl Project {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            name: name.into(),
            repository_type: None,
            issue_urls: Vec::new(),
            mailing_urls: Vec::new(),
        }
    }
}

document!(Project, EntityType::Project);

/// One commit of a project.
///
/// `parents` holds raw revision hashes, not identifiers. `branches` and
/// `tag_ids` keep growing as the repository is re-mined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub revision_hash: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<ObjectId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub author_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer_id: Option<ObjectId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub committer_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_action_ids: Vec<ObjectId>,
}

impl Commit {
    pub fn new(project_id: ObjectId, revision_hash: impl Into<String>) -> Self {
        Self {
            id: None,
            project_id,
            revision_hash: revision_hash.into(),
            branches: Vec::new(),
            tag_ids: Vec::new(),
            parents: Vec::new(),
            author_id: None,
            author_date: None,
            author_offset: None,
            committer_id: None,
            committer_date: None,
            committer_offset: None,
            message: None,
            file_action_ids: Vec::new(),
        }
    }
}

document!(Commit, EntityType::Commit);

/// A file path within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub path: String,
    pub name: String,
}

impl File {
    pub fn new(project_id: ObjectId, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            project_id,
            path: path.into(),
            name: name.into(),
        }
    }
}

document!(File, EntityType::File);

/// How a file changed within a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FileMode {
    /// `A`
    Added,
    /// `M`
    Modified,
    /// `D`
    Deleted,
    /// `C`, copied or moved from `oldFilePathId`
    Copy,
    /// `T`, a link change
    Link,
}

impl FileMode {
    pub const ALL: [FileMode; 5] = [
        FileMode::Added,
        FileMode::Modified,
        FileMode::Deleted,
        FileMode::Copy,
        FileMode::Link,
    ];

    /// Returns the stored one-letter symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Added => "A",
            FileMode::Modified => "M",
            FileMode::Deleted => "D",
            FileMode::Copy => "C",
            FileMode::Link => "T",
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                let symbols: Vec<&str> = FileMode::ALL.iter().map(FileMode::as_str).collect();
                ValidationError::invalid_choice(
                    EntityType::FileAction.collection_name(),
                    "mode",
                    &symbols,
                    s,
                )
            })
    }
}

impl TryFrom<String> for FileMode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileMode> for String {
    fn from(mode: FileMode) -> Self {
        mode.as_str().to_string()
    }
}

/// One file's change within one commit.
///
/// `old_file_path_id` is set exactly when `mode` is [`FileMode::Copy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAction {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub file_id: ObjectId,
    pub revision_hash: String,
    pub mode: FileMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_at_commit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_added: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_deleted: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_binary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_file_path_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hunk_ids: Vec<ObjectId>,
}

impl FileAction {
    pub fn new(
        project_id: ObjectId,
        file_id: ObjectId,
        revision_hash: impl Into<String>,
        mode: FileMode,
    ) -> Self {
        Self {
            id: None,
            project_id,
            file_id,
            revision_hash: revision_hash.into(),
            mode,
            size_at_commit: None,
            lines_added: None,
            lines_deleted: None,
            is_binary: None,
            old_file_path_id: None,
            hunk_ids: Vec::new(),
        }
    }

    /// A copy or move of `old_file_path_id`.
    pub fn copied_from(
        project_id: ObjectId,
        file_id: ObjectId,
        revision_hash: impl Into<String>,
        old_file_path_id: ObjectId,
    ) -> Self {
        let mut action = Self::new(project_id, file_id, revision_hash, FileMode::Copy);
        action.old_file_path_id = Some(old_file_path_id);
        action
    }
}

document!(FileAction, EntityType::FileAction);

/// A contiguous diff region in unified diff form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub new_start: i64,
    pub new_lines: i64,
    pub old_start: i64,
    pub old_lines: i64,
    pub content: String,
}

impl Hunk {
    pub fn new(
        old_start: i64,
        old_lines: i64,
        new_start: i64,
        new_lines: i64,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            new_start,
            new_lines,
            old_start,
            old_lines,
            content: content.into(),
        }
    }
}

document!(Hunk, EntityType::Hunk);

/// A named tag in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagger_id: Option<ObjectId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl Tag {
    pub fn new(project_id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id: None,
            project_id,
            name: name.into(),
            message: None,
            tagger_id: None,
            date: None,
            offset: None,
        }
    }
}

document!(Tag, EntityType::Tag);

/// An author or committer identity.
///
/// Two identities are the same person when name and email match, whatever
/// the identifier or username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct People {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl People {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: name.into(),
            username: None,
        }
    }
}

impl PartialEq for People {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.email == other.email
    }
}

impl Eq for People {}

impl Hash for People {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `eq`: the concatenation is a function of both parts.
        format!("{}{}", self.name, self.email).hash(state);
    }
}

document!(People, EntityType::People);
