//! Issue-tracker history records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{document, FreeMap, ObjectId};
use crate::schema::{EntityType, ValidationError};

/// An issue in a tracker, keyed by its tracker-side id within a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affects_versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fix_versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue_links: Vec<FreeMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_time_estimate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl Issue {
    pub fn new(system_id: impl Into<String>, project_id: ObjectId) -> Self {
        Self {
            system_id: Some(system_id.into()),
            project_id: Some(project_id),
            ..Self::default()
        }
    }
}

document!(Issue, EntityType::Issue);

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let links = serde_json::to_string(&self.issue_links).map_err(|_| fmt::Error)?;
        write!(
            f,
            "System_id: {}, project_id: {}, title: {}, desc: {}, created_at: {}, updated_at: {}, \
             issue_type: {}, priority: {}, affects_versions: {}, components: {}, labels: {}, \
             resolution: {}, fix_versions: {}, assignee: {}, issue_links: {}, status: {}, \
             time_estimate: {}, environment: {}, creator: {}, reporter: {}",
            or_none(&self.system_id),
            or_none(&self.project_id),
            or_none(&self.title),
            or_none(&self.desc),
            date_or_none(&self.created_at),
            date_or_none(&self.updated_at),
            or_none(&self.issue_type),
            or_none(&self.priority),
            self.affects_versions.join(","),
            self.components.join(","),
            self.labels.join(","),
            or_none(&self.resolution),
            self.fix_versions.join(","),
            or_none(&self.assignee),
            links,
            or_none(&self.status),
            or_none(&self.original_time_estimate),
            or_none(&self.environment),
            or_none(&self.creator_id),
            or_none(&self.reporter_id),
        )
    }
}

/// Kinds of issue history events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventKind {
    Created,
    Closed,
    Reopened,
    Subscribed,
    Merged,
    Referenced,
    Mentioned,
    Assigned,
    Unassigned,
    Labeled,
    Unlabeled,
    Milestoned,
    Demilestoned,
    Renamed,
    Locked,
    Unlocked,
    HeadRefDeleted,
    HeadRefRestored,
    Description,
    Priority,
    Status,
    Resolution,
    IssueType,
    Environment,
    TimeOriginalEstimate,
    Version,
    Component,
    Labels,
    FixVersion,
    Link,
    Attachment,
    ReleaseNote,
    RemoteIssueLink,
    Comment,
    HadoopFlags,
    TimeEstimate,
    Tags,
}

impl EventKind {
    pub const ALL: [EventKind; 37] = [
        EventKind::Created,
        EventKind::Closed,
        EventKind::Reopened,
        EventKind::Subscribed,
        EventKind::Merged,
        EventKind::Referenced,
        EventKind::Mentioned,
        EventKind::Assigned,
        EventKind::Unassigned,
        EventKind::Labeled,
        EventKind::Unlabeled,
        EventKind::Milestoned,
        EventKind::Demilestoned,
        EventKind::Renamed,
        EventKind::Locked,
        EventKind::Unlocked,
        EventKind::HeadRefDeleted,
        EventKind::HeadRefRestored,
        EventKind::Description,
        EventKind::Priority,
        EventKind::Status,
        EventKind::Resolution,
        EventKind::IssueType,
        EventKind::Environment,
        EventKind::TimeOriginalEstimate,
        EventKind::Version,
        EventKind::Component,
        EventKind::Labels,
        EventKind::FixVersion,
        EventKind::Link,
        EventKind::Attachment,
        EventKind::ReleaseNote,
        EventKind::RemoteIssueLink,
        EventKind::Comment,
        EventKind::HadoopFlags,
        EventKind::TimeEstimate,
        EventKind::Tags,
    ];

    /// Returns the stored status string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Closed => "closed",
            EventKind::Reopened => "reopened",
            EventKind::Subscribed => "subscribed",
            EventKind::Merged => "merged",
            EventKind::Referenced => "referenced",
            EventKind::Mentioned => "mentioned",
            EventKind::Assigned => "assigned",
            EventKind::Unassigned => "unassigned",
            EventKind::Labeled => "labeled",
            EventKind::Unlabeled => "unlabeled",
            EventKind::Milestoned => "milestoned",
            EventKind::Demilestoned => "demilestoned",
            EventKind::Renamed => "renamed",
            EventKind::Locked => "locked",
            EventKind::Unlocked => "unlocked",
            EventKind::HeadRefDeleted => "head_ref_deleted",
            EventKind::HeadRefRestored => "head_ref_restored",
            EventKind::Description => "description",
            EventKind::Priority => "priority",
            EventKind::Status => "status",
            EventKind::Resolution => "resolution",
            EventKind::IssueType => "issuetype",
            EventKind::Environment => "environment",
            EventKind::TimeOriginalEstimate => "timeoriginalestimate",
            EventKind::Version => "version",
            EventKind::Component => "component",
            EventKind::Labels => "labels",
            EventKind::FixVersion => "fix version",
            EventKind::Link => "link",
            EventKind::Attachment => "attachment",
            EventKind::ReleaseNote => "release note",
            EventKind::RemoteIssueLink => "remoteissuelink",
            EventKind::Comment => "comment",
            EventKind::HadoopFlags => "hadoop flags",
            EventKind::TimeEstimate => "timeestimate",
            EventKind::Tags => "tags",
        }
    }

    /// Returns the human-readable meaning of the event
    pub fn description(&self) -> &'static str {
        match self {
            EventKind::Created => "The issue was created by the actor.",
            EventKind::Closed => {
                "The issue was closed by the actor. When the commit_id is present, it identifies \
                 the commit that closed the issue using \"closes / fixes #NN\" syntax."
            }
            EventKind::Reopened => "The issue was reopened by the actor.",
            EventKind::Subscribed => "The actor subscribed to receive notifications for an issue.",
            EventKind::Merged => {
                "The issue was merged by the actor. The `commit_id` attribute is the SHA1 of the \
                 HEAD commit that was merged."
            }
            EventKind::Referenced => {
                "The issue was referenced from a commit message. The `commit_id` attribute is the \
                 commit SHA1 of where that happened."
            }
            EventKind::Mentioned => "The actor was @mentioned in an issue body.",
            EventKind::Assigned => "The issue was assigned to the actor.",
            EventKind::Unassigned => "The actor was unassigned from the issue.",
            EventKind::Labeled => "A label was added to the issue.",
            EventKind::Unlabeled => "A label was removed from the issue.",
            EventKind::Milestoned => "The issue was added to a milestone.",
            EventKind::Demilestoned => "The issue was removed from a milestone.",
            EventKind::Renamed => "The issue title was changed.",
            EventKind::Locked => "The issue was locked by the actor.",
            EventKind::Unlocked => "The issue was unlocked by the actor.",
            EventKind::HeadRefDeleted => "The pull requests branch was deleted.",
            EventKind::HeadRefRestored => "The pull requests branch was restored.",
            EventKind::Description => "The description was changed.",
            EventKind::Priority => "The issue was added to a milestone.",
            EventKind::Status => "The status was changed.",
            EventKind::Resolution => "The resolution was changed.",
            EventKind::IssueType => "The issuetype was changed.",
            EventKind::Environment => "The environment was changed.",
            EventKind::TimeOriginalEstimate => {
                "The original time estimation for fixing the issue was changed."
            }
            EventKind::Version => "The affected versions was changed.",
            EventKind::Component => "The component list was changed.",
            EventKind::Labels => "The labels of the issue were changed.",
            EventKind::FixVersion => "The fix versions of the issue were changed.",
            EventKind::Link => "Issuelinks were added or deleted.",
            EventKind::Attachment => "The attachments of the issue were changed.",
            EventKind::ReleaseNote => "A release note was changed.",
            EventKind::RemoteIssueLink => "A remote link was added to the issue.",
            EventKind::Comment => "A comment was deleted or added to the issue.",
            EventKind::HadoopFlags => "Hadoop flags were change to the issue.",
            EventKind::TimeEstimate => "Time estimation was changed in the issue.",
            EventKind::Tags => "Tags of the issue were changed.",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = EventKind::ALL.iter().map(EventKind::as_str).collect();
                ValidationError::invalid_choice(
                    EntityType::Event.collection_name(),
                    "status",
                    &names,
                    s,
                )
            })
    }
}

impl TryFrom<String> for EventKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One change in an issue's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<ObjectId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

impl Event {
    pub fn new(system_id: impl Into<String>, issue_id: ObjectId, status: EventKind) -> Self {
        Self {
            system_id: Some(system_id.into()),
            issue_id: Some(issue_id),
            status: Some(status),
            ..Self::default()
        }
    }
}

document!(Event, EntityType::Event);

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "system_id: {}, issue_id: {}, created_at: {}, status: {}, author_id: {}, \
             old_value: {}, new_value: {}",
            or_none(&self.system_id),
            or_none(&self.issue_id),
            date_or_none(&self.created_at),
            or_none(&self.status),
            or_none(&self.author_id),
            or_none(&self.old_value),
            or_none(&self.new_value),
        )
    }
}

/// A comment on an issue, keyed by its tracker-side numeric id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueComment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<ObjectId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl IssueComment {
    pub fn new(system_id: i64, issue_id: ObjectId, comment: impl Into<String>) -> Self {
        Self {
            system_id: Some(system_id),
            issue_id: Some(issue_id),
            comment: Some(comment.into()),
            ..Self::default()
        }
    }
}

document!(IssueComment, EntityType::IssueComment);

impl fmt::Display for IssueComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "system_id: {}, issue_id: {}, created_at: {}, author_id: {}, comment: {}",
            or_none(&self.system_id),
            or_none(&self.issue_id),
            date_or_none(&self.created_at),
            or_none(&self.author_id),
            or_none(&self.comment),
        )
    }
}

fn or_none<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

fn date_or_none(value: &Option<DateTime<Utc>>) -> String {
    match value {
        Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "None".to_string(),
    }
}
