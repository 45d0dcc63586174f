//! The schema catalog
//!
//! One [`EntityMeta`] per entity: the field set, the uniqueness key, the
//! secondary indexes, the shard key and the accumulating list fields. The
//! catalog is built once per process and is read-only afterwards; the store
//! consumes it to validate writes and to create indexes.
//!
//! Index declarations use the compact notation of the document store:
//! `"projectId"` is an ascending index, `"#url"` a hashed index and
//! `"-created_at"` a descending component of a compound index.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{FieldDef, FieldType};
use crate::model::{EventKind, FileMode};
use crate::storage::compute_checksum;

/// Stored name of the identifier field present on every document.
pub const ID_FIELD: &str = "_id";

/// The persisted entity types, one collection each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Project,
    Commit,
    File,
    FileAction,
    Hunk,
    Tag,
    People,
    Issue,
    Event,
    IssueComment,
    TestState,
    Import,
    NodeTypeCount,
}

impl EntityType {
    /// All entity types, in catalog order
    pub const ALL: [EntityType; 13] = [
        EntityType::Project,
        EntityType::Commit,
        EntityType::File,
        EntityType::FileAction,
        EntityType::Hunk,
        EntityType::Tag,
        EntityType::People,
        EntityType::Issue,
        EntityType::Event,
        EntityType::IssueComment,
        EntityType::TestState,
        EntityType::Import,
        EntityType::NodeTypeCount,
    ];

    /// Returns the collection name
    pub fn collection_name(&self) -> &'static str {
        match self {
            EntityType::Project => "project",
            EntityType::Commit => "commit",
            EntityType::File => "file",
            EntityType::FileAction => "file_action",
            EntityType::Hunk => "hunk",
            EntityType::Tag => "tag",
            EntityType::People => "people",
            EntityType::Issue => "issue",
            EntityType::Event => "event",
            EntityType::IssueComment => "issue_comment",
            EntityType::TestState => "test_state",
            EntityType::Import => "import",
            EntityType::NodeTypeCount => "node_type_count",
        }
    }

    /// Looks up an entity by collection name
    pub fn from_collection_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|entity| entity.collection_name() == name)
    }

    /// Returns the catalog entry for this entity
    pub fn meta(&self) -> &'static EntityMeta {
        SchemaCatalog::global().get(*self)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection_name())
    }
}

/// Sort order of an index component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Index structure hint for the storage engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Ordered index supporting equality, prefix and range lookups
    Ordered,
    /// Hashed index supporting equality only
    Hashed,
}

/// One component of an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexField {
    pub name: &'static str,
    pub order: SortOrder,
}

/// A declared index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    /// Index name, e.g. `issue_id_1_created_at_-1`
    pub name: String,
    pub fields: Vec<IndexField>,
    pub kind: IndexKind,
    pub unique: bool,
}

impl IndexSpec {
    /// Parses a secondary index from compact notation.
    ///
    /// A single `#field` declares a hashed index; a `-` prefix marks a
    /// descending component.
    pub fn parse(components: &[&'static str]) -> Self {
        let mut kind = IndexKind::Ordered;
        let fields: Vec<IndexField> = components
            .iter()
            .copied()
            .map(|component| {
                if let Some(name) = component.strip_prefix('#') {
                    kind = IndexKind::Hashed;
                    IndexField {
                        name,
                        order: SortOrder::Ascending,
                    }
                } else if let Some(name) = component.strip_prefix('-') {
                    IndexField {
                        name,
                        order: SortOrder::Descending,
                    }
                } else {
                    IndexField {
                        name: component,
                        order: SortOrder::Ascending,
                    }
                }
            })
            .collect();

        Self {
            name: index_name(&fields, kind),
            fields,
            kind,
            unique: false,
        }
    }

    /// Builds the unique index over the given key fields.
    pub fn unique(key: &[&'static str]) -> Self {
        let fields: Vec<IndexField> = key
            .iter()
            .copied()
            .map(|name| IndexField {
                name,
                order: SortOrder::Ascending,
            })
            .collect();

        Self {
            name: index_name(&fields, IndexKind::Ordered),
            fields,
            kind: IndexKind::Ordered,
            unique: true,
        }
    }

    /// Returns the field names in index order
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Returns whether the first `names.len()` components are exactly `names`
    /// in some order.
    pub fn has_leading_fields(&self, names: &[&str]) -> bool {
        if names.is_empty() || names.len() > self.fields.len() {
            return false;
        }
        let mut leading: Vec<&str> = self.fields[..names.len()].iter().map(|f| f.name).collect();
        let mut wanted: Vec<&str> = names.to_vec();
        leading.sort_unstable();
        wanted.sort_unstable();
        leading == wanted
    }
}

fn index_name(fields: &[IndexField], kind: IndexKind) -> String {
    fields
        .iter()
        .map(|f| {
            let suffix = match (kind, f.order) {
                (IndexKind::Hashed, _) => "hashed",
                (IndexKind::Ordered, SortOrder::Ascending) => "1",
                (IndexKind::Ordered, SortOrder::Descending) => "-1",
            };
            format!("{}_{}", f.name, suffix)
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Static metadata for one entity
#[derive(Debug, Clone, Serialize)]
pub struct EntityMeta {
    pub entity: EntityType,
    pub collection: &'static str,
    /// Declared fields, excluding `_id`
    pub fields: Vec<FieldDef>,
    /// Composite uniqueness key, in index order
    pub unique_key: Vec<&'static str>,
    /// Secondary indexes
    pub indexes: Vec<IndexSpec>,
    /// Partitioning key
    pub shard_key: Vec<&'static str>,
    /// List fields that may grow after creation
    pub appendable: Vec<&'static str>,
}

impl EntityMeta {
    fn new(entity: EntityType, fields: Vec<FieldDef>) -> Self {
        Self {
            entity,
            collection: entity.collection_name(),
            fields,
            unique_key: Vec::new(),
            indexes: Vec::new(),
            shard_key: Vec::new(),
            appendable: Vec::new(),
        }
    }

    fn unique_key(mut self, key: &[&'static str]) -> Self {
        self.unique_key = key.to_vec();
        self
    }

    fn index(mut self, components: &[&'static str]) -> Self {
        self.indexes.push(IndexSpec::parse(components));
        self
    }

    fn shard_key(mut self, key: &[&'static str]) -> Self {
        self.shard_key = key.to_vec();
        self
    }

    fn appendable(mut self, fields: &[&'static str]) -> Self {
        self.appendable = fields.to_vec();
        self
    }

    /// Returns the field definition for a stored field name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns whether `name` is `_id` or a declared field
    pub fn declares(&self, name: &str) -> bool {
        name == ID_FIELD || self.field(name).is_some()
    }

    /// Returns whether values may be appended to `field` after creation
    pub fn is_appendable(&self, field: &str) -> bool {
        self.appendable.iter().any(|name| *name == field)
    }

    /// Returns the unique index derived from the uniqueness key
    pub fn unique_index(&self) -> IndexSpec {
        IndexSpec::unique(&self.unique_key)
    }

    /// Extracts the shard-key values of a document, null for absent fields.
    pub fn shard_key_values(&self, document: &Value) -> Vec<Value> {
        self.shard_key
            .iter()
            .map(|name| document.get(*name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Routes a document to one of `shard_count` partitions.
    ///
    /// Documents with equal shard-key values always route to the same shard.
    /// A `shard_count` of zero is treated as one.
    pub fn shard_for(&self, document: &Value, shard_count: u32) -> u32 {
        let values = Value::Array(self.shard_key_values(document));
        let checksum = compute_checksum(values.to_string().as_bytes());
        checksum % shard_count.max(1)
    }

    /// Checks the entry for internal consistency.
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.unique_key.is_empty() {
            return Err(format!("{}: uniqueness key is empty", self.collection));
        }
        for name in &self.unique_key {
            if !self.declares(name) {
                return Err(format!(
                    "{}: unique key field '{}' is not declared",
                    self.collection, name
                ));
            }
            if !self.shard_key.contains(name) {
                return Err(format!(
                    "{}: shard key does not contain unique key field '{}'",
                    self.collection, name
                ));
            }
        }
        for name in &self.shard_key {
            if !self.declares(name) {
                return Err(format!(
                    "{}: shard key field '{}' is not declared",
                    self.collection, name
                ));
            }
        }
        for index in &self.indexes {
            for field in &index.fields {
                if !self.declares(field.name) {
                    return Err(format!(
                        "{}: index '{}' uses undeclared field '{}'",
                        self.collection, index.name, field.name
                    ));
                }
            }
            if index.kind == IndexKind::Hashed && index.fields.len() != 1 {
                return Err(format!(
                    "{}: hashed index '{}' must have exactly one field",
                    self.collection, index.name
                ));
            }
        }
        for name in &self.appendable {
            match self.field(name) {
                Some(def) if def.is_array() => {}
                _ => {
                    return Err(format!(
                        "{}: appendable field '{}' is not a declared list",
                        self.collection, name
                    ))
                }
            }
            if self.unique_key.contains(name)
                || self.indexes.iter().any(|i| i.field_names().contains(name))
            {
                return Err(format!(
                    "{}: appendable field '{}' must not be indexed",
                    self.collection, name
                ));
            }
        }
        Ok(())
    }
}

/// The full catalog, one entry per entity
#[derive(Debug, Clone, Serialize)]
pub struct SchemaCatalog {
    entries: BTreeMap<EntityType, EntityMeta>,
}

impl SchemaCatalog {
    /// Builds the catalog.
    pub fn new() -> Self {
        let entries = EntityType::ALL
            .iter()
            .map(|entity| (*entity, define(*entity)))
            .collect();
        Self { entries }
    }

    /// Returns the process-wide catalog, built on first use.
    pub fn global() -> &'static SchemaCatalog {
        static CATALOG: OnceLock<SchemaCatalog> = OnceLock::new();
        CATALOG.get_or_init(SchemaCatalog::new)
    }

    /// Returns the entry for an entity
    pub fn get(&self, entity: EntityType) -> &EntityMeta {
        // Every variant is inserted by `new`.
        &self.entries[&entity]
    }

    /// Iterates entries in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &EntityMeta> {
        self.entries.values()
    }

    /// Checks every entry.
    pub fn validate(&self) -> Result<(), String> {
        self.iter().try_for_each(EntityMeta::validate_structure)
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn define(entity: EntityType) -> EntityMeta {
    use FieldType as T;

    match entity {
        EntityType::Project => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_string("url").max_length(400),
                FieldDef::required_string("name").max_length(100),
                FieldDef::optional_string("repositoryType").max_length(15),
                FieldDef::optional_array("issue_urls", T::String),
                FieldDef::optional_array("mailing_urls", T::String),
            ],
        )
        .unique_key(&["url"])
        .index(&["#url"])
        .shard_key(&["url"]),

        EntityType::Commit => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_id("projectId"),
                FieldDef::required_string("revisionHash").max_length(50),
                FieldDef::optional_array("branches", T::String).max_length(500),
                FieldDef::optional_array("tagIds", T::ObjectId),
                FieldDef::optional_array("parents", T::String).max_length(50),
                FieldDef::optional_id("authorId"),
                FieldDef::optional_datetime("authorDate"),
                FieldDef::optional_int("authorOffset"),
                FieldDef::optional_id("committerId"),
                FieldDef::optional_datetime("committerDate"),
                FieldDef::optional_int("committerOffset"),
                FieldDef::optional_string("message"),
                FieldDef::optional_array("fileActionIds", T::ObjectId),
            ],
        )
        .unique_key(&["projectId", "revisionHash"])
        .index(&["projectId"])
        .shard_key(&["projectId", "revisionHash"])
        .appendable(&["branches", "tagIds"]),

        EntityType::File => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_id("projectId"),
                FieldDef::required_string("path").max_length(300),
                FieldDef::required_string("name").max_length(100),
            ],
        )
        .unique_key(&["path", "projectId"])
        .index(&["projectId"])
        .shard_key(&["path", "projectId"]),

        EntityType::FileAction => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_id("projectId"),
                FieldDef::required_id("fileId"),
                FieldDef::required_string("revisionHash").max_length(50),
                FieldDef::required_string("mode")
                    .max_length(1)
                    .choices(FileMode::ALL.iter().map(FileMode::as_str).collect()),
                FieldDef::optional_int("sizeAtCommit"),
                FieldDef::optional_int("linesAdded"),
                FieldDef::optional_int("linesDeleted"),
                FieldDef::optional_bool("isBinary"),
                FieldDef::optional_id("oldFilePathId"),
                FieldDef::optional_array("hunkIds", T::ObjectId),
            ],
        )
        .unique_key(&["revisionHash", "projectId", "fileId"])
        .index(&["projectId"])
        .index(&["projectId", "revisionHash"])
        .shard_key(&["revisionHash", "projectId", "fileId"]),

        EntityType::Hunk => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_int("new_start"),
                FieldDef::required_int("new_lines"),
                FieldDef::required_int("old_start"),
                FieldDef::required_int("old_lines"),
                FieldDef::required_string("content"),
            ],
        )
        .unique_key(&[ID_FIELD])
        .index(&["#_id"])
        .shard_key(&[ID_FIELD]),

        EntityType::Tag => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_id("projectId"),
                FieldDef::required_string("name").max_length(150),
                FieldDef::optional_string("message"),
                FieldDef::optional_id("taggerId"),
                FieldDef::optional_datetime("date"),
                FieldDef::optional_int("offset"),
            ],
        )
        .unique_key(&["projectId", "name"])
        .index(&["projectId"])
        .shard_key(&["projectId", "name"]),

        EntityType::People => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_string("email").max_length(150),
                FieldDef::required_string("name").max_length(150),
                FieldDef::optional_string("username").max_length(300),
            ],
        )
        .unique_key(&["email", "name"])
        .shard_key(&["email", "name"]),

        EntityType::Issue => EntityMeta::new(
            entity,
            vec![
                FieldDef::optional_string("system_id"),
                FieldDef::optional_id("project_id"),
                FieldDef::optional_string("title"),
                FieldDef::optional_string("desc"),
                FieldDef::optional_datetime("created_at"),
                FieldDef::optional_datetime("updated_at"),
                FieldDef::optional_id("creator_id"),
                FieldDef::optional_id("reporter_id"),
                FieldDef::optional_string("issue_type"),
                FieldDef::optional_string("priority"),
                FieldDef::optional_string("status"),
                FieldDef::optional_array("affects_versions", T::String),
                FieldDef::optional_array("components", T::String),
                FieldDef::optional_array("labels", T::String),
                FieldDef::optional_string("resolution"),
                FieldDef::optional_array("fix_versions", T::String),
                FieldDef::optional_id("assignee"),
                FieldDef::optional_array("issue_links", T::Map),
                FieldDef::optional_int("original_time_estimate"),
                FieldDef::optional_string("environment"),
            ],
        )
        .unique_key(&["system_id", "project_id"])
        .index(&["system_id"])
        .index(&["project_id"])
        .shard_key(&["system_id", "project_id"]),

        EntityType::Event => EntityMeta::new(
            entity,
            vec![
                FieldDef::optional_string("system_id"),
                FieldDef::optional_id("issue_id"),
                FieldDef::optional_datetime("created_at"),
                FieldDef::optional_string("status")
                    .max_length(50)
                    .choices(EventKind::ALL.iter().map(EventKind::as_str).collect()),
                FieldDef::optional_id("author_id"),
                FieldDef::optional_string("old_value"),
                FieldDef::optional_string("new_value"),
            ],
        )
        .unique_key(&["system_id"])
        .index(&["issue_id"])
        .index(&["#system_id"])
        .index(&["issue_id", "-created_at"])
        .shard_key(&["system_id"]),

        EntityType::IssueComment => EntityMeta::new(
            entity,
            vec![
                FieldDef::optional_int("system_id"),
                FieldDef::optional_id("issue_id"),
                FieldDef::optional_datetime("created_at"),
                FieldDef::optional_id("author_id"),
                FieldDef::optional_string("comment"),
            ],
        )
        .unique_key(&["system_id"])
        .index(&["issue_id"])
        .index(&["#system_id"])
        .index(&["issue_id", "-created_at"])
        .shard_key(&["system_id"]),

        EntityType::TestState => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_id("file_id"),
                FieldDef::required_id("commit_id"),
                FieldDef::required_string("long_name"),
                FieldDef::optional_string("file_type"),
                FieldDef::optional_array("depends_on", T::ObjectId),
                FieldDef::optional_array("direct_imp", T::ObjectId),
                FieldDef::optional_array("mock_cut_dep", T::ObjectId),
                FieldDef::optional_array("mocked_modules", T::ObjectId),
                FieldDef::optional_bool("uses_mock"),
                FieldDef::optional_bool("error"),
            ],
        )
        .unique_key(&["file_id", "commit_id", "long_name"])
        .index(&["commit_id"])
        .shard_key(&["file_id", "commit_id", "long_name"]),

        EntityType::Import => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_id("commitId"),
                FieldDef::required_id("fileId"),
                FieldDef::optional_array("imports", T::String).max_length(300),
            ],
        )
        .unique_key(&["commitId", "fileId"])
        .index(&["commitId"])
        .index(&["fileId"])
        .shard_key(&["commitId", "fileId"]),

        EntityType::NodeTypeCount => EntityMeta::new(
            entity,
            vec![
                FieldDef::required_id("commitId"),
                FieldDef::required_id("fileId"),
                FieldDef::optional_int("nodeCount"),
                FieldDef::optional_map("nodeTypeCounts"),
            ],
        )
        .unique_key(&["commitId", "fileId"])
        .index(&["commitId"])
        .index(&["fileId"])
        .shard_key(&["commitId", "fileId"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_is_consistent() {
        SchemaCatalog::new().validate().unwrap();
    }

    #[test]
    fn test_every_entity_has_entry() {
        let catalog = SchemaCatalog::new();
        for entity in EntityType::ALL {
            assert_eq!(catalog.get(entity).entity, entity);
            assert_eq!(catalog.get(entity).collection, entity.collection_name());
        }
        assert_eq!(catalog.iter().count(), EntityType::ALL.len());
    }

    #[test]
    fn test_collection_name_lookup() {
        assert_eq!(
            EntityType::from_collection_name("file_action"),
            Some(EntityType::FileAction)
        );
        assert_eq!(EntityType::from_collection_name("commits"), None);
    }

    #[test]
    fn test_parse_index_notation() {
        let hashed = IndexSpec::parse(&["#url"]);
        assert_eq!(hashed.kind, IndexKind::Hashed);
        assert_eq!(hashed.name, "url_hashed");
        assert_eq!(hashed.field_names(), vec!["url"]);

        let compound = IndexSpec::parse(&["issue_id", "-created_at"]);
        assert_eq!(compound.kind, IndexKind::Ordered);
        assert_eq!(compound.name, "issue_id_1_created_at_-1");
        assert_eq!(compound.fields[1].order, SortOrder::Descending);
        assert!(!compound.unique);
    }

    #[test]
    fn test_leading_fields_ignore_order() {
        let index = IndexSpec::unique(&["revisionHash", "projectId", "fileId"]);
        assert!(index.has_leading_fields(&["revisionHash"]));
        assert!(index.has_leading_fields(&["projectId", "revisionHash"]));
        assert!(index.has_leading_fields(&["fileId", "projectId", "revisionHash"]));
        assert!(!index.has_leading_fields(&["projectId"]));
        assert!(!index.has_leading_fields(&[]));
    }

    #[test]
    fn test_structure_rejects_shard_key_missing_unique_field() {
        let meta = EntityMeta::new(
            EntityType::Tag,
            vec![
                FieldDef::required_id("projectId"),
                FieldDef::required_string("name"),
            ],
        )
        .unique_key(&["projectId", "name"])
        .shard_key(&["projectId"]);

        let err = meta.validate_structure().unwrap_err();
        assert!(err.contains("shard key"));
    }

    #[test]
    fn test_structure_rejects_indexed_appendable_field() {
        let meta = EntityMeta::new(
            EntityType::Commit,
            vec![
                FieldDef::required_id("projectId"),
                FieldDef::optional_array("branches", FieldType::String),
            ],
        )
        .unique_key(&["projectId"])
        .index(&["branches"])
        .shard_key(&["projectId"])
        .appendable(&["branches"]);

        assert!(meta.validate_structure().is_err());
    }

    #[test]
    fn test_commit_appendable_fields() {
        let meta = EntityType::Commit.meta();
        assert!(meta.is_appendable("branches"));
        assert!(meta.is_appendable("tagIds"));
        assert!(!meta.is_appendable("parents"));
        assert!(!EntityType::Tag.meta().is_appendable("name"));
    }

    #[test]
    fn test_file_action_mode_choices() {
        let mode = EntityType::FileAction.meta().field("mode").unwrap();
        assert_eq!(mode.choices.as_deref(), Some(&["A", "M", "D", "C", "T"][..]));
    }

    #[test]
    fn test_shard_routing_is_stable() {
        let meta = EntityType::Commit.meta();
        let a = json!({"projectId": "p1", "revisionHash": "abc123", "message": "one"});
        let b = json!({"projectId": "p1", "revisionHash": "abc123", "message": "two"});

        for shards in [1, 2, 7, 64] {
            let shard = meta.shard_for(&a, shards);
            assert!(shard < shards);
            assert_eq!(shard, meta.shard_for(&b, shards));
        }
        assert_eq!(meta.shard_for(&a, 0), 0);
    }

    #[test]
    fn test_catalog_serializes_for_adapters() {
        let json = serde_json::to_value(EntityType::Event.meta()).unwrap();
        assert_eq!(json["collection"], "event");
        assert_eq!(json["indexes"][2]["name"], "issue_id_1_created_at_-1");
        assert_eq!(json["shard_key"], json!(["system_id"]));
    }
}
