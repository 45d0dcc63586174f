//! Catalog Invariant Tests
//!
//! - Every entity has exactly one catalog entry and collection
//! - Unique-key fields are declared and covered by the shard key
//! - Typed records serialize to documents the catalog accepts
//! - Validation is deterministic

use repomine::model::{
    Commit, Document, Event, EventKind, File, FileAction, FileMode, Hunk, Import, Issue,
    IssueComment, NodeTypeCount, ObjectId, People, Project, Tag, TestState,
};
use repomine::schema::{EntityType, SchemaCatalog, SchemaValidator, ID_FIELD};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn validator() -> SchemaValidator<'static> {
    SchemaValidator::new(SchemaCatalog::global())
}

fn assert_accepted<T: Document>(record: &T) {
    let document = record.to_document().unwrap();
    assert!(
        validator().validate_document(T::ENTITY, &document).is_ok(),
        "{} record should validate: {}",
        T::ENTITY,
        document
    );
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn test_catalog_structure_is_consistent() {
    SchemaCatalog::global().validate().unwrap();
}

#[test]
fn test_collection_names_are_distinct() {
    let mut names: Vec<&str> = EntityType::ALL.iter().map(|e| e.collection_name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), EntityType::ALL.len());

    for entity in EntityType::ALL {
        assert_eq!(EntityType::from_collection_name(entity.collection_name()), Some(entity));
        assert_eq!(SchemaCatalog::global().get(entity).entity, entity);
    }
}

#[test]
fn test_shard_key_covers_unique_key() {
    for meta in SchemaCatalog::global().iter() {
        for field in &meta.unique_key {
            assert!(
                meta.shard_key.contains(field),
                "{}: shard key misses unique field {}",
                meta.collection,
                field
            );
        }
    }
}

#[test]
fn test_unique_keys() {
    let catalog = SchemaCatalog::global();
    assert_eq!(catalog.get(EntityType::Commit).unique_key, ["projectId", "revisionHash"]);
    assert_eq!(catalog.get(EntityType::File).unique_key, ["path", "projectId"]);
    assert_eq!(
        catalog.get(EntityType::FileAction).unique_key,
        ["revisionHash", "projectId", "fileId"]
    );
    assert_eq!(catalog.get(EntityType::Hunk).unique_key, [ID_FIELD]);
    assert_eq!(catalog.get(EntityType::People).unique_key, ["email", "name"]);
    assert_eq!(catalog.get(EntityType::Event).unique_key, ["system_id"]);
}

#[test]
fn test_only_commit_lists_accumulate() {
    for meta in SchemaCatalog::global().iter() {
        let expected: &[&str] = if meta.entity == EntityType::Commit {
            &["branches", "tagIds"]
        } else {
            &[]
        };
        assert_eq!(meta.appendable, expected, "{}", meta.collection);
    }
}

// =============================================================================
// Typed records against the catalog
// =============================================================================

#[test]
fn test_typed_records_validate() {
    let project = ObjectId::new();
    let commit = ObjectId::new();
    let file = ObjectId::new();
    let issue = ObjectId::new();

    assert_accepted(&Project::new("https://github.com/smartshark/pycoshark", "pycoshark"));
    assert_accepted(&Commit::new(project, "0f1e2d3c"));
    assert_accepted(&File::new(project, "src/main.py", "main.py"));
    assert_accepted(&FileAction::new(project, file, "0f1e2d3c", FileMode::Modified));
    assert_accepted(&FileAction::copied_from(project, file, "0f1e2d3c", ObjectId::new()));
    assert_accepted(&Hunk::new(10, 3, 10, 5, "@@ -10,3 +10,5 @@"));
    assert_accepted(&Tag::new(project, "v1.0.0"));
    assert_accepted(&People::new("Ada Lovelace", "ada@example.org"));
    assert_accepted(&Issue::new("PROJ-1", project));
    assert_accepted(&Event::new("1001", issue, EventKind::Closed));
    assert_accepted(&IssueComment::new(42, issue, "Looks good"));
    assert_accepted(&TestState::new(file, commit, "tests.test_main.TestMain"));
    assert_accepted(&Import::new(commit, file, vec!["os".into(), "sys".into()]));
    assert_accepted(&NodeTypeCount::new(commit, file));
}

#[test]
fn test_validation_is_deterministic() {
    let doc = json!({"projectId": ObjectId::new().to_string(), "revisionHash": "x".repeat(51)});
    let first = validator().validate_document(EntityType::Commit, &doc).unwrap_err();
    for _ in 0..10 {
        let again = validator().validate_document(EntityType::Commit, &doc).unwrap_err();
        assert_eq!(first, again);
    }
    assert_eq!(first.code().code(), "MINE_MAX_LENGTH_EXCEEDED");
    assert_eq!(first.field(), "revisionHash");
}

#[test]
fn test_undeclared_field_rejected() {
    let doc = json!({"name": "Ada", "email": "ada@example.org", "age": 36});
    let err = validator().validate_document(EntityType::People, &doc).unwrap_err();
    assert_eq!(err.code().code(), "MINE_UNDECLARED_FIELD");
    assert_eq!(err.field(), "age");
}
