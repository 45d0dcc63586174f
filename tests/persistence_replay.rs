//! Persistence Replay Tests
//!
//! - Documents written by one store are visible after reopening
//! - Accumulated list values survive a reopen
//! - Unique keys are enforced against replayed documents
//! - Corruption prevents the store from opening

use repomine::config::StoreConfig;
use repomine::model::{Commit, People, Project};
use repomine::schema::EntityType;
use repomine::storage::{storage_path, DocumentRecord, StorageWriter};
use repomine::store::DocumentStore;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn open(dir: &TempDir) -> DocumentStore {
    DocumentStore::open(StoreConfig::persistent(dir.path())).expect("store opens")
}

// =============================================================================
// Replay
// =============================================================================

#[test]
fn test_documents_survive_reopen() {
    let temp_dir = create_temp_data_dir();

    let (project_id, commit_id) = {
        let mut store = open(&temp_dir);
        let project_id = store
            .insert(&mut Project::new("https://example.org/repo", "repo"))
            .unwrap();
        let commit_id = store.insert(&mut Commit::new(project_id, "abc123")).unwrap();
        store.insert(&mut People::new("Ada", "ada@example.org")).unwrap();
        (project_id, commit_id)
    };

    assert!(storage_path(temp_dir.path()).exists());

    let store = open(&temp_dir);
    assert_eq!(store.count(EntityType::Project), 1);
    assert_eq!(store.count(EntityType::Commit), 1);
    assert_eq!(store.count(EntityType::People), 1);

    let commit: Commit = store.get(commit_id).unwrap();
    assert_eq!(commit.project_id, project_id);
    assert_eq!(commit.revision_hash, "abc123");
}

#[test]
fn test_appended_values_survive_reopen() {
    let temp_dir = create_temp_data_dir();
    let key_for = |project: Value| [("projectId", project), ("revisionHash", json!("abc123"))];

    let project_id = {
        let mut store = open(&temp_dir);
        let project_id = store
            .insert(&mut Project::new("https://example.org/repo", "repo"))
            .unwrap();
        store.insert(&mut Commit::new(project_id, "abc123")).unwrap();
        store
            .append_to_list_field(
                EntityType::Commit,
                &key_for(Value::from(project_id)),
                "branches",
                vec![json!("main"), json!("dev")],
            )
            .unwrap();
        project_id
    };

    let store = open(&temp_dir);
    assert_eq!(store.count(EntityType::Commit), 1);
    let commit: Commit = store.find_by_key(&key_for(Value::from(project_id))).unwrap();
    assert_eq!(commit.branches, vec!["main", "dev"]);
}

#[test]
fn test_unique_key_enforced_after_reopen() {
    let temp_dir = create_temp_data_dir();
    {
        let mut store = open(&temp_dir);
        store.insert(&mut People::new("Ada", "ada@example.org")).unwrap();
    }

    let mut store = open(&temp_dir);
    let err = store
        .insert(&mut People::new("Ada", "ada@example.org"))
        .unwrap_err();
    assert!(err.is_duplicate_key());
}

#[test]
fn test_in_memory_store_writes_nothing() {
    let temp_dir = create_temp_data_dir();
    let mut store = DocumentStore::in_memory().unwrap();
    store.insert(&mut People::new("Ada", "ada@example.org")).unwrap();
    assert!(!storage_path(temp_dir.path()).exists());
    assert!(!store.config().is_persistent());
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_corrupted_file_refuses_to_open() {
    let temp_dir = create_temp_data_dir();
    {
        let mut store = open(&temp_dir);
        store.insert(&mut People::new("Ada", "ada@example.org")).unwrap();
    }

    let path = storage_path(temp_dir.path());
    let mut contents = fs::read(&path).unwrap();
    let mid = contents.len() / 2;
    contents[mid] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let err = DocumentStore::open(StoreConfig::persistent(temp_dir.path())).err().unwrap();
    assert!(err.is_fatal());
    assert_eq!(err.code(), "MINE_DATA_CORRUPTION");
}

#[test]
fn test_unknown_collection_is_corruption() {
    let temp_dir = create_temp_data_dir();
    {
        let mut writer = StorageWriter::open(temp_dir.path(), true).unwrap();
        writer
            .write(&DocumentRecord::new(
                "mailing_list",
                repomine::ObjectId::new().to_string(),
                b"{}".to_vec(),
            ))
            .unwrap();
    }

    let err = DocumentStore::open(StoreConfig::persistent(temp_dir.path())).err().unwrap();
    assert!(err.is_fatal());
}

#[test]
fn test_replayed_duplicate_keys_refuse_to_open() {
    let temp_dir = create_temp_data_dir();
    {
        let mut writer = StorageWriter::open(temp_dir.path(), true).unwrap();
        for _ in 0..2 {
            let id = repomine::ObjectId::new();
            let body = json!({"_id": id.to_string(), "name": "Ada", "email": "ada@example.org"});
            writer
                .write(&DocumentRecord::new(
                    "people",
                    id.to_string(),
                    serde_json::to_vec(&body).unwrap(),
                ))
                .unwrap();
        }
    }

    let err = DocumentStore::open(StoreConfig::persistent(temp_dir.path())).err().unwrap();
    assert!(err.is_fatal());
    assert_eq!(err.code(), "MINE_INDEX_REBUILD_FAILED");
}
