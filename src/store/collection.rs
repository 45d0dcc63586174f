//! In-memory collection
//!
//! The current version of every document of one entity, keyed by
//! identifier, together with the indexes over them.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::index::{DuplicateKeyError, IndexManager, IndexResult};
use crate::model::ObjectId;
use crate::schema::EntityMeta;

pub(crate) struct Collection {
    meta: &'static EntityMeta,
    documents: BTreeMap<ObjectId, Value>,
    indexes: IndexManager,
}

impl Collection {
    pub(crate) fn new(meta: &'static EntityMeta) -> Self {
        Self {
            meta,
            documents: BTreeMap::new(),
            indexes: IndexManager::for_entity(meta),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.meta.collection
    }

    pub(crate) fn get(&self, id: &ObjectId) -> Option<&Value> {
        self.documents.get(id)
    }

    pub(crate) fn contains(&self, id: &ObjectId) -> bool {
        self.documents.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Refuses `document` if another document holds its unique key.
    pub(crate) fn check_unique(&self, document: &Value, id: ObjectId) -> Result<(), DuplicateKeyError> {
        self.indexes.check_unique(document, id)
    }

    /// Installs a new version of a document. Called after the storage write.
    pub(crate) fn apply(&mut self, id: ObjectId, document: Value) {
        let old = self.documents.remove(&id);
        self.indexes.apply_write(id, old.as_ref(), &document);
        self.documents.insert(id, document);
    }

    /// Loads a replayed document without touching the indexes.
    pub(crate) fn load(&mut self, id: ObjectId, document: Value) {
        self.documents.insert(id, document);
    }

    /// Rebuilds the indexes from the loaded documents.
    pub(crate) fn rebuild_indexes(&mut self) -> IndexResult<()> {
        self.indexes
            .rebuild(self.documents.iter().map(|(id, doc)| (*id, doc)))
    }
}
