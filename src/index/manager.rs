//! Index Manager
//!
//! One manager per collection, holding the unique index and every declared
//! secondary index of the entity.
//!
//! # API
//!
//! - `check_unique(doc, id)` - Refuse a key already held by another document
//! - `apply_write(id, old, new)` - Update indexes after a storage write
//! - `rebuild(docs)` - Rebuild from replayed documents
//! - `lookup(fields)` - Equality lookup on the leading fields of an index

use serde_json::Value;

use super::btree::{CompositeKey, IndexKey, IndexTree, KeyPart};
use super::errors::{DuplicateKeyError, IndexError, IndexResult};
use crate::model::ObjectId;
use crate::schema::{EntityMeta, IndexSpec};

struct DeclaredIndex {
    spec: IndexSpec,
    tree: IndexTree,
}

impl DeclaredIndex {
    fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            tree: IndexTree::new(),
        }
    }

    fn key_for(&self, doc: &Value) -> CompositeKey {
        CompositeKey(
            self.spec
                .fields
                .iter()
                .map(|f| KeyPart::new(IndexKey::from_field(doc.get(f.name)), f.order))
                .collect(),
        )
    }
}

/// Index Manager that maintains the in-memory indexes of one collection
pub struct IndexManager {
    collection: &'static str,
    /// Unique index over the uniqueness key
    unique: DeclaredIndex,
    /// Secondary indexes, in declaration order
    secondary: Vec<DeclaredIndex>,
}

impl IndexManager {
    /// Creates empty indexes for an entity
    pub fn for_entity(meta: &EntityMeta) -> Self {
        Self {
            collection: meta.collection,
            unique: DeclaredIndex::new(meta.unique_index()),
            secondary: meta.indexes.iter().cloned().map(DeclaredIndex::new).collect(),
        }
    }

    fn all(&self) -> impl Iterator<Item = &DeclaredIndex> {
        std::iter::once(&self.unique).chain(self.secondary.iter())
    }

    fn all_mut(&mut self) -> impl Iterator<Item = &mut DeclaredIndex> {
        std::iter::once(&mut self.unique).chain(self.secondary.iter_mut())
    }

    /// Checks that no other document holds the unique key of `doc`.
    ///
    /// Absent key fields are part of the key as null, so two documents that
    /// both lack a unique field collide.
    pub fn check_unique(&self, doc: &Value, id: ObjectId) -> Result<(), DuplicateKeyError> {
        let key = self.unique.key_for(doc);
        if self.unique.tree.lookup_eq(&key).iter().any(|held| *held != id) {
            return Err(DuplicateKeyError::new(
                self.collection,
                self.unique.spec.name.as_str(),
                key.render(),
            ));
        }
        Ok(())
    }

    /// Apply a write (insert or update) to indexes.
    ///
    /// Called AFTER the storage write. `old` is the previous version of the
    /// document, if any.
    pub fn apply_write(&mut self, id: ObjectId, old: Option<&Value>, new: &Value) {
        for index in self.all_mut() {
            if let Some(old) = old {
                let old_key = index.key_for(old);
                index.tree.remove(&old_key, id);
            }
            let key = index.key_for(new);
            index.tree.insert(key, id);
        }
    }

    /// Rebuild all indexes from a set of documents.
    ///
    /// Fails if two documents share a unique key.
    pub fn rebuild<'a, I>(&mut self, docs: I) -> IndexResult<()>
    where
        I: IntoIterator<Item = (ObjectId, &'a Value)>,
    {
        for index in self.all_mut() {
            index.tree.clear();
        }

        for (id, doc) in docs {
            self.check_unique(doc, id)
                .map_err(|e| IndexError::rebuild_failed(self.collection, e.to_string()))?;
            self.apply_write(id, None, doc);
        }

        Ok(())
    }

    /// Finds the index serving an equality lookup on `fields`.
    ///
    /// The longest index whose leading fields are exactly `fields` wins, so
    /// trailing components order the result. Among equally long indexes the
    /// unique index, then the first declared, is used.
    pub fn covering_index(&self, fields: &[&str]) -> Option<&IndexSpec> {
        self.all()
            .filter(|index| index.spec.has_leading_fields(fields))
            .fold(None::<&DeclaredIndex>, |best, index| match best {
                Some(b) if b.spec.fields.len() >= index.spec.fields.len() => Some(b),
                _ => Some(index),
            })
            .map(|index| &index.spec)
    }

    /// Equality lookup on the leading fields of a declared index.
    ///
    /// Returns identifiers in index order.
    pub fn lookup(&self, fields: &[(&str, Value)]) -> IndexResult<Vec<ObjectId>> {
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let spec = self
            .covering_index(&names)
            .ok_or_else(|| IndexError::no_covering_index(self.collection, &names))?;

        let index = self
            .all()
            .find(|index| index.spec.name == spec.name)
            .ok_or_else(|| IndexError::no_covering_index(self.collection, &names))?;

        let prefix: Vec<KeyPart> = index.spec.fields[..fields.len()]
            .iter()
            .map(|f| {
                let value = fields
                    .iter()
                    .find(|(name, _)| *name == f.name)
                    .map(|(_, value)| value);
                KeyPart::new(IndexKey::from_field(value), f.order)
            })
            .collect();

        Ok(index.tree.lookup_prefix(&prefix))
    }

    /// Exact lookup on the uniqueness key.
    ///
    /// `fields` must name exactly the unique-key fields, in any order.
    pub fn lookup_unique(&self, fields: &[(&str, Value)]) -> IndexResult<Option<ObjectId>> {
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let unique_names = self.unique.spec.field_names();
        if names.len() != unique_names.len() || !self.unique.spec.has_leading_fields(&names) {
            return Err(IndexError::not_unique_key(self.collection, &names, &unique_names));
        }

        let key = CompositeKey(
            self.unique
                .spec
                .fields
                .iter()
                .map(|f| {
                    let value = fields
                        .iter()
                        .find(|(name, _)| *name == f.name)
                        .map(|(_, value)| value);
                    KeyPart::new(IndexKey::from_field(value), f.order)
                })
                .collect(),
        );

        Ok(self.unique.tree.lookup_eq(&key).first().copied())
    }

    /// Returns the number of entries in the unique index
    pub fn len(&self) -> usize {
        self.unique.tree.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
