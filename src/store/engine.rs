//! Document store engine
//!
//! Owns one in-memory collection per entity and, when a data directory is
//! configured, the append-only document file under it.
//!
//! Writes are serialized by `&mut self`. A write that fails any check
//! leaves the store unchanged.

use std::collections::BTreeMap;

use serde_json::Value;

use super::collection::Collection;
use super::errors::{NotFoundError, StoreError, StoreResult};
use crate::config::StoreConfig;
use crate::index::DuplicateKeyError;
use crate::model::{Document, ObjectId};
use crate::observability::{log_event, log_event_at, log_event_with_fields, Event, Logger, Severity};
use crate::schema::{EntityType, SchemaCatalog, SchemaValidator, ValidationError, ID_FIELD};
use crate::storage::{storage_path, DocumentRecord, StorageError, StorageReader, StorageWriter};

/// Name reported when an explicit `_id` is already taken
const ID_INDEX: &str = "_id_";

/// The document store
pub struct DocumentStore {
    config: StoreConfig,
    catalog: &'static SchemaCatalog,
    collections: BTreeMap<EntityType, Collection>,
    writer: Option<StorageWriter>,
}

impl DocumentStore {
    /// Opens a store.
    ///
    /// Flow:
    /// 1. Check the schema catalog
    /// 2. Replay the document file, if persistent
    /// 3. Rebuild every index
    /// 4. Open the document file for appends
    ///
    /// # Errors
    ///
    /// Corruption in the document file and unique keys violated by replayed
    /// documents are fatal: the store does not open.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        Logger::set_min_severity(config.log_level);
        log_event_with_fields(
            Event::StoreOpen,
            &[("persistent", if config.is_persistent() { "true" } else { "false" })],
        );

        let catalog = SchemaCatalog::global();
        catalog.validate().map_err(StoreError::Catalog)?;
        log_event_with_fields(
            Event::CatalogLoaded,
            &[("entities", &EntityType::ALL.len().to_string())],
        );

        let collections = EntityType::ALL
            .iter()
            .map(|entity| (*entity, Collection::new(catalog.get(*entity))))
            .collect();

        let mut store = Self {
            config,
            catalog,
            collections,
            writer: None,
        };

        if let Some(data_dir) = store.config.data_dir.clone() {
            store.replay(&data_dir).map_err(|e| {
                if e.is_fatal() {
                    log_event_with_fields(Event::StorageCorruption, &[("error", &e.to_string())]);
                }
                e
            })?;
            store.writer = Some(StorageWriter::open(&data_dir, store.config.sync_writes)?);
        }

        log_event(Event::StoreReady);
        Ok(store)
    }

    /// Opens a store that keeps nothing on disk.
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(StoreConfig::in_memory())
    }

    fn replay(&mut self, data_dir: &std::path::Path) -> StoreResult<()> {
        let path = storage_path(data_dir);
        if !path.exists() {
            return Ok(());
        }

        log_event_with_fields(Event::ReplayBegin, &[("path", &path.display().to_string())]);

        let records = StorageReader::open(&path)?.replay()?;
        let replayed = records.len();

        for record in records {
            let (entity, id, document) = decode_record(&record)?;
            self.collection_mut(entity).load(id, document);
        }

        log_event_with_fields(Event::ReplayComplete, &[("documents", &replayed.to_string())]);

        for collection in self.collections.values_mut() {
            collection.rebuild_indexes()?;
        }

        log_event(Event::IndexRebuildComplete);
        Ok(())
    }

    /// Returns the schema catalog the store validates against
    pub fn catalog(&self) -> &SchemaCatalog {
        self.catalog
    }

    /// Returns the configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the number of documents in a collection
    pub fn count(&self, entity: EntityType) -> usize {
        self.collection(entity).len()
    }

    fn collection(&self, entity: EntityType) -> &Collection {
        // Every entity gets a collection in `open`.
        &self.collections[&entity]
    }

    fn collection_mut(&mut self, entity: EntityType) -> &mut Collection {
        self.collections
            .entry(entity)
            .or_insert_with(|| Collection::new(entity.meta()))
    }

    fn validator(&self) -> SchemaValidator<'static> {
        SchemaValidator::new(self.catalog).with_copy_move_policy(self.config.copy_move_policy)
    }

    /// Inserts a typed record and sets its identifier.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::insert_raw`].
    pub fn insert<T: Document>(&mut self, record: &mut T) -> StoreResult<ObjectId> {
        let document = record.to_document().map_err(|e| {
            StoreError::conversion(
                T::ENTITY.collection_name(),
                record.id().map(|id| id.to_string()).unwrap_or_default(),
                e,
            )
        })?;
        let id = self.insert_raw(T::ENTITY, document)?;
        record.set_id(id);
        Ok(id)
    }

    /// Inserts a document.
    ///
    /// Flow:
    /// 1. Validate against the catalog
    /// 2. Assign `_id` if absent, refuse an `_id` already taken
    /// 3. Check the unique key
    /// 4. Append to the document file
    /// 5. Install in the collection and its indexes
    ///
    /// # Errors
    ///
    /// - `Validation` if the document violates the catalog
    /// - `DuplicateKey` if its `_id` or unique key is already held
    /// - `Storage` if the append fails
    pub fn insert_raw(&mut self, entity: EntityType, mut document: Value) -> StoreResult<ObjectId> {
        let collection_name = entity.collection_name();

        if let Err(e) = self.validator().validate_document(entity, &document) {
            return Err(self.rejected(e));
        }

        let explicit_id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .and_then(ObjectId::parse);

        let id = match explicit_id {
            Some(id) if self.collection(entity).contains(&id) => {
                return Err(self.duplicate(DuplicateKeyError::new(
                    collection_name,
                    ID_INDEX,
                    format!("({:?})", id.to_string()),
                )));
            }
            Some(id) => id,
            None => ObjectId::new(),
        };

        if let Some(obj) = document.as_object_mut() {
            obj.insert(ID_FIELD.to_string(), Value::from(id));
        }

        if let Err(e) = self.collection(entity).check_unique(&document, id) {
            return Err(self.duplicate(e));
        }

        self.persist(entity, id, &document)?;
        self.collection_mut(entity).apply(id, document);

        log_event_at(
            Severity::Trace,
            Event::DocumentInserted,
            &[("collection", collection_name), ("id", &id.to_string())],
        );

        Ok(id)
    }

    /// Adds values to an accumulating list field of the document with the
    /// given unique key.
    ///
    /// Values already in the list are skipped, so repeated mining runs can
    /// append the same branch or tag again. Returns the number of values
    /// added; nothing is written when that is zero.
    ///
    /// # Errors
    ///
    /// - `Validation` if `field` is not an accumulating list field, or a new
    ///   value violates the field's constraints
    /// - `NotFound` if no document has the key
    /// - `Index` if `key` does not name the unique key
    pub fn append_to_list_field(
        &mut self,
        entity: EntityType,
        key: &[(&str, Value)],
        field: &str,
        values: Vec<Value>,
    ) -> StoreResult<usize> {
        let meta = self.catalog.get(entity);
        if !meta.is_appendable(field) {
            return Err(self.rejected(ValidationError::not_appendable(meta.collection, field)));
        }

        let id = self.resolve_key(entity, key)?;
        let mut document = self
            .collection(entity)
            .get(&id)
            .cloned()
            .ok_or_else(|| NotFoundError::new(meta.collection, render_key(key)))?;

        let mut list = document
            .get(field)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut added = 0;
        for value in values {
            if !list.contains(&value) {
                list.push(value);
                added += 1;
            }
        }

        if added == 0 {
            return Ok(0);
        }

        if let Some(obj) = document.as_object_mut() {
            obj.insert(field.to_string(), Value::Array(list));
        }

        if let Err(e) = self.validator().validate_document(entity, &document) {
            return Err(self.rejected(e));
        }

        self.persist(entity, id, &document)?;
        self.collection_mut(entity).apply(id, document);

        log_event_at(
            Severity::Trace,
            Event::ListFieldAppended,
            &[
                ("collection", meta.collection),
                ("field", field),
                ("added", &added.to_string()),
            ],
        );

        Ok(added)
    }

    /// Finds the typed record with the given unique key.
    ///
    /// `key` names exactly the unique-key fields in any order, or `_id`
    /// alone.
    pub fn find_by_key<T: Document>(&self, key: &[(&str, Value)]) -> StoreResult<T> {
        let document = self.find_raw_by_key(T::ENTITY, key)?;
        decode(T::ENTITY, document)
    }

    /// Finds the document with the given unique key.
    pub fn find_raw_by_key(&self, entity: EntityType, key: &[(&str, Value)]) -> StoreResult<Value> {
        let id = self.resolve_key(entity, key)?;
        self.collection(entity)
            .get(&id)
            .cloned()
            .ok_or_else(|| NotFoundError::new(entity.collection_name(), render_key(key)).into())
    }

    /// Returns the typed record with the given identifier.
    pub fn get<T: Document>(&self, id: ObjectId) -> StoreResult<T> {
        self.find_by_key(&[(ID_FIELD, Value::from(id))])
    }

    /// Equality lookup on the leading fields of a declared index, filtered
    /// by `predicate`.
    ///
    /// Records come back in index order, so a descending trailing component
    /// (events by `-created_at`) returns the newest first.
    ///
    /// # Errors
    ///
    /// `Index` if no declared index has `fields` as its leading fields.
    pub fn find_by_index<T, P>(&self, fields: &[(&str, Value)], predicate: P) -> StoreResult<Vec<T>>
    where
        T: Document,
        P: Fn(&T) -> bool,
    {
        let mut records = Vec::new();
        for document in self.find_raw_by_index(T::ENTITY, fields)? {
            let record: T = decode(T::ENTITY, document)?;
            if predicate(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Equality lookup on the leading fields of a declared index.
    pub fn find_raw_by_index(
        &self,
        entity: EntityType,
        fields: &[(&str, Value)],
    ) -> StoreResult<Vec<Value>> {
        let collection = self.collection(entity);
        let ids = collection.indexes().lookup(fields)?;
        Ok(ids
            .iter()
            .filter_map(|id| collection.get(id).cloned())
            .collect())
    }

    fn resolve_key(&self, entity: EntityType, key: &[(&str, Value)]) -> StoreResult<ObjectId> {
        let collection = self.collection(entity);

        if let [(name, value)] = key {
            if *name == ID_FIELD {
                let raw = value.as_str().unwrap_or_default();
                let id = ObjectId::parse(raw).ok_or_else(|| {
                    ValidationError::malformed_reference(collection.name(), ID_FIELD, raw)
                })?;
                if collection.contains(&id) {
                    return Ok(id);
                }
                return Err(NotFoundError::new(collection.name(), render_key(key)).into());
            }
        }

        collection
            .indexes()
            .lookup_unique(key)?
            .ok_or_else(|| NotFoundError::new(collection.name(), render_key(key)).into())
    }

    fn persist(&mut self, entity: EntityType, id: ObjectId, document: &Value) -> StoreResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        let body = serde_json::to_vec(document)
            .map_err(|e| StoreError::conversion(entity.collection_name(), id, e))?;
        writer.write(&DocumentRecord::new(entity.collection_name(), id.to_string(), body))?;
        Ok(())
    }

    fn rejected(&self, error: ValidationError) -> StoreError {
        log_event_at(
            Severity::Warn,
            Event::InsertRejected,
            &[
                ("collection", error.collection()),
                ("code", error.code().code()),
                ("field", error.field()),
            ],
        );
        error.into()
    }

    fn duplicate(&self, error: DuplicateKeyError) -> StoreError {
        log_event_at(
            Severity::Warn,
            Event::DuplicateKey,
            &[
                ("collection", error.collection()),
                ("index", error.index()),
                ("key", error.key()),
            ],
        );
        error.into()
    }
}

fn decode<T: Document>(entity: EntityType, document: Value) -> StoreResult<T> {
    let id = document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    T::from_document(document).map_err(|e| StoreError::conversion(entity.collection_name(), id, e))
}

fn decode_record(record: &DocumentRecord) -> StoreResult<(EntityType, ObjectId, Value)> {
    let corrupt = |reason: &str| {
        StorageError::corruption_for_document(&record.collection, &record.document_id, reason)
    };

    let entity = EntityType::from_collection_name(&record.collection)
        .ok_or_else(|| corrupt("unknown collection"))?;
    let id = ObjectId::parse(&record.document_id).ok_or_else(|| corrupt("malformed document id"))?;
    let document: Value = serde_json::from_slice(&record.body)
        .map_err(|e| corrupt(&format!("undecodable body: {}", e)))?;

    Ok((entity, id, document))
}

fn render_key(key: &[(&str, Value)]) -> String {
    key.iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}
