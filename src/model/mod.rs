//! Typed records for the mining data model
//!
//! One struct per entity. Field names follow the stored names, so a record
//! serializes to exactly the document the catalog describes. Typed records
//! can still violate the catalog (string lengths, the copy/move convention),
//! which is why every record is validated before it is stored.

mod analysis;
mod ids;
mod issue;
mod value;
mod vcs;

pub use analysis::{Import, NodeTypeCount, TestState};
pub use ids::{ObjectId, ParseObjectIdError};
pub use issue::{Event, EventKind, Issue, IssueComment};
pub use value::{FreeMap, FreeValue};
pub use vcs::{Commit, File, FileAction, FileMode, Hunk, People, Project, Tag};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::schema::{EntityType, ValidationResult};

/// A record with a store-assigned identifier.
pub trait Identifiable {
    /// Returns the identifier, `None` until the record has been inserted.
    fn id(&self) -> Option<ObjectId>;

    /// Sets the identifier.
    fn set_id(&mut self, id: ObjectId);
}

/// A record that can be checked against the schema catalog.
pub trait Validatable {
    /// Validates the record as it would be stored.
    ///
    /// # Errors
    ///
    /// Returns the first constraint the record violates.
    fn validate(&self) -> ValidationResult<()>;
}

/// A persisted entity.
pub trait Document: Identifiable + Validatable + Serialize + DeserializeOwned + Clone {
    /// Catalog entry the record belongs to
    const ENTITY: EntityType;

    /// Converts the record to its stored form.
    fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Builds a record from its stored form.
    fn from_document(document: Value) -> serde_json::Result<Self> {
        serde_json::from_value(document)
    }
}

/// Implements the record traits for an entity struct with an `id` field.
macro_rules! document {
    ($record:ty, $entity:expr) => {
        impl $crate::model::Identifiable for $record {
            fn id(&self) -> Option<$crate::model::ObjectId> {
                self.id
            }

            fn set_id(&mut self, id: $crate::model::ObjectId) {
                self.id = Some(id);
            }
        }

        impl $crate::model::Validatable for $record {
            fn validate(&self) -> $crate::schema::ValidationResult<()> {
                $crate::model::validate_record(self)
            }
        }

        impl $crate::model::Document for $record {
            const ENTITY: $crate::schema::EntityType = $entity;
        }
    };
}

pub(crate) use document;

/// Validates a typed record with the default policy.
pub(crate) fn validate_record<T: Document>(record: &T) -> ValidationResult<()> {
    use crate::schema::{SchemaCatalog, SchemaValidator, ValidationError};

    let document = record.to_document().map_err(|e| {
        ValidationError::type_mismatch(
            T::ENTITY.collection_name(),
            "$root",
            "serializable record",
            e.to_string(),
        )
    })?;
    SchemaValidator::new(SchemaCatalog::global()).validate_document(T::ENTITY, &document)
}
