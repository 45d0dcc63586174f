//! Schema catalog and write-time validation
//!
//! The catalog is the single source of truth for what a valid document of
//! each entity looks like and how its collection is indexed and sharded.
//!
//! # Design Principles
//!
//! - Validation before anything is stored
//! - No coercion and no defaults
//! - Errors name the offending field
//! - Deterministic validation

mod catalog;
mod errors;
mod types;
mod validator;

pub use catalog::{
    EntityMeta, EntityType, IndexField, IndexKind, IndexSpec, SchemaCatalog, SortOrder, ID_FIELD,
};
pub use errors::{ValidationDetails, ValidationError, ValidationErrorCode, ValidationResult};
pub use types::{FieldDef, FieldType};
pub use validator::{CopyMovePolicy, SchemaValidator};
