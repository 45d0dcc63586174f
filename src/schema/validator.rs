//! Write-time document validation
//!
//! A document is accepted when:
//! - it is an object
//! - it has no undeclared fields
//! - every required field is present and non-null
//! - every present value has exactly the declared type
//! - ints fit a signed 64-bit integer and datetimes fit the calendar range
//! - mapping values are ints, strings or nested mappings
//! - strings (and string list elements) respect their maximum length
//! - enumerated fields hold one of their choices
//! - `_id`, when present, is a well-formed identifier
//!
//! Optional fields may be null; null is treated as absent. No coercion and no
//! defaults: the validator never mutates the document.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::{EntityMeta, EntityType, SchemaCatalog, ID_FIELD};
use super::errors::{ValidationError, ValidationResult};
use super::types::{FieldDef, FieldType};
use crate::model::{FileMode, ObjectId};

/// How the FileAction `oldFilePathId` convention is checked.
///
/// The convention: `oldFilePathId` is set exactly when `mode` is `C`
/// (copied or moved).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMovePolicy {
    /// Reject FileActions that break the convention
    #[default]
    Enforce,
    /// Accept them, as the document store itself would
    Lenient,
}

/// Validates documents against the schema catalog.
pub struct SchemaValidator<'a> {
    catalog: &'a SchemaCatalog,
    copy_move: CopyMovePolicy,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a validator that enforces the copy/move convention.
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            copy_move: CopyMovePolicy::Enforce,
        }
    }

    /// Sets the copy/move convention policy.
    pub fn with_copy_move_policy(mut self, policy: CopyMovePolicy) -> Self {
        self.copy_move = policy;
        self
    }

    /// Validates a document for `entity`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first offending field.
    pub fn validate_document(&self, entity: EntityType, document: &Value) -> ValidationResult<()> {
        let meta = self.catalog.get(entity);
        let collection = meta.collection;

        let obj = document.as_object().ok_or_else(|| {
            ValidationError::type_mismatch(collection, "$root", "object", json_type_name(document))
        })?;

        for key in obj.keys() {
            if !meta.declares(key) {
                return Err(ValidationError::undeclared_field(collection, key.as_str()));
            }
        }

        match obj.get(ID_FIELD) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => {
                if ObjectId::parse(s).is_none() {
                    return Err(ValidationError::malformed_reference(collection, ID_FIELD, s.as_str()));
                }
            }
            Some(other) => {
                return Err(ValidationError::type_mismatch(
                    collection,
                    ID_FIELD,
                    "object_id",
                    json_type_name(other),
                ))
            }
        }

        self.validate_fields(meta, obj)?;

        if entity == EntityType::FileAction && self.copy_move == CopyMovePolicy::Enforce {
            check_copy_move(collection, obj)?;
        }

        Ok(())
    }

    fn validate_fields(&self, meta: &EntityMeta, obj: &Map<String, Value>) -> ValidationResult<()> {
        for def in &meta.fields {
            match obj.get(def.name) {
                Some(Value::Null) => {
                    if def.required {
                        return Err(ValidationError::null_value(meta.collection, def.name));
                    }
                }
                Some(value) => {
                    validate_value(meta.collection, value, def, &def.field_type, def.name)?;
                }
                None => {
                    if def.required {
                        return Err(ValidationError::missing_field(meta.collection, def.name));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Validates a value against a field type.
///
/// `def` carries the constraints (length, choices) that apply at every level.
fn validate_value(
    collection: &str,
    value: &Value,
    def: &FieldDef,
    expected: &FieldType,
    path: &str,
) -> ValidationResult<()> {
    match expected {
        FieldType::String => {
            let s = value
                .as_str()
                .ok_or_else(|| type_error(collection, path, expected, value))?;
            if let Some(max) = def.max_length {
                let len = s.chars().count();
                if len > max {
                    return Err(ValidationError::max_length_exceeded(collection, path, max, len));
                }
            }
            if let Some(choices) = &def.choices {
                if !choices.iter().any(|choice| *choice == s) {
                    return Err(ValidationError::invalid_choice(collection, path, choices, s));
                }
            }
        }
        FieldType::Int => {
            if !value.is_i64() {
                return Err(type_error(collection, path, expected, value));
            }
        }
        FieldType::Bool => {
            if !value.is_boolean() {
                return Err(type_error(collection, path, expected, value));
            }
        }
        FieldType::DateTime => {
            let millis = value
                .as_i64()
                .ok_or_else(|| type_error(collection, path, expected, value))?;
            if Utc.timestamp_millis_opt(millis).single().is_none() {
                return Err(ValidationError::type_mismatch(
                    collection,
                    path,
                    expected.type_name(),
                    "millis out of range",
                ));
            }
        }
        FieldType::ObjectId => {
            let s = value
                .as_str()
                .ok_or_else(|| type_error(collection, path, expected, value))?;
            if ObjectId::parse(s).is_none() {
                return Err(ValidationError::malformed_reference(collection, path, s));
            }
        }
        FieldType::Array { element_type } => {
            let arr = value
                .as_array()
                .ok_or_else(|| type_error(collection, path, expected, value))?;
            for (i, elem) in arr.iter().enumerate() {
                let elem_path = format!("{}[{}]", path, i);
                if elem.is_null() {
                    return Err(ValidationError::null_value(collection, elem_path));
                }
                validate_value(collection, elem, def, element_type, &elem_path)?;
            }
        }
        FieldType::Map => {
            if !value.is_object() {
                return Err(type_error(collection, path, expected, value));
            }
            validate_free_value(collection, value, path)?;
        }
    }

    Ok(())
}

/// Mapping values are ints, strings or nested mappings, all the way down.
fn validate_free_value(collection: &str, value: &Value, path: &str) -> ValidationResult<()> {
    match value {
        Value::Number(n) if n.is_i64() => Ok(()),
        Value::String(_) => Ok(()),
        Value::Object(map) => {
            for (key, nested) in map {
                validate_free_value(collection, nested, &format!("{}.{}", path, key))?;
            }
            Ok(())
        }
        other => Err(ValidationError::type_mismatch(
            collection,
            path,
            "int, string or map",
            json_type_name(other),
        )),
    }
}

/// `oldFilePathId` must be present exactly when the file was copied or moved.
fn check_copy_move(collection: &str, obj: &Map<String, Value>) -> ValidationResult<()> {
    let mode = obj.get("mode").and_then(Value::as_str).unwrap_or_default();
    let has_old_path = obj.get("oldFilePathId").is_some_and(|v| !v.is_null());
    let copy_or_move = mode == FileMode::Copy.as_str();

    if copy_or_move && !has_old_path {
        return Err(ValidationError::inconsistent(
            collection,
            "oldFilePathId",
            "source file id when mode is C",
            "missing",
        ));
    }
    if !copy_or_move && has_old_path {
        return Err(ValidationError::inconsistent(
            collection,
            "oldFilePathId",
            "absent unless mode is C",
            format!("present with mode {}", mode),
        ));
    }
    Ok(())
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() {
                "int"
            } else if n.is_u64() {
                "int out of range"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(collection: &str, path: &str, expected: &FieldType, actual: &Value) -> ValidationError {
    ValidationError::type_mismatch(collection, path, expected.type_name(), json_type_name(actual))
}
