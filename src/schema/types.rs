//! Field type definitions for the schema catalog
//!
//! Supported types:
//! - string: UTF-8 string, optionally length-bounded and enumerated
//! - int: 64-bit integer
//! - bool: Boolean
//! - datetime: UTC milliseconds since the epoch
//! - object_id: document identifier reference
//! - array: homogeneous list with element type
//! - map: free-form mapping, checked only for being a mapping

use serde::Serialize;

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit integer
    Int,
    /// Boolean
    Bool,
    /// Integer milliseconds since the Unix epoch, UTC
    DateTime,
    /// Identifier reference to another document
    ObjectId,
    /// Homogeneous list
    Array {
        /// Element type
        element_type: Box<FieldType>,
    },
    /// Free-form mapping
    Map,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::DateTime => "datetime",
            FieldType::ObjectId => "object_id",
            FieldType::Array { .. } => "array",
            FieldType::Map => "map",
        }
    }

    /// Convenience constructor for an array type
    pub fn array_of(element_type: FieldType) -> Self {
        FieldType::Array {
            element_type: Box::new(element_type),
        }
    }
}

/// Field definition
///
/// `max_length` bounds a string field, or every string element of a list
/// field. `choices` restricts a string field to a closed set of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    /// Stored field name
    pub name: &'static str,
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present and non-null
    pub required: bool,
    /// Maximum string length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Allowed string values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<&'static str>>,
}

impl FieldDef {
    /// Create a field of any type
    pub fn new(name: &'static str, field_type: FieldType, required: bool) -> Self {
        Self {
            name,
            field_type,
            required,
            max_length: None,
            choices: None,
        }
    }

    /// Create a required string field
    pub fn required_string(name: &'static str) -> Self {
        Self::new(name, FieldType::String, true)
    }

    /// Create an optional string field
    pub fn optional_string(name: &'static str) -> Self {
        Self::new(name, FieldType::String, false)
    }

    /// Create a required int field
    pub fn required_int(name: &'static str) -> Self {
        Self::new(name, FieldType::Int, true)
    }

    /// Create an optional int field
    pub fn optional_int(name: &'static str) -> Self {
        Self::new(name, FieldType::Int, false)
    }

    /// Create an optional bool field
    pub fn optional_bool(name: &'static str) -> Self {
        Self::new(name, FieldType::Bool, false)
    }

    /// Create an optional datetime field
    pub fn optional_datetime(name: &'static str) -> Self {
        Self::new(name, FieldType::DateTime, false)
    }

    /// Create a required identifier reference
    pub fn required_id(name: &'static str) -> Self {
        Self::new(name, FieldType::ObjectId, true)
    }

    /// Create an optional identifier reference
    pub fn optional_id(name: &'static str) -> Self {
        Self::new(name, FieldType::ObjectId, false)
    }

    /// Create an optional list field
    pub fn optional_array(name: &'static str, element_type: FieldType) -> Self {
        Self::new(name, FieldType::array_of(element_type), false)
    }

    /// Create an optional free-form mapping field
    pub fn optional_map(name: &'static str) -> Self {
        Self::new(name, FieldType::Map, false)
    }

    /// Bound the length of the string (or of each string element)
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Restrict the value to a closed set
    pub fn choices(mut self, choices: Vec<&'static str>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Returns whether this field holds a list
    pub fn is_array(&self) -> bool {
        matches!(self.field_type, FieldType::Array { .. })
    }
}
