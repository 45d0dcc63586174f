//! Validation error types
//!
//! Every validation failure is a REJECT: the write is refused before anything
//! is stored and is never retried by the store.
//!
//! Error codes:
//! - MINE_REQUIRED_FIELD
//! - MINE_NULL_VALUE
//! - MINE_TYPE_MISMATCH
//! - MINE_MAX_LENGTH_EXCEEDED
//! - MINE_INVALID_CHOICE
//! - MINE_UNDECLARED_FIELD
//! - MINE_MALFORMED_REFERENCE
//! - MINE_INCONSISTENT_RECORD
//! - MINE_NOT_APPENDABLE

use std::fmt;

/// Validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// Required field missing
    MineRequiredField,
    /// Required field present but null
    MineNullValue,
    /// Value has the wrong type
    MineTypeMismatch,
    /// String longer than the declared maximum
    MineMaxLengthExceeded,
    /// Value outside an enumerated set
    MineInvalidChoice,
    /// Field not declared for the entity
    MineUndeclaredField,
    /// Identifier reference does not parse
    MineMalformedReference,
    /// Fields contradict each other
    MineInconsistentRecord,
    /// Append targeted a field that does not accumulate
    MineNotAppendable,
}

impl ValidationErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorCode::MineRequiredField => "MINE_REQUIRED_FIELD",
            ValidationErrorCode::MineNullValue => "MINE_NULL_VALUE",
            ValidationErrorCode::MineTypeMismatch => "MINE_TYPE_MISMATCH",
            ValidationErrorCode::MineMaxLengthExceeded => "MINE_MAX_LENGTH_EXCEEDED",
            ValidationErrorCode::MineInvalidChoice => "MINE_INVALID_CHOICE",
            ValidationErrorCode::MineUndeclaredField => "MINE_UNDECLARED_FIELD",
            ValidationErrorCode::MineMalformedReference => "MINE_MALFORMED_REFERENCE",
            ValidationErrorCode::MineInconsistentRecord => "MINE_INCONSISTENT_RECORD",
            ValidationErrorCode::MineNotAppendable => "MINE_NOT_APPENDABLE",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "branches[2]")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// A rejected write, naming the offending field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    code: ValidationErrorCode,
    collection: String,
    details: ValidationDetails,
}

impl ValidationError {
    fn with(
        code: ValidationErrorCode,
        collection: impl Into<String>,
        details: ValidationDetails,
    ) -> Self {
        Self {
            code,
            collection: collection.into(),
            details,
        }
    }

    /// Required field is absent
    pub fn missing_field(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with(
            ValidationErrorCode::MineRequiredField,
            collection,
            ValidationDetails::new(field, "field to be present", "missing"),
        )
    }

    /// Required field is null
    pub fn null_value(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with(
            ValidationErrorCode::MineNullValue,
            collection,
            ValidationDetails::new(field, "non-null value", "null"),
        )
    }

    /// Field holds a value of the wrong type
    pub fn type_mismatch(
        collection: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::with(
            ValidationErrorCode::MineTypeMismatch,
            collection,
            ValidationDetails::new(field, expected, actual),
        )
    }

    /// String is longer than allowed
    pub fn max_length_exceeded(
        collection: impl Into<String>,
        field: impl Into<String>,
        max_length: usize,
        actual_length: usize,
    ) -> Self {
        Self::with(
            ValidationErrorCode::MineMaxLengthExceeded,
            collection,
            ValidationDetails::new(
                field,
                format!("at most {} characters", max_length),
                format!("{} characters", actual_length),
            ),
        )
    }

    /// Value is not one of the allowed choices
    pub fn invalid_choice(
        collection: impl Into<String>,
        field: impl Into<String>,
        choices: &[&str],
        actual: impl Into<String>,
    ) -> Self {
        Self::with(
            ValidationErrorCode::MineInvalidChoice,
            collection,
            ValidationDetails::new(
                field,
                format!("one of [{}]", choices.join(", ")),
                format!("'{}'", actual.into()),
            ),
        )
    }

    /// Field is not declared for the entity
    pub fn undeclared_field(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with(
            ValidationErrorCode::MineUndeclaredField,
            collection,
            ValidationDetails::new(field, "no undeclared fields", "extra field present"),
        )
    }

    /// Identifier reference is not a valid identifier
    pub fn malformed_reference(
        collection: impl Into<String>,
        field: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::with(
            ValidationErrorCode::MineMalformedReference,
            collection,
            ValidationDetails::new(field, "document identifier", format!("'{}'", actual.into())),
        )
    }

    /// Record violates a cross-field convention
    pub fn inconsistent(
        collection: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::with(
            ValidationErrorCode::MineInconsistentRecord,
            collection,
            ValidationDetails::new(field, expected, actual),
        )
    }

    /// Append targeted a non-accumulating field
    pub fn not_appendable(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with(
            ValidationErrorCode::MineNotAppendable,
            collection,
            ValidationDetails::new(field, "accumulating list field", "fixed field"),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> ValidationErrorCode {
        self.code
    }

    /// Returns the collection the rejected record belongs to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the offending field path
    pub fn field(&self) -> &str {
        &self.details.field
    }

    /// Returns the failure details
    pub fn details(&self) -> &ValidationDetails {
        &self.details
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[REJECT] {}: {} document rejected: {}",
            self.code.code(),
            self.collection,
            self.details
        )
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
