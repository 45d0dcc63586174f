//! Document store errors
//!
//! Every store operation fails with one `StoreError`. The subsystem errors
//! keep their own codes and severities; the store only wraps them.

use std::fmt;

use thiserror::Error;

use crate::index::{DuplicateKeyError, IndexError};
use crate::schema::ValidationError;
use crate::storage::StorageError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// No document matches the requested key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    collection: String,
    key: String,
}

impl NotFoundError {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        "MINE_NOT_FOUND"
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the rendered key that matched nothing
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[REJECT] {}: no {} document with {}",
            self.code(),
            self.collection,
            self.key
        )
    }
}

impl std::error::Error for NotFoundError {}

/// Document store error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored document does not convert to or from its typed record
    #[error("{collection} document {id} does not match its record type: {source}")]
    Conversion {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The built-in catalog failed its structural checks
    #[error("[FATAL] MINE_CATALOG_INVALID: {0}")]
    Catalog(String),
}

impl StoreError {
    pub(crate) fn conversion(
        collection: impl Into<String>,
        id: impl fmt::Display,
        source: serde_json::Error,
    ) -> Self {
        StoreError::Conversion {
            collection: collection.into(),
            id: id.to_string(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Returns whether the store must not continue
    pub fn is_fatal(&self) -> bool {
        match self {
            StoreError::Index(e) => e.is_fatal(),
            StoreError::Storage(e) => e.is_fatal(),
            StoreError::Catalog(_) => true,
            _ => false,
        }
    }

    /// Returns the stable error code, where the failure has one
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Validation(e) => e.code().code(),
            StoreError::DuplicateKey(e) => e.code(),
            StoreError::NotFound(e) => e.code(),
            StoreError::Index(e) => e.code().code(),
            StoreError::Storage(e) => e.code().code(),
            StoreError::Conversion { .. } => "MINE_CONVERSION_FAILED",
            StoreError::Catalog(_) => "MINE_CATALOG_INVALID",
        }
    }
}
