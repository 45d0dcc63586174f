//! Index error types
//!
//! Error codes:
//! - MINE_DUPLICATE_KEY (REJECT)
//! - MINE_NO_COVERING_INDEX (REJECT)
//! - MINE_NOT_UNIQUE_KEY (REJECT)
//! - MINE_INDEX_REBUILD_FAILED (FATAL)

use std::fmt;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation refused, nothing changed
    Reject,
    /// Store must not open
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Lookup fields match no declared index
    MineNoCoveringIndex,
    /// Key lookup fields differ from the uniqueness key
    MineNotUniqueKey,
    /// Persisted documents violate a unique index
    MineIndexRebuildFailed,
}

impl IndexErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::MineNoCoveringIndex => "MINE_NO_COVERING_INDEX",
            IndexErrorCode::MineNotUniqueKey => "MINE_NOT_UNIQUE_KEY",
            IndexErrorCode::MineIndexRebuildFailed => "MINE_INDEX_REBUILD_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            IndexErrorCode::MineNoCoveringIndex | IndexErrorCode::MineNotUniqueKey => {
                Severity::Reject
            }
            IndexErrorCode::MineIndexRebuildFailed => Severity::Fatal,
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexError {
    code: IndexErrorCode,
    collection: String,
    message: String,
}

impl IndexError {
    /// No declared index has the requested fields as its leading fields
    pub fn no_covering_index(collection: impl Into<String>, fields: &[&str]) -> Self {
        let collection = collection.into();
        Self {
            message: format!("no index on {} covers fields [{}]", collection, fields.join(", ")),
            code: IndexErrorCode::MineNoCoveringIndex,
            collection,
        }
    }

    /// Key lookup named fields other than the uniqueness key
    pub fn not_unique_key(collection: impl Into<String>, fields: &[&str], unique_key: &[&str]) -> Self {
        let collection = collection.into();
        Self {
            message: format!(
                "[{}] is not the unique key of {}, expected [{}]",
                fields.join(", "),
                collection,
                unique_key.join(", ")
            ),
            code: IndexErrorCode::MineNotUniqueKey,
            collection,
        }
    }

    /// Replayed documents could not be indexed
    pub fn rebuild_failed(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::MineIndexRebuildFailed,
            collection: collection.into(),
            message: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the collection the lookup targeted
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// A write would give two documents the same unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyError {
    collection: String,
    index: String,
    key: String,
}

impl DuplicateKeyError {
    pub fn new(
        collection: impl Into<String>,
        index: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            index: index.into(),
            key: key.into(),
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        "MINE_DUPLICATE_KEY"
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the name of the violated unique index
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Returns the rendered key values
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DuplicateKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} already holds key {} in index {}",
            Severity::Reject,
            self.code(),
            self.collection,
            self.key,
            self.index
        )
    }
}

impl std::error::Error for DuplicateKeyError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
