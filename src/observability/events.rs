//! Observable events in repomine
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable store events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Store is being opened
    StoreOpen,
    /// Store is ready for reads and writes
    StoreReady,
    /// Configuration loaded from file
    ConfigLoaded,
    /// Schema catalog enumerated and checked
    CatalogLoaded,

    // Persistence
    /// Storage replay begins
    ReplayBegin,
    /// Storage replay complete
    ReplayComplete,
    /// Indexes rebuilt from replayed documents
    IndexRebuildComplete,
    /// Storage corruption detected (FATAL)
    StorageCorruption,

    // Writes
    /// Document accepted and stored
    DocumentInserted,
    /// Document rejected by validation
    InsertRejected,
    /// Document rejected by a uniqueness constraint
    DuplicateKey,
    /// Values appended to an accumulating list field
    ListFieldAppended,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreOpen => "STORE_OPEN",
            Event::StoreReady => "STORE_READY",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",

            Event::ReplayBegin => "REPLAY_BEGIN",
            Event::ReplayComplete => "REPLAY_COMPLETE",
            Event::IndexRebuildComplete => "INDEX_REBUILD_COMPLETE",
            Event::StorageCorruption => "STORAGE_CORRUPTION",

            Event::DocumentInserted => "DOCUMENT_INSERTED",
            Event::InsertRejected => "INSERT_REJECTED",
            Event::DuplicateKey => "DUPLICATE_KEY",
            Event::ListFieldAppended => "LIST_FIELD_APPENDED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StorageCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
