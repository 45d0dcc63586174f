//! Index subsystem for repomine
//!
//! Indexes are derived, in-memory-only state rebuilt from storage on open.
//!
//! # Design Principles
//!
//! - Derived state: indexes mirror the stored documents, never the source of truth
//! - In-memory only: no persistence
//! - Deterministic: BTreeMap iteration order, sorted identifiers
//!
//! # Invariants
//!
//! - Indexes rebuilt on open from storage
//! - Updates occur AFTER storage writes
//! - Unique keys are checked BEFORE storage writes

mod btree;
mod errors;
mod manager;

pub use btree::{CompositeKey, IndexKey, IndexTree, KeyPart};
pub use errors::{DuplicateKeyError, IndexError, IndexErrorCode, IndexResult, Severity};
pub use manager::IndexManager;
