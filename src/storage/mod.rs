//! Document storage subsystem for repomine
//!
//! The optional durable layer under the document store: an append-only
//! record file with no in-place updates.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates)
//! - Checksum-verified on every read
//! - Full-document writes
//! - Latest record wins for the same (collection, document id)
//! - Halt on corruption

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use reader::StorageReader;
pub use record::DocumentRecord;
pub use writer::{storage_path, StorageWriter};
