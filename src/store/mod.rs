//! Document store for repomine
//!
//! Validated inserts, unique-key enforcement, index lookups and accumulating
//! list fields over the mining collections.
//!
//! ```ignore
//! use repomine::model::{Commit, Project};
//! use repomine::store::DocumentStore;
//!
//! let mut store = DocumentStore::in_memory()?;
//! let project_id = store.insert(&mut Project::new("https://github.com/org/repo", "repo"))?;
//! store.insert(&mut Commit::new(project_id, "abc123"))?;
//! ```

mod collection;
mod engine;
mod errors;

pub use engine::DocumentStore;
pub use errors::{NotFoundError, StoreError, StoreResult};
