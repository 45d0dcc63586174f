//! repomine - schema catalog and document store for repository-mining data
//!
//! Projects, commits, files, file actions, hunks, tags, people, issues,
//! issue events and comments, plus the analysis records derived from them.

pub mod config;
pub mod index;
pub mod model;
pub mod observability;
pub mod schema;
pub mod storage;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use model::{Document, ObjectId};
pub use schema::{EntityType, SchemaCatalog};
pub use store::{DocumentStore, StoreError, StoreResult};
