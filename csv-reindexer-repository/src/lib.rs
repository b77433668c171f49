//! # CSV Reindexer Repository
//!
//! Traits and implementations for the collaborators the reindexer talks to:
//! the search engine (with a concrete OpenSearch implementation and a
//! logging dry-run stand-in) and the object store holding data files (with a
//! local filesystem implementation).

pub mod config;
pub mod dry_run;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod storage;
pub mod types;

pub use config::TargetProfile;
pub use dry_run::DryRunSearchClient;
pub use errors::{SearchError, StorageError};
pub use interfaces::{ObjectReader, ObjectStore, SearchEngineClient};
pub use opensearch::OpenSearchClient;
pub use storage::LocalObjectStore;
pub use types::{AliasAction, IndexDefinition};
