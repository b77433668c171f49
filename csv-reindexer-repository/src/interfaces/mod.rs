//! Interface definitions for the reindexer's external collaborators.
//!
//! The traits here allow dependency injection and swappable backends for the
//! search engine and the object store.

mod object_store;
mod search_engine_client;

pub use object_store::{ObjectReader, ObjectStore};
pub use search_engine_client::SearchEngineClient;
