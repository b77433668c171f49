//! # CSV Reindexer Pipeline
//!
//! This crate turns one delimited data file into a freshly built search
//! index and atomically repoints the public alias onto it.
//!
//! ## Architecture
//!
//! A run flows through the stages in order:
//!
//! 1. **Resolver**: Derives the ingestion request from the object key and config document
//! 2. **Parser**: Streams rows out of the data file as documents
//! 3. **Batcher**: Groups documents into bulk requests
//! 4. **Lifecycle**: Creates the index, loads it, swaps the alias and cleans up
//! 5. **Notifier**: Reports start, count, error and finish events

pub mod batcher;
pub mod errors;
pub mod lifecycle;
pub mod notifier;
pub mod parser;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use errors::IngestError;
pub use lifecycle::{IndexLifecycleManager, LifecycleConfig, LifecycleState, RunReport};
pub use notifier::{notifier_for, LogNotifier, NotificationSink, SlackNotifier};
pub use resolver::{RequestResolver, TriggerEvent};
