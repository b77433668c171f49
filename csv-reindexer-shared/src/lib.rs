//! # CSV Reindexer Shared
//!
//! Plain data types passed between the reindexer crates: the resolved
//! ingestion request, the documents built from data rows, the index mapping
//! wrapper and the notification settings.

pub mod document;
pub mod mapping;
pub mod notification;
pub mod request;

pub use document::{Document, FieldValue};
pub use mapping::IndexMapping;
pub use notification::{NotificationSettings, NotificationStep, SlackSettings, StepToggle};
pub use request::{
    real_index_name, IndexAction, IngestionRequest, KeyLayout, KeySegment, ParseActionError,
};
