//! Request types for search engine operations.

use serde::Serialize;
use serde_json::Value;

/// Body of a create-index call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDefinition {
    pub settings: Value,
    pub mappings: Value,
}

/// One entry of an `_aliases` update request.
///
/// Serializes as `{"add": {"alias": .., "index": ..}}` or the `remove`
/// equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasAction {
    Add { alias: String, index: String },
    Remove { alias: String, index: String },
}

impl AliasAction {
    pub fn add(alias: impl Into<String>, index: impl Into<String>) -> Self {
        Self::Add {
            alias: alias.into(),
            index: index.into(),
        }
    }

    pub fn remove(alias: impl Into<String>, index: impl Into<String>) -> Self {
        Self::Remove {
            alias: alias.into(),
            index: index.into(),
        }
    }
}
