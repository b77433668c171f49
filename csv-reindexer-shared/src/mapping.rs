//! Index mapping document wrapper.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The engine mapping document taken from `indexMappings`.
///
/// Accepts both `{"mappings": {"properties": ..}}` and the bare
/// `{"properties": ..}` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexMapping(Value);

impl IndexMapping {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// The value sent as `mappings` when creating an index.
    pub fn mappings(&self) -> &Value {
        match self.0.get("mappings") {
            Some(mappings) => mappings,
            None => &self.0,
        }
    }

    pub fn has_property(&self, field: &str) -> bool {
        self.mappings()
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| properties.contains_key(field))
            .unwrap_or(false)
    }
}

impl Default for IndexMapping {
    fn default() -> Self {
        Self(json!({ "mappings": { "properties": {} } }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_mapping() {
        let mapping = IndexMapping::new(json!({
            "mappings": { "properties": { "no": { "type": "keyword" } } }
        }));
        assert!(mapping.has_property("no"));
        assert!(!mapping.has_property("nickname"));
        assert!(mapping.mappings()["properties"]["no"].is_object());
    }

    #[test]
    fn test_bare_mapping() {
        let mapping = IndexMapping::new(json!({
            "properties": { "nickname": { "type": "keyword" } }
        }));
        assert!(mapping.has_property("nickname"));
    }

    #[test]
    fn test_default_has_no_properties() {
        assert!(!IndexMapping::default().has_property("id"));
    }
}
