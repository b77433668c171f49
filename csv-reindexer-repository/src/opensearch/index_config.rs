//! OpenSearch index settings.
//!
//! Combines the profile's shard layout, the per-run analysis override and the
//! mapping document into the body of a create-index call.

use serde_json::{json, Value};

use crate::config::TargetProfile;
use crate::types::IndexDefinition;
use csv_reindexer_shared::IndexMapping;

/// Build the create-index body for a new physical index.
///
/// `analysis`, when present, is placed under `settings.analysis` next to the
/// profile's `number_of_shards` and `number_of_replicas`.
pub fn build_index_definition(
    profile: &TargetProfile,
    mapping: &IndexMapping,
    analysis: Option<&Value>,
) -> IndexDefinition {
    let mut settings = json!({
        "number_of_shards": profile.number_of_shards,
        "number_of_replicas": profile.number_of_replicas
    });

    if let Some(analysis) = analysis {
        settings["analysis"] = analysis.clone();
    }

    IndexDefinition {
        settings,
        mappings: mapping.mappings().clone(),
    }
}
