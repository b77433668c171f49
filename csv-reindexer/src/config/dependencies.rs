//! Dependency initialization and wiring for the reindexer.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::ReindexError;
use csv_reindexer_pipeline::batcher::DEFAULT_MAX_DOCUMENTS;
use csv_reindexer_pipeline::LifecycleConfig;
use csv_reindexer_repository::config::DEFAULT_ENGINE_URL;
use csv_reindexer_repository::{ObjectStore, OpenSearchClient, SearchEngineClient, TargetProfile};
use csv_reindexer_shared::KeyLayout;

/// Default local object store directory.
const DEFAULT_STORAGE_ROOT: &str = ".";

/// Read a variable from the process environment.
pub fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn profile_suffix(profile: &str) -> String {
    profile.to_uppercase().replace('-', "_")
}

/// `<NAME>_<PROFILE>` if set, otherwise `<NAME>`. Empty values count as unset.
fn profile_var<F>(lookup: &F, name: &str, profile: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&format!("{}_{}", name, profile_suffix(profile)))
        .filter(|value| !value.is_empty())
        .or_else(|| lookup(name).filter(|value| !value.is_empty()))
}

fn parse_or<T>(name: &str, value: Option<String>, default: T) -> Result<T, ReindexError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ReindexError::config(format!("{}='{}': {}", name, raw, e))),
        None => Ok(default),
    }
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool, ReindexError> {
    match value.as_deref().map(str::trim) {
        None => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => Err(ReindexError::config(format!(
            "{}='{}': expected true or false",
            name, other
        ))),
    }
}

/// Engine target for `profile`.
///
/// # Environment Variables
///
/// Each may carry a `_<PROFILE>` suffix (`OPENSEARCH_URL_PROD`) that takes
/// precedence over the plain name.
///
/// - `OPENSEARCH_URL`: engine URL (default: http://localhost:9200)
/// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: basic auth, both or neither
/// - `INDEX_SHARDS`: primary shards for new indices (default: 1)
/// - `INDEX_REPLICAS`: replicas for new indices (default: 0)
pub fn target_profile<F>(profile: &str, lookup: &F) -> Result<TargetProfile, ReindexError>
where
    F: Fn(&str) -> Option<String>,
{
    let url = profile_var(lookup, "OPENSEARCH_URL", profile)
        .unwrap_or_else(|| DEFAULT_ENGINE_URL.to_string());
    let shards = parse_or(
        "INDEX_SHARDS",
        profile_var(lookup, "INDEX_SHARDS", profile),
        1u32,
    )?;
    let replicas = parse_or(
        "INDEX_REPLICAS",
        profile_var(lookup, "INDEX_REPLICAS", profile),
        0u32,
    )?;

    let target = TargetProfile::new(profile, url).with_shards(shards, replicas);

    match (
        profile_var(lookup, "OPENSEARCH_USERNAME", profile),
        profile_var(lookup, "OPENSEARCH_PASSWORD", profile),
    ) {
        (Some(username), Some(password)) => Ok(target.with_credentials(username, password)),
        (None, None) => Ok(target),
        _ => Err(ReindexError::config(format!(
            "profile {}: OPENSEARCH_USERNAME and OPENSEARCH_PASSWORD must be set together",
            profile
        ))),
    }
}

/// `BULK_MAX_DOCUMENTS` (default: 1000), `ARCHIVE_SOURCE` and `DRY_RUN`
/// (both default: false).
pub fn lifecycle_config<F>(lookup: &F) -> Result<LifecycleConfig, ReindexError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(LifecycleConfig {
        max_bulk_documents: parse_or(
            "BULK_MAX_DOCUMENTS",
            lookup("BULK_MAX_DOCUMENTS"),
            DEFAULT_MAX_DOCUMENTS,
        )?,
        archive_source: parse_flag("ARCHIVE_SOURCE", lookup("ARCHIVE_SOURCE"))?,
        dry_run: parse_flag("DRY_RUN", lookup("DRY_RUN"))?,
    })
}

/// `KEY_LAYOUT`: `root/profile/alias` (default) or `root/alias/profile`.
pub fn key_layout<F>(lookup: &F) -> Result<KeyLayout, ReindexError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("KEY_LAYOUT").filter(|value| !value.is_empty()) {
        Some(raw) => raw.parse().map_err(ReindexError::config),
        None => Ok(KeyLayout::default()),
    }
}

/// `STORAGE_ROOT`: directory holding one subdirectory per bucket.
pub fn storage_root<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(lookup("STORAGE_ROOT").unwrap_or_else(|| DEFAULT_STORAGE_ROOT.to_string()))
}

/// Container for all initialized dependencies of one run.
pub struct Dependencies {
    /// Engine target and index-shape defaults for the run's profile.
    pub target: TargetProfile,
    pub search: Arc<dyn SearchEngineClient>,
    pub storage: Arc<dyn ObjectStore>,
    pub lifecycle: LifecycleConfig,
}

impl Dependencies {
    /// Initialize all dependencies for `profile`, reading variables through
    /// `lookup` (`env_var` in production).
    pub fn from_lookup<F>(
        profile: &str,
        storage: Arc<dyn ObjectStore>,
        lookup: &F,
    ) -> Result<Self, ReindexError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let target = target_profile(profile, lookup)?;
        let lifecycle = lifecycle_config(lookup)?;

        info!(
            profile = %target.name,
            opensearch_url = %target.url,
            authenticated = target.username.is_some(),
            shards = target.number_of_shards,
            replicas = target.number_of_replicas,
            max_bulk_documents = lifecycle.max_bulk_documents,
            archive_source = lifecycle.archive_source,
            dry_run = lifecycle.dry_run,
            "Initializing dependencies"
        );

        let search = OpenSearchClient::new(&target)?;

        Ok(Self {
            target,
            search: Arc::new(search),
            storage,
            lifecycle,
        })
    }
}
