//! # CSV Reindexer
//!
//! Entry point wiring for the CSV blue-green reindexer.
//!
//! This crate resolves a triggering event into an ingestion request, builds
//! the per-profile collaborators from the environment and runs the index
//! lifecycle to completion.

pub mod config;

pub use config::Dependencies;

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use csv_reindexer_pipeline::{
    notifier_for, IndexLifecycleManager, IngestError, NotificationSink, RequestResolver,
    RunReport, TriggerEvent,
};
use csv_reindexer_repository::{LocalObjectStore, ObjectStore};
use csv_reindexer_shared::{IngestionRequest, NotificationStep};

/// Errors that can occur during reindexer initialization or execution.
#[derive(Error, Debug)]
pub enum ReindexError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// Search error raised while building the engine client.
    #[error("Search error: {0}")]
    SearchError(#[from] csv_reindexer_repository::SearchError),
}

impl ReindexError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Handle one object-created event end to end.
///
/// Resolution happens before the per-profile dependencies are built, since
/// the profile is only known once the object key has been parsed.
pub async fn run(event: TriggerEvent) -> Result<RunReport, ReindexError> {
    let storage: Arc<dyn ObjectStore> =
        Arc::new(LocalObjectStore::new(config::storage_root(&config::env_var)));
    let layout = config::key_layout(&config::env_var)?;

    let request = RequestResolver::with_layout(storage.clone(), layout)
        .resolve(&event)
        .await?;

    let notifier = notifier_for(&request.notification, request.action);
    let dependencies =
        prepare_dependencies(&request, storage, notifier.as_ref(), &config::env_var).await?;

    let mut manager = IndexLifecycleManager::with_config(
        request,
        dependencies.target,
        dependencies.search,
        dependencies.storage,
        notifier,
        dependencies.lifecycle,
    );
    let report = manager.run().await?;

    info!(
        real_index = %report.real_index,
        documents = report.documents_loaded,
        deleted = ?report.deleted_indices,
        "Reindex run finished"
    );
    Ok(report)
}

/// Build the dependencies for the request's profile.
///
/// The notifier is already known at this point, so a bad profile
/// configuration is reported on the `error` step like any run failure.
pub async fn prepare_dependencies<F>(
    request: &IngestionRequest,
    storage: Arc<dyn ObjectStore>,
    notifier: &dyn NotificationSink,
    lookup: &F,
) -> Result<Dependencies, ReindexError>
where
    F: Fn(&str) -> Option<String>,
{
    match Dependencies::from_lookup(&request.profile, storage, lookup) {
        Ok(dependencies) => Ok(dependencies),
        Err(e) => {
            error!(profile = %request.profile, error = %e, "Failed to initialize dependencies");
            let message = format!(
                "run {} failed before indexing: {} [key: {}/{}, action: {}, index: {}]",
                request.run_id,
                e,
                request.bucket,
                request.key,
                request.action,
                request.real_index
            );
            notifier.send(NotificationStep::Error, &message).await;
            Err(e)
        }
    }
}
