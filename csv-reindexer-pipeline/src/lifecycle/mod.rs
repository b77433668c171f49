//! Index lifecycle management.
//!
//! Drives one run through the blue-green sequence: ensure the new physical
//! index exists, bulk-load the source file into it, repoint the alias in a
//! single atomic request, delete superseded dated indices and archive the
//! source file. Every engine call completes before the next one starts and
//! nothing is retried; the first error fails the run.
//!
//! Concurrent runs for the same alias are not coordinated. The alias lookup
//! and update are a plain read-modify-write, so two overlapping runs can
//! race; deployments must serialize runs per alias externally.

mod state;

use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{error, info, instrument};

use crate::batcher::{BulkQueue, FlushOutcome, DEFAULT_MAX_DOCUMENTS};
use crate::errors::IngestError;
use crate::notifier::NotificationSink;
use crate::parser::RecordParser;
use csv_reindexer_repository::opensearch::build_index_definition;
use csv_reindexer_repository::{
    AliasAction, DryRunSearchClient, ObjectStore, SearchEngineClient, TargetProfile,
};
use csv_reindexer_shared::{IngestionRequest, NotificationStep};

pub use state::{LifecycleState, RetainedIndices, RunReport};

/// Configuration for the lifecycle manager.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Documents per bulk request.
    pub max_bulk_documents: usize,
    /// Move the consumed source file to its backup key after cleanup.
    pub archive_source: bool,
    /// Log engine requests instead of sending them.
    pub dry_run: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_bulk_documents: DEFAULT_MAX_DOCUMENTS,
            archive_source: false,
            dry_run: false,
        }
    }
}

/// Build the alias repoint request: remove the previously bound index (if
/// any) and add the new one, to be sent as a single call.
pub fn alias_swap_actions(
    alias: &str,
    previous_index: Option<&str>,
    new_index: &str,
) -> Vec<AliasAction> {
    let mut actions = Vec::with_capacity(2);
    if let Some(previous) = previous_index {
        actions.push(AliasAction::remove(alias, previous));
    }
    actions.push(AliasAction::add(alias, new_index));
    actions
}

/// Runs one ingestion request to completion.
pub struct IndexLifecycleManager {
    request: IngestionRequest,
    profile: TargetProfile,
    search: Arc<dyn SearchEngineClient>,
    storage: Arc<dyn ObjectStore>,
    notifier: Arc<dyn NotificationSink>,
    config: LifecycleConfig,
    state: LifecycleState,
}

impl IndexLifecycleManager {
    /// Create a new manager with default configuration.
    pub fn new(
        request: IngestionRequest,
        profile: TargetProfile,
        search: Arc<dyn SearchEngineClient>,
        storage: Arc<dyn ObjectStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::with_config(
            request,
            profile,
            search,
            storage,
            notifier,
            LifecycleConfig::default(),
        )
    }

    /// Create a new manager with custom configuration.
    ///
    /// With `dry_run` set, `search` is replaced by a client that only logs.
    pub fn with_config(
        request: IngestionRequest,
        profile: TargetProfile,
        search: Arc<dyn SearchEngineClient>,
        storage: Arc<dyn ObjectStore>,
        notifier: Arc<dyn NotificationSink>,
        config: LifecycleConfig,
    ) -> Self {
        let search: Arc<dyn SearchEngineClient> = if config.dry_run {
            info!(real_index = %request.real_index, "Dry run, engine requests are only logged");
            Arc::new(DryRunSearchClient::new())
        } else {
            search
        };

        Self {
            request,
            profile,
            search,
            storage,
            notifier,
            config,
            state: LifecycleState::Resolved,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run the whole lifecycle.
    ///
    /// Emits `start` first, `count` after loading, then `finish` on success
    /// or `error` (with key, action and index) on failure. Partially applied
    /// state is left in place on failure.
    #[instrument(skip(self), fields(run_id = %self.request.run_id, real_index = %self.request.real_index))]
    pub async fn run(&mut self) -> Result<RunReport, IngestError> {
        let mut report = RunReport::new(&self.request.real_index);
        self.notify(NotificationStep::Start, self.start_message()).await;

        match self.advance(&mut report).await {
            Ok(()) => {
                self.transition(LifecycleState::Finished);
                report.state = LifecycleState::Finished;
                self.notify(NotificationStep::Finish, self.finish_message(&report))
                    .await;
                Ok(report)
            }
            Err(e) => {
                let failed_after = self.state;
                self.transition(LifecycleState::Failed);
                report.state = LifecycleState::Failed;
                error!(failed_after = %failed_after, error = %e, "Reindex run failed");
                self.notify(NotificationStep::Error, self.error_message(failed_after, &e))
                    .await;
                Err(e)
            }
        }
    }

    async fn advance(&mut self, report: &mut RunReport) -> Result<(), IngestError> {
        self.ensure_index().await?;
        self.transition(LifecycleState::IndexEnsured);

        self.load(report).await?;
        self.transition(LifecycleState::Loaded);
        self.notify(
            NotificationStep::Count,
            format!(
                "{} documents loaded into {}",
                report.documents_loaded, self.request.real_index
            ),
        )
        .await;

        let retained = self.swap_alias(report).await?;
        self.transition(LifecycleState::AliasSwapped);

        self.cleanup(&retained, report).await?;
        self.transition(LifecycleState::Cleaned);

        self.archive(report).await?;
        self.transition(LifecycleState::Archived);
        Ok(())
    }

    fn transition(&mut self, next: LifecycleState) {
        info!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
    }

    async fn notify(&self, step: NotificationStep, message: String) {
        self.notifier.send(step, &message).await;
    }

    /// Create the new physical index unless the run reuses an existing one.
    async fn ensure_index(&self) -> Result<(), IngestError> {
        let request = &self.request;
        if request.reuses_existing_index() {
            info!(
                alias = %request.alias,
                action = %request.action,
                "Reusing existing index, skipping creation"
            );
            return Ok(());
        }

        let definition =
            build_index_definition(&self.profile, &request.mapping, request.analysis.as_ref());

        self.search
            .create_index(&request.real_index, &definition)
            .await
            .map_err(|source| IngestError::IndexProvisioningError {
                index: request.real_index.clone(),
                source,
            })
    }

    /// Stream the source file through the parser into bulk requests.
    async fn load(&self, report: &mut RunReport) -> Result<(), IngestError> {
        let request = &self.request;
        let reader = self.storage.get(&request.bucket, &request.key).await?;
        let mut parser = RecordParser::open(BufReader::new(reader), request).await?;
        let mut queue = BulkQueue::new(&request.real_index, self.config.max_bulk_documents);

        info!(
            index = %request.real_index,
            fields = parser.header().len(),
            max_documents = queue.max_documents(),
            "Loading documents"
        );

        while let Some(document) = parser.next_document().await? {
            if let Some(FlushOutcome::Sent { .. }) =
                queue.add(self.search.as_ref(), &document).await?
            {
                report.batches_sent += 1;
            }
        }

        if let FlushOutcome::Sent { .. } = queue.flush(self.search.as_ref()).await? {
            report.batches_sent += 1;
        }

        report.documents_loaded = queue.total_documents();
        info!(
            rows = parser.rows_read(),
            documents = report.documents_loaded,
            batches = report.batches_sent,
            "Load complete"
        );
        Ok(())
    }

    /// Point the alias at the new index in one atomic request.
    async fn swap_alias(&self, report: &mut RunReport) -> Result<RetainedIndices, IngestError> {
        let request = &self.request;
        if request.reuses_existing_index() {
            info!(alias = %request.alias, "Alias already targets the loaded index, skipping swap");
            return Ok(RetainedIndices::default());
        }

        let alias_error = |source| IngestError::AliasUpdateError {
            alias: request.alias.clone(),
            source,
        };

        let bound = self
            .search
            .get_alias_binding(&request.alias)
            .await
            .map_err(alias_error)?;

        if bound.len() > 1 {
            return Err(IngestError::MultipleAliasBindingError {
                alias: request.alias.clone(),
                indices: bound,
            });
        }
        let previous = bound.into_iter().next();

        let actions = alias_swap_actions(&request.alias, previous.as_deref(), &request.real_index);
        self.search
            .update_aliases(&actions)
            .await
            .map_err(alias_error)?;

        info!(
            alias = %request.alias,
            previous = ?previous,
            index = %request.real_index,
            "Alias repointed"
        );

        report.previous_index = previous.clone();
        Ok(RetainedIndices::new(&request.real_index, previous))
    }

    /// Delete dated indices of this alias that are not retained.
    async fn cleanup(
        &self,
        retained: &RetainedIndices,
        report: &mut RunReport,
    ) -> Result<(), IngestError> {
        let request = &self.request;
        if request.reuses_existing_index() || retained.is_empty() {
            info!(alias = %request.alias, "Nothing retained, skipping cleanup");
            return Ok(());
        }

        let cleanup_error = |source| IngestError::CleanupError {
            alias: request.alias.clone(),
            source,
        };

        let listed = self
            .search
            .list_indices_matching(&request.dated_index_pattern())
            .await
            .map_err(cleanup_error)?;

        let candidates = retained.deletion_candidates(&listed);
        if candidates.is_empty() {
            info!(alias = %request.alias, retained = ?retained.as_slice(), "No superseded indices");
            return Ok(());
        }

        self.search
            .delete_indices(&candidates)
            .await
            .map_err(cleanup_error)?;

        report.deleted_indices = candidates;
        Ok(())
    }

    /// Move the consumed source file to its backup key.
    async fn archive(&self, report: &mut RunReport) -> Result<(), IngestError> {
        if !self.config.archive_source {
            return Ok(());
        }

        let request = &self.request;
        let backup_key = request.backup_key();

        self.storage
            .copy(&request.bucket, &request.key, &backup_key)
            .await
            .map_err(|source| IngestError::ArchiveError {
                key: backup_key.clone(),
                source,
            })?;
        self.storage
            .delete(&request.bucket, &request.key)
            .await
            .map_err(|source| IngestError::ArchiveError {
                key: request.key.clone(),
                source,
            })?;

        info!(from = %request.key, to = %backup_key, "Archived source file");
        report.archived_key = Some(backup_key);
        Ok(())
    }

    fn start_message(&self) -> String {
        let request = &self.request;
        format!(
            "run {} started: {} {}/{} into {} (alias {}, profile {})",
            request.run_id,
            request.action,
            request.bucket,
            request.key,
            request.real_index,
            request.alias,
            request.profile
        )
    }

    fn finish_message(&self, report: &RunReport) -> String {
        format!(
            "run {} finished: {} documents in {}, alias {} ready",
            self.request.run_id, report.documents_loaded, report.real_index, self.request.alias
        )
    }

    fn error_message(&self, failed_after: LifecycleState, error: &IngestError) -> String {
        let request = &self.request;
        format!(
            "run {} failed after {}: {} [key: {}/{}, action: {}, index: {}]",
            request.run_id,
            failed_after,
            error,
            request.bucket,
            request.key,
            request.action,
            request.real_index
        )
    }
}
