//! Bulk batching.
//!
//! Accumulates index operations and renders them into the engine's
//! newline-delimited bulk format, flushing whenever the configured document
//! count is reached.

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::IngestError;
use csv_reindexer_repository::SearchEngineClient;
use csv_reindexer_shared::Document;

/// Documents per bulk request when not configured.
pub const DEFAULT_MAX_DOCUMENTS: usize = 1000;

#[derive(Serialize)]
struct IndexTarget<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: &'a str,
}

/// Action-metadata line: `{"index": {"_index": .., "_id": ..}}`.
#[derive(Serialize)]
struct ActionMetadata<'a> {
    index: IndexTarget<'a>,
}

/// A rendered bulk request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkBatch {
    /// Newline-joined lines with a trailing newline.
    pub body: String,
    pub documents: usize,
}

/// Result of a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued; no request was sent.
    Empty,
    /// One bulk request carrying `documents` documents was sent.
    Sent { documents: usize },
}

/// Size-bounded queue of rendered bulk lines.
#[derive(Debug)]
pub struct BulkQueue {
    index: String,
    lines: Vec<String>,
    max_documents: usize,
    added_documents: usize,
    total_documents: usize,
}

impl BulkQueue {
    /// Create a queue targeting `index`. A zero maximum is treated as one.
    pub fn new(index: impl Into<String>, max_documents: usize) -> Self {
        let max_documents = max_documents.max(1);
        Self {
            index: index.into(),
            lines: Vec::new(),
            max_documents,
            added_documents: 0,
            total_documents: 0,
        }
    }

    /// Append the action and body lines for one document.
    pub fn push(&mut self, document: &Document) -> Result<(), IngestError> {
        let metadata = ActionMetadata {
            index: IndexTarget {
                index: &self.index,
                id: &document.id,
            },
        };
        self.lines.push(serde_json::to_string(&metadata)?);
        self.lines.push(serde_json::to_string(document)?);

        self.added_documents += 1;
        self.total_documents += 1;
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.added_documents >= self.max_documents
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Documents in the current batch.
    pub fn added_documents(&self) -> usize {
        self.added_documents
    }

    /// Documents ever queued; never reset.
    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    pub fn max_documents(&self) -> usize {
        self.max_documents
    }

    /// Render and clear the current batch, or `None` if it is empty.
    pub fn take_batch(&mut self) -> Option<BulkBatch> {
        if self.is_empty() {
            return None;
        }

        let mut body = self.lines.join("\n");
        body.push('\n');
        let batch = BulkBatch {
            body,
            documents: self.added_documents,
        };

        self.lines.clear();
        self.added_documents = 0;
        Some(batch)
    }

    /// Send the current batch through `client`.
    pub async fn flush(
        &mut self,
        client: &dyn SearchEngineClient,
    ) -> Result<FlushOutcome, IngestError> {
        let Some(batch) = self.take_batch() else {
            debug!(index = %self.index, "Bulk queue is empty, nothing to flush");
            return Ok(FlushOutcome::Empty);
        };

        client
            .bulk(&batch.body)
            .await
            .map_err(|source| IngestError::BulkLoadError {
                index: self.index.clone(),
                source,
            })?;

        info!(
            index = %self.index,
            documents = batch.documents,
            total_documents = self.total_documents,
            "Flushed bulk batch"
        );
        Ok(FlushOutcome::Sent {
            documents: batch.documents,
        })
    }

    /// Queue a document and flush if the batch reached its maximum.
    pub async fn add(
        &mut self,
        client: &dyn SearchEngineClient,
        document: &Document,
    ) -> Result<Option<FlushOutcome>, IngestError> {
        self.push(document)?;
        if self.is_full() {
            return self.flush(client).await.map(Some);
        }
        Ok(None)
    }
}
