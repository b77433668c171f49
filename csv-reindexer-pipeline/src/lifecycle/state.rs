//! Lifecycle states and the per-run report.

use std::fmt;

/// Where a run is in the blue-green sequence.
///
/// States advance strictly in declaration order; `Failed` is reachable from
/// any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Resolved,
    IndexEnsured,
    Loaded,
    AliasSwapped,
    Cleaned,
    Archived,
    Finished,
    Failed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Resolved => "resolved",
            LifecycleState::IndexEnsured => "index_ensured",
            LifecycleState::Loaded => "loaded",
            LifecycleState::AliasSwapped => "alias_swapped",
            LifecycleState::Cleaned => "cleaned",
            LifecycleState::Archived => "archived",
            LifecycleState::Finished => "finished",
            LifecycleState::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indices that cleanup must never delete: the new real index and whatever
/// the alias pointed at before the swap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetainedIndices {
    indices: Vec<String>,
}

impl RetainedIndices {
    pub fn new(new_index: impl Into<String>, previous_index: Option<String>) -> Self {
        let mut indices = vec![new_index.into()];
        indices.extend(previous_index);
        Self { indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: &str) -> bool {
        self.indices.iter().any(|i| i == index)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.indices
    }

    /// Listed indices that are safe to delete, in listing order.
    pub fn deletion_candidates(&self, listed: &[String]) -> Vec<String> {
        listed
            .iter()
            .filter(|index| !self.contains(index))
            .cloned()
            .collect()
    }
}

/// Outcome of a completed (or failed) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub real_index: String,
    pub documents_loaded: usize,
    pub batches_sent: usize,
    /// Index the alias pointed at before the swap, if any.
    pub previous_index: Option<String>,
    pub deleted_indices: Vec<String>,
    /// Backup key the source file was archived to.
    pub archived_key: Option<String>,
    pub state: LifecycleState,
}

impl RunReport {
    pub fn new(real_index: impl Into<String>) -> Self {
        Self {
            real_index: real_index.into(),
            documents_loaded: 0,
            batches_sent: 0,
            previous_index: None,
            deleted_indices: Vec::new(),
            archived_key: None,
            state: LifecycleState::Resolved,
        }
    }
}
