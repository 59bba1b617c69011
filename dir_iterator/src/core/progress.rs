//! Per-directory progress record and the pure diff against a fresh scan.
//!
//! Nothing here touches the filesystem. Candidates come from a scan made by the
//! caller for the current invocation only; the record is what survives between
//! invocations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Persisted progress for one directory key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressState {
    /// Paths that will never be attempted again, whether they loaded or not.
    pub processed_files: BTreeSet<PathBuf>,
    /// Directory the record was built for.
    pub directory_path: String,
    /// Snapshot of "every candidate is processed" from the last invocation.
    pub completed: bool,
}

impl ProgressState {
    /// Fresh record with nothing processed.
    pub fn new(directory: &str) -> Self {
        Self {
            processed_files: BTreeSet::new(),
            directory_path: directory.to_string(),
            completed: false,
        }
    }

    pub fn processed_count(&self) -> usize {
        self.processed_files.len()
    }

    pub fn is_processed(&self, path: &Path) -> bool {
        self.processed_files.contains(path)
    }

    /// Record a path as consumed. Returns false if it was already recorded.
    pub fn mark_processed(&mut self, path: &Path) -> bool {
        self.processed_files.insert(path.to_path_buf())
    }

    /// Recompute `completed` against the current candidate set.
    pub fn refresh_completed(&mut self, candidates: &[PathBuf]) {
        self.completed = covers_all(self, candidates);
    }
}

/// Candidates not yet processed, in candidate order.
pub fn unprocessed<'a>(candidates: &'a [PathBuf], state: &ProgressState) -> Vec<&'a PathBuf> {
    candidates
        .iter()
        .filter(|path| !state.is_processed(path))
        .collect()
}

/// True when every candidate appears in the processed set.
pub fn covers_all(state: &ProgressState, candidates: &[PathBuf]) -> bool {
    candidates.iter().all(|path| state.is_processed(path))
}
