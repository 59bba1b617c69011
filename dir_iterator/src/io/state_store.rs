//! Durable per-directory progress storage.
//!
//! Records live behind [`ProgressRepository`] so tests can swap the JSON-file
//! store for an in-memory one. [`StateStore`] wraps a repository and turns
//! every storage failure into the soft-fail behavior the engine relies on:
//! unreadable records load as fresh, failed writes are logged and dropped.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::core::key::storage_key;
use crate::core::progress::ProgressState;

/// Keyed storage for progress records (storage key -> record).
pub trait ProgressRepository {
    /// Fetch the record for `key`; `Ok(None)` when no record exists.
    fn fetch(&self, key: &str) -> Result<Option<ProgressState>>;
    /// Replace the record for `key`.
    fn store(&self, key: &str, state: &ProgressState) -> Result<()>;
}

/// One pretty-printed JSON file per key under `state_dir`.
///
/// Writes overwrite the file in place. A crash mid-write leaves a truncated
/// record, which the next load treats as fresh.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    state_dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        self.state_dir.join(format!("directory_state_{key}.json"))
    }
}

impl ProgressRepository for JsonFileRepository {
    fn fetch(&self, key: &str) -> Result<Option<ProgressState>> {
        let path = self.record_path(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read progress record {}", path.display()));
            }
        };
        let state = decode_record(&contents)
            .with_context(|| format!("parse progress record {}", path.display()))?;
        Ok(Some(state))
    }

    fn store(&self, key: &str, state: &ProgressState) -> Result<()> {
        fs::create_dir_all(&self.state_dir)
            .with_context(|| format!("create state directory {}", self.state_dir.display()))?;
        let path = self.record_path(key);
        let mut buf = serde_json::to_string_pretty(state).context("serialize progress record")?;
        buf.push('\n');
        fs::write(&path, buf).with_context(|| format!("write progress record {}", path.display()))
    }
}

/// On-disk shape, permissive enough to accept older records.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    processed_files: Option<BTreeSet<PathBuf>>,
    #[serde(default)]
    directory_path: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    current_index: Option<i64>,
}

/// Parse a persisted record, migrating the legacy `current_index` shape.
///
/// Legacy positional progress is discarded rather than reconstructed: a record
/// carrying only `current_index` comes back with nothing processed.
pub fn decode_record(contents: &str) -> Result<ProgressState> {
    let record: StoredRecord = serde_json::from_str(contents)?;
    let processed_files = match (record.processed_files, record.current_index) {
        (Some(files), _) => files,
        (None, Some(index)) => {
            info!(current_index = index, "migrating legacy index-based progress record");
            BTreeSet::new()
        }
        (None, None) => BTreeSet::new(),
    };
    Ok(ProgressState {
        processed_files,
        directory_path: record.directory_path.unwrap_or_default(),
        completed: record.completed.unwrap_or(false),
    })
}

/// Soft-failing facade over a [`ProgressRepository`].
#[derive(Debug, Clone)]
pub struct StateStore<R> {
    repository: R,
}

impl<R: ProgressRepository> StateStore<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn key_for(directory: &str) -> String {
        storage_key(directory)
    }

    /// Load progress for `directory`, falling back to a fresh record.
    pub fn load(&self, directory: &str) -> ProgressState {
        let key = Self::key_for(directory);
        match self.repository.fetch(&key) {
            Ok(Some(state)) => {
                debug!(
                    %key,
                    processed = state.processed_count(),
                    completed = state.completed,
                    "progress loaded"
                );
                state
            }
            Ok(None) => {
                debug!(%key, "no progress record; starting fresh");
                ProgressState::new(directory)
            }
            Err(err) => {
                warn!(%key, error = %format!("{err:#}"), "unreadable progress record; starting fresh");
                ProgressState::new(directory)
            }
        }
    }

    /// Overwrite the stored record. Failures are logged, never returned.
    pub fn save(&self, directory: &str, state: &ProgressState) {
        let key = Self::key_for(directory);
        match self.repository.store(&key, state) {
            Ok(()) => debug!(%key, processed = state.processed_count(), "progress saved"),
            Err(err) => error!(%key, error = %format!("{err:#}"), "failed to save progress"),
        }
    }

    /// Replace the stored record with a fresh one and return it.
    pub fn reset(&self, directory: &str) -> ProgressState {
        let state = ProgressState::new(directory);
        self.save(directory, &state);
        state
    }
}
