//! Orchestration for a single iteration invocation.
//!
//! One call to [`DirectoryIterator::advance`] rescans the directory, diffs the
//! candidates against persisted progress, attempts unprocessed files in order
//! until one loads, persists the grown processed set, and reports where it
//! ended up. Nothing in here returns an error to the host: every path yields a
//! well-formed [`IterationResult`].

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::progress::unprocessed;
use crate::core::status;
use crate::core::types::{IterationState, Toggle};
use crate::io::loader::ItemLoader;
use crate::io::scan::{ExtensionScanner, FileScanner};
use crate::io::state_store::{ProgressRepository, StateStore};

/// Inputs for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationRequest {
    /// Directory to iterate, as given by the host.
    pub directory: String,
    /// Walk subdirectories instead of immediate children only.
    pub recursive: bool,
    /// Start over when the stored record belongs to another directory.
    pub reset_on_directory_change: bool,
    /// Discard stored progress before selecting.
    pub reset: bool,
}

impl IterationRequest {
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            recursive: false,
            reset_on_directory_change: true,
            reset: false,
        }
    }

    /// Build a request from the host's string inputs.
    ///
    /// `reset_progress` counts as set only when it is exactly `"true"`.
    pub fn from_inputs(
        directory: &str,
        process_subdirectories: &str,
        reset_on_directory_change: &str,
        reset_progress: &str,
    ) -> Result<Self> {
        let recursive: Toggle = process_subdirectories.parse()?;
        let reset_on_change: Toggle = reset_on_directory_change.parse()?;
        Ok(Self {
            directory: directory.to_string(),
            recursive: recursive.is_enabled(),
            reset_on_directory_change: reset_on_change.is_enabled(),
            reset: reset_progress == "true",
        })
    }
}

/// Outcome of one invocation.
///
/// `completed` is true only when `item` is present: it means "an item is
/// available this call", not "the directory is done".
#[derive(Debug, Clone, Serialize)]
pub struct IterationResult<T> {
    pub state: IterationState,
    #[serde(skip)]
    pub item: Option<T>,
    pub file_path: String,
    pub file_name: String,
    /// Processed count so far, including files consumed by failed attempts.
    pub current_index: usize,
    pub total_count: usize,
    pub completed: bool,
    pub status: String,
}

impl<T> IterationResult<T> {
    fn without_item(
        state: IterationState,
        current_index: usize,
        total_count: usize,
        status: String,
    ) -> Self {
        Self {
            state,
            item: None,
            file_path: String::new(),
            file_name: String::new(),
            current_index,
            total_count,
            completed: false,
            status,
        }
    }

    pub fn has_item(&self) -> bool {
        self.item.is_some()
    }
}

/// The iteration engine: a progress store, a loader and a scanner.
#[derive(Debug, Clone)]
pub struct DirectoryIterator<R, L, S = ExtensionScanner> {
    store: StateStore<R>,
    loader: L,
    scanner: S,
}

impl<R: ProgressRepository, L: ItemLoader> DirectoryIterator<R, L> {
    /// Engine using the default image extension allowlist.
    pub fn new(repository: R, loader: L) -> Self {
        Self::with_scanner(repository, loader, ExtensionScanner::default())
    }
}

impl<R, L, S> DirectoryIterator<R, L, S>
where
    R: ProgressRepository,
    L: ItemLoader,
    S: FileScanner,
{
    pub fn with_scanner(repository: R, loader: L, scanner: S) -> Self {
        Self {
            store: StateStore::new(repository),
            loader,
            scanner,
        }
    }

    /// Hand out the next eligible file, attempting each file at most once ever.
    pub fn advance(&self, request: &IterationRequest) -> IterationResult<L::Item> {
        let directory = request.directory.as_str();
        if directory.is_empty() || !Path::new(directory).exists() {
            warn!(directory, "invalid directory path");
            return IterationResult::without_item(
                IterationState::Invalid,
                0,
                0,
                status::INVALID_DIRECTORY.to_string(),
            );
        }

        let candidates = self.scanner.scan(Path::new(directory), request.recursive);
        let total = candidates.len();
        if candidates.is_empty() {
            info!(directory, recursive = request.recursive, "no eligible files");
            return IterationResult::without_item(
                IterationState::Empty,
                0,
                0,
                status::NO_ELIGIBLE_FILES.to_string(),
            );
        }

        let mut state = self.store.load(directory);
        if state.directory_path != directory && request.reset_on_directory_change {
            info!(
                stored = %state.directory_path,
                directory,
                "record belongs to another directory; resetting"
            );
            state = self.store.reset(directory);
        }
        if request.reset {
            info!(directory, "reset requested");
            state = self.store.reset(directory);
        }

        let pending = unprocessed(&candidates, &state);
        if pending.is_empty() {
            state.completed = true;
            self.store.save(directory, &state);
            let processed = state.processed_count();
            let message = status::all_processed(processed);
            info!(directory, processed, total, "{message}");
            return IterationResult::without_item(
                IterationState::AllProcessed,
                processed,
                total,
                message,
            );
        }

        let mut loaded = None;
        for path in pending {
            if !path.exists() {
                // Removed between the scan and this attempt.
                info!(path = %path.display(), "skipping missing file");
                state.mark_processed(path);
                continue;
            }
            let item = self.loader.load(path);
            state.mark_processed(path);
            match item {
                Some(item) => {
                    loaded = Some((path, item));
                    break;
                }
                None => warn!(path = %path.display(), "failed to load; not retrying"),
            }
        }

        state.refresh_completed(&candidates);
        self.store.save(directory, &state);
        let processed = state.processed_count();

        let Some((path, item)) = loaded else {
            let message = status::exhausted(processed, total);
            warn!(directory, processed, total, "{message}");
            return IterationResult::without_item(
                IterationState::Exhausted,
                processed,
                total,
                message,
            );
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let message = status::advancing(&file_name, processed, total);
        info!(directory, processed, total, "{message}");
        IterationResult {
            state: IterationState::Advancing,
            item: Some(item),
            file_path: path.to_string_lossy().into_owned(),
            file_name,
            current_index: processed,
            total_count: total,
            completed: true,
            status: message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::storage_key;
    use crate::core::progress::ProgressState;
    use crate::test_support::{MemoryRepository, ScriptedLoader, TestDir};

    fn engine(
        repo: &MemoryRepository,
        loader: &ScriptedLoader,
    ) -> DirectoryIterator<MemoryRepository, ScriptedLoader> {
        DirectoryIterator::new(repo.clone(), loader.clone())
    }

    #[test]
    fn invalid_directory_touches_nothing() {
        let repo = MemoryRepository::new();
        let loader = ScriptedLoader::new();
        let iter = engine(&repo, &loader);

        for directory in ["", "/definitely/not/here"] {
            let result = iter.advance(&IterationRequest::new(directory));
            assert_eq!(result.state, IterationState::Invalid);
            assert_eq!(result.status, "Invalid directory path");
            assert_eq!((result.current_index, result.total_count), (0, 0));
            assert!(!result.completed);
        }
        assert!(repo.is_empty());
    }

    #[test]
    fn empty_directory_is_not_persisted() {
        let dir = TestDir::new().expect("dir");
        dir.add("notes.txt").expect("add");
        let repo = MemoryRepository::new();
        let loader = ScriptedLoader::new();

        let result = engine(&repo, &loader).advance(&IterationRequest::new(dir.path_string()));
        assert_eq!(result.state, IterationState::Empty);
        assert_eq!(result.status, "No images found in directory");
        assert!(repo.is_empty());
    }

    /// A failed load consumes the file: it is never offered to the loader again.
    #[test]
    fn failed_item_is_consumed_without_retry() {
        let dir = TestDir::new().expect("dir");
        dir.add("a.png").expect("add");
        dir.add("b.png").expect("add");
        let repo = MemoryRepository::new();
        let loader = ScriptedLoader::failing(["a.png"]);
        let iter = engine(&repo, &loader);
        let request = IterationRequest::new(dir.path_string());

        let first = iter.advance(&request);
        assert_eq!(first.state, IterationState::Advancing);
        assert_eq!(first.file_name, "b.png");
        assert_eq!((first.current_index, first.total_count), (2, 2));

        let second = iter.advance(&request);
        assert_eq!(second.state, IterationState::AllProcessed);
        assert_eq!(loader.attempts(), vec![dir.file("a.png"), dir.file("b.png")]);
    }

    #[test]
    fn every_remaining_failure_reports_exhausted() {
        let dir = TestDir::new().expect("dir");
        dir.add("a.png").expect("add");
        dir.add("b.png").expect("add");
        let repo = MemoryRepository::new();
        let loader = ScriptedLoader::failing(["a.png", "b.png"]);

        let result = engine(&repo, &loader).advance(&IterationRequest::new(dir.path_string()));
        assert_eq!(result.state, IterationState::Exhausted);
        assert!(result.item.is_none());
        assert!(!result.completed);
        assert_eq!(
            result.status,
            "All remaining images failed to load. Processed 2/2 images."
        );

        let stored = repo
            .get(&storage_key(&dir.path_string()))
            .expect("persisted");
        assert_eq!(stored.processed_count(), 2);
        assert!(stored.completed);
    }

    #[test]
    fn foreign_record_is_reset_when_enabled() {
        let dir = TestDir::new().expect("dir");
        dir.add("a.png").expect("add");
        let directory = dir.path_string();
        let repo = MemoryRepository::new();
        let mut foreign = ProgressState::new("/somewhere/else");
        foreign.mark_processed(&dir.file("a.png"));
        repo.insert(&storage_key(&directory), foreign);
        let loader = ScriptedLoader::new();

        let result = engine(&repo, &loader).advance(&IterationRequest::new(directory.clone()));
        assert_eq!(result.state, IterationState::Advancing);
        let stored = repo.get(&storage_key(&directory)).expect("stored");
        assert_eq!(stored.directory_path, directory);
    }

    #[test]
    fn foreign_record_is_kept_when_reset_disabled() {
        let dir = TestDir::new().expect("dir");
        dir.add("a.png").expect("add");
        let directory = dir.path_string();
        let repo = MemoryRepository::new();
        let mut foreign = ProgressState::new("/somewhere/else");
        foreign.mark_processed(&dir.file("a.png"));
        repo.insert(&storage_key(&directory), foreign);
        let loader = ScriptedLoader::new();

        let request = IterationRequest {
            reset_on_directory_change: false,
            ..IterationRequest::new(directory)
        };
        let result = engine(&repo, &loader).advance(&request);
        assert_eq!(result.state, IterationState::AllProcessed);
        assert!(loader.attempts().is_empty());
    }

    #[test]
    fn explicit_reset_starts_over() {
        let dir = TestDir::new().expect("dir");
        dir.add("a.png").expect("add");
        dir.add("b.png").expect("add");
        let repo = MemoryRepository::new();
        let loader = ScriptedLoader::new();
        let iter = engine(&repo, &loader);
        let request = IterationRequest::new(dir.path_string());

        assert_eq!(iter.advance(&request).file_name, "a.png");
        assert_eq!(iter.advance(&request).file_name, "b.png");

        let reset = IterationRequest {
            reset: true,
            ..request.clone()
        };
        let result = iter.advance(&reset);
        assert_eq!(result.file_name, "a.png");
        assert_eq!(result.current_index, 1);
    }

    #[test]
    fn unreadable_record_falls_back_to_fresh_state() {
        let dir = TestDir::new().expect("dir");
        dir.add("a.png").expect("add");
        let directory = dir.path_string();
        let repo = MemoryRepository::new();
        repo.corrupt(&storage_key(&directory));
        let loader = ScriptedLoader::new();

        let result = engine(&repo, &loader).advance(&IterationRequest::new(directory.clone()));
        assert_eq!(result.state, IterationState::Advancing);
        assert_eq!(result.item.as_deref(), Some("a.png"));
        let stored = repo.get(&storage_key(&directory)).expect("rewritten");
        assert_eq!(stored.processed_count(), 1);
    }

    #[test]
    fn request_from_host_inputs() {
        let request =
            IterationRequest::from_inputs("/imgs", "enable", "disable", "true").expect("parse");
        assert_eq!(
            request,
            IterationRequest {
                directory: "/imgs".to_string(),
                recursive: true,
                reset_on_directory_change: false,
                reset: true,
            }
        );

        let request =
            IterationRequest::from_inputs("/imgs", "disable", "enable", "yes").expect("parse");
        assert!(!request.reset);
        assert!(IterationRequest::from_inputs("/imgs", "on", "enable", "false").is_err());
    }
}
