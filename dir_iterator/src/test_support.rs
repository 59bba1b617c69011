//! Test-only fakes for the engine's seams: storage, loading and fixtures.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::progress::ProgressState;
use crate::io::loader::ItemLoader;
use crate::io::state_store::ProgressRepository;

/// In-memory progress repository. Clones share the same records, so a second
/// engine built from a clone behaves like a restarted process.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    // `None` marks a record that exists but cannot be read.
    records: Rc<RefCell<HashMap<String, Option<ProgressState>>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, state: ProgressState) {
        self.records
            .borrow_mut()
            .insert(key.to_string(), Some(state));
    }

    /// Simulate a record left unreadable (e.g. by a crash mid-write).
    pub fn corrupt(&self, key: &str) {
        self.records.borrow_mut().insert(key.to_string(), None);
    }

    pub fn get(&self, key: &str) -> Option<ProgressState> {
        self.records.borrow().get(key).cloned().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl ProgressRepository for MemoryRepository {
    fn fetch(&self, key: &str) -> Result<Option<ProgressState>> {
        match self.records.borrow().get(key) {
            None => Ok(None),
            Some(None) => Err(anyhow!("record {key} is unreadable")),
            Some(Some(state)) => Ok(Some(state.clone())),
        }
    }

    fn store(&self, key: &str, state: &ProgressState) -> Result<()> {
        self.insert(key, state.clone());
        Ok(())
    }
}

/// Loader that returns file contents, failing for chosen file names.
///
/// Every attempt is recorded in order, including failures.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLoader {
    failing: HashSet<String>,
    attempts: Rc<RefCell<Vec<PathBuf>>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<PathBuf> {
        self.attempts.borrow().clone()
    }
}

impl ItemLoader for ScriptedLoader {
    type Item = String;

    fn load(&self, path: &Path) -> Option<String> {
        self.attempts.borrow_mut().push(path.to_path_buf());
        let name = path.file_name()?.to_string_lossy();
        if self.failing.contains(name.as_ref()) {
            return None;
        }
        fs::read_to_string(path).ok()
    }
}

/// Temporary directory of fixture files. Each file's contents is its relative name.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create temp dir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory path in the string form the host passes to the engine.
    pub fn path_string(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn add(&self, relative: &str) -> Result<PathBuf> {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, relative).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn remove(&self, relative: &str) -> Result<()> {
        let path = self.file(relative);
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
    }
}
