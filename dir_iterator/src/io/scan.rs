//! Eligible-file enumeration for a directory.
//!
//! Every invocation rescans; nothing is memoized, so files added or removed
//! between calls show up on the next one. Scans never fail: an unreadable
//! directory produces an empty candidate set.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Default allowlist of image extensions (lowercase, with leading dot).
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif", ".webp", ".gif",
];

/// Produces the ordered candidate set for one invocation.
pub trait FileScanner {
    fn scan(&self, directory: &Path, recursive: bool) -> Vec<PathBuf>;
}

/// Scanner that keeps files whose name ends with an allowed extension.
#[derive(Debug, Clone)]
pub struct ExtensionScanner {
    extensions: Vec<String>,
}

impl Default for ExtensionScanner {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl ExtensionScanner {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive suffix match on the file name.
    pub fn is_eligible(&self, file_name: &str) -> bool {
        let lowered = file_name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| lowered.ends_with(ext.as_str()))
    }

    /// Immediate children of `directory` only.
    pub fn scan_flat(&self, directory: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(directory = %directory.display(), error = %err, "cannot read directory");
                return Vec::new();
            }
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(directory = %directory.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if self.keep(&path) {
                found.push(path);
            }
        }
        sort_by_full_path(&mut found);
        debug!(directory = %directory.display(), count = found.len(), "flat scan");
        found
    }

    /// Whole subtree of `directory`, ordered across the tree rather than per folder.
    pub fn scan_recursive(&self, directory: &Path) -> Vec<PathBuf> {
        if !directory.is_dir() {
            warn!(directory = %directory.display(), "not a readable directory");
            return Vec::new();
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(directory).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(directory = %directory.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            if self.keep(entry.path()) {
                found.push(entry.into_path());
            }
        }
        sort_by_full_path(&mut found);
        debug!(directory = %directory.display(), count = found.len(), "recursive scan");
        found
    }

    fn keep(&self, path: &Path) -> bool {
        // Progress records store paths as JSON strings.
        if path.to_str().is_none() {
            warn!(path = %path.display(), "skipping path that is not valid UTF-8");
            return false;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        // `is_file` follows symlinks, so linked images count as files.
        self.is_eligible(name) && path.is_file()
    }
}

impl FileScanner for ExtensionScanner {
    fn scan(&self, directory: &Path, recursive: bool) -> Vec<PathBuf> {
        if recursive {
            self.scan_recursive(directory)
        } else {
            self.scan_flat(directory)
        }
    }
}

fn sort_by_full_path(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}
