//! Iterator configuration stored in `dir-iterator.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::scan::DEFAULT_EXTENSIONS;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dir-iterator.toml";

/// Iterator configuration (TOML).
///
/// Missing fields fall back to the defaults below, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IteratorConfig {
    /// Directory holding one progress record per iterated directory.
    pub state_dir: PathBuf,

    /// Eligible file extensions, matched case-insensitively against file names.
    pub extensions: Vec<String>,

    /// Default for `--process-subdirectories` when the flag is omitted.
    pub process_subdirectories: bool,

    /// Default for `--reset-on-directory-change` when the flag is omitted.
    pub reset_on_directory_change: bool,
}

impl Default for IteratorConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".directory_states"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            process_subdirectories: false,
            reset_on_directory_change: true,
        }
    }
}

impl IteratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.state_dir.as_os_str().is_empty() {
            return Err(anyhow!("state_dir must not be empty"));
        }
        if self.extensions.is_empty() {
            return Err(anyhow!("extensions must be a non-empty array"));
        }
        for ext in &self.extensions {
            if ext.len() < 2 || !ext.starts_with('.') {
                return Err(anyhow!(
                    "extension `{ext}` must start with `.` and name a suffix"
                ));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `IteratorConfig::default()`.
pub fn load_config(path: &Path) -> Result<IteratorConfig> {
    if !path.exists() {
        let cfg = IteratorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: IteratorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Write the default config to `path`.
///
/// Fails if the file already exists unless `force` is set.
pub fn init_config(path: &Path, force: bool) -> Result<IteratorConfig> {
    if path.exists() && !force {
        return Err(anyhow!(
            "init: {} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    let cfg = IteratorConfig::default();
    write_config(path, &cfg)?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &IteratorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
