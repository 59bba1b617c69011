//! Shared deterministic types for the iteration engine.
//!
//! These types define stable contracts between the engine, its host and the
//! CLI. They carry no I/O.

use std::fmt;
use std::str::FromStr;

use anyhow::{Error, anyhow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where a single invocation ended up.
///
/// Recomputed on every call; nothing stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationState {
    /// Directory path empty or missing.
    Invalid,
    /// Directory has no eligible files.
    Empty,
    /// Every candidate is already processed.
    AllProcessed,
    /// An item was loaded and returned.
    Advancing,
    /// Every unprocessed candidate failed to load during this call.
    Exhausted,
}

/// Host-facing `enable` / `disable` switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    Enable,
    Disable,
}

impl Toggle {
    pub fn is_enabled(self) -> bool {
        self == Toggle::Enable
    }
}

impl From<bool> for Toggle {
    fn from(enabled: bool) -> Self {
        if enabled {
            Toggle::Enable
        } else {
            Toggle::Disable
        }
    }
}

impl FromStr for Toggle {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "enable" => Ok(Toggle::Enable),
            "disable" => Ok(Toggle::Disable),
            other => Err(anyhow!("expected `enable` or `disable`, got `{other}`")),
        }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toggle::Enable => write!(f, "enable"),
            Toggle::Disable => write!(f, "disable"),
        }
    }
}
