//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};
use crate::runtime::DispatcherPriority;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    /// Dispatcher drain settings
    #[serde(default)]
    pub drain: DrainConfig,

    /// Scenario runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Dispatcher drain settings
#[derive(Debug, Deserialize, Serialize)]
pub struct DrainConfig {
    /// Priority of the sentinel that ends a drain
    ///
    /// Work queued below this priority is left pending.
    #[serde(default = "default_sentinel_priority")]
    pub sentinel_priority: DispatcherPriority,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            sentinel_priority: default_sentinel_priority(),
        }
    }
}

fn default_sentinel_priority() -> DispatcherPriority {
    DispatcherPriority::Background
}

/// Scenario runner settings
#[derive(Debug, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// Stop running further scenarios after the first failure
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,

    /// Print every step, not just failures and the summary
    #[serde(default)]
    pub verbose: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fail_fast: default_fail_fast(),
            verbose: false,
        }
    }
}

fn default_fail_fast() -> bool {
    true
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
