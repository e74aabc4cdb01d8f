//! Configuration data structures

use super::logging_config::LoggingConfig;
use crate::error::{HdevError, HdevResult};
use hdev_session::LocalSessionStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default fraction of the context window at which compaction triggers
pub const DEFAULT_THRESHOLD_RATIO: f64 = 0.85;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdevConfig {
    pub compaction: CompactionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl HdevConfig {
    /// Validate all sections
    pub fn validate(&self) -> HdevResult<()> {
        self.compaction.validate()
    }
}

/// Compaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Whether automatic compaction runs at all
    pub enabled: bool,
    /// Fraction of the context window at which compaction triggers
    pub threshold_ratio: f64,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_ratio: DEFAULT_THRESHOLD_RATIO,
        }
    }
}

impl CompactionConfig {
    /// Enable or disable compaction
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the threshold ratio
    pub fn with_threshold_ratio(mut self, ratio: f64) -> Self {
        self.threshold_ratio = ratio;
        self
    }

    pub fn validate(&self) -> HdevResult<()> {
        if !(0.0..=1.0).contains(&self.threshold_ratio) {
            return Err(HdevError::config(format!(
                "compaction threshold ratio must be within 0.0..=1.0, got {}",
                self.threshold_ratio
            )));
        }
        Ok(())
    }
}

/// Session storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding session history
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_history_dir(),
        }
    }
}

impl StorageConfig {
    /// Open a session store at the configured root
    pub fn open_store(&self) -> LocalSessionStore {
        LocalSessionStore::new(self.root.clone())
    }
}

/// `~/.hdev/history`, or a relative `.hdev/history` without a home directory
pub fn default_history_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".hdev")
        .join("history")
}
