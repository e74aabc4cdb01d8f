//! Configuration loading and management

use super::env_loader;
use super::logging_config::LogFormat;
use super::model::HdevConfig;
use crate::error::{HdevError, HdevResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of configuration data
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// TOML configuration file; a missing file is skipped
    File(PathBuf),
    /// `HDEV_*` environment variables
    Environment,
    /// Explicit overrides from the caller (command line)
    Overrides(ConfigOverlay),
}

/// Partial configuration; `None` leaves the current value untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub compaction: CompactionOverlay,
    pub storage: StorageOverlay,
    pub logging: LoggingOverlay,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompactionOverlay {
    pub enabled: Option<bool>,
    pub threshold_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageOverlay {
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingOverlay {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl HdevConfig {
    /// Apply the values set in `overlay`
    pub fn merge(&mut self, overlay: ConfigOverlay) {
        if let Some(enabled) = overlay.compaction.enabled {
            self.compaction.enabled = enabled;
        }
        if let Some(ratio) = overlay.compaction.threshold_ratio {
            self.compaction.threshold_ratio = ratio;
        }
        if let Some(root) = overlay.storage.root {
            self.storage.root = root;
        }
        if let Some(level) = overlay.logging.level.filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }
        if let Some(format) = overlay.logging.format {
            self.logging.format = format;
        }
    }
}

/// Configuration loader with support for multiple sources
///
/// Sources are applied in insertion order on top of the defaults, so later
/// sources win.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a file source
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    /// Add environment variables source
    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    /// Add explicit overrides
    pub fn with_overrides(self, overlay: ConfigOverlay) -> Self {
        self.add_source(ConfigSource::Overrides(overlay))
    }

    /// Load configuration from all sources
    pub fn load(self) -> HdevResult<HdevConfig> {
        let mut config = HdevConfig::default();

        for source in self.sources {
            if let Some(overlay) = Self::load_from_source(&source)? {
                config.merge(overlay);
            }
        }

        config.validate()?;
        tracing::debug!(
            enabled = config.compaction.enabled,
            threshold_ratio = config.compaction.threshold_ratio,
            root = %config.storage.root.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn load_from_source(source: &ConfigSource) -> HdevResult<Option<ConfigOverlay>> {
        match source {
            ConfigSource::File(path) => load_from_file(path),
            ConfigSource::Environment => env_loader::load_from_env().map(Some),
            ConfigSource::Overrides(overlay) => Ok(Some(overlay.clone())),
        }
    }
}

/// Read a TOML overlay; `Ok(None)` when the file does not exist
pub fn load_from_file(path: &Path) -> HdevResult<Option<ConfigOverlay>> {
    if !path.exists() {
        tracing::debug!("Config file {:?} not found, skipping", path);
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let overlay = toml::from_str(&content)
        .map_err(|e| HdevError::config(format!("Invalid config file {:?}: {}", path, e)))?;
    Ok(Some(overlay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_then_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[compaction]
threshold_ratio = 0.6

[storage]
root = "/srv/hdev"

[logging]
format = "compact"
"#,
        )
        .unwrap();

        let overrides = ConfigOverlay {
            compaction: CompactionOverlay {
                enabled: Some(false),
                threshold_ratio: None,
            },
            ..Default::default()
        };

        let config = ConfigLoader::new()
            .with_file(&path)
            .with_overrides(overrides)
            .load()
            .unwrap();

        assert!(!config.compaction.enabled);
        assert_eq!(config.compaction.threshold_ratio, 0.6);
        assert_eq!(config.storage.root, PathBuf::from("/srv/hdev"));
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let config = ConfigLoader::new()
            .with_file("/definitely/not/here/hdev.toml")
            .load()
            .unwrap();
        assert_eq!(config, HdevConfig::default());
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let overrides = ConfigOverlay {
            compaction: CompactionOverlay {
                enabled: None,
                threshold_ratio: Some(1.5),
            },
            ..Default::default()
        };
        let result = ConfigLoader::new().with_overrides(overrides).load();
        assert!(matches!(result, Err(HdevError::Config(_))));
    }

    #[test]
    fn test_malformed_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[compaction\nenabled = ").unwrap();
        assert!(matches!(load_from_file(&path), Err(HdevError::Config(_))));
    }
}
