//! Configuration management for hdev
//!
//! Settings come from defaults, an optional TOML file, `HDEV_*` environment
//! variables and explicit overrides, applied in that order by
//! [`ConfigLoader`].

pub mod env_loader;
pub mod loader;
pub mod logging_config;
pub mod model;

pub use loader::{
    CompactionOverlay, ConfigLoader, ConfigOverlay, ConfigSource, LoggingOverlay, StorageOverlay,
};
pub use logging_config::{LogFormat, LoggingConfig};
pub use model::{
    CompactionConfig, DEFAULT_THRESHOLD_RATIO, HdevConfig, StorageConfig, default_history_dir,
};
