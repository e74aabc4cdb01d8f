//! Environment variable-based configuration loading

use super::loader::ConfigOverlay;
use crate::error::{HdevError, HdevResult};
use std::path::PathBuf;

pub const DISABLE_COMPACTION_ENV: &str = "HDEV_DISABLE_COMPACTION";
pub const COMPACTION_THRESHOLD_ENV: &str = "HDEV_COMPACTION_THRESHOLD";
pub const HISTORY_DIR_ENV: &str = "HDEV_HISTORY_DIR";
pub const LOG_LEVEL_ENV: &str = "HDEV_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "HDEV_LOG_FORMAT";

/// Load overrides from the process environment
pub fn load_from_env() -> HdevResult<ConfigOverlay> {
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Load overrides through an arbitrary variable lookup
pub fn load_from_lookup<F>(lookup: F) -> HdevResult<ConfigOverlay>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overlay = ConfigOverlay::default();

    if let Some(value) = lookup(DISABLE_COMPACTION_ENV) {
        let disabled = parse_flag(&value).ok_or_else(|| {
            HdevError::config(format!("Invalid {} value: {}", DISABLE_COMPACTION_ENV, value))
        })?;
        overlay.compaction.enabled = Some(!disabled);
    }

    if let Some(value) = lookup(COMPACTION_THRESHOLD_ENV) {
        let ratio: f64 = value.trim().parse().map_err(|_| {
            HdevError::config(format!("Invalid {} value: {}", COMPACTION_THRESHOLD_ENV, value))
        })?;
        overlay.compaction.threshold_ratio = Some(ratio);
    }

    if let Some(dir) = lookup(HISTORY_DIR_ENV) {
        overlay.storage.root = Some(PathBuf::from(dir));
    }

    if let Some(level) = lookup(LOG_LEVEL_ENV) {
        overlay.logging.level = Some(level);
    }

    if let Some(format) = lookup(LOG_FORMAT_ENV) {
        overlay.logging.format = Some(format.parse().map_err(HdevError::config)?);
    }

    Ok(overlay)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment() {
        let overlay = load_from_lookup(|_| None).unwrap();
        assert_eq!(overlay, ConfigOverlay::default());
    }

    #[test]
    fn test_all_variables() {
        let overlay = load_from_lookup(lookup_from(&[
            (DISABLE_COMPACTION_ENV, "yes"),
            (COMPACTION_THRESHOLD_ENV, "0.7"),
            (HISTORY_DIR_ENV, "/var/lib/hdev"),
            (LOG_LEVEL_ENV, "debug"),
            (LOG_FORMAT_ENV, "json"),
        ]))
        .unwrap();

        assert_eq!(overlay.compaction.enabled, Some(false));
        assert_eq!(overlay.compaction.threshold_ratio, Some(0.7));
        assert_eq!(overlay.storage.root, Some(PathBuf::from("/var/lib/hdev")));
        assert_eq!(overlay.logging.level.as_deref(), Some("debug"));
        assert_eq!(overlay.logging.format, Some(LogFormat::Json));
    }

    #[test]
    fn test_invalid_values() {
        assert!(load_from_lookup(lookup_from(&[(DISABLE_COMPACTION_ENV, "maybe")])).is_err());
        assert!(load_from_lookup(lookup_from(&[(COMPACTION_THRESHOLD_ENV, "high")])).is_err());
    }
}
