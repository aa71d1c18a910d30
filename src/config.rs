//! Runtime configuration
//!
//! Defaults merged with an optional `config.toml` in the data directory.

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::util::paths::config_path;

/// How long a record stays readable after the flow started.
const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Delay between completion and deferred deletion.
const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(60 * 60);

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Records older than this are treated as absent and erased on read
    pub record_ttl: Duration,
    /// How long after completion a record is kept before deletion
    pub cleanup_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            record_ttl: DEFAULT_RECORD_TTL,
            cleanup_delay: DEFAULT_CLEANUP_DELAY,
        }
    }
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub record_ttl_days: Option<u64>,
    pub cleanup_delay_secs: Option<u64>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        if config_file.exists() {
            if let Ok(contents) = fs::read_to_string(&config_file) {
                if let Ok(toml_config) = toml::from_str::<TomlConfig>(&contents) {
                    return Self::merged(toml_config);
                }
            }
        }

        Config::default()
    }

    /// Overlay file values on top of the defaults
    fn merged(toml_config: TomlConfig) -> Self {
        let mut config = Config::default();

        if let Some(days) = toml_config.record_ttl_days {
            config.record_ttl = Duration::from_secs(days * 24 * 60 * 60);
        }
        if let Some(secs) = toml_config.cleanup_delay_secs {
            config.cleanup_delay = Duration::from_secs(secs);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.record_ttl, Duration::from_secs(30 * 24 * 60 * 60));
        assert_eq!(config.cleanup_delay, Duration::from_secs(60 * 60));
    }

    #[test]
    fn test_merged_overrides() {
        let toml_config: TomlConfig =
            toml::from_str("record_ttl_days = 7\ncleanup_delay_secs = 120").unwrap();
        let config = Config::merged(toml_config);

        assert_eq!(config.record_ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.cleanup_delay, Duration::from_secs(120));
    }

    #[test]
    fn test_merged_keeps_defaults_for_missing_keys() {
        let toml_config: TomlConfig = toml::from_str("cleanup_delay_secs = 120").unwrap();
        let config = Config::merged(toml_config);

        assert_eq!(config.record_ttl, Duration::from_secs(30 * 24 * 60 * 60));
        assert_eq!(config.cleanup_delay, Duration::from_secs(120));
    }
}
