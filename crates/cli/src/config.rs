//! CLI settings
//!
//! Layered from built-in defaults, `config.toml` in the data directory and
//! `PANADERIA_*` environment variables, in that order.

use anyhow::{Context as _, Result};
use config::{Config, Environment, File};
use panaderia_core::config::ENV_PREFIX;
use panaderia_core::{ApiConfig, DEFAULT_API_BASE};
use panaderia_http::search::{RATE_LIMIT_RETRY_DELAY, SearchPolicy, SEARCH_DEBOUNCE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the REST API
    pub api_base: String,
    /// Default for `login --remember`
    pub remember: bool,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub debounce_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            remember: false,
            search: SearchSettings::default(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: millis(SEARCH_DEBOUNCE),
            retry_delay_ms: millis(RATE_LIMIT_RETRY_DELAY),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    /// Load settings, tolerating a missing file
    pub fn load(path: &Path) -> Result<Self> {
        let defaults = Self::default();
        let settings: Self = Config::builder()
            .set_default("api_base", defaults.api_base)?
            .set_default("remember", defaults.remember)?
            .set_default("search.debounce_ms", defaults.search.debounce_ms)?
            .set_default("search.retry_delay_ms", defaults.search.retry_delay_ms)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read settings from {}", path.display()))?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }

    /// Validated API configuration
    pub fn api_config(&self) -> Result<ApiConfig> {
        Ok(ApiConfig::new(&self.api_base)?)
    }

    pub fn search_policy(&self) -> SearchPolicy {
        SearchPolicy {
            debounce: Duration::from_millis(self.search.debounce_ms),
            retry_delay: Duration::from_millis(self.search.retry_delay_ms),
        }
    }

    /// Write these settings as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings.search, SearchSettings::default());
        assert_eq!(settings.search_policy(), SearchPolicy::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let settings = Settings {
            api_base: "https://panaderia.example.com/api".to_string(),
            remember: true,
            search: SearchSettings {
                debounce_ms: 150,
                retry_delay_ms: 1000,
            },
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert!(loaded.remember);
        assert_eq!(loaded.search.debounce_ms, 150);
        assert_eq!(
            loaded.api_config().unwrap().base_url(),
            "https://panaderia.example.com/api/"
        );
    }
}
