//! API endpoint configuration
//!
//! The base URL is layered from defaults, an optional settings file and the
//! `PANADERIA_*` environment, and is always normalised to end with `/` so
//! relative request paths can be appended verbatim.

use crate::error::{CoreError, CoreResult};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base URL used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api/";

/// Prefix for environment overrides (`PANADERIA_API_BASE`)
pub const ENV_PREFIX: &str = "PANADERIA";

/// Resolved API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, always ending in `/`
    pub api_base: String,
}

#[derive(Debug, Deserialize)]
struct RawApiConfig {
    api_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ApiConfig {
    /// Build a configuration from an explicit base URL
    pub fn new(api_base: impl AsRef<str>) -> CoreResult<Self> {
        let api_base = normalize_base_url(api_base.as_ref());
        validators::validate_url(&api_base, "api_base")?;
        Ok(Self { api_base })
    }

    /// Load from the environment only
    pub fn from_env() -> CoreResult<Self> {
        Self::load(None)
    }

    /// Load from an optional settings file, then the environment
    pub fn load(file: Option<&Path>) -> CoreResult<Self> {
        let mut builder = Config::builder().set_default("api_base", DEFAULT_API_BASE)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let raw: RawApiConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        Self::new(raw.api_base)
    }

    /// Base URL, ending in `/`
    pub fn base_url(&self) -> &str {
        &self.api_base
    }

    /// Join a relative path onto the base URL, dropping leading slashes
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path.trim_start_matches('/'))
    }
}

/// Ensure a base URL ends with exactly the slash it needs
///
/// Blank input falls back to [`DEFAULT_API_BASE`].
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_API_BASE.to_string();
    }
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

/// Validation helpers for configuration values
pub mod validators {
    use crate::error::{CoreError, CoreResult};

    /// Validate URL format
    pub fn validate_url(url: &str, field: &str) -> CoreResult<()> {
        url::Url::parse(url)
            .map_err(|e| CoreError::invalid_config(format!("{field}: invalid URL - {e}")))?;
        Ok(())
    }
}

impl TryFrom<&str> for ApiConfig {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
