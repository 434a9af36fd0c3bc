//! Frontend configuration

use panaderia_core::{ApiConfig, DEFAULT_API_BASE};

/// Build-time configuration of the browser bundle
pub struct FrontendConfig;

impl FrontendConfig {
    /// Base URL baked in at compile time through `PANADERIA_API_BASE`
    pub const API_BASE: &'static str = match option_env!("PANADERIA_API_BASE") {
        Some(base) => base,
        None => DEFAULT_API_BASE,
    };

    /// Resolved API configuration, falling back to the default on a bad URL
    pub fn api_config() -> ApiConfig {
        ApiConfig::new(Self::API_BASE).unwrap_or_else(|e| {
            tracing::warn!(error = %e, base = Self::API_BASE, "Invalid API base, using default");
            ApiConfig::default()
        })
    }
}
