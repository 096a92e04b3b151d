//! Generation backends: configuration, the provider capability and the HTTP client

pub mod client;
pub mod ndjson;
pub mod options;
pub mod provider;

// Re-export main types for convenience
pub use client::HttpGenerationProvider;
pub use options::{ConfigBuilder, ConfigOption, ModelAllowList, ProviderConfig};
pub use provider::Provider;

use crate::core::config::AppConfig;
use crate::errors::ConfigError;

/// Validates the application settings and builds the HTTP provider they describe.
///
/// # Errors
///
/// Returns the first validation or option error; no provider is built in that case.
pub fn build_provider(config: &AppConfig) -> Result<HttpGenerationProvider, ConfigError> {
    config.validate()?;

    let builder = ProviderConfig::builder()
        .with_host(config.backend_url.as_str())
        .with_model(config.backend_model.as_str())
        .with_system_prompt(config.system_prompt.as_str());

    HttpGenerationProvider::from_builder(builder)
}
