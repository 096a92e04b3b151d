//! Validated configuration for the generation backend.
//!
//! Options are recorded in call order and applied at [`ConfigBuilder::build`]:
//! the first failing option aborts the build, unset fields are then defaulted,
//! and the finished config is validated once more as a whole.

use std::collections::BTreeSet;

use url::Url;

use crate::errors::ConfigError;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:12b";
pub const DEFAULT_CONTEXT_SIZE: u32 = 64_000;
pub const SYSTEM_PROMPT_MAX_LENGTH: usize = 3200;
pub const MIN_CONTEXT_SIZE: u32 = 1024;
pub const MAX_CONTEXT_SIZE: u32 = 128_000;

/// Model identifiers a builder is willing to address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAllowList {
    models: BTreeSet<String>,
}

impl ModelAllowList {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, model: &str) -> bool {
        self.models.contains(model)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

impl Default for ModelAllowList {
    fn default() -> Self {
        Self::new([DEFAULT_MODEL])
    }
}

/// Immutable backend configuration. Only a [`ConfigBuilder`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    base_url: Url,
    model: String,
    system_prompt: String,
    context_size: u32,
}

impl ProviderConfig {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[must_use]
    pub const fn context_size(&self) -> u32 {
        self.context_size
    }

    /// Resolves `path` (e.g. `api/tags`) below the base URL, keeping any path prefix
    /// the base URL already carries.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }
}

/// A single configuration transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOption {
    Host(String),
    Model(String),
    SystemPrompt(String),
    ContextSize(u32),
}

#[derive(Debug, Default)]
struct DraftConfig {
    base_url: Option<Url>,
    model: Option<String>,
    system_prompt: Option<String>,
    context_size: Option<u32>,
}

impl ConfigOption {
    fn apply(self, draft: &mut DraftConfig, models: &ModelAllowList) -> Result<(), ConfigError> {
        match self {
            Self::Host(host) => draft.base_url = Some(parse_host(&host)?),
            Self::Model(model) => {
                check_model(&model, models)?;
                draft.model = Some(model);
            }
            Self::SystemPrompt(prompt) => {
                check_system_prompt(&prompt)?;
                draft.system_prompt = Some(prompt);
            }
            Self::ContextSize(size) => {
                check_context_size(size)?;
                draft.context_size = Some(size);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    allowed_models: ModelAllowList,
    options: Vec<ConfigOption>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default allow-list. Applies to options and defaults alike.
    #[must_use]
    pub fn with_allowed_models(mut self, models: ModelAllowList) -> Self {
        self.allowed_models = models;
        self
    }

    #[must_use]
    pub fn with_host(self, host: impl Into<String>) -> Self {
        self.option(ConfigOption::Host(host.into()))
    }

    #[must_use]
    pub fn with_model(self, model: impl Into<String>) -> Self {
        self.option(ConfigOption::Model(model.into()))
    }

    #[must_use]
    pub fn with_system_prompt(self, prompt: impl Into<String>) -> Self {
        self.option(ConfigOption::SystemPrompt(prompt.into()))
    }

    #[must_use]
    pub fn with_context_size(self, size: u32) -> Self {
        self.option(ConfigOption::ContextSize(size))
    }

    #[must_use]
    pub fn option(mut self, option: ConfigOption) -> Self {
        self.options.push(option);
        self
    }

    #[must_use]
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        self.options.extend(options);
        self
    }

    /// # Errors
    ///
    /// Returns the error of the first option that fails, or of the final
    /// validation of the defaulted config.
    pub fn build(self) -> Result<ProviderConfig, ConfigError> {
        let mut draft = DraftConfig::default();
        for option in self.options {
            option.apply(&mut draft, &self.allowed_models)?;
        }

        let base_url = match draft.base_url {
            Some(url) => url,
            None => parse_host(DEFAULT_HOST)?,
        };

        let config = ProviderConfig {
            base_url,
            model: draft.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: draft.system_prompt.unwrap_or_default(),
            context_size: draft.context_size.unwrap_or(DEFAULT_CONTEXT_SIZE),
        };

        validate(&config, &self.allowed_models)?;
        Ok(config)
    }
}

fn validate(config: &ProviderConfig, models: &ModelAllowList) -> Result<(), ConfigError> {
    check_url(&config.base_url)?;
    check_model(&config.model, models)?;
    check_system_prompt(&config.system_prompt)?;
    check_context_size(config.context_size)
}

fn parse_host(host: &str) -> Result<Url, ConfigError> {
    if host.trim().is_empty() {
        return Err(ConfigError::Invalid("host cannot be empty".to_string()));
    }

    let url = Url::parse(host.trim())
        .map_err(|e| ConfigError::Invalid(format!("invalid base URL '{host}': {e}")))?;
    check_url(&url)?;
    Ok(url)
}

fn check_url(url: &Url) -> Result<(), ConfigError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid(format!(
            "invalid URL scheme '{}': must be http or https",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid(
            "invalid URL: host cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn check_model(model: &str, models: &ModelAllowList) -> Result<(), ConfigError> {
    if models.contains(model) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedModel(model.to_string()))
    }
}

fn check_system_prompt(prompt: &str) -> Result<(), ConfigError> {
    // Measured in UTF-8 bytes.
    let len = prompt.len();
    if len > SYSTEM_PROMPT_MAX_LENGTH {
        return Err(ConfigError::PromptTooLong {
            len,
            max: SYSTEM_PROMPT_MAX_LENGTH,
        });
    }
    Ok(())
}

fn check_context_size(size: u32) -> Result<(), ConfigError> {
    if !(MIN_CONTEXT_SIZE..=MAX_CONTEXT_SIZE).contains(&size) {
        return Err(ConfigError::OutOfRange {
            value: size,
            min: MIN_CONTEXT_SIZE,
            max: MAX_CONTEXT_SIZE,
        });
    }
    Ok(())
}
