use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_LLM_PROVIDER: &str = "ollama";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";
pub const DEFAULT_BACKEND_MODEL: &str = "gemma3:12b";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise summaries of chat conversations. Focus on key points, decisions, and action items.";

/// Language the summary should be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryLanguage {
    /// Follow the language of the conversation.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ru")]
    Russian,
}

impl FromStr for SummaryLanguage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "en" | "english" => Ok(Self::English),
            "ru" | "russian" => Ok(Self::Russian),
            other => Err(ConfigError::Invalid(format!(
                "unsupported summary language: {other}"
            ))),
        }
    }
}

/// Settings consumed by the summarizer, as exposed by the hosting application.
///
/// Missing fields take their defaults; [`AppConfig::validate`] must pass before
/// the values are used to build a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm_provider: String,
    pub backend_url: String,
    pub backend_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub summary_language: SummaryLanguage,
    pub max_messages: usize,
    pub system_prompt: String,
    /// Seconds.
    pub request_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm_provider: DEFAULT_LLM_PROVIDER.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_model: DEFAULT_BACKEND_MODEL.to_string(),
            max_tokens: 1000,
            temperature: 0.3,
            summary_language: SummaryLanguage::Auto,
            max_messages: 50,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            request_timeout: 30,
        }
    }
}

impl AppConfig {
    /// Reads `RECAP_*` environment variables; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric or enum variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric or enum variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("RECAP_LLM_PROVIDER") {
            config.llm_provider = v;
        }
        if let Some(v) = lookup("RECAP_BACKEND_URL") {
            config.backend_url = v;
        }
        if let Some(v) = lookup("RECAP_BACKEND_MODEL") {
            config.backend_model = v;
        }
        if let Some(v) = lookup("RECAP_MAX_TOKENS") {
            config.max_tokens = parse_var("RECAP_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("RECAP_TEMPERATURE") {
            config.temperature = parse_var("RECAP_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("RECAP_SUMMARY_LANGUAGE") {
            config.summary_language = v.parse()?;
        }
        if let Some(v) = lookup("RECAP_MAX_MESSAGES") {
            config.max_messages = parse_var("RECAP_MAX_MESSAGES", &v)?;
        }
        if let Some(v) = lookup("RECAP_SYSTEM_PROMPT") {
            config.system_prompt = v;
        }
        if let Some(v) = lookup("RECAP_REQUEST_TIMEOUT") {
            config.request_timeout = parse_var("RECAP_REQUEST_TIMEOUT", &v)?;
        }

        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.llm_provider.as_str() {
            "" => return Err(invalid("LLM provider must be specified")),
            DEFAULT_LLM_PROVIDER => {}
            other => return Err(invalid(format!("unsupported LLM provider: {other}"))),
        }

        if self.backend_url.trim().is_empty() {
            return Err(invalid("backend_url must be specified"));
        }
        if self.backend_model.trim().is_empty() {
            return Err(invalid("backend_model must be specified"));
        }
        if self.max_tokens == 0 {
            return Err(invalid("max_tokens must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(invalid("temperature must be between 0.0 and 1.0"));
        }
        if self.max_messages == 0 {
            return Err(invalid("max_messages must be greater than 0"));
        }
        if self.request_timeout == 0 {
            return Err(invalid("request_timeout must be greater than 0"));
        }

        Ok(())
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{key}: {e}")))
}
