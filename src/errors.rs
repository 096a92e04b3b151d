use thiserror::Error;

use crate::core::context::Interrupted;

/// Boxed root cause carried by provider errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while assembling a backend configuration.
///
/// Every variant is a flavour of "invalid configuration"; no provider is ever
/// constructed from a builder that returned one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("System prompt must not exceed {max} bytes, got {len}")]
    PromptTooLong { len: usize, max: usize },

    #[error("Context size {value} is out of range [{min}, {max}]")]
    OutOfRange { value: u32, min: u32, max: u32 },
}

/// Errors surfaced by a [`Provider`](crate::ai::Provider).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Generation backend is unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Generation request failed: {message}")]
    GenerationFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl ProviderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn unavailable_from<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Unavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn generation_failed_from<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::GenerationFailed {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    #[must_use]
    pub const fn is_generation_failed(&self) -> bool {
        matches!(self, Self::GenerationFailed { .. })
    }

    /// Returns `true` when the error was caused by the caller's context being
    /// cancelled or running past its deadline.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        let source = match self {
            Self::Unavailable { source, .. } | Self::GenerationFailed { source, .. } => source,
        };
        source
            .as_ref()
            .is_some_and(|err| err.downcast_ref::<Interrupted>().is_some())
    }
}

/// Errors returned by [`SummaryService`](crate::summarize::SummaryService).
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("No messages to summarize")]
    NoMessages,

    #[error("Failed to generate summary: {0}")]
    SummarizationFailed(#[from] ProviderError),
}

/// Errors from resolving a speaker through a [`UserProvider`](crate::summarize::UserProvider).
///
/// The summary service recovers from these locally and never propagates them.
#[derive(Debug, Error)]
pub enum UserLookupError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Failed to look up user: {0}")]
    Backend(String),
}
