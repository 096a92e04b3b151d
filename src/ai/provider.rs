use async_trait::async_trait;

use crate::core::context::RequestContext;
use crate::errors::ProviderError;

/// A text-generation backend.
///
/// Implementations never retry. Callers that want retry/backoff (rate limits,
/// transient network failures) layer it on top of [`Provider::generate`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generates a completion for `prompt`, returning the full text once the
    /// backend has finished. Streamed fragments are joined in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::GenerationFailed`] on any transport or protocol
    /// failure, including cancellation or expiry of `ctx`. No partial text is
    /// ever returned.
    async fn generate(&self, ctx: &RequestContext, prompt: &str) -> Result<String, ProviderError>;

    /// Performs one cheap, read-only call against the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] for every failure mode.
    async fn health_check(&self, ctx: &RequestContext) -> Result<(), ProviderError>;

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}
