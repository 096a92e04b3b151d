//! HTTP generation backend client
//!
//! Talks to an Ollama-compatible server: `POST /api/generate` for completions
//! (consumed as a newline-delimited JSON stream) and `GET /api/tags` for
//! health checks.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ndjson::{FragmentParser, StreamEvent};
use super::options::{ConfigBuilder, ProviderConfig};
use super::provider::Provider;
use crate::core::context::RequestContext;
use crate::errors::{ConfigError, ProviderError};

const GENERATE_PATH: &str = "api/generate";
const TAGS_PATH: &str = "api/tags";
const KEEP_ALIVE: Duration = Duration::from_secs(60 * 60);

/// Body of one `POST /api/generate`. Lives only for the duration of a call.
#[derive(Debug, Serialize)]
struct GenerationCall<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    keep_alive: String,
    raw: bool,
    think: bool,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerationOptions {
    num_ctx: u32,
}

impl<'a> GenerationCall<'a> {
    fn new(config: &'a ProviderConfig, prompt: &'a str) -> Self {
        let system = Some(config.system_prompt()).filter(|s| !s.is_empty());
        Self {
            model: config.model(),
            prompt,
            system,
            stream: true,
            keep_alive: format!("{}s", KEEP_ALIVE.as_secs()),
            raw: false,
            think: false,
            options: GenerationOptions {
                num_ctx: config.context_size(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Pulls the `error` field out of a JSON error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// [`Provider`] backed by an HTTP text-generation service.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpGenerationProvider {
    config: ProviderConfig,
    http: Client,
}

impl HttpGenerationProvider {
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the HTTP client cannot be initialised.
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .build()
            .map_err(|e| ConfigError::Invalid(format!("Failed to build HTTP client: {e}")))?;

        info!(
            base_url = %config.base_url(),
            model = %config.model(),
            context_size = config.context_size(),
            "Generation provider initialized"
        );

        Ok(Self { config, http })
    }

    /// Builds the config and the provider in one step.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error encountered.
    pub fn from_builder(builder: ConfigBuilder) -> Result<Self, ConfigError> {
        Self::new(builder.build()?)
    }

    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Names of the models the backend has available.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] on transport failures, non-2xx
    /// statuses, malformed bodies, cancellation or deadline expiry.
    pub async fn list_models(&self, ctx: &RequestContext) -> Result<Vec<String>, ProviderError> {
        match ctx.run(self.fetch_tags()).await {
            Ok(result) => result,
            Err(interrupted) => Err(ProviderError::unavailable_from(
                "model listing interrupted",
                interrupted,
            )),
        }
    }

    async fn fetch_tags(&self) -> Result<Vec<String>, ProviderError> {
        let url = self.config.endpoint(TAGS_PATH);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProviderError::unavailable_from(format!("request to {url} failed"), e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(ProviderError::unavailable(format!(
                "backend returned status {status}: {}",
                extract_error_message(&error_text)
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::unavailable_from("malformed model list", e))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn execute(&self, call: &GenerationCall<'_>) -> Result<String, ProviderError> {
        let url = self.config.endpoint(GENERATE_PATH);
        let response = self
            .http
            .post(url)
            .json(call)
            .send()
            .await
            .map_err(|e| ProviderError::generation_failed_from("generation request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(ProviderError::generation_failed(format!(
                "backend returned status {status}: {}",
                extract_error_message(&error_text)
            )));
        }

        FragmentStream::new(Box::pin(response.bytes_stream()))
            .collect_text()
            .await
    }
}

#[async_trait]
impl Provider for HttpGenerationProvider {
    async fn generate(&self, ctx: &RequestContext, prompt: &str) -> Result<String, ProviderError> {
        #[cfg(feature = "debug-logs")]
        info!("Using generation prompt:\n{}", prompt);

        #[cfg(not(feature = "debug-logs"))]
        info!(
            model = %self.config.model(),
            prompt_chars = prompt.chars().count(),
            "Sending generation request"
        );

        let call = GenerationCall::new(&self.config, prompt);
        match ctx.run(self.execute(&call)).await {
            Ok(Ok(text)) => {
                debug!(response_chars = text.chars().count(), "Generation completed");
                Ok(text)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Generation failed");
                Err(e)
            }
            Err(interrupted) => {
                warn!(reason = %interrupted, "Generation interrupted, discarding partial output");
                Err(ProviderError::generation_failed_from(
                    "generation interrupted",
                    interrupted,
                ))
            }
        }
    }

    async fn health_check(&self, ctx: &RequestContext) -> Result<(), ProviderError> {
        match self.list_models(ctx).await {
            Ok(models) => {
                debug!(models = models.len(), "Generation backend is healthy");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, base_url = %self.config.base_url(), "Health check failed");
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

type ByteStream = Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

/// Aggregates a generation byte stream into text, fragment by fragment.
struct FragmentStream {
    byte_stream: ByteStream,
    parser: FragmentParser,
    pending: VecDeque<StreamEvent>,
    utf8_buffer: Vec<u8>,
    saw_any_text: bool,
    stream_ended: bool,
    completed: bool,
}

impl std::fmt::Debug for FragmentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentStream")
            .field("completed", &self.completed)
            .field("stream_ended", &self.stream_ended)
            .field("saw_any_text", &self.saw_any_text)
            .field("pending_len", &self.pending.len())
            .field("utf8_buffer_len", &self.utf8_buffer.len())
            .field("parser_buffer_len", &self.parser.remaining_buffer().len())
            .finish_non_exhaustive()
    }
}

impl FragmentStream {
    fn new(byte_stream: ByteStream) -> Self {
        Self {
            byte_stream,
            parser: FragmentParser::new(),
            pending: VecDeque::new(),
            utf8_buffer: Vec::new(),
            saw_any_text: false,
            stream_ended: false,
            completed: false,
        }
    }

    fn drain_pending(&mut self) -> Option<StreamEvent> {
        let event = self.pending.pop_front()?;
        match event {
            StreamEvent::Completed | StreamEvent::Error(_) => self.completed = true,
            StreamEvent::Fragment(_) => self.saw_any_text = true,
        }
        Some(event)
    }

    /// Feeds the valid UTF-8 prefix of the buffered bytes into the parser, keeping an
    /// incomplete trailing code point for the next chunk.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), ProviderError> {
        self.utf8_buffer.extend_from_slice(bytes);

        match std::str::from_utf8(&self.utf8_buffer) {
            Ok(valid) => {
                self.pending.extend(self.parser.feed(valid));
                self.utf8_buffer.clear();
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                if valid_up_to > 0 {
                    let prefix = std::str::from_utf8(&self.utf8_buffer[..valid_up_to])
                        .map_err(|e| {
                            ProviderError::generation_failed_from(
                                "invalid UTF-8 in generation stream",
                                e,
                            )
                        })?;
                    self.pending.extend(self.parser.feed(prefix));
                    self.utf8_buffer.drain(..valid_up_to);
                }

                if e.error_len().is_some() {
                    self.completed = true;
                    return Err(ProviderError::generation_failed(
                        "invalid UTF-8 in generation stream",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns the next stream event, or `None` once the stream is complete.
    async fn next_event(&mut self) -> Result<Option<StreamEvent>, ProviderError> {
        loop {
            if let Some(event) = self.drain_pending() {
                return Ok(Some(event));
            }
            if self.completed {
                return Ok(None);
            }
            if self.stream_ended {
                self.completed = true;
                // Text received so far is discarded; only a `done` marker completes a call.
                let message = if self.saw_any_text {
                    "generation stream ended before the done marker"
                } else {
                    "generation stream ended before any text was produced"
                };
                warn!(saw_any_text = self.saw_any_text, "{}", message);
                return Err(ProviderError::generation_failed(message));
            }

            match self.byte_stream.next().await {
                Some(Ok(bytes)) => self.push_bytes(&bytes)?,
                Some(Err(e)) => {
                    self.completed = true;
                    return Err(ProviderError::generation_failed_from(
                        "error reading generation stream",
                        e,
                    ));
                }
                None => {
                    self.stream_ended = true;
                    if !self.utf8_buffer.is_empty() {
                        self.completed = true;
                        return Err(ProviderError::generation_failed(
                            "generation stream ended inside a UTF-8 sequence",
                        ));
                    }
                    self.pending.extend(self.parser.finish());
                }
            }
        }
    }

    /// Concatenates every fragment in arrival order. Nothing is returned unless the
    /// stream completes cleanly.
    async fn collect_text(&mut self) -> Result<String, ProviderError> {
        let mut collected = String::new();

        while let Some(event) = self.next_event().await? {
            match event {
                StreamEvent::Fragment(text) => collected.push_str(&text),
                StreamEvent::Completed => break,
                StreamEvent::Error(msg) => {
                    return Err(ProviderError::generation_failed(format!(
                        "backend reported an error: {msg}"
                    )));
                }
            }
        }

        Ok(collected)
    }
}
