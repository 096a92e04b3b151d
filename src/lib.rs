/// recap - turns chat transcripts into markdown summaries using a text-generation backend.
///
/// The crate is organised around three pieces:
/// 1. [`ai::ConfigBuilder`] validates backend settings into an immutable [`ai::ProviderConfig`]
/// 2. [`ai::Provider`] is the generation capability; [`ai::HttpGenerationProvider`] implements it
///    over an Ollama-compatible HTTP API
/// 3. [`summarize::SummaryService`] filters a transcript, labels speakers and asks the provider
///    for a four-section summary
///
/// Every backend call is bound to a caller-supplied [`core::RequestContext`] that carries a
/// cancellation token and an optional deadline. Nothing is retried internally.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use recap::ai::{HttpGenerationProvider, ProviderConfig};
/// use recap::core::{Message, RequestContext, User};
/// use recap::summarize::{StaticUserDirectory, SummaryService};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     recap::setup_logging();
///
///     let provider = HttpGenerationProvider::from_builder(
///         ProviderConfig::builder()
///             .with_host("http://localhost:11434")
///             .with_model("gemma3:12b"),
///     )?;
///
///     let users = StaticUserDirectory::new()
///         .with_user("U1", User::new("Ada", "Lovelace"))
///         .with_user("U2", User::new("Alan", "Turing"));
///
///     let service = SummaryService::new(Arc::new(provider), Arc::new(users));
///     let ctx = RequestContext::with_timeout(Duration::from_secs(30));
///
///     let summary = service
///         .generate_summary(
///             &ctx,
///             &[
///                 Message::new("U1", "Shall we ship on Friday?"),
///                 Message::new("U2", "Yes, I'll prepare the release notes."),
///             ],
///         )
///         .await?;
///     println!("{summary}");
///
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod core;
pub mod errors;
pub mod prompt;
pub mod summarize;
pub mod utils;

/// Configure structured logging with JSON output.
///
/// The filter is read from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first call installs a subscriber.
///
/// # Example
///
/// ```
/// recap::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
