use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::users::UserProvider;
use crate::ai::Provider;
use crate::core::config::SummaryLanguage;
use crate::core::context::RequestContext;
use crate::core::models::Message;
use crate::errors::SummaryError;
use crate::prompt::{UNKNOWN_SPEAKER, build_summary_prompt, render_line};
use crate::utils::filters::retain_visible_messages;

/// Turns chat transcripts into summaries through a shared [`Provider`].
///
/// The service keeps no per-call state, so one instance can serve concurrent
/// calls.
#[derive(Clone)]
pub struct SummaryService {
    provider: Arc<dyn Provider>,
    users: Arc<dyn UserProvider>,
    language: SummaryLanguage,
}

impl SummaryService {
    pub fn new(provider: Arc<dyn Provider>, users: Arc<dyn UserProvider>) -> Self {
        Self {
            provider,
            users,
            language: SummaryLanguage::Auto,
        }
    }

    #[must_use]
    pub const fn with_language(mut self, language: SummaryLanguage) -> Self {
        self.language = language;
        self
    }

    /// Summarizes `messages` in their given order.
    ///
    /// Speaker lookups that fail are replaced by a placeholder label and never
    /// abort the call. The transcript is not truncated here.
    ///
    /// # Errors
    ///
    /// - [`SummaryError::NoMessages`] if nothing is left after filtering; the
    ///   provider is not called.
    /// - [`SummaryError::SummarizationFailed`] wrapping the provider error.
    pub async fn generate_summary(
        &self,
        ctx: &RequestContext,
        messages: &[Message],
    ) -> Result<String, SummaryError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "generate_summary",
            %request_id,
            provider = self.provider.name()
        );
        self.summarize(ctx, messages).instrument(span).await
    }

    async fn summarize(
        &self,
        ctx: &RequestContext,
        messages: &[Message],
    ) -> Result<String, SummaryError> {
        let visible = retain_visible_messages(messages);
        if visible.is_empty() {
            info!(
                total = messages.len(),
                "No messages left to summarize after filtering"
            );
            return Err(SummaryError::NoMessages);
        }

        let labels = self.resolve_speakers(&visible).await;

        let transcript = visible
            .iter()
            .map(|msg| {
                let speaker = labels
                    .get(msg.speaker.as_str())
                    .map_or(UNKNOWN_SPEAKER, String::as_str);
                render_line(speaker, &msg.body)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = build_summary_prompt(&transcript, self.language);

        info!(
            messages = visible.len(),
            dropped = messages.len() - visible.len(),
            speakers = labels.len(),
            prompt_chars = prompt.chars().count(),
            "Requesting summary"
        );

        let summary = self.provider.generate(ctx, &prompt).await.map_err(|e| {
            error!(error = %e, "Failed to generate summary");
            SummaryError::SummarizationFailed(e)
        })?;

        info!(summary_chars = summary.chars().count(), "Summary generated");
        Ok(summary)
    }

    /// Looks every distinct speaker up once, concurrently.
    async fn resolve_speakers<'a>(&self, messages: &[&'a Message]) -> HashMap<&'a str, String> {
        let user_ids: HashSet<&'a str> = messages.iter().map(|m| m.speaker.as_str()).collect();

        let users = &self.users;
        let lookups = user_ids
            .into_iter()
            .map(|id| async move { (id, users.get(id).await) });

        let mut labels = HashMap::new();
        for (id, result) in join_all(lookups).await {
            let label = match result {
                Ok(user) => {
                    let label = user.label();
                    if label.is_empty() {
                        warn!(user_id = %id, "User has no display name, using placeholder");
                        UNKNOWN_SPEAKER.to_string()
                    } else {
                        label
                    }
                }
                Err(e) => {
                    warn!(user_id = %id, error = %e, "Failed to resolve speaker, using placeholder");
                    UNKNOWN_SPEAKER.to_string()
                }
            };
            labels.insert(id, label);
        }

        labels
    }
}
