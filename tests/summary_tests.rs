use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use recap::ai::Provider;
use recap::core::{Message, RequestContext, SummaryLanguage, User};
use recap::errors::{ProviderError, SummaryError, UserLookupError};
use recap::prompt::{SUMMARY_SECTIONS, UNKNOWN_SPEAKER};
use recap::summarize::{StaticUserDirectory, SummaryService, UserProvider};
use tokio::sync::Mutex;

/// Returns the prompt it was given and records every call.
#[derive(Default)]
struct EchoProvider {
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl EchoProvider {
    fn with_delay(delay: Duration) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    async fn calls(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

#[async_trait]
impl Provider for EchoProvider {
    async fn generate(&self, _ctx: &RequestContext, prompt: &str) -> Result<String, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.prompts.lock().await.push(prompt.to_string());
        Ok(prompt.to_string())
    }

    async fn health_check(&self, _ctx: &RequestContext) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    async fn generate(&self, _ctx: &RequestContext, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::generation_failed_from(
            "backend exploded",
            std::io::Error::other("socket closed"),
        ))
    }

    async fn health_check(&self, _ctx: &RequestContext) -> Result<(), ProviderError> {
        Err(ProviderError::unavailable("down"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Counts lookups per user id on top of a static directory.
struct CountingUsers {
    inner: StaticUserDirectory,
    lookups: std::sync::Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingUsers {
    fn new(inner: StaticUserDirectory) -> Self {
        Self {
            inner,
            lookups: std::sync::Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UserProvider for CountingUsers {
    async fn get(&self, user_id: &str) -> Result<User, UserLookupError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .lookups
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default() += 1;
        self.inner.get(user_id).await
    }
}

fn directory() -> StaticUserDirectory {
    StaticUserDirectory::new()
        .with_user("U1", User::new("A", ""))
        .with_user("U2", User::new("B", ""))
}

#[tokio::test]
async fn test_empty_transcript_is_rejected_without_calling_provider() {
    let provider = Arc::new(EchoProvider::default());
    let service = SummaryService::new(provider.clone(), Arc::new(directory()));

    let err = service
        .generate_summary(&RequestContext::new(), &[])
        .await
        .expect_err("empty transcript must fail");

    assert!(matches!(err, SummaryError::NoMessages));
    assert_eq!(provider.calls().await, 0);
}

#[tokio::test]
async fn test_only_tombstones_is_rejected_without_calling_provider() {
    let provider = Arc::new(EchoProvider::default());
    let service = SummaryService::new(provider.clone(), Arc::new(directory()));

    let messages = vec![Message::deleted("U1", ""), Message::deleted("U2", "")];
    let err = service
        .generate_summary(&RequestContext::new(), &messages)
        .await
        .expect_err("tombstones only must fail");

    assert!(matches!(err, SummaryError::NoMessages));
    assert_eq!(provider.calls().await, 0);
}

#[tokio::test]
async fn test_summary_keeps_message_order_and_labels() {
    let provider = Arc::new(EchoProvider::default());
    let service = SummaryService::new(provider.clone(), Arc::new(directory()));

    let messages = vec![Message::new("U1", "hi"), Message::new("U2", "yo")];
    let summary = service
        .generate_summary(&RequestContext::new(), &messages)
        .await
        .expect("summary should succeed");

    let prompts = provider.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    assert_eq!(summary, prompts[0]);

    assert!(summary.contains("A:hi\nB:yo"));
    for section in SUMMARY_SECTIONS {
        assert!(summary.contains(section), "missing section {section}");
    }
}

#[tokio::test]
async fn test_tombstones_are_dropped_but_deleted_with_body_kept() {
    let provider = Arc::new(EchoProvider::default());
    let service = SummaryService::new(provider, Arc::new(directory()));

    let messages = vec![
        Message::new("U1", "first"),
        Message::deleted("U2", ""),
        Message::deleted("U2", "edited away"),
        Message::new("U1", "last"),
    ];
    let summary = service
        .generate_summary(&RequestContext::new(), &messages)
        .await
        .expect("summary should succeed");

    assert!(summary.contains("A:first\nB:edited away\nA:last"));
}

#[tokio::test]
async fn test_unknown_speaker_gets_placeholder_and_lookups_are_deduplicated() {
    let provider = Arc::new(EchoProvider::default());
    let users = Arc::new(CountingUsers::new(directory()));
    let service = SummaryService::new(provider, users.clone());

    let messages = vec![
        Message::new("U1", "one"),
        Message::new("U9", "two"),
        Message::new("U1", "three"),
        Message::new("U9", "four"),
        Message::new("U2", "five"),
    ];
    let summary = service
        .generate_summary(&RequestContext::new(), &messages)
        .await
        .expect("lookup failures must not abort the call");

    assert!(summary.contains(&format!("{UNKNOWN_SPEAKER}:two")));
    assert!(summary.contains(&format!("{UNKNOWN_SPEAKER}:four")));
    assert!(summary.contains("A:three"));

    assert_eq!(users.total.load(Ordering::SeqCst), 3);
    let lookups = users.lookups.lock().unwrap();
    assert!(lookups.values().all(|&count| count == 1));
}

#[tokio::test]
async fn test_user_with_empty_name_gets_placeholder() {
    let provider = Arc::new(EchoProvider::default());
    let users = StaticUserDirectory::new().with_user("U1", User::new("", "  "));
    let service = SummaryService::new(provider, Arc::new(users));

    let summary = service
        .generate_summary(&RequestContext::new(), &[Message::new("U1", "hello")])
        .await
        .expect("summary should succeed");

    assert!(summary.contains(&format!("{UNKNOWN_SPEAKER}:hello")));
}

#[tokio::test]
async fn test_full_name_and_position_label() {
    let provider = Arc::new(EchoProvider::default());
    let users = StaticUserDirectory::new().with_user(
        "U1",
        User::new("Ada", "Lovelace").with_position("Engineer"),
    );
    let service = SummaryService::new(provider, Arc::new(users));

    let summary = service
        .generate_summary(&RequestContext::new(), &[Message::new("U1", "ship it")])
        .await
        .expect("summary should succeed");

    assert!(summary.contains("Ada Lovelace Engineer:ship it"));
}

#[tokio::test]
async fn test_provider_error_is_wrapped_with_source() {
    let service = SummaryService::new(Arc::new(FailingProvider), Arc::new(directory()));

    let err = service
        .generate_summary(&RequestContext::new(), &[Message::new("U1", "hi")])
        .await
        .expect_err("provider failure must propagate");

    match &err {
        SummaryError::SummarizationFailed(inner) => assert!(inner.is_generation_failed()),
        SummaryError::NoMessages => panic!("Unexpected error type"),
    }

    let provider_err = err.source().expect("provider error should be the source");
    let root = provider_err.source().expect("root cause should be preserved");
    assert_eq!(root.to_string(), "socket closed");
}

#[tokio::test]
async fn test_language_instruction_is_included() {
    let provider = Arc::new(EchoProvider::default());
    let service = SummaryService::new(provider, Arc::new(directory()))
        .with_language(SummaryLanguage::Russian);

    let summary = service
        .generate_summary(&RequestContext::new(), &[Message::new("U1", "privet")])
        .await
        .expect("summary should succeed");

    assert!(summary.contains("in Russian"));
}

#[tokio::test]
async fn test_concurrent_summaries_do_not_mix() {
    let provider = Arc::new(EchoProvider::with_delay(Duration::from_millis(50)));
    let service = SummaryService::new(provider.clone(), Arc::new(directory()));
    let ctx = RequestContext::new();

    let first = vec![Message::new("U1", "alpha topic")];
    let second = vec![Message::new("U2", "beta topic")];

    let (a, b) = tokio::join!(
        service.generate_summary(&ctx, &first),
        service.generate_summary(&ctx, &second),
    );
    let a = a.expect("first summary should succeed");
    let b = b.expect("second summary should succeed");

    assert!(a.contains("A:alpha topic") && !a.contains("beta topic"));
    assert!(b.contains("B:beta topic") && !b.contains("alpha topic"));
    assert_eq!(provider.calls().await, 2);
}
