// Command-line entry point: summarize a transcript file with the configured backend.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::info;

use recap::ai::{Provider, build_provider};
use recap::core::{AppConfig, Message, RequestContext, User};
use recap::summarize::{StaticUserDirectory, SummaryService};

const USAGE: &str = "Usage: recap-cli [--check] [TRANSCRIPT.json]

Reads a transcript of the form {\"users\": {\"<id>\": {...}}, \"messages\": [...]}
from the given file, or from stdin when no file is given.
Settings come from RECAP_* environment variables.";

#[derive(Debug, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    users: HashMap<String, User>,
    messages: Vec<Message>,
}

#[tokio::main]
async fn main() -> Result<()> {
    recap::setup_logging();

    let mut check_only = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--check" => check_only = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            flag if flag.starts_with('-') => bail!("unknown flag: {flag}\n\n{USAGE}"),
            file => path = Some(file.to_string()),
        }
    }

    let config = AppConfig::from_env().context("failed to read configuration")?;
    let provider =
        Arc::new(build_provider(&config).context("failed to initialize generation provider")?);

    let ctx = RequestContext::with_timeout(config.request_timeout());
    let token = ctx.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling request");
            token.cancel();
        }
    });

    if check_only {
        provider
            .health_check(&ctx)
            .await
            .context("health check failed")?;
        println!("ok");
        return Ok(());
    }

    let raw = match path {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {path}"))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
    };
    let transcript: TranscriptFile =
        serde_json::from_str(&raw).context("invalid transcript JSON")?;

    // Only the most recent `max_messages` posts are summarized.
    let skip = transcript.messages.len().saturating_sub(config.max_messages);
    let messages = &transcript.messages[skip..];

    let users: StaticUserDirectory = transcript.users.into_iter().collect();
    let service =
        SummaryService::new(provider, Arc::new(users)).with_language(config.summary_language);

    let summary = service
        .generate_summary(&ctx, messages)
        .await
        .context("failed to summarize transcript")?;
    println!("{summary}");

    Ok(())
}
