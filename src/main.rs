//! # News Digest
//!
//! Watches news sources for articles that have not been delivered yet,
//! summarizes each new article with an LLM, and mails one digest per source.
//!
//! ## Usage
//!
//! ```sh
//! GMAIL_USER=me@gmail.com GMAIL_APP_PASSWORD=... TARGET_EMAIL=a@x.com,b@y.com \
//!     news_digest -c ./configs -H ./history.txt
//! ```
//!
//! ## Architecture
//!
//! Each source configuration is processed in turn:
//! 1. **Discovery**: list the source and keep the entries newer than the
//!    first already-delivered URL, then extract their content
//! 2. **Enrichment**: summarize the new articles one by one, pausing between
//!    calls for the model's rate limit
//! 3. **Dispatch**: mail the summaries as one digest
//! 4. **Commit**: record the delivered URLs, only after the send succeeded
//!
//! Sources run sequentially; the history file is not safe to share between
//! concurrent runs.

use awful_aj::{config as ajconfig, config_dir, template};
use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod delivery;
mod digest;
mod discovery;
mod enrich;
mod error;
mod fetch;
mod history;
mod llm;
mod models;
mod pipeline;
mod sources;
mod utils;

#[cfg(test)]
mod testing;

use cli::Cli;
use delivery::{MailSettings, SmtpMailer};
use enrich::TokioWaiter;
use fetch::HttpFetcher;
use history::FileHistory;
use llm::LlmSummarizer;
use pipeline::{Pipeline, RunOutcome};
use sources::SourceRegistry;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");

    // A missing .env is fine; the environment may already be set.
    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "No .env file loaded");
    }

    let args = Cli::parse();
    debug!(config_dir = %args.config_dir.display(), history_file = %args.history_file.display(), "Parsed CLI arguments");

    if !args.config_dir.is_dir() {
        error!(path = %args.config_dir.display(), "Config directory not found");
        return Err(format!("config directory `{}` not found", args.config_dir.display()).into());
    }

    // Early check: the history file must be writable once a digest goes out.
    let history_dir = match args.history_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    if let Err(e) = ensure_writable_dir(&history_dir).await {
        error!(path = %history_dir.display(), error = %e, "History directory is not writable");
        return Err(e);
    }

    // ---- Source configs ----
    let mut configs = config::load_source_configs(&args.config_dir).await?;
    if !args.sources.is_empty() {
        configs.retain(|c| args.sources.contains(&c.name));
    }
    if configs.is_empty() {
        info!("No source configurations to process");
        return Ok(());
    }

    // ---- Summarizer ----
    let aj_config_path = match &args.aj_config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml"),
    };
    let aj_config_path = aj_config_path
        .to_str()
        .ok_or("awful_aj config path is not valid UTF-8")?
        .to_string();
    let aj_config = ajconfig::load_config(&aj_config_path)?;
    info!(config_path = %aj_config_path, "Loaded awful_aj configuration");
    let chat_template = template::load_template(&args.template).await?;
    info!(template = %args.template, "Loaded template");
    let summarizer = LlmSummarizer::new(aj_config, chat_template);

    // ---- Delivery ----
    let mailer = SmtpMailer::new(&MailSettings {
        smtp_host: args.smtp_host.clone(),
        smtp_port: args.smtp_port,
        username: args.smtp_user.clone(),
        password: args.smtp_password.clone(),
        recipients: args.recipients.clone(),
        timeout: Duration::from_secs(10),
    })?;

    let fetcher = Arc::new(HttpFetcher::new(
        args.insecure,
        Duration::from_secs(args.fetch_timeout_secs),
    )?);
    let history = FileHistory::new(&args.history_file);
    let registry = SourceRegistry::with_builtin_sources();

    let pipeline = Pipeline {
        history: &history,
        summarizer: &summarizer,
        waiter: &TokioWaiter,
        mailer: &mailer,
        delay: Duration::from_secs(args.rate_limit_secs),
    };

    let today = Local::now().date_naive();
    let outcomes = pipeline.run_sources(&registry, fetcher, &configs, today).await;

    let delivered = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, RunOutcome::Delivered { .. }))
        .count();
    for (name, outcome) in &outcomes {
        info!(source = %name, ?outcome, "Source finished");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        sources = outcomes.len(),
        delivered,
        "Execution complete"
    );

    Ok(())
}
