//! Sequential, rate-limited enrichment of extracted articles.
//!
//! Articles are summarized one at a time in input order. Between two
//! consecutive summarizer calls the pipeline waits a fixed delay to stay
//! under the backend's request quota; there is no wait before the first call.
//! A failed or empty summary drops that article and the loop moves on.

use crate::error::Result;
use crate::models::{EnrichedArticle, ExtractedArticle};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Pause between consecutive summarizer calls.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(15);

static LEADING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap());
static FENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_-]*[ \t]*\r?$\n?").unwrap());
static TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?[ \t]*```$").unwrap());

/// Something that turns an article into an HTML summary.
pub trait Summarizer {
    /// `Ok(None)` (or an empty string) means the backend had nothing to say.
    async fn summarize(&self, article: &ExtractedArticle, prompt: &str) -> Result<Option<String>>;
}

/// Pause capability, injected so tests can count waits without sleeping.
pub trait Waiter {
    async fn wait(&self, delay: Duration);
}

/// [`Waiter`] that sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioWaiter;

impl Waiter for TokioWaiter {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Strip markdown code fences (e.g. "```html ... ```") and trim.
///
/// Fence lines are dropped wherever they appear, so a fence opened after a
/// line of preamble goes too. Backticks inside a line of markup are kept.
/// Text without fences only gets trimmed, so applying this twice is the same
/// as applying it once.
pub fn normalize_fragment(raw: &str) -> String {
    let without_lines = FENCE_LINE.replace_all(raw.trim(), "");
    let without_lead = LEADING_FENCE.replace(without_lines.trim(), "");
    let without_trail = TRAILING_FENCE.replace(without_lead.trim_end(), "");
    without_trail.trim().to_string()
}

/// Summarize `articles` in order, waiting `delay` before every call after
/// the first. Articles whose summary fails or comes back empty are dropped.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn enrich_articles<S, W>(
    articles: &[ExtractedArticle],
    prompt: &str,
    summarizer: &S,
    waiter: &W,
    delay: Duration,
) -> Vec<EnrichedArticle>
where
    S: Summarizer,
    W: Waiter,
{
    let mut enriched = Vec::with_capacity(articles.len());

    for (i, article) in articles.iter().enumerate() {
        if i > 0 {
            info!(?delay, "Waiting to respect summarizer rate limit");
            waiter.wait(delay).await;
        }

        info!(index = i, title = %article.title, "Summarizing article");
        let raw = match summarizer.summarize(article, prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(index = i, url = %article.url, error = %e, "Summarizer failed");
                None
            }
        };

        let fragment = raw.map(|r| normalize_fragment(&r)).unwrap_or_default();
        if fragment.is_empty() {
            warn!(index = i, title = %article.title, "Skipping article: no summary produced");
            continue;
        }

        debug!(index = i, preview = %truncate_for_log(&fragment, 120), "Summary received");
        enriched.push(EnrichedArticle {
            url: article.url.clone(),
            title: article.title.clone(),
            html_fragment: fragment,
        });
    }

    info!(
        total = articles.len(),
        successful = enriched.len(),
        failed = articles.len() - enriched.len(),
        "Enrichment finished"
    );
    enriched
}
