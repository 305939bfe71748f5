//! Incremental discovery of new articles.
//!
//! Listings are assumed to be ordered newest first. The scan stops at the
//! first URL already in the history: everything after it is taken to be older
//! and already delivered. If a source reorders its listing, unseen articles
//! behind a known one are skipped.

use crate::models::{Candidate, ExtractedArticle};
use crate::sources::SourceAdapter;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

/// Leading candidates not in `known_urls`, up to the first known one.
pub fn take_until_known(candidates: Vec<Candidate>, known_urls: &HashSet<String>) -> Vec<Candidate> {
    let mut fresh = Vec::new();
    for candidate in candidates {
        if known_urls.contains(&candidate.url) {
            info!(title = %candidate.title, url = %candidate.url, "Found known article; stopping scan");
            break;
        }
        fresh.push(candidate);
    }
    fresh
}

/// List a source, keep the candidates newer than anything in `known_urls`,
/// and extract each of them, preserving listing order.
///
/// Failures never propagate: an unreachable listing yields no articles, and
/// an article that cannot be fetched or parsed is dropped.
#[instrument(level = "info", skip_all, fields(source = %adapter.name()))]
pub async fn discover_new_articles(
    adapter: &dyn SourceAdapter,
    known_urls: &HashSet<String>,
) -> Vec<ExtractedArticle> {
    let candidates = match adapter.list_candidates().await {
        Ok(candidates) => candidates,
        Err(e) => {
            error!(error = %e, "Scan failed; listing unavailable");
            return Vec::new();
        }
    };

    let queue = take_until_known(candidates, known_urls);
    if queue.is_empty() {
        info!("No new articles found");
        return Vec::new();
    }
    info!(count = queue.len(), "Found new articles; fetching content");

    let articles: Vec<ExtractedArticle> = stream::iter(queue)
        .then(|candidate| async move {
            match adapter.extract_content(&candidate).await {
                Ok(Some(article)) => {
                    debug!(url = %candidate.url, "Extracted article");
                    Some(article)
                }
                Ok(None) => {
                    warn!(url = %candidate.url, title = %candidate.title, "Article produced no content");
                    None
                }
                Err(e) => {
                    error!(url = %candidate.url, title = %candidate.title, error = %e, "Article fetch failed");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(count = articles.len(), "Extracted new articles");
    articles
}
