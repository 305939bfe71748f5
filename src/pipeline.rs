//! One digest run per source: discover, enrich, dispatch, commit.
//!
//! Sources are processed strictly one after another. The history store is
//! read at the start of each source run and written once after a confirmed
//! send; nothing guards the two calls, so runs must not overlap.

use crate::config::SourceConfig;
use crate::delivery::Mailer;
use crate::digest::{dispatch_batch, DispatchOutcome};
use crate::discovery::discover_new_articles;
use crate::enrich::{enrich_articles, Summarizer, Waiter};
use crate::fetch::PageFetcher;
use crate::history::HistoryStore;
use crate::models::Batch;
use crate::sources::{SourceAdapter, SourceRegistry};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Result of running one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing newer than the history on the listing page.
    NoNewArticles,
    /// New articles were found but none produced a summary.
    NothingEnriched { attempted: usize },
    Delivered { count: usize, history_committed: bool },
    /// The send failed; the same articles will be retried next run.
    DeliveryFailed { count: usize },
    /// The source could not be run at all.
    Skipped { reason: String },
}

impl From<DispatchOutcome> for RunOutcome {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Delivered {
                count,
                history_committed,
            } => RunOutcome::Delivered {
                count,
                history_committed,
            },
            DispatchOutcome::Failed { count } => RunOutcome::DeliveryFailed { count },
        }
    }
}

/// The collaborators shared by every source run.
pub struct Pipeline<'a, H, S, W, M> {
    pub history: &'a H,
    pub summarizer: &'a S,
    pub waiter: &'a W,
    pub mailer: &'a M,
    /// Pause between summarizer calls.
    pub delay: Duration,
}

impl<'a, H, S, W, M> Pipeline<'a, H, S, W, M>
where
    H: HistoryStore,
    S: Summarizer,
    W: Waiter,
    M: Mailer,
{
    /// Run one source end to end.
    #[instrument(level = "info", skip_all, fields(source = %config.name))]
    pub async fn run_source(&self, config: &SourceConfig, adapter: &dyn SourceAdapter, date: NaiveDate) -> RunOutcome {
        let known_urls = match self.history.load().await {
            Ok(known) => known,
            Err(e) => {
                error!(error = %e, "Could not read history; skipping source");
                return RunOutcome::Skipped {
                    reason: format!("history unavailable: {e}"),
                };
            }
        };

        let articles = discover_new_articles(adapter, &known_urls).await;
        if articles.is_empty() {
            info!("No new articles found");
            return RunOutcome::NoNewArticles;
        }
        info!(count = articles.len(), "Found new articles; summarizing");

        let enriched = enrich_articles(
            &articles,
            &config.ai_prompt,
            self.summarizer,
            self.waiter,
            self.delay,
        )
        .await;

        let Some(batch) = Batch::new(enriched) else {
            warn!(attempted = articles.len(), "No valid content generated; nothing to send");
            return RunOutcome::NothingEnriched {
                attempted: articles.len(),
            };
        };

        dispatch_batch(&config.name, &batch, date, self.mailer, self.history)
            .await
            .into()
    }

    /// Run every configured source in order, building each adapter through
    /// `registry`.
    pub async fn run_sources(
        &self,
        registry: &SourceRegistry,
        fetcher: Arc<dyn PageFetcher>,
        configs: &[SourceConfig],
        date: NaiveDate,
    ) -> Vec<(String, RunOutcome)> {
        let mut outcomes = Vec::with_capacity(configs.len());
        for config in configs {
            info!(source = %config.name, source_type = %config.source_type, "Processing source");
            let outcome = match registry.build(config, Arc::clone(&fetcher)) {
                Ok(adapter) => self.run_source(config, adapter.as_ref(), date).await,
                Err(e) => {
                    warn!(source = %config.name, error = %e, "No usable adapter for source");
                    RunOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push((config.name.clone(), outcome));
        }
        outcomes
    }
}
