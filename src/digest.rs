//! Digest assembly and dispatch.
//!
//! A [`Batch`] becomes one HTML message: a title naming the source and the
//! number of articles, then one card per article with its summary and a link
//! back to the original. The batch's URLs are committed to the history only
//! once the mailer confirms the send.

use crate::delivery::Mailer;
use crate::history::HistoryStore;
use crate::models::Batch;
use crate::utils::escape_html;
use chrono::NaiveDate;
use std::fmt::Write;
use tracing::{error, info, instrument};

/// A composed digest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub html: String,
}

/// What happened to a batch handed to [`dispatch_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sent; `history_committed` is false if writing the history failed
    /// afterwards.
    Delivered { count: usize, history_committed: bool },
    /// Not sent; history untouched.
    Failed { count: usize },
}

pub fn digest_subject(source_name: &str, count: usize) -> String {
    format!("[{source_name}] News digest ({count} articles)")
}

/// Render `batch` as a single HTML document.
pub fn compose_digest(source_name: &str, batch: &Batch, date: NaiveDate) -> Digest {
    let name = escape_html(source_name);
    let mut cards = String::new();
    for article in batch.articles() {
        let _ = write!(
            cards,
            r#"
        <div style="border: 1px solid #ccc; padding: 20px; margin-bottom: 30px; border-radius: 10px; background-color: #fff;">
            <h2 style="color: #d32f2f; border-bottom: 2px solid #d32f2f; padding-bottom: 10px;">{title}</h2>
            {fragment}
            <p style="text-align: right;"><a href="{url}" style="color: #007bff;">Read the original</a></p>
        </div>"#,
            title = escape_html(&article.title),
            fragment = article.html_fragment,
            url = escape_html(&article.url),
        );
    }

    let html = format!(
        r#"<html>
    <body style="font-family: sans-serif; background-color: #f4f4f4; padding: 20px;">
        <h1 style="text-align: center; color: #333;">{name}: latest news, {date}</h1>
        <p style="text-align: center; color: #666;">{count} new articles in this digest</p>{cards}
        <div style="text-align: center; margin-top: 40px; color: #888; font-size: 12px;">
            <p>This digest was summarized and sent automatically. Summaries may contain mistakes; check the original articles.</p>
        </div>
    </body>
</html>
"#,
        date = date.format("%Y-%m-%d"),
        count = batch.len(),
    );

    Digest {
        subject: digest_subject(source_name, batch.len()),
        html,
    }
}

/// Mail `batch` and, only on success, append its URLs to `history`.
///
/// A failed send leaves the history untouched so the same articles are
/// picked up again by the next run; duplicate mail is preferred over loss.
#[instrument(level = "info", skip_all, fields(source = %source_name, count = batch.len()))]
pub async fn dispatch_batch<M, H>(
    source_name: &str,
    batch: &Batch,
    date: NaiveDate,
    mailer: &M,
    history: &H,
) -> DispatchOutcome
where
    M: Mailer,
    H: HistoryStore,
{
    let count = batch.len();
    let digest = compose_digest(source_name, batch, date);

    if let Err(e) = mailer.send(&digest.subject, &digest.html).await {
        error!(error = %e, "Failed to send digest; history left unchanged");
        return DispatchOutcome::Failed { count };
    }

    let history_committed = match history.append(&batch.urls()).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Digest sent but history update failed; articles may be resent");
            false
        }
    };

    info!(count, history_committed, "Digest delivered");
    DispatchOutcome::Delivered {
        count,
        history_committed,
    }
}
