//! In-memory doubles for the pipeline's collaborators.

use crate::delivery::Mailer;
use crate::enrich::{Summarizer, Waiter};
use crate::error::{Error, Result};
use crate::fetch::{FetchedPage, PageFetcher};
use crate::history::{truncate_to_recent, HistoryStore, HISTORY_CAPACITY};
use crate::models::ExtractedArticle;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::sync::Mutex;
use std::time::Duration;

/// Serves canned pages and records every URL requested.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, FetchedPage>,
    pub requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn page(self, url: &str, body: &str) -> Self {
        self.status(url, 200, body)
    }

    pub fn status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(ErrorKind::ConnectionRefused, format!("no route to {url}")))
        })
    }
}

/// History kept in a vector, with a counter of `append` calls.
#[derive(Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<String>>,
    pub appends: Mutex<usize>,
    /// When set, every `append` is counted and then fails.
    pub fail_append: bool,
}

impl MemoryHistory {
    pub fn with_entries(entries: &[&str]) -> Self {
        Self {
            entries: Mutex::new(entries.iter().map(|s| s.to_string()).collect()),
            appends: Mutex::new(0),
            fail_append: false,
        }
    }

    pub fn read_only() -> Self {
        Self {
            fail_append: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn append_calls(&self) -> usize {
        *self.appends.lock().unwrap()
    }
}

impl HistoryStore for MemoryHistory {
    async fn load(&self) -> Result<HashSet<String>> {
        Ok(self.entries.lock().unwrap().iter().cloned().collect())
    }

    async fn append(&self, urls: &[String]) -> Result<()> {
        if urls.is_empty() {
            return Ok(());
        }
        *self.appends.lock().unwrap() += 1;
        if self.fail_append {
            return Err(Error::Io(std::io::Error::new(ErrorKind::PermissionDenied, "history is read-only")));
        }
        let mut entries = self.entries.lock().unwrap();
        let mut all = std::mem::take(&mut *entries);
        all.extend(urls.iter().cloned());
        *entries = truncate_to_recent(all, HISTORY_CAPACITY);
        Ok(())
    }
}

/// Outcome scripted per article URL.
#[derive(Clone)]
pub enum Reply {
    Html(String),
    Empty,
    Fail,
}

/// Summarizer answering from a script; unknown URLs get a generic fragment.
#[derive(Default)]
pub struct ScriptedSummarizer {
    replies: HashMap<String, Reply>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedSummarizer {
    pub fn reply(mut self, url: &str, reply: Reply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, article: &ExtractedArticle, _prompt: &str) -> Result<Option<String>> {
        self.calls.lock().unwrap().push(article.url.clone());
        match self.replies.get(&article.url) {
            Some(Reply::Html(html)) => Ok(Some(html.clone())),
            Some(Reply::Empty) => Ok(None),
            Some(Reply::Fail) => Err(Error::Summarizer("quota exceeded".to_string())),
            None => Ok(Some(format!("<p>Summary of {}</p>", article.title))),
        }
    }
}

/// Records requested delays without sleeping.
#[derive(Default)]
pub struct CountingWaiter {
    pub waits: Mutex<Vec<Duration>>,
}

impl CountingWaiter {
    pub fn count(&self) -> usize {
        self.waits.lock().unwrap().len()
    }
}

impl Waiter for CountingWaiter {
    async fn wait(&self, delay: Duration) {
        self.waits.lock().unwrap().push(delay);
    }
}

/// Records sent messages; optionally fails every send.
#[derive(Default)]
pub struct RecordingMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, subject: &str, html_body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), html_body.to_string()));
        if self.fail {
            Err(Error::Delivery("SMTP connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A minimal extracted article.
pub fn article(url: &str, title: &str) -> ExtractedArticle {
    ExtractedArticle {
        url: url.to_string(),
        title: title.to_string(),
        body: format!("Body of {title}"),
        images: Vec::new(),
    }
}
