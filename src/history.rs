//! Persistent record of article URLs that were already delivered.
//!
//! The on-disk format is a flat list of URLs, one per line, most recent last,
//! capped at [`HISTORY_CAPACITY`] lines. It is rewritten as a whole through a
//! temporary file and a rename, so a crash mid-write leaves the previous
//! history in place.
//!
//! Listing links reach the pipeline as `Url::join` output, which
//! percent-encodes non-ASCII paths and adds a `/` to bare hosts. `load`
//! applies the same normalization to each stored line so files holding raw
//! hrefs still match.
//!
//! `load` and `append` are not coordinated with each other. Running several
//! source configurations against the same store concurrently can lose entries;
//! callers must process configurations one at a time.

use crate::error::Result;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum number of URLs kept in the history.
pub const HISTORY_CAPACITY: usize = 100;

/// Storage for the set of already-delivered URLs.
pub trait HistoryStore {
    /// Return every persisted URL. A store that was never written is empty,
    /// not an error.
    async fn load(&self) -> Result<HashSet<String>>;

    /// Append `urls` after the existing entries and keep only the most recent
    /// [`HISTORY_CAPACITY`]. Does nothing when `urls` is empty.
    async fn append(&self, urls: &[String]) -> Result<()>;
}

/// Keep the last `capacity` entries of `entries`.
pub fn truncate_to_recent(mut entries: Vec<String>, capacity: usize) -> Vec<String> {
    if entries.len() > capacity {
        entries.drain(..entries.len() - capacity);
    }
    entries
}

/// Serialized form of `entry` as an absolute URL, or `entry` unchanged when
/// it does not parse.
pub fn canonical_url(entry: &str) -> String {
    Url::parse(entry).map_or_else(|_| entry.to_string(), |u| u.to_string())
}

/// History stored as a text file.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
    capacity: usize,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capacity: HISTORY_CAPACITY,
        }
    }

    /// Read all lines in file order, or an empty list when the file is absent.
    async fn read_entries(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryStore for FileHistory {
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<HashSet<String>> {
        let entries = self.read_entries().await?;
        debug!(count = entries.len(), "Loaded history");
        Ok(entries.iter().map(|e| canonical_url(e)).collect())
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), new = urls.len()))]
    async fn append(&self, urls: &[String]) -> Result<()> {
        if urls.is_empty() {
            return Ok(());
        }

        let mut entries = self.read_entries().await?;
        entries.extend(urls.iter().cloned());
        let entries = truncate_to_recent(entries, self.capacity);

        let tmp = self.temp_path();
        fs::write(&tmp, entries.join("\n")).await?;
        fs::rename(&tmp, &self.path).await?;

        info!(total = entries.len(), "History updated");
        Ok(())
    }
}
