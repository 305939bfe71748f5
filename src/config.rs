//! Per-source YAML configuration.
//!
//! Each file in the config directory describes one news source: which adapter
//! handles it, where its listing page lives, the CSS selectors used to scrape
//! it, and the prompt template handed to the summarizer.

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Default number of listing entries inspected per scan.
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

/// Configuration of a single news source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Display name used in the digest title and subject.
    pub name: String,
    /// Registry key selecting the source adapter.
    pub source_type: String,
    /// Listing page URL.
    pub source_url: String,
    /// How many listing entries to inspect, newest first.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default)]
    pub scraper_config: SelectorConfig,
    /// Prompt template handed to the summarizer for every article.
    #[serde(default)]
    pub ai_prompt: String,
}

/// CSS selectors; anything left out falls back to the adapter's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorConfig {
    /// Article links on the listing page.
    pub target_selector: Option<String>,
    /// Primary article content region.
    pub content_selector: Option<String>,
    /// Tried when `content_selector` matches nothing.
    pub fallback_content_selector: Option<String>,
    /// Region searched for images; may be wider than the content region.
    pub image_scope_selector: Option<String>,
    /// Image containers (usually `figure` elements).
    pub image_selector: Option<String>,
    /// Boilerplate removed from the content region before text extraction.
    #[serde(default)]
    pub ignore_selectors: Vec<String>,
}

impl SourceConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load every `*.yaml` / `*.yml` file in `dir`, sorted by file name.
///
/// Files that cannot be read or parsed are logged and skipped so one broken
/// source does not stop the others.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn load_source_configs(dir: &Path) -> Result<Vec<SourceConfig>> {
    let mut paths = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_yaml(&path) {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "Ignoring non-YAML file");
        }
    }
    paths.sort();

    let mut configs = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = match fs::read_to_string(&path).await {
            Ok(text) => SourceConfig::from_yaml(&text),
            Err(e) => Err(e.into()),
        };
        match parsed {
            Ok(config) => {
                debug!(path = %path.display(), source = %config.name, "Loaded source config");
                configs.push(config);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping invalid source config"),
        }
    }

    info!(count = configs.len(), "Loaded source configs");
    Ok(configs)
}
