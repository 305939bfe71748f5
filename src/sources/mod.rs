//! News source adapters.
//!
//! Every source exposes the same two-phase capability:
//!
//! 1. **Listing**: read the source's listing page and return candidates,
//!    newest first
//! 2. **Extraction**: fetch one candidate and pull out its title, body text
//!    and images
//!
//! Adapters are built through a [`SourceRegistry`] keyed on the
//! `source_type` field of a [`SourceConfig`].
//!
//! | `source_type` | Adapter | Notes |
//! |---------------|---------|-------|
//! | `ctee` | [`selector::SelectorSource`] | Commercial Times defaults |
//! | `selector` | [`selector::SelectorSource`] | Generic CSS selectors |

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::models::{Candidate, ExtractedArticle};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub mod html;
pub mod selector;

/// Listing and extraction capability of one news source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name of the source.
    fn name(&self) -> &str;

    /// Candidates from the listing page, newest first, at most the configured
    /// number of entries.
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;

    /// Fetch and extract a single article. `Ok(None)` means the page had no
    /// recognizable content.
    async fn extract_content(&self, candidate: &Candidate) -> Result<Option<ExtractedArticle>>;
}

/// Builds an adapter for a source configuration.
pub type SourceFactory = fn(&SourceConfig, Arc<dyn PageFetcher>) -> Result<Box<dyn SourceAdapter>>;

/// Maps `source_type` identifiers to adapter factories.
pub struct SourceRegistry {
    factories: HashMap<String, SourceFactory>,
}

impl SourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in source type.
    pub fn with_builtin_sources() -> Self {
        let mut registry = Self::new();
        registry.register("ctee", selector::build_ctee);
        registry.register("selector", selector::build_generic);
        registry
    }

    pub fn register(&mut self, source_type: &str, factory: SourceFactory) {
        self.factories.insert(source_type.to_string(), factory);
    }

    /// Build the adapter for `config`, or [`Error::UnknownSource`].
    pub fn build(&self, config: &SourceConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Box<dyn SourceAdapter>> {
        let factory = self
            .factories
            .get(&config.source_type)
            .ok_or_else(|| Error::UnknownSource(config.source_type.clone()))?;
        factory(config, fetcher)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_builtin_sources()
    }
}
