//! Data models flowing through the digest pipeline.
//!
//! - [`Candidate`]: a listing-page entry, not yet fetched
//! - [`ExtractedArticle`]: structured content pulled from an article page
//! - [`EnrichedArticle`]: an article with its LLM-generated HTML summary
//! - [`Batch`]: the non-empty set of enriched articles mailed together
//!
//! The article URL is the identity key everywhere; it is what ends up in the
//! delivery history.

/// A listing-page entry (URL + title) not yet fetched for content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute article URL.
    pub url: String,
    /// Title as shown on the listing page.
    pub title: String,
}

impl Candidate {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// An image embedded in an article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleImage {
    /// Preferably the full-resolution target of a wrapping link.
    pub url: String,
    /// Figure caption, empty when the figure has none.
    pub caption: String,
}

/// Structured content extracted from a single article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub url: String,
    pub title: String,
    /// Body text, one line per text block.
    pub body: String,
    /// Images in document order.
    pub images: Vec<ArticleImage>,
}

/// An article that was successfully summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedArticle {
    pub url: String,
    pub title: String,
    /// Normalized HTML returned by the summarizer.
    pub html_fragment: String,
}

/// Ordered, non-empty sequence of enriched articles dispatched in one message.
///
/// The only constructor is [`Batch::new`], which refuses an empty sequence, so
/// holding a `Batch` means there is something to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    articles: Vec<EnrichedArticle>,
}

impl Batch {
    pub fn new(articles: Vec<EnrichedArticle>) -> Option<Self> {
        if articles.is_empty() {
            None
        } else {
            Some(Self { articles })
        }
    }

    pub fn articles(&self) -> &[EnrichedArticle] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// URLs of every article in the batch, in batch order.
    pub fn urls(&self) -> Vec<String> {
        self.articles.iter().map(|a| a.url.clone()).collect()
    }
}
