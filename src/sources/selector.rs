//! CSS-selector driven source.
//!
//! Scrapes a listing page for article links, then pulls each article's body
//! out of a configured content region. The `ctee` source type is this adapter
//! with Commercial Times (www.ctee.com.tw) defaults; `selector` uses generic
//! defaults and is expected to be configured per site.

use super::html::{collect_images, element_text, parse_selector, pruned_text, select_first};
use super::SourceAdapter;
use crate::config::SourceConfig;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::models::{Candidate, ExtractedArticle};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Selector defaults for a source type.
#[derive(Debug, Clone, Copy)]
pub struct SelectorDefaults {
    pub target: &'static str,
    pub content: &'static str,
    pub fallback_content: &'static str,
    pub image_scope: &'static str,
    pub image: &'static str,
}

pub const CTEE_DEFAULTS: SelectorDefaults = SelectorDefaults {
    target: "h3.news-title a",
    content: "article",
    fallback_content: ".content__body",
    image_scope: ".content__body",
    image: "figure.picture--article",
};

pub const GENERIC_DEFAULTS: SelectorDefaults = SelectorDefaults {
    target: "article a[href]",
    content: "article",
    fallback_content: "main",
    image_scope: "main",
    image: "figure",
};

pub fn build_ctee(config: &SourceConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Box<dyn SourceAdapter>> {
    Ok(Box::new(SelectorSource::new(config, CTEE_DEFAULTS, fetcher)?))
}

pub fn build_generic(config: &SourceConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Box<dyn SourceAdapter>> {
    Ok(Box::new(SelectorSource::new(config, GENERIC_DEFAULTS, fetcher)?))
}

pub struct SelectorSource {
    name: String,
    listing_url: Url,
    max_candidates: usize,
    target: Selector,
    content: Selector,
    fallback_content: Selector,
    image_scope: Selector,
    image: Selector,
    ignore: Vec<Selector>,
    fetcher: Arc<dyn PageFetcher>,
}

impl SelectorSource {
    /// Compile the configured selectors, filling gaps from `defaults`.
    pub fn new(config: &SourceConfig, defaults: SelectorDefaults, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let sel = &config.scraper_config;
        let pick = |configured: &Option<String>, default: &str| {
            parse_selector(configured.as_deref().unwrap_or(default))
        };

        Ok(Self {
            name: config.name.clone(),
            listing_url: Url::parse(&config.source_url)?,
            max_candidates: config.max_candidates,
            target: pick(&sel.target_selector, defaults.target)?,
            content: pick(&sel.content_selector, defaults.content)?,
            fallback_content: pick(&sel.fallback_content_selector, defaults.fallback_content)?,
            image_scope: pick(&sel.image_scope_selector, defaults.image_scope)?,
            image: pick(&sel.image_selector, defaults.image)?,
            ignore: sel
                .ignore_selectors
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<Vec<_>>>()?,
            fetcher,
        })
    }

    /// Article links from a listing page, capped to `max_candidates`.
    fn parse_listing(&self, body: &str) -> Vec<Candidate> {
        let document = Html::parse_document(body);
        document
            .select(&self.target)
            .take(self.max_candidates)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let url = self.listing_url.join(href.trim()).ok()?;
                Some(Candidate::new(url, element_text(link)))
            })
            .collect()
    }

    fn parse_article(&self, candidate: &Candidate, body: &str) -> Result<Option<ExtractedArticle>> {
        let base = Url::parse(&candidate.url)?;
        let document = Html::parse_document(body);

        let Some(region) = select_first(&document, &[&self.content, &self.fallback_content]) else {
            warn!(url = %candidate.url, title = %candidate.title, "No content region found; skipping");
            return Ok(None);
        };

        // Images come from the untouched document; the image scope can be
        // wider than the content region.
        let scope = document.select(&self.image_scope).next().unwrap_or(region);
        let images = collect_images(scope, &self.image, &base);

        let ignored: Vec<ElementRef<'_>> = self
            .ignore
            .iter()
            .flat_map(|sel| region.select(sel))
            .collect();
        let text = pruned_text(region, &ignored);

        debug!(url = %candidate.url, bytes = text.len(), images = images.len(), "Parsed article");
        Ok(Some(ExtractedArticle {
            url: candidate.url.clone(),
            title: candidate.title.clone(),
            body: text,
            images,
        }))
    }
}

#[async_trait]
impl SourceAdapter for SelectorSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "info", skip_all, fields(source = %self.name, url = %self.listing_url))]
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let page = self
            .fetcher
            .fetch(self.listing_url.as_str())
            .await?
            .into_success(self.listing_url.as_str())?;

        let candidates = self.parse_listing(&page.body);
        if candidates.is_empty() {
            warn!("No article links found on listing page");
        } else {
            info!(count = candidates.len(), "Listed candidates");
        }
        Ok(candidates)
    }

    #[instrument(level = "info", skip_all, fields(url = %candidate.url))]
    async fn extract_content(&self, candidate: &Candidate) -> Result<Option<ExtractedArticle>> {
        let page = self
            .fetcher
            .fetch(&candidate.url)
            .await?
            .into_success(&candidate.url)?;
        self.parse_article(candidate, &page.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::StaticFetcher;

    const LISTING: &str = r#"
        <html><body>
          <h3 class="news-title"><a href="/news/3"> Third </a></h3>
          <h3 class="news-title"><a href="https://www.ctee.com.tw/news/2">Second</a></h3>
          <h3 class="news-title"><a>No link</a></h3>
          <h3 class="news-title"><a href="/news/1">First</a></h3>
        </body></html>"#;

    const ARTICLE: &str = r#"
        <html><body>
          <div class="content__body">
            <article>
              <p>Markets rallied.</p>
              <div class="ad">Advertisement</div>
              <p>Analysts expect more.</p>
              <script>track()</script>
            </article>
            <figure class="picture--article">
              <a href="/img/full.jpg"><img src="/img/thumb.jpg"></a>
              <figcaption>Trading floor</figcaption>
            </figure>
          </div>
        </body></html>"#;

    fn ctee_config(extra: &str) -> SourceConfig {
        SourceConfig::from_yaml(&format!(
            "name: Commercial Times\nsource_type: ctee\nsource_url: https://www.ctee.com.tw/livenews\n{extra}"
        ))
        .unwrap()
    }

    fn source(config: &SourceConfig, fetcher: StaticFetcher) -> SelectorSource {
        SelectorSource::new(config, CTEE_DEFAULTS, Arc::new(fetcher)).unwrap()
    }

    #[tokio::test]
    async fn test_list_candidates_resolves_and_caps() {
        let fetcher = StaticFetcher::default().page("https://www.ctee.com.tw/livenews", LISTING);
        let config = ctee_config("max_candidates: 3\n");
        let candidates = source(&config, fetcher).list_candidates().await.unwrap();

        assert_eq!(
            candidates,
            vec![
                Candidate::new("https://www.ctee.com.tw/news/3", "Third"),
                Candidate::new("https://www.ctee.com.tw/news/2", "Second"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_candidates_surfaces_bad_status() {
        let fetcher = StaticFetcher::default().status("https://www.ctee.com.tw/livenews", 500, "");
        let config = ctee_config("");
        let err = source(&config, fetcher).list_candidates().await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_extract_content_prunes_and_collects_images() {
        let fetcher = StaticFetcher::default().page("https://www.ctee.com.tw/news/3", ARTICLE);
        let config = ctee_config("scraper_config:\n  ignore_selectors: [\".ad\", \"script\"]\n");
        let candidate = Candidate::new("https://www.ctee.com.tw/news/3", "Third");

        let article = source(&config, fetcher)
            .extract_content(&candidate)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(article.title, "Third");
        assert_eq!(article.body, "Markets rallied.\nAnalysts expect more.");
        assert_eq!(article.images.len(), 1);
        assert_eq!(article.images[0].url, "https://www.ctee.com.tw/img/full.jpg");
        assert_eq!(article.images[0].caption, "Trading floor");
    }

    #[tokio::test]
    async fn test_extract_content_falls_back_to_secondary_region() {
        let body = r#"<div class="content__body"><p>Only body.</p></div>"#;
        let fetcher = StaticFetcher::default().page("https://www.ctee.com.tw/news/9", body);
        let config = ctee_config("");
        let candidate = Candidate::new("https://www.ctee.com.tw/news/9", "Nine");

        let article = source(&config, fetcher)
            .extract_content(&candidate)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(article.body, "Only body.");
    }

    #[tokio::test]
    async fn test_extract_content_without_region_is_none() {
        let fetcher = StaticFetcher::default().page("https://www.ctee.com.tw/news/5", "<p>nothing</p>");
        let config = ctee_config("");
        let candidate = Candidate::new("https://www.ctee.com.tw/news/5", "Five");

        let result = source(&config, fetcher).extract_content(&candidate).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_configured_selector_fails_construction() {
        let config = ctee_config("scraper_config:\n  target_selector: \"h3[\"\n");
        let result = SelectorSource::new(&config, CTEE_DEFAULTS, Arc::new(StaticFetcher::default()));
        assert!(matches!(result, Err(Error::Selector { .. })));
    }
}
