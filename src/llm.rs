//! LLM-backed summarizer.
//!
//! Wraps `awful_aj`'s OpenAI-compatible `ask` call. The request is built from
//! the article URL and title, the source's prompt template, and the extracted
//! body text so the model does not need to browse.

use crate::enrich::Summarizer;
use crate::error::{Error, Result};
use crate::models::ExtractedArticle;
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Body text beyond this many characters is left out of the request.
pub const MAX_BODY_CHARS: usize = 12_000;

/// Build the user message for one article.
pub fn compose_prompt(article: &ExtractedArticle, prompt_template: &str) -> String {
    let body: String = article.body.chars().take(MAX_BODY_CHARS).collect();
    let mut prompt = format!(
        "Article URL: {}\nArticle title: {}\n\n{}\n\nArticle text:\n{}",
        article.url,
        article.title,
        prompt_template.trim(),
        body
    );
    if !article.images.is_empty() {
        prompt.push_str("\n\nImage captions:\n");
        for image in &article.images {
            if !image.caption.is_empty() {
                prompt.push_str("- ");
                prompt.push_str(&image.caption);
                prompt.push('\n');
            }
        }
    }
    prompt
}

/// [`Summarizer`] that asks an `awful_aj` configured model.
pub struct LlmSummarizer {
    config: AwfulJadeConfig,
    template: ChatTemplate,
}

impl LlmSummarizer {
    pub fn new(config: AwfulJadeConfig, template: ChatTemplate) -> Self {
        Self { config, template }
    }
}

impl fmt::Debug for LlmSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSummarizer").finish_non_exhaustive()
    }
}

impl Summarizer for LlmSummarizer {
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    async fn summarize(&self, article: &ExtractedArticle, prompt: &str) -> Result<Option<String>> {
        let t0 = Instant::now();
        let question = compose_prompt(article, prompt);
        let res = ask(&self.config, question, &self.template, None, None).await;
        let dt = t0.elapsed();

        match res {
            Ok(text) if text.trim().is_empty() => {
                warn!(elapsed_ms = dt.as_millis() as u128, "Model returned empty response");
                Ok(None)
            }
            Ok(text) => {
                info!(elapsed_ms = dt.as_millis() as u128, bytes = text.len(), "Model responded");
                Ok(Some(text))
            }
            Err(e) => Err(Error::Summarizer(e.to_string())),
        }
    }
}
