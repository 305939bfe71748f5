//! HTTP transport used by source adapters.
//!
//! Fetchers return the status alongside the body so callers can tell a page
//! that was fetched but is useless (non-success status) from one that could
//! not be fetched at all (transport error).

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Desktop browser User-Agent; several news sites reject unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-success status into [`Error::Status`].
    pub fn into_success(self, url: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// [`PageFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with a browser User-Agent.
    ///
    /// `accept_invalid_certs` disables TLS certificate validation, for
    /// networks that intercept TLS.
    pub fn new(accept_invalid_certs: bool, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(status, bytes = body.len(), "Fetched page");
        Ok(FetchedPage { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_success_rejects_error_status() {
        let page = FetchedPage {
            status: 503,
            body: String::new(),
        };
        match page.into_success("https://example.com") {
            Err(Error::Status { status, url }) => {
                assert_eq!(status, 503);
                assert_eq!(url, "https://example.com");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_into_success_passes_ok_status() {
        let page = FetchedPage {
            status: 200,
            body: "<html></html>".to_string(),
        };
        assert!(page.into_success("https://example.com").is_ok());
    }
}
