//! Content fetcher capability.
//!
//! The proxy does not do network I/O itself. It calls a [`ContentFetcher`],
//! which owns downloading, timeouts and readability extraction, and only sees
//! the resulting [`FetchResult`].

use crate::error::{FetchError, ProxyError, Result};
use crate::fetch_result::FetchResult;
use crate::metadata::extract_fetch_result;
use std::collections::HashMap;
use std::sync::RwLock;
use url::Url;

/// Something that can turn a URL into page data.
pub trait ContentFetcher: Send + Sync {
    fn fetch_content(&self, url: &str) -> std::result::Result<FetchResult, FetchError>;
}

/// A page held by [`InMemoryFetcher`].
#[derive(Debug, Clone)]
struct StoredPage {
    html: String,
    final_url: String,
    content_type: Option<String>,
    status: u16,
}

/// Fetcher serving pages registered up front.
///
/// Useful for tests and for re-processing pages that were downloaded earlier.
/// Each stored page goes through [`extract_fetch_result`] when fetched.
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    pages: RwLock<HashMap<String, StoredPage>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `html` as the page served for `url`.
    pub fn insert(&self, url: &str, html: impl Into<String>) -> Result<()> {
        self.insert_page(url, url, html, None, 200)
    }

    /// Register a page with a redirect target, content type and status.
    pub fn insert_page(
        &self,
        url: &str,
        final_url: &str,
        html: impl Into<String>,
        content_type: Option<&str>,
        status: u16,
    ) -> Result<()> {
        for candidate in [url, final_url] {
            Url::parse(candidate).map_err(|_| ProxyError::InvalidUrl(candidate.to_string()))?;
        }

        let mut pages = self
            .pages
            .write()
            .map_err(|e| ProxyError::Other(e.to_string()))?;
        pages.insert(
            url.to_string(),
            StoredPage {
                html: html.into(),
                final_url: final_url.to_string(),
                content_type: content_type.map(str::to_string),
                status,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pages.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentFetcher for InMemoryFetcher {
    fn fetch_content(&self, url: &str) -> std::result::Result<FetchResult, FetchError> {
        let pages = self
            .pages
            .read()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let page = pages
            .get(url)
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;

        if page.status >= 400 {
            return Err(FetchError::Http {
                status: page.status,
            });
        }

        Ok(extract_fetch_result(
            &page.html,
            &page.final_url,
            page.content_type.as_deref(),
            Some(page.status),
        ))
    }
}

/// Fetcher that always fails. Stands in for an unreachable network.
#[derive(Debug, Clone)]
pub struct FailingFetcher {
    error: FetchError,
}

impl FailingFetcher {
    pub fn new(error: FetchError) -> Self {
        Self { error }
    }
}

impl Default for FailingFetcher {
    fn default() -> Self {
        Self::new(FetchError::Network("offline".to_string()))
    }
}

impl ContentFetcher for FailingFetcher {
    fn fetch_content(&self, _url: &str) -> std::result::Result<FetchResult, FetchError> {
        Err(self.error.clone())
    }
}
