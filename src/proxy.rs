//! The content proxy: fetch, normalize, sanitize, tag.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use contentproxy::{
//!     ContentProxy, Entry, InMemoryFetcher, InMemoryTagRepository, ProxyOptions,
//!     RuleBasedTagger, TaggingRule, User,
//! };
//!
//! let fetcher = InMemoryFetcher::new();
//! fetcher.insert(
//!     "https://example.com/post",
//!     "<html><head><title>Post</title></head><body><p>Hello there</p></body></html>",
//! )?;
//!
//! let options = ProxyOptions::builder()
//!     .tagging_rule(TaggingRule::new("readingTime < 1", ["short"]))
//!     .build();
//! let tagger = RuleBasedTagger::new(&options.tagging_rules)?;
//!
//! let proxy = ContentProxy::new(
//!     Arc::new(fetcher),
//!     Arc::new(tagger),
//!     Arc::new(InMemoryTagRepository::new()),
//!     options,
//! );
//!
//! let mut entry = Entry::new(User::new(1, "admin"));
//! proxy.update_entry(&mut entry, "https://example.com/post", None);
//!
//! assert_eq!(entry.title, "Post");
//! assert_eq!(entry.domain_name.as_deref(), Some("example.com"));
//! assert_eq!(entry.tag_labels(), vec!["short"]);
//! # Ok::<(), contentproxy::ProxyError>(())
//! ```

use crate::entry::{Entry, Tag};
use crate::error::Result;
use crate::fetch_result::FetchResult;
use crate::fetcher::ContentFetcher;
use crate::normalizer::Normalizer;
use crate::options::ProxyOptions;
use crate::tagger::Tagger;
use crate::tags::{self, TagRepository, TagSpec};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Builds entries from URLs.
///
/// Holds the fetcher, tagger and tag repository as shared capabilities, so a
/// single proxy can serve many threads. Each call works on the one entry it
/// is given.
pub struct ContentProxy {
    fetcher: Arc<dyn ContentFetcher>,
    tagger: Arc<dyn Tagger>,
    tag_repository: Arc<dyn TagRepository>,
    normalizer: Normalizer,
}

impl ContentProxy {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        tagger: Arc<dyn Tagger>,
        tag_repository: Arc<dyn TagRepository>,
        options: ProxyOptions,
    ) -> Self {
        Self {
            fetcher,
            tagger,
            tag_repository,
            normalizer: Normalizer::new(options),
        }
    }

    pub fn options(&self) -> &ProxyOptions {
        self.normalizer.options()
    }

    /// Fill `entry` from `url`.
    ///
    /// When `forced` content is given nothing is fetched; missing parts fall
    /// back exactly as for a fetched page. Without forced content a failed
    /// fetch behaves like an empty page.
    ///
    /// Tagging is best effort: errors are logged and the tags assigned before
    /// the failure are kept. This method itself never fails.
    pub fn update_entry<'e>(
        &self,
        entry: &'e mut Entry,
        url: &str,
        forced: Option<FetchResult>,
    ) -> &'e mut Entry {
        let result = self.resolve_content(url, forced);
        self.normalizer.normalize(entry, url, &result);

        if let Err(e) = self.auto_tag(entry) {
            error!(
                url = %entry.url,
                error = %e,
                "Error while trying to automatically tag an entry"
            );
        }

        entry
    }

    /// Attach the labels in `spec` to `entry`, see [`tags::assign_tags`].
    pub fn assign_tags_to_entry(
        &self,
        entry: &mut Entry,
        spec: impl Into<TagSpec>,
        preloaded: &[Tag],
    ) -> Result<Vec<Tag>> {
        tags::assign_tags(self.tag_repository.as_ref(), entry, spec, preloaded)
    }

    fn resolve_content(&self, url: &str, forced: Option<FetchResult>) -> FetchResult {
        if let Some(content) = forced {
            debug!(url = %url, complete = content.is_complete(), "using forced content");
            return content;
        }
        self.fetcher.fetch_content(url).unwrap_or_else(|e| {
            warn!(url = %url, error = %e, "fetch failed");
            FetchResult::default()
        })
    }

    fn auto_tag(&self, entry: &mut Entry) -> Result<()> {
        let labels = self.tagger.tag(entry)?;
        if labels.is_empty() {
            return Ok(());
        }
        let added = self.assign_tags_to_entry(entry, labels, &[])?;
        debug!(url = %entry.url, count = added.len(), "tags assigned automatically");
        Ok(())
    }
}
