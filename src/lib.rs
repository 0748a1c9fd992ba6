//! # contentproxy
//!
//! Turns a URL, or content that was fetched elsewhere, into a complete and safe
//! read-later entry.
//!
//! ## Overview
//!
//! Fetching real pages is messy: titles go missing, extraction fails, URLs are
//! malformed and article HTML may carry scripts. `contentproxy` takes whatever a
//! fetcher managed to collect and derives a full [`Entry`] from it with a fixed
//! precedence of fallbacks, sanitizes the HTML, and attaches tags.
//!
//! ## Key Features
//!
//! - **Pluggable fetching**: any [`ContentFetcher`] can supply page data; fetch
//!   failures degrade to a configured error message instead of an error
//! - **Fallback metadata**: Open Graph title, description and image fill gaps
//! - **HTML sanitization**: scripts, conditional comments, event handlers and
//!   `javascript:` URLs are removed
//! - **Reading time and domain**: derived from the final content and URL
//! - **Tagging**: comma-separated or list tag input, rule-based automatic tags,
//!   no duplicate labels
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use contentproxy::{
//!     ContentProxy, Entry, FailingFetcher, FetchResult, InMemoryTagRepository, NoopTagger,
//!     ProxyOptions, User,
//! };
//!
//! let proxy = ContentProxy::new(
//!     Arc::new(FailingFetcher::default()),
//!     Arc::new(NoopTagger),
//!     Arc::new(InMemoryTagRepository::new()),
//!     ProxyOptions::builder().fetching_error_message("Could not fetch.").build(),
//! );
//!
//! let mut entry = Entry::new(User::new(1, "admin"));
//! proxy.update_entry(&mut entry, "http://user@:80", None);
//!
//! assert_eq!(entry.url, "http://user@:80");
//! assert_eq!(entry.content, "Could not fetch.");
//! assert_eq!(entry.domain_name, None);
//!
//! let forced: FetchResult = serde_json::from_str(r#"{
//!     "html": "<p>Hello</p><script>alert('x')</script>",
//!     "title": "Hello",
//!     "url": "http://1.1.1.1",
//!     "content_type": "text/html",
//!     "language": "en"
//! }"#).unwrap();
//! proxy.update_entry(&mut entry, "http://0.0.0.0", Some(forced));
//!
//! assert_eq!(entry.content, "<p>Hello</p>");
//! assert_eq!(entry.domain_name.as_deref(), Some("1.1.1.1"));
//!
//! proxy.assign_tags_to_entry(&mut entry, "news, tech", &[]).unwrap();
//! assert_eq!(entry.tag_labels(), vec!["news", "tech"]);
//! ```
//!
//! ## Error Handling
//!
//! [`ContentProxy::update_entry`] never fails: fetch and tagging errors are
//! logged through `tracing` and absorbed. Lower-level operations such as
//! [`assign_tags`] and [`ProxyOptions::from_toml_str`] return [`Result`].

mod constants;
mod entry;
mod error;
mod fetch_result;
mod fetcher;
mod metadata;
mod normalizer;
mod options;
mod proxy;
mod rules;
mod sanitizer;
mod tagger;
mod tags;
mod utils;

// Public exports
pub use constants::{DEFAULT_FETCHING_ERROR_MESSAGE, SHORT_DESCRIPTION_MARKER};
pub use entry::{Entry, Tag, User};
pub use error::{FetchError, ProxyError, Result, RuleError};
pub use fetch_result::{FetchResult, OpenGraph};
pub use fetcher::{ContentFetcher, FailingFetcher, InMemoryFetcher};
pub use metadata::{extract_fetch_result, extract_open_graph};
pub use normalizer::Normalizer;
pub use options::{ProxyOptions, ProxyOptionsBuilder, TaggingRule};
pub use proxy::ContentProxy;
pub use rules::{Expr, Field, Literal, Operator, Rule};
pub use sanitizer::{sanitize, SanitizeFlags, Sanitizer};
pub use tagger::{NoopTagger, RuleBasedTagger, Tagger};
pub use tags::{assign_tags, InMemoryTagRepository, TagRepository, TagSpec};
pub use utils::{domain_name, reading_time, word_count};
