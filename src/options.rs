//! Configuration options for the content proxy.
//!
//! This module provides [`ProxyOptions`] and [`ProxyOptionsBuilder`], plus a
//! TOML loader for deployments that keep the settings in a file.
//!
//! ## Example
//!
//! ```rust
//! use contentproxy::{ProxyOptions, TaggingRule};
//!
//! let options = ProxyOptions::builder()
//!     .fetching_error_message("Could not fetch this page.")
//!     .words_per_minute(250)
//!     .tagging_rule(TaggingRule::new("readingTime <= 3", ["short reading"]))
//!     .build();
//!
//! assert_eq!(options.words_per_minute, 250);
//! ```
//!
//! ## TOML
//!
//! ```rust
//! use contentproxy::ProxyOptions;
//!
//! let options = ProxyOptions::from_toml_str(r#"
//!     fetching_error_message = "Nothing here."
//!
//!     [[tagging_rules]]
//!     rule = 'domainName = "github.com"'
//!     tags = ["dev", "code"]
//! "#).unwrap();
//!
//! assert_eq!(options.fetching_error_message, "Nothing here.");
//! assert_eq!(options.words_per_minute, 200);
//! assert_eq!(options.tagging_rules.len(), 1);
//! ```

use crate::constants::{
    DEFAULT_FETCHING_ERROR_MESSAGE, DEFAULT_IMAGE_PREVIEW_TYPES, DEFAULT_WORDS_PER_MINUTE,
};
use crate::error::Result;
use crate::sanitizer::SanitizeFlags;
use serde::{Deserialize, Serialize};

/// A rule expression and the tags to add when it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggingRule {
    pub rule: String,
    pub tags: Vec<String>,
}

impl TaggingRule {
    pub fn new<I, S>(rule: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rule: rule.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Configuration options for [`ContentProxy`](crate::ContentProxy).
#[derive(Debug, Clone)]
pub struct ProxyOptions {
    /// Content stored when the page could not be fetched.
    ///
    /// Used verbatim; it may contain HTML.
    ///
    /// Default: a short English notice
    pub fetching_error_message: String,

    /// Reading speed used for the reading-time estimate.
    ///
    /// Default: `200`
    pub words_per_minute: u32,

    /// Cleaning steps applied to fetched HTML.
    ///
    /// Default: all flags
    pub sanitize_flags: SanitizeFlags,

    /// Image subtypes for which the page URL becomes the preview picture.
    ///
    /// Default: `jpeg`, `jpg`, `gif`, `png`
    pub image_preview_types: Vec<String>,

    /// Rules used by the rule-based tagger.
    ///
    /// Default: none
    pub tagging_rules: Vec<TaggingRule>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            fetching_error_message: DEFAULT_FETCHING_ERROR_MESSAGE.to_string(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            sanitize_flags: SanitizeFlags::default(),
            image_preview_types: DEFAULT_IMAGE_PREVIEW_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tagging_rules: Vec::new(),
        }
    }
}

/// File representation; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionsFile {
    fetching_error_message: Option<String>,
    words_per_minute: Option<u32>,
    keep_comments: Option<bool>,
    absolutize_urls: Option<bool>,
    image_preview_types: Option<Vec<String>>,
    #[serde(default)]
    tagging_rules: Vec<TaggingRule>,
}

impl ProxyOptions {
    /// Creates a new builder for ProxyOptions
    pub fn builder() -> ProxyOptionsBuilder {
        ProxyOptionsBuilder::default()
    }

    /// Load options from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: OptionsFile = toml::from_str(source)?;

        let mut flags = SanitizeFlags::default();
        if file.keep_comments == Some(true) {
            flags.remove(SanitizeFlags::STRIP_COMMENTS);
        }
        if file.absolutize_urls == Some(false) {
            flags.remove(SanitizeFlags::ABSOLUTIZE_URLS);
        }

        let mut builder = ProxyOptions::builder()
            .sanitize_flags(flags)
            .tagging_rules(file.tagging_rules);
        if let Some(message) = file.fetching_error_message {
            builder = builder.fetching_error_message(message);
        }
        if let Some(wpm) = file.words_per_minute {
            builder = builder.words_per_minute(wpm);
        }
        if let Some(types) = file.image_preview_types {
            builder = builder.image_preview_types(types);
        }
        Ok(builder.build())
    }
}

/// Builder for [`ProxyOptions`].
#[derive(Default)]
pub struct ProxyOptionsBuilder {
    fetching_error_message: Option<String>,
    words_per_minute: Option<u32>,
    sanitize_flags: Option<SanitizeFlags>,
    image_preview_types: Option<Vec<String>>,
    tagging_rules: Vec<TaggingRule>,
}

impl ProxyOptionsBuilder {
    /// Set the fetching-error message
    pub fn fetching_error_message(mut self, message: impl Into<String>) -> Self {
        self.fetching_error_message = Some(message.into());
        self
    }

    /// Set the reading speed
    pub fn words_per_minute(mut self, wpm: u32) -> Self {
        self.words_per_minute = Some(wpm);
        self
    }

    /// Set sanitizer flags
    pub fn sanitize_flags(mut self, flags: SanitizeFlags) -> Self {
        self.sanitize_flags = Some(flags);
        self
    }

    /// Set image subtypes used as preview pictures
    pub fn image_preview_types(mut self, types: Vec<String>) -> Self {
        self.image_preview_types = Some(types);
        self
    }

    /// Add one tagging rule
    pub fn tagging_rule(mut self, rule: TaggingRule) -> Self {
        self.tagging_rules.push(rule);
        self
    }

    /// Add several tagging rules
    pub fn tagging_rules(mut self, rules: Vec<TaggingRule>) -> Self {
        self.tagging_rules.extend(rules);
        self
    }

    /// Build the ProxyOptions
    pub fn build(self) -> ProxyOptions {
        let defaults = ProxyOptions::default();
        ProxyOptions {
            fetching_error_message: self
                .fetching_error_message
                .unwrap_or(defaults.fetching_error_message),
            words_per_minute: self.words_per_minute.unwrap_or(defaults.words_per_minute),
            sanitize_flags: self.sanitize_flags.unwrap_or(defaults.sanitize_flags),
            image_preview_types: self
                .image_preview_types
                .unwrap_or(defaults.image_preview_types),
            tagging_rules: self.tagging_rules,
        }
    }
}
