//! Turns a [`FetchResult`] into entry fields, filling gaps with fallbacks.
//!
//! Precedence, field by field:
//!
//! | Field | Source |
//! |---|---|
//! | `url` | fetched URL, else the requested URL verbatim |
//! | `title` | fetched title, else `og:title`, else empty |
//! | `content` | sanitized HTML, else the fetching-error message (plus the escaped `og:description`) |
//! | `preview_picture` | page URL for image responses, else `og:image`, else `None` |
//! | `mimetype`, `language`, `http_status` | fetched value, else `None` |
//! | `reading_time` | words of the final content / words per minute, rounded down |
//! | `domain_name` | host of the final URL, else `None` |

use crate::constants::SHORT_DESCRIPTION_MARKER;
use crate::entry::Entry;
use crate::fetch_result::FetchResult;
use crate::options::ProxyOptions;
use crate::sanitizer::{self, Sanitizer};
use crate::utils;
use chrono::Utc;
use tracing::debug;

/// Applies a fetch result to an entry.
#[derive(Debug, Clone)]
pub struct Normalizer {
    options: ProxyOptions,
}

impl Normalizer {
    pub fn new(options: ProxyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    /// Overwrite the derived fields of `entry` from `result`.
    ///
    /// Tags, owner and creation time are left alone.
    pub fn normalize(&self, entry: &mut Entry, requested_url: &str, result: &FetchResult) {
        let url = result.url().unwrap_or(requested_url).to_string();

        let title = result
            .title()
            .or_else(|| result.og_title())
            .unwrap_or_default()
            .to_string();

        let content = match result.html() {
            Some(html) => Sanitizer::new(self.options.sanitize_flags)
                .with_base_url(&url)
                .clean(html),
            None => self.fallback_content(result),
        };

        let preview_picture = match result.content_type() {
            Some(ct) if utils::is_image_content_type(ct, &self.options.image_preview_types) => {
                Some(url.clone())
            }
            _ => result.og_image().map(str::to_string),
        };

        entry.reading_time = utils::reading_time(&content, self.options.words_per_minute);
        entry.domain_name = utils::domain_name(&url);
        entry.mimetype = result.content_type().map(str::to_string);
        entry.language = result.language().map(str::to_string);
        entry.http_status = result.status().map(str::to_string);
        entry.preview_picture = preview_picture;
        entry.url = url;
        entry.title = title;
        entry.content = content;
        entry.updated_at = Utc::now();

        debug!(
            url = %entry.url,
            domain = ?entry.domain_name,
            reading_time = entry.reading_time,
            "entry normalized"
        );
    }

    fn fallback_content(&self, result: &FetchResult) -> String {
        let mut content = self.options.fetching_error_message.clone();
        if let Some(description) = result.og_description() {
            content.push_str(SHORT_DESCRIPTION_MARKER);
            sanitizer::escape_text(description, &mut content);
        }
        content
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ProxyOptions::default())
    }
}
