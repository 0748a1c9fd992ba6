//! Entry, tag and owner records.
//!
//! An [`Entry`] is the saved copy of a web page. It is created by the caller for
//! a [`User`], then filled in place by [`ContentProxy`](crate::ContentProxy).
//!
//! ## Example
//!
//! ```rust
//! use contentproxy::{Entry, Tag, User};
//!
//! let mut entry = Entry::new(User::new(1, "admin"));
//! assert!(entry.add_tag(Tag::new("rust")));
//! assert!(!entry.add_tag(Tag::new("rust")));
//! assert_eq!(entry.tags.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner of an entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct User {
    pub id: u64,
    pub username: String,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// A label attached to entries.
///
/// Tags are shared between entries and identified by their exact label. `id`
/// stays `None` until a [`TagRepository`](crate::TagRepository) has stored
/// the tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Option<u64>,
    pub label: String,
}

impl Tag {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
        }
    }

    pub fn with_id(id: u64, label: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            label: label.into(),
        }
    }
}

/// A saved web page.
///
/// ## Fields
///
/// Textual metadata that the fetch could not provide is `None` rather than an
/// empty string, so "unknown" stays distinguishable from "empty". `content` is
/// always sanitized HTML or the configured fetching-error message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Owner of the entry.
    pub user: User,

    /// Final URL of the page (after redirects when the fetcher reports them).
    pub url: String,

    /// Page title, empty when none could be found.
    pub title: String,

    /// Sanitized HTML content.
    pub content: String,

    /// Cover image URL.
    pub preview_picture: Option<String>,

    /// MIME type reported by the fetcher.
    pub mimetype: Option<String>,

    /// Content language reported by the fetcher.
    pub language: Option<String>,

    /// HTTP status reported by the fetcher, kept verbatim.
    pub http_status: Option<String>,

    /// Estimated reading time in whole minutes.
    pub reading_time: f64,

    /// Host part of `url`; `None` when the URL has no parseable host.
    pub domain_name: Option<String>,

    /// Tags in assignment order. Labels are unique.
    pub tags: Vec<Tag>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(user: User) -> Self {
        let now = Utc::now();
        Self {
            user,
            url: String::new(),
            title: String::new(),
            content: String::new(),
            preview_picture: None,
            mimetype: None,
            language: None,
            http_status: None,
            reading_time: 0.0,
            domain_name: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a tag unless one with the same label is already present.
    ///
    /// Returns `true` when the tag was added.
    pub fn add_tag(&mut self, tag: Tag) -> bool {
        if self.has_tag(&tag.label) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Whether a tag with exactly this label is attached.
    pub fn has_tag(&self, label: &str) -> bool {
        self.tags.iter().any(|t| t.label == label)
    }

    /// Labels of the attached tags, in order.
    pub fn tag_labels(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.label.as_str()).collect()
    }

    pub fn remove_tag(&mut self, label: &str) -> Option<Tag> {
        let pos = self.tags.iter().position(|t| t.label == label)?;
        Some(self.tags.remove(pos))
    }
}
