//! The bag of page data a fetcher hands to the proxy.
//!
//! Every field is optional: fetchers report what they found and nothing more.
//! The JSON form mirrors what fetchers and import files produce, where a
//! missing value is often written as `false`:
//!
//! ```rust
//! use contentproxy::FetchResult;
//!
//! let json = r#"{
//!     "html": false,
//!     "title": "",
//!     "url": "",
//!     "open_graph": { "og_title": "my title", "og_image": false }
//! }"#;
//! let result: FetchResult = serde_json::from_str(json).unwrap();
//! assert!(result.html.is_none());
//! assert_eq!(result.og_title(), Some("my title"));
//! assert!(result.og_image().is_none());
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Open Graph values found in the page head.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenGraph {
    #[serde(default, deserialize_with = "string_or_false")]
    pub og_title: Option<String>,
    #[serde(default, deserialize_with = "string_or_false")]
    pub og_description: Option<String>,
    #[serde(default, deserialize_with = "string_or_false")]
    pub og_image: Option<String>,
}

/// Raw result of fetching one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchResult {
    /// Extracted article HTML. `None` when extraction failed.
    #[serde(default, deserialize_with = "string_or_false")]
    pub html: Option<String>,
    #[serde(default, deserialize_with = "string_or_false")]
    pub title: Option<String>,
    /// Final URL after redirects.
    #[serde(default, deserialize_with = "string_or_false")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "string_or_false")]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_false")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "string_or_false")]
    pub status: Option<String>,
    #[serde(default)]
    pub open_graph: Option<OpenGraph>,
}

impl FetchResult {
    /// True when every field an entry is built from is present.
    /// Present-but-empty values count.
    pub fn is_complete(&self) -> bool {
        self.html.is_some()
            && self.title.is_some()
            && self.url.is_some()
            && self.language.is_some()
            && self.content_type.is_some()
    }

    pub fn html(&self) -> Option<&str> {
        non_empty(self.html.as_deref())
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    pub fn content_type(&self) -> Option<&str> {
        non_empty(self.content_type.as_deref())
    }

    pub fn language(&self) -> Option<&str> {
        non_empty(self.language.as_deref())
    }

    pub fn status(&self) -> Option<&str> {
        non_empty(self.status.as_deref())
    }

    pub fn og_title(&self) -> Option<&str> {
        non_empty(self.open_graph.as_ref()?.og_title.as_deref())
    }

    pub fn og_description(&self) -> Option<&str> {
        non_empty(self.open_graph.as_ref()?.og_description.as_deref())
    }

    pub fn og_image(&self) -> Option<&str> {
        non_empty(self.open_graph.as_ref()?.og_image.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Accepts a string, `null`, `false`, or a number (statuses are sometimes
/// numeric). `true` is treated like a missing value.
fn string_or_false<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Flag(#[allow(dead_code)] bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Number(n)) => Some(n.to_string()),
        Some(Raw::Flag(_)) | None => None,
    })
}
