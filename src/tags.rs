//! Tag assignment.
//!
//! [`assign_tags`] attaches labels to an entry, reusing tags the caller
//! already holds or that the [`TagRepository`] knows, and creating unsaved
//! [`Tag`]s for the rest. Nothing is persisted here.
//!
//! ## Example
//!
//! ```rust
//! use contentproxy::{assign_tags, Entry, InMemoryTagRepository, User};
//!
//! let repo = InMemoryTagRepository::new();
//! let mut entry = Entry::new(User::new(1, "admin"));
//!
//! assign_tags(&repo, &mut entry, "tag1,  tag2 ,", &[]).unwrap();
//! assign_tags(&repo, &mut entry, vec!["tag2", "tag3"], &[]).unwrap();
//!
//! assert_eq!(entry.tag_labels(), vec!["tag1", "tag2", "tag3"]);
//! ```

use crate::entry::{Entry, Tag};
use crate::error::{ProxyError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Labels to assign, either as one comma-separated string or as a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSpec {
    Delimited(String),
    List(Vec<String>),
}

impl TagSpec {
    /// Trimmed, non-empty labels in order.
    pub fn labels(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            TagSpec::Delimited(s) => s.split(',').collect(),
            TagSpec::List(items) => items.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<&str> for TagSpec {
    fn from(s: &str) -> Self {
        TagSpec::Delimited(s.to_string())
    }
}

impl From<String> for TagSpec {
    fn from(s: String) -> Self {
        TagSpec::Delimited(s)
    }
}

impl From<Vec<String>> for TagSpec {
    fn from(items: Vec<String>) -> Self {
        TagSpec::List(items)
    }
}

impl From<Vec<&str>> for TagSpec {
    fn from(items: Vec<&str>) -> Self {
        TagSpec::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for TagSpec {
    fn from(items: &[&str]) -> Self {
        TagSpec::List(items.iter().map(|s| s.to_string()).collect())
    }
}

/// Tag vocabulary lookup.
pub trait TagRepository: Send + Sync {
    /// The stored tag with exactly this label, if any.
    fn find_one_by_label(&self, label: &str) -> Result<Option<Tag>>;

    /// Store a tag, assigning an id when it has none. Saving a label twice
    /// returns the first stored tag.
    fn save(&self, tag: Tag) -> Result<Tag>;

    /// The stored tag for `label`, else a new unsaved one. Never persists.
    ///
    /// An unsaved tag has no id, so two calls with the same unknown label
    /// return equal tags; identity is the label until someone saves it.
    fn find_or_create(&self, label: &str) -> Result<Tag> {
        Ok(self
            .find_one_by_label(label)?
            .unwrap_or_else(|| Tag::new(label)))
    }
}

/// Thread-safe in-memory tag vocabulary.
#[derive(Debug, Default)]
pub struct InMemoryTagRepository {
    inner: RwLock<Vocabulary>,
}

#[derive(Debug, Default)]
struct Vocabulary {
    by_label: HashMap<String, Tag>,
    next_id: u64,
}

impl InMemoryTagRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with saved tags for `labels`.
    pub fn with_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let repo = Self::new();
        for label in labels {
            repo.save(Tag::new(label))?;
        }
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|v| v.by_label.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TagRepository for InMemoryTagRepository {
    fn find_one_by_label(&self, label: &str) -> Result<Option<Tag>> {
        let vocabulary = self
            .inner
            .read()
            .map_err(|e| ProxyError::TagRepository(e.to_string()))?;
        Ok(vocabulary.by_label.get(label).cloned())
    }

    fn save(&self, tag: Tag) -> Result<Tag> {
        let mut vocabulary = self
            .inner
            .write()
            .map_err(|e| ProxyError::TagRepository(e.to_string()))?;
        if let Some(existing) = vocabulary.by_label.get(&tag.label) {
            return Ok(existing.clone());
        }
        vocabulary.next_id += 1;
        let stored = Tag {
            id: Some(tag.id.unwrap_or(vocabulary.next_id)),
            label: tag.label,
        };
        vocabulary
            .by_label
            .insert(stored.label.clone(), stored.clone());
        Ok(stored)
    }
}

/// Attach the labels of `spec` to `entry`.
///
/// Labels already on the entry are skipped. Each remaining label is resolved
/// from `preloaded` first, then through [`TagRepository::find_or_create`].
/// Returns the tags that were added, in order.
///
/// On a repository error the tags added so far stay on the entry.
pub fn assign_tags(
    repo: &dyn TagRepository,
    entry: &mut Entry,
    spec: impl Into<TagSpec>,
    preloaded: &[Tag],
) -> Result<Vec<Tag>> {
    let mut added = Vec::new();

    for label in spec.into().labels() {
        if entry.has_tag(&label) {
            continue;
        }

        let tag = match preloaded.iter().find(|t| t.label == label) {
            Some(tag) => tag.clone(),
            None => repo.find_or_create(&label)?,
        };

        if entry.add_tag(tag.clone()) {
            added.push(tag);
        }
    }

    Ok(added)
}
