//! Automatic tagging.

use crate::entry::Entry;
use crate::error::Result;
use crate::options::TaggingRule;
use crate::rules::Rule;
use tracing::debug;

/// Suggests tag labels for a freshly normalized entry.
pub trait Tagger: Send + Sync {
    fn tag(&self, entry: &Entry) -> Result<Vec<String>>;
}

/// Tagger that never suggests anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTagger;

impl Tagger for NoopTagger {
    fn tag(&self, _entry: &Entry) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Applies [`TaggingRule`]s: every matching rule contributes its tags.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedTagger {
    rules: Vec<(Rule, Vec<String>)>,
}

impl RuleBasedTagger {
    /// Compile `rules`. Fails on the first rule that does not parse.
    pub fn new(rules: &[TaggingRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|r| -> Result<(Rule, Vec<String>)> {
                Ok((Rule::parse(&r.rule)?, r.tags.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Tagger for RuleBasedTagger {
    fn tag(&self, entry: &Entry) -> Result<Vec<String>> {
        let mut labels: Vec<String> = Vec::new();
        for (rule, tags) in &self.rules {
            if !rule.matches(entry)? {
                continue;
            }
            debug!(rule = rule.source(), url = %entry.url, "tagging rule matched");
            for tag in tags {
                if !labels.contains(tag) {
                    labels.push(tag.clone());
                }
            }
        }
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::User;
    use crate::error::{ProxyError, RuleError};

    fn entry() -> Entry {
        let mut entry = Entry::new(User::new(1, "admin"));
        entry.domain_name = Some("github.com".into());
        entry.reading_time = 2.0;
        entry
    }

    #[test]
    fn test_matching_rules_in_order() {
        let tagger = RuleBasedTagger::new(&[
            TaggingRule::new(r#"domainName = "github.com""#, ["git", "code"]),
            TaggingRule::new("readingTime > 30", ["long"]),
            TaggingRule::new("readingTime <= 3", ["short", "code"]),
        ])
        .unwrap();
        assert_eq!(tagger.len(), 3);
        assert_eq!(tagger.tag(&entry()).unwrap(), vec!["git", "code", "short"]);
    }

    #[test]
    fn test_invalid_rule_is_rejected() {
        let err = RuleBasedTagger::new(&[TaggingRule::new("nonsense ===", ["x"])]).unwrap_err();
        assert!(matches!(err, ProxyError::Rule(_)));
    }

    #[test]
    fn test_evaluation_error_propagates() {
        let tagger = RuleBasedTagger::new(&[TaggingRule::new("title > 1", ["x"])]).unwrap();
        let err = tagger.tag(&entry()).unwrap_err();
        assert!(matches!(err, ProxyError::Rule(RuleError::TypeMismatch { .. })));
    }

    #[test]
    fn test_noop() {
        assert!(NoopTagger.tag(&entry()).unwrap().is_empty());
        assert!(RuleBasedTagger::default().is_empty());
    }
}
