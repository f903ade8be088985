//! Rule set data model.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of pagination link a rule set can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// Link to the next page of a paginated article.
    #[serde(rename = "next_page_link")]
    NextPage,
    /// Link to a view serving the whole article on one page.
    #[serde(rename = "single_page_link")]
    SinglePage,
}

/// Extraction rules for one host.
///
/// Every list is ordered: expressions are tried first to last.
///
/// # Example
///
/// ```rust
/// use rs_fulltext::rules::{ExtractionRuleSet, LinkKind};
///
/// let rules = ExtractionRuleSet::from_json(r#"{
///     "title": ["//h1[@class='headline']"],
///     "body": ["//div[@id='story']"],
///     "strip": ["//div[@class='share']"],
///     "next_page_link": ["//a[@rel='next']"],
///     "if_page_contains": {
///         "next_page_link": { "//a[@rel='next']": "//div[@class='pager']" }
///     }
/// }"#)?;
///
/// assert_eq!(rules.gate(LinkKind::NextPage, "//a[@rel='next']"), Some("//div[@class='pager']"));
/// # Ok::<(), rs_fulltext::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRuleSet {
    /// Expressions locating the title.
    pub title: Vec<String>,

    /// Expressions locating the article body.
    pub body: Vec<String>,

    /// Expressions whose matches are removed before body extraction.
    pub strip: Vec<String>,

    /// Expressions whose match marks the page as sponsored content.
    pub native_ad_clue: Vec<String>,

    /// Expressions locating the next-page link.
    pub next_page_link: Vec<String>,

    /// Expressions locating the single-page-view link.
    pub single_page_link: Vec<String>,

    /// Wrap tag to the expression whose matches get wrapped in it.
    pub wrap_in: BTreeMap<String, String>,

    /// Literal strings replaced in the raw HTML before parsing.
    pub find_string: Vec<String>,

    /// Replacements for `find_string`, paired by index.
    pub replace_string: Vec<String>,

    /// Gates for link patterns: a pattern is only tried when its gate
    /// expression matches something on the page.
    pub if_page_contains: HashMap<LinkKind, BTreeMap<String, String>>,

    /// Extra request headers for this host.
    pub http_headers: BTreeMap<String, String>,
}

impl ExtractionRuleSet {
    /// Decode a rule set from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::RuleSet(e.to_string()))
    }

    /// Patterns configured for a link kind.
    #[must_use]
    pub fn links(&self, kind: LinkKind) -> &[String] {
        match kind {
            LinkKind::NextPage => &self.next_page_link,
            LinkKind::SinglePage => &self.single_page_link,
        }
    }

    /// Gate expression for a link pattern, if one is configured.
    #[must_use]
    pub fn gate(&self, kind: LinkKind, pattern: &str) -> Option<&str> {
        self.if_page_contains
            .get(&kind)
            .and_then(|gates| gates.get(pattern))
            .map(String::as_str)
    }

    /// Find/replace pairs; a missing replacement is the empty string.
    pub fn replacements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.find_string.iter().enumerate().map(|(i, find)| {
            let replace = self.replace_string.get(i).map_or("", String::as_str);
            (find.as_str(), replace)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_replacements_default_to_empty() {
        let rules = ExtractionRuleSet {
            find_string: vec!["a".into(), "b".into()],
            replace_string: vec!["x".into()],
            ..ExtractionRuleSet::default()
        };
        let pairs: Vec<_> = rules.replacements().collect();
        assert_eq!(pairs, vec![("a", "x"), ("b", "")]);
    }

    #[test]
    fn links_by_kind() {
        let rules = ExtractionRuleSet {
            next_page_link: vec!["//a[@rel='next']".into()],
            single_page_link: vec!["//a[@class='all']".into()],
            ..ExtractionRuleSet::default()
        };
        assert_eq!(rules.links(LinkKind::NextPage), ["//a[@rel='next']"]);
        assert_eq!(rules.links(LinkKind::SinglePage), ["//a[@class='all']"]);
        assert_eq!(rules.gate(LinkKind::NextPage, "//a[@rel='next']"), None);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ExtractionRuleSet::from_json(r#"{"title": "not a list"}"#),
            Err(Error::RuleSet(_))
        ));
    }
}
