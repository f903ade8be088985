//! Host to rule-set lookup.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::set::ExtractionRuleSet;

/// Supplies the rule set for a host, if there is one.
pub trait RuleProvider {
    /// Rule set for `host` (a bare hostname, no scheme or port).
    fn rules_for_host(&self, host: &str) -> Option<&ExtractionRuleSet>;
}

/// In-memory rule sets keyed by host.
///
/// Lookup tries the exact host, then the host without a leading `www.`,
/// then every parent domain registered with a leading dot
/// (`.example.com` covers `news.example.com`).
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    map: HashMap<String, ExtractionRuleSet>,
}

impl RuleRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule set for a host key.
    pub fn register(&mut self, host: &str, rules: ExtractionRuleSet) {
        self.map.insert(host.trim().to_ascii_lowercase(), rules);
    }

    /// Build a registry from a JSON object mapping host keys to rule sets.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: HashMap<String, ExtractionRuleSet> =
            serde_json::from_str(json).map_err(|e| Error::RuleSet(e.to_string()))?;
        let mut registry = Self::new();
        for (host, rules) in map {
            registry.register(&host, rules);
        }
        Ok(registry)
    }

    /// Returns the number of registered host keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no rule sets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl RuleProvider for RuleRegistry {
    fn rules_for_host(&self, host: &str) -> Option<&ExtractionRuleSet> {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();

        if let Some(rules) = self.map.get(&host) {
            return Some(rules);
        }

        let bare = host.strip_prefix("www.").unwrap_or(&host);
        if let Some(rules) = self.map.get(bare) {
            return Some(rules);
        }

        // Walk up the labels: .a.b.c, .b.c, .c
        let mut rest = bare;
        loop {
            if let Some(rules) = self.map.get(&format!(".{rest}")) {
                return Some(rules);
            }
            match rest.split_once('.') {
                Some((_, parent)) if !parent.is_empty() => rest = parent,
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(title: &str) -> ExtractionRuleSet {
        ExtractionRuleSet {
            title: vec![title.to_string()],
            ..ExtractionRuleSet::default()
        }
    }

    #[test]
    fn exact_and_www_lookup() {
        let mut registry = RuleRegistry::new();
        registry.register("example.com", named("exact"));

        assert_eq!(registry.rules_for_host("example.com").unwrap().title, ["exact"]);
        assert_eq!(registry.rules_for_host("WWW.Example.com").unwrap().title, ["exact"]);
        assert!(registry.rules_for_host("other.com").is_none());
    }

    #[test]
    fn wildcard_parent_domain() {
        let mut registry = RuleRegistry::new();
        registry.register(".example.com", named("wildcard"));
        registry.register("blog.example.com", named("blog"));

        assert_eq!(registry.rules_for_host("news.example.com").unwrap().title, ["wildcard"]);
        assert_eq!(registry.rules_for_host("a.b.example.com").unwrap().title, ["wildcard"]);
        assert_eq!(registry.rules_for_host("blog.example.com").unwrap().title, ["blog"]);
        assert!(registry.rules_for_host("example.org").is_none());
    }

    #[test]
    fn loads_from_json() {
        let registry = RuleRegistry::from_json(
            r#"{"example.com": {"body": ["//article"]}, ".news.org": {"title": ["//h1"]}}"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.rules_for_host("example.com").unwrap().body, ["//article"]);
        assert!(registry.rules_for_host("www.news.org").is_some());
    }
}
