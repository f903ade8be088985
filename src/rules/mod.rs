//! Host-specific extraction rules.
//!
//! A rule set tells the engine where a site keeps its title, body and
//! pagination links, and what to strip or wrap first. Rule sets come from a
//! [`RuleProvider`]; [`RuleRegistry`] is the in-memory one.

pub mod apply;
pub mod registry;
pub mod set;

pub use apply::{apply_find_replace, apply_rules, find_page_link, WRAP_TAGS};
pub use registry::{RuleProvider, RuleRegistry};
pub use set::{ExtractionRuleSet, LinkKind};
