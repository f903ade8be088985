//! Rule application engine.
//!
//! Runs one rule set over a parsed page, in a fixed order: title, native-ad
//! clues, wrapping, stripping, body, then the pagination links. Wrapping and
//! stripping mutate the document, so body expressions see the result.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::dom::{self, Container, Document, Selection};
use crate::extractor::ExtractionState;
use crate::path::{PathEvaluator, PathMatch};

use super::set::{ExtractionRuleSet, LinkKind};

/// Tags matched nodes may be wrapped in.
pub const WRAP_TAGS: &[&str] = &["blockquote", "p", "div"];

/// Apply the literal find/replace pairs to raw markup.
///
/// Empty find strings are ignored.
#[must_use]
pub fn apply_find_replace<'a>(html: &'a str, rules: &ExtractionRuleSet) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(html);
    for (find, replace) in rules.replacements() {
        if find.is_empty() || !out.contains(find) {
            continue;
        }
        out = Cow::Owned(out.replace(find, replace));
    }
    out
}

/// Apply `rules` to `doc`, recording what is found in `state`.
pub fn apply_rules(
    doc: &Document,
    rules: &ExtractionRuleSet,
    evaluator: &dyn PathEvaluator,
    state: &mut ExtractionState,
) {
    let root = dom::document_root(doc);

    if let Some(title) = find_title(&root, rules, evaluator) {
        state.title = Some(title);
    }

    if rules
        .native_ad_clue
        .iter()
        .any(|expr| !evaluate(evaluator, expr, &root).is_empty())
    {
        debug!("native ad clue matched");
        state.is_native_ad = true;
    }

    wrap_matches(&root, rules, evaluator);
    strip_matches(&root, rules, evaluator);

    if let Some(body) = find_body(&root, rules, evaluator) {
        state.body = Some(body);
    }

    state.next_page_url = find_page_link(&root, rules, evaluator, LinkKind::NextPage);
    state.single_page_url = find_page_link(&root, rules, evaluator, LinkKind::SinglePage);
}

/// Find a pagination link of the given kind.
///
/// Patterns are tried in order; a gated pattern is skipped unless its gate
/// matches. Within a pattern the first match yielding an `href`, a scalar
/// value, or non-empty text wins.
#[must_use]
pub fn find_page_link(
    root: &Selection,
    rules: &ExtractionRuleSet,
    evaluator: &dyn PathEvaluator,
    kind: LinkKind,
) -> Option<String> {
    for pattern in rules.links(kind) {
        if let Some(gate) = rules.gate(kind, pattern) {
            if evaluate(evaluator, gate, root).is_empty() {
                debug!(pattern = %pattern, gate = %gate, "link gate not satisfied");
                continue;
            }
        }

        for found in evaluate(evaluator, pattern, root) {
            let candidate = match &found {
                PathMatch::Node(sel) => dom::get_attribute(sel, "href")
                    .map(|href| href.trim().to_string())
                    .filter(|href| !href.is_empty())
                    .unwrap_or_else(|| found.text()),
                PathMatch::Value(_) => found.text(),
            };
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Text of the first match of the first title expression that matches at all.
fn find_title(root: &Selection, rules: &ExtractionRuleSet, evaluator: &dyn PathEvaluator) -> Option<String> {
    rules
        .title
        .iter()
        .find_map(|expr| evaluate(evaluator, expr, root).first().map(PathMatch::text))
}

fn wrap_matches(root: &Selection, rules: &ExtractionRuleSet, evaluator: &dyn PathEvaluator) {
    for (tag, expr) in &rules.wrap_in {
        let tag = tag.trim().to_ascii_lowercase();
        if !WRAP_TAGS.contains(&tag.as_str()) {
            warn!(tag = %tag, "refusing to wrap in a tag outside the whitelist");
            continue;
        }

        let nodes = node_matches(evaluator, expr, root);
        // Later nodes first, so nested matches are wrapped before their ancestors.
        for node in nodes.iter().rev() {
            dom::wrap(node, &tag);
        }
    }
}

fn strip_matches(root: &Selection, rules: &ExtractionRuleSet, evaluator: &dyn PathEvaluator) {
    for expr in &rules.strip {
        let nodes = node_matches(evaluator, expr, root);
        for node in nodes.iter().rev() {
            dom::remove(node);
        }
    }
}

fn find_body(root: &Selection, rules: &ExtractionRuleSet, evaluator: &dyn PathEvaluator) -> Option<Container> {
    rules.body.iter().find_map(|expr| {
        let nodes = node_matches(evaluator, expr, root);
        if nodes.is_empty() {
            return None;
        }
        debug!(expression = %expr, nodes = nodes.len(), "body rule matched");
        Some(Container::from_nodes(&nodes))
    })
}

fn node_matches<'a>(evaluator: &dyn PathEvaluator, expr: &str, root: &Selection<'a>) -> Vec<Selection<'a>> {
    evaluate(evaluator, expr, root)
        .into_iter()
        .filter_map(|m| match m {
            PathMatch::Node(sel) => Some(sel),
            PathMatch::Value(_) => None,
        })
        .collect()
}

/// Evaluate an expression; a failing expression counts as no match.
fn evaluate<'a>(evaluator: &dyn PathEvaluator, expr: &str, root: &Selection<'a>) -> Vec<PathMatch<'a>> {
    match evaluator.evaluate(expr, root) {
        Ok(matches) => matches,
        Err(err) => {
            warn!(expression = %expr, error = %err, "path expression failed");
            Vec::new()
        }
    }
}
