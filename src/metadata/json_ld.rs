//! JSON-LD Metadata Parsing
//!
//! Reads `Article` / `NewsArticle` objects out of `application/ld+json`
//! script blocks. Objects are found at the top level, inside arrays and
//! `@graph` lists, and nested under other objects.

use dom_query::{Document, Selection};
use serde_json::{Map, Value};
use tracing::debug;

use crate::dom;
use crate::extractor::ExtractionState;

/// Merge every article object found in the document into `state`.
///
/// `headline` and `datePublished` overwrite when present; author names are
/// appended.
pub fn extract_json_ld(doc: &Document, state: &mut ExtractionState) {
    for article in decode_json_ld(doc) {
        if let Some(headline) = get_single_string_value(&article, "headline") {
            state.title = Some(headline);
        }
        if let Some(date) = get_single_string_value(&article, "datePublished") {
            state.date = Some(date);
        }
        if let Some(author) = article.get("author") {
            for name in get_author_names(author) {
                state.add_author(&name);
            }
        }
    }
}

/// Parse every JSON-LD block and collect the article objects in document order.
fn decode_json_ld(doc: &Document) -> Vec<Map<String, Value>> {
    let mut articles = Vec::new();

    for script in doc.select("script[type]").nodes() {
        let script_sel = Selection::from(*script);
        let is_json_ld = dom::get_attribute(&script_sel, "type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"));
        if !is_json_ld {
            continue;
        }

        let text = dom::text_content(&script_sel);
        let json_text = strip_wrappers(&text);
        if json_text.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(json_text) {
            Ok(data) => process_schema_value(&data, &mut articles),
            Err(err) => debug!(error = %err, "skipping malformed JSON-LD block"),
        }
    }

    articles
}

/// Trim whitespace and the comment or CDATA guards some sites wrap JSON in.
fn strip_wrappers(text: &str) -> &str {
    let mut text = text.trim();
    for (open, close) in [("<!--", "-->"), ("//<![CDATA[", "//]]>"), ("/*<![CDATA[*/", "/*]]>*/")] {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            text = inner.trim();
        }
    }
    text
}

fn process_schema_value(value: &Value, articles: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Object(map) => {
            if is_article_type(map) {
                articles.push(map.clone());
            }
            for (key, val) in map {
                if key != "author" {
                    process_schema_value(val, articles);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr {
                process_schema_value(item, articles);
            }
        }
        _ => {}
    }
}

fn is_article_type(map: &Map<String, Value>) -> bool {
    let is_article = |t: &str| matches!(t.trim(), "Article" | "NewsArticle");
    match map.get("@type") {
        Some(Value::String(t)) => is_article(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(is_article),
        _ => false,
    }
}

/// Author names from a string, a `{ "name": … }` object, or a list of either.
fn get_author_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => non_empty(s).into_iter().collect(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .and_then(non_empty)
            .into_iter()
            .collect(),
        Value::Array(arr) => arr.iter().flat_map(get_author_names).collect(),
        _ => Vec::new(),
    }
}

fn get_single_string_value(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => non_empty(s),
        Value::Array(arr) => arr.first().and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
