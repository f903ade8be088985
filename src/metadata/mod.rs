//! Metadata extraction module.
//!
//! Merges the page-level metadata signals into an [`ExtractionState`], lowest
//! precedence first so later sources overwrite earlier ones:
//!
//! 1. basic: `<title>` and `<html lang>`
//! 2. Open Graph / article meta tags
//! 3. JSON-LD `Article` / `NewsArticle` blocks
//!
//! Rule-set title expressions run after this and win over all of them.

pub mod json_ld;
pub mod meta_tags;

use dom_query::Document;

use crate::extractor::ExtractionState;

pub use json_ld::extract_json_ld;
pub use meta_tags::{examine_basic, examine_open_graph};

/// Run every metadata source over `doc`, in precedence order.
pub fn merge_metadata(doc: &Document, state: &mut ExtractionState) {
    examine_basic(doc, state);
    examine_open_graph(doc, state);
    extract_json_ld(doc, state);
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Basic Title</title>
            <meta property="og:title" content="OG Title">
            <meta property="article:published_time" content="2024-02-01">
            <script type="application/ld+json">
            {"@type": "Article", "headline": "LD Title", "author": {"name": "Ada"}}
            </script>
        </head>
        <body></body>
        </html>"#;

    #[test]
    fn later_sources_overwrite_earlier() {
        let doc = Document::from(PAGE);
        let mut state = ExtractionState::new();
        merge_metadata(&doc, &mut state);

        assert_eq!(state.title.as_deref(), Some("LD Title"));
        assert_eq!(state.date.as_deref(), Some("2024-02-01"));
        assert_eq!(state.language.as_deref(), Some("en"));
        assert_eq!(state.authors, vec!["Ada"]);
    }
}
