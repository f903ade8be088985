//! Readability fallback.
//!
//! When no rule produced a body, a general-purpose readability pass gets a
//! go at the prepared document. It only fills fields still empty.

use tracing::debug;

use crate::dom::{self, Container, Document};

use super::state::ExtractionState;

/// What a readability pass recovered from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadabilityArticle {
    /// Article title.
    pub title: Option<String>,
    /// Article body markup.
    pub content: Option<String>,
    /// Author line.
    pub byline: Option<String>,
    /// Publication time as found on the page.
    pub published_time: Option<String>,
}

/// A content-extraction heuristic used when rules find nothing.
pub trait ReadabilityFallback {
    /// Run over a copy of the document. `url` is the page URL when known.
    fn extract(&self, doc: Document, url: Option<&str>) -> Option<ReadabilityArticle>;
}

/// Fallback that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl ReadabilityFallback for NoFallback {
    fn extract(&self, _doc: Document, _url: Option<&str>) -> Option<ReadabilityArticle> {
        None
    }
}

/// Fallback backed by `dom_smoothie`.
#[cfg(feature = "readability")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DomSmoothieFallback;

#[cfg(feature = "readability")]
impl ReadabilityFallback for DomSmoothieFallback {
    fn extract(&self, doc: Document, url: Option<&str>) -> Option<ReadabilityArticle> {
        use dom_smoothie::Readability;

        let mut reader = match Readability::with_document(doc, url, None) {
            Ok(reader) => reader,
            Err(err) => {
                debug!(error = %err, "readability setup failed");
                return None;
            }
        };
        let article = match reader.parse() {
            Ok(article) => article,
            Err(err) => {
                debug!(error = %err, "readability found no article");
                return None;
            }
        };

        let non_empty = |s: String| {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        };
        Some(ReadabilityArticle {
            title: non_empty(article.title),
            content: non_empty(article.content.to_string()),
            byline: article.byline.and_then(non_empty),
            published_time: article.published_time.and_then(non_empty),
        })
    }
}

/// Fallback used when the caller does not pick one.
#[must_use]
pub fn default_fallback() -> Box<dyn ReadabilityFallback + Send + Sync> {
    #[cfg(feature = "readability")]
    {
        Box::new(DomSmoothieFallback)
    }
    #[cfg(not(feature = "readability"))]
    {
        Box::new(NoFallback)
    }
}

/// Run `fallback` on a copy of `doc` and fill the empty fields of `state`.
pub fn apply_fallback(
    fallback: &dyn ReadabilityFallback,
    doc: &Document,
    url: Option<&str>,
    state: &mut ExtractionState,
) {
    let Some(article) = fallback.extract(dom::clone_document(doc), url) else {
        return;
    };

    if state.body.is_none() {
        state.body = article.content.as_deref().map(Container::new);
    }
    if state.title.is_none() {
        state.title = article.title;
    }
    if state.date.is_none() {
        state.date = article.published_time;
    }
    if state.authors.is_empty() {
        if let Some(byline) = &article.byline {
            state.add_author(byline);
        }
    }
    debug!(found_body = state.body.is_some(), "readability fallback applied");
}
