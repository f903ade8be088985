//! Result types for extraction output.
//!
//! [`ExtractionResult`] is the only artifact handed back to callers. It is
//! returned even when no body was found, so partial metadata stays visible.

use serde::Serialize;

/// Result of extracting an article from a page (or a chain of pages).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Article title.
    pub title: Option<String>,

    /// Sanitized article body as HTML.
    pub body: Option<String>,

    /// Author names, in discovery order.
    pub authors: Vec<String>,

    /// Publication date, ISO-8601 with offset when it could be normalized.
    pub date: Option<String>,

    /// Document language as declared by the page.
    pub language: Option<String>,

    /// Lead image URL.
    pub image: Option<String>,

    /// Absolute URL of the next page of a paginated article.
    pub next_page_url: Option<String>,

    /// Absolute URL of the single-page view of the article.
    pub single_page_url: Option<String>,

    /// Whether the page matched a native-ad clue.
    pub is_native_ad: bool,

    /// Whether a body was produced, by the rules or by the fallback.
    pub success: bool,

    /// URL the caller asked for.
    pub original_url: Option<String>,

    /// URL after redirects (and after a single-page-view switch).
    pub final_url: Option<String>,

    /// HTTP status of the first page fetch.
    pub status: Option<u16>,

    /// Encoding the source bytes were decoded with.
    pub encoding: Option<String>,
}

impl ExtractionResult {
    /// Text content of the body, tags stripped.
    #[must_use]
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_deref()
            .map(|html| crate::dom::Container::new(html).text().trim().to_string())
    }
}
