//! Extraction state tracking.
//!
//! `ExtractionState` is the scratch record one page's extraction fills in.
//! Metadata, rules and the fallback each write into it; the post-processor
//! turns it into an [`ExtractionResult`].

use crate::dom::Container;
use crate::result::ExtractionResult;

/// Mutable record of what has been found so far on one page.
#[derive(Debug, Default)]
pub struct ExtractionState {
    /// Article title.
    pub title: Option<String>,

    /// Detached copy of the article body.
    pub body: Option<Container>,

    /// Author names, in discovery order.
    pub authors: Vec<String>,

    /// Raw publication date, normalized during post-processing.
    pub date: Option<String>,

    /// Declared document language.
    pub language: Option<String>,

    /// Lead image URL.
    pub image: Option<String>,

    /// Next-page link as found on the page.
    pub next_page_url: Option<String>,

    /// Single-page-view link as found on the page.
    pub single_page_url: Option<String>,

    /// Set when a native-ad clue matched.
    pub is_native_ad: bool,
}

impl ExtractionState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an author unless it is blank or already known.
    pub fn add_author(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.authors.iter().any(|a| a == name) {
            return;
        }
        self.authors.push(name.to_string());
    }

    /// Move the metadata fields into a result; the body is handled by the caller.
    #[must_use]
    pub(crate) fn into_result(self) -> (Option<Container>, ExtractionResult) {
        let result = ExtractionResult {
            success: self.body.is_some(),
            title: self.title,
            authors: self.authors,
            date: self.date,
            language: self.language,
            image: self.image,
            next_page_url: self.next_page_url,
            single_page_url: self.single_page_url,
            is_native_ad: self.is_native_ad,
            ..ExtractionResult::default()
        };
        (self.body, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authors_are_deduplicated() {
        let mut state = ExtractionState::new();
        state.add_author("Jane Doe");
        state.add_author("  ");
        state.add_author(" Jane Doe ");
        state.add_author("John Roe");

        assert_eq!(state.authors, vec!["Jane Doe", "John Roe"]);
    }

    #[test]
    fn success_follows_body() {
        let (_, result) = ExtractionState::new().into_result();
        assert!(!result.success);

        let state = ExtractionState {
            body: Some(Container::new("<p>x</p>")),
            ..ExtractionState::default()
        };
        let (body, result) = state.into_result();
        assert!(result.success);
        assert!(body.is_some());
    }
}
