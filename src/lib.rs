//! # rs-fulltext
//!
//! Rule-driven article extraction for web pages.
//!
//! Given a page's raw bytes and an optional host-specific rule set, the
//! library works out the character encoding, pulls the title, body, authors,
//! date and other metadata out of the markup, cleans the body up, and can
//! follow a paginated article across pages into one document.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_fulltext::{process, ExtractionRuleSet, Options, PageInput};
//!
//! let rules = ExtractionRuleSet::from_json(r#"{
//!     "title": ["//h1[@class='headline']"],
//!     "body": ["//div[@class='story']"],
//!     "strip": ["//div[@class='share']"]
//! }"#)?;
//!
//! let html = br#"<html><head><title>Site | Story</title></head><body>
//!     <h1 class="headline">Story</h1>
//!     <div class="story"><p>First paragraph.</p><div class="share">Share</div></div>
//! </body></html>"#;
//!
//! let input = PageInput { bytes: html, content_type: None, url: Some("https://example.com/story") };
//! let result = process(&input, Some(&rules), &Options::default());
//!
//! assert!(result.success);
//! assert_eq!(result.title.as_deref(), Some("Story"));
//! assert_eq!(result.body_text().as_deref(), Some("First paragraph."));
//! # Ok::<(), rs_fulltext::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Encoding**: forced charset, header charset, byte-level detection,
//!   then the markup's own declaration ([`encoding`])
//! - **Metadata**: `<title>`, Open Graph and JSON-LD, merged by precedence
//!   ([`metadata`])
//! - **Rules**: title, native-ad clues, wrapping, stripping, body and
//!   pagination links from path expressions ([`rules`], [`path`])
//! - **Fallback**: a readability pass when no rule produced a body
//! - **Post-processing**: lazy images, absolute URLs, sanitizing
//!   ([`extractor::postprocess`], [`sanitize`])
//! - **Pagination**: single-page views and next-page chains ([`paging`])

mod error;
mod options;
mod result;

/// DOM operations adapter over `dom_query`.
pub mod dom;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Path expressions (CSS and an XPath subset) over the DOM.
pub mod path;

/// Host-specific extraction rules and the engine applying them.
pub mod rules;

/// Metadata extraction (basic tags, Open Graph, JSON-LD).
pub mod metadata;

/// Extraction pipeline, state, fallback and post-processing.
pub mod extractor;

/// HTML sanitizer for extracted bodies.
pub mod sanitize;

/// URL utilities for resolution and host lookup.
pub mod url_utils;

/// Page transport.
pub mod fetch;

/// Multi-page assembly.
pub mod paging;

// Public API - re-exports
pub use error::{Error, Result};
pub use extractor::{ExtractionState, Extractor, PageInput};
#[cfg(feature = "http")]
pub use fetch::ReqwestFetcher;
pub use fetch::{FetchResponse, Fetcher};
pub use options::Options;
pub use paging::Grabber;
pub use result::ExtractionResult;
pub use rules::{ExtractionRuleSet, LinkKind, RuleProvider, RuleRegistry};

/// Extracts an article from raw page bytes.
///
/// Never fails: stage errors are logged and the stage is skipped, so the
/// result may carry metadata without a body (`success == false`).
///
/// # Example
///
/// ```rust
/// use rs_fulltext::{process, Options, PageInput};
///
/// // ISO-8859-1 encoded HTML with a header charset
/// let input = PageInput {
///     bytes: b"<html><head><title>Caf\xE9</title></head><body></body></html>",
///     content_type: Some("text/html; charset=ISO-8859-1"),
///     url: None,
/// };
/// let result = process(&input, None, &Options::default());
/// assert_eq!(result.title.as_deref(), Some("Café"));
/// assert_eq!(result.encoding.as_deref(), Some("iso-8859-1"));
/// ```
#[must_use]
pub fn process(input: &PageInput<'_>, rules: Option<&ExtractionRuleSet>, options: &Options) -> ExtractionResult {
    Extractor::new(options.clone()).process(input, rules)
}

/// Extracts an article from already-decoded page text.
///
/// `url` is used to resolve relative links and image sources.
#[must_use]
pub fn process_text(
    text: &str,
    url: Option<&str>,
    rules: Option<&ExtractionRuleSet>,
    options: &Options,
) -> ExtractionResult {
    Extractor::new(options.clone()).process_text(text, url, rules)
}
