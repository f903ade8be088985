//! Main content extraction module.
//!
//! # Module Structure
//!
//! - `state`: the per-page scratch record the stages fill in
//! - `fallback`: readability fallback used when no rule yields a body
//! - `postprocess`: lazy images, absolute URLs, sanitizing, date cleanup
//!
//! [`Extractor`] ties them together with the metadata and rule stages:
//!
//! ```text
//! bytes --encoding--> text --find/replace--> document
//!       --metadata--> --rules--> --fallback--> --postprocess--> result
//! ```
//!
//! No stage failure escapes [`Extractor::process`]: failures are logged and
//! the affected stage is skipped.

pub mod fallback;
pub mod postprocess;
pub mod state;

use std::borrow::Cow;

use tracing::debug;
use url::Url;

use crate::dom::{self, Container};
use crate::encoding::{self, CharsetDetector, EncodingDecision, HeuristicDetector};
use crate::metadata;
use crate::options::Options;
use crate::path::{DomPathEvaluator, PathEvaluator};
use crate::result::ExtractionResult;
use crate::rules::{self, ExtractionRuleSet, LinkKind};
use crate::sanitize::{DomSanitizer, Sanitizer};
use crate::url_utils::{self, create_absolute_url};

pub use fallback::{apply_fallback, default_fallback, NoFallback, ReadabilityArticle, ReadabilityFallback};
#[cfg(feature = "readability")]
pub use fallback::DomSmoothieFallback;
pub use postprocess::normalize_date;
pub use state::ExtractionState;

/// One page handed to the extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageInput<'a> {
    /// Raw response body.
    pub bytes: &'a [u8],
    /// `Content-Type` header value, if the transport had one.
    pub content_type: Option<&'a str>,
    /// Page URL, used to resolve relative references.
    pub url: Option<&'a str>,
}

/// Content extractor with its collaborators.
///
/// # Example
///
/// ```rust
/// use rs_fulltext::{Extractor, ExtractionRuleSet, Options};
///
/// let rules = ExtractionRuleSet {
///     body: vec!["//div[@id='story']".to_string()],
///     ..ExtractionRuleSet::default()
/// };
/// let html = r#"<html><head><title>Hi</title></head>
///     <body><div id="story"><p>Story text.</p></div></body></html>"#;
///
/// let result = Extractor::new(Options::default())
///     .process_text(html, Some("https://example.com/a"), Some(&rules));
///
/// assert!(result.success);
/// assert_eq!(result.title.as_deref(), Some("Hi"));
/// assert_eq!(result.body_text().as_deref(), Some("Story text."));
/// ```
pub struct Extractor {
    options: Options,
    evaluator: Box<dyn PathEvaluator + Send + Sync>,
    fallback: Box<dyn ReadabilityFallback + Send + Sync>,
    sanitizer: Box<dyn Sanitizer + Send + Sync>,
    detector: Box<dyn CharsetDetector + Send + Sync>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").field("options", &self.options).finish_non_exhaustive()
    }
}

impl Extractor {
    /// Extractor with the default collaborators.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            evaluator: Box::new(DomPathEvaluator),
            fallback: default_fallback(),
            sanitizer: Box::new(DomSanitizer),
            detector: Box::new(HeuristicDetector),
        }
    }

    /// Replace the path expression evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: impl PathEvaluator + Send + Sync + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Replace the readability fallback.
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl ReadabilityFallback + Send + Sync + 'static) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    /// Replace the sanitizer.
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + Send + Sync + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    /// Replace the charset detector.
    #[must_use]
    pub fn with_detector(mut self, detector: impl CharsetDetector + Send + Sync + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Options this extractor runs with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Resolve the encoding of raw bytes and transcode them.
    #[must_use]
    pub fn decode(&self, bytes: &[u8], content_type: Option<&str>) -> EncodingDecision {
        encoding::resolve_with(self.detector.as_ref(), bytes, content_type, &self.options)
    }

    /// Extract from raw bytes.
    #[must_use]
    pub fn process(&self, input: &PageInput<'_>, rules: Option<&ExtractionRuleSet>) -> ExtractionResult {
        let decision = self.decode(input.bytes, input.content_type);
        let mut result = self.process_text(&decision.text, input.url, rules);
        result.encoding = Some(decision.encoding);
        result
    }

    /// Extract from already-decoded text.
    #[must_use]
    pub fn process_text(&self, text: &str, url: Option<&str>, rules: Option<&ExtractionRuleSet>) -> ExtractionResult {
        let base = url.and_then(url_utils::parse_url);
        let html = prepare_markup(text, rules);
        let doc = dom::parse(&html);

        let mut state = ExtractionState::new();
        metadata::merge_metadata(&doc, &mut state);

        if let Some(rules) = rules {
            rules::apply_rules(&doc, rules, self.evaluator.as_ref(), &mut state);
        }

        if state.body.is_none() && self.options.use_readability_fallback {
            debug!("no body from rules, trying readability fallback");
            apply_fallback(self.fallback.as_ref(), &doc, url, &mut state);
        }

        self.finish(state, base.as_ref())
    }

    /// Find a pagination link in decoded page text, resolved against `base`.
    #[must_use]
    pub fn find_link(&self, text: &str, base: &Url, rules: &ExtractionRuleSet, kind: LinkKind) -> Option<Url> {
        if rules.links(kind).is_empty() {
            return None;
        }
        let html = prepare_markup(text, Some(rules));
        let doc = dom::parse(&html);
        let link = rules::find_page_link(&dom::document_root(&doc), rules, self.evaluator.as_ref(), kind)?;
        url_utils::resolve_url(&link, base)
    }

    fn finish(&self, state: ExtractionState, base: Option<&Url>) -> ExtractionResult {
        let (body, mut result) = state.into_result();

        result.body = body.map(|container| self.finish_body(&container, base));
        result.date = result.date.as_deref().map(normalize_date);

        if let Some(base) = base {
            let absolute = |link: String| create_absolute_url(&link, base);
            result.image = result.image.map(absolute);
            result.next_page_url = result.next_page_url.map(absolute);
            result.single_page_url = result.single_page_url.map(absolute);
        }

        result
    }

    fn finish_body(&self, container: &Container, base: Option<&Url>) -> String {
        let root = container.root();
        postprocess::fix_lazy_images(&root);
        if let Some(base) = base {
            postprocess::absolutize_urls(&root, base);
        }

        if self.options.sanitize {
            postprocess::sanitize_body(self.sanitizer.as_ref(), container)
        } else {
            container.html()
        }
    }
}

fn prepare_markup<'a>(text: &'a str, rules: Option<&ExtractionRuleSet>) -> Cow<'a, str> {
    match rules {
        Some(rules) => rules::apply_find_replace(text, rules),
        None => Cow::Borrowed(text),
    }
}
