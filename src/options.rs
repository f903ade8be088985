//! Configuration options for extraction and page assembly.
//!
//! The `Options` struct controls encoding detection, post-processing and
//! pagination. It deserializes with every field optional, so an embedding
//! application can keep it in its own JSON or TOML configuration.

use serde::Deserialize;

/// Number of leading bytes inspected when detecting the source encoding.
pub const DEFAULT_DETECT_WINDOW: usize = 50_000;

/// Configuration options for content extraction.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use rs_fulltext::Options;
///
/// let options = Options {
///     sanitize: false,
///     max_pages: 3,
///     ..Options::default()
/// };
/// assert!(options.auto_detect_encoding);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    /// Detect the source encoding from the bytes and markup.
    ///
    /// When disabled, documents without a forced or header-declared charset
    /// are decoded as UTF-8.
    ///
    /// Default: `true`
    pub auto_detect_encoding: bool,

    /// Decode every document with this encoding, ignoring detection.
    ///
    /// The name still goes through the mistake-correction table.
    ///
    /// Default: `None`
    pub force_encoding: Option<String>,

    /// Run the extracted body through the sanitizer.
    ///
    /// Default: `true`
    pub sanitize: bool,

    /// Use the readability heuristic when no rule produced a body.
    ///
    /// Default: `true`
    pub use_readability_fallback: bool,

    /// Follow a rule set's single-page link before extracting.
    ///
    /// Default: `true`
    pub single_page_view: bool,

    /// Follow next-page links and stitch the pages together.
    ///
    /// Default: `true`
    pub multi_page: bool,

    /// Maximum number of pages assembled into one article, first page included.
    ///
    /// Default: `10`
    pub max_pages: usize,

    /// Number of leading bytes inspected by encoding detection.
    ///
    /// Default: `50000`
    pub detect_window: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_detect_encoding: true,
            force_encoding: None,
            sanitize: true,
            use_readability_fallback: true,
            single_page_view: true,
            multi_page: true,
            max_pages: 10,
            detect_window: DEFAULT_DETECT_WINDOW,
        }
    }
}
