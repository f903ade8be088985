//! Error types for rs-fulltext.
//!
//! Most of these never escape [`crate::process`]: the extraction pipeline logs
//! them and carries on. Transport failures are the exception and propagate out
//! of the multi-page assembler.

/// Error type for extraction operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A path expression could not be compiled or evaluated.
    #[error("Invalid path expression '{0}'")]
    InvalidPath(String),

    /// The sanitizer could not be initialised or failed on its input.
    #[error("Sanitizer failed: {0}")]
    Sanitizer(String),

    /// The transport layer failed to fetch a page.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The fetched resource is not an HTML document.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A rule set could not be decoded.
    #[error("Invalid rule set: {0}")]
    RuleSet(String),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
