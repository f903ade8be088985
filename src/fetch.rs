//! Page transport.
//!
//! The [`Fetcher`] trait is all the assembler needs from the network. The
//! `http` feature provides [`ReqwestFetcher`]; tests plug in canned pages.

use std::collections::BTreeMap;
use std::future::Future;

use crate::error::Result;

/// Request or response headers, keyed by lowercase name.
pub type Headers = BTreeMap<String, String>;

/// A fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    /// URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keys lowercased.
    pub headers: Headers,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the body is markup worth extracting from.
    ///
    /// A missing content type counts as HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type().is_none_or(|ct| {
            let mime = ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase();
            mime.is_empty() || mime.contains("html") || mime == "application/xml" || mime == "text/xml"
        })
    }
}

/// Fetches pages over some transport.
pub trait Fetcher: Send + Sync {
    /// GET `url`, sending `headers` in addition to the transport defaults.
    ///
    /// Non-success statuses are returned, not raised.
    fn fetch(&self, url: &str, headers: &Headers) -> impl Future<Output = Result<FetchResponse>> + Send;
}

#[cfg(feature = "http")]
pub use reqwest_fetcher::ReqwestFetcher;

#[cfg(feature = "http")]
mod reqwest_fetcher {
    use std::time::Duration;

    use reqwest::redirect::Policy;
    use reqwest::Client;
    use tracing::debug;

    use super::{FetchResponse, Fetcher, Headers};
    use crate::error::{Error, Result};

    /// Default `User-Agent` header.
    pub const USER_AGENT: &str = concat!("rs-fulltext/", env!("CARGO_PKG_VERSION"));

    /// HTTP fetcher using reqwest.
    ///
    /// Follows up to ten redirects and decompresses gzip bodies.
    #[derive(Debug, Clone)]
    pub struct ReqwestFetcher {
        client: Client,
    }

    impl ReqwestFetcher {
        /// Fetcher with a 30 second timeout.
        pub fn new() -> Result<Self> {
            Self::with_timeout(Duration::from_secs(30))
        }

        /// Fetcher with a custom request timeout.
        pub fn with_timeout(timeout: Duration) -> Result<Self> {
            let client = Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .redirect(Policy::limited(10))
                .build()
                .map_err(|e| Error::Http(e.to_string()))?;

            Ok(Self { client })
        }

        /// Wrap an existing client.
        #[must_use]
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    impl Fetcher for ReqwestFetcher {
        async fn fetch(&self, url: &str, headers: &Headers) -> Result<FetchResponse> {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::Http(format!("GET {url}: {e}")))?;

            let final_url = response.url().to_string();
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
                })
                .collect();

            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Http(format!("failed to read body of {url}: {e}")))?
                .to_vec();

            debug!(url = %url, final_url = %final_url, status, bytes = body.len(), "fetched page");
            Ok(FetchResponse { final_url, status, headers, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_type(content_type: Option<&str>) -> FetchResponse {
        let mut headers = Headers::new();
        if let Some(ct) = content_type {
            headers.insert("content-type".to_string(), ct.to_string());
        }
        FetchResponse {
            headers,
            ..FetchResponse::default()
        }
    }

    #[test]
    fn html_detection() {
        assert!(with_type(None).is_html());
        assert!(with_type(Some("text/html; charset=utf-8")).is_html());
        assert!(with_type(Some("application/xhtml+xml")).is_html());
        assert!(!with_type(Some("application/pdf")).is_html());
        assert!(!with_type(Some("image/png")).is_html());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = with_type(Some("text/html"));
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.content_type(), Some("text/html"));
    }
}
