//! Multi-page assembly.
//!
//! [`Grabber`] fetches an article, switches to its single-page view when the
//! host's rules point at one, and otherwise follows next-page links,
//! concatenating the page bodies into one document.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::extractor::Extractor;
use crate::fetch::{FetchResponse, Fetcher};
use crate::options::Options;
use crate::result::ExtractionResult;
use crate::rules::{ExtractionRuleSet, LinkKind, RuleProvider};
use crate::url_utils;

/// Class of the element holding concatenated page bodies.
pub const PAGINATED_CLASS: &str = "paginated-article";

/// Fetch-extract-paginate driver.
///
/// # Example
///
/// ```rust,no_run
/// use rs_fulltext::{Grabber, Options, ReqwestFetcher, RuleRegistry};
///
/// # async fn run() -> rs_fulltext::Result<()> {
/// let grabber = Grabber::new(ReqwestFetcher::new()?, RuleRegistry::new(), Options::default());
/// let article = grabber.grab("https://example.com/story").await?;
/// println!("{:?}", article.title);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Grabber<F, R> {
    fetcher: F,
    rules: R,
    extractor: Extractor,
}

impl<F: Fetcher, R: RuleProvider> Grabber<F, R> {
    /// Grabber using the default extractor.
    #[must_use]
    pub fn new(fetcher: F, rules: R, options: Options) -> Self {
        Self::with_extractor(fetcher, rules, Extractor::new(options))
    }

    /// Grabber using a preconfigured extractor.
    #[must_use]
    pub fn with_extractor(fetcher: F, rules: R, extractor: Extractor) -> Self {
        Self { fetcher, rules, extractor }
    }

    /// The transport pages are fetched with.
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The extractor pages are run through.
    #[must_use]
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Fetch `url` and extract its article, across pages when needed.
    ///
    /// Only the first fetch can fail the call: transport errors and non-HTML
    /// content types are returned as errors. Later failures are logged and
    /// end pagination early.
    pub async fn grab(&self, url: &str) -> Result<ExtractionResult> {
        let start = url_utils::parse_url(url).ok_or_else(|| Error::InvalidUrl(url.to_string()))?;

        let response = self.fetch(&start).await?;
        if !response.is_html() {
            return Err(Error::UnsupportedContentType(
                response.content_type().unwrap_or_default().to_string(),
            ));
        }
        let status = response.status;
        let mut page_url = final_url(&response, &start);
        let mut response = response;

        if self.extractor.options().single_page_view {
            if let Some((single_url, single)) = self.single_page_view(&response, &page_url).await {
                info!(url = %single_url, "switched to single-page view");
                page_url = single_url;
                response = single;
            }
        }

        let mut first = self.extract_page(&response, &page_url);
        first.original_url = Some(url.to_string());
        first.final_url = Some(page_url.to_string());
        first.status = Some(status);

        if !self.extractor.options().multi_page || !first.success {
            return Ok(first);
        }

        let mut visited = HashSet::from([url_utils::visit_key(&start), url_utils::visit_key(&page_url)]);
        Ok(self.follow_pages(first, page_url, &mut visited).await)
    }

    /// Fetch the single-page view of the current page, if the rules name one.
    async fn single_page_view(&self, response: &FetchResponse, page_url: &Url) -> Option<(Url, FetchResponse)> {
        let rules = self.rules_for(page_url)?;
        let link = {
            let decision = self.extractor.decode(&response.body, response.content_type());
            self.extractor.find_link(&decision.text, page_url, rules, LinkKind::SinglePage)?
        };
        if url_utils::visit_key(&link) == url_utils::visit_key(page_url) {
            return None;
        }

        match self.fetch(&link).await {
            Ok(single) if !single.body.is_empty() => {
                let single_url = final_url(&single, &link);
                Some((single_url, single))
            }
            Ok(_) => {
                warn!(url = %link, "single-page view was empty, keeping original page");
                None
            }
            Err(err) => {
                warn!(url = %link, error = %err, "single-page view fetch failed, keeping original page");
                None
            }
        }
    }

    async fn follow_pages(
        &self,
        mut first: ExtractionResult,
        first_url: Url,
        visited: &mut HashSet<String>,
    ) -> ExtractionResult {
        let max_pages = self.extractor.options().max_pages.max(1);
        let mut bodies: Vec<String> = first.body.iter().cloned().collect();
        let mut current = first_url;
        let mut next = first.next_page_url.clone();
        let mut failed_at: Option<Url> = None;

        while let Some(link) = next.take() {
            if bodies.len() >= max_pages {
                debug!(max_pages, "page limit reached");
                next = Some(link);
                break;
            }
            let Some(page_url) = url_utils::resolve_url(&link, &current) else {
                debug!(link = %link, "unusable next-page link");
                break;
            };
            if !visited.insert(url_utils::visit_key(&page_url)) {
                debug!(url = %page_url, "next-page link already visited");
                break;
            }

            let response = match self.fetch(&page_url).await {
                Ok(response) if !response.body.is_empty() => response,
                Ok(_) => {
                    warn!(url = %page_url, "continuation page was empty");
                    failed_at = Some(page_url);
                    break;
                }
                Err(err) => {
                    warn!(url = %page_url, error = %err, "continuation page fetch failed");
                    failed_at = Some(page_url);
                    break;
                }
            };

            let landed = final_url(&response, &page_url);
            visited.insert(url_utils::visit_key(&landed));

            let page = self.extract_page(&response, &landed);
            match page.body {
                Some(body) if page.success => bodies.push(body),
                _ => {
                    warn!(url = %landed, "no article body on continuation page");
                    failed_at = Some(landed);
                    break;
                }
            }
            debug!(url = %landed, pages = bodies.len(), "appended continuation page");
            next = page.next_page_url;
            current = landed;
        }

        if bodies.len() <= 1 && failed_at.is_none() {
            return first;
        }

        info!(pages = bodies.len(), "assembled multi-page article");
        first.body = Some(combine_pages(&bodies, failed_at.as_ref()));
        first.next_page_url = next;
        first
    }

    fn extract_page(&self, response: &FetchResponse, url: &Url) -> ExtractionResult {
        let rules = self.rules_for(url);
        let decision = self.extractor.decode(&response.body, response.content_type());
        let mut result = self.extractor.process_text(&decision.text, Some(url.as_str()), rules);
        result.encoding = Some(decision.encoding);
        result
    }

    async fn fetch(&self, url: &Url) -> Result<FetchResponse> {
        let headers = self
            .rules_for(url)
            .map(|rules| rules.http_headers.clone())
            .unwrap_or_default();
        self.fetcher.fetch(url.as_str(), &headers).await
    }

    fn rules_for(&self, url: &Url) -> Option<&ExtractionRuleSet> {
        let host = url_utils::extract_hostname(url)?;
        self.rules.rules_for_host(&host)
    }
}

fn final_url(response: &FetchResponse, requested: &Url) -> Url {
    url_utils::parse_url(&response.final_url).unwrap_or_else(|| requested.clone())
}

/// Markup appended when a continuation page could not be extracted.
#[must_use]
pub fn continuation_notice(url: &Url) -> String {
    format!(
        "<p class=\"continuation-notice\"><em>Could not extract the continuation of this article.</em> <a href=\"{}\">Continue reading</a></p>",
        escape_attribute(url.as_str())
    )
}

/// Concatenate page bodies, plus the continuation notice when a page failed.
#[must_use]
pub fn combine_pages(bodies: &[String], failed_at: Option<&Url>) -> String {
    let mut out = format!("<div class=\"{PAGINATED_CLASS}\">");
    for body in bodies {
        out.push_str(body);
    }
    if let Some(url) = failed_at {
        out.push_str(&continuation_notice(url));
    }
    out.push_str("</div>");
    out
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}
