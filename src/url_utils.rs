//! URL Utility Functions
//!
//! Resolution of relative references found in page markup, plus the small
//! host helpers rule lookup needs.

use url::Url;

/// Check if a string is an absolute URL (it parses and carries a scheme).
#[must_use]
pub fn is_absolute_url(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && Url::parse(s).is_ok()
}

/// References left untouched by resolution: fragments, `javascript:` and
/// protocol-relative URLs.
#[must_use]
pub fn should_skip(s: &str) -> bool {
    let s = s.trim();
    s.starts_with('#')
        || s.starts_with("//")
        || s.get(..11).is_some_and(|p| p.eq_ignore_ascii_case("javascript:"))
}

/// Convert a relative or absolute URL to absolute form.
///
/// Absolute and skipped references come back unchanged (trimmed); so does
/// anything the base cannot resolve.
#[must_use]
pub fn create_absolute_url(url_str: &str, base: &Url) -> String {
    let url_str = url_str.trim();

    if url_str.is_empty() || should_skip(url_str) || is_absolute_url(url_str) {
        return url_str.to_string();
    }

    match base.join(url_str) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => url_str.to_string(),
    }
}

/// Resolve every candidate URL of a `srcset` value, keeping descriptors.
///
/// # Examples
/// ```
/// use rs_fulltext::url_utils::resolve_srcset;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/a/").unwrap();
/// assert_eq!(
///     resolve_srcset("img.jpg 1x, /big.jpg 2x", &base),
///     "https://example.com/a/img.jpg 1x, https://example.com/big.jpg 2x"
/// );
/// ```
#[must_use]
pub fn resolve_srcset(srcset: &str, base: &Url) -> String {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(|candidate| match candidate.split_once(char::is_whitespace) {
            Some((url, descriptor)) => {
                format!("{} {}", create_absolute_url(url, base), descriptor.trim())
            }
            None => create_absolute_url(candidate, base),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse an absolute http(s) URL.
#[must_use]
pub fn parse_url(url_str: &str) -> Option<Url> {
    let url = Url::parse(url_str.trim()).ok()?;
    (matches!(url.scheme(), "http" | "https") && url.host().is_some()).then_some(url)
}

/// Resolve `reference` against `base` into an http(s) URL.
#[must_use]
pub fn resolve_url(reference: &str, base: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    let url = base.join(reference).ok()?;
    (matches!(url.scheme(), "http" | "https") && url.host().is_some()).then_some(url)
}

/// Extract the lowercase hostname of a URL.
#[must_use]
pub fn extract_hostname(url: &Url) -> Option<String> {
    url.host_str().map(str::to_ascii_lowercase)
}

/// Key identifying a page for cycle detection: the URL without its fragment.
#[must_use]
pub fn visit_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/news/story.html").unwrap()
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://example.com/path"));
        assert!(is_absolute_url("mailto:someone@example.com"));
        assert!(!is_absolute_url("/relative/path"));
        assert!(!is_absolute_url("example.com"));
        assert!(!is_absolute_url(""));
    }

    #[test]
    fn test_create_absolute_url() {
        assert_eq!(create_absolute_url("img/a.png", &base()), "https://example.com/news/img/a.png");
        assert_eq!(create_absolute_url("/a.png", &base()), "https://example.com/a.png");
        assert_eq!(create_absolute_url("../a.png", &base()), "https://example.com/a.png");
        assert_eq!(create_absolute_url("https://cdn.test/x.png", &base()), "https://cdn.test/x.png");
    }

    #[test]
    fn test_skipped_references() {
        assert_eq!(create_absolute_url("#top", &base()), "#top");
        assert_eq!(create_absolute_url("javascript:void(0)", &base()), "javascript:void(0)");
        assert_eq!(create_absolute_url("//cdn.test/x.png", &base()), "//cdn.test/x.png");
        assert_eq!(create_absolute_url("data:image/gif;base64,R0l", &base()), "data:image/gif;base64,R0l");
    }

    #[test]
    fn test_parse_and_resolve() {
        assert!(parse_url("https://example.com/").is_some());
        assert!(parse_url("ftp://example.com/").is_none());
        assert!(parse_url("not a url").is_none());

        let next = resolve_url("?page=2", &base()).unwrap();
        assert_eq!(next.as_str(), "https://example.com/news/story.html?page=2");
        assert!(resolve_url("mailto:x@example.com", &base()).is_none());
        assert!(resolve_url("  ", &base()).is_none());
    }

    #[test]
    fn test_visit_key_drops_fragment() {
        let a = Url::parse("https://example.com/p#one").unwrap();
        let b = Url::parse("https://example.com/p#two").unwrap();
        assert_eq!(visit_key(&a), visit_key(&b));
    }

    #[test]
    fn test_extract_hostname() {
        let url = Url::parse("https://News.Example.com:8080/x").unwrap();
        assert_eq!(extract_hostname(&url).as_deref(), Some("news.example.com"));
    }
}
