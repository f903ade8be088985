//! Body post-processing.
//!
//! Runs over the detached body once extraction is done: lazy-loaded images
//! get their real sources back, relative references are made absolute, and
//! the markup goes through the sanitizer. Dates are normalized here too.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::dom::{self, Container, Selection};
use crate::sanitize::{Sanitizer, ALLOWED_ATTRIBUTES, ALLOWED_TAGS};
use crate::url_utils::{create_absolute_url, resolve_srcset};

/// Deferred-source attributes copied into `src`, first present wins.
pub const LAZY_SRC_ATTRIBUTES: &[&str] = &[
    "data-src",
    "data-lazy-src",
    "data-original",
    "data-orig-src",
    "data-url",
    "data-hi-res-src",
];

/// Deferred-source attributes copied into `srcset`, first present wins.
pub const LAZY_SRCSET_ATTRIBUTES: &[&str] = &["data-srcset", "data-lazy-srcset"];

#[allow(clippy::expect_used)]
static PLACEHOLDER_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^data:|(?:^|/)[^/]*(?:blank|spacer|pixel|placeholder|transparent|1x1|empty|gr[ae]y|lazy)[^/]*\.(?:gif|png)(?:[?#].*)?$)")
        .expect("valid regex")
});

/// (element selector, attribute) pairs holding a single URL.
const URL_ATTRIBUTES: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("img[src]", "src"),
    ("iframe[src]", "src"),
    ("source[src]", "src"),
    ("video[src]", "src"),
    ("audio[src]", "src"),
    ("video[poster]", "poster"),
];

/// Restore deferred image sources under `root`.
pub fn fix_lazy_images(root: &Selection) {
    for img in dom::elements(root, "img") {
        let had_deferred = LAZY_SRC_ATTRIBUTES
            .iter()
            .chain(LAZY_SRCSET_ATTRIBUTES)
            .any(|attr| dom::has_attribute(&img, attr));
        if !had_deferred {
            continue;
        }

        let src = first_present(&img, LAZY_SRC_ATTRIBUTES);
        let srcset = first_present(&img, LAZY_SRCSET_ATTRIBUTES);

        match &src {
            Some(src) => dom::set_attribute(&img, "src", src),
            None => {
                let placeholder = dom::get_attribute(&img, "src")
                    .is_some_and(|current| PLACEHOLDER_SRC_RE.is_match(current.trim()));
                if placeholder {
                    dom::remove_attribute(&img, "src");
                }
            }
        }
        if let Some(srcset) = &srcset {
            dom::set_attribute(&img, "srcset", srcset);
        }

        for attr in LAZY_SRC_ATTRIBUTES.iter().chain(LAZY_SRCSET_ATTRIBUTES) {
            dom::remove_attribute(&img, attr);
        }
    }
}

fn first_present(el: &Selection, attrs: &[&str]) -> Option<String> {
    attrs
        .iter()
        .filter_map(|attr| dom::get_attribute(el, attr))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Rewrite relative `href`/`src`/`srcset` references under `root` against `base`.
pub fn absolutize_urls(root: &Selection, base: &Url) {
    for (selector, attr) in URL_ATTRIBUTES {
        for el in dom::elements(root, selector) {
            if let Some(value) = dom::get_attribute(&el, attr) {
                let resolved = create_absolute_url(&value, base);
                if resolved != value {
                    dom::set_attribute(&el, attr, &resolved);
                }
            }
        }
    }

    for el in dom::elements(root, "img[srcset], source[srcset]") {
        if let Some(value) = dom::get_attribute(&el, "srcset") {
            dom::set_attribute(&el, "srcset", &resolve_srcset(&value, base));
        }
    }
}

/// Sanitize body markup; a sanitizer failure keeps the markup as is.
#[must_use]
pub fn sanitize_body(sanitizer: &dyn Sanitizer, body: &Container) -> String {
    match sanitizer.sanitize_container(body, ALLOWED_TAGS, ALLOWED_ATTRIBUTES) {
        Ok(clean) => clean,
        Err(err) => {
            warn!(error = %err, "sanitizer failed, keeping unsanitized body");
            body.html()
        }
    }
}

/// Normalize a date to `YYYY-MM-DDTHH:MM:SS` plus offset (`Z` for UTC).
///
/// Unparseable input is returned unchanged.
///
/// # Examples
///
/// ```
/// use rs_fulltext::extractor::postprocess::normalize_date;
///
/// assert_eq!(normalize_date("2024-03-05T10:20:30+0100"), "2024-03-05T10:20:30+01:00");
/// assert_eq!(normalize_date("2024-03-05"), "2024-03-05T00:00:00Z");
/// assert_eq!(normalize_date("last Tuesday"), "last Tuesday");
/// ```
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    match parse_date(raw.trim()) {
        Some(date) => format_date(&date),
        None => {
            debug!(date = %raw, "keeping unparseable date as is");
            raw.to_string()
        }
    }
}

fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(date) = DateTime::parse_from_str(s, format) {
            return Some(date);
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn format_date(date: &DateTime<FixedOffset>) -> String {
    if date.offset().local_minus_utc() == 0 {
        date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    }
}
