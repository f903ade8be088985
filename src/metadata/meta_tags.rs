//! HTML Meta Tag Extraction
//!
//! The two lowest-precedence metadata sources: the basic document signals
//! (`<title>`, `<html lang>`) and Open Graph / article meta tags.

use dom_query::{Document, Selection};

use crate::dom;
use crate::extractor::ExtractionState;

/// Read the document `<title>` and the root element's `lang`.
///
/// Both overwrite whatever `state` holds when present.
pub fn examine_basic(doc: &Document, state: &mut ExtractionState) {
    if let Some(node) = doc.select("title").nodes().first() {
        let title = dom::text_content(&Selection::from(*node)).trim().to_string();
        if !title.is_empty() {
            state.title = Some(title);
        }
    }

    if let Some(node) = doc.select("html").nodes().first() {
        if let Some(lang) = dom::get_attribute(&Selection::from(*node), "lang") {
            let lang = lang.trim();
            if !lang.is_empty() {
                state.language = Some(lang.to_string());
            }
        }
    }
}

/// Read Open Graph `og:title`, `og:image`, `og:locale` and
/// `article:published_time`.
///
/// The first non-empty tag of each kind is used and overwrites `state`.
pub fn examine_open_graph(doc: &Document, state: &mut ExtractionState) {
    let mut title = None;
    let mut image = None;
    let mut locale = None;
    let mut published = None;

    for node in doc.select("meta[property], meta[name]").nodes() {
        let meta = Selection::from(*node);
        let Some(property) =
            dom::get_attribute(&meta, "property").or_else(|| dom::get_attribute(&meta, "name"))
        else {
            continue;
        };
        let content = dom::get_attribute(&meta, "content").unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        let slot = match property.trim().to_ascii_lowercase().as_str() {
            "og:title" => &mut title,
            "og:image" => &mut image,
            "og:locale" => &mut locale,
            "article:published_time" => &mut published,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(content.to_string());
        }
    }

    if title.is_some() {
        state.title = title;
    }
    if image.is_some() {
        state.image = image;
    }
    if locale.is_some() {
        state.language = locale;
    }
    if published.is_some() {
        state.date = published;
    }
}
