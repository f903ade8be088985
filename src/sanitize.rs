//! Body sanitizer.
//!
//! Reduces extracted markup to an allow-list of tags and attributes.
//! Disallowed elements are unwrapped so their text survives; elements whose
//! contents are never readable text are dropped outright. Link and source
//! attributes using a script scheme are removed.

use crate::dom::{self, Container};
use crate::error::{Error, Result};

/// Tags kept in sanitized output.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "div", "span", "section", "article", "header", "footer", "main", "figure", "figcaption",
    "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd", "table", "thead",
    "tbody", "tfoot", "tr", "th", "td", "caption", "colgroup", "col", "blockquote", "q", "pre",
    "code", "img", "picture", "source", "a", "br", "hr", "iframe", "em", "strong", "b", "i", "u",
    "s", "sub", "sup", "small", "mark", "abbr", "cite", "time", "del", "ins",
];

/// Attributes kept in sanitized output.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "src", "srcset", "alt", "title", "class", "id", "width", "height", "target",
];

/// Elements removed together with their contents.
const DROPPED_TAGS: &str = "script, style, template, noscript";

/// Attributes holding a URL.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction", "poster", "background"];

/// Schemes that run code when followed or loaded.
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:"];

/// Cleans an HTML fragment down to an allow-list.
pub trait Sanitizer {
    /// Sanitize `html`, keeping only `allowed_tags` and `allowed_attributes`.
    fn sanitize(&self, html: &str, allowed_tags: &[&str], allowed_attributes: &[&str]) -> Result<String>;

    /// Sanitize an extracted body and return its markup.
    ///
    /// The default serializes the container and goes through
    /// [`Sanitizer::sanitize`].
    fn sanitize_container(
        &self,
        container: &Container,
        allowed_tags: &[&str],
        allowed_attributes: &[&str],
    ) -> Result<String> {
        self.sanitize(&container.html(), allowed_tags, allowed_attributes)
    }
}

/// Default sanitizer built on `dom_query`.
///
/// Containers are cleaned in place, so table parts and other elements that
/// only parse in context are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomSanitizer;

impl Sanitizer for DomSanitizer {
    fn sanitize(&self, html: &str, allowed_tags: &[&str], allowed_attributes: &[&str]) -> Result<String> {
        let container = Container::new(html);
        clean_tree(&container, allowed_tags, allowed_attributes)?;
        Ok(container.inner_html())
    }

    fn sanitize_container(
        &self,
        container: &Container,
        allowed_tags: &[&str],
        allowed_attributes: &[&str],
    ) -> Result<String> {
        clean_tree(container, allowed_tags, allowed_attributes)?;
        Ok(container.html())
    }
}

fn clean_tree(container: &Container, allowed_tags: &[&str], allowed_attributes: &[&str]) -> Result<()> {
    let root = container.root();
    if root.length() == 0 {
        return Err(Error::Sanitizer("fragment did not parse into a container".to_string()));
    }

    for el in dom::elements(&root, DROPPED_TAGS).into_iter().rev() {
        dom::remove(&el);
    }

    let mut disallowed: Vec<String> = dom::elements(&root, "*")
        .iter()
        .filter_map(dom::tag_name)
        .filter(|tag| !allowed_tags.contains(&tag.as_str()))
        .collect();
    disallowed.sort_unstable();
    disallowed.dedup();
    if !disallowed.is_empty() {
        let tags: Vec<&str> = disallowed.iter().map(String::as_str).collect();
        dom::strip_tags(&root, &tags);
    }

    for el in dom::elements(&root, "*") {
        for (name, value) in dom::get_all_attributes(&el) {
            let lower = name.to_ascii_lowercase();
            if !allowed_attributes.contains(&lower.as_str())
                || (URL_ATTRIBUTES.contains(&lower.as_str()) && has_unsafe_scheme(&value))
            {
                dom::remove_attribute(&el, &name);
            }
        }
    }

    Ok(())
}

/// Whether a URL uses a script scheme, ignoring case and embedded whitespace.
fn has_unsafe_scheme(url: &str) -> bool {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES.iter().any(|scheme| compact.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str) -> String {
        DomSanitizer.sanitize(html, ALLOWED_TAGS, ALLOWED_ATTRIBUTES).unwrap()
    }

    #[test]
    fn unwraps_disallowed_tags() {
        assert_eq!(clean("<p>Hello <font color=\"red\">world</font></p>"), "<p>Hello world</p>");
    }

    #[test]
    fn drops_script_and_style_contents() {
        let out = clean("<div><script>alert(1)</script><style>p{}</style><p>Text</p></div>");
        assert_eq!(out, "<div><p>Text</p></div>");
    }

    #[test]
    fn removes_disallowed_attributes() {
        let out = clean(r#"<p class="lead" onclick="x()" style="color:red"><a href="/a" rel="nofollow">a</a></p>"#);
        assert_eq!(out, r#"<p class="lead"><a href="/a">a</a></p>"#);
    }

    #[test]
    fn drops_script_urls() {
        let out = clean(
            r#"<p><a href=" JavaScript:alert(1)">x</a><a href="java&#10;script:alert(2)">y</a><a href="/ok">z</a><iframe src="vbscript:msgbox"></iframe></p>"#,
        );
        assert_eq!(out, r#"<p><a>x</a><a>y</a><a href="/ok">z</a><iframe></iframe></p>"#);
    }

    #[test]
    fn container_keeps_table_parts() {
        let doc = dom::parse(r#"<table><tr><td class="c" onclick="x()"><font>Cell</font></td></tr></table>"#);
        let cells = dom::elements(&dom::document_root(&doc), "td");
        let container = Container::from_nodes(&cells);

        let out = DomSanitizer
            .sanitize_container(&container, ALLOWED_TAGS, ALLOWED_ATTRIBUTES)
            .unwrap();
        assert_eq!(out, r#"<div><td class="c">Cell</td></div>"#);
    }

    #[test]
    fn keeps_images() {
        let out = clean(r#"<figure><img src="a.png" alt="A" data-foo="1"></figure>"#);
        assert_eq!(out, r#"<figure><img src="a.png" alt="A"></figure>"#);
    }
}
