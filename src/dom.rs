//! DOM Operations Adapter
//!
//! The one node interface the rest of the crate talks to. Everything goes
//! through `dom_query::Selection`: attribute get/set/remove, parent links,
//! deep clones, serialization and text content.

// Re-export core types for external use
pub use dom_query::{Document, NodeRef, Selection};

pub use tendril::StrTendril;

// === Parsing ===

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Selection holding the document node itself.
///
/// Selecting from it reaches every element in the tree.
#[inline]
#[must_use]
pub fn document_root(doc: &Document) -> Selection<'_> {
    Selection::from(doc.root())
}

/// Deep-clone a document by re-parsing its serialization.
pub fn clone_document(doc: &Document) -> Document {
    Document::from(doc.html().to_string())
}

// === Attribute Operations ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Set an attribute value
#[inline]
pub fn set_attribute(sel: &Selection, name: &str, value: &str) {
    sel.set_attr(name, value);
}

/// Check if attribute exists
#[inline]
#[must_use]
pub fn has_attribute(sel: &Selection, name: &str) -> bool {
    sel.has_attr(name)
}

/// Remove an attribute
#[inline]
pub fn remove_attribute(sel: &Selection, name: &str) {
    sel.remove_attr(name);
}

/// Get all attributes as key-value pairs
///
/// Returns empty vector if node has no attributes or if selection is empty.
#[must_use]
pub fn get_all_attributes(sel: &Selection) -> Vec<(String, String)> {
    sel.nodes()
        .first()
        .map(|node| {
            node.attrs()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(dom_query::NodeRef::node_name)
        .map(|t| t.to_ascii_lowercase())
}

/// Every element under `sel`, in document order, as single-node selections.
#[must_use]
pub fn elements<'a>(sel: &Selection<'a>, css: &str) -> Vec<Selection<'a>> {
    sel.select(css).nodes().iter().map(|n| Selection::from(*n)).collect()
}

// === Text Content ===

/// Get all text content of node and descendants
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> StrTendril {
    sel.text()
}

/// Get inner HTML content
#[inline]
#[must_use]
pub fn inner_html(sel: &Selection) -> StrTendril {
    sel.inner_html()
}

/// Get outer HTML content
#[inline]
#[must_use]
pub fn outer_html(sel: &Selection) -> StrTendril {
    sel.html()
}

// === Tree Manipulation ===

/// Detach elements from their parents
#[inline]
pub fn remove(sel: &Selection) {
    sel.remove();
}

/// Remove elements but keep their children (unwrap)
#[inline]
pub fn strip_tags(sel: &Selection, tags: &[&str]) {
    sel.strip_elements(tags);
}

/// Wrap each element of `sel` in a new `tag` element, in place.
///
/// Works on the tree directly, so block elements can sit inside a `<p>`
/// wrapper even though the HTML parser would never produce that nesting.
pub fn wrap(sel: &Selection, tag: &str) {
    for node in sel.nodes() {
        let wrapper = node.tree.new_element(tag);
        node.insert_before(&wrapper);
        wrapper.append_child(node);
    }
}

/// Append a deep copy of `source` to `target`.
///
/// The two nodes may belong to different documents. Elements and text are
/// copied; comments and processing instructions are dropped.
pub fn append_copy(target: &NodeRef, source: &NodeRef) {
    if source.is_element() {
        let Some(name) = source.node_name() else {
            return;
        };
        let element = target.tree.new_element(&name);
        for attr in source.attrs().iter() {
            element.set_attr(&attr.name.local, &attr.value);
        }
        target.append_child(&element);
        for child in source.children() {
            append_copy(&element, &child);
        }
    } else if source.is_text() {
        let text = target.tree.new_text(source.text());
        target.append_child(&text);
    }
}

// === Detached containers ===

/// A `<div>` living in its own document.
///
/// Used for the extracted body: nodes copied into it are deep clones, so the
/// source document stays intact for later expressions.
pub struct Container {
    doc: Document,
}

impl Container {
    /// Create a container whose children are parsed from `inner_html`.
    #[must_use]
    pub fn new(inner_html: &str) -> Self {
        let doc = Document::from(format!("<html><body><div>{inner_html}</div></body></html>"));
        Self { doc }
    }

    /// Create a container holding deep clones of `nodes`, in order.
    ///
    /// Nodes are copied node by node rather than re-parsed, so elements that
    /// only parse in context (`td`, `tr`, `caption`, ...) survive.
    #[must_use]
    pub fn from_nodes(nodes: &[Selection]) -> Self {
        let container = Self::new("");
        if let Some(root) = container.root().nodes().first() {
            for node in nodes.iter().flat_map(|sel| sel.nodes().iter()) {
                append_copy(root, node);
            }
        }
        container
    }

    /// The container element.
    #[must_use]
    pub fn root(&self) -> Selection<'_> {
        self.doc.select("body > div").first()
    }

    /// Serialized container markup, the `<div>` included.
    #[must_use]
    pub fn html(&self) -> String {
        outer_html(&self.root()).to_string()
    }

    /// Serialized children of the container.
    #[must_use]
    pub fn inner_html(&self) -> String {
        inner_html(&self.root()).to_string()
    }

    /// Text content of the container.
    #[must_use]
    pub fn text(&self) -> String {
        text_content(&self.root()).to_string()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container").field("html", &self.html()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_round_trip() {
        let doc = parse(r#"<div><img src="a.png" data-src="b.png"></div>"#);
        let img = doc.select("img");

        assert_eq!(get_attribute(&img, "src").as_deref(), Some("a.png"));
        assert!(has_attribute(&img, "data-src"));

        set_attribute(&img, "src", "c.png");
        remove_attribute(&img, "data-src");

        assert_eq!(get_attribute(&img, "src").as_deref(), Some("c.png"));
        assert!(!has_attribute(&img, "data-src"));
        assert_eq!(get_all_attributes(&img), vec![("src".to_string(), "c.png".to_string())]);
    }

    #[test]
    fn tag_name_is_lowercase() {
        let doc = parse("<DIV><P>x</P></DIV>");
        assert_eq!(tag_name(&doc.select("p")).as_deref(), Some("p"));
        assert_eq!(tag_name(&doc.select("section")), None);
    }

    #[test]
    fn container_clones_nodes() {
        let doc = parse("<html><body><p class='a'>One</p><p>Two</p></body></html>");
        let nodes = elements(&document_root(&doc), "p");
        let container = Container::from_nodes(&nodes);

        container.root().select("p").remove();

        assert_eq!(container.root().select("p").length(), 0);
        assert_eq!(doc.select("p").length(), 2);
    }

    #[test]
    fn container_keeps_table_cells() {
        let doc = parse(
            r#"<table><tr><td class="nav">Menu</td><td class="content"><p>Story</p></td></tr></table>"#,
        );
        let cells = elements(&document_root(&doc), "td.content");
        let container = Container::from_nodes(&cells);

        assert_eq!(container.html(), r#"<div><td class="content"><p>Story</p></td></div>"#);
    }

    #[test]
    fn wrap_block_in_paragraph() {
        let doc = parse(r#"<html><body><div class="para">Text</div></body></html>"#);
        wrap(&doc.select("div.para"), "p");

        assert_eq!(
            inner_html(&doc.select("body")).to_string(),
            r#"<p><div class="para">Text</div></p>"#
        );
    }

    #[test]
    fn container_serialization() {
        let container = Container::new("<p>Hello</p>");
        assert_eq!(container.html(), "<div><p>Hello</p></div>");
        assert_eq!(container.inner_html(), "<p>Hello</p>");
        assert_eq!(container.text(), "Hello");
    }
}
