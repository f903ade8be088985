//! Path expression evaluation.
//!
//! Rule sets address parts of a page with path expressions. Two syntaxes are
//! accepted:
//!
//! - CSS selectors, optionally ending in `::text` or `::attr(name)` to yield
//!   scalar values instead of nodes.
//! - The XPath subset site rules are usually written in (`//div[@class='x']`,
//!   `//a[contains(@rel,'next')]/@href`, `//a[contains(., 'Next')]`, ...).
//!   These are compiled to CSS and run through `dom_query`. Text containment
//!   maps onto the matcher's `:contains()` and `:has-text()` pseudo-classes;
//!   text equality on the last step is checked after selection.
//!
//! Positional predicates are only accepted as the first predicate of a step,
//! where `:nth-of-type()` means the same thing as the XPath position.
//!
//! Expressions outside the subset fail with [`Error::InvalidPath`]; callers
//! treat that as "no match" for the one expression.

use dom_query::{Matcher, NodeRef, Selection};

use crate::dom;
use crate::error::{Error, Result};

/// What an expression yields for each matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutput {
    /// The elements themselves.
    Nodes,
    /// The value of the named attribute.
    Attribute(String),
    /// The trimmed text content.
    Text,
}

/// A path expression compiled to a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    /// Selector handed to `dom_query`.
    pub selector: String,
    /// Shape of the results.
    pub output: PathOutput,
    /// Text equality the selected elements must also pass.
    pub text_test: Option<TextTest>,
}

/// Which text of an element a [`TextTest`] compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTarget {
    /// The whole text content (`.`).
    Whole,
    /// Each direct text child (`text()`); any one may match.
    OwnText,
}

/// An XPath text equality such as `normalize-space(.)='Next'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTest {
    pub target: TextTarget,
    /// Collapse whitespace before comparing.
    pub normalize: bool,
    pub value: String,
}

impl TextTest {
    /// Whether `node` passes the test.
    #[must_use]
    pub fn matches(&self, node: &NodeRef) -> bool {
        let candidates: Vec<String> = match self.target {
            TextTarget::Whole => vec![node.text().to_string()],
            TextTarget::OwnText => node
                .children()
                .iter()
                .filter(|child| child.is_text())
                .map(|child| child.text().to_string())
                .collect(),
        };
        candidates.iter().any(|text| {
            if self.normalize {
                normalize_space(text) == self.value
            } else {
                *text == self.value
            }
        })
    }
}

/// A single result of evaluating a path expression.
#[derive(Debug, Clone)]
pub enum PathMatch<'a> {
    /// A matched element.
    Node(Selection<'a>),
    /// A scalar value (attribute value or text).
    Value(String),
}

impl<'a> PathMatch<'a> {
    /// The matched element, if this is a node result.
    #[must_use]
    pub fn as_node(&self) -> Option<&Selection<'a>> {
        match self {
            PathMatch::Node(sel) => Some(sel),
            PathMatch::Value(_) => None,
        }
    }

    /// Text of this result: the value itself, or the node's trimmed text.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            PathMatch::Node(sel) => dom::text_content(sel).trim().to_string(),
            PathMatch::Value(v) => v.trim().to_string(),
        }
    }
}

/// Evaluates path expressions against a document or subtree.
pub trait PathEvaluator {
    /// Evaluate `expr` against the descendants of `context`.
    fn evaluate<'a>(&self, expr: &str, context: &Selection<'a>) -> Result<Vec<PathMatch<'a>>>;
}

/// Default evaluator backed by `dom_query` selectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomPathEvaluator;

impl PathEvaluator for DomPathEvaluator {
    fn evaluate<'a>(&self, expr: &str, context: &Selection<'a>) -> Result<Vec<PathMatch<'a>>> {
        let path = compile(expr)?;
        let matcher =
            Matcher::new(&path.selector).map_err(|_| Error::InvalidPath(expr.to_string()))?;

        let mut matches = Vec::new();
        for node in context.select_matcher(&matcher).nodes() {
            if path.text_test.as_ref().is_some_and(|test| !test.matches(node)) {
                continue;
            }
            let sel = Selection::from(*node);
            match &path.output {
                PathOutput::Nodes => matches.push(PathMatch::Node(sel)),
                PathOutput::Attribute(name) => {
                    if let Some(value) = dom::get_attribute(&sel, name) {
                        matches.push(PathMatch::Value(value));
                    }
                }
                PathOutput::Text => {
                    let text = dom::text_content(&sel).trim().to_string();
                    if !text.is_empty() {
                        matches.push(PathMatch::Value(text));
                    }
                }
            }
        }
        Ok(matches)
    }
}

/// Compile a path expression (CSS or XPath subset) into a selector.
///
/// # Examples
///
/// ```
/// use rs_fulltext::path::{compile, PathOutput};
///
/// let path = compile("//a[@rel='next']/@href").unwrap();
/// assert_eq!(path.selector, r#"a[rel="next"]"#);
/// assert_eq!(path.output, PathOutput::Attribute("href".to_string()));
/// ```
pub fn compile(expr: &str) -> Result<CompiledPath> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(Error::InvalidPath(expr.to_string()));
    }

    if is_xpath(expr) {
        compile_xpath(expr)
    } else {
        Ok(compile_css(expr))
    }
}

fn is_xpath(expr: &str) -> bool {
    expr.starts_with('/') || expr.starts_with("./") || expr.starts_with('(')
}

fn compile_css(expr: &str) -> CompiledPath {
    if let Some(selector) = expr.strip_suffix("::text") {
        return CompiledPath {
            selector: selector.trim().to_string(),
            output: PathOutput::Text,
            text_test: None,
        };
    }

    if let Some(rest) = expr.strip_suffix(')') {
        if let Some(idx) = rest.rfind("::attr(") {
            return CompiledPath {
                selector: rest[..idx].trim().to_string(),
                output: PathOutput::Attribute(rest[idx + 7..].trim().to_string()),
                text_test: None,
            };
        }
    }

    CompiledPath {
        selector: expr.to_string(),
        output: PathOutput::Nodes,
        text_test: None,
    }
}

fn compile_xpath(expr: &str) -> Result<CompiledPath> {
    let invalid = || Error::InvalidPath(expr.to_string());

    let mut selectors = Vec::new();
    let mut output: Option<PathOutput> = None;
    let mut text_test = None;

    let branches = split_top_level(expr, '|');
    for branch in &branches {
        let branch = branch.trim();
        let branch = branch
            .strip_prefix('(')
            .and_then(|b| b.strip_suffix(')'))
            .unwrap_or(branch)
            .trim();
        let compiled = compile_xpath_branch(branch).ok_or_else(invalid)?;
        if compiled.text_test.is_some() {
            // A post-selection filter cannot be scoped to one side of a union.
            if branches.len() > 1 {
                return Err(invalid());
            }
            text_test = compiled.text_test;
        }

        match &output {
            Some(existing) if *existing != compiled.output => return Err(invalid()),
            Some(_) => {}
            None => output = Some(compiled.output.clone()),
        }
        selectors.push(compiled.selector);
    }

    Ok(CompiledPath {
        selector: selectors.join(", "),
        output: output.ok_or_else(invalid)?,
        text_test,
    })
}

fn compile_xpath_branch(expr: &str) -> Option<CompiledPath> {
    let expr = expr.strip_prefix('.').unwrap_or(expr);
    if !expr.starts_with('/') {
        return None;
    }

    let mut selector = String::new();
    let mut output = PathOutput::Nodes;
    let mut text_test = None;
    let mut rest = expr;

    while !rest.is_empty() {
        if output != PathOutput::Nodes {
            // Attribute and text() steps must be last.
            return None;
        }

        let descendant = rest.starts_with("//");
        rest = rest.trim_start_matches('/');
        let end = find_top_level(rest, '/').unwrap_or(rest.len());
        let step = rest[..end].trim();
        rest = &rest[end..];

        if step.is_empty() {
            return None;
        }

        if let Some(attr) = step.strip_prefix('@') {
            if !is_name(attr) {
                return None;
            }
            output = PathOutput::Attribute(attr.to_string());
            continue;
        }

        if step == "text()" {
            output = PathOutput::Text;
            continue;
        }

        if text_test.is_some() {
            // Text equality is only checked on the selected elements.
            return None;
        }
        let (css_step, step_test) = compile_step(step)?;
        text_test = step_test;
        if !selector.is_empty() {
            selector.push_str(if descendant { " " } else { " > " });
        }
        selector.push_str(&css_step);
    }

    if selector.is_empty() {
        return None;
    }

    Some(CompiledPath {
        selector,
        output,
        text_test,
    })
}

/// Compile one location step such as `div[@id='main'][2]`.
fn compile_step(step: &str) -> Option<(String, Option<TextTest>)> {
    let name_end = step.find('[').unwrap_or(step.len());
    let name = step[..name_end].trim();
    let has_tag = name != "*";

    if has_tag && !is_name(name) {
        return None;
    }

    let mut css = if has_tag { name.to_ascii_lowercase() } else { String::new() };
    let mut text_test = None;
    let mut predicates = &step[name_end..];
    let mut first = true;

    while !predicates.is_empty() {
        let inner_start = predicates.strip_prefix('[')?;
        let close = find_top_level(inner_start, ']')?;
        let inner = &inner_start[..close];
        predicates = inner_start[close + 1..].trim_start();

        let terms = split_top_level_word(inner, " and ");
        for term in &terms {
            let term = term.trim();
            // `[@a][2]` counts among the filtered nodes, which CSS cannot express.
            if is_positional(term) && !(first && terms.len() == 1) {
                return None;
            }
            if let Some(test) = text_equality(term) {
                if text_test.is_some() {
                    return None;
                }
                text_test = Some(test);
                continue;
            }
            css.push_str(&compile_predicate(term, has_tag)?);
        }
        first = false;
    }

    if css.is_empty() {
        css.push('*');
    }
    Some((css, text_test))
}

fn is_positional(term: &str) -> bool {
    term == "last()" || term.parse::<usize>().is_ok()
}

/// Parse `text()='v'`, `.='v'` or `normalize-space(.)='v'`.
fn text_equality(term: &str) -> Option<TextTest> {
    let eq = find_top_level(term, '=')?;
    if term[..eq].ends_with('!') {
        return None;
    }
    let lhs: String = term[..eq].chars().filter(|c| !c.is_whitespace()).collect();
    let value = unquote(term[eq + 1..].trim())?;
    let (target, normalize) = match lhs.as_str() {
        "." | "string()" | "string(.)" => (TextTarget::Whole, false),
        "normalize-space()" | "normalize-space(.)" => (TextTarget::Whole, true),
        "text()" => (TextTarget::OwnText, false),
        "normalize-space(text())" => (TextTarget::OwnText, true),
        _ => return None,
    };
    Some(TextTest {
        target,
        normalize,
        value,
    })
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compile_predicate(term: &str, has_tag: bool) -> Option<String> {
    if let Ok(position) = term.parse::<usize>() {
        if position == 0 {
            return None;
        }
        return Some(if has_tag {
            format!(":nth-of-type({position})")
        } else {
            format!(":nth-child({position})")
        });
    }

    if term == "last()" {
        return Some(if has_tag { ":last-of-type" } else { ":last-child" }.to_string());
    }

    if let Some(inner) = term.strip_prefix("not(").and_then(|t| t.strip_suffix(')')) {
        return Some(format!(":not({})", compile_predicate(inner.trim(), has_tag)?));
    }

    if let Some(args) = function_args(term, "contains") {
        let (target, value) = args;
        let compact: String = target.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "." | "string()" | "string(.)" | "normalize-space()" | "normalize-space(.)" => {
                return (!value.is_empty()).then(|| format!(":contains(\"{}\")", escape_css_string(&value)));
            }
            "text()" | "normalize-space(text())" => {
                return (!value.is_empty()).then(|| format!(":has-text(\"{}\")", escape_css_string(&value)));
            }
            _ => {}
        }
        if let Some(class_attr) = normalized_class_target(target) {
            let class = value.trim();
            if class.is_empty() || class.contains(' ') {
                return None;
            }
            return Some(format!("[{class_attr}~=\"{}\"]", escape_css_string(class)));
        }
        let attr = target.strip_prefix('@').filter(|a| is_name(a))?;
        return Some(format!("[{attr}*=\"{}\"]", escape_css_string(&value)));
    }

    if let Some((target, value)) = function_args(term, "starts-with") {
        let attr = target.strip_prefix('@').filter(|a| is_name(a))?;
        return Some(format!("[{attr}^=\"{}\"]", escape_css_string(&value)));
    }

    let attr_term = term.strip_prefix('@')?;
    if let Some(idx) = attr_term.find("!=") {
        let attr = attr_term[..idx].trim();
        let value = unquote(attr_term[idx + 2..].trim())?;
        if !is_name(attr) {
            return None;
        }
        return Some(format!(":not([{attr}=\"{}\"])", escape_css_string(&value)));
    }
    if let Some(idx) = attr_term.find('=') {
        let attr = attr_term[..idx].trim();
        let value = unquote(attr_term[idx + 1..].trim())?;
        if !is_name(attr) {
            return None;
        }
        return Some(format!("[{attr}=\"{}\"]", escape_css_string(&value)));
    }

    let attr = attr_term.trim();
    is_name(attr).then(|| format!("[{attr}]"))
}

/// Parse `name(target, 'value')` into its two arguments.
fn function_args<'a>(term: &'a str, name: &str) -> Option<(&'a str, String)> {
    let inner = term
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    let comma = rfind_top_level(inner, ',')?;
    let target = inner[..comma].trim();
    let value = unquote(inner[comma + 1..].trim())?;
    Some((target, value))
}

/// Recognise `concat(' ', normalize-space(@class), ' ')` and return `class`.
fn normalized_class_target(target: &str) -> Option<&str> {
    let compact: String = target.chars().filter(|c| !c.is_whitespace()).collect();
    let inner = compact
        .strip_prefix("concat('',normalize-space(@")
        .or_else(|| compact.strip_prefix("concat(\"\",normalize-space(@"))?;
    let end = inner.find(')')?;
    let attr = &inner[..end];
    if !is_name(attr) {
        return None;
    }
    // Return a slice of the original string so lifetimes line up.
    let start = target.find(attr)?;
    Some(&target[start..start + attr.len()])
}

fn unquote(value: &str) -> Option<String> {
    let value = value.trim();
    let quote = value.chars().next().filter(|c| matches!(c, '\'' | '"'))?;
    let inner = value.strip_prefix(quote)?.strip_suffix(quote)?;
    (!inner.contains(quote)).then(|| inner.to_string())
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Find `needle` outside brackets, parentheses and quotes.
fn find_top_level(haystack: &str, needle: char) -> Option<usize> {
    scan_top_level(haystack).find(|&(_, c)| c == needle).map(|(i, _)| i)
}

fn rfind_top_level(haystack: &str, needle: char) -> Option<usize> {
    scan_top_level(haystack)
        .filter(|&(_, c)| c == needle)
        .last()
        .map(|(i, _)| i)
}

/// Iterate over the characters of `s` that sit at nesting depth zero.
fn scan_top_level(s: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    s.char_indices().filter(move |&(_, c)| {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            return false;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                false
            }
            '[' | '(' => {
                depth += 1;
                false
            }
            ']' | ')' if depth > 0 => {
                depth -= 1;
                false
            }
            _ => depth == 0,
        }
    })
}

fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in scan_top_level(s) {
        if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn split_top_level_word<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    let top_level: Vec<usize> = scan_top_level(s).map(|(i, _)| i).collect();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < s.len() {
        if s[i..].starts_with(sep) && (i..i + sep.len()).all(|j| top_level.binary_search(&j).is_ok())
        {
            parts.push(&s[start..i]);
            i += sep.len();
            start = i;
        } else {
            i += s[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    fn selector(expr: &str) -> String {
        compile(expr).unwrap().selector
    }

    #[test]
    fn css_passes_through() {
        assert_eq!(selector("div.article > p"), "div.article > p");
        let path = compile("a.next::attr(href)").unwrap();
        assert_eq!(path.selector, "a.next");
        assert_eq!(path.output, PathOutput::Attribute("href".to_string()));
        assert_eq!(compile("h1::text").unwrap().output, PathOutput::Text);
    }

    #[test]
    fn xpath_steps_and_predicates() {
        assert_eq!(selector("//div[@id='main']"), r#"div[id="main"]"#);
        assert_eq!(selector("//div/p"), "div > p");
        assert_eq!(selector("//article//p"), "article p");
        assert_eq!(selector("//*[@class='body']"), r#"[class="body"]"#);
        assert_eq!(selector("//div[contains(@class, 'story')]"), r#"div[class*="story"]"#);
        assert_eq!(selector("//a[starts-with(@href,'/page')]"), r#"a[href^="/page"]"#);
        assert_eq!(
            selector("//div[contains(concat(' ',normalize-space(@class),' '),' content ')]"),
            r#"div[class~="content"]"#
        );
        assert_eq!(selector("//div[@id='a' and @data-x]"), r#"div[id="a"][data-x]"#);
        assert_eq!(selector("//ul/li[2]"), "ul > li:nth-of-type(2)");
        assert_eq!(selector("//div[not(@hidden)]"), "div:not([hidden])");
        assert_eq!(selector("//h1 | //h2"), "h1, h2");
    }

    #[test]
    fn xpath_terminal_steps() {
        let path = compile("//a[@rel='next']/@href").unwrap();
        assert_eq!(path.output, PathOutput::Attribute("href".to_string()));
        let path = compile("//h1/text()").unwrap();
        assert_eq!(path.selector, "h1");
        assert_eq!(path.output, PathOutput::Text);
    }

    #[test]
    fn text_predicates() {
        assert_eq!(selector("//a[contains(., 'Next')]"), r#"a:contains("Next")"#);
        assert_eq!(
            selector("//div[@class='byline'][contains(normalize-space(.), 'Sponsored by')]"),
            r#"div[class="byline"]:contains("Sponsored by")"#
        );
        assert_eq!(selector("//a[contains(text(),'more')]"), r#"a:has-text("more")"#);

        let path = compile("//a[text()='Next page']/@href").unwrap();
        assert_eq!(path.selector, "a");
        assert_eq!(
            path.text_test,
            Some(TextTest {
                target: TextTarget::OwnText,
                normalize: false,
                value: "Next page".to_string(),
            })
        );
        assert!(compile("//a[normalize-space(.)='Next']").unwrap().text_test.is_some());
        assert!(compile("//div[.='x']/a").is_err());
        assert!(compile("//a[.='x'] | //b").is_err());
    }

    #[test]
    fn position_only_as_first_predicate() {
        assert_eq!(selector("//div[2][@class='x']"), r#"div:nth-of-type(2)[class="x"]"#);
        assert!(compile("//div[@class='x'][2]").is_err());
        assert!(compile("//div[@class='x' and 2]").is_err());
        assert!(compile("//li[@id][last()]").is_err());
    }

    #[test]
    fn evaluates_text_predicates() {
        let doc = dom::parse(
            r#"<html><body>
                <a href="/prev">Previous</a>
                <a href="/p2"> Next   page </a>
                <a href="/all"><span>View</span> all</a>
            </body></html>"#,
        );
        let root = dom::document_root(&doc);
        let evaluator = DomPathEvaluator;
        let value = |expr: &str| -> Vec<String> {
            evaluator.evaluate(expr, &root).unwrap().iter().map(PathMatch::text).collect()
        };

        assert_eq!(value("//a[contains(., 'Next')]/@href"), ["/p2"]);
        assert_eq!(value("//a[normalize-space(.)='Next page']/@href"), ["/p2"]);
        assert!(value("//a[.='Next page']/@href").is_empty());
        assert_eq!(value("//a[text()='Previous']/@href"), ["/prev"]);
        assert_eq!(value("//a[contains(., 'View all')]/@href"), ["/all"]);
    }

    #[test]
    fn unsupported_xpath_is_rejected() {
        assert!(compile("//div[@a='x' or @b='y']").is_err());
        assert!(compile("//a/@href/span").is_err());
        assert!(compile("//following-sibling::p").is_err());
        assert!(compile("//a/@href | //a").is_err());
        assert!(compile("   ").is_err());
    }

    #[test]
    fn evaluates_nodes_and_values() {
        let doc = dom::parse(
            r#"<html><body>
                <a class="next" href="/p2">Next</a>
                <h1>  Headline </h1>
            </body></html>"#,
        );
        let root = dom::document_root(&doc);
        let evaluator = DomPathEvaluator;

        let nodes = evaluator.evaluate("//h1", &root).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text(), "Headline");
        assert!(nodes[0].as_node().is_some());

        let hrefs = evaluator.evaluate("//a[@class='next']/@href", &root).unwrap();
        assert!(matches!(hrefs.as_slice(), [PathMatch::Value(v)] if v == "/p2"));

        assert!(evaluator.evaluate("//section", &root).unwrap().is_empty());
        assert!(evaluator.evaluate("div[[[", &root).is_err());
    }
}
