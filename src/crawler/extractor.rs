//! HTML content extraction
//!
//! This module turns raw HTML into:
//! - the page title
//! - `<meta>` values keyed by name (or property)
//! - normalized visible text, with script/style/noscript content dropped
//!
//! Parsing never fails: malformed markup is repaired by the HTML5 parser
//! and whatever it recovered is used.

use ego_tree::iter::Edge;
use scraper::{node::Node, Html, Selector};
use std::collections::HashMap;

/// Maximum snippet length, in characters
pub const SNIPPET_CHARS: usize = 500;

/// Marker appended to truncated snippets
pub const ELLIPSIS: &str = "...";

/// Elements whose text is never visible
const SKIP_TAGS: &[&str] = &["script", "style", "noscript"];

/// Elements that end a line of visible text
const BLOCK_TAGS: &[&str] = &["p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Text of the first `<title>`, trimmed; empty if absent
    pub title: String,

    /// `<meta>` content keyed by lower-cased name or property
    pub meta: HashMap<String, String>,

    /// Whitespace-collapsed visible text
    pub text: String,

    /// Number of markup errors the parser recovered from
    pub parse_errors: usize,
}

impl ExtractedPage {
    pub fn keywords(&self) -> &str {
        self.meta.get("keywords").map(String::as_str).unwrap_or("")
    }

    /// `description`, falling back to `og:description`
    pub fn description(&self) -> &str {
        self.meta
            .get("description")
            .filter(|d| !d.is_empty())
            .or_else(|| self.meta.get("og:description"))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn snippet(&self) -> String {
        make_snippet(&self.text, SNIPPET_CHARS)
    }

    /// Whether the parser had to repair the markup
    pub fn is_degraded(&self) -> bool {
        self.parse_errors > 0
    }
}

/// Parses HTML content and extracts title, metadata and visible text
///
/// # Example
///
/// ```
/// use sumi_index::crawler::extract;
///
/// let page = extract(r#"<html><head><title> Test </title>
///     <meta name="Description" content="About"></head>
///     <body><p>Hello</p><script>ignored()</script></body></html>"#);
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.description(), "About");
/// assert_eq!(page.text, "Test Hello");
/// ```
pub fn extract(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        title: extract_title(&document),
        meta: extract_meta(&document),
        text: extract_visible_text(&document),
        parse_errors: document.errors.len(),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().map(str::trim).collect::<String>())
        .unwrap_or_default()
}

/// Collects `<meta>` content; later duplicates overwrite earlier ones
fn extract_meta(document: &Html) -> HashMap<String, String> {
    let mut meta = HashMap::new();

    let Ok(meta_selector) = Selector::parse("meta") else {
        return meta;
    };

    for element in document.select(&meta_selector) {
        let attrs = element.value();
        let name = attrs.attr("name").unwrap_or("").trim().to_lowercase();
        let property = attrs.attr("property").unwrap_or("").trim().to_lowercase();
        let content = attrs.attr("content").unwrap_or("").to_string();

        if !name.is_empty() {
            meta.insert(name, content);
        } else if !property.is_empty() {
            meta.insert(property, content);
        }
    }

    meta
}

/// Walks the tree once, collecting text outside skipped elements
///
/// A depth counter (not a flag) tracks skipped ancestors, so nested
/// skip elements are handled.
fn extract_visible_text(document: &Html) -> String {
    let mut raw = String::new();
    let mut skip_depth = 0usize;

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) if SKIP_TAGS.contains(&element.name()) => {
                    skip_depth += 1;
                }
                Node::Text(text) if skip_depth == 0 => {
                    let text = text.trim();
                    if !text.is_empty() {
                        raw.push_str(text);
                        raw.push(' ');
                    }
                }
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(element) = node.value() {
                    if SKIP_TAGS.contains(&element.name()) {
                        skip_depth = skip_depth.saturating_sub(1);
                    } else if BLOCK_TAGS.contains(&element.name()) {
                        raw.push('\n');
                    }
                }
            }
        }
    }

    collapse_whitespace(&raw)
}

/// Collapses every whitespace run to one space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates text to `max_chars` characters, appending [`ELLIPSIS`] when cut
///
/// # Examples
///
/// ```
/// use sumi_index::crawler::make_snippet;
///
/// assert_eq!(make_snippet("abcdef", 3), "abc...");
/// assert_eq!(make_snippet("abc", 3), "abc");
/// ```
pub fn make_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
