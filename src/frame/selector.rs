//! Selector engine.
//!
//! Computes a CSS selector that re-identifies one element in its own
//! document at capture time.
//!
//! # Strategy
//!
//! Tried in order, first success wins:
//!
//! 1. `#id`, when the element has an id and `#id` matches only it.
//! 2. A structural path `tag:nth-child(k) > ...`, grown from the element
//!    towards the root until it matches only the element.
//! 3. The lower-cased tag name (may match other elements).
//!
//! Class names are never used: generated markup makes them unstable and
//! non-unique.
//!
//! # Example
//!
//! ```ignore
//! let doc = FrameDocument::parse("<ul><li>a</li><li>b</li></ul>");
//! let second = doc.query_all("li")?[1];
//! assert_eq!(compute_selector(second), "li:nth-child(2)");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::protocol::ElementInfo;

// ============================================================================
// Constants
// ============================================================================

/// Identifiers that need no escaping inside a CSS selector.
static PLAIN_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").expect("identifier pattern is valid")
});

/// Combinator between structural path segments.
const CHILD_COMBINATOR: &str = " > ";

// ============================================================================
// Public API
// ============================================================================

/// Computes a selector for `node`.
///
/// Never fails: an element that cannot be identified uniquely (for example
/// one detached from its document) gets its bare tag name.
#[must_use]
pub fn compute_selector(node: ElementRef<'_>) -> String {
    if is_connected(node) {
        if let Some(selector) = id_selector(node) {
            return selector;
        }
        if let Some(selector) = structural_selector(node) {
            return selector;
        }
    }
    node.value().name().to_ascii_lowercase()
}

/// Builds the [`ElementInfo`] describing `node`.
#[must_use]
pub fn describe(node: ElementRef<'_>) -> ElementInfo {
    let text: String = node.text().collect();
    ElementInfo::new(node.value().name(), compute_selector(node), text)
}

/// Returns `true` if `selector` matches exactly one connected element in
/// `node`'s document, and that element is `node`.
///
/// An unparsable selector resolves to nothing.
#[must_use]
pub fn resolves_uniquely(node: ElementRef<'_>, selector: &str) -> bool {
    let Ok(parsed) = Selector::parse(selector) else {
        return false;
    };

    let mut matches = node
        .tree()
        .nodes()
        .filter_map(ElementRef::wrap)
        .filter(|candidate| is_connected(*candidate) && parsed.matches(candidate));

    matches.next() == Some(node) && matches.next().is_none()
}

/// Escapes `value` for use as a CSS identifier, like `CSS.escape()`.
#[must_use]
pub fn escape_identifier(value: &str) -> Cow<'_, str> {
    if PLAIN_IDENTIFIER.is_match(value) {
        return Cow::Borrowed(value);
    }

    let first = value.chars().next();
    let mut escaped = String::with_capacity(value.len() + 8);

    for (index, ch) in value.chars().enumerate() {
        match ch {
            '\0' => escaped.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => push_code_point(&mut escaped, ch),
            '0'..='9' if index == 0 => push_code_point(&mut escaped, ch),
            '0'..='9' if index == 1 && first == Some('-') => push_code_point(&mut escaped, ch),
            '-' if index == 0 && value.len() == 1 => escaped.push_str("\\-"),
            c if c >= '\u{80}' || c == '-' || c == '_' || c.is_ascii_alphanumeric() => {
                escaped.push(c);
            }
            c => {
                escaped.push('\\');
                escaped.push(c);
            }
        }
    }

    Cow::Owned(escaped)
}

// ============================================================================
// Strategies
// ============================================================================

fn id_selector(node: ElementRef<'_>) -> Option<String> {
    let id = node.value().id().filter(|id| !id.is_empty())?;
    let selector = format!("#{}", escape_identifier(id));
    resolves_uniquely(node, &selector).then_some(selector)
}

fn structural_selector(node: ElementRef<'_>) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(node);

    while let Some(element) = current {
        segments.push(path_segment(element));

        let candidate = segments
            .iter()
            .rev()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(CHILD_COMBINATOR);
        if resolves_uniquely(node, &candidate) {
            return Some(candidate);
        }

        current = parent_element(element);
    }

    None
}

/// `tag:nth-child(k)` for elements with an element parent, `tag` for the root.
///
/// The tag keeps its local-name case: type selectors are case-sensitive for
/// foreign elements such as SVG `clipPath`.
fn path_segment(element: ElementRef<'_>) -> String {
    let tag = escape_identifier(element.value().name()).into_owned();
    if parent_element(element).is_none() {
        return tag;
    }

    let position = 1 + element
        .prev_siblings()
        .filter(|sibling| sibling.value().is_element())
        .count();
    format!("{tag}:nth-child({position})")
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Returns `true` if the element's ancestor chain reaches the document node.
fn is_connected(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .last()
        .is_some_and(|root| root.value().is_document())
}

fn push_code_point(out: &mut String, ch: char) {
    let _ = write!(out, "\\{:x} ", u32::from(ch));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::frame::FrameDocument;

    fn doc(body: &str) -> FrameDocument {
        FrameDocument::parse(&format!(
            "<!DOCTYPE html><html><head></head><body>{body}</body></html>"
        ))
    }

    #[test]
    fn test_unique_id_wins() {
        let doc = doc(r#"<div><button id="save">Save</button></div>"#);
        let button = doc.query("button").expect("parse").expect("found");
        assert_eq!(compute_selector(button), "#save");
    }

    #[test]
    fn test_nth_child_for_list_item() {
        let doc = doc("<ul><li>One</li><li>Two</li><li>Three</li></ul>");
        let items = doc.query_all("li").expect("parse");
        let selector = compute_selector(items[1]);
        assert!(selector.ends_with("li:nth-child(2)"), "got {selector}");
        assert_eq!(doc.query(&selector).expect("parse"), Some(items[1]));
    }

    #[test]
    fn test_path_grows_until_unique() {
        let doc = doc("<ul><li>a</li><li>b</li></ul><ul><li>c</li><li>d</li></ul>");
        let items = doc.query_all("li").expect("parse");
        let selector = compute_selector(items[3]);
        assert_eq!(selector, "ul:nth-child(2) > li:nth-child(2)");
        assert!(resolves_uniquely(items[3], &selector));
    }

    #[test]
    fn test_duplicate_id_falls_back_to_path() {
        let doc = doc(r#"<p id="dup">a</p><p id="dup">b</p>"#);
        let paragraphs = doc.query_all("p").expect("parse");
        let selector = compute_selector(paragraphs[1]);
        assert!(!selector.starts_with('#'));
        assert!(resolves_uniquely(paragraphs[1], &selector));
    }

    #[test]
    fn test_empty_id_is_ignored() {
        let doc = doc(r#"<span id="">x</span><span>y</span>"#);
        let first = doc.query_all("span").expect("parse")[0];
        assert_eq!(compute_selector(first), "span:nth-child(1)");
    }

    #[test]
    fn test_ids_needing_escape() {
        let doc = doc(r#"<div id="1st">a</div><div id="a:b">b</div><div id="x y">c</div>"#);
        for element in doc.query_all("div").expect("parse") {
            let selector = compute_selector(element);
            assert!(selector.starts_with('#'), "got {selector}");
            assert!(resolves_uniquely(element, &selector), "got {selector}");
        }
    }

    #[test]
    fn test_root_element_uses_bare_tag() {
        let doc = doc("");
        let html = doc.html().root_element();
        assert_eq!(compute_selector(html), "html");
    }

    #[test]
    fn test_classes_are_not_used() {
        let doc = doc(r#"<div class="card">a</div><div class="card only">b</div>"#);
        let second = doc.query_all("div").expect("parse")[1];
        let selector = compute_selector(second);
        assert!(!selector.contains('.'), "got {selector}");
    }

    #[test]
    fn test_every_element_resolves_to_itself() {
        let doc = doc(
            r#"<header><nav><a href="/">Home</a><a href="/about">About</a></nav></header>
               <main><section><h2>Title</h2><p>One <b>bold</b></p><p>Two</p></section>
               <section><h2>Other</h2><table><tr><td>1</td><td>2</td></tr></table></section></main>"#,
        );
        for element in doc.elements() {
            let selector = compute_selector(element);
            assert_eq!(
                doc.query(&selector).expect("parse"),
                Some(element),
                "selector {selector} did not resolve back"
            );
        }
    }

    #[test]
    fn test_camel_case_svg_elements_resolve() {
        let doc = doc(
            r#"<svg><defs><clipPath><rect/></clipPath><linearGradient><stop/></linearGradient></defs>
               <foreignObject><div>x</div></foreignObject></svg>"#,
        );
        for element in doc.elements() {
            let selector = compute_selector(element);
            assert_eq!(
                doc.query(&selector).expect("parse"),
                Some(element),
                "selector {selector} did not resolve back"
            );
        }

        let clip = doc.query_all("clipPath").expect("parse")[0];
        assert!(compute_selector(clip).contains("clipPath:nth-child(1)"));
    }

    #[test]
    fn test_describe() {
        let doc = doc(r#"<button id="save">  Save  </button>"#);
        let button = doc.query("#save").expect("parse").expect("found");
        assert_eq!(describe(button), ElementInfo::new("BUTTON", "#save", "Save"));
    }

    #[test]
    fn test_escape_identifier() {
        assert!(matches!(escape_identifier("plain-id_1"), Cow::Borrowed(_)));
        assert_eq!(escape_identifier("1st"), "\\31 st");
        assert_eq!(escape_identifier("-2x"), "-\\32 x");
        assert_eq!(escape_identifier("-"), "\\-");
        assert_eq!(escape_identifier("a:b"), "a\\:b");
        assert_eq!(escape_identifier("x y"), "x\\ y");
        assert_eq!(escape_identifier("héllo"), "héllo");
    }

    #[test]
    fn test_unparsable_selector_does_not_resolve() {
        let doc = doc("<p>x</p>");
        let p = doc.query("p").expect("parse").expect("found");
        assert!(!resolves_uniquely(p, "p::::"));
    }
}
