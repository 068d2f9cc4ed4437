//! Frame document: parsed HTML plus the layout boxes the overlay needs.

use std::fmt;

use ego_tree::NodeId;
use rustc_hash::FxHashMap;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Rect
// ============================================================================

/// A client rectangle, as returned by `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge in CSS pixels.
    pub x: f64,
    /// Top edge in CSS pixels.
    pub y: f64,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the rectangle has no area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

// ============================================================================
// FrameDocument
// ============================================================================

/// The document loaded in a frame.
///
/// The HTML tree is read-only for the instrumentation. Layout is supplied
/// by the embedder through [`set_bounds`](Self::set_bounds); elements with
/// no recorded box report an empty [`Rect`], like a node that is not
/// rendered.
pub struct FrameDocument {
    html: Html,
    bounds: FxHashMap<NodeId, Rect>,
}

impl fmt::Debug for FrameDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDocument")
            .field("nodes", &self.html.tree.nodes().count())
            .field("laid_out", &self.bounds.len())
            .finish_non_exhaustive()
    }
}

impl FrameDocument {
    /// Parses a full HTML document.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            bounds: FxHashMap::default(),
        }
    }

    /// Returns the parsed tree.
    #[inline]
    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Returns the first element matching `selector` (`querySelector`).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSelector`] if `selector` does not parse.
    pub fn query(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let parsed = parse_selector(selector)?;
        Ok(self.html.select(&parsed).next())
    }

    /// Returns every element matching `selector` (`querySelectorAll`).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSelector`] if `selector` does not parse.
    pub fn query_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let parsed = parse_selector(selector)?;
        Ok(self.html.select(&parsed).collect())
    }

    /// Looks up an element by node ID.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Iterates every element in document order.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.tree.root().descendants().filter_map(ElementRef::wrap)
    }

    /// Records the layout box of an element.
    pub fn set_bounds(&mut self, id: NodeId, rect: Rect) {
        self.bounds.insert(id, rect);
    }

    /// Returns the layout box of an element.
    #[must_use]
    pub fn bounds(&self, id: NodeId) -> Rect {
        self.bounds.get(&id).copied().unwrap_or_default()
    }

    /// Serializes the document back to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.html.html()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parses a CSS selector, mapping parser errors to [`Error::InvalidSelector`].
pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::invalid_selector(selector, format!("{e:?}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head></head><body>
        <button id="save">Save</button>
        <ul><li>One</li><li>Two</li><li>Three</li></ul>
    </body></html>"#;

    #[test]
    fn test_query() {
        let doc = FrameDocument::parse(PAGE);
        let button = doc.query("#save").expect("parse").expect("found");
        assert_eq!(button.value().name(), "button");
        assert_eq!(doc.query_all("li").expect("parse").len(), 3);
        assert!(doc.query("#missing").expect("parse").is_none());
    }

    #[test]
    fn test_invalid_selector() {
        let doc = FrameDocument::parse(PAGE);
        assert!(matches!(
            doc.query("li:::"),
            Err(Error::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_element_by_id() {
        let doc = FrameDocument::parse(PAGE);
        let button = doc.query("#save").expect("parse").expect("found");
        assert_eq!(doc.element(button.id()), Some(button));
    }

    #[test]
    fn test_bounds_default_to_empty() {
        let mut doc = FrameDocument::parse(PAGE);
        let id = doc.query("#save").expect("parse").expect("found").id();
        assert!(doc.bounds(id).is_empty());

        doc.set_bounds(id, Rect::new(10.0, 20.0, 80.0, 24.0));
        assert_eq!(doc.bounds(id), Rect::new(10.0, 20.0, 80.0, 24.0));
    }

    #[test]
    fn test_elements_in_document_order() {
        let doc = FrameDocument::parse(PAGE);
        let names: Vec<&str> = doc.elements().map(|e| e.value().name()).collect();
        assert_eq!(names[..3], ["html", "head", "body"]);
    }
}
