//! Element descriptor carried by `HOVER` and `SELECT` messages.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

// ============================================================================
// ElementInfo
// ============================================================================

/// Serializable descriptor of one hovered or picked DOM node.
///
/// This is the only representation of a node that crosses the frame
/// boundary.
///
/// # Format
///
/// ```json
/// {
///   "tagName": "BUTTON",
///   "selector": "#save",
///   "textContent": "Save"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    /// Uppercase tag name.
    pub tag_name: String,

    /// Selector that resolved to the node at capture time.
    pub selector: String,

    /// Trimmed text content, never truncated.
    pub text_content: String,
}

impl ElementInfo {
    /// Creates a descriptor, uppercasing the tag name and trimming the text.
    #[must_use]
    pub fn new(
        tag_name: impl AsRef<str>,
        selector: impl Into<String>,
        text_content: impl AsRef<str>,
    ) -> Self {
        Self {
            tag_name: tag_name.as_ref().to_ascii_uppercase(),
            selector: selector.into(),
            text_content: text_content.as_ref().trim().to_string(),
        }
    }

    /// Returns the text shortened to at most `max_chars` characters for display.
    ///
    /// An ellipsis is appended when the text was cut. The stored value is
    /// left untouched.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> Cow<'_, str> {
        match self.text_content.char_indices().nth(max_chars) {
            None => Cow::Borrowed(&self.text_content),
            Some((cut, _)) => Cow::Owned(format!("{}…", &self.text_content[..cut])),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
