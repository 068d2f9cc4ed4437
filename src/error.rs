//! Error types for the visual editor.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible operations return [`Result<T>`] which uses [`Error`]. Errors on
//! the message path are never propagated to the bus: the listener logs them
//! and drops the message.
//!
//! ```ignore
//! use visual_editor::{Error, Result};
//!
//! fn route(editor: &VisualEditor, event: &MessageEvent) -> Result<()> {
//!     match editor.handle_iframe_message(event) {
//!         Err(e) if e.is_dropped_message() => Ok(()),
//!         other => other.map(|_| ()),
//!     }
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Message | [`Error::InvalidMessageOrigin`], [`Error::MalformedEnvelope`], [`Error::StaleSessionMessage`] |
//! | Lifecycle | [`Error::NotInitialized`] |
//! | Bus | [`Error::WindowNotFound`], [`Error::InvalidUrl`] |
//! | Document | [`Error::InvalidSelector`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::WindowId;
use crate::protocol::MessageType;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Message Errors
    // ========================================================================
    /// Message did not come from the bound frame window.
    #[error("Invalid message origin: expected {expected}, got {}", describe_source(.actual))]
    InvalidMessageOrigin {
        /// Content window of the bound frame.
        expected: WindowId,
        /// `event.source` of the rejected message.
        actual: Option<WindowId>,
    },

    /// Message data is not a protocol envelope.
    ///
    /// Covers a missing or wrong `source` tag, an unknown `type`, a payload
    /// of the wrong shape, and messages travelling in the wrong direction.
    #[error("Malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with the data.
        reason: String,
    },

    /// Message arrived while the session was not armed.
    #[error("Stale session message: {message_type} received while edit mode is off")]
    StaleSessionMessage {
        /// Type of the stale message.
        message_type: MessageType,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Operation requires a bound frame.
    #[error("Not initialized: {operation} called before init")]
    NotInitialized {
        /// Name of the operation that was attempted.
        operation: &'static str,
    },

    // ========================================================================
    // Bus Errors
    // ========================================================================
    /// Window is not registered on the bus.
    #[error("Window not found: {window_id}")]
    WindowNotFound {
        /// The missing window ID.
        window_id: WindowId,
    },

    /// URL could not be parsed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },

    // ========================================================================
    // Document Errors
    // ========================================================================
    /// CSS selector could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// The rejected selector.
        selector: String,
        /// Parser message.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Renders an optional `event.source` for error messages.
fn describe_source(source: &Option<WindowId>) -> String {
    source.map_or_else(|| "no source window".to_string(), |id| id.to_string())
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid message origin error.
    #[inline]
    pub fn invalid_message_origin(expected: WindowId, actual: Option<WindowId>) -> Self {
        Self::InvalidMessageOrigin { expected, actual }
    }

    /// Creates a malformed envelope error.
    #[inline]
    pub fn malformed_envelope(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            reason: reason.into(),
        }
    }

    /// Creates a stale session message error.
    #[inline]
    pub fn stale_session_message(message_type: MessageType) -> Self {
        Self::StaleSessionMessage { message_type }
    }

    /// Creates a not initialized error.
    #[inline]
    pub fn not_initialized(operation: &'static str) -> Self {
        Self::NotInitialized { operation }
    }

    /// Creates a window not found error.
    #[inline]
    pub fn window_not_found(window_id: WindowId) -> Self {
        Self::WindowNotFound { window_id }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the message router drops the message for this error.
    ///
    /// These errors are recovered locally and only logged.
    #[inline]
    #[must_use]
    pub fn is_dropped_message(&self) -> bool {
        matches!(
            self,
            Self::InvalidMessageOrigin { .. }
                | Self::MalformedEnvelope { .. }
                | Self::StaleSessionMessage { .. }
        )
    }

    /// Returns `true` if this is a lifecycle error.
    #[inline]
    #[must_use]
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self, Self::NotInitialized { .. })
    }

    /// Returns `true` if this is a bus error.
    #[inline]
    #[must_use]
    pub fn is_bus_error(&self) -> bool {
        matches!(self, Self::WindowNotFound { .. } | Self::InvalidUrl { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::malformed_envelope("unknown message type: PING");
        assert_eq!(
            err.to_string(),
            "Malformed envelope: unknown message type: PING"
        );
    }

    #[test]
    fn test_origin_display_without_source() {
        let expected = WindowId::next();
        let err = Error::invalid_message_origin(expected, None);
        assert!(err.to_string().ends_with("got no source window"));
    }

    #[test]
    fn test_stale_display() {
        let err = Error::stale_session_message(MessageType::Hover);
        assert_eq!(
            err.to_string(),
            "Stale session message: HOVER received while edit mode is off"
        );
    }

    #[test]
    fn test_is_dropped_message() {
        assert!(Error::malformed_envelope("x").is_dropped_message());
        assert!(Error::invalid_message_origin(WindowId::next(), None).is_dropped_message());
        assert!(Error::stale_session_message(MessageType::Hover).is_dropped_message());
        assert!(!Error::not_initialized("enable_edit_mode").is_dropped_message());
    }

    #[test]
    fn test_is_lifecycle_error() {
        assert!(Error::not_initialized("init").is_lifecycle_error());
        assert!(!Error::window_not_found(WindowId::next()).is_lifecycle_error());
    }

    #[test]
    fn test_is_bus_error() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        assert!(Error::invalid_url("not a url", parse_err).is_bus_error());
        assert!(Error::window_not_found(WindowId::next()).is_bus_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
