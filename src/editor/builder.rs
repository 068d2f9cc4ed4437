//! Builder pattern for controller configuration.
//!
//! # Example
//!
//! ```ignore
//! use visual_editor::{MessageBus, VisualEditor};
//!
//! let bus = MessageBus::new();
//! let host = bus.open_window("https://admin.example.com/editor")?;
//!
//! let editor = VisualEditor::builder()
//!     .on_element_selected(|info| println!("picked {}", info.selector))
//!     .on_element_hover(|info| println!("over {}", info.tag_name))
//!     .build(&bus, host)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::identifiers::WindowId;
use crate::protocol::ElementInfo;
use crate::transport::MessageBus;

use super::core::{ElementHandler, ReadyHandler, VisualEditor};
use super::options::EditorOptions;

// ============================================================================
// VisualEditorBuilder
// ============================================================================

/// Builder for configuring a [`VisualEditor`].
///
/// Use [`VisualEditor::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct VisualEditorBuilder {
    /// Configuration.
    options: EditorOptions,
    /// `SELECT` callback.
    on_element_selected: Option<ElementHandler>,
    /// `HOVER` callback.
    on_element_hover: Option<ElementHandler>,
    /// `READY` callback.
    on_ready: Option<ReadyHandler>,
}

impl fmt::Debug for VisualEditorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualEditorBuilder")
            .field("options", &self.options)
            .field("on_element_selected", &self.on_element_selected.is_some())
            .field("on_element_hover", &self.on_element_hover.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}

// ============================================================================
// VisualEditorBuilder Implementation
// ============================================================================

impl VisualEditorBuilder {
    /// Creates a builder with no callbacks and default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the callback for picked elements.
    ///
    /// Called once per `SELECT`, after the element was appended to the
    /// selection.
    #[must_use]
    pub fn on_element_selected<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ElementInfo) + Send + Sync + 'static,
    {
        self.on_element_selected = Some(Arc::new(handler));
        self
    }

    /// Sets the callback for hovered elements.
    #[must_use]
    pub fn on_element_hover<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ElementInfo) + Send + Sync + 'static,
    {
        self.on_element_hover = Some(Arc::new(handler));
        self
    }

    /// Sets the callback for the frame's `READY` announcement.
    #[must_use]
    pub fn on_ready<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_ready = Some(Arc::new(handler));
        self
    }

    /// Sets the options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds a controller living in `host_window`.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`] if `host_window` is not on `bus`.
    pub fn build(self, bus: &MessageBus, host_window: WindowId) -> Result<VisualEditor> {
        if !bus.contains(host_window) {
            return Err(Error::window_not_found(host_window));
        }

        Ok(VisualEditor::new(
            bus.clone(),
            host_window,
            self.options,
            self.on_element_selected,
            self.on_element_hover,
            self.on_ready,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
