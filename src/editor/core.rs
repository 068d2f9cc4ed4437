//! Core VisualEditor struct and accessors.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, SessionId, WindowId};
use crate::protocol::ElementInfo;
use crate::transport::{MessageBus, TargetOrigin};

use super::builder::VisualEditorBuilder;
use super::options::EditorOptions;

// ============================================================================
// Types
// ============================================================================

/// Callback receiving an element descriptor.
pub type ElementHandler = Arc<dyn Fn(&ElementInfo) + Send + Sync>;

/// Callback invoked when the frame announces its instrumentation.
pub type ReadyHandler = Arc<dyn Fn() + Send + Sync>;

/// Edit-mode state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No frame bound.
    #[default]
    Uninitialized,
    /// Frame bound, picker off.
    Ready,
    /// Frame bound, picker on.
    Armed,
}

impl SessionState {
    /// Returns `true` if a frame is bound.
    #[inline]
    #[must_use]
    pub const fn is_bound(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// Returns `true` in edit mode.
    #[inline]
    #[must_use]
    pub const fn is_armed(self) -> bool {
        matches!(self, Self::Armed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Armed => "armed",
        })
    }
}

/// The iframe the controller binds to.
///
/// Holds the frame's content window and, when known, its `src`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameElement {
    window: WindowId,
    src: Option<Url>,
}

impl FrameElement {
    /// Creates a frame element for `window` with no `src`.
    #[inline]
    #[must_use]
    pub const fn new(window: WindowId) -> Self {
        Self { window, src: None }
    }

    /// Creates a frame element from a window on `bus`, taking its current
    /// URL as `src`.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`] if `window` is not registered.
    pub fn from_window(bus: &MessageBus, window: WindowId) -> Result<Self> {
        let src = bus.url(window).ok_or_else(|| Error::window_not_found(window))?;
        Ok(Self {
            window,
            src: Some(src),
        })
    }

    /// Sets the `src` attribute.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `src` does not parse.
    pub fn with_src(mut self, src: &str) -> Result<Self> {
        let url = Url::parse(src).map_err(|e| Error::invalid_url(src, e))?;
        self.src = Some(url);
        Ok(self)
    }

    /// Returns the content window (`iframe.contentWindow`).
    #[inline]
    #[must_use]
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Returns the `src`, if set.
    #[inline]
    #[must_use]
    pub fn src(&self) -> Option<&Url> {
        self.src.as_ref()
    }
}

/// The frame the controller is currently bound to.
#[derive(Debug)]
pub(crate) struct Binding {
    /// Bound frame.
    pub frame: FrameElement,
    /// Host-window listener routing frame messages.
    pub listener: ListenerId,
    /// Target origin for control messages.
    pub target_origin: TargetOrigin,
    /// `READY` received since the last load.
    pub frame_ready: bool,
}

/// Mutable controller state.
#[derive(Debug, Default)]
pub(crate) struct EditorState {
    /// Edit-mode state.
    pub session: SessionState,
    /// Current session, `None` while unbound.
    pub session_id: Option<SessionId>,
    /// Bound frame.
    pub binding: Option<Binding>,
    /// Picked elements in pick order.
    pub selection: Vec<ElementInfo>,
}

/// Internal shared state for a controller.
pub(crate) struct EditorInner {
    /// Bus carrying host and frame windows.
    pub bus: MessageBus,
    /// Window the controller lives in.
    pub host_window: WindowId,
    /// Configuration.
    pub options: EditorOptions,
    /// `SELECT` callback.
    pub on_element_selected: Option<ElementHandler>,
    /// `HOVER` callback.
    pub on_element_hover: Option<ElementHandler>,
    /// `READY` callback.
    pub on_ready: Option<ReadyHandler>,
    /// Mutable state.
    pub state: Mutex<EditorState>,
}

// ============================================================================
// VisualEditor
// ============================================================================

/// Host-side controller of the element picker.
///
/// Owns edit-mode state and the selection list for one frame at a time.
/// Dropping the controller releases its bus listener.
pub struct VisualEditor {
    pub(crate) inner: Arc<EditorInner>,
}

impl fmt::Debug for VisualEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("VisualEditor")
            .field("host_window", &self.inner.host_window)
            .field("session", &state.session)
            .field("session_id", &state.session_id)
            .field("selection_len", &state.selection.len())
            .finish_non_exhaustive()
    }
}

impl VisualEditor {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> VisualEditorBuilder {
        VisualEditorBuilder::new()
    }

    /// Creates a controller; called by [`VisualEditorBuilder::build`].
    pub(crate) fn new(
        bus: MessageBus,
        host_window: WindowId,
        options: EditorOptions,
        on_element_selected: Option<ElementHandler>,
        on_element_hover: Option<ElementHandler>,
        on_ready: Option<ReadyHandler>,
    ) -> Self {
        Self {
            inner: Arc::new(EditorInner {
                bus,
                host_window,
                options,
                on_element_selected,
                on_element_hover,
                on_ready,
                state: Mutex::new(EditorState::default()),
            }),
        }
    }
}

impl Drop for VisualEditor {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ============================================================================
// VisualEditor - Accessors
// ============================================================================

impl VisualEditor {
    /// Returns the edit-mode state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.lock().session
    }

    /// Returns `true` in edit mode.
    #[must_use]
    pub fn is_edit_mode(&self) -> bool {
        self.state().is_armed()
    }

    /// Returns the current session ID, `None` while unbound.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.state.lock().session_id
    }

    /// Returns the bound frame.
    #[must_use]
    pub fn frame(&self) -> Option<FrameElement> {
        self.inner
            .state
            .lock()
            .binding
            .as_ref()
            .map(|b| b.frame.clone())
    }

    /// Returns `true` once the bound frame has posted `READY` since its last
    /// load.
    #[must_use]
    pub fn is_frame_ready(&self) -> bool {
        self.inner
            .state
            .lock()
            .binding
            .as_ref()
            .is_some_and(|b| b.frame_ready)
    }

    /// Returns the host window.
    #[inline]
    #[must_use]
    pub fn host_window(&self) -> WindowId {
        self.inner.host_window
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        &self.inner.options
    }

    /// Returns the bus.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.inner.bus
    }
}

// ============================================================================
// Tests
// ============================================================================
