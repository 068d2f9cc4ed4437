//! Frame-side instrumentation.
//!
//! [`FrameAgent`] is the in-process rendition of the instrumentation
//! script: it listens for control messages from the parent window, turns
//! pointer events into `HOVER`/`SELECT` messages, and keeps a highlight
//! overlay that never touches the inspected document.
//!
//! # Lifecycle
//!
//! ```text
//! install ──► READY posted ──► ENABLE ──► armed ──► DISABLE ──► idle
//!    │                                      │
//!    └── marker already set: no-op          └── CLEAR: highlight dropped
//! ```
//!
//! Navigating the frame window wipes the marker and the control listener.
//! An agent whose document was navigated away is no longer live and lets
//! every pointer event pass through.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use ego_tree::NodeId;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::{ListenerId, WindowId};
use crate::protocol::{Direction, Message, MessageType};
use crate::transport::{MessageBus, MessageEvent, TargetOrigin};

use super::document::{FrameDocument, Rect};
use super::selector::describe;

// ============================================================================
// Constants
// ============================================================================

/// Window global that marks an installed instrumentation.
pub const INSTALL_MARKER: &str = "__visualEditorInstalled";

// ============================================================================
// Types
// ============================================================================

/// Pointer event kinds captured at the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// `mouseover`.
    Over,
    /// `mousemove`.
    Move,
    /// `click`.
    Click,
}

/// A pointer event as seen by the capture-phase listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// Event kind.
    pub kind: PointerKind,
    /// Event target (`event.target`).
    pub target: NodeId,
}

impl PointerEvent {
    /// Creates a `mouseover` event.
    #[inline]
    #[must_use]
    pub const fn over(target: NodeId) -> Self {
        Self {
            kind: PointerKind::Over,
            target,
        }
    }

    /// Creates a `mousemove` event.
    #[inline]
    #[must_use]
    pub const fn moved(target: NodeId) -> Self {
        Self {
            kind: PointerKind::Move,
            target,
        }
    }

    /// Creates a `click` event.
    #[inline]
    #[must_use]
    pub const fn click(target: NodeId) -> Self {
        Self {
            kind: PointerKind::Click,
            target,
        }
    }
}

/// What the capture listener did with a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerOutcome {
    /// `preventDefault()` was called.
    pub default_prevented: bool,
    /// `stopPropagation()` was called.
    pub propagation_stopped: bool,
    /// Message posted to the parent window, if any.
    pub posted: Option<MessageType>,
}

impl PointerOutcome {
    /// The event reaches the page untouched.
    const PASS_THROUGH: Self = Self {
        default_prevented: false,
        propagation_stopped: false,
        posted: None,
    };
}

/// The cosmetic overlay drawn over the hovered element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    /// Highlighted element.
    pub target: NodeId,
    /// Overlay position, from the element's bounding rect.
    pub rect: Rect,
}

/// Result of running the instrumentation in a frame window.
pub enum Installation {
    /// Fresh install; the agent owns the capture listeners.
    Installed(FrameAgent),
    /// An instance already runs in this document; nothing was registered.
    AlreadyInstalled,
}

impl fmt::Debug for Installation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed(agent) => f.debug_tuple("Installed").field(agent).finish(),
            Self::AlreadyInstalled => f.write_str("AlreadyInstalled"),
        }
    }
}

impl Installation {
    /// Returns the agent of a fresh install.
    #[must_use]
    pub fn into_agent(self) -> Option<FrameAgent> {
        match self {
            Self::Installed(agent) => Some(agent),
            Self::AlreadyInstalled => None,
        }
    }
}

/// Mutable instrumentation state, shared with the control listener.
#[derive(Debug, Default)]
struct AgentState {
    armed: bool,
    hovered: Option<NodeId>,
    highlight: Option<Highlight>,
}

impl AgentState {
    fn clear_highlight(&mut self) {
        self.hovered = None;
        self.highlight = None;
    }
}

// ============================================================================
// FrameAgent
// ============================================================================

/// Instrumentation running inside one frame document.
pub struct FrameAgent {
    bus: MessageBus,
    window: WindowId,
    parent: WindowId,
    listener: ListenerId,
    document: FrameDocument,
    state: Arc<Mutex<AgentState>>,
}

impl fmt::Debug for FrameAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameAgent")
            .field("window", &self.window)
            .field("parent", &self.parent)
            .field("listener", &self.listener)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl FrameAgent {
    /// Runs the instrumentation in `window`, which displays `document`.
    ///
    /// Registers the control listener, sets [`INSTALL_MARKER`] and posts
    /// `READY` to the parent window. If the marker is already present the
    /// call is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`](crate::Error::WindowNotFound) if `window`
    /// is not on the bus.
    pub fn install(bus: &MessageBus, window: WindowId, document: FrameDocument) -> Result<Installation> {
        if bus.global(window, INSTALL_MARKER).is_some() {
            debug!(window_id = %window, "Instrumentation already installed");
            return Ok(Installation::AlreadyInstalled);
        }

        // A top-level window is its own parent.
        let parent = bus.parent(window).unwrap_or(window);
        let state = Arc::new(Mutex::new(AgentState::default()));

        let listener_state = Arc::clone(&state);
        let listener = bus.add_listener(
            window,
            Arc::new(move |event: &MessageEvent| {
                handle_control(&listener_state, parent, event);
            }),
        )?;
        bus.set_global(window, INSTALL_MARKER, marker_value(listener))?;

        let agent = Self {
            bus: bus.clone(),
            window,
            parent,
            listener,
            document,
            state,
        };
        agent.post(&Message::Ready)?;

        debug!(window_id = %window, parent = %parent, "Instrumentation installed");
        Ok(Installation::Installed(agent))
    }

    /// Handles a pointer event captured at the document root.
    ///
    /// While armed, entering a new element posts `HOVER` and moves the
    /// overlay; a click posts `SELECT` and suppresses the page's default
    /// action. Otherwise the event passes through.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`](crate::Error::WindowNotFound) if the
    /// parent window was closed.
    pub fn dispatch_pointer(&self, event: PointerEvent) -> Result<PointerOutcome> {
        if !self.is_live() || !self.state.lock().armed {
            return Ok(PointerOutcome::PASS_THROUGH);
        }
        let Some(element) = self.document.element(event.target) else {
            return Ok(PointerOutcome::PASS_THROUGH);
        };

        match event.kind {
            PointerKind::Over | PointerKind::Move => {
                {
                    let mut state = self.state.lock();
                    if state.hovered == Some(event.target) {
                        return Ok(PointerOutcome::PASS_THROUGH);
                    }
                    state.hovered = Some(event.target);
                    state.highlight = Some(Highlight {
                        target: event.target,
                        rect: self.document.bounds(event.target),
                    });
                }
                self.post(&Message::Hover(describe(element)))?;
                Ok(PointerOutcome {
                    posted: Some(MessageType::Hover),
                    ..PointerOutcome::PASS_THROUGH
                })
            }
            PointerKind::Click => {
                self.post(&Message::Select(describe(element)))?;
                Ok(PointerOutcome {
                    default_prevented: true,
                    propagation_stopped: true,
                    posted: Some(MessageType::Select),
                })
            }
        }
    }

    /// Returns `true` while the document this agent was installed in is
    /// still loaded.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.bus.global(self.window, INSTALL_MARKER) == Some(marker_value(self.listener))
    }

    /// Returns `true` if pointer capture is on.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.lock().armed
    }

    /// Returns the current overlay, if any.
    #[must_use]
    pub fn highlight(&self) -> Option<Highlight> {
        self.state.lock().highlight
    }

    /// Returns the frame window.
    #[inline]
    #[must_use]
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Returns the inspected document.
    #[inline]
    #[must_use]
    pub fn document(&self) -> &FrameDocument {
        &self.document
    }

    fn post(&self, message: &Message) -> Result<()> {
        trace!(window_id = %self.window, message_type = %message.message_type(), "Posting to parent");
        self.bus
            .post_message(self.window, self.parent, &message.to_value(), &TargetOrigin::Any)
    }
}

// ============================================================================
// Control Listener
// ============================================================================

fn handle_control(state: &Mutex<AgentState>, parent: WindowId, event: &MessageEvent) {
    if event.source != Some(parent) {
        trace!(source = ?event.source, "Ignoring message from non-parent window");
        return;
    }

    let message = match Message::from_value_directed(&event.data, Direction::HostToFrame) {
        Ok(message) => message,
        Err(e) => {
            trace!(error = %e, "Ignoring message");
            return;
        }
    };

    let mut state = state.lock();
    match message {
        Message::Enable => state.armed = true,
        Message::Disable => {
            state.armed = false;
            state.clear_highlight();
        }
        Message::Clear => state.clear_highlight(),
        Message::Ready | Message::Hover(_) | Message::Select(_) => {}
    }
    trace!(armed = state.armed, "Control message applied");
}

/// Marker value identifying the document instance that owns `listener`.
fn marker_value(listener: ListenerId) -> Value {
    json!(listener.as_u64())
}

// ============================================================================
// Tests
// ============================================================================
