//! Binding, edit mode and teardown.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, WindowId};
use crate::protocol::Message;
use crate::transport::{MessageEvent, MessageHandler, TargetOrigin};

use super::core::{Binding, EditorInner, FrameElement, SessionState, VisualEditor};

// ============================================================================
// VisualEditor - Binding
// ============================================================================

impl VisualEditor {
    /// Binds the controller to `frame`.
    ///
    /// Registers one `message` listener on the host window that accepts
    /// messages from `frame`'s content window only. A previous binding is
    /// released first, including a rebind to the same frame. Starts a new
    /// session in [`SessionState::Ready`]; the selection is kept.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`] if the host window was closed.
    pub fn init(&self, frame: FrameElement) -> Result<()> {
        self.release_binding();

        let weak = Arc::downgrade(&self.inner);
        let handler: MessageHandler = Arc::new(move |event: &MessageEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.deliver(event);
            }
        });
        let listener = self.inner.bus.add_listener(self.inner.host_window, handler)?;

        let target_origin = self.inner.options.target_origin.resolve(&frame);
        let session_id = SessionId::generate();
        let frame_window = frame.window();

        {
            let mut state = self.inner.state.lock();
            state.session = SessionState::Ready;
            state.session_id = Some(session_id);
            state.binding = Some(Binding {
                frame,
                listener,
                target_origin: target_origin.clone(),
                frame_ready: false,
            });
        }

        info!(
            session_id = %session_id,
            frame_window = %frame_window,
            target_origin = %target_origin,
            "Visual editor bound to frame"
        );
        Ok(())
    }

    /// Handles a (re)load of the bound frame.
    ///
    /// The new document starts unarmed, so the controller drops back to
    /// [`SessionState::Ready`] under a fresh session ID. Nothing is posted.
    pub fn on_iframe_load(&self) {
        let mut state = self.inner.state.lock();
        let Some(binding) = state.binding.as_mut() else {
            warn_not_initialized("on_iframe_load");
            return;
        };
        binding.frame_ready = false;

        let previous = state.session;
        let session_id = SessionId::generate();
        state.session = SessionState::Ready;
        state.session_id = Some(session_id);

        debug!(session_id = %session_id, previous = %previous, "Frame loaded, session reset");
    }

    /// Releases the bus listener and returns to
    /// [`SessionState::Uninitialized`].
    ///
    /// An armed frame is sent `DISABLE` first. Idempotent; also run on drop.
    pub fn dispose(&self) {
        if self.release_binding() {
            debug!(host_window = %self.inner.host_window, "Visual editor disposed");
        }
    }

    /// Drops the current binding. Returns `false` if there was none.
    fn release_binding(&self) -> bool {
        let (binding, was_armed) = {
            let mut state = self.inner.state.lock();
            let was_armed = state.session.is_armed();
            state.session = SessionState::Uninitialized;
            state.session_id = None;
            (state.binding.take(), was_armed)
        };
        let Some(binding) = binding else {
            return false;
        };

        if was_armed {
            self.inner
                .post(binding.frame.window(), &binding.target_origin, &Message::Disable);
        }
        self.inner
            .bus
            .remove_listener(self.inner.host_window, binding.listener);
        true
    }
}

// ============================================================================
// VisualEditor - Edit Mode
// ============================================================================

impl VisualEditor {
    /// Turns edit mode on and returns the new state.
    ///
    /// Posts `ENABLE` only when the state changes. Returns `false` with a
    /// warning before [`init`](Self::init).
    pub fn enable_edit_mode(&self) -> bool {
        self.set_edit_mode(true, "enable_edit_mode")
    }

    /// Turns edit mode off and returns the new state.
    ///
    /// Posts `DISABLE` only when the state changes. A `SELECT` the frame
    /// queued before receiving it is still delivered and recorded.
    pub fn disable_edit_mode(&self) -> bool {
        self.set_edit_mode(false, "disable_edit_mode")
    }

    /// Flips edit mode and returns the new state.
    pub fn toggle_edit_mode(&self) -> bool {
        let target = {
            let state = self.inner.state.lock();
            if !state.session.is_bound() {
                warn_not_initialized("toggle_edit_mode");
                return false;
            }
            !state.session.is_armed()
        };
        self.set_edit_mode(target, "toggle_edit_mode")
    }

    fn set_edit_mode(&self, armed: bool, operation: &'static str) -> bool {
        let session_id = {
            let mut state = self.inner.state.lock();
            if !state.session.is_bound() {
                warn_not_initialized(operation);
                return false;
            }
            if state.session.is_armed() == armed {
                return armed;
            }
            state.session = if armed {
                SessionState::Armed
            } else {
                SessionState::Ready
            };
            state.session_id
        };

        let message = if armed { Message::Enable } else { Message::Disable };
        self.inner.post_control(&message);

        debug!(session_id = ?session_id, armed, "Edit mode changed");
        armed
    }
}

// ============================================================================
// EditorInner - Posting
// ============================================================================

impl EditorInner {
    /// Posts a control message to the bound frame, if any.
    pub(super) fn post_control(&self, message: &Message) {
        let target = self
            .state
            .lock()
            .binding
            .as_ref()
            .map(|b| (b.frame.window(), b.target_origin.clone()));

        if let Some((frame_window, target_origin)) = target {
            self.post(frame_window, &target_origin, message);
        }
    }

    /// Posts `message` to `frame_window`. Bus failures are logged.
    pub(super) fn post(&self, frame_window: WindowId, target_origin: &TargetOrigin, message: &Message) {
        if let Err(e) = self.bus.post_message(
            self.host_window,
            frame_window,
            &message.to_value(),
            target_origin,
        ) {
            warn!(
                frame_window = %frame_window,
                message_type = %message.message_type(),
                error = %e,
                "Failed to post control message"
            );
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Logs a lifecycle call made before `init`.
pub(super) fn warn_not_initialized(operation: &'static str) {
    let error = Error::not_initialized(operation);
    warn!(operation, error = %error, "Visual editor not initialized");
}

// ============================================================================
// Tests
// ============================================================================
