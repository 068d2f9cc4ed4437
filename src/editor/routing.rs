//! Frame message routing.
//!
//! Every message reaching the host window goes through
//! [`VisualEditor::handle_iframe_message`]:
//!
//! 1. `event.source` must be the bound frame's content window
//! 2. `event.data` must be a tagged envelope travelling frame → host
//! 3. the message is routed by type
//!
//! | Type | While armed | While ready |
//! |------|-------------|-------------|
//! | `HOVER` | `on_element_hover` | dropped as stale |
//! | `SELECT` | append, `on_element_selected` | honored, logged as stale |
//! | `READY` | mark frame ready, `on_ready` | same |
//!
//! Callbacks run after the state lock is released, so they may call back
//! into the controller.

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Direction, Message, MessageType};
use crate::transport::MessageEvent;

use super::core::{EditorInner, SessionState, VisualEditor};

// ============================================================================
// Types
// ============================================================================

/// What the router did with an accepted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// `READY`: the frame's instrumentation is installed.
    Ready,
    /// `HOVER` forwarded to the hover callback.
    Hovered,
    /// `SELECT` appended to the selection at `index`.
    Selected {
        /// Position in the selection list.
        index: usize,
    },
}

// ============================================================================
// VisualEditor - Routing
// ============================================================================

impl VisualEditor {
    /// Validates and routes one message delivered to the host window.
    ///
    /// The bus listener installed by [`init`](Self::init) calls this and
    /// only logs the error; hosts with their own event plumbing may call it
    /// directly.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] if no frame is bound
    /// - [`Error::InvalidMessageOrigin`] if the sender is not the bound frame
    /// - [`Error::MalformedEnvelope`] if the data is not a frame → host envelope
    /// - [`Error::StaleSessionMessage`] for `HOVER` outside edit mode
    pub fn handle_iframe_message(&self, event: &MessageEvent) -> Result<Routed> {
        self.inner.route(event)
    }
}

// ============================================================================
// EditorInner - Routing
// ============================================================================

impl EditorInner {
    /// Entry point of the host-window listener.
    pub(super) fn deliver(&self, event: &MessageEvent) {
        match self.route(event) {
            Ok(routed) => trace!(routed = ?routed, "Frame message routed"),
            Err(e) if e.is_dropped_message() => {
                debug!(origin = %event.origin, error = %e, "Dropped frame message");
            }
            Err(e) => warn!(error = %e, "Frame message not routed"),
        }
    }

    pub(super) fn route(&self, event: &MessageEvent) -> Result<Routed> {
        let message = {
            let state = self.state.lock();
            let binding = state
                .binding
                .as_ref()
                .ok_or_else(|| Error::not_initialized("handle_iframe_message"))?;

            let expected = binding.frame.window();
            if event.source != Some(expected) {
                return Err(Error::invalid_message_origin(expected, event.source));
            }
            Message::from_value_directed(&event.data, Direction::FrameToHost)?
        };

        match message {
            Message::Ready => self.route_ready(),
            Message::Hover(info) => {
                let session = self.state.lock().session;
                if session != SessionState::Armed {
                    return Err(Error::stale_session_message(MessageType::Hover));
                }
                if let Some(handler) = &self.on_element_hover {
                    handler(&info);
                }
                Ok(Routed::Hovered)
            }
            Message::Select(info) => {
                let index = {
                    let mut state = self.state.lock();
                    if state.session != SessionState::Armed {
                        debug!(
                            session_id = ?state.session_id,
                            error = %Error::stale_session_message(MessageType::Select),
                            "Recording in-flight selection"
                        );
                    }
                    state.selection.push(info.clone());
                    state.selection.len() - 1
                };
                if let Some(handler) = &self.on_element_selected {
                    handler(&info);
                }
                debug!(index, selector = %info.selector, "Element selected");
                Ok(Routed::Selected { index })
            }
            Message::Enable | Message::Disable | Message::Clear => Err(Error::malformed_envelope(
                format!("{} is a host → frame message", message.message_type()),
            )),
        }
    }

    fn route_ready(&self) -> Result<Routed> {
        {
            let mut state = self.state.lock();
            if let Some(binding) = state.binding.as_mut() {
                binding.frame_ready = true;
            }
            debug!(session_id = ?state.session_id, "Frame instrumentation ready");
        }
        if let Some(handler) = &self.on_ready {
            handler();
        }
        Ok(Routed::Ready)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, OnceLock, Weak};

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::editor::FrameElement;
    use crate::identifiers::WindowId;
    use crate::protocol::ElementInfo;
    use crate::transport::MessageBus;

    struct Fixture {
        frame: WindowId,
        editor: VisualEditor,
        hovers: Arc<Mutex<Vec<ElementInfo>>>,
        selects: Arc<Mutex<Vec<ElementInfo>>>,
    }

    fn fixture() -> Fixture {
        let bus = MessageBus::new();
        let host = bus.open_window("https://host.test/").expect("host");
        let frame = bus.open_frame(host, "https://site.test/").expect("frame");
        let hovers = Arc::new(Mutex::new(Vec::new()));
        let selects = Arc::new(Mutex::new(Vec::new()));
        let (h, s) = (Arc::clone(&hovers), Arc::clone(&selects));

        let editor = VisualEditor::builder()
            .on_element_hover(move |info| h.lock().push(info.clone()))
            .on_element_selected(move |info| s.lock().push(info.clone()))
            .build(&bus, host)
            .expect("build");
        editor.init(FrameElement::new(frame)).expect("init");

        Fixture {
            frame,
            editor,
            hovers,
            selects,
        }
    }

    fn from_frame(f: &Fixture, message: &Message) -> MessageEvent {
        MessageEvent::new(Some(f.frame), "https://site.test", message.to_value())
    }

    fn button() -> ElementInfo {
        ElementInfo::new("BUTTON", "#save", "Save")
    }

    #[test]
    fn test_select_appends_and_calls_back() {
        let f = fixture();
        f.editor.enable_edit_mode();

        let routed = f
            .editor
            .handle_iframe_message(&from_frame(&f, &Message::Select(button())))
            .expect("routed");
        assert_eq!(routed, Routed::Selected { index: 0 });
        assert_eq!(f.editor.selection(), vec![button()]);
        assert_eq!(*f.selects.lock(), vec![button()]);
    }

    #[test]
    fn test_duplicate_picks_are_kept() {
        let f = fixture();
        f.editor.enable_edit_mode();
        for _ in 0..2 {
            f.editor
                .handle_iframe_message(&from_frame(&f, &Message::Select(button())))
                .expect("routed");
        }
        assert_eq!(f.editor.selection_len(), 2);
    }

    #[test]
    fn test_hover_does_not_mutate_selection() {
        let f = fixture();
        f.editor.enable_edit_mode();
        let routed = f
            .editor
            .handle_iframe_message(&from_frame(&f, &Message::Hover(button())))
            .expect("routed");
        assert_eq!(routed, Routed::Hovered);
        assert_eq!(f.editor.selection_len(), 0);
        assert_eq!(f.hovers.lock().len(), 1);
    }

    #[test]
    fn test_hover_while_ready_is_stale() {
        let f = fixture();
        let result = f
            .editor
            .handle_iframe_message(&from_frame(&f, &Message::Hover(button())));
        assert!(matches!(result, Err(Error::StaleSessionMessage { .. })));
        assert!(f.hovers.lock().is_empty());
    }

    #[test]
    fn test_select_while_ready_is_honored() {
        let f = fixture();
        let routed = f
            .editor
            .handle_iframe_message(&from_frame(&f, &Message::Select(button())))
            .expect("routed");
        assert_eq!(routed, Routed::Selected { index: 0 });
        assert_eq!(f.selects.lock().len(), 1);
    }

    #[test]
    fn test_foreign_source_is_rejected() {
        let f = fixture();
        f.editor.enable_edit_mode();
        let stranger = WindowId::next();
        let event = MessageEvent::new(
            Some(stranger),
            "https://evil.test",
            Message::Select(button()).to_value(),
        );
        let result = f.editor.handle_iframe_message(&event);
        assert!(matches!(result, Err(Error::InvalidMessageOrigin { .. })));

        let sourceless = MessageEvent::new(None, "null", Message::Select(button()).to_value());
        assert!(f.editor.handle_iframe_message(&sourceless).is_err());
        assert_eq!(f.editor.selection_len(), 0);
        assert!(f.selects.lock().is_empty());
    }

    #[test]
    fn test_malformed_data_is_rejected() {
        let f = fixture();
        f.editor.enable_edit_mode();
        for data in [
            json!({ "source": "visual-editor", "type": "PING" }),
            json!({ "source": "other", "type": "SELECT", "payload": {} }),
            json!("SELECT"),
            json!({ "source": "visual-editor", "type": "SELECT" }),
            Message::Enable.to_value(),
        ] {
            let event = MessageEvent::new(Some(f.frame), "https://site.test", data);
            let result = f.editor.handle_iframe_message(&event);
            assert!(
                matches!(result, Err(Error::MalformedEnvelope { .. })),
                "got {result:?}"
            );
        }
        assert_eq!(f.editor.selection_len(), 0);
    }

    #[test]
    fn test_ready_marks_frame() {
        let f = fixture();
        assert!(!f.editor.is_frame_ready());
        let routed = f
            .editor
            .handle_iframe_message(&from_frame(&f, &Message::Ready))
            .expect("routed");
        assert_eq!(routed, Routed::Ready);
        assert!(f.editor.is_frame_ready());

        f.editor.on_iframe_load();
        assert!(!f.editor.is_frame_ready());
    }

    #[test]
    fn test_unbound_editor_rejects_messages() {
        let f = fixture();
        f.editor.dispose();
        let result = f
            .editor
            .handle_iframe_message(&from_frame(&f, &Message::Ready));
        assert!(matches!(result, Err(Error::NotInitialized { .. })));
    }

    #[test]
    fn test_callbacks_may_reenter() {
        let bus = MessageBus::new();
        let host = bus.open_window("https://host.test/").expect("host");
        let frame = bus.open_frame(host, "https://site.test/").expect("frame");

        let slot: Arc<OnceLock<Weak<VisualEditor>>> = Arc::new(OnceLock::new());
        let seen_len = Arc::new(Mutex::new(0));
        let (lookup, sink) = (Arc::clone(&slot), Arc::clone(&seen_len));

        let editor = Arc::new(
            VisualEditor::builder()
                .on_element_selected(move |_| {
                    if let Some(editor) = lookup.get().and_then(Weak::upgrade) {
                        *sink.lock() = editor.selection_len();
                    }
                })
                .build(&bus, host)
                .expect("build"),
        );
        slot.set(Arc::downgrade(&editor)).expect("slot");
        editor.init(FrameElement::new(frame)).expect("init");

        let event = MessageEvent::new(
            Some(frame),
            "https://site.test",
            Message::Select(button()).to_value(),
        );
        editor.handle_iframe_message(&event).expect("routed");
        assert_eq!(*seen_len.lock(), 1);
    }
}
