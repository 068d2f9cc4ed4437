//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use visual_editor::{
    ElementInfo, FrameAgent, FrameDocument, FrameElement, Message, MessageBus, MessageEvent,
    MessageType, VisualEditor, WindowId,
};

/// Page used by most scenarios.
pub const SHOP_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Shop</title></head>
<body>
  <header><a href="/" id="home">Home</a></header>
  <main>
    <button id="save">Save</button>
    <ul>
      <li>Apples</li>
      <li>Pears</li>
      <li>Plums</li>
    </ul>
  </main>
</body>
</html>"#;

/// Installs a `tracing` subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Host + frame windows, a bound editor and an installed agent.
pub struct Harness {
    pub bus: MessageBus,
    pub host: WindowId,
    pub frame: WindowId,
    pub editor: VisualEditor,
    pub agent: FrameAgent,
    pub hovers: Arc<Mutex<Vec<ElementInfo>>>,
    pub selects: Arc<Mutex<Vec<ElementInfo>>>,
    pub ready: Arc<AtomicUsize>,
    pub frame_inbox: Arc<Mutex<Vec<Value>>>,
}

impl Harness {
    /// Builds the harness around `page`, with the frame at `https://site.test/`.
    pub fn new(page: &str) -> Self {
        init_tracing();

        let bus = MessageBus::new();
        let host = bus
            .open_window("https://admin.test/editor")
            .expect("should open host window");
        let frame = bus
            .open_frame(host, "https://site.test/")
            .expect("should open frame window");

        let hovers = Arc::new(Mutex::new(Vec::new()));
        let selects = Arc::new(Mutex::new(Vec::new()));
        let ready = Arc::new(AtomicUsize::new(0));
        let (h, s, r) = (Arc::clone(&hovers), Arc::clone(&selects), Arc::clone(&ready));

        let editor = VisualEditor::builder()
            .on_element_hover(move |info| h.lock().push(info.clone()))
            .on_element_selected(move |info| s.lock().push(info.clone()))
            .on_ready(move || {
                r.fetch_add(1, Ordering::SeqCst);
            })
            .build(&bus, host)
            .expect("should build editor");
        editor
            .init(FrameElement::from_window(&bus, frame).expect("should describe frame"))
            .expect("should bind editor");

        let agent = install_agent(&bus, frame, page);

        // Records control traffic; registered after the agent so it sees the
        // same messages in the same order.
        let frame_inbox = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&frame_inbox);
        bus.add_listener(
            frame,
            Arc::new(move |event: &MessageEvent| sink.lock().push(event.data.clone())),
        )
        .expect("should add frame recorder");

        bus.dispatch();

        Self {
            bus,
            host,
            frame,
            editor,
            agent,
            hovers,
            selects,
            ready,
            frame_inbox,
        }
    }

    /// Builds the harness around [`SHOP_PAGE`].
    pub fn shop() -> Self {
        Self::new(SHOP_PAGE)
    }

    /// Drains the bus.
    pub fn settle(&self) -> usize {
        self.bus.dispatch()
    }

    /// Control message types the frame received so far, then forgets them.
    pub fn take_control_messages(&self) -> Vec<MessageType> {
        self.frame_inbox
            .lock()
            .drain(..)
            .map(|data| {
                Message::from_value(&data)
                    .expect("control traffic should be valid envelopes")
                    .message_type()
            })
            .collect()
    }

    /// Node ID of the first element matching `selector` in the frame.
    pub fn node(&self, selector: &str) -> ego_tree::NodeId {
        self.agent
            .document()
            .query(selector)
            .expect("selector should parse")
            .expect("element should exist")
            .id()
    }

    /// Node ID of the `index`-th element matching `selector`.
    pub fn nth_node(&self, selector: &str, index: usize) -> ego_tree::NodeId {
        self.agent
            .document()
            .query_all(selector)
            .expect("selector should parse")[index]
            .id()
    }

    /// Posts `message` from the frame window straight to the host.
    pub fn force_deliver(&self, message: &Message) {
        self.bus
            .post_message(
                self.frame,
                self.host,
                &message.to_value(),
                &visual_editor::TargetOrigin::Any,
            )
            .expect("should post from frame");
    }
}

/// Runs the instrumentation in `frame` for `page`.
pub fn install_agent(bus: &MessageBus, frame: WindowId, page: &str) -> FrameAgent {
    FrameAgent::install(bus, frame, FrameDocument::parse(page))
        .expect("should install instrumentation")
        .into_agent()
        .expect("instrumentation should be fresh")
}
