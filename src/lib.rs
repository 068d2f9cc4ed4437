//! Visual Editor - cross-frame element picker.
//!
//! A host page embeds a site in an iframe, switches on edit mode, and the
//! user hovers and clicks elements inside the frame. Each pick reaches the
//! host as an [`ElementInfo`]: tag name, a CSS selector that resolves to
//! the element, and its text.
//!
//! # Architecture
//!
//! Two windows talk over `postMessage`:
//!
//! - **Host (controller)**: [`VisualEditor`] owns edit mode and the
//!   selection list, posts control messages, routes frame messages
//! - **Frame (instrumentation)**: [`FrameAgent`] captures pointer events,
//!   draws the highlight, posts `HOVER` and `SELECT`
//!
//! Key design principles:
//!
//! - Only JSON envelopes cross the boundary, tagged `"visual-editor"`
//! - The controller accepts messages from its bound frame window only
//! - The inspected document is never mutated
//! - [`MessageBus`] reproduces browser delivery: cloned data, FIFO,
//!   target-origin filtering, listeners dropped on navigation
//!
//! # Quick Start
//!
//! ```no_run
//! use visual_editor::{FrameAgent, FrameDocument, FrameElement, MessageBus, Result, VisualEditor};
//!
//! fn main() -> Result<()> {
//!     let bus = MessageBus::new();
//!     let host = bus.open_window("https://admin.example.com/editor")?;
//!     let frame = bus.open_frame(host, "https://site.example.com/")?;
//!
//!     let editor = VisualEditor::builder()
//!         .on_element_selected(|info| println!("picked {} ({})", info.selector, info.tag_name))
//!         .build(&bus, host)?;
//!     editor.init(FrameElement::from_window(&bus, frame)?)?;
//!
//!     let document = FrameDocument::parse("<html><body><button id=\"buy\">Buy</button></body></html>");
//!     let _agent = FrameAgent::install(&bus, frame, document)?;
//!
//!     editor.enable_edit_mode();
//!     bus.dispatch();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`editor`] | Host controller: [`VisualEditor`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`frame`] | Frame side: document, selector engine, instrumentation |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Envelope and element descriptor |
//! | [`transport`] | In-process `postMessage` bus |

// ============================================================================
// Modules
// ============================================================================

/// Host-side controller.
///
/// Use [`VisualEditor::builder()`] to create a configured controller.
pub mod editor;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Frame-side document model, selector engine and instrumentation.
pub mod frame;

/// Type-safe identifiers for windows, listeners and sessions.
pub mod identifiers;

/// Cross-frame protocol message types.
pub mod protocol;

/// Message transport between windows.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Editor types
pub use editor::{
    EditorOptions, FrameElement, Routed, SessionState, TargetOriginPolicy, VisualEditor,
    VisualEditorBuilder,
};

// Error types
pub use error::{Error, Result};

// Frame types
pub use frame::{
    FrameAgent, FrameDocument, Highlight, Installation, PointerEvent, PointerKind, PointerOutcome,
    Rect, compute_selector, injection_snippet, instrumentation_script,
};

// Identifier types
pub use identifiers::{ListenerId, SessionId, WindowId};

// Protocol types
pub use protocol::{ElementInfo, Message, MessageType};

// Transport types
pub use transport::{MessageBus, MessageEvent, TargetOrigin};
