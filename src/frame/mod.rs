//! Frame side of the picker.
//!
//! Everything that runs inside the inspected document: the document model,
//! the selector engine and the instrumentation that reports pointer
//! activity to the host.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `agent` | Instrumentation: control listener, pointer capture, overlay |
//! | `document` | Parsed HTML plus layout boxes |
//! | `script` | Injectable JavaScript rendition of the instrumentation |
//! | `selector` | Unique CSS selector computation |

// ============================================================================
// Submodules
// ============================================================================

/// Instrumentation agent.
pub mod agent;

/// Frame document model.
pub mod document;

/// Injectable instrumentation source.
pub mod script;

/// Selector engine.
pub mod selector;

// ============================================================================
// Re-exports
// ============================================================================

pub use agent::{
    FrameAgent, Highlight, INSTALL_MARKER, Installation, PointerEvent, PointerKind, PointerOutcome,
};
pub use document::{FrameDocument, Rect};
pub use script::{injection_snippet, instrumentation_script};
pub use selector::{compute_selector, describe, escape_identifier, resolves_uniquely};
