//! Cross-frame protocol message types.
//!
//! This module defines the envelope exchanged over `postMessage` between
//! the host controller and the frame instrumentation.
//!
//! # Protocol Overview
//!
//! ```text
//! Envelope    = { source: "visual-editor", type: MsgType, payload?: ElementInfo }
//! MsgType     = "READY" | "ENABLE" | "DISABLE" | "CLEAR" | "HOVER" | "SELECT"
//! ElementInfo = { tagName: string, selector: string, textContent: string }
//! ```
//!
//! Only JSON values cross the boundary. Live DOM nodes never do.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `element` | [`ElementInfo`] descriptor |
//! | `envelope` | [`Envelope`], [`Message`], [`MessageType`] |

// ============================================================================
// Submodules
// ============================================================================

/// Element descriptor.
pub mod element;

/// Envelope encoding and validation.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::ElementInfo;
pub use envelope::{Direction, Envelope, Message, MessageType, SOURCE_TAG};
