//! Message transport between host and frame windows.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐                          ┌─────────────────────┐
//! │  Host window        │      postMessage         │  Frame window       │
//! │                     │ ───── ENABLE/DISABLE ──► │                     │
//! │  VisualEditor       │        CLEAR             │  FrameAgent         │
//! │  (one listener)     │ ◄──── READY/HOVER ────── │  (one listener)     │
//! │                     │        SELECT            │                     │
//! └─────────────────────┘                          └─────────────────────┘
//!                 MessageBus: FIFO queue, drained by dispatch()
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bus` | Windows, listeners, queued delivery |

// ============================================================================
// Submodules
// ============================================================================

/// In-process `postMessage` bus.
pub mod bus;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{MessageBus, MessageEvent, MessageHandler, TargetOrigin};
