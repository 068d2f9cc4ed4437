//! Host-side controller.
//!
//! A [`VisualEditor`] binds to one iframe, drives its edit mode and
//! collects the elements the user picks.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | VisualEditor struct, state types and accessors |
//! | `builder` | Callback and option configuration |
//! | `options` | Target origin policy |
//! | `lifecycle` | init, frame load, edit mode, dispose |
//! | `selection` | Selection list access |
//! | `routing` | Frame message validation and dispatch |
//!
//! # State Machine
//!
//! ```text
//!                 init                enable / toggle
//! Uninitialized ───────► Ready ◄──────────────────────► Armed
//!       ▲                  ▲      disable / toggle        │
//!       │                  └──────── on_iframe_load ──────┘
//!       └──── dispose / drop (from any bound state)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let editor = VisualEditor::builder()
//!     .on_element_selected(|info| println!("{}", info.selector))
//!     .build(&bus, host)?;
//!
//! editor.init(FrameElement::from_window(&bus, frame)?)?;
//! editor.enable_edit_mode();
//! bus.dispatch();
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod builder;
mod core;
mod lifecycle;
mod options;
mod routing;
mod selection;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::VisualEditorBuilder;
pub use core::{ElementHandler, FrameElement, ReadyHandler, SessionState, VisualEditor};
pub use options::{EditorOptions, TargetOriginPolicy};
pub use routing::Routed;
