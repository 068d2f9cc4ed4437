//! Selection list access.

use tracing::debug;

use crate::protocol::{ElementInfo, Message};

use super::core::VisualEditor;
use super::lifecycle::warn_not_initialized;

// ============================================================================
// VisualEditor - Selection
// ============================================================================

impl VisualEditor {
    /// Empties the selection and tells the frame to drop its highlight.
    ///
    /// Edit mode is unchanged and no callback fires. Before
    /// [`init`](Self::init) only the list is cleared and a warning is logged.
    pub fn clear_selection(&self) {
        let (cleared, bound) = {
            let mut state = self.inner.state.lock();
            let cleared = state.selection.len();
            state.selection.clear();
            (cleared, state.binding.is_some())
        };
        if bound {
            self.inner.post_control(&Message::Clear);
        } else {
            warn_not_initialized("clear_selection");
        }
        debug!(cleared, "Selection cleared");
    }

    /// Removes and returns the element at `index`, or `None` if out of range.
    pub fn remove_selection(&self, index: usize) -> Option<ElementInfo> {
        let mut state = self.inner.state.lock();
        if index >= state.selection.len() {
            return None;
        }
        Some(state.selection.remove(index))
    }

    /// Returns a snapshot of the selection, in pick order.
    #[must_use]
    pub fn selection(&self) -> Vec<ElementInfo> {
        self.inner.state.lock().selection.clone()
    }

    /// Returns the number of picked elements.
    #[must_use]
    pub fn selection_len(&self) -> usize {
        self.inner.state.lock().selection.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
