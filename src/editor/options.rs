//! Host controller configuration.
//!
//! # Example
//!
//! ```ignore
//! use visual_editor::EditorOptions;
//!
//! // Only deliver control messages to the admin preview origin.
//! let options = EditorOptions::new().with_exact_target_origin("https://preview.example.com");
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::transport::TargetOrigin;

use super::core::FrameElement;

// ============================================================================
// TargetOriginPolicy
// ============================================================================

/// How the controller picks the `targetOrigin` of control messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetOriginPolicy {
    /// Use the origin of the frame's `src`; `"*"` when the frame has no
    /// `src` or its origin is opaque.
    #[default]
    FrameSrc,
    /// Always `"*"`.
    Any,
    /// Always this serialized origin.
    Exact(String),
}

impl TargetOriginPolicy {
    /// Resolves the target origin for `frame`.
    #[must_use]
    pub fn resolve(&self, frame: &FrameElement) -> TargetOrigin {
        match self {
            Self::FrameSrc => frame.src().map_or(TargetOrigin::Any, TargetOrigin::from_url),
            Self::Any => TargetOrigin::Any,
            Self::Exact(origin) => TargetOrigin::Exact(origin.clone()),
        }
    }
}

// ============================================================================
// EditorOptions
// ============================================================================

/// Configuration for a [`VisualEditor`](super::VisualEditor).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorOptions {
    /// Target origin used when posting `ENABLE`, `DISABLE` and `CLEAR`.
    pub target_origin: TargetOriginPolicy,
}

// ============================================================================
// Constructors
// ============================================================================

impl EditorOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target_origin: TargetOriginPolicy::FrameSrc,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl EditorOptions {
    /// Sets the target origin policy.
    #[inline]
    #[must_use]
    pub fn with_target_origin(mut self, policy: TargetOriginPolicy) -> Self {
        self.target_origin = policy;
        self
    }

    /// Posts control messages with target origin `"*"`.
    #[inline]
    #[must_use]
    pub fn with_any_target_origin(mut self) -> Self {
        self.target_origin = TargetOriginPolicy::Any;
        self
    }

    /// Posts control messages only to `origin`.
    #[inline]
    #[must_use]
    pub fn with_exact_target_origin(mut self, origin: impl Into<String>) -> Self {
        self.target_origin = TargetOriginPolicy::Exact(origin.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::WindowId;

    #[test]
    fn test_new_matches_default() {
        assert_eq!(EditorOptions::new(), EditorOptions::default());
        assert_eq!(EditorOptions::new().target_origin, TargetOriginPolicy::FrameSrc);
    }

    #[test]
    fn test_builder_methods() {
        let options = EditorOptions::new().with_exact_target_origin("https://a.test");
        assert_eq!(
            options.target_origin,
            TargetOriginPolicy::Exact("https://a.test".into())
        );
        let options = options.with_any_target_origin();
        assert_eq!(options.target_origin, TargetOriginPolicy::Any);
    }

    #[test]
    fn test_frame_src_policy() {
        let frame = FrameElement::new(WindowId::next())
            .with_src("https://site.test/page")
            .expect("src");
        assert_eq!(
            TargetOriginPolicy::FrameSrc.resolve(&frame),
            TargetOrigin::Exact("https://site.test".into())
        );

        let srcless = FrameElement::new(WindowId::next());
        assert_eq!(TargetOriginPolicy::FrameSrc.resolve(&srcless), TargetOrigin::Any);

        let blank = FrameElement::new(WindowId::next())
            .with_src("about:blank")
            .expect("src");
        assert_eq!(TargetOriginPolicy::FrameSrc.resolve(&blank), TargetOrigin::Any);
    }

    #[test]
    fn test_exact_policy_ignores_src() {
        let frame = FrameElement::new(WindowId::next())
            .with_src("https://site.test/")
            .expect("src");
        let policy = TargetOriginPolicy::Exact("https://other.test".into());
        assert_eq!(
            policy.resolve(&frame),
            TargetOrigin::Exact("https://other.test".into())
        );
    }
}
