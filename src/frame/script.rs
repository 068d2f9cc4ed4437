//! Browser-side instrumentation source.
//!
//! The same behavior as [`FrameAgent`](super::FrameAgent), as a script the
//! host injects into a same-origin frame document. The script is
//! self-contained and idempotent: re-running it in a document where it is
//! already installed does nothing.
//!
//! # Injection Flow
//!
//! 1. Host waits for the iframe `load` event
//! 2. Host evaluates [`injection_snippet`] in its own document
//! 3. Snippet appends a `<script>` holding [`instrumentation_script`] to the
//!    frame's `<head>` (or root element)
//! 4. Instrumentation posts `READY` to `window.parent`
//!
//! # Highlight
//!
//! The hover box lives inside a closed shadow root on a
//! `<visual-editor-overlay>` host. The host is appended after `<body>` as
//! the last child of the root element, so no page element gains a child,
//! an attribute or a new `nth-child` position. Computed selectors stay
//! valid once the highlight is removed. The host itself is never pickable.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::{MessageType, SOURCE_TAG};

use super::agent::INSTALL_MARKER;

// ============================================================================
// Public Functions
// ============================================================================

/// Returns the instrumentation script with protocol constants filled in.
#[must_use]
pub fn instrumentation_script() -> String {
    INSTRUMENTATION_TEMPLATE
        .replace("$SOURCE_TAG", &json_string(SOURCE_TAG))
        .replace("$MARKER", &json_string(INSTALL_MARKER))
        .replace("$READY", &json_string(MessageType::Ready.as_str()))
        .replace("$ENABLE", &json_string(MessageType::Enable.as_str()))
        .replace("$DISABLE", &json_string(MessageType::Disable.as_str()))
        .replace("$CLEAR", &json_string(MessageType::Clear.as_str()))
        .replace("$HOVER", &json_string(MessageType::Hover.as_str()))
        .replace("$SELECT", &json_string(MessageType::Select.as_str()))
}

/// Returns a host-side expression that injects the instrumentation into the
/// iframe matched by `frame_selector`.
///
/// The expression evaluates to `true` when the script was appended and
/// `false` when the frame or its document is unreachable (missing element,
/// cross-origin document).
#[must_use]
pub fn injection_snippet(frame_selector: &str) -> String {
    INJECTION_TEMPLATE
        .replace("$FRAME_SELECTOR", &json_string(frame_selector))
        .replace("$SOURCE", &json_string(&instrumentation_script()))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encodes a string as a JavaScript string literal.
fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

// ============================================================================
// Constants
// ============================================================================

/// Instrumentation run inside the frame document.
///
/// Pointer listeners are registered in the capture phase on `document` so
/// the page's own handlers cannot swallow events first.
const INSTRUMENTATION_TEMPLATE: &str = r#"(function () {
  'use strict';
  var SOURCE = $SOURCE_TAG;
  var MARKER = $MARKER;
  if (window[MARKER]) { return; }
  window[MARKER] = true;

  var armed = false;
  var hovered = null;
  var host = null;
  var box = null;

  function escapeIdent(value) {
    if (window.CSS && typeof window.CSS.escape === 'function') { return window.CSS.escape(value); }
    return String(value).replace(/[^a-zA-Z0-9_-]/g, '\\$&');
  }

  function resolvesTo(selector, node) {
    try {
      var found = document.querySelectorAll(selector);
      return found.length === 1 && found[0] === node;
    } catch (err) {
      return false;
    }
  }

  function computeSelector(node) {
    try {
      if (node.isConnected) {
        if (node.id) {
          var byId = '#' + escapeIdent(node.id);
          if (resolvesTo(byId, node)) { return byId; }
        }
        var segments = [];
        for (var el = node; el && el.nodeType === 1; el = el.parentElement) {
          var tag = escapeIdent(el.localName);
          if (el.parentElement) {
            var position = 1;
            for (var sib = el.previousElementSibling; sib; sib = sib.previousElementSibling) { position++; }
            segments.unshift(tag + ':nth-child(' + position + ')');
          } else {
            segments.unshift(tag);
          }
          var candidate = segments.join(' > ');
          if (resolvesTo(candidate, node)) { return candidate; }
        }
      }
    } catch (err) {}
    return node.tagName.toLowerCase();
  }

  function describe(node) {
    return {
      tagName: node.tagName.toUpperCase(),
      selector: computeSelector(node),
      textContent: (node.textContent || '').trim()
    };
  }

  function post(type, payload) {
    var message = { source: SOURCE, type: type };
    if (payload) { message.payload = payload; }
    window.parent.postMessage(message, '*');
  }

  function showOverlay(node) {
    if (!host) {
      host = document.createElement('visual-editor-overlay');
      host.style.cssText = 'all: initial; position: fixed; inset: 0; pointer-events: none; z-index: 2147483647;';
      var root = host.attachShadow ? host.attachShadow({ mode: 'closed' }) : host;
      box = document.createElement('div');
      box.style.cssText = 'position: fixed; box-sizing: border-box; border: 2px solid #3b82f6; background: rgba(59, 130, 246, 0.12);';
      root.appendChild(box);
      document.documentElement.appendChild(host);
    }
    var rect = node.getBoundingClientRect();
    box.style.left = rect.left + 'px';
    box.style.top = rect.top + 'px';
    box.style.width = rect.width + 'px';
    box.style.height = rect.height + 'px';
  }

  function clearHighlight() {
    hovered = null;
    if (host && host.parentNode) { host.parentNode.removeChild(host); }
    host = null;
    box = null;
  }

  function isPickable(target) {
    return target && target.nodeType === 1 && target !== host;
  }

  function onPointer(event) {
    if (!armed || !isPickable(event.target) || event.target === hovered) { return; }
    hovered = event.target;
    showOverlay(hovered);
    post($HOVER, describe(hovered));
  }

  function onClick(event) {
    if (!armed || !isPickable(event.target)) { return; }
    post($SELECT, describe(event.target));
    event.preventDefault();
    event.stopPropagation();
  }

  function onMessage(event) {
    if (event.source !== window.parent) { return; }
    var data = event.data;
    if (!data || typeof data !== 'object' || data.source !== SOURCE) { return; }
    if (data.type === $ENABLE) {
      armed = true;
    } else if (data.type === $DISABLE) {
      armed = false;
      clearHighlight();
    } else if (data.type === $CLEAR) {
      clearHighlight();
    }
  }

  document.addEventListener('mouseover', onPointer, true);
  document.addEventListener('mousemove', onPointer, true);
  document.addEventListener('click', onClick, true);
  window.addEventListener('message', onMessage);
  post($READY);
})();"#;

/// Host-side injection wrapper.
const INJECTION_TEMPLATE: &str = r#"(function () {
  var frame = document.querySelector($FRAME_SELECTOR);
  var doc = null;
  try {
    doc = frame && (frame.contentDocument || (frame.contentWindow && frame.contentWindow.document));
  } catch (err) {
    return false;
  }
  if (!doc) { return false; }
  var script = doc.createElement('script');
  script.textContent = $SOURCE;
  (doc.head || doc.documentElement).appendChild(script);
  return true;
})()"#;

// ============================================================================
// Tests
// ============================================================================
