//! In-process `postMessage` bus.
//!
//! Models the browser's cross-window messaging closely enough that host and
//! frame code can be exercised without a browser:
//!
//! - Posted data is cloned (structured clone of a JSON value).
//! - Delivery is FIFO per bus and happens only when the event loop calls
//!   [`MessageBus::dispatch`], never inside `post_message`.
//! - A target origin other than `"*"` is checked against the target
//!   window's origin at delivery time; mismatches are dropped silently.
//! - Navigating a window destroys every listener and global its document
//!   registered. The [`WindowId`] itself stays valid.
//!
//! # Example
//!
//! ```ignore
//! let bus = MessageBus::new();
//! let host = bus.open_window("https://admin.example.com/editor")?;
//! let frame = bus.open_frame(host, "https://site.example.com/")?;
//!
//! bus.add_listener(host, Arc::new(|event: &MessageEvent| {
//!     println!("{} sent {}", event.origin, event.data);
//! }))?;
//! bus.post_message(frame, host, &json!({ "hello": 1 }), &TargetOrigin::Any)?;
//! assert_eq!(bus.dispatch(), 1);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, WindowId};

// ============================================================================
// Types
// ============================================================================

/// Callback registered for `message` events on a window.
///
/// Called once per delivered event, with no bus lock held.
pub type MessageHandler = Arc<dyn Fn(&MessageEvent) + Send + Sync>;

/// A delivered `message` event.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Window that posted the message (`event.source`).
    pub source: Option<WindowId>,
    /// Serialized origin of the sender (`event.origin`).
    pub origin: String,
    /// Cloned message data (`event.data`).
    pub data: Value,
}

impl MessageEvent {
    /// Creates an event as a window would receive it.
    #[inline]
    #[must_use]
    pub fn new(source: Option<WindowId>, origin: impl Into<String>, data: Value) -> Self {
        Self {
            source,
            origin: origin.into(),
            data,
        }
    }
}

// ============================================================================
// TargetOrigin
// ============================================================================

/// The `targetOrigin` argument of `postMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetOrigin {
    /// `"*"`: deliver regardless of the target's origin.
    #[default]
    Any,
    /// Deliver only if the target's origin equals this serialized origin.
    Exact(String),
}

impl TargetOrigin {
    /// Derives the target origin from a URL.
    ///
    /// Opaque origins (`about:blank`, `data:`, `file:`) cannot be named, so
    /// they map to [`TargetOrigin::Any`].
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let origin = url.origin();
        if origin.is_tuple() {
            Self::Exact(origin.ascii_serialization())
        } else {
            Self::Any
        }
    }

    /// Returns the string passed to `postMessage`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "*",
            Self::Exact(origin) => origin,
        }
    }

    /// Returns `true` if a window with `origin` may receive the message.
    #[inline]
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == origin,
        }
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Internal State
// ============================================================================

/// One registered browsing context.
struct WindowEntry {
    url: Url,
    origin: String,
    parent: Option<WindowId>,
    listeners: Vec<(ListenerId, MessageHandler)>,
    globals: FxHashMap<String, Value>,
}

impl WindowEntry {
    fn new(url: Url, parent: Option<WindowId>) -> Self {
        let origin = url.origin().ascii_serialization();
        Self {
            url,
            origin,
            parent,
            listeners: Vec::new(),
            globals: FxHashMap::default(),
        }
    }
}

/// A message waiting in the task queue.
struct Queued {
    target: WindowId,
    target_origin: TargetOrigin,
    event: MessageEvent,
}

#[derive(Default)]
struct BusInner {
    windows: FxHashMap<WindowId, WindowEntry>,
    queue: VecDeque<Queued>,
}

// ============================================================================
// MessageBus
// ============================================================================

/// Shared message bus connecting host and frame windows.
///
/// Cheap to clone; all clones share the same windows and queue.
#[derive(Clone, Default)]
pub struct MessageBus {
    inner: Arc<Mutex<BusInner>>,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MessageBus")
            .field("windows", &inner.windows.len())
            .field("pending", &inner.queue.len())
            .finish()
    }
}

impl MessageBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// MessageBus - Windows
// ============================================================================

impl MessageBus {
    /// Opens a top-level window at `url`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `url` does not parse.
    pub fn open_window(&self, url: &str) -> Result<WindowId> {
        self.open(url, None)
    }

    /// Opens a frame window nested in `parent`.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowNotFound`] if `parent` is not registered
    /// - [`Error::InvalidUrl`] if `url` does not parse
    pub fn open_frame(&self, parent: WindowId, url: &str) -> Result<WindowId> {
        if !self.inner.lock().windows.contains_key(&parent) {
            return Err(Error::window_not_found(parent));
        }
        self.open(url, Some(parent))
    }

    fn open(&self, url: &str, parent: Option<WindowId>) -> Result<WindowId> {
        let url = parse_url(url)?;
        let id = WindowId::next();
        debug!(window_id = %id, url = %url, parent = ?parent, "Window opened");
        self.inner
            .lock()
            .windows
            .insert(id, WindowEntry::new(url, parent));
        Ok(id)
    }

    /// Closes a window. Messages still queued for it are discarded.
    ///
    /// Returns `false` if the window was not registered.
    pub fn close_window(&self, window: WindowId) -> bool {
        let removed = self.inner.lock().windows.remove(&window).is_some();
        if removed {
            debug!(window_id = %window, "Window closed");
        }
        removed
    }

    /// Loads a new document into `window`.
    ///
    /// Every listener and global registered by the previous document is
    /// destroyed and the window's origin follows the new URL.
    ///
    /// # Errors
    ///
    /// - [`Error::WindowNotFound`] if `window` is not registered
    /// - [`Error::InvalidUrl`] if `url` does not parse
    pub fn navigate(&self, window: WindowId, url: &str) -> Result<()> {
        let url = parse_url(url)?;
        let mut inner = self.inner.lock();
        let entry = inner
            .windows
            .get_mut(&window)
            .ok_or_else(|| Error::window_not_found(window))?;

        let dropped = entry.listeners.len();
        entry.listeners.clear();
        entry.globals.clear();
        entry.origin = url.origin().ascii_serialization();
        entry.url = url;

        debug!(window_id = %window, url = %entry.url, dropped_listeners = dropped, "Window navigated");
        Ok(())
    }

    /// Returns `true` if `window` is registered.
    #[must_use]
    pub fn contains(&self, window: WindowId) -> bool {
        self.inner.lock().windows.contains_key(&window)
    }

    /// Returns the parent of a frame window.
    #[must_use]
    pub fn parent(&self, window: WindowId) -> Option<WindowId> {
        self.inner.lock().windows.get(&window)?.parent
    }

    /// Returns the current URL of `window`.
    #[must_use]
    pub fn url(&self, window: WindowId) -> Option<Url> {
        self.inner.lock().windows.get(&window).map(|w| w.url.clone())
    }

    /// Returns the serialized origin of `window`.
    #[must_use]
    pub fn origin(&self, window: WindowId) -> Option<String> {
        self.inner
            .lock()
            .windows
            .get(&window)
            .map(|w| w.origin.clone())
    }
}

// ============================================================================
// MessageBus - Globals
// ============================================================================

impl MessageBus {
    /// Sets a global on `window`, as a script would on `window[key]`.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`] if `window` is not registered.
    pub fn set_global(&self, window: WindowId, key: impl Into<String>, value: Value) -> Result<()> {
        let mut inner = self.inner.lock();
        let entry = inner
            .windows
            .get_mut(&window)
            .ok_or_else(|| Error::window_not_found(window))?;
        entry.globals.insert(key.into(), value);
        Ok(())
    }

    /// Reads a global from `window`.
    #[must_use]
    pub fn global(&self, window: WindowId, key: &str) -> Option<Value> {
        self.inner
            .lock()
            .windows
            .get(&window)?
            .globals
            .get(key)
            .cloned()
    }
}

// ============================================================================
// MessageBus - Listeners
// ============================================================================

impl MessageBus {
    /// Registers a `message` listener on `window`.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`] if `window` is not registered.
    pub fn add_listener(&self, window: WindowId, handler: MessageHandler) -> Result<ListenerId> {
        let mut inner = self.inner.lock();
        let entry = inner
            .windows
            .get_mut(&window)
            .ok_or_else(|| Error::window_not_found(window))?;

        let id = ListenerId::next();
        entry.listeners.push((id, handler));
        trace!(window_id = %window, listener_id = %id, "Listener added");
        Ok(id)
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, window: WindowId, listener: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.windows.get_mut(&window) else {
            return false;
        };

        let before = entry.listeners.len();
        entry.listeners.retain(|(id, _)| *id != listener);
        let removed = entry.listeners.len() != before;
        if removed {
            trace!(window_id = %window, listener_id = %listener, "Listener removed");
        }
        removed
    }

    /// Returns the number of listeners registered on `window`.
    #[must_use]
    pub fn listener_count(&self, window: WindowId) -> usize {
        self.inner
            .lock()
            .windows
            .get(&window)
            .map_or(0, |w| w.listeners.len())
    }
}

// ============================================================================
// MessageBus - Messaging
// ============================================================================

impl MessageBus {
    /// Queues `data` for delivery from `from` to `to`.
    ///
    /// The data is cloned immediately; later changes by the caller are not
    /// observed by the receiver.
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`] if either window is not registered.
    pub fn post_message(
        &self,
        from: WindowId,
        to: WindowId,
        data: &Value,
        target_origin: &TargetOrigin,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let origin = inner
            .windows
            .get(&from)
            .map(|w| w.origin.clone())
            .ok_or_else(|| Error::window_not_found(from))?;
        if !inner.windows.contains_key(&to) {
            return Err(Error::window_not_found(to));
        }

        inner.queue.push_back(Queued {
            target: to,
            target_origin: target_origin.clone(),
            event: MessageEvent::new(Some(from), origin, data.clone()),
        });
        trace!(from = %from, to = %to, target_origin = %target_origin, "Message posted");
        Ok(())
    }

    /// Queues an event with an arbitrary `source` for `to`.
    ///
    /// Stands in for traffic from contexts that have no window on this bus
    /// (extensions, workers, third-party frames).
    ///
    /// # Errors
    ///
    /// [`Error::WindowNotFound`] if `to` is not registered.
    pub fn inject_event(&self, to: WindowId, event: MessageEvent) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.windows.contains_key(&to) {
            return Err(Error::window_not_found(to));
        }
        inner.queue.push_back(Queued {
            target: to,
            target_origin: TargetOrigin::Any,
            event,
        });
        Ok(())
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Delivers the oldest queued message.
    ///
    /// Returns `false` if the queue was empty. A message whose target is
    /// gone or whose target origin does not match is consumed without
    /// reaching any listener.
    pub fn dispatch_next(&self) -> bool {
        let (event, handlers) = {
            let mut inner = self.inner.lock();
            let Some(queued) = inner.queue.pop_front() else {
                return false;
            };

            let Some(entry) = inner.windows.get(&queued.target) else {
                debug!(target = %queued.target, "Dropped message for closed window");
                return true;
            };

            if !queued.target_origin.matches(&entry.origin) {
                debug!(
                    target = %queued.target,
                    target_origin = %queued.target_origin,
                    actual_origin = %entry.origin,
                    "Dropped message for mismatched target origin"
                );
                return true;
            }

            let handlers: Vec<MessageHandler> =
                entry.listeners.iter().map(|(_, h)| Arc::clone(h)).collect();
            (queued.event, handlers)
        };

        for handler in handlers {
            handler(&event);
        }
        true
    }

    /// Drains the queue, including messages posted by handlers meanwhile.
    ///
    /// Returns the number of messages consumed.
    pub fn dispatch(&self) -> usize {
        let mut count = 0;
        while self.dispatch_next() {
            count += 1;
        }
        count
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::invalid_url(url, e))
}

// ============================================================================
// Tests
// ============================================================================
