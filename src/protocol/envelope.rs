//! Message envelope shared by host and frame.
//!
//! Every protocol message is a JSON object tagged with a fixed `source`
//! so it can be told apart from unrelated `postMessage` traffic.
//!
//! # Message Types
//!
//! | Type | Direction | Payload |
//! |------|-----------|---------|
//! | `READY` | Frame → Host | none |
//! | `ENABLE` | Host → Frame | none |
//! | `DISABLE` | Host → Frame | none |
//! | `CLEAR` | Host → Frame | none |
//! | `HOVER` | Frame → Host | [`ElementInfo`] |
//! | `SELECT` | Frame → Host | [`ElementInfo`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::ElementInfo;

// ============================================================================
// Constants
// ============================================================================

/// Value of the `source` field on every protocol message.
pub const SOURCE_TAG: &str = "visual-editor";

// ============================================================================
// Direction
// ============================================================================

/// Which side of the frame boundary sends a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Control messages posted by the host controller.
    HostToFrame,
    /// Notifications posted by the instrumentation.
    FrameToHost,
}

// ============================================================================
// MessageType
// ============================================================================

/// The `type` field of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    /// Instrumentation finished installing.
    Ready,
    /// Start capturing pointer events.
    Enable,
    /// Stop capturing and remove the overlay.
    Disable,
    /// Remove highlight state.
    Clear,
    /// Pointer entered a new element.
    Hover,
    /// Element was clicked.
    Select,
}

impl MessageType {
    /// All message types in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Ready,
        Self::Enable,
        Self::Disable,
        Self::Clear,
        Self::Hover,
        Self::Select,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Enable => "ENABLE",
            Self::Disable => "DISABLE",
            Self::Clear => "CLEAR",
            Self::Hover => "HOVER",
            Self::Select => "SELECT",
        }
    }

    /// Returns which side sends this type.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Enable | Self::Disable | Self::Clear => Direction::HostToFrame,
            Self::Ready | Self::Hover | Self::Select => Direction::FrameToHost,
        }
    }

    /// Returns `true` if the envelope must carry an [`ElementInfo`].
    #[inline]
    #[must_use]
    pub const fn carries_payload(self) -> bool {
        matches!(self, Self::Hover | Self::Select)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::malformed_envelope(format!("unknown message type: {s}")))
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Raw wire shape of a protocol message.
///
/// # Format
///
/// ```json
/// {
///   "source": "visual-editor",
///   "type": "SELECT",
///   "payload": { "tagName": "LI", "selector": "li:nth-child(2)", "textContent": "Two" }
/// }
/// ```
///
/// Decoding goes through [`Message::from_value`], which validates the tag,
/// the type and the payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Fixed protocol tag, [`SOURCE_TAG`] on valid messages.
    pub source: String,

    /// Message type name.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Element descriptor for `HOVER` and `SELECT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

// ============================================================================
// Message
// ============================================================================

/// A validated protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Instrumentation is installed in the frame.
    Ready,
    /// Arm the picker.
    Enable,
    /// Disarm the picker.
    Disable,
    /// Drop highlight state.
    Clear,
    /// Pointer entered an element.
    Hover(ElementInfo),
    /// Element was picked.
    Select(ElementInfo),
}

impl Message {
    /// Returns the message type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Ready => MessageType::Ready,
            Self::Enable => MessageType::Enable,
            Self::Disable => MessageType::Disable,
            Self::Clear => MessageType::Clear,
            Self::Hover(_) => MessageType::Hover,
            Self::Select(_) => MessageType::Select,
        }
    }

    /// Returns the element descriptor, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&ElementInfo> {
        match self {
            Self::Hover(info) | Self::Select(info) => Some(info),
            Self::Ready | Self::Enable | Self::Disable | Self::Clear => None,
        }
    }

    /// Encodes the message as a tagged envelope.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let kind = self.message_type().as_str();
        match self.payload() {
            Some(info) => json!({
                "source": SOURCE_TAG,
                "type": kind,
                "payload": {
                    "tagName": info.tag_name,
                    "selector": info.selector,
                    "textContent": info.text_content,
                },
            }),
            None => json!({ "source": SOURCE_TAG, "type": kind }),
        }
    }

    /// Decodes and validates an envelope.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedEnvelope`] if the data is not an object of the
    /// envelope shape, carries another `source`, names an unknown `type`,
    /// or lacks a well-formed payload where one is required. A payload on
    /// a control message is ignored.
    pub fn from_value(data: &Value) -> Result<Self> {
        let envelope = Envelope::deserialize(data)
            .map_err(|e| Error::malformed_envelope(format!("not an envelope: {e}")))?;

        if envelope.source != SOURCE_TAG {
            return Err(Error::malformed_envelope(format!(
                "unexpected source tag: {}",
                envelope.source
            )));
        }

        let kind: MessageType = envelope.message_type.parse()?;

        Ok(match kind {
            MessageType::Ready => Self::Ready,
            MessageType::Enable => Self::Enable,
            MessageType::Disable => Self::Disable,
            MessageType::Clear => Self::Clear,
            MessageType::Hover => Self::Hover(decode_payload(kind, envelope.payload)?),
            MessageType::Select => Self::Select(decode_payload(kind, envelope.payload)?),
        })
    }

    /// Decodes an envelope and checks it travels in `expected` direction.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedEnvelope`] for invalid data or a wrong direction.
    pub fn from_value_directed(data: &Value, expected: Direction) -> Result<Self> {
        let message = Self::from_value(data)?;
        if message.message_type().direction() != expected {
            return Err(Error::malformed_envelope(format!(
                "{} is not accepted in direction {expected:?}",
                message.message_type()
            )));
        }
        Ok(message)
    }
}

/// Decodes the [`ElementInfo`] a `HOVER` or `SELECT` must carry.
fn decode_payload(kind: MessageType, payload: Option<Value>) -> Result<ElementInfo> {
    let payload =
        payload.ok_or_else(|| Error::malformed_envelope(format!("{kind} without payload")))?;
    ElementInfo::deserialize(&payload)
        .map_err(|e| Error::malformed_envelope(format!("{kind} payload: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
