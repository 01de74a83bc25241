//! Chat state transitions published to subscribers.
//!
//! The controller broadcasts a [`ChatEvent`] for every transition so the
//! page (or any other subscriber) can re-render. Events serialize to the
//! Server-Sent Events wire format with [`sse_event`].
//!
//! # Example
//!
//! ```rust
//! use documind::chat::events::{ChatEvent, sse_event};
//!
//! let event = ChatEvent::PendingChanged { pending: true, outstanding: 1 };
//! let sse = sse_event(&event);
//! assert!(sse.starts_with("event: pending.changed\n"));
//! ```

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::pending::RequestId;

/// A transition of the chat panel state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// A message was appended to the transcript.
    #[serde(rename = "message.appended")]
    MessageAppended {
        /// Position of the message in the transcript.
        index: usize,
        /// The appended message.
        message: Message,
    },

    /// The pending-reply indicator changed visibility.
    #[serde(rename = "pending.changed")]
    PendingChanged {
        /// Whether the indicator is visible.
        pending: bool,
        /// Number of replies still outstanding.
        outstanding: usize,
    },

    /// A reply pipeline failed. The transcript gets the generic error text;
    /// this event carries the internal failure kind for diagnostics.
    #[serde(rename = "reply.failed")]
    ReplyFailed {
        request_id: RequestId,
        kind: String,
    },
}

/// Format a [`ChatEvent`] as an SSE frame.
pub fn sse_event(evt: &ChatEvent) -> String {
    let json = serde_json::to_string(evt).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "data": { "message": e.to_string() } }).to_string()
    });

    let event_name = event_name(evt);

    format!("event: {event_name}\ndata: {json}\n\n")
}

/// Get the SSE event name for a [`ChatEvent`].
pub fn event_name(evt: &ChatEvent) -> &'static str {
    match evt {
        ChatEvent::MessageAppended { .. } => "message.appended",
        ChatEvent::PendingChanged { .. } => "pending.changed",
        ChatEvent::ReplyFailed { .. } => "reply.failed",
    }
}
