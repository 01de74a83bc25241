//! Chat panel: transcript, reply pipeline and backends.
//!
//! # Architecture
//!
//! - [`ChatController`]: owns the transcript and spawns one reply pipeline per
//!   submission
//! - [`ReplyBackend`]: asynchronous request abstraction the pipeline awaits
//! - [`PendingReplies`]: per-request tracking behind the pending indicator
//! - [`ChatEvent`]: transitions broadcast to subscribers
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use documind::chat::{ChatController, ReplySettings, SimulatedBackend, PLACEHOLDER_REPLY};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = SimulatedBackend::new(Duration::from_millis(10), PLACEHOLDER_REPLY);
//! let chat = ChatController::new(Arc::new(backend), ReplySettings::default());
//!
//! assert!(chat.submit("   ").is_none());
//! assert!(chat.submit("  Hello  ").is_some());
//! assert_eq!(chat.snapshot().messages[0].text, "Hello");
//! assert!(chat.is_pending());
//! # }
//! ```

pub mod backend;
pub mod controller;
pub mod events;
pub mod message;
pub mod pending;

use std::time::Duration;

pub use backend::{BackendError, HttpBackend, ReplyBackend, SimulatedBackend};
pub use controller::{ChatController, ChatSnapshot, ReplySettings};
pub use events::ChatEvent;
pub use message::{Message, Role, Transcript};
pub use pending::{PendingReplies, RequestId};

/// Simulated backend latency.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(2000);

/// Reply returned by the simulated backend.
pub const PLACEHOLDER_REPLY: &str = "I analyzed your PDF. This looks like a project roadmap. \
     The Functional Requirements are listed in Section 2A.";

/// Assistant-visible text for any reply failure.
pub const ERROR_REPLY: &str = "Error: Could not connect to DocuMind backend.";
