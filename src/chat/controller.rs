//! Chat panel controller.
//!
//! Owns the transcript and the reply lifecycle. `submit` returns as soon as
//! the user message is recorded; the reply pipeline runs on a spawned task
//! and resolves after the backend answers, fails, or times out.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{BackendError, ReplyBackend};
use super::events::ChatEvent;
use super::message::{Message, Role, Transcript};
use super::pending::{PendingReplies, RequestId};
use super::ERROR_REPLY;

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Reply pipeline tuning.
#[derive(Debug, Clone)]
pub struct ReplySettings {
    /// Upper bound on a single backend call.
    pub timeout: Duration,
    /// Text appended when the backend fails for any reason.
    pub error_reply: String,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            error_reply: ERROR_REPLY.to_string(),
        }
    }
}

/// Immutable view of the chat panel at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    /// Whether the pending-reply indicator is visible.
    pub pending: bool,
    pub outstanding: usize,
    /// Transcript index the view should be scrolled to.
    pub scroll_anchor: Option<usize>,
}

#[derive(Debug, Default)]
struct ChatState {
    transcript: Transcript,
    pending: PendingReplies,
    scroll_anchor: Option<usize>,
}

impl ChatState {
    fn append(&mut self, message: Message) -> usize {
        let index = self.transcript.push(message);
        self.scroll_anchor = Some(index);
        index
    }
}

#[derive(Debug)]
struct ControllerInner {
    state: RwLock<ChatState>,
    backend: Arc<dyn ReplyBackend>,
    settings: ReplySettings,
    events: broadcast::Sender<ChatEvent>,
    shutdown: CancellationToken,
}

/// Controller for the chat panel.
///
/// Cheap to clone; all clones share the same transcript.
#[derive(Debug, Clone)]
pub struct ChatController {
    inner: Arc<ControllerInner>,
}

impl ChatController {
    #[must_use]
    pub fn new(backend: Arc<dyn ReplyBackend>, settings: ReplySettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(ControllerInner {
                state: RwLock::new(ChatState::default()),
                backend,
                settings,
                events,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Submit raw input from the chat box.
    ///
    /// Whitespace-only input is ignored and returns `None`. Otherwise the
    /// trimmed text is appended as a user message, the pending indicator is
    /// shown, and the reply pipeline is spawned. Must be called from within a
    /// tokio runtime.
    pub fn submit(&self, raw: &str) -> Option<RequestId> {
        let text = raw.trim();
        if text.is_empty() {
            debug!(name: "chat.submit.ignored", "Ignoring blank submission");
            return None;
        }

        let request_id = RequestId::new();
        let message = Message::user(text);

        let (index, shown, outstanding) = {
            let mut state = self.inner.write_state();
            let index = state.append(message.clone());
            let shown = state.pending.begin(request_id);
            (index, shown, state.pending.outstanding())
        };

        info!(
            name: "chat.submit",
            request_id = %request_id,
            length = text.len(),
            outstanding,
            "Accepted chat message"
        );

        self.inner.emit(ChatEvent::MessageAppended { index, message });
        if shown {
            self.inner.emit(ChatEvent::PendingChanged {
                pending: true,
                outstanding,
            });
        }

        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        tokio::spawn(async move {
            inner.run_reply(request_id, text).await;
        });

        Some(request_id)
    }

    /// Append a message at the end of the transcript.
    pub fn append_message(&self, text: impl Into<String>, role: Role) {
        let message = Message::new(text, role);
        let index = self.inner.write_state().append(message.clone());
        self.inner.emit(ChatEvent::MessageAppended { index, message });
    }

    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.inner.read_state();
        ChatSnapshot {
            messages: state.transcript.messages().to_vec(),
            pending: state.pending.is_pending(),
            outstanding: state.pending.outstanding(),
            scroll_anchor: state.scroll_anchor,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.read_state().pending.is_pending()
    }

    /// Subscribe to state transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    /// Cancel every outstanding reply pipeline.
    ///
    /// Cancelled pipelines clear their pending entry and append nothing.
    pub fn shutdown(&self) {
        info!(name: "chat.shutdown", "Cancelling outstanding replies");
        self.inner.shutdown.cancel();
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }
}

impl ControllerInner {
    fn read_state(&self) -> RwLockReadGuard<'_, ChatState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ChatState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn run_reply(&self, request_id: RequestId, text: String) {
        let timeout = self.settings.timeout;

        let outcome = tokio::select! {
            () = self.shutdown.cancelled() => Err(BackendError::Cancelled),
            res = tokio::time::timeout(timeout, self.backend.reply(&text)) => {
                res.unwrap_or(Err(BackendError::Timeout { after: timeout }))
            }
        };

        let reply = match outcome {
            Ok(reply) => {
                info!(
                    name: "chat.reply",
                    request_id = %request_id,
                    backend = self.backend.name(),
                    length = reply.len(),
                    "Reply received"
                );
                Some(reply)
            }
            Err(BackendError::Cancelled) => {
                debug!(name: "chat.reply.cancelled", request_id = %request_id, "Reply cancelled");
                None
            }
            Err(e) => {
                warn!(
                    name: "chat.reply.failed",
                    request_id = %request_id,
                    backend = self.backend.name(),
                    kind = e.kind(),
                    error = %e,
                    "Reply pipeline failed"
                );
                self.emit(ChatEvent::ReplyFailed {
                    request_id,
                    kind: e.kind().to_string(),
                });
                Some(self.settings.error_reply.clone())
            }
        };

        self.resolve(request_id, reply.map(Message::assistant));
    }

    /// Clear the request and append its reply under one lock, so the
    /// indicator is hidden no later than the reply appears.
    fn resolve(&self, request_id: RequestId, reply: Option<Message>) {
        let (hid, outstanding, appended) = {
            let mut state = self.write_state();
            let hid = state.pending.finish(request_id);
            let outstanding = state.pending.outstanding();
            let appended = reply.map(|message| (state.append(message.clone()), message));
            (hid, outstanding, appended)
        };

        if hid {
            self.emit(ChatEvent::PendingChanged {
                pending: false,
                outstanding,
            });
        }
        if let Some((index, message)) = appended {
            self.emit(ChatEvent::MessageAppended { index, message });
        }
    }
}
