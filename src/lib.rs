//! DocuMind
//!
//! A chat-with-your-PDF page served by Axum. The page is rendered on the
//! server from a single state snapshot and driven by plain HTML forms.
//!
//! # Architecture
//!
//! - **Server**: Axum router with form handlers, a JSON API and an SSE feed
//! - **Chat**: transcript plus an asynchronous reply pipeline behind a
//!   pluggable backend (simulated latency or HTTP)
//! - **Preferences**: persisted dark/light theme behind a key/value store
//! - **Upload**: PDF-only file picker with selection state
//! - **UI**: one render function over an immutable page snapshot
//!
//! # Modules
//!
//! - [`chat`]: controller, backends, pending tracking and events
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`prefs`]: preference store and theme toggle
//! - [`server`]: router, handlers and server startup
//! - [`ui`]: HTML rendering
//! - [`upload`]: file picker

pub mod chat;
pub mod config;
pub mod prefs;
pub mod server;
pub mod telemetry;
pub mod ui;
pub mod upload;

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use tracing::info;

use crate::chat::{ChatController, HttpBackend, ReplyBackend, ReplySettings, SimulatedBackend};
use crate::config::AppConfig;
use crate::prefs::{PreferenceStore, Settings, ThemeToggle};
use crate::ui::PageSnapshot;
use crate::upload::FilePicker;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat panel controller.
    pub chat: ChatController,
    /// Theme preference, written through the preference store.
    pub theme: Arc<ThemeToggle>,
    /// File picker state.
    pub files: Arc<FilePicker>,
    /// Pending one-shot notice for the next page render.
    pub notice: Arc<Mutex<Option<String>>>,
    /// Backend served at `/api/reply`.
    pub simulated: Arc<SimulatedBackend>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build the state from configuration and an already opened preference
    /// store.
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn PreferenceStore>) -> anyhow::Result<Self> {
        let settings = Settings::load(store.as_ref()).context("Failed to read preferences")?;
        info!(name: "prefs.loaded", theme = %settings.theme, "Preferences loaded");

        let simulated = Arc::new(SimulatedBackend::new(
            config.chat.reply_delay(),
            config.chat.placeholder_reply.clone(),
        ));

        let backend: Arc<dyn ReplyBackend> = match &config.chat.backend_url {
            Some(url) => {
                let http = HttpBackend::new(url.clone(), config.chat.reply_timeout())
                    .context("Failed to build HTTP reply backend")?;
                info!(
                    name: "chat.backend.selected",
                    backend = http.name(),
                    endpoint = %http.endpoint(),
                    "Reply backend selected"
                );
                Arc::new(http)
            }
            None => {
                info!(
                    name: "chat.backend.selected",
                    backend = simulated.name(),
                    latency_ms = simulated.latency().as_millis(),
                    "Reply backend selected"
                );
                Arc::clone(&simulated) as Arc<dyn ReplyBackend>
            }
        };

        let chat = ChatController::new(
            backend,
            ReplySettings {
                timeout: config.chat.reply_timeout(),
                error_reply: config.chat.error_reply.clone(),
            },
        );

        Ok(Self {
            chat,
            theme: Arc::new(ThemeToggle::new(store, settings)),
            files: Arc::new(FilePicker::new()),
            notice: Arc::new(Mutex::new(None)),
            simulated,
            config,
        })
    }

    /// Queue a notice for the next page render.
    pub fn set_notice(&self, notice: impl Into<String>) {
        *self.notice.lock().unwrap_or_else(PoisonError::into_inner) = Some(notice.into());
    }

    /// Capture the page state. With `consume_notice`, the notice is shown
    /// once and then cleared.
    pub fn page_snapshot(&self, consume_notice: bool) -> PageSnapshot {
        let notice = {
            let mut guard = self.notice.lock().unwrap_or_else(PoisonError::into_inner);
            if consume_notice {
                guard.take()
            } else {
                guard.clone()
            }
        };

        PageSnapshot {
            chat: self.chat.snapshot(),
            theme: self.theme.current(),
            file: self.files.selection(),
            notice,
        }
    }
}
