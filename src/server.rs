use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::chat::backend::{ReplyBackend, ReplyRequest, ReplyResponse};
use crate::chat::events::sse_event;
use crate::chat::RequestId;
use crate::config::AppConfig;
use crate::prefs::JsonFilePreferenceStore;
use crate::ui::{LATEST_ANCHOR, PageSnapshot, render_page};
use crate::upload::CandidateFile;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let store = Arc::new(JsonFilePreferenceStore::new(&config.prefs.path));
    info!(
        name: "prefs.store.opened",
        path = %store.path().display(),
        "Preference store opened"
    );

    let state = AppState::new(Arc::clone(&config), store)?;
    let chat = state.chat.clone();
    let app = router(state);

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        backend = chat.backend_name(),
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    chat.shutdown();
    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let timeout_duration = state.config.server.request_timeout();
    let body_limit = state.config.server.max_upload_bytes;

    // Everything except the event feed is bounded by the request timeout.
    let bounded = Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_form_handler))
        .route("/theme", post(theme_handler))
        .route("/upload", post(upload_handler))
        .route("/api/chat", post(api_chat))
        .route("/api/state", get(api_state))
        .route("/api/reply", post(api_reply))
        .route("/health", get(|| async { "ok" }))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let duration = timeout_duration;
                async move {
                    match tokio::time::timeout(duration, next.run(req)).await {
                        Ok(res) => res,
                        Err(_) => {
                            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                        }
                    }
                }
            },
        ));

    Router::new()
        .merge(bounded)
        .route("/api/chat/events", get(api_chat_events))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(name: "server.shutdown", "Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Render the page. Shows a pending notice once.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.page_snapshot(true)))
}

/// Chat form body.
#[derive(Debug, Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: String,
}

/// POST /chat - Submit a message from the page form.
async fn chat_form_handler(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Redirect {
    state.chat.submit(&form.message);
    Redirect::to(&format!("/#{LATEST_ANCHOR}"))
}

/// POST /theme - Flip and persist the theme.
async fn theme_handler(State(state): State<AppState>) -> Result<Redirect, (StatusCode, String)> {
    let theme = Arc::clone(&state.theme);
    let toggled = tokio::task::spawn_blocking(move || theme.toggle())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Theme toggle task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    toggled.map_err(|e| {
        tracing::error!(error = %e, "Failed to persist theme");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to persist theme: {e}"),
        )
    })?;
    Ok(Redirect::to("/"))
}

/// POST /upload - Validate the picked file.
///
/// Only the selection is recorded; the file body is drained and discarded.
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, (StatusCode, String)> {
    let mut files = Vec::new();

    // Over-limit bodies surface here as 413 through `MultipartError::status`.
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            e.status(),
            format!("Failed to read multipart field: {}", e.body_text()),
        )
    })? {
        // Browsers send an empty part when no file was chosen.
        let name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty());
        let content_type = field.content_type().map(str::to_string);

        let size = field
            .bytes()
            .await
            .map_err(|e| (e.status(), format!("Failed to read file: {}", e.body_text())))?
            .len();

        if let Some(name) = name {
            tracing::debug!(file = %name, size, content_type = ?content_type, "Received file part");
            files.push(CandidateFile::new(name, content_type));
        }
    }

    if let Err(e) = state.files.handle_files(&files) {
        state.set_notice(e.user_notice());
    }

    Ok(Redirect::to("/"))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    message: String,
}

/// Response from chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    /// Identifier of the spawned reply pipeline.
    request_id: RequestId,
}

/// POST /api/chat - Submit a message; the reply arrives asynchronously.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), (StatusCode, String)> {
    match state.chat.submit(&req.message) {
        Some(request_id) => Ok((StatusCode::ACCEPTED, Json(ChatResponse { request_id }))),
        None => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Message must not be blank".to_string(),
        )),
    }
}

/// GET /api/state - Current page snapshot.
async fn api_state(State(state): State<AppState>) -> Json<PageSnapshot> {
    Json(state.page_snapshot(false))
}

/// POST /api/reply - The simulated backend, exposed over the reply contract.
async fn api_reply(
    State(state): State<AppState>,
    Json(req): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, (StatusCode, String)> {
    let reply = state.simulated.reply(&req.message).await.map_err(|e| {
        tracing::error!(error = %e, "Simulated backend failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(ReplyResponse { reply }))
}

/// GET /api/chat/events - SSE feed of chat transitions.
async fn api_chat_events(State(state): State<AppState>) -> Response {
    let mut rx = state.chat.subscribe();

    let sse_stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    yield Ok::<String, std::convert::Infallible>(sse_event(&event));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    let body = axum::body::Body::from_stream(sse_stream);
    build_sse_response(body)
}

fn build_sse_response(body: axum::body::Body) -> Response {
    (
        [
            ("Content-Type", "text/event-stream"),
            ("Cache-Control", "no-cache"),
            ("Connection", "keep-alive"),
            ("X-Accel-Buffering", "no"),
        ],
        body,
    )
        .into_response()
}

