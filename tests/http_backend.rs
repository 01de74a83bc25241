use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use documind::chat::backend::{ReplyRequest, ReplyResponse};
use documind::chat::{BackendError, HttpBackend, ReplyBackend};
use url::Url;

/// Serve `app` on an ephemeral port and return its `/reply` endpoint.
async fn spawn_backend(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/reply")).unwrap()
}

fn backend(endpoint: Url) -> HttpBackend {
    HttpBackend::new(endpoint, Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn test_reply_round_trip() {
    let app = Router::new().route(
        "/reply",
        post(|Json(req): Json<ReplyRequest>| async move {
            Json(ReplyResponse {
                reply: format!("echo: {}", req.message),
            })
        }),
    );
    let url = spawn_backend(app).await;

    let reply = backend(url).reply("section 2").await.unwrap();
    assert_eq!(reply, "echo: section 2");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let app = Router::new().route(
        "/reply",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = spawn_backend(app).await;

    let err = backend(url).reply("hi").await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let app = Router::new().route(
        "/reply",
        post(|| async { Json(serde_json::json!({ "answer": "wrong field" })) }),
    );
    let url = spawn_backend(app).await;

    let err = backend(url).reply("hi").await.unwrap_err();
    assert_eq!(err.kind(), "malformed_response");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let app = Router::new().route(
        "/reply",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(ReplyResponse {
                reply: "late".into(),
            })
        }),
    );
    let url = spawn_backend(app).await;

    let err = HttpBackend::new(url, Duration::from_millis(100))
        .unwrap()
        .reply("hi")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "timeout");
}

#[tokio::test]
async fn test_unreachable_backend_is_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/reply")).unwrap();
    let err = backend(url).reply("hi").await.unwrap_err();
    assert_eq!(err.kind(), "connection_refused");
}
