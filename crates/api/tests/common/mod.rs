#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use clipdock_api::config::ServerConfig;
use clipdock_api::router::build_app_router;
use clipdock_api::state::AppState;
use clipdock_api::ws::WsHub;
use clipdock_core::blobs::BlobStore;
use clipdock_core::registry::SessionRegistry;

/// Boundary used by [`multipart_body`].
const BOUNDARY: &str = "clipdock-test-boundary";

/// Build a test `ServerConfig` with safe defaults and a small upload limit
/// (1 KiB) so oversize behaviour is cheap to exercise.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        allowed_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024,
        session_timeout_secs: 3600,
        session_id_length: 6,
        heartbeat_interval_secs: 30,
        heartbeat_timeout_intervals: 2,
        eviction_sweep_secs: 60,
        empty_session_grace_secs: 120,
        upload_dir: upload_dir.to_path_buf(),
    }
}

/// Build the full application router with all middleware layers, plus the
/// state behind it, backed by a temporary upload directory.
///
/// This mirrors the wiring in `main.rs` so integration tests exercise the
/// same middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery) that production uses. Keep the returned `TempDir` alive for
/// the duration of the test.
pub async fn build_test_app() -> (Router, AppState, tempfile::TempDir) {
    let upload_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(upload_dir.path());

    let blobs = BlobStore::new(upload_dir.path());
    blobs.init().await.expect("blob store init");

    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::new(SessionRegistry::new(config.session_id_length)),
        hub: Arc::new(WsHub::new()),
        blobs: Arc::new(blobs),
    };

    let router = build_app_router(state.clone(), &config);
    (router, state, upload_dir)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Issue a JSON-bodied request with the given method.
pub async fn request_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Issue a JSON POST request against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    request_json(app, Method::POST, uri, body).await
}

/// Issue a JSON DELETE request against the app.
pub async fn delete_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    request_json(app, Method::DELETE, uri, body).await
}

/// Upload a file block via multipart form data.
pub async fn upload_file(
    app: Router,
    session_id: &str,
    user_id: &str,
    filename: &str,
    data: &[u8],
) -> Response {
    let body = multipart_body(session_id, user_id, filename, data);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/block/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body into parsed JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Hand-rolled multipart form with `session_id`, `user_id`, and `file`
/// fields, in the shape the upload handler expects.
pub fn multipart_body(session_id: &str, user_id: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("session_id", session_id), ("user_id", user_id)] {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Create a session and return `(session_id, host_user_id)`.
pub async fn create_session(app: Router, user_name: &str) -> (String, String) {
    let response = post_json(
        app,
        "/api/v1/session/create",
        serde_json::json!({ "user_name": user_name }),
    )
    .await;
    let json = body_json(response).await;
    (
        json["session_id"].as_str().unwrap().to_string(),
        json["user_id"].as_str().unwrap().to_string(),
    )
}

/// Join a session and return the new member's user ID.
pub async fn join_session(app: Router, session_id: &str, user_name: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/session/join",
        serde_json::json!({ "session_id": session_id, "user_name": user_name }),
    )
    .await;
    let json = body_json(response).await;
    json["user_id"].as_str().unwrap().to_string()
}
