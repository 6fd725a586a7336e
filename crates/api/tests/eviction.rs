//! Tests for the eviction sweeper.
//!
//! These drive `sweep_once` directly instead of waiting out the interval
//! loop; the loop only schedules ticks.

mod common;

use axum::http::StatusCode;
use clipdock_api::background::eviction;
use common::{create_session, get, upload_file};

// ---------------------------------------------------------------------------
// Test: active sessions survive a sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_preserves_active_sessions() {
    let (app, state, _dir) = common::build_test_app().await;
    create_session(app, "Ana").await;

    let mut retries = Vec::new();
    let evicted = eviction::sweep_once(&state, &mut retries).await;

    assert_eq!(evicted, 0);
    assert_eq!(state.registry.active_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: an idle session is evicted and becomes unresolvable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_evicts_idle_sessions() {
    let (app, mut state, _dir) = common::build_test_app().await;
    let (session_id, _host) = create_session(app.clone(), "Ana").await;

    // Shrink the inactivity threshold to zero so the session is overdue.
    let mut config = (*state.config).clone();
    config.session_timeout_secs = 0;
    state.config = std::sync::Arc::new(config);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut retries = Vec::new();
    let evicted = eviction::sweep_once(&state, &mut retries).await;
    assert_eq!(evicted, 1);
    assert!(retries.is_empty());

    let response = get(app, &format!("/api/v1/session/{session_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: eviction notifies connected members and reclaims blobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn eviction_broadcasts_and_reclaims_blobs() {
    let (app, mut state, _dir) = common::build_test_app().await;
    let (session_id, host_id) = create_session(app.clone(), "Ana").await;

    upload_file(app.clone(), &session_id, &host_id, "f.bin", b"data").await;
    let session_dir = state.blobs.root().join(&session_id);
    assert!(session_dir.exists());

    let mut rx = state.hub.register(&session_id, &host_id).await.receiver;

    let mut config = (*state.config).clone();
    config.session_timeout_secs = 0;
    state.config = std::sync::Arc::new(config);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut retries = Vec::new();
    assert_eq!(eviction::sweep_once(&state, &mut retries).await, 1);

    // The member saw session_destroyed with the timeout reason, then Close.
    let msg = rx.recv().await.expect("destroy event");
    match msg {
        axum::extract::ws::Message::Text(text) => {
            let json: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(json["type"], "session_destroyed");
            assert_eq!(json["reason"], "timeout");
        }
        other => panic!("Expected Text frame, got: {other:?}"),
    }
    assert!(matches!(
        rx.recv().await,
        Some(axum::extract::ws::Message::Close(None))
    ));

    assert!(!session_dir.exists(), "blobs reclaimed with the session");
}

// ---------------------------------------------------------------------------
// Test: a session emptied by disconnects is evicted after the grace window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_evicts_sessions_empty_past_grace() {
    let (app, mut state, _dir) = common::build_test_app().await;
    let (session_id, host_id) = create_session(app, "Ana").await;

    // The sole member disconnects for good; the session lingers.
    state.registry.remove_user(&session_id, &host_id).await;

    let mut retries = Vec::new();
    assert_eq!(
        eviction::sweep_once(&state, &mut retries).await,
        0,
        "still within the reconnect grace window"
    );

    // Collapse the grace window; the empty session is now overdue.
    let mut config = (*state.config).clone();
    config.empty_session_grace_secs = 0;
    state.config = std::sync::Arc::new(config);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert_eq!(eviction::sweep_once(&state, &mut retries).await, 1);
    assert_eq!(state.registry.active_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: sweeping twice is idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_is_idempotent() {
    let (app, mut state, _dir) = common::build_test_app().await;
    create_session(app, "Ana").await;

    let mut config = (*state.config).clone();
    config.session_timeout_secs = 0;
    state.config = std::sync::Arc::new(config);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut retries = Vec::new();
    assert_eq!(eviction::sweep_once(&state, &mut retries).await, 1);
    assert_eq!(eviction::sweep_once(&state, &mut retries).await, 0);
}
