//! Session transcript integration tests.

use crate::common::test_server;
use axum::http::StatusCode;

#[tokio::test]
async fn test_session_transcript() {
    let server = test_server().await;

    let response = server.get("/tests/bt-running/transcript/tr-1").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Session: Maya Chen"));
    assert!(body.contains("Browser session started"));
    assert!(body.contains("INFO"));
    assert!(body.contains("Opened https://shop.test"));
    assert!(body.contains("00:03"));
    assert!(body.contains("Clicked at (310, 42) with left button"));
    assert!(body.contains("01:05"));
    assert!(!body.contains("private chain of thought"));
    assert!(body.contains("I looked for the <strong>cart</strong> first."));
}

#[tokio::test]
async fn test_transcript_sidebar_skips_missing_images() {
    let server = test_server().await;

    let body = server.get("/tests/bt-running/transcript/tr-1").await.text();

    assert!(body.contains("Screenshots (1)"));
    assert!(body.contains("data:image/png;base64,iVBORw0KGgo="));
    assert!(!body.contains("Not captured"));
}

#[tokio::test]
async fn test_transcript_falls_back_to_agent_name() {
    let server = test_server().await;

    let body = server.get("/tests/bt-done/transcript/tr-1").await.text();

    assert!(body.contains("Session: Agent"));
}

#[tokio::test]
async fn test_unknown_transcript() {
    let server = test_server().await;

    let response = server.get("/tests/bt-running/transcript/tr-404").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("Test run not found"));
}
