//! Public share link integration tests.
//!
//! Tests for shared batch reports and shared screenshot flows

use crate::common::test_server;
use axum::http::StatusCode;

#[tokio::test]
async fn test_shared_batch_report() {
    let server = test_server().await;

    let response = server.get("/share/batch/good").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("UX Test Report"));
    assert!(body.contains("7.3"));
    assert!(body.contains("Prioritized Recommendations"));
    assert!(body.contains("Maya Chen"));
    // the public view has no dashboard navigation
    assert!(!body.contains("href=\"/swarms\""));
}

#[tokio::test]
async fn test_shared_batch_unknown_token() {
    let server = test_server().await;

    let response = server.get("/share/batch/expired").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body = response.text();
    assert!(body.contains("Report Not Available"));
    assert!(body.contains("Share link not found"));
}

#[tokio::test]
async fn test_shared_batch_revoked_token() {
    let server = test_server().await;

    let response = server.get("/share/batch/revoked").await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert!(response.text().contains("Report Not Available"));
}

#[tokio::test]
async fn test_shared_screenshot_flow() {
    let server = test_server().await;

    let response = server.get("/share/screenshot/good").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Checkout flow"));
    assert!(body.contains("Reviewed by Maya Chen"));
    assert!(body.contains("62<span class=\"muted\">/100</span>"));
    let first = body.find("Screen 1").unwrap();
    let second = body.find("Screen 2").unwrap();
    assert!(first < second);
    assert!(body.contains("Card field too small"));
}

#[tokio::test]
async fn test_shared_screenshot_unknown_token() {
    let server = test_server().await;

    let response = server.get("/share/screenshot/nope").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("Report Not Available"));
}
