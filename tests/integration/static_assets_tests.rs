//! Static assets integration tests.
//!
//! Tests for CSS, JavaScript, and favicon serving with caching

use crate::common::test_server;
use axum::http::{StatusCode, header};

#[tokio::test]
async fn test_css_caching() {
    let server = test_server().await;

    let first_response = server.get("/style.css").await;
    assert_eq!(first_response.status_code(), StatusCode::OK);
    let content_type = first_response.headers().get("content-type").unwrap();
    assert_eq!(content_type.to_str().unwrap(), "text/css");
    assert!(first_response.text().contains("font-family"));

    let etag = first_response
        .headers()
        .get("etag")
        .expect("CSS response should include ETag header")
        .clone();

    let cached_response = server
        .get("/style.css")
        .add_header(header::IF_NONE_MATCH, etag)
        .await;
    assert_eq!(cached_response.status_code(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_js_content_type() {
    let server = test_server().await;

    let response = server.get("/app.js").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert_eq!(content_type.to_str().unwrap(), "application/javascript");
    assert!(response.text().contains("data-poll-url"));
}

#[tokio::test]
async fn test_favicon_routes() {
    let server = test_server().await;

    for path in ["/favicon.svg", "/favicon.ico"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert_eq!(content_type.to_str().unwrap(), "image/svg+xml");
    }
}
