use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::LazyLock;

use axum::{
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

// Embed static assets at compile time
const STYLE_CSS: &str = include_str!("../../frontend/public/style.css");
const APP_JS: &str = include_str!("../../frontend/public/app.js");
const FAVICON_SVG: &str = include_str!("../../frontend/public/favicon.svg");

static CSS_ETAG: LazyLock<String> = LazyLock::new(|| {
    let mut hasher = DefaultHasher::new();
    STYLE_CSS.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
});

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn serve_css(headers: HeaderMap) -> Response {
    let etag = CSS_ETAG.as_str();
    let matches = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if matches {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "text/css"),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        STYLE_CSS,
    )
        .into_response()
}

pub async fn serve_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], APP_JS)
}

pub async fn serve_favicon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], FAVICON_SVG)
}
