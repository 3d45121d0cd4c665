use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::{self, ApiError};
use crate::config::Config;
use crate::drafts::DraftStore;
use crate::handlers;
use crate::notify::Notifier;
use crate::templates::PROJECT_NAME;

/// Format latency in human-readable units
fn format_latency(duration: std::time::Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{}ms", micros / 1000)
    } else {
        format!("{:.1}s", micros as f64 / 1_000_000.0)
    }
}

pub struct AppState {
    pub client: api::Client,
    pub drafts: DraftStore,
    pub notifier: Notifier,
    pub config: Config,
    pub project_name: String,
    pub app_version: String,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let client = api::Client::new(&config)?;
        let notifier = Notifier::new(client.clone(), config.poll_interval);

        Ok(Self {
            client,
            drafts: DraftStore::new(),
            notifier,
            config,
            project_name: PROJECT_NAME.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

pub fn create_app(state: SharedAppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/tests/new", get(handlers::new_test_form).post(handlers::create_draft))
        .route("/tests/new/:draft", get(handlers::select_personas))
        .route(
            "/tests/new/:draft/toggle/:index",
            post(handlers::toggle_persona),
        )
        .route("/tests/new/:draft/launch", post(handlers::launch))
        .route("/tests/:id", get(handlers::test_detail))
        .route("/tests/:id/terminate", post(handlers::terminate))
        .route(
            "/tests/:id/insights",
            post(handlers::batch_tests::generate_insights),
        )
        .route("/tests/:id/agents/:run", get(handlers::agent_detail))
        .route(
            "/tests/:id/agents/:run/insights",
            post(handlers::agents::generate_insights),
        )
        .route("/tests/:id/agents/:run/chat", post(handlers::send_chat))
        .route("/tests/:id/transcript/:run", get(handlers::session_transcript))
        .route("/swarms", get(handlers::swarms_list).post(handlers::save_swarm))
        .route(
            "/swarms/new",
            get(handlers::new_swarm_form).post(handlers::generate_swarm_personas),
        )
        .route(
            "/swarms/:id/edit",
            get(handlers::edit_swarm_form).post(handlers::update_swarm),
        )
        .route("/swarms/:id/delete", post(handlers::delete_swarm))
        .route("/swarms/:id/run", post(handlers::run_swarm))
        .route("/screenshots", get(handlers::screenshot_tests))
        .route("/screenshots/:id", get(handlers::screenshot_detail))
        .route("/screenshots/:id/rerun", post(handlers::rerun_screenshot_test))
        .route("/share/batch/:token", get(handlers::share_batch))
        .route("/share/screenshot/:token", get(handlers::share_screenshot))
        .route("/api/batch-tests/:id/status", get(handlers::batch_status))
        .route(
            "/api/screenshot-tests/:id/status",
            get(handlers::screenshot_status),
        )
        .route("/api/notifications", get(handlers::notifications))
        .route("/health", get(handlers::health_check))
        .route("/style.css", get(handlers::serve_css))
        .route("/app.js", get(handlers::serve_js))
        .route("/favicon.ico", get(handlers::serve_favicon))
        .route("/favicon.svg", get(handlers::serve_favicon))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    static REQUEST_ID: AtomicU64 = AtomicU64::new(1);
                    let request_id_num = REQUEST_ID.fetch_add(1, Ordering::Relaxed);
                    let generator = block_id::BlockId::new(
                        block_id::Alphabet::alphanumeric(),
                        1234,
                        5,
                    );
                    let request_id = generator
                        .encode_string(request_id_num)
                        .unwrap_or_else(|| request_id_num.to_string());
                    tracing::info_span!(
                        "request",
                        id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &Span| {
                    tracing::info!("-> {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::info!(
                            "<- {} latency={}",
                            response.status().as_u16(),
                            format_latency(latency)
                        );
                    },
                ),
        )
        .layer(CompressionLayer::new())
}
