use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use argh::FromArgs;
use swarmdeck::config::{API_URL_ENV, DEFAULT_API_URL, SESSION_COOKIE_ENV};
use swarmdeck::{AppState, Config, create_app};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(FromArgs, Debug)]
/// Swarmdeck: a dashboard for persona-driven UX test swarms.
struct Args {
    /// host to bind to
    #[argh(option, default = "String::from(\"127.0.0.1\")")]
    host: String,

    /// port to listen on (0 for random available port)
    #[argh(option, short = 'p', default = "0")]
    port: u16,

    /// open the browser automatically
    #[argh(switch, short = 'o')]
    open: bool,

    /// base URL of the test-execution API (default: $SWARM_API_URL or http://localhost:8080)
    #[argh(option)]
    api_url: Option<String>,

    /// session cookie forwarded upstream (default: $SWARM_SESSION_COOKIE)
    #[argh(option)]
    session_cookie: Option<String>,

    /// upstream request timeout in seconds
    #[argh(option, default = "60")]
    request_timeout_secs: u64,

    /// refresh interval in seconds for running batch tests
    #[argh(option, default = "3")]
    poll_interval_secs: u64,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = match &self.api_url {
            Some(url) => Config::new(url.clone()),
            None => Config::from_env(),
        };
        if let Some(cookie) = &self.session_cookie {
            config = config.with_session_cookie(cookie.clone());
        } else if self.api_url.is_some() {
            config.session_cookie = std::env::var(SESSION_COOKIE_ENV)
                .ok()
                .filter(|c| !c.trim().is_empty());
        }
        config
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs.max(1)))
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs.max(1)))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swarmdeck=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Args = argh::from_env();
    let config = args.config();
    if args.api_url.is_none() && std::env::var(API_URL_ENV).is_err() {
        tracing::warn!("{} not set, using {}", API_URL_ENV, DEFAULT_API_URL);
    }
    tracing::info!("upstream API at {}", config.api_url);

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Failed to build upstream client: {}", e);
            return;
        }
    };

    let addr: SocketAddr = match format!("{}:{}", args.host, args.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid host or port: {}", e);
            return;
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };
    let url = match listener.local_addr() {
        Ok(actual) => format!("http://{}", actual),
        Err(_) => format!("http://{}", addr),
    };

    tracing::info!("{}", url);

    if args.open
        && let Err(e) = open::that(&url)
    {
        tracing::error!("Failed to open browser: {}", e);
    }

    let app = create_app(state.clone());
    let shutdown_state = state.clone();
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("shutting down");
        shutdown_state.notifier.shutdown();
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!("Server error: {}", e);
    }
}
