use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const API_URL_ENV: &str = "SWARM_API_URL";
pub const SESSION_COOKIE_ENV: &str = "SWARM_SESSION_COOKIE";

/// Runtime settings resolved from command-line flags and the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream test-execution API
    pub api_url: String,
    /// Cookie header forwarded on authenticated upstream calls
    pub session_cookie: Option<String>,
    pub request_timeout: Duration,
    /// Refresh cadence for batch tests that are still running
    pub poll_interval: Duration,
}

impl Config {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            session_cookie: None,
            request_timeout: Duration::from_secs(60),
            poll_interval: crate::poll::ACTIVE_POLL_INTERVAL,
        }
    }

    /// Flags win over the environment, the environment wins over defaults.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);
        config.session_cookie = std::env::var(SESSION_COOKIE_ENV)
            .ok()
            .filter(|c| !c.trim().is_empty());
        config
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
