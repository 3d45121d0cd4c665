use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::models::*;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Pulls the display message out of an upstream error body.
///
/// The upstream answers failures with `{"error": ..., "details": ...}`; the
/// more specific `details` wins.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("details")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("error").and_then(|v| v.as_str()))
            .or_else(|| value.as_str())
            .unwrap_or("Request failed")
            .to_string(),
        Err(_) => "Request failed".to_string(),
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchTest {
    pub target_url: String,
    pub user_description: String,
    pub generated_personas: Vec<GeneratedPersona>,
    pub selected_persona_indices: Vec<usize>,
    pub agent_count: usize,
    #[serde(rename = "useUXAgent")]
    pub use_uxagent: bool,
    pub max_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
}

pub const DEFAULT_MAX_STEPS: u32 = 20;
pub const MAX_TIMEOUT_MINUTES: u32 = 120;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePersonasRequest<'a> {
    target_url: &'a str,
    user_description: &'a str,
    agent_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSwarmRequest<'a> {
    name: &'a str,
    description: &'a str,
    personas: &'a [GeneratedPersona],
    agent_count: usize,
}

/// Partial swarm update; absent fields keep their stored value.
#[derive(Debug, Serialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SwarmUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personas: Option<Vec<GeneratedPersona>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchTestsEnvelope {
    batch_tests: Vec<BatchTestRun>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchTestRunEnvelope {
    batch_test_run: BatchTestRun,
}

#[derive(Deserialize)]
struct SwarmsEnvelope {
    swarms: Vec<Swarm>,
}

#[derive(Deserialize)]
struct SwarmEnvelope {
    swarm: Swarm,
}

#[derive(Deserialize)]
struct ScreenshotTestsEnvelope {
    tests: Vec<ScreenshotTestRun>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScreenshotTestRunEnvelope {
    screenshot_test_run: ScreenshotTestRun,
}

#[derive(Deserialize)]
struct ThoughtsEnvelope {
    thoughts: Vec<UXAgentThought>,
}

#[derive(Deserialize)]
struct InsightsEnvelope {
    #[serde(default)]
    insights: Vec<UXAgentInsight>,
}

#[derive(Deserialize)]
struct MessagesEnvelope {
    messages: Vec<UXAgentChatMessage>,
}

/// HTTP client for the upstream test-execution API.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("swarmdeck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            session_cookie: config.session_cookie.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.session_cookie {
            Some(cookie) => builder.header(reqwest::header::COOKIE, cookie),
            None => builder,
        }
    }

    /// Public share endpoints never carry credentials.
    fn public_request(&self, path: &str) -> RequestBuilder {
        self.http.get(format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::warn!("upstream returned {}: {}", status.as_u16(), message);
            return Err(ApiError::Status { status, message });
        }

        Ok(serde_json::from_str(&body)?)
    }

    pub async fn list_batch_tests(&self) -> Result<Vec<BatchTestRun>> {
        let envelope: BatchTestsEnvelope = self
            .send(self.request(Method::GET, "/api/batch-tests"))
            .await?;
        Ok(envelope.batch_tests)
    }

    pub async fn get_batch_test(&self, id: &str) -> Result<BatchTestDetail> {
        self.send(self.request(Method::GET, &format!("/api/batch-tests/{}", id)))
            .await
    }

    pub async fn terminate_batch_test(&self, id: &str) -> Result<BatchTestRun> {
        let envelope: BatchTestRunEnvelope = self
            .send(self.request(Method::POST, &format!("/api/batch-tests/{}/terminate", id)))
            .await?;
        Ok(envelope.batch_test_run)
    }

    pub async fn generate_personas(
        &self,
        target_url: &str,
        user_description: &str,
        agent_count: usize,
    ) -> Result<GeneratedPersonas> {
        let body = GeneratePersonasRequest {
            target_url,
            user_description,
            agent_count,
        };
        self.send(
            self.request(Method::POST, "/api/batch-tests/generate-personas")
                .json(&body),
        )
        .await
    }

    pub async fn create_batch_test(&self, create: &CreateBatchTest) -> Result<BatchTestRun> {
        let envelope: BatchTestRunEnvelope = self
            .send(self.request(Method::POST, "/api/batch-tests").json(create))
            .await?;
        Ok(envelope.batch_test_run)
    }

    pub async fn list_swarms(&self) -> Result<Vec<Swarm>> {
        let envelope: SwarmsEnvelope = self.send(self.request(Method::GET, "/api/swarms")).await?;
        Ok(envelope.swarms)
    }

    pub async fn create_swarm(
        &self,
        name: &str,
        description: &str,
        personas: &[GeneratedPersona],
        agent_count: usize,
    ) -> Result<Swarm> {
        let body = CreateSwarmRequest {
            name,
            description,
            personas,
            agent_count,
        };
        let envelope: SwarmEnvelope = self
            .send(self.request(Method::POST, "/api/swarms").json(&body))
            .await?;
        Ok(envelope.swarm)
    }

    pub async fn delete_swarm(&self, id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .send(self.request(Method::DELETE, &format!("/api/swarms/{}", id)))
            .await?;
        Ok(())
    }

    pub async fn update_swarm(&self, id: &str, update: &SwarmUpdate) -> Result<Swarm> {
        let envelope: SwarmEnvelope = self
            .send(
                self.request(Method::PUT, &format!("/api/swarms/{}", id))
                    .json(update),
            )
            .await?;
        Ok(envelope.swarm)
    }

    pub async fn list_screenshot_tests(&self) -> Result<Vec<ScreenshotTestRun>> {
        let envelope: ScreenshotTestsEnvelope = self
            .send(self.request(Method::GET, "/api/screenshot-tests"))
            .await?;
        Ok(envelope.tests)
    }

    pub async fn get_screenshot_test(&self, id: &str) -> Result<ScreenshotTestResult> {
        self.send(self.request(Method::GET, &format!("/api/screenshot-tests/{}", id)))
            .await
    }

    /// Starts a fresh analysis of the same screenshots and returns the new run.
    pub async fn rerun_screenshot_test(&self, id: &str) -> Result<ScreenshotTestRun> {
        let envelope: ScreenshotTestRunEnvelope = self
            .send(self.request(Method::POST, &format!("/api/screenshot-tests/{}/rerun", id)))
            .await?;
        Ok(envelope.screenshot_test_run)
    }

    pub async fn get_session_transcript(&self, test_run_id: &str) -> Result<SessionTranscript> {
        self.send(self.request(Method::GET, &format!("/api/tests/{}/transcript", test_run_id)))
            .await
    }

    pub async fn get_uxagent_thoughts(&self, run_id: &str) -> Result<Vec<UXAgentThought>> {
        let envelope: ThoughtsEnvelope = self
            .send(self.request(Method::GET, &format!("/api/uxagent/runs/{}/thoughts", run_id)))
            .await?;
        Ok(envelope.thoughts)
    }

    pub async fn get_uxagent_insights(&self, run_id: &str) -> Result<Vec<UXAgentInsight>> {
        let envelope: InsightsEnvelope = self
            .send(self.request(Method::GET, &format!("/api/uxagent/runs/{}/insights", run_id)))
            .await?;
        Ok(envelope.insights)
    }

    pub async fn generate_uxagent_insights(&self, run_id: &str) -> Result<Vec<UXAgentInsight>> {
        let envelope: InsightsEnvelope = self
            .send(self.request(Method::POST, &format!("/api/uxagent/runs/{}/insights", run_id)))
            .await?;
        Ok(envelope.insights)
    }

    pub async fn get_uxagent_chat_history(&self, run_id: &str) -> Result<Vec<UXAgentChatMessage>> {
        let envelope: MessagesEnvelope = self
            .send(self.request(Method::GET, &format!("/api/uxagent/runs/{}/chat", run_id)))
            .await?;
        Ok(envelope.messages)
    }

    pub async fn send_uxagent_chat_message(&self, run_id: &str, message: &str) -> Result<ChatReply> {
        self.send(
            self.request(Method::POST, &format!("/api/uxagent/runs/{}/chat", run_id))
                .json(&ChatRequest { message }),
        )
        .await
    }

    pub async fn get_shared_batch_test(&self, token: &str) -> Result<SharedBatchTest> {
        self.send(self.public_request(&format!("/api/share/batch/{}", token)))
            .await
    }

    pub async fn get_shared_screenshot_test(&self, token: &str) -> Result<SharedScreenshotTest> {
        self.send(self.public_request(&format!("/api/share/screenshot/{}", token)))
            .await
    }
}
