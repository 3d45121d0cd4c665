use askama::Template;
use axum::http::StatusCode;

use crate::drafts::Draft;
use crate::insights::CombinedInsight;
use crate::models::{
    AggregatedReport, BatchTestRun, CommonIssue, GeneratedPersona, PersonaScreenshotResult,
    RunStatus, ScreenshotAnalysis, ScreenshotFlowImage, ScreenshotOverallReport,
    ScreenshotTestRun, SharedBatchTestRun, SharedScreenshotTestRun, Swarm, TestRunWithReport,
    UXAgentInsight, UXAgentRun, UXAgentScreenshot, UsabilityIssue,
};
use crate::notify::Notification;
use crate::report::{CategoryGroup, InsightSummary, RunCounts};
use crate::trace::{ActionEntry, KindCount, ThoughtEntry, TimingMetrics, TranscriptEntry};

pub const PROJECT_NAME: &str = "Swarmdeck";

pub mod filters {
    use time::OffsetDateTime;
    use time::macros::format_description;

    pub fn format_date(date: &OffsetDateTime) -> askama::Result<String> {
        Ok(date
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
            .unwrap_or_else(|_| date.date().to_string()))
    }

    pub fn relative(date: &OffsetDateTime) -> askama::Result<String> {
        Ok(crate::report::format_relative(*date, OffsetDateTime::now_utc()))
    }

    pub fn format_decimal(val: &f64) -> askama::Result<String> {
        Ok(format!("{:.1}", val))
    }

    pub fn score(score: &Option<f64>) -> askama::Result<String> {
        Ok(match score {
            Some(s) => format!("{:.1}", s),
            None => "N/A".to_string(),
        })
    }

    /// Screenshot test scores run from 0 to 100 and show as whole numbers.
    pub fn whole(score: &Option<f64>) -> askama::Result<String> {
        Ok(match score {
            Some(s) => format!("{}", s.round() as i64),
            None => "N/A".to_string(),
        })
    }

    pub fn seconds(value: &Option<f64>) -> askama::Result<String> {
        Ok(match value {
            Some(s) => format!("{:.1}s", s),
            None => "-".to_string(),
        })
    }

    pub fn md(text: &str) -> askama::Result<String> {
        Ok(crate::markdown::render(text))
    }
}

/// Which report the results tab of a batch test shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsView {
    Aggregated,
    UXAgent,
    Persona(usize),
}

impl ResultsView {
    /// Parses the `view` query value; anything unknown or out of range
    /// falls back to `default`.
    pub fn parse(value: Option<&str>, persona_count: usize, default: ResultsView) -> Self {
        match value {
            Some("aggregated") => ResultsView::Aggregated,
            Some("uxagent") => ResultsView::UXAgent,
            Some(n) => n
                .parse::<usize>()
                .ok()
                .filter(|n| *n < persona_count)
                .map(ResultsView::Persona)
                .unwrap_or(default),
            None => default,
        }
    }

    pub fn is_aggregated(&self) -> bool {
        *self == ResultsView::Aggregated
    }

    pub fn is_uxagent(&self) -> bool {
        *self == ResultsView::UXAgent
    }

    pub fn is_persona(&self, index: &usize) -> bool {
        *self == ResultsView::Persona(*index)
    }
}

pub struct BatchRow {
    pub run: BatchTestRun,
    pub persona_count: usize,
}

pub struct DashboardStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

pub struct PersonaCard {
    pub index: usize,
    pub persona: GeneratedPersona,
    pub selected: bool,
    pub can_toggle: bool,
    pub recommended: bool,
}

pub struct PersonaTab {
    pub index: usize,
    pub name: String,
    pub status: RunStatus,
    pub score: Option<f64>,
}

pub struct AgentRow {
    pub index: usize,
    pub name: String,
    pub run: UXAgentRun,
}

pub struct ScreenshotViewer {
    pub position: usize,
    pub total: usize,
    pub shot: UXAgentScreenshot,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

pub struct ChatEntry {
    pub from_user: bool,
    pub html: String,
    pub at: time::OffsetDateTime,
}

pub struct PersonaField {
    pub label: &'static str,
    pub value: String,
}

pub struct ScreenshotStep {
    pub image: ScreenshotFlowImage,
    pub analyses: Vec<PersonaAnalysis>,
}

pub struct PersonaAnalysis {
    pub persona_name: String,
    pub observations: Vec<String>,
    pub positive_aspects: Vec<String>,
    pub issues: Vec<UsabilityIssue>,
    pub thoughts: Option<String>,
    pub comparison_with_previous: Option<String>,
}

impl PersonaAnalysis {
    pub fn from_analysis(persona_name: &str, analysis: &ScreenshotAnalysis) -> Self {
        Self {
            persona_name: persona_name.to_string(),
            observations: analysis.observations.clone().unwrap_or_default(),
            positive_aspects: analysis.positive_aspects.clone().unwrap_or_default(),
            issues: analysis.issues.clone().unwrap_or_default(),
            thoughts: analysis.thoughts.clone(),
            comparison_with_previous: analysis.comparison_with_previous.clone(),
        }
    }

    /// The analysis a single-persona test stored on the image, if it has one.
    pub fn from_image(image: &ScreenshotFlowImage) -> Option<Self> {
        let analysed = image.observations.is_some()
            || image.positive_aspects.is_some()
            || image.issues.is_some()
            || image.thoughts.is_some()
            || image.comparison_with_previous.is_some();
        if !analysed {
            return None;
        }
        Some(Self {
            persona_name: String::new(),
            observations: image.observations.clone().unwrap_or_default(),
            positive_aspects: image.positive_aspects.clone().unwrap_or_default(),
            issues: image.issues.clone().unwrap_or_default(),
            thoughts: image.thoughts.clone(),
            comparison_with_previous: image.comparison_with_previous.clone(),
        })
    }
}

#[derive(Clone)]
pub struct ScreenshotPersonaTab {
    pub persona_index: usize,
    pub name: String,
    pub score: Option<f64>,
    pub summary: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub tests: Vec<BatchRow>,
    pub stats: DashboardStats,
    pub notifications: Vec<Notification>,
    pub recent_avg_score: Option<f64>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "new_test.html")]
pub struct NewTestTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub target_url: String,
    pub user_description: String,
    pub agent_count: usize,
    pub use_uxagent: bool,
    pub timeout_minutes: String,
    pub swarms: Vec<Swarm>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "select_personas.html")]
pub struct SelectPersonasTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub draft_id: String,
    pub draft: Draft,
    pub cards: Vec<PersonaCard>,
    pub selected_count: usize,
    pub agent_count: usize,
    pub remaining: usize,
    pub complete: bool,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "test_detail.html")]
pub struct TestDetailTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub run: BatchTestRun,
    pub tab: String,
    pub view: ResultsView,
    pub poll: bool,
    pub can_terminate: bool,
    pub notice: Option<String>,
    pub counts: RunCounts,
    pub finished_percent: f64,
    pub aggregated: Option<AggregatedReport>,
    pub common_issues: Vec<CommonIssue>,
    pub persona_tabs: Vec<PersonaTab>,
    pub persona_report: Option<TestRunWithReport>,
    pub avg_persona_score: f64,
    pub agents: Vec<AgentRow>,
    pub avg_agent_score: f64,
    pub insight_groups: Vec<CategoryGroup<CombinedInsight>>,
    pub insight_summary: InsightSummary,
    pub selected_personas: Vec<GeneratedPersona>,
}

#[derive(Template)]
#[template(path = "agent.html")]
pub struct AgentTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub batch_id: String,
    pub run: UXAgentRun,
    pub name: String,
    pub tab: String,
    pub persona_fields: Vec<PersonaField>,
    pub timing: Option<TimingMetrics>,
    pub pages: Vec<String>,
    pub more_pages: usize,
    pub actions: Vec<ActionEntry>,
    pub viewer: Option<ScreenshotViewer>,
    pub screenshots: Vec<UXAgentScreenshot>,
    pub thoughts: Vec<ThoughtEntry>,
    pub thought_total: usize,
    pub thought_kinds: Vec<KindCount>,
    pub kind_filter: Option<String>,
    pub insight_groups: Vec<CategoryGroup<UXAgentInsight>>,
    pub insight_summary: InsightSummary,
    pub chat: Vec<ChatEntry>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "swarms.html")]
pub struct SwarmsTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub swarms: Vec<Swarm>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "edit_swarm.html")]
pub struct EditSwarmTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub swarm: Swarm,
    pub name: String,
    pub description: String,
    pub agent_count: usize,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "screenshots.html")]
pub struct ScreenshotTestsTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub tests: Vec<ScreenshotTestRun>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "screenshot_detail.html")]
pub struct ScreenshotDetailTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub test: ScreenshotTestRun,
    pub report: Option<ScreenshotOverallReport>,
    pub persona_tabs: Vec<ScreenshotPersonaTab>,
    pub active_persona: Option<ScreenshotPersonaTab>,
    pub steps: Vec<ScreenshotStep>,
    pub notice: Option<String>,
}

impl ScreenshotDetailTemplate {
    pub fn is_active_persona(&self, index: &usize) -> bool {
        self.active_persona
            .as_ref()
            .is_some_and(|p| p.persona_index == *index)
    }
}

#[derive(Template)]
#[template(path = "transcript.html")]
pub struct TranscriptTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub batch_id: String,
    pub persona_name: String,
    pub target_url: String,
    pub reasoning: String,
    pub entries: Vec<TranscriptEntry>,
    pub screenshots: Vec<TranscriptShot>,
}

pub struct TranscriptShot {
    pub step_number: u32,
    pub description: Option<String>,
    pub data_url: String,
}

#[derive(Template)]
#[template(path = "new_swarm.html")]
pub struct NewSwarmTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub name: String,
    pub description: String,
    pub target_url: String,
    pub user_description: String,
    pub agent_count: usize,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "share_batch.html")]
pub struct SharedBatchTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub run: SharedBatchTestRun,
    pub aggregated: Option<AggregatedReport>,
    pub common_issues: Vec<CommonIssue>,
    pub persona_tabs: Vec<PersonaTab>,
    pub agents: Vec<AgentRow>,
    pub avg_agent_score: f64,
}

#[derive(Template)]
#[template(path = "share_screenshot.html")]
pub struct SharedScreenshotTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub test: SharedScreenshotTestRun,
    pub steps: Vec<ScreenshotStep>,
    pub personas: Vec<PersonaScreenshotResult>,
}

#[derive(Template)]
#[template(path = "share_unavailable.html")]
pub struct ShareUnavailableTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub project_name: String,
    pub page_title: String,
    pub active_nav: &'static str,
    pub app_version: String,
    pub status: u16,
    pub reason: String,
    pub message: String,
}

impl ErrorTemplate {
    pub fn new(status: StatusCode, message: String) -> Self {
        let reason = status.canonical_reason().unwrap_or("Error").to_string();
        Self {
            project_name: PROJECT_NAME.to_string(),
            page_title: reason.clone(),
            active_nav: "",
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            status: status.as_u16(),
            reason,
            message,
        }
    }
}
