use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPersona {
    pub name: String,
    pub age: u32,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub country: String,
    pub occupation: String,
    pub education: Option<String>,
    pub income_level: String,
    pub income: Option<String>,
    pub tech_savviness: String,
    pub primary_goal: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub relevance_score: f64,
    pub background: Option<String>,
    pub financial_situation: Option<String>,
    pub browsing_habits: Option<String>,
    pub professional_life: Option<String>,
    pub personal_style: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    RunningTests,
    Aggregating,
    RunningUxagent,
    Completed,
    Failed,
    Terminated,
    #[serde(other)]
    Unknown,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::RunningTests => "running_tests",
            BatchStatus::Aggregating => "aggregating",
            BatchStatus::RunningUxagent => "running_uxagent",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
            BatchStatus::Terminated => "terminated",
            BatchStatus::Unknown => "unknown",
        }
    }

    /// Statuses that keep the detail page refreshing.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            BatchStatus::RunningTests | BatchStatus::Aggregating | BatchStatus::RunningUxagent
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Terminated
        )
    }

    pub fn can_terminate(&self) -> bool {
        matches!(self, BatchStatus::RunningTests | BatchStatus::Aggregating)
    }

    /// Human-readable progress line shown while the batch is active
    pub fn progress_message(&self) -> &'static str {
        match self {
            BatchStatus::Aggregating => "Aggregating results across personas",
            BatchStatus::RunningUxagent => "UXAgent sessions in progress",
            _ => "Agents are testing your site",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Pending => write!(f, "Queued"),
            BatchStatus::RunningTests => write!(f, "Running"),
            BatchStatus::Aggregating => write!(f, "Aggregating"),
            BatchStatus::RunningUxagent => write!(f, "Running UXAgent"),
            BatchStatus::Completed => write!(f, "Success"),
            BatchStatus::Failed => write!(f, "Failed"),
            BatchStatus::Terminated => write!(f, "Terminated"),
            BatchStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Terminated,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Terminated => "terminated",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "Pending"),
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Completed => write!(f, "Completed"),
            RunStatus::Failed => write!(f, "Failed"),
            RunStatus::Terminated => write!(f, "Terminated"),
            RunStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

impl Severity {
    /// Rank order used everywhere insights and issues are listed.
    pub const ORDERED: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Returns sort order (lower = more severe)
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low | Severity::Unknown => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Usability,
    Accessibility,
    Performance,
    Content,
    Navigation,
    #[serde(other)]
    Other,
}

impl Category {
    pub const ORDERED: [Category; 6] = [
        Category::Usability,
        Category::Accessibility,
        Category::Performance,
        Category::Content,
        Category::Navigation,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Usability => "usability",
            Category::Accessibility => "accessibility",
            Category::Performance => "performance",
            Category::Content => "content",
            Category::Navigation => "navigation",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Usability => write!(f, "Usability"),
            Category::Accessibility => write!(f, "Accessibility"),
            Category::Performance => write!(f, "Performance"),
            Category::Content => write!(f, "Content"),
            Category::Navigation => write!(f, "Navigation"),
            Category::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low | Priority::Unknown => "low",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BatchTestRun {
    pub id: String,
    pub user_id: Option<String>,
    pub target_url: String,
    pub user_description: Option<String>,
    #[serde(default)]
    pub generated_personas: Vec<GeneratedPersona>,
    #[serde(default)]
    pub selected_persona_indices: Vec<usize>,
    pub status: BatchStatus,
    #[serde(default, rename = "useUXAgent")]
    pub use_uxagent: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub id: String,
    pub batch_test_run_id: Option<String>,
    pub target_url: Option<String>,
    #[serde(default)]
    pub persona_index: usize,
    pub persona_data: Option<GeneratedPersona>,
    pub persona_name: Option<String>,
    pub status: RunStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UsabilityIssue {
    pub severity: Severity,
    #[serde(alias = "issue")]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Option<String>,
    pub test_run_id: Option<String>,
    pub score: Option<f64>,
    pub summary: Option<String>,
    pub positive_aspects: Option<Vec<String>>,
    pub usability_issues: Option<Vec<UsabilityIssue>>,
    pub accessibility_notes: Option<Vec<String>>,
    pub recommendations: Option<Vec<String>>,
    pub total_duration: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TestRunWithReport {
    pub test_run: TestRun,
    pub report: Option<Report>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UXAgentScreenshot {
    pub id: String,
    pub step_number: u32,
    pub filename: Option<String>,
    pub s3_url: Option<String>,
    pub signed_url: Option<String>,
}

impl UXAgentScreenshot {
    /// Presigned URL when the upstream issued one, otherwise the raw object URL
    pub fn display_url(&self) -> Option<&str> {
        self.signed_url.as_deref().or(self.s3_url.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UXAgentRun {
    pub id: String,
    pub test_run_id: Option<String>,
    pub run_id: Option<String>,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub start_url: String,
    #[serde(default)]
    pub persona_data: Value,
    pub status: RunStatus,
    pub score: Option<f64>,
    #[serde(default)]
    pub terminated: bool,
    pub steps_taken: Option<u32>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub basic_info: Value,
    #[serde(default)]
    pub action_trace: Vec<Value>,
    #[serde(default)]
    pub memory_trace: Vec<Value>,
    #[serde(default)]
    pub observation_trace: Vec<Value>,
    pub log_content: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub screenshots: Vec<UXAgentScreenshot>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommonIssue {
    pub issue: String,
    pub severity: Severity,
    #[serde(default)]
    pub affected_personas: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PersonaInsight {
    pub persona_name: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedRecommendation {
    pub priority: Priority,
    pub recommendation: String,
    #[serde(default)]
    pub impact: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedReport {
    pub id: Option<String>,
    pub overall_score: Option<f64>,
    pub executive_summary: Option<String>,
    pub common_issues: Option<Vec<CommonIssue>>,
    pub persona_specific_insights: Option<Vec<PersonaInsight>>,
    pub recommendations: Option<Vec<PrioritizedRecommendation>>,
    pub strengths_across_personas: Option<Vec<String>>,
    pub full_analysis: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BatchTestDetail {
    pub batch_test_run: BatchTestRun,
    #[serde(default)]
    pub test_runs: Vec<TestRunWithReport>,
    pub aggregated_report: Option<AggregatedReport>,
    #[serde(default)]
    pub uxagent_runs: Vec<UXAgentRun>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtKind {
    Observation,
    Action,
    Plan,
    Thought,
    Reflection,
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UXAgentThought {
    pub id: String,
    pub kind: ThoughtKind,
    pub content: String,
    pub importance: Option<f64>,
    pub step_number: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UXAgentInsight {
    pub id: String,
    pub uxagent_run_id: String,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
    pub supporting_thought_ids: Option<Vec<String>>,
    pub ai_model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UXAgentChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatPersona {
    pub name: String,
    pub age: Value,
    pub occupation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatReply {
    pub response: String,
    pub persona: ChatPersona,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Swarm {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub personas: Vec<GeneratedPersona>,
    pub agent_count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPersonas {
    pub personas: Vec<GeneratedPersona>,
    #[serde(default)]
    pub recommended_indices: Vec<usize>,
    pub selection_reasoning: Option<String>,
    pub generation_warning: Option<String>,
}

// Screenshot flow tests

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScreenshotTestStatus {
    Pending,
    Uploading,
    Analyzing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl ScreenshotTestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenshotTestStatus::Pending => "pending",
            ScreenshotTestStatus::Uploading => "uploading",
            ScreenshotTestStatus::Analyzing => "analyzing",
            ScreenshotTestStatus::Completed => "completed",
            ScreenshotTestStatus::Failed => "failed",
            ScreenshotTestStatus::Unknown => "unknown",
        }
    }

    /// Statuses that keep the detail page refreshing.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ScreenshotTestStatus::Pending
                | ScreenshotTestStatus::Uploading
                | ScreenshotTestStatus::Analyzing
        )
    }
}

impl fmt::Display for ScreenshotTestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenshotTestStatus::Pending => write!(f, "Queued"),
            ScreenshotTestStatus::Uploading => write!(f, "Uploading"),
            ScreenshotTestStatus::Analyzing => write!(f, "Analyzing"),
            ScreenshotTestStatus::Completed => write!(f, "Completed"),
            ScreenshotTestStatus::Failed => write!(f, "Failed"),
            ScreenshotTestStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotTestRun {
    pub id: String,
    pub test_name: Option<String>,
    pub user_description: Option<String>,
    pub expected_task: Option<String>,
    pub agent_count: Option<usize>,
    pub status: ScreenshotTestStatus,
    pub overall_score: Option<f64>,
    pub summary: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub error_message: Option<String>,
}

impl ScreenshotTestRun {
    pub fn display_name(&self) -> &str {
        self.test_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Screenshot Test")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOverallReport {
    pub score: Option<f64>,
    pub summary: Option<String>,
    #[serde(default)]
    pub full_report: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotTestResult {
    pub test_run: ScreenshotTestRun,
    #[serde(default)]
    pub screenshots: Vec<ScreenshotFlowImage>,
    #[serde(default)]
    pub persona_results: Vec<PersonaScreenshotResult>,
    pub overall_report: Option<ScreenshotOverallReport>,
}

// Session transcripts of single persona test runs

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Action,
    Screenshot,
    Reasoning,
    Log,
    Raw,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    #[serde(rename = "type")]
    pub kind: TimelineKind,
    /// Milliseconds since the unix epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptScreenshot {
    pub id: String,
    pub step_number: u32,
    pub description: Option<String>,
    pub base64_data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptTestRun {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub target_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionTranscript {
    #[serde(default)]
    pub agent_reasoning: String,
    #[serde(default)]
    pub screenshots: Vec<TranscriptScreenshot>,
    #[serde(default)]
    pub timeline: Vec<TimelineItem>,
    pub test_run: TranscriptTestRun,
}

// Public share payloads

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SharedBatchTestRun {
    pub id: String,
    pub target_url: String,
    pub user_description: Option<String>,
    pub status: BatchStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SharedTestRun {
    pub id: String,
    pub persona_name: Option<String>,
    pub persona_data: Option<GeneratedPersona>,
    pub status: RunStatus,
    pub report: Option<Report>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SharedBatchTest {
    pub batch_test_run: SharedBatchTestRun,
    #[serde(default)]
    pub test_runs: Vec<SharedTestRun>,
    pub aggregated_report: Option<AggregatedReport>,
    #[serde(default)]
    pub uxagent_runs: Vec<UXAgentRun>,
    #[serde(default)]
    pub is_shared_view: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SharedScreenshotTestRun {
    pub id: String,
    pub test_name: Option<String>,
    pub user_description: Option<String>,
    pub expected_task: Option<String>,
    pub status: ScreenshotTestStatus,
    pub overall_score: Option<f64>,
    pub summary: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotFlowImage {
    pub id: String,
    pub order_index: u32,
    pub s3_url: Option<String>,
    pub signed_url: Option<String>,
    pub description: Option<String>,
    pub context: Option<String>,
    // single-persona tests store the analysis on the image itself
    pub observations: Option<Vec<String>>,
    pub positive_aspects: Option<Vec<String>>,
    pub issues: Option<Vec<UsabilityIssue>>,
    pub thoughts: Option<String>,
    pub comparison_with_previous: Option<String>,
}

impl ScreenshotFlowImage {
    pub fn display_url(&self) -> Option<&str> {
        self.signed_url.as_deref().or(self.s3_url.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotAnalysis {
    pub screenshot_order: u32,
    pub observations: Option<Vec<String>>,
    pub positive_aspects: Option<Vec<String>>,
    pub issues: Option<Vec<UsabilityIssue>>,
    pub thoughts: Option<String>,
    pub comparison_with_previous: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PersonaScreenshotResult {
    pub persona_index: usize,
    pub persona_name: String,
    #[serde(default)]
    pub analyses: Vec<ScreenshotAnalysis>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SharedScreenshotTest {
    pub test_run: SharedScreenshotTestRun,
    #[serde(default)]
    pub screenshots: Vec<ScreenshotFlowImage>,
    #[serde(default)]
    pub persona_results: Vec<PersonaScreenshotResult>,
}
