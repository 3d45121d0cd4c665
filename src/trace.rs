//! Readable rows built from an agent run's raw traces.
//!
//! The upstream stores action and memory traces as loose JSON, so every
//! field is optional here.

use serde_json::Value;
use time::OffsetDateTime;

use crate::models::{SessionTranscript, ThoughtKind, TimelineKind, UXAgentRun, UXAgentThought};

pub struct ActionEntry {
    pub step: usize,
    pub action: String,
    pub target: Option<String>,
    pub detail: String,
    pub url: Option<String>,
}

impl ActionEntry {
    /// Badge class for the common browser actions.
    pub fn tone(&self) -> &'static str {
        match self.action.as_str() {
            "click" => "blue",
            "type" => "purple",
            "goto_url" => "green",
            "terminate" => "red",
            _ => "neutral",
        }
    }
}

pub fn action_entries(trace: &[Value]) -> Vec<ActionEntry> {
    trace
        .iter()
        .enumerate()
        .map(|(i, value)| ActionEntry {
            step: value
                .get("step")
                .and_then(Value::as_u64)
                .map(|s| s as usize)
                .unwrap_or(i + 1),
            action: str_field(value, "action").unwrap_or("unknown").to_string(),
            target: str_field(value, "target").map(str::to_string),
            detail: str_field(value, "description")
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            url: str_field(value, "url").map(str::to_string),
        })
        .collect()
}

pub struct ThoughtEntry {
    pub kind: String,
    pub content: String,
    /// Percent, 0-100.
    pub importance: Option<u32>,
    pub step: Option<u32>,
}

impl ThoughtEntry {
    pub fn is_long(&self) -> bool {
        self.content.chars().count() > 200
    }
}

impl From<&UXAgentThought> for ThoughtEntry {
    fn from(thought: &UXAgentThought) -> Self {
        Self {
            kind: thought_kind_label(&thought.kind),
            content: thought.content.clone(),
            importance: thought.importance.map(|i| i.round().clamp(0.0, 100.0) as u32),
            step: thought.step_number,
        }
    }
}

fn thought_kind_label(kind: &ThoughtKind) -> String {
    match kind {
        ThoughtKind::Observation => "observation",
        ThoughtKind::Action => "action",
        ThoughtKind::Plan => "plan",
        ThoughtKind::Thought => "thought",
        ThoughtKind::Reflection => "reflection",
        ThoughtKind::Other => "other",
    }
    .to_string()
}

/// Entries from the memory trace, used when the run has no stored thoughts.
pub fn memory_entries(trace: &[Value]) -> Vec<ThoughtEntry> {
    trace
        .iter()
        .enumerate()
        .map(|(i, value)| ThoughtEntry {
            kind: str_field(value, "kind")
                .map(str::to_lowercase)
                .unwrap_or_else(|| "thought".to_string()),
            content: str_field(value, "content")
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            // memory importance is a 0-1 fraction
            importance: value
                .get("importance")
                .and_then(Value::as_f64)
                .filter(|i| *i > 0.0)
                .map(|i| (i * 100.0).round().clamp(0.0, 100.0) as u32),
            step: Some(i as u32 + 1),
        })
        .collect()
}

/// Stored thoughts when there are any, otherwise the run's memory trace.
pub fn thought_entries(thoughts: &[UXAgentThought], run: &UXAgentRun) -> Vec<ThoughtEntry> {
    if thoughts.is_empty() {
        memory_entries(&run.memory_trace)
    } else {
        thoughts.iter().map(ThoughtEntry::from).collect()
    }
}

pub struct KindCount {
    pub kind: String,
    pub count: usize,
}

/// Counts per kind in first-seen order.
pub fn kind_counts(entries: &[ThoughtEntry]) -> Vec<KindCount> {
    let mut counts: Vec<KindCount> = Vec::new();
    for entry in entries {
        match counts.iter_mut().find(|c| c.kind == entry.kind) {
            Some(c) => c.count += 1,
            None => counts.push(KindCount {
                kind: entry.kind.clone(),
                count: 1,
            }),
        }
    }
    counts
}

/// Timings the agent reports in `basicInfo.timing_metrics`, in seconds.
pub struct TimingMetrics {
    pub total_duration: Option<f64>,
    pub time_to_first_action: Option<f64>,
    pub average_action_interval: Option<f64>,
    pub backtracks: u64,
}

impl TimingMetrics {
    pub fn from_basic_info(basic_info: &Value) -> Option<Self> {
        let metrics = basic_info.get("timing_metrics")?.as_object()?;
        if metrics.is_empty() {
            return None;
        }
        let seconds = |key: &str| metrics.get(key).and_then(Value::as_f64).map(|ms| ms / 1000.0);
        Some(Self {
            total_duration: seconds("total_duration_ms"),
            time_to_first_action: seconds("time_to_first_action_ms"),
            average_action_interval: seconds("average_action_interval_ms"),
            backtracks: metrics
                .get("backtrack_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
    }
}

pub const PAGES_SHOWN: usize = 5;

/// URLs of the first visited pages and how many more were left out.
pub fn pages_visited(observations: &[Value]) -> (Vec<String>, usize) {
    let pages = observations
        .iter()
        .take(PAGES_SHOWN)
        .map(|obs| str_field(obs, "url").unwrap_or("Page Visit").to_string())
        .collect();
    (pages, observations.len().saturating_sub(PAGES_SHOWN))
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// One row of a session transcript.
pub struct TranscriptEntry {
    pub elapsed: String,
    pub kind: TimelineKind,
    /// Badge text: the action type, log level or output stream.
    pub label: String,
    pub text: String,
    pub detail: Option<String>,
    pub image: Option<String>,
}

impl TranscriptEntry {
    pub fn css_class(&self) -> &'static str {
        match self.kind {
            TimelineKind::Action => "action",
            TimelineKind::Screenshot => "screenshot",
            TimelineKind::Log => "log",
            _ => "raw",
        }
    }
}

/// `mm:ss` since the session started, or `00:00` when the start is unknown.
pub fn format_elapsed(timestamp_ms: f64, started_at: Option<OffsetDateTime>) -> String {
    let Some(start) = started_at else {
        return "00:00".to_string();
    };
    let start_ms = (start.unix_timestamp_nanos() / 1_000_000) as f64;
    let seconds = ((timestamp_ms - start_ms).max(0.0) / 1000.0).floor() as u64;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn action_description(action: &Value) -> String {
    let kind = str_field(action, "type").unwrap_or("unknown");
    match kind {
        "open_web_browser" => format!(
            "Opened {}",
            str_field(action, "pageUrl").unwrap_or("browser")
        ),
        "click" => {
            let coord = |key: &str| {
                action
                    .get(key)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string())
            };
            let mut text = format!("Clicked at ({}, {})", coord("x"), coord("y"));
            if let Some(button) = str_field(action, "button") {
                text.push_str(&format!(" with {} button", button));
            }
            text
        }
        "keypress" => format!("Pressed: {}", keys(action)),
        other => format!("{} action", other),
    }
}

fn keys(action: &Value) -> String {
    match action.get("keys") {
        Some(Value::String(k)) if !k.is_empty() => k.clone(),
        Some(Value::Array(list)) if !list.is_empty() => list
            .iter()
            .map(|k| k.as_str().map(str::to_string).unwrap_or_else(|| k.to_string()))
            .collect::<Vec<_>>()
            .join("+"),
        _ => "keys".to_string(),
    }
}

/// Timeline rows in order. Reasoning is shown separately, and unknown
/// item types are dropped.
pub fn transcript_entries(transcript: &SessionTranscript) -> Vec<TranscriptEntry> {
    let started_at = transcript.test_run.started_at;
    transcript
        .timeline
        .iter()
        .filter_map(|item| {
            let data = &item.data;
            let elapsed = format_elapsed(item.timestamp, started_at);
            let entry = match item.kind {
                TimelineKind::Action => TranscriptEntry {
                    elapsed,
                    kind: item.kind,
                    label: str_field(data, "type").unwrap_or("action").to_string(),
                    text: action_description(data),
                    detail: str_field(data, "pageUrl").map(str::to_string),
                    image: None,
                },
                TimelineKind::Screenshot => {
                    let step = data.get("stepNumber").and_then(Value::as_u64).unwrap_or(0);
                    TranscriptEntry {
                        elapsed,
                        kind: item.kind,
                        label: "Screenshot".to_string(),
                        text: format!("Step {}", step),
                        detail: str_field(data, "description").map(str::to_string),
                        image: str_field(data, "base64Data").map(data_url),
                    }
                }
                TimelineKind::Log => TranscriptEntry {
                    elapsed,
                    kind: item.kind,
                    label: str_field(data, "level").unwrap_or("info").to_uppercase(),
                    text: str_field(data, "message").unwrap_or_default().to_string(),
                    detail: None,
                    image: None,
                },
                TimelineKind::Raw => TranscriptEntry {
                    elapsed,
                    kind: item.kind,
                    label: str_field(data, "stream").unwrap_or("raw").to_uppercase(),
                    text: str_field(data, "message").unwrap_or_default().to_string(),
                    detail: None,
                    image: None,
                },
                TimelineKind::Reasoning | TimelineKind::Unknown => return None,
            };
            Some(entry)
        })
        .collect()
}

pub fn data_url(base64: &str) -> String {
    format!("data:image/png;base64,{}", base64)
}
