use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::Value;

use crate::models::ChatRole;
use crate::report::{InsightSummary, agent_display_name, group_by_category, sort_by_severity};
use crate::templates::{AgentTemplate, ChatEntry, PersonaField, ScreenshotViewer};
use crate::trace::{TimingMetrics, action_entries, kind_counts, pages_visited, thought_entries};
use crate::{AppError, AppResult, SharedAppState};

const TABS: [&str; 7] = [
    "overview",
    "actions",
    "screenshots",
    "memory",
    "insights",
    "chat",
    "logs",
];

#[derive(Debug, Default, Deserialize)]
pub struct AgentQuery {
    pub tab: Option<String>,
    pub shot: Option<usize>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

pub async fn agent_detail(
    State(state): State<SharedAppState>,
    Path((batch_id, run_id)): Path<(String, String)>,
    Query(query): Query<AgentQuery>,
) -> AppResult<AgentTemplate> {
    agent_page(&state, batch_id, &run_id, query, None).await
}

/// Renders the agent view; `notice` is shown as an inline error banner.
async fn agent_page(
    state: &SharedAppState,
    batch_id: String,
    run_id: &str,
    query: AgentQuery,
    mut notice: Option<String>,
) -> AppResult<AgentTemplate> {
    let detail = state.client.get_batch_test(&batch_id).await?;
    let (index, run) = detail
        .uxagent_runs
        .into_iter()
        .enumerate()
        .find(|(_, r)| r.id == run_id)
        .ok_or_else(|| AppError::NotFound(format!("Agent run {}", run_id)))?;

    let name = agent_display_name(&run, index);
    let tab = query
        .tab
        .as_deref()
        .filter(|t| TABS.iter().any(|known| known == t))
        .unwrap_or("overview");
    let viewer = (!run.screenshots.is_empty()).then(|| {
        let total = run.screenshots.len();
        let position = query.shot.unwrap_or(0).min(total - 1);
        ScreenshotViewer {
            position,
            total,
            shot: run.screenshots[position].clone(),
            prev: position.checked_sub(1),
            next: (position + 1 < total).then_some(position + 1),
        }
    });

    // remote data is only fetched for the tab being shown
    let mut thoughts = Vec::new();
    let mut thought_total = 0;
    let mut thought_kinds = Vec::new();
    let kind_filter = query.kind.filter(|k| !k.is_empty());
    if tab == "memory" {
        let stored = match state.client.get_uxagent_thoughts(&run.id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Failed to load thoughts for run {}: {}", run.id, e);
                Vec::new()
            }
        };
        let entries = thought_entries(&stored, &run);
        thought_total = entries.len();
        thought_kinds = kind_counts(&entries);
        thoughts = match &kind_filter {
            Some(kind) => entries.into_iter().filter(|e| &e.kind == kind).collect(),
            None => entries,
        };
    }

    let mut insights = Vec::new();
    if tab == "insights" {
        match state.client.get_uxagent_insights(&run.id).await {
            Ok(loaded) => insights = loaded,
            Err(e) => {
                tracing::warn!("Failed to load insights for run {}: {}", run.id, e);
                notice.get_or_insert_with(|| e.to_string());
            }
        }
    }
    sort_by_severity(&mut insights, |i| i.severity);
    let insight_summary = InsightSummary::from_insights(&insights);
    let insight_groups = group_by_category(insights, |i| i.category);

    let mut chat = Vec::new();
    if tab == "chat" {
        match state.client.get_uxagent_chat_history(&run.id).await {
            Ok(messages) => {
                chat = messages
                    .iter()
                    .map(|m| ChatEntry {
                        from_user: m.role == ChatRole::User,
                        html: crate::markdown::render(&m.content),
                        at: m.created_at,
                    })
                    .collect();
            }
            Err(e) => {
                tracing::warn!("Failed to load chat history for run {}: {}", run.id, e);
                notice.get_or_insert_with(|| e.to_string());
            }
        }
    }

    let (pages, more_pages) = pages_visited(&run.observation_trace);

    Ok(AgentTemplate {
        project_name: state.project_name.clone(),
        page_title: name.clone(),
        active_nav: "dashboard",
        app_version: state.app_version.clone(),
        batch_id,
        tab: tab.to_string(),
        persona_fields: persona_fields(&run.persona_data, &run.basic_info),
        timing: TimingMetrics::from_basic_info(&run.basic_info),
        pages,
        more_pages,
        actions: action_entries(&run.action_trace),
        viewer,
        screenshots: run.screenshots.clone(),
        thoughts,
        thought_total,
        thought_kinds,
        kind_filter,
        insight_groups,
        insight_summary,
        chat,
        notice,
        name,
        run,
    })
}

/// Labelled persona attributes; persona data may use either key casing.
fn persona_fields(persona: &Value, basic_info: &Value) -> Vec<PersonaField> {
    const FIELDS: [(&str, &str, &str); 8] = [
        ("Age", "age", "age"),
        ("Gender", "gender", "gender"),
        ("Occupation", "occupation", "occupation"),
        ("Country", "country", "country"),
        ("Education", "education", "education"),
        ("Income Level", "incomeLevel", "income_level"),
        ("Tech Savviness", "techSavviness", "tech_savviness"),
        ("Primary Goal", "primaryGoal", "primary_goal"),
    ];

    let mut fields: Vec<PersonaField> = FIELDS
        .iter()
        .filter_map(|&(label, camel, snake)| {
            let value = persona.get(camel).or_else(|| persona.get(snake))?;
            let text = match value {
                Value::String(s) if !s.is_empty() => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(PersonaField { label, value: text })
        })
        .collect();

    if fields.is_empty()
        && let Some(description) = basic_info.get("persona").and_then(Value::as_str)
    {
        fields.push(PersonaField {
            label: "Description",
            value: description.to_string(),
        });
    }
    fields
}

fn tab_query(tab: &str) -> AgentQuery {
    AgentQuery {
        tab: Some(tab.to_string()),
        ..AgentQuery::default()
    }
}

pub async fn generate_insights(
    State(state): State<SharedAppState>,
    Path((batch_id, run_id)): Path<(String, String)>,
) -> AppResult<Response> {
    match state.client.generate_uxagent_insights(&run_id).await {
        Ok(insights) => {
            tracing::info!("Generated {} insights for run {}", insights.len(), run_id);
            let target = format!("/tests/{}/agents/{}?tab=insights", batch_id, run_id);
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            tracing::warn!("Failed to generate insights for run {}: {}", run_id, e);
            let notice = format!("Failed to generate insights: {}", e);
            let page = agent_page(&state, batch_id, &run_id, tab_query("insights"), Some(notice));
            Ok(page.await?.into_response())
        }
    }
}

pub async fn send_chat(
    State(state): State<SharedAppState>,
    Path((batch_id, run_id)): Path<(String, String)>,
    Form(form): Form<ChatForm>,
) -> AppResult<Response> {
    let target = format!("/tests/{}/agents/{}?tab=chat", batch_id, run_id);
    let message = form.message.trim();
    if message.is_empty() {
        return Ok(Redirect::to(&target).into_response());
    }

    match state.client.send_uxagent_chat_message(&run_id, message).await {
        Ok(reply) => {
            tracing::debug!("{} replied in run {}", reply.persona.name, run_id);
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            tracing::warn!("Chat with run {} failed: {}", run_id, e);
            let notice = format!("The agent could not answer: {}", e);
            let page = agent_page(&state, batch_id, &run_id, tab_query("chat"), Some(notice));
            Ok(page.await?.into_response())
        }
    }
}
