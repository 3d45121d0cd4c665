use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::api::{CreateBatchTest, DEFAULT_MAX_STEPS, SwarmUpdate};
use crate::drafts::{Draft, DraftPurpose};
use crate::handlers::batch_tests::{parse_timeout, selection_page};
use crate::selection::{DEFAULT_AGENTS, PersonaSelection, clamp_agent_count, display_order};
use crate::models::Swarm;
use crate::templates::{EditSwarmTemplate, NewSwarmTemplate, SwarmsTemplate};
use crate::{AppError, AppResult, SharedAppState};

#[derive(Debug, Deserialize)]
pub struct NewSwarmForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub user_description: String,
    pub agent_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SaveSwarmForm {
    pub draft: String,
}

#[derive(Debug, Deserialize)]
pub struct EditSwarmForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub agent_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RunSwarmForm {
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub user_description: String,
    pub use_uxagent: Option<String>,
    #[serde(default)]
    pub timeout_minutes: String,
}

pub async fn swarms_list(State(state): State<SharedAppState>) -> SwarmsTemplate {
    let (swarms, error) = match state.client.list_swarms().await {
        Ok(swarms) => (swarms, None),
        Err(e) => {
            tracing::warn!("Failed to load swarms: {}", e);
            (Vec::new(), Some(e.to_string()))
        }
    };

    SwarmsTemplate {
        project_name: state.project_name.clone(),
        page_title: "Swarms".to_string(),
        active_nav: "swarms",
        app_version: state.app_version.clone(),
        swarms,
        error,
    }
}

pub async fn new_swarm_form(State(state): State<SharedAppState>) -> NewSwarmTemplate {
    NewSwarmTemplate {
        project_name: state.project_name.clone(),
        page_title: "New swarm".to_string(),
        active_nav: "swarms",
        app_version: state.app_version.clone(),
        name: String::new(),
        description: String::new(),
        target_url: String::new(),
        user_description: String::new(),
        agent_count: DEFAULT_AGENTS,
        error: None,
    }
}

pub async fn generate_swarm_personas(
    State(state): State<SharedAppState>,
    Form(form): Form<NewSwarmForm>,
) -> Response {
    let agent_count = clamp_agent_count(form.agent_count.unwrap_or(DEFAULT_AGENTS));
    let name = form.name.trim().to_string();
    let target_url = form.target_url.trim().to_string();
    let user_description = form.user_description.trim().to_string();

    let failure = |message: String| NewSwarmTemplate {
        project_name: state.project_name.clone(),
        page_title: "New swarm".to_string(),
        active_nav: "swarms",
        app_version: state.app_version.clone(),
        name: name.clone(),
        description: form.description.clone(),
        target_url: target_url.clone(),
        user_description: user_description.clone(),
        agent_count,
        error: Some(message),
    };

    if name.is_empty() || target_url.is_empty() || user_description.is_empty() {
        return failure("Name, website and audience are required".to_string()).into_response();
    }

    let generated = match state
        .client
        .generate_personas(&target_url, &user_description, agent_count)
        .await
    {
        Ok(generated) => generated,
        Err(e) => {
            tracing::warn!("Persona generation for swarm {} failed: {}", name, e);
            return failure(e.to_string()).into_response();
        }
    };

    let description = match form.description.trim() {
        "" => default_description(&user_description),
        d => d.to_string(),
    };

    // swarms always start complete: recommendations first, then by relevance
    let order = display_order(&generated.personas, &generated.recommended_indices);
    let mut selection = PersonaSelection::from_recommended(
        &generated.recommended_indices,
        generated.personas.len(),
        agent_count,
    );
    selection.fill_from(&order);

    let draft = Draft {
        purpose: DraftPurpose::Swarm {
            name: name.clone(),
            description,
        },
        target_url: target_url.clone(),
        user_description: user_description.clone(),
        use_uxagent: false,
        timeout_minutes: None,
        personas: generated.personas,
        recommended: generated.recommended_indices,
        selection_reasoning: generated.selection_reasoning,
        warning: generated.generation_warning,
        selection,
    };

    let id = state.drafts.insert(draft);
    Redirect::to(&format!("/tests/new/{}", id)).into_response()
}

fn default_description(user_description: &str) -> String {
    let head: String = user_description.chars().take(100).collect();
    format!("{}...", head)
}

pub async fn save_swarm(
    State(state): State<SharedAppState>,
    Form(form): Form<SaveSwarmForm>,
) -> AppResult<Response> {
    let draft = state
        .drafts
        .get(&form.draft)
        .ok_or_else(|| AppError::NotFound(format!("Draft {}", form.draft)))?;

    let DraftPurpose::Swarm { name, description } = draft.purpose.clone() else {
        return Err(AppError::BadRequest(
            "This draft launches a test, not a swarm".to_string(),
        ));
    };

    if !draft.selection.is_complete() {
        let message = format!("Select {} more", draft.selection.remaining());
        return Ok(selection_page(&state, form.draft, draft, Some(message)).into_response());
    }

    // generation order, as the personas were listed upstream
    let personas: Vec<_> = draft
        .personas
        .iter()
        .enumerate()
        .filter(|(i, _)| draft.selection.is_selected(*i))
        .map(|(_, p)| p.clone())
        .collect();

    match state
        .client
        .create_swarm(&name, &description, &personas, personas.len())
        .await
    {
        Ok(swarm) => {
            state.drafts.remove(&form.draft);
            tracing::info!("Saved swarm {} with {} personas", swarm.id, personas.len());
            Ok(Redirect::to("/swarms").into_response())
        }
        Err(e) => {
            tracing::warn!("Failed to save swarm {}: {}", name, e);
            Ok(selection_page(&state, form.draft, draft, Some(e.to_string())).into_response())
        }
    }
}

pub async fn delete_swarm(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    state.client.delete_swarm(&id).await?;
    tracing::info!("Deleted swarm {}", id);
    Ok(Redirect::to("/swarms"))
}

async fn find_swarm(state: &SharedAppState, id: &str) -> AppResult<Swarm> {
    state
        .client
        .list_swarms()
        .await?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Swarm {}", id)))
}

fn edit_page(
    state: &SharedAppState,
    swarm: Swarm,
    name: String,
    description: String,
    agent_count: usize,
    error: Option<String>,
) -> EditSwarmTemplate {
    EditSwarmTemplate {
        project_name: state.project_name.clone(),
        page_title: format!("Edit {}", swarm.name),
        active_nav: "swarms",
        app_version: state.app_version.clone(),
        swarm,
        name,
        description,
        agent_count,
        error,
    }
}

pub async fn edit_swarm_form(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> AppResult<EditSwarmTemplate> {
    let swarm = find_swarm(&state, &id).await?;
    let name = swarm.name.clone();
    let description = swarm.description.clone().unwrap_or_default();
    let agent_count = swarm.agent_count;
    Ok(edit_page(&state, swarm, name, description, agent_count, None))
}

/// A swarm can run at most as many agents as it has personas.
fn swarm_agent_count(requested: usize, persona_count: usize) -> usize {
    requested.clamp(1, persona_count.max(1))
}

pub async fn update_swarm(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    Form(form): Form<EditSwarmForm>,
) -> AppResult<Response> {
    let swarm = find_swarm(&state, &id).await?;
    let name = form.name.trim().to_string();
    let description = form.description.trim().to_string();
    let agent_count = swarm_agent_count(
        form.agent_count.unwrap_or(swarm.agent_count),
        swarm.personas.len(),
    );

    if name.is_empty() {
        let error = Some("A swarm needs a name".to_string());
        let page = edit_page(&state, swarm, name, description, agent_count, error);
        return Ok(page.into_response());
    }

    let update = SwarmUpdate {
        name: Some(name.clone()),
        description: Some(description.clone()),
        agent_count: Some(agent_count),
        ..Default::default()
    };

    match state.client.update_swarm(&id, &update).await {
        Ok(updated) => {
            tracing::info!("Updated swarm {} ({} agents)", updated.id, updated.agent_count);
            Ok(Redirect::to("/swarms").into_response())
        }
        Err(e) => {
            tracing::warn!("Failed to update swarm {}: {}", id, e);
            let page = edit_page(&state, swarm, name, description, agent_count, Some(e.to_string()));
            Ok(page.into_response())
        }
    }
}

pub async fn run_swarm(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    Form(form): Form<RunSwarmForm>,
) -> AppResult<Redirect> {
    let target_url = form.target_url.trim();
    if target_url.is_empty() {
        return Err(AppError::BadRequest("A target URL is required".to_string()));
    }
    let timeout_minutes = parse_timeout(&form.timeout_minutes).map_err(AppError::BadRequest)?;

    let swarm = find_swarm(&state, &id).await?;

    let selection = PersonaSelection::first_n(swarm.personas.len(), swarm.agent_count);
    let personas = swarm.personas[..selection.selected().len()].to_vec();
    let user_description = match form.user_description.trim() {
        "" => swarm
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("Test using {}", swarm.name)),
        d => d.to_string(),
    };

    let create = CreateBatchTest {
        target_url: target_url.to_string(),
        user_description,
        generated_personas: personas,
        selected_persona_indices: selection.selected().to_vec(),
        agent_count: selection.selected().len(),
        use_uxagent: form.use_uxagent.is_some(),
        max_steps: DEFAULT_MAX_STEPS,
        timeout_minutes,
    };

    let run = state.client.create_batch_test(&create).await?;
    state.notifier.watch(&run.id);
    tracing::info!("Started batch test {} from swarm {}", run.id, swarm.id);
    Ok(Redirect::to(&format!("/tests/{}", run.id)))
}
