use axum::extract::{Path, State};

use crate::templates::{TranscriptShot, TranscriptTemplate};
use crate::trace::{data_url, transcript_entries};
use crate::{AppResult, SharedAppState};

/// Step-by-step replay of one persona's browser session.
pub async fn session_transcript(
    State(state): State<SharedAppState>,
    Path((batch_id, run_id)): Path<(String, String)>,
) -> AppResult<TranscriptTemplate> {
    let (transcript, detail) = tokio::join!(
        state.client.get_session_transcript(&run_id),
        state.client.get_batch_test(&batch_id)
    );
    let transcript = transcript?;

    let persona_name = match detail {
        Ok(detail) => detail
            .test_runs
            .into_iter()
            .find(|t| t.test_run.id == run_id)
            .and_then(|t| {
                t.test_run
                    .persona_name
                    .or_else(|| t.test_run.persona_data.map(|p| p.name))
            })
            .filter(|n| !n.is_empty()),
        Err(e) => {
            tracing::warn!("Failed to load batch test {} for transcript: {}", batch_id, e);
            None
        }
    }
    .unwrap_or_else(|| "Agent".to_string());

    let entries = transcript_entries(&transcript);
    let screenshots = transcript
        .screenshots
        .into_iter()
        .filter_map(|shot| {
            let data = shot.base64_data.filter(|d| !d.is_empty())?;
            Some(TranscriptShot {
                step_number: shot.step_number,
                description: shot.description,
                data_url: data_url(&data),
            })
        })
        .collect();

    Ok(TranscriptTemplate {
        project_name: state.project_name.clone(),
        page_title: format!("Session: {}", persona_name),
        active_nav: "dashboard",
        app_version: state.app_version.clone(),
        batch_id,
        persona_name,
        target_url: transcript.test_run.target_url,
        reasoning: transcript.agent_reasoning,
        entries,
        screenshots,
    })
}
