use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::ApiError;
use crate::handlers::batch_tests::agent_rows;
use crate::models::{PersonaScreenshotResult, ScreenshotFlowImage, SharedTestRun};
use crate::report::{average_score, sorted_common_issues};
use crate::templates::{
    PersonaAnalysis, PersonaTab, ScreenshotStep, ShareUnavailableTemplate, SharedBatchTemplate,
    SharedScreenshotTemplate,
};
use crate::{AppResult, SharedAppState};

/// Expired, revoked and unknown tokens get a friendly page rather than an error.
fn unavailable(state: &SharedAppState, error: &ApiError) -> Option<Response> {
    let status = error.status()?;
    if status != StatusCode::NOT_FOUND && status != StatusCode::FORBIDDEN {
        return None;
    }

    let page = ShareUnavailableTemplate {
        project_name: state.project_name.clone(),
        page_title: "Report Not Available".to_string(),
        active_nav: "share",
        app_version: state.app_version.clone(),
        message: error.to_string(),
    };
    Some((status, page).into_response())
}

pub async fn share_batch(
    State(state): State<SharedAppState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let shared = match state.client.get_shared_batch_test(&token).await {
        Ok(shared) => shared,
        Err(e) => match unavailable(&state, &e) {
            Some(page) => return Ok(page),
            None => return Err(e.into()),
        },
    };

    let common_issues = sorted_common_issues(
        shared
            .aggregated_report
            .as_ref()
            .and_then(|r| r.common_issues.as_deref()),
    );
    let avg_agent_score = average_score(shared.uxagent_runs.iter().map(|r| r.score));

    Ok(SharedBatchTemplate {
        project_name: state.project_name.clone(),
        page_title: "UX Test Report".to_string(),
        active_nav: "share",
        app_version: state.app_version.clone(),
        persona_tabs: shared_persona_tabs(&shared.test_runs),
        agents: agent_rows(shared.uxagent_runs),
        aggregated: shared.aggregated_report,
        run: shared.batch_test_run,
        common_issues,
        avg_agent_score,
    }
    .into_response())
}

fn shared_persona_tabs(runs: &[SharedTestRun]) -> Vec<PersonaTab> {
    runs.iter()
        .enumerate()
        .map(|(index, run)| PersonaTab {
            index,
            name: run
                .persona_name
                .clone()
                .or_else(|| run.persona_data.as_ref().map(|p| p.name.clone()))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Persona {}", index + 1)),
            status: run.status.clone(),
            score: run.report.as_ref().and_then(|r| r.score),
        })
        .collect()
}

pub async fn share_screenshot(
    State(state): State<SharedAppState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let shared = match state.client.get_shared_screenshot_test(&token).await {
        Ok(shared) => shared,
        Err(e) => match unavailable(&state, &e) {
            Some(page) => return Ok(page),
            None => return Err(e.into()),
        },
    };

    let page_title = shared
        .test_run
        .test_name
        .clone()
        .unwrap_or_else(|| "Screenshot Flow Report".to_string());

    Ok(SharedScreenshotTemplate {
        project_name: state.project_name.clone(),
        page_title,
        active_nav: "share",
        app_version: state.app_version.clone(),
        steps: screenshot_steps(shared.screenshots, &shared.persona_results),
        personas: shared.persona_results,
        test: shared.test_run,
    }
    .into_response())
}

/// Pairs each screen, in flow order, with every persona's analysis of it.
fn screenshot_steps(
    mut screenshots: Vec<ScreenshotFlowImage>,
    results: &[PersonaScreenshotResult],
) -> Vec<ScreenshotStep> {
    screenshots.sort_by_key(|s| s.order_index);
    screenshots
        .into_iter()
        .map(|image| {
            let analyses = results
                .iter()
                .filter_map(|result| {
                    let analysis = result
                        .analyses
                        .iter()
                        .find(|a| a.screenshot_order == image.order_index)?;
                    Some(PersonaAnalysis::from_analysis(&result.persona_name, analysis))
                })
                .collect();
            ScreenshotStep { image, analyses }
        })
        .collect()
}
