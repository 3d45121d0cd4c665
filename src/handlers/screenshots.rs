use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{PersonaScreenshotResult, ScreenshotFlowImage, ScreenshotTestResult};
use crate::templates::{
    PersonaAnalysis, ScreenshotDetailTemplate, ScreenshotPersonaTab, ScreenshotStep,
    ScreenshotTestsTemplate,
};
use crate::{AppResult, SharedAppState};

#[derive(Debug, Deserialize, Default)]
pub struct ScreenshotQuery {
    pub persona: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScreenshotStatusResponse {
    pub status: &'static str,
    pub active: bool,
}

pub async fn screenshot_tests(State(state): State<SharedAppState>) -> ScreenshotTestsTemplate {
    let (tests, error) = match state.client.list_screenshot_tests().await {
        Ok(tests) => (tests, None),
        Err(e) => {
            tracing::warn!("Failed to load screenshot tests: {}", e);
            (Vec::new(), Some(e.to_string()))
        }
    };

    ScreenshotTestsTemplate {
        project_name: state.project_name.clone(),
        page_title: "Screenshot tests".to_string(),
        active_nav: "screenshots",
        app_version: state.app_version.clone(),
        tests,
        error,
    }
}

pub async fn screenshot_detail(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    Query(query): Query<ScreenshotQuery>,
) -> AppResult<ScreenshotDetailTemplate> {
    detail_page(&state, &id, query, None).await
}

async fn detail_page(
    state: &SharedAppState,
    id: &str,
    query: ScreenshotQuery,
    notice: Option<String>,
) -> AppResult<ScreenshotDetailTemplate> {
    let result = state.client.get_screenshot_test(id).await?;
    let ScreenshotTestResult {
        test_run,
        screenshots,
        persona_results,
        overall_report,
    } = result;

    let full_report = overall_report.as_ref().map(|r| &r.full_report);
    let persona_tabs = persona_tabs(&persona_results, full_report);
    let active = query
        .persona
        .and_then(|index| persona_results.iter().find(|p| p.persona_index == index))
        .or_else(|| persona_results.first());
    let active_persona = active.and_then(|a| {
        persona_tabs
            .iter()
            .find(|t| t.persona_index == a.persona_index)
            .cloned()
    });

    Ok(ScreenshotDetailTemplate {
        project_name: state.project_name.clone(),
        page_title: test_run.display_name().to_string(),
        active_nav: "screenshots",
        app_version: state.app_version.clone(),
        steps: flow_steps(screenshots, active),
        report: overall_report,
        persona_tabs,
        active_persona,
        test: test_run,
        notice,
    })
}

/// Per-persona score and summary live in the overall report's free-form body.
fn persona_tabs(
    results: &[PersonaScreenshotResult],
    full_report: Option<&Value>,
) -> Vec<ScreenshotPersonaTab> {
    let summaries = full_report
        .and_then(|r| r.get("personaResults"))
        .and_then(Value::as_array);

    results
        .iter()
        .map(|result| {
            let entry = summaries.and_then(|list| {
                list.iter().find(|e| {
                    e.get("personaIndex").and_then(Value::as_u64)
                        == Some(result.persona_index as u64)
                })
            });
            ScreenshotPersonaTab {
                persona_index: result.persona_index,
                name: result.persona_name.clone(),
                score: entry
                    .and_then(|e| e.get("overallScore"))
                    .and_then(Value::as_f64),
                summary: entry
                    .and_then(|e| e.get("summary"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            }
        })
        .collect()
}

/// Screens in flow order with the analysis to show for each. Tests run with
/// several personas show the chosen persona's analysis; single-persona tests
/// keep it on the image.
fn flow_steps(
    mut screenshots: Vec<ScreenshotFlowImage>,
    persona: Option<&PersonaScreenshotResult>,
) -> Vec<ScreenshotStep> {
    screenshots.sort_by_key(|s| s.order_index);
    screenshots
        .into_iter()
        .map(|image| {
            let analysis = match persona {
                Some(result) => result
                    .analyses
                    .iter()
                    .find(|a| a.screenshot_order == image.order_index)
                    .map(|a| PersonaAnalysis::from_analysis(&result.persona_name, a)),
                None => PersonaAnalysis::from_image(&image),
            };
            ScreenshotStep {
                image,
                analyses: analysis.into_iter().collect(),
            }
        })
        .collect()
}

pub async fn rerun_screenshot_test(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    match state.client.rerun_screenshot_test(&id).await {
        Ok(run) => {
            tracing::info!("Rerunning screenshot test {} as {}", id, run.id);
            Ok(Redirect::to(&format!("/screenshots/{}", run.id)).into_response())
        }
        Err(e) => {
            tracing::warn!("Failed to rerun screenshot test {}: {}", id, e);
            let notice = format!("Failed to rerun the test: {}", e);
            let page = detail_page(&state, &id, ScreenshotQuery::default(), Some(notice)).await?;
            Ok(page.into_response())
        }
    }
}

pub async fn screenshot_status(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ScreenshotStatusResponse>> {
    let result = state.client.get_screenshot_test(&id).await?;
    let status = &result.test_run.status;
    Ok(Json(ScreenshotStatusResponse {
        status: status.as_str(),
        active: status.is_active(),
    }))
}
