use axum::{Json, extract::State};

use crate::models::BatchStatus;
use crate::notify::Notification;
use crate::report::average_score;
use crate::templates::{BatchRow, DashboardStats, DashboardTemplate};

pub async fn dashboard(State(state): State<crate::SharedAppState>) -> DashboardTemplate {
    // the list failing still renders the page, with a banner
    let (mut runs, error) = match state.client.list_batch_tests().await {
        Ok(runs) => (runs, None),
        Err(e) => {
            tracing::warn!("Failed to load batch tests: {}", e);
            (Vec::new(), Some(e.to_string()))
        }
    };
    runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let stats = DashboardStats {
        total: runs.len(),
        active: runs.iter().filter(|r| r.status.is_active()).count(),
        completed: runs
            .iter()
            .filter(|r| r.status == BatchStatus::Completed)
            .count(),
        failed: runs
            .iter()
            .filter(|r| r.status == BatchStatus::Failed)
            .count(),
    };

    let notifications = state.notifier.recent();
    let scores: Vec<Option<f64>> = notifications.iter().map(|n| n.score).collect();
    let recent_avg_score = scores
        .iter()
        .any(Option::is_some)
        .then(|| average_score(scores.iter().copied()));

    let tests = runs
        .into_iter()
        .map(|run| BatchRow {
            persona_count: run.selected_persona_indices.len(),
            run,
        })
        .collect();

    DashboardTemplate {
        project_name: state.project_name.clone(),
        page_title: "Tests".to_string(),
        active_nav: "dashboard",
        app_version: state.app_version.clone(),
        tests,
        stats,
        notifications,
        recent_avg_score,
        error,
    }
}

pub async fn notifications(State(state): State<crate::SharedAppState>) -> Json<Vec<Notification>> {
    Json(state.notifier.recent())
}
