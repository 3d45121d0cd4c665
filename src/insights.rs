//! Insight loading and generation across every agent run of a batch.
//!
//! Requests go out concurrently. A run that fails is logged and skipped so
//! that its siblings still render.

use futures_util::future::join_all;

use crate::api::Client;
use crate::models::{Severity, UXAgentInsight, UXAgentRun};
use crate::report::{agent_display_name, sort_by_severity};

#[derive(Debug, Clone)]
pub struct CombinedInsight {
    pub insight: UXAgentInsight,
    pub agent_name: String,
    pub run_id: String,
}

impl CombinedInsight {
    pub fn severity(&self) -> Severity {
        self.insight.severity
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutOutcome {
    pub succeeded: usize,
    pub failed: usize,
    /// Upstream message of the first run that failed.
    pub first_error: Option<String>,
}

pub async fn load_all_insights(client: &Client, runs: &[UXAgentRun]) -> Vec<CombinedInsight> {
    let results = join_all(runs.iter().map(|run| client.get_uxagent_insights(&run.id))).await;

    let mut combined = Vec::new();
    for (index, (run, result)) in runs.iter().zip(results).enumerate() {
        match result {
            Ok(insights) => {
                let agent_name = agent_display_name(run, index);
                combined.extend(insights.into_iter().map(|insight| CombinedInsight {
                    insight,
                    agent_name: agent_name.clone(),
                    run_id: run.id.clone(),
                }));
            }
            Err(e) => {
                tracing::warn!("Failed to load insights for run {}: {}", run.id, e);
            }
        }
    }

    sort_by_severity(&mut combined, CombinedInsight::severity);
    combined
}

pub async fn generate_all_insights(client: &Client, runs: &[UXAgentRun]) -> FanOutOutcome {
    let results =
        join_all(runs.iter().map(|run| client.generate_uxagent_insights(&run.id))).await;

    let mut outcome = FanOutOutcome::default();
    for (run, result) in runs.iter().zip(results) {
        match result {
            Ok(insights) => {
                tracing::info!("Generated {} insights for run {}", insights.len(), run.id);
                outcome.succeeded += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to generate insights for run {}: {}", run.id, e);
                outcome.failed += 1;
                outcome.first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }
    outcome
}
