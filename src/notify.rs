//! Completion notifications for batch tests launched from this dashboard.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::Client;
use crate::models::{BatchStatus, BatchTestDetail};
use crate::poll::{PollOutcome, poll_until_settled};
use crate::report::average_score;

pub const MAX_NOTIFICATIONS: usize = 32;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub batch_id: String,
    pub target_url: String,
    pub status: BatchStatus,
    pub score: Option<f64>,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl Notification {
    pub fn from_detail(detail: &BatchTestDetail) -> Self {
        let run = &detail.batch_test_run;
        let score = detail
            .aggregated_report
            .as_ref()
            .and_then(|r| r.overall_score)
            .or_else(|| {
                let scores: Vec<Option<f64>> = detail
                    .test_runs
                    .iter()
                    .map(|t| t.report.as_ref().and_then(|r| r.score))
                    .chain(detail.uxagent_runs.iter().map(|r| r.score))
                    .collect();
                scores
                    .iter()
                    .any(Option::is_some)
                    .then(|| average_score(scores.iter().copied()))
            });

        Self {
            batch_id: run.id.clone(),
            target_url: run.target_url.clone(),
            status: run.status.clone(),
            score,
            message: completion_message(&run.target_url, &run.status, score),
            at: OffsetDateTime::now_utc(),
        }
    }
}

pub fn completion_message(test_name: &str, status: &BatchStatus, score: Option<f64>) -> String {
    match (status, score) {
        (BatchStatus::Completed, Some(score)) => {
            format!("Test \"{}\" completed with a score of {:.1}/10", test_name, score)
        }
        (BatchStatus::Completed, None) => format!("Test \"{}\" has completed", test_name),
        (status, _) => format!("Test \"{}\" ended: {}", test_name, status),
    }
}

/// Watches launched batch tests and keeps a bounded feed of how they ended.
pub struct Notifier {
    client: Client,
    interval: Duration,
    feed: Arc<Mutex<VecDeque<Notification>>>,
    watchers: Mutex<HashMap<String, JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

impl Notifier {
    pub fn new(client: Client, interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            client,
            interval,
            feed: Arc::new(Mutex::new(VecDeque::new())),
            watchers: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    /// Starts a watcher for `batch_id` unless one is already running.
    pub fn watch(&self, batch_id: &str) {
        let mut watchers = self.watchers.lock().unwrap_or_else(|e| e.into_inner());
        watchers.retain(|_, handle| !handle.is_finished());
        if watchers.contains_key(batch_id) {
            return;
        }

        let client = self.client.clone();
        let feed = self.feed.clone();
        let interval = self.interval;
        let shutdown = self.shutdown.subscribe();
        let id = batch_id.to_string();

        tracing::info!("watching batch test {}", id);
        let handle = tokio::spawn(async move {
            let outcome = poll_until_settled(interval, || client.get_batch_test(&id), shutdown).await;
            match outcome {
                PollOutcome::Settled(detail) if detail.batch_test_run.status.is_terminal() => {
                    let notification = Notification::from_detail(&detail);
                    tracing::info!("{}", notification.message);
                    push_bounded(&feed, notification);
                }
                PollOutcome::Settled(detail) => {
                    tracing::debug!(
                        "stopped watching {}: status {}",
                        id,
                        detail.batch_test_run.status.as_str()
                    );
                }
                PollOutcome::Cancelled => {
                    tracing::debug!("watcher for {} cancelled", id);
                }
            }
        });
        watchers.insert(batch_id.to_string(), handle);
    }

    /// Newest first.
    pub fn recent(&self) -> Vec<Notification> {
        self.feed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn push_bounded(feed: &Mutex<VecDeque<Notification>>, notification: Notification) {
    let mut feed = feed.lock().unwrap_or_else(|e| e.into_inner());
    feed.push_front(notification);
    feed.truncate(MAX_NOTIFICATIONS);
}
