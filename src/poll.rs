use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::models::{BatchStatus, BatchTestDetail, BatchTestRun};

/// Refresh cadence while a batch test is running.
pub const ACTIVE_POLL_INTERVAL: Duration = Duration::from_secs(3);

pub trait HasBatchStatus {
    fn batch_status(&self) -> &BatchStatus;
}

impl HasBatchStatus for BatchTestRun {
    fn batch_status(&self) -> &BatchStatus {
        &self.status
    }
}

impl HasBatchStatus for BatchTestDetail {
    fn batch_status(&self) -> &BatchStatus {
        &self.batch_test_run.status
    }
}

#[derive(Debug)]
pub enum PollOutcome<T> {
    /// The last fetched value, whose status left the active set
    Settled(T),
    Cancelled,
}

/// Fetches immediately, then once per `interval`, until the fetched status is
/// no longer active or `shutdown` flips to true (or its sender is dropped).
///
/// Failed fetches are logged and retried on the next tick.
pub async fn poll_until_settled<T, E, F, Fut>(
    interval: Duration,
    mut fetch: F,
    mut shutdown: watch::Receiver<bool>,
) -> PollOutcome<T>
where
    T: HasBatchStatus,
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            return PollOutcome::Cancelled;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return PollOutcome::Cancelled,
        }

        let result = tokio::select! {
            result = fetch() => result,
            _ = shutdown.changed() => return PollOutcome::Cancelled,
        };

        match result {
            Ok(value) if !value.batch_status().is_active() => {
                return PollOutcome::Settled(value);
            }
            Ok(value) => {
                tracing::debug!("still {}", value.batch_status().as_str());
            }
            Err(e) => {
                tracing::warn!("poll fetch failed: {}", e);
            }
        }
    }
}
