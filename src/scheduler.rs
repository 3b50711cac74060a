use std::{future::Future, time::Duration};

use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};

use crate::utils;

/// Fire-once delayed task runner.
///
/// Every task is tracked and listens to one shared cancellation token, so
/// shutting the server down drops pending alarms instead of leaking them.
/// Single tasks cannot be revoked once submitted.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` once at `epoch_millis`.
    ///
    /// Returns `false`, and drops the action, when that moment already passed.
    pub fn schedule<F>(&self, epoch_millis: i64, action: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(delay) = utils::delay_until(epoch_millis) else {
            warn!("Schedule at {} is in the past, dropping it", epoch_millis);
            return false;
        };

        info!("Scheduling task {} seconds later", delay.as_secs());
        self.run_after(delay, action);
        true
    }

    /// Runs `action` once after `delay`.
    pub fn run_after<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => debug!("Scheduled task cancelled"),
                () = tokio::time::sleep(delay) => action.await,
            }
        });
    }

    /// Number of tasks still waiting or running.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Cancels pending tasks and waits for running ones to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
