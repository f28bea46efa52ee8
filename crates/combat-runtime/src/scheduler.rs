//! Deferred task scheduling.
//!
//! The combat service submits "run this later" requests (scheduled match
//! starts, application expiry) through [`DeferredScheduler`]. Execution is
//! not guaranteed to find the world unchanged: whoever consumes a fired
//! task must re-validate entity state first, since the match may have been
//! cancelled or the application already matched.

use std::time::Duration;

use tokio::sync::mpsc;

use combat_core::MatchId;

use crate::matchmaker::ApplicationId;

/// A deferred unit of work, identified by the entity it concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Start a pending match once its countdown elapses.
    StartMatch(MatchId),
    /// Expire an application whose deadline has passed.
    ExpireApplication(ApplicationId),
}

/// Generic "schedule(at, payload)" interface.
pub trait DeferredScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ScheduledTask);
}

/// Tokio-backed scheduler: each task sleeps on its own timer and is then
/// delivered to the service's deferred-task loop.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<ScheduledTask>,
}

impl TokioScheduler {
    /// Returns the scheduler and the receiver the service drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScheduledTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DeferredScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The service may already be gone on shutdown.
            let _ = tx.send(task);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tasks_fire_after_their_delay() {
        let (scheduler, mut rx) = TokioScheduler::new();
        scheduler.schedule(Duration::from_secs(120), ScheduledTask::StartMatch(MatchId(1)));

        tokio::time::advance(Duration::from_secs(119)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(rx.recv().await, Some(ScheduledTask::StartMatch(MatchId(1))));
    }
}
