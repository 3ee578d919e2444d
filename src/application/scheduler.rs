use super::orchestrator::{CycleOrchestrator, CycleReport};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs a cycle immediately and then once per interval until cancelled.
pub struct Scheduler {
    orchestrator: Arc<CycleOrchestrator>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<CycleOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Schedules cycles until `token` is cancelled and returns how many completed.
    ///
    /// A cycle that is still running when the token fires is abandoned. A failing
    /// cycle is logged and the schedule continues; an error from `on_report` stops it.
    pub async fn run<F>(&self, token: CancellationToken, mut on_report: F) -> Result<u64>
    where
        F: FnMut(&CycleReport) -> Result<()>,
    {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    warn!("Shutdown requested, abandoning in-flight cycle");
                    break;
                }
                result = self.orchestrator.run_cycle() => match result {
                    Ok(report) => {
                        completed += 1;
                        on_report(&report)?;
                    }
                    Err(e) => error!(error = %e, "Cycle failed"),
                },
            }
        }

        info!(completed, "Scheduler stopped");
        Ok(completed)
    }
}
