use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::detect::Timestamp;
use crate::monitor::BeaconMonitor;
use crate::report::{Report, ReportMode};

/// Source of "now" for deciding which groups have gone quiet.
pub type Clock = Box<dyn Fn() -> Timestamp + Send + Sync>;

/// Local wall-clock time, matching how watcher logs are stamped.
pub fn local_clock() -> Clock {
    Box::new(|| chrono::Local::now().naive_local())
}

/// Handle to a running sweeper task.
///
/// Dropping the handle also stops the task at its next tick boundary.
pub struct SweepHandle {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<u64>,
}

impl SweepHandle {
    /// Stop future sweeps and wait for the task to exit. A sweep already in
    /// progress runs to completion first. Returns the number of sweeps run.
    pub async fn stop(self) -> Result<u64> {
        let _ = self.shutdown_tx.send(());
        self.join.await.context("sweeper task panicked")
    }
}

/// Spawn the periodic live-mode sweep.
///
/// The first tick of the interval fires immediately and is skipped, so the
/// first sweep happens one full `period` after start. Every later tick
/// reports groups finished as of `clock()`, evicts them, and hands non-empty
/// reports to `emit` after the registry lock has been released.
pub fn spawn_sweeper<F>(
    monitor: Arc<BeaconMonitor>,
    period: Duration,
    clock: Clock,
    mut emit: F,
) -> SweepHandle
where
    F: FnMut(Report) + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        info!(period_secs = period.as_secs_f64(), "sweeper started");
        let mut interval = tokio::time::interval(period);
        interval.tick().await;

        let mut sweeps = 0u64;
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    debug!("sweeper shutdown signal received");
                    break;
                }
                _ = interval.tick() => {}
            }

            let now = clock();
            let report = monitor.report(ReportMode::LiveSweep { now }).await;
            sweeps += 1;

            if report.is_empty() {
                debug!(sweep = sweeps, "nothing finished");
                continue;
            }
            info!(sweep = sweeps, groups = report.len(), "sweep reported finished groups");
            emit(report);
        }

        info!(sweeps, "sweeper stopped");
        sweeps
    });

    SweepHandle { shutdown_tx, join }
}
