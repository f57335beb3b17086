// File: livecord-core/src/tasks/live_poll.rs

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::presence::NotificationEngine;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Runs one pass and logs the outcome. Never fails.
pub async fn run_live_check(engine: &mut NotificationEngine) {
    match engine.run_pass().await {
        Ok(report) if report.changed_anything() => {
            info!(
                live = report.live,
                sent = report.sent,
                edited = report.edited,
                cleared = report.cleared,
                suppressed = report.suppressed,
                failed = report.failed,
                "Live check complete"
            );
        }
        Ok(report) => {
            debug!(live = report.live, edited = report.edited, "Live check complete");
        }
        Err(e) if e.aborts_pass() => {
            warn!(error = %e, "Live check aborted; retrying next tick");
        }
        Err(e) => {
            error!(error = %e, "Live check failed");
        }
    }
}

/// Spawns the poll loop. The first pass runs immediately, then once per
/// `every`. Ticks that come due while a pass is running are skipped, so
/// passes never overlap or queue up.
///
/// Flip `shutdown` to `true` (or drop the sender) to stop; a pass already
/// in progress is allowed to finish.
pub fn spawn_live_poll_task(
    mut engine: NotificationEngine,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = every.as_secs(), "Live poll task started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            run_live_check(&mut engine).await;
        }

        info!("Live poll task stopped");
    })
}
