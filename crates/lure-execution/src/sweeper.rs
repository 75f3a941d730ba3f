//! Background idle-expiry task.
//!
//! Each cycle expires idle sessions, submits reports for sessions that just
//! expired, and purges terminal sessions past the retention window.

use chrono::{DateTime, Utc};
use lure_application::{SessionOrchestrator, SweepReport};
use lure_core::error::Result;
use lure_core::report::CallbackOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What one sweep cycle did.
#[derive(Debug, Clone, Default)]
pub struct SweepCycle {
    pub sweep: SweepReport,
    /// Report submissions for sessions expired in this cycle
    pub submissions: Vec<(String, CallbackOutcome)>,
}

/// Runs a single sweep followed by report submission for expired sessions.
///
/// A session whose report cannot be submitted (e.g. nothing was extracted)
/// is logged and skipped; it does not fail the cycle.
pub async fn run_sweep_cycle(orchestrator: &SessionOrchestrator, now: DateTime<Utc>) -> Result<SweepCycle> {
    let sweep = orchestrator.sweep(now).await?;
    let mut submissions = Vec::new();

    for session_id in &sweep.expired {
        if sweep.purged.contains(session_id) {
            continue;
        }
        match orchestrator.finalize_if_eligible(session_id).await {
            Ok(Some(outcome)) => submissions.push((session_id.clone(), outcome)),
            Ok(None) => {}
            Err(error) => {
                warn!(session_id = %session_id, %error, "Expired session not reported");
            }
        }
    }

    if !sweep.expired.is_empty() || !sweep.purged.is_empty() {
        info!(
            expired = sweep.expired.len(),
            purged = sweep.purged.len(),
            busy = sweep.busy.len(),
            submitted = submissions.len(),
            "Sweep cycle finished"
        );
    }
    Ok(SweepCycle { sweep, submissions })
}

/// Spawns the periodic sweeper. It stops when `token` is cancelled.
pub fn spawn_sweeper(
    orchestrator: Arc<SessionOrchestrator>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        debug!(interval_secs = interval.as_secs(), "Sweeper started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(error) = run_sweep_cycle(&orchestrator, Utc::now()).await {
                        warn!(%error, "Sweep cycle failed");
                    }
                }
            }
        }
    })
}
