//! Progress polling for a running tracking job
//!
//! A poller is created only by a successful `start_tracking` call and owns a
//! single recurring timer tied to one session. At most one poller is live at
//! any time; the orchestrator's poller slot enforces this by stopping the
//! previous handle before a new one is stored.
//!
//! Each tick issues one progress request. The request is awaited in-line and
//! missed ticks are skipped, so ticks never overlap even when round-trip
//! latency exceeds the poll interval. Transport failures on a tick are logged
//! and retried on the next tick; only an explicit terminal status value
//! (`completed` or `error`) stops the loop, exactly once.

use crate::tracker::TrackingClient;
use crate::types::{ProgressStatus, SessionId};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handle to a live progress-polling task
///
/// Owns the task and its cancellation token. Dropping the handle without
/// calling [`PollerHandle::stop`] leaves the task running until it observes a
/// terminal status; the orchestrator always stops handles explicitly.
pub(crate) struct PollerHandle {
    session_id: SessionId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// The session this poller is tied to
    pub(crate) fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stop the poller and wait for its task to finish
    ///
    /// Consuming the handle makes a double stop unrepresentable; cancelling an
    /// already-finished task is a no-op.
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            // Poll tasks never panic in normal operation
            warn!(session_id = %self.session_id, error = %e, "poller task join failed");
        }
    }
}

/// Spawn the poll loop for `session_id` and return its handle
///
/// `generation` is the session generation captured when tracking started; the
/// orchestrator discards any terminal transition whose generation no longer
/// matches the active session.
pub(crate) fn spawn(
    client: TrackingClient,
    session_id: SessionId,
    generation: u64,
    poll_interval: Duration,
) -> PollerHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let task_session = session_id.clone();

    let task = tokio::spawn(async move {
        run(client, task_session, generation, poll_interval, task_cancel).await;
    });

    PollerHandle {
        session_id,
        cancel,
        task,
    }
}

/// The poll loop proper: one progress request per tick until terminal or cancelled
async fn run(
    client: TrackingClient,
    session_id: SessionId,
    generation: u64,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    info!(session_id = %session_id, interval_ms = poll_interval.as_millis() as u64, "progress poller started");

    // First tick fires one full period after start, matching the reference cadence
    let mut ticks = interval_at(Instant::now() + poll_interval, poll_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(session_id = %session_id, "progress poller cancelled");
                break;
            }
            _ = ticks.tick() => {
                let sample = match client.api().progress(&session_id).await {
                    Ok(sample) => sample,
                    Err(e) => {
                        // Tick-level transport errors do not stop the poller
                        warn!(session_id = %session_id, error = %e, "progress poll failed, retrying next tick");
                        continue;
                    }
                };

                match sample.status {
                    ProgressStatus::Running => {
                        client.report_progress(&session_id, sample.progress, generation).await;
                    }
                    ProgressStatus::Completed => {
                        info!(session_id = %session_id, "tracking completed");
                        client.report_progress(&session_id, sample.progress, generation).await;
                        client.finish_tracking(&session_id, generation).await;
                        break;
                    }
                    ProgressStatus::Error => {
                        warn!(session_id = %session_id, "tracking failed on the server");
                        client.abort_tracking(&session_id, generation).await;
                        break;
                    }
                    ProgressStatus::Unknown(status) => {
                        warn!(session_id = %session_id, status = %status, "unrecognized progress status, continuing to poll");
                    }
                }
            }
        }
    }

    info!(session_id = %session_id, "progress poller stopped");
}
