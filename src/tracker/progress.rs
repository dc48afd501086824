//! Poller callbacks: progress reports and terminal transitions.
//!
//! These methods are invoked from the spawned poll loop. Every one of them is
//! generation-guarded: a callback carrying a generation that no longer matches
//! the active session is a leftover from a superseded session and is dropped
//! without touching state.

use crate::types::{Event, NotificationKind, SessionId, Stage};
use tracing::{debug, error, warn};

use super::TrackingClient;

impl TrackingClient {
    /// Forward a progress sample to the presenter and event channel
    pub(crate) async fn report_progress(&self, session_id: &SessionId, percent: f64, generation: u64) {
        {
            let session = self.session.lock().await;
            if session.generation() != generation {
                debug!(session_id = %session_id, "stale progress sample dropped");
                return;
            }
        }

        debug!(session_id = %session_id, percent, "tracking progress");
        self.presenter.on_progress(percent);
        self.emit(Event::Progress {
            id: session_id.clone(),
            percent,
        });
    }

    /// Handle a terminal `completed` status: advance to `Completed` and fetch results
    pub(crate) async fn finish_tracking(&self, session_id: &SessionId, generation: u64) {
        {
            let mut session = self.session.lock().await;
            if session.generation() != generation {
                warn!(session_id = %session_id, "stale completion dropped");
                return;
            }
            if let Err(e) = session.advance(Stage::Completed) {
                warn!(session_id = %session_id, error = %e, "could not mark session completed");
                return;
            }
        }

        self.emit(Event::StageChanged {
            id: session_id.clone(),
            stage: Stage::Completed,
        });

        if let Err(e) = self.fetch_results().await {
            // fetch_results has already notified the presenter
            error!(session_id = %session_id, error = %e, "failed to fetch results after completion");
        }
    }

    /// Handle a terminal `error` status: advance to `Errored` and notify
    pub(crate) async fn abort_tracking(&self, session_id: &SessionId, generation: u64) {
        {
            let mut session = self.session.lock().await;
            if session.generation() != generation {
                warn!(session_id = %session_id, "stale tracking failure dropped");
                return;
            }
            if let Err(e) = session.advance(Stage::Errored) {
                warn!(session_id = %session_id, error = %e, "could not mark session errored");
                return;
            }
        }

        self.emit(Event::StageChanged {
            id: session_id.clone(),
            stage: Stage::Errored,
        });
        self.notify("Tracking failed during analysis", NotificationKind::Error);
    }
}
