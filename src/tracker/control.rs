//! Calibration, tracking start, results, and export operations.

use crate::error::{Error, Result};
use crate::poller;
use crate::types::{CalibrationPoint, Event, NotificationKind, ResultsBundle, SessionId, Stage};
use std::path::PathBuf;
use tracing::{error, info, warn};

use super::TrackingClient;

impl TrackingClient {
    /// Snapshot of the active session, or a reported `NoActiveSession`
    async fn active_session(&self) -> Result<(SessionId, Stage, u64)> {
        let session = self.session.lock().await;
        match session.current_id() {
            Some(id) => Ok((id.clone(), session.current_stage(), session.generation())),
            None => {
                warn!("operation requires an active session");
                self.notify("No active session", NotificationKind::Error);
                Err(Error::NoActiveSession)
            }
        }
    }

    /// Submit pitch calibration points for the active session
    ///
    /// Requires an active session whose stage allows entering `Calibrated`
    /// (fresh uploads and re-calibration both qualify). The point sequence
    /// must be non-empty; its geometry is the server's contract to validate.
    /// On server-reported success the stage advances to `Calibrated`; any
    /// failure leaves the stage unchanged.
    pub async fn calibrate(&self, points: &[CalibrationPoint]) -> Result<()> {
        let (id, stage, generation) = self.active_session().await?;

        if points.is_empty() {
            warn!(session_id = %id, "calibration attempted with no points");
            self.notify(
                "Calibration requires at least one point",
                NotificationKind::Error,
            );
            return Err(Error::CalibrationFailed(
                "no calibration points provided".to_string(),
            ));
        }

        if !stage.can_advance_to(Stage::Calibrated) {
            warn!(session_id = %id, stage = %stage, "calibration not allowed at this stage");
            self.notify("Calibration is not possible anymore", NotificationKind::Error);
            return Err(Error::InvalidTransition {
                from: stage,
                to: Stage::Calibrated,
            });
        }

        let response = match self.api().calibrate(&id, points).await {
            Ok(response) => response,
            Err(e) => {
                error!(session_id = %id, error = %e, "calibration request failed");
                self.notify("Calibration failed", NotificationKind::Error);
                return Err(Error::CalibrationFailed(e.to_string()));
            }
        };

        if response.status != "success" {
            warn!(session_id = %id, status = %response.status, "server rejected calibration");
            self.notify("Calibration failed", NotificationKind::Error);
            return Err(Error::CalibrationFailed(format!(
                "server returned status {:?}",
                response.status
            )));
        }

        {
            let mut session = self.session.lock().await;
            if session.generation() != generation {
                warn!(session_id = %id, "session changed during calibration, discarding response");
                self.notify("Calibration failed", NotificationKind::Error);
                return Err(Error::CalibrationFailed(
                    "session changed during calibration".to_string(),
                ));
            }
            if let Err(e) = session.advance(Stage::Calibrated) {
                self.notify("Calibration failed", NotificationKind::Error);
                return Err(e);
            }
        }

        info!(session_id = %id, "calibration accepted");
        self.emit(Event::StageChanged {
            id: id.clone(),
            stage: Stage::Calibrated,
        });
        self.notify("Calibration successful", NotificationKind::Success);
        Ok(())
    }

    /// Ask the server to start the tracking job and begin progress polling
    ///
    /// Requires the active session to be exactly at `Calibrated`. On a
    /// `started` response the stage advances to `Tracking` and exactly one
    /// progress poller is started for the session; any previous poller is
    /// stopped first, so two start calls can never leave two timers live.
    pub async fn start_tracking(&self) -> Result<()> {
        let (id, stage, generation) = self.active_session().await?;

        if stage != Stage::Calibrated {
            warn!(session_id = %id, stage = %stage, "tracking requires a calibrated session");
            self.notify(
                "Calibrate the pitch before starting tracking",
                NotificationKind::Error,
            );
            return Err(Error::PreconditionFailed {
                required: Stage::Calibrated,
                actual: stage,
            });
        }

        let response = match self.api().start_tracking(&id).await {
            Ok(response) => response,
            Err(e) => {
                error!(session_id = %id, error = %e, "tracking start request failed");
                self.notify("Could not start tracking", NotificationKind::Error);
                return Err(Error::TrackingRejected(e.to_string()));
            }
        };

        if response.status != "started" {
            warn!(session_id = %id, status = %response.status, "server declined to start tracking");
            self.notify("Could not start tracking", NotificationKind::Error);
            return Err(Error::TrackingRejected(format!(
                "server returned status {:?}",
                response.status
            )));
        }

        {
            let mut session = self.session.lock().await;
            if session.generation() != generation {
                warn!(session_id = %id, "session changed while starting tracking, discarding response");
                self.notify("Could not start tracking", NotificationKind::Error);
                return Err(Error::TrackingRejected(
                    "session changed while starting tracking".to_string(),
                ));
            }
            if let Err(e) = session.advance(Stage::Tracking) {
                self.notify("Could not start tracking", NotificationKind::Error);
                return Err(e);
            }
        }

        // Single-timer discipline: the previous poller, if any, goes first
        self.stop_poller().await;
        let handle = poller::spawn(
            self.clone(),
            id.clone(),
            generation,
            self.config.poll_interval,
        );
        self.install_poller(handle).await;

        info!(session_id = %id, "tracking started");
        self.emit(Event::StageChanged {
            id: id.clone(),
            stage: Stage::Tracking,
        });
        self.notify("Tracking started", NotificationKind::Info);
        Ok(())
    }

    /// Fetch the results bundle for a completed session
    ///
    /// Requires the active session to be at `Completed`. The bundle is
    /// handed to the presenter and mirrored as a [`Event::Results`] event.
    pub async fn fetch_results(&self) -> Result<ResultsBundle> {
        let (id, stage, _) = self.active_session().await?;

        if stage != Stage::Completed {
            warn!(session_id = %id, stage = %stage, "results requested before completion");
            self.notify("Results are not ready yet", NotificationKind::Error);
            return Err(Error::PreconditionFailed {
                required: Stage::Completed,
                actual: stage,
            });
        }

        let bundle = match self.api().results(&id).await {
            Ok(bundle) => bundle,
            Err(e) => {
                error!(session_id = %id, error = %e, "could not load results");
                self.notify("Could not load results", NotificationKind::Error);
                return Err(e);
            }
        };

        info!(
            session_id = %id,
            players = bundle.players.len(),
            "results loaded"
        );
        self.presenter.on_results(&bundle);
        self.emit(Event::Results {
            id: id.clone(),
            bundle: bundle.clone(),
        });
        self.notify("Analysis completed successfully", NotificationKind::Success);
        Ok(bundle)
    }

    /// Download an export of the session's data in the given format
    ///
    /// Requires an active session at any stage; never mutates the session or
    /// its stage. Returns the raw export bytes.
    pub async fn export(&self, format: &str) -> Result<Vec<u8>> {
        let id = match self.session.lock().await.current_id().cloned() {
            Some(id) => id,
            None => {
                warn!("export requires an active session");
                self.notify("No active session", NotificationKind::Error);
                return Err(Error::NoActiveSession);
            }
        };

        let bytes = match self.api().export(&id, format).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(session_id = %id, format, error = %e, "export download failed");
                self.notify(
                    &format!("{} export failed", format.to_uppercase()),
                    NotificationKind::Error,
                );
                return Err(e);
            }
        };

        info!(session_id = %id, format, size = bytes.len(), "export downloaded");
        self.notify(
            &format!("{} export ready", format.to_uppercase()),
            NotificationKind::Success,
        );
        Ok(bytes)
    }

    /// Download an export and write it under the configured export directory
    ///
    /// The file is named `<session_id>.<format>`. Returns the written path.
    pub async fn export_to_dir(&self, format: &str) -> Result<PathBuf> {
        let bytes = self.export(format).await?;

        // export() succeeded, so a session id exists
        let id = self.session.lock().await.current_id().cloned();
        let id = id.ok_or(Error::NoActiveSession)?;

        let path = self.config.export_dir.join(format!("{id}.{format}"));
        let write_result = async {
            tokio::fs::create_dir_all(&self.config.export_dir).await?;
            tokio::fs::write(&path, &bytes).await
        }
        .await;

        if let Err(e) = write_result {
            error!(path = %path.display(), error = %e, "could not write export file");
            self.notify("Could not write export file", NotificationKind::Error);
            return Err(Error::Io(e));
        }

        info!(path = %path.display(), "export written");
        Ok(path)
    }
}
