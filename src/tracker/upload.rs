//! Health probing and video upload (session creation).

use crate::error::{Error, Result};
use crate::types::{Event, NotificationKind, UploadResponse};
use std::path::Path;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};

use super::TrackingClient;

impl TrackingClient {
    /// Probe the server's `/health` endpoint
    ///
    /// Failure is a soft warning, never fatal: it is logged, reported to the
    /// presenter, and `false` is returned.
    pub async fn check_health(&self) -> bool {
        match self.api().health().await {
            Ok(()) => {
                info!("analysis server is reachable");
                true
            }
            Err(e) => {
                warn!(error = %e, "server health check failed");
                self.notify(
                    "Unable to reach the analysis server",
                    NotificationKind::Warning,
                );
                false
            }
        }
    }

    /// Upload a video file from disk, creating a new session
    ///
    /// Reads the file into memory and delegates to [`Self::upload_bytes`],
    /// using the file name as the multipart file name.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<UploadResponse> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("video")
            .to_string();

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not read video file");
                self.notify("Could not read the video file", NotificationKind::Error);
                return Err(Error::UploadFailed(format!(
                    "could not read {}: {e}",
                    path.display()
                )));
            }
        };

        self.upload_bytes(&file_name, bytes).await
    }

    /// Upload video bytes, creating a new session
    ///
    /// A successful upload replaces any previous session: its poller is
    /// stopped before the request goes out, and the new session is installed
    /// at stage `Uploaded`. A failed upload leaves the previous session and
    /// stage untouched.
    ///
    /// Overlapping uploads resolve to the later-started one: each upload
    /// takes a ticket from the epoch counter, and a response whose ticket is
    /// no longer current is discarded with [`Error::UploadFailed`] instead of
    /// overwriting the newer session.
    pub async fn upload_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse> {
        info!(file_name, size = bytes.len(), "starting video upload");

        // The old session's poller must be gone before a new session can exist
        self.stop_poller().await;
        let ticket = self.upload_epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let response = match self.api().upload(file_name, bytes).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "video upload failed");
                self.notify("Video upload failed", NotificationKind::Error);
                return Err(Error::UploadFailed(e.to_string()));
            }
        };

        if self.upload_epoch.load(Ordering::SeqCst) != ticket {
            warn!(session_id = %response.session_id, "upload superseded while in flight, discarding response");
            self.notify(
                "Upload superseded by a newer upload",
                NotificationKind::Warning,
            );
            return Err(Error::UploadFailed(
                "superseded by a newer upload".to_string(),
            ));
        }

        // A poller may have been started for the old session while the upload
        // was in flight
        self.stop_poller().await;

        let generation = {
            let mut session = self.session.lock().await;
            // Re-check under the lock: a newer upload may have won the race
            if self.upload_epoch.load(Ordering::SeqCst) != ticket {
                warn!(session_id = %response.session_id, "upload superseded while in flight, discarding response");
                self.notify(
                    "Upload superseded by a newer upload",
                    NotificationKind::Warning,
                );
                return Err(Error::UploadFailed(
                    "superseded by a newer upload".to_string(),
                ));
            }
            session.set_active(response.session_id.clone(), response.metadata)
        };

        info!(session_id = %response.session_id, generation, "session created");
        self.emit(Event::SessionCreated {
            id: response.session_id.clone(),
            metadata: response.metadata,
        });
        if let Some(metadata) = &response.metadata {
            self.presenter.on_metadata(metadata);
        }
        self.notify("Video uploaded successfully", NotificationKind::Success);

        Ok(response)
    }
}
