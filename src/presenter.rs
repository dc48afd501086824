//! Presenter capability for rendering workflow state
//!
//! The orchestrator core has zero dependency on any particular UI toolkit.
//! Consumers inject a [`Presenter`] implementation (or rely on the broadcast
//! event channel, see [`crate::TrackingClient::subscribe`]) and render the
//! structured payloads however they like.

use crate::types::{NotificationKind, ResultsBundle, VideoMetadata};

/// Rendering/notification capability injected into the orchestrator
///
/// All methods are fire-and-forget and must not block: they are called from
/// the orchestrator's async operations and the poll loop. Every method has a
/// no-op default so implementations only override what they render.
pub trait Presenter: Send + Sync {
    /// Video metadata became known after a successful upload
    fn on_metadata(&self, _metadata: &VideoMetadata) {}

    /// Tracking progress update, `percent` in `[0, 100]`
    fn on_progress(&self, _percent: f64) {}

    /// Final results are available
    fn on_results(&self, _results: &ResultsBundle) {}

    /// User-facing notification
    fn on_notify(&self, _message: &str, _kind: NotificationKind) {}
}

/// Presenter that renders nothing
///
/// The default when no presenter is injected; consumers that only use the
/// broadcast event channel keep this.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
