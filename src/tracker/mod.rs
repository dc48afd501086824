//! Core orchestrator implementation split into focused submodules.
//!
//! The `TrackingClient` struct and its methods are organized by domain:
//! - [`upload`] - Health probing and video upload (session creation)
//! - [`control`] - Calibration, tracking start, results, export
//! - [`progress`] - Poller callbacks (progress reports, terminal transitions)

mod control;
mod progress;
mod upload;


use crate::config::Config;
use crate::error::Result;
use crate::poller::PollerHandle;
use crate::presenter::{NullPresenter, Presenter};
use crate::session::SessionContext;
use crate::transport::ApiClient;
use crate::types::{Event, NotificationKind, SessionId, Stage, VideoMetadata};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

/// Orchestrator for one upload-through-export analysis workflow
///
/// Owns the single active [`SessionContext`] and the single progress poller.
/// Cloneable - all fields are Arc-wrapped, so clones share the same session
/// and poller. State-machine invariants are enforced programmatically: a
/// failed operation never advances the stage or overwrites the session, and
/// a late response for a superseded session is discarded via the generation
/// counter rather than applied.
#[derive(Clone)]
pub struct TrackingClient {
    /// HTTP transport, the leaf dependency of every operation
    api: ApiClient,
    /// Static configuration
    config: Arc<Config>,
    /// The single active session (id, stage, metadata, generation)
    session: Arc<Mutex<SessionContext>>,
    /// Slot holding the at-most-one live progress poller
    poller: Arc<Mutex<Option<PollerHandle>>>,
    /// Ticket counter for in-flight uploads; a response whose ticket is no
    /// longer current is discarded (the later-started upload wins)
    upload_epoch: Arc<AtomicU64>,
    /// Injected rendering/notification capability
    presenter: Arc<dyn Presenter>,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
}

impl TrackingClient {
    /// Create a new client with no presenter (broadcast events only)
    pub fn new(config: Config) -> Result<Self> {
        Self::with_presenter(config, Arc::new(NullPresenter))
    }

    /// Create a new client with an injected presenter
    ///
    /// Validates the configuration and builds the HTTP client. Every
    /// presenter callback is also mirrored onto the broadcast channel.
    pub fn with_presenter(config: Config, presenter: Arc<dyn Presenter>) -> Result<Self> {
        config.validate()?;
        let api = ApiClient::new(&config)?;
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            api,
            config: Arc::new(config),
            session: Arc::new(Mutex::new(SessionContext::new())),
            poller: Arc::new(Mutex::new(None)),
            upload_epoch: Arc::new(AtomicU64::new(0)),
            presenter,
            event_tx,
        })
    }

    /// Subscribe to lifecycle events
    ///
    /// Slow subscribers that fall more than the configured channel capacity
    /// behind will observe a `Lagged` error and skip ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The active session id, if a session exists
    pub async fn session_id(&self) -> Option<SessionId> {
        self.session.lock().await.current_id().cloned()
    }

    /// The current stage of the active session (`Idle` when none exists)
    pub async fn current_stage(&self) -> Stage {
        self.session.lock().await.current_stage()
    }

    /// Metadata of the active session's video, if reported at upload time
    pub async fn video_metadata(&self) -> Option<VideoMetadata> {
        self.session.lock().await.metadata().copied()
    }

    /// Stop the poller, if one is live
    ///
    /// The session itself is left in place; a later client can still fetch
    /// results or export for a completed session.
    pub async fn shutdown(&self) {
        info!("shutting down tracking client");
        self.stop_poller().await;
    }

    /// Transport accessor for the poll loop
    pub(crate) fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Emit an event to broadcast subscribers (best-effort, no receivers is fine)
    pub(crate) fn emit(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    /// Report a user-facing notification to the presenter and event channel
    pub(crate) fn notify(&self, message: &str, kind: NotificationKind) {
        self.presenter.on_notify(message, kind);
        self.emit(Event::Notification {
            message: message.to_string(),
            kind,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Take and stop the live poller, if any
    ///
    /// The handle is removed from the slot before awaiting the task so the
    /// slot never holds a stopped poller.
    pub(crate) async fn stop_poller(&self) {
        let handle = self.poller.lock().await.take();
        if let Some(handle) = handle {
            debug!(session_id = %handle.session_id(), "stopping progress poller");
            handle.stop().await;
        }
    }

    /// Store a freshly spawned poller in the slot
    ///
    /// Callers must have stopped the previous poller first; this is the
    /// single-timer discipline.
    pub(crate) async fn install_poller(&self, handle: PollerHandle) {
        let previous = self.poller.lock().await.replace(handle);
        if let Some(previous) = previous {
            debug!(session_id = %previous.session_id(), "replacing leftover poller");
            previous.stop().await;
        }
    }
}
