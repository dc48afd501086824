//! # pitchtrack
//!
//! Async client library for driving a server-side football video analysis
//! workflow: upload → calibrate → track → poll progress → fetch results →
//! export.
//!
//! ## Design Philosophy
//!
//! pitchtrack is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **UI-agnostic** - Rendering goes through an injected [`Presenter`] or
//!   the broadcast event channel, never through the core
//! - **Strictly sequenced** - The session stage only ever moves forward; a
//!   failed operation never corrupts session state
//! - **Single-timer** - At most one progress poller is ever live, owned and
//!   torn down by the orchestrator
//!
//! ## Quick Start
//!
//! ```no_run
//! use pitchtrack::{CalibrationPoint, Config, Event, TrackingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TrackingClient::new(Config::default())?;
//!
//!     // Subscribe to lifecycle events
//!     let mut events = client.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     client.upload("match.mp4").await?;
//!     client
//!         .calibrate(&[
//!             CalibrationPoint { x: 120.0, y: 80.0 },
//!             CalibrationPoint { x: 1800.0, y: 85.0 },
//!             CalibrationPoint { x: 1790.0, y: 1000.0 },
//!             CalibrationPoint { x: 130.0, y: 995.0 },
//!         ])
//!         .await?;
//!     client.start_tracking().await?;
//!
//!     // The poller advances the session to Completed and fetches results;
//!     // wait for the Results event, then export.
//!     let mut events = client.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         if let Event::Results { .. } = event {
//!             break;
//!         }
//!     }
//!     client.export_to_dir("csv").await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Progress polling task
mod poller;
/// Presenter capability for rendering workflow state
pub mod presenter;
/// Active session state
pub mod session;
/// Core orchestrator implementation (decomposed into focused submodules)
pub mod tracker;
/// HTTP transport for the analysis API
pub mod transport;
/// Core types and events
pub mod types;
/// Pure formatting helpers
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use presenter::{NullPresenter, Presenter};
pub use session::SessionContext;
pub use tracker::TrackingClient;
pub use transport::ApiClient;
pub use types::{
    CalibrationPoint, Event, NotificationKind, PlayerRecord, ProgressSample, ProgressStatus,
    ResultsBundle, SessionId, Stage, TeamStats, UploadResponse, VideoMetadata,
};
pub use utils::{format_duration, palette_color};
