//! Error types for pitchtrack
//!
//! This module provides comprehensive error handling for the library, including:
//! - Transport-level errors (network failures, non-success HTTP statuses)
//! - Session lifecycle errors (missing session, illegal stage transitions)
//! - Operation-specific failures (upload, calibration, tracking)

use crate::types::Stage;
use thiserror::Error;

/// Result type alias for pitchtrack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pitchtrack
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "poll_interval")
        key: Option<String>,
    },

    /// Network error (connection failure, timeout, malformed response body)
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server returned a non-success HTTP status
    #[error("server returned HTTP {status}")]
    Server {
        /// The HTTP status code returned by the server
        status: u16,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (reading upload files, writing exports)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation requires an active session but none exists
    #[error("no active session")]
    NoActiveSession,

    /// Stage transition violates the session ordering
    #[error("invalid stage transition: {from} -> {to}")]
    InvalidTransition {
        /// Stage the session was in when the transition was attempted
        from: Stage,
        /// Stage the transition targeted
        to: Stage,
    },

    /// Operation invoked at the wrong point in the session lifecycle
    #[error("operation requires stage {required}, session is at {actual}")]
    PreconditionFailed {
        /// Stage the operation requires
        required: Stage,
        /// Stage the session is actually at
        actual: Stage,
    },

    /// Video upload failed
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Pitch calibration was rejected or could not be submitted
    #[error("calibration failed: {0}")]
    CalibrationFailed(String),

    /// Server declined to start the tracking job
    #[error("tracking rejected: {0}")]
    TrackingRejected(String),
}
