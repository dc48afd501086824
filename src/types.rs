//! Core types for pitchtrack

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an analysis session, assigned by the server at upload time
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a session in its fixed forward progression
///
/// A session moves strictly forward through `Idle → Uploaded → Calibrated →
/// Tracking → Completed`. `Errored` is an absorbing escape reachable from any
/// stage. The legal transition relation is encoded in [`Stage::can_advance_to`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// No session exists yet
    #[default]
    Idle,
    /// Video uploaded, awaiting pitch calibration
    Uploaded,
    /// Calibration accepted, ready to start tracking
    Calibrated,
    /// Tracking job running on the server
    Tracking,
    /// Tracking finished, results available
    Completed,
    /// Terminal failure state
    Errored,
}

impl Stage {
    /// Whether a transition from `self` into `target` is legal
    ///
    /// Re-calibration from `Calibrated` is permitted (the server recomputes the
    /// homography); every other forward edge admits exactly one predecessor.
    /// `Errored` is reachable from anywhere and nothing leaves it except a new
    /// session install.
    pub fn can_advance_to(self, target: Stage) -> bool {
        match target {
            Stage::Errored => true,
            Stage::Idle => false,
            Stage::Uploaded => matches!(self, Stage::Idle),
            Stage::Calibrated => matches!(self, Stage::Uploaded | Stage::Calibrated),
            Stage::Tracking => matches!(self, Stage::Calibrated),
            Stage::Completed => matches!(self, Stage::Tracking),
        }
    }

    /// Whether this stage is terminal (no further forward progress possible)
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Errored)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Uploaded => "uploaded",
            Stage::Calibrated => "calibrated",
            Stage::Tracking => "tracking",
            Stage::Completed => "completed",
            Stage::Errored => "errored",
        };
        write!(f, "{s}")
    }
}

/// Metadata extracted from the uploaded video, immutable once set
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Frames per second
    pub fps: f64,
    /// Total frame count
    pub frames: u64,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Video duration in seconds
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
}

/// One image-space reference coordinate mapping to a known pitch landmark
///
/// The server expects at least 4 non-collinear points to compute a planar
/// homography; the client only checks that the sequence is non-empty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Horizontal pixel coordinate
    pub x: f64,
    /// Vertical pixel coordinate
    pub y: f64,
}

/// Status reported by the server for a running tracking job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProgressStatus {
    /// Job still running
    Running,
    /// Job finished successfully
    Completed,
    /// Job failed on the server
    Error,
    /// Unrecognized status value, carried through verbatim
    Unknown(String),
}

impl From<String> for ProgressStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "running" => ProgressStatus::Running,
            "completed" => ProgressStatus::Completed,
            "error" => ProgressStatus::Error,
            _ => ProgressStatus::Unknown(s),
        }
    }
}

impl From<ProgressStatus> for String {
    fn from(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::Running => "running".to_string(),
            ProgressStatus::Completed => "completed".to_string(),
            ProgressStatus::Error => "error".to_string(),
            ProgressStatus::Unknown(s) => s,
        }
    }
}

/// One polled measurement of job completion
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    /// Completion percentage in `[0, 100]`
    pub progress: f64,
    /// Job status as reported by the server
    pub status: ProgressStatus,
}

/// Aggregate statistics for the whole team
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    /// Total distance covered by all players, in meters
    #[serde(rename = "total_distance")]
    pub total_distance_meters: f64,
    /// Average speed across all players, in km/h
    #[serde(rename = "avg_speed")]
    pub avg_speed_kph: f64,
    /// Analyzed duration in seconds
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
}

/// Per-player statistics, ordered as reported by the server
///
/// A player's index in the results list determines its display color via
/// [`crate::utils::palette_color`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Player name or label assigned by the tracker
    pub name: String,
    /// Playing role, when the tracker could infer one
    #[serde(default)]
    pub role: Option<String>,
    /// Distance covered in meters
    #[serde(rename = "distance")]
    pub distance_meters: f64,
    /// Average speed in km/h
    #[serde(rename = "avg_speed")]
    pub avg_speed_kph: f64,
    /// Peak speed in km/h
    #[serde(rename = "max_speed")]
    pub max_speed_kph: f64,
}

/// Final aggregated statistics for a completed session, fetched once
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsBundle {
    /// Team-level aggregates, when computed
    #[serde(default)]
    pub team_stats: Option<TeamStats>,
    /// Per-player records
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
}

/// Severity of a user-facing notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Neutral informational message
    Info,
    /// Operation succeeded
    Success,
    /// Non-fatal problem
    Warning,
    /// Operation failed
    Error,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Event emitted during the session lifecycle
///
/// Consumers subscribe via [`crate::TrackingClient::subscribe`]; every
/// presenter callback is mirrored onto the broadcast channel as one of these.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new session was created by a successful upload
    SessionCreated {
        /// Session ID assigned by the server
        id: SessionId,
        /// Video metadata, when the server reported it
        metadata: Option<VideoMetadata>,
    },

    /// The session moved to a new stage
    StageChanged {
        /// Session ID
        id: SessionId,
        /// The stage the session is now at
        stage: Stage,
    },

    /// Tracking progress update from the poller
    Progress {
        /// Session ID
        id: SessionId,
        /// Completion percentage (0.0 to 100.0)
        percent: f64,
    },

    /// Final results are available
    Results {
        /// Session ID
        id: SessionId,
        /// The fetched results
        bundle: ResultsBundle,
    },

    /// User-facing notification
    Notification {
        /// Human-readable message
        message: String,
        /// Severity
        kind: NotificationKind,
        /// When the notification was emitted
        timestamp: DateTime<Utc>,
    },
}

/// Response returned by a successful upload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Session ID assigned by the server
    pub session_id: SessionId,
    /// Metadata extracted from the video, when the server reported it
    #[serde(default)]
    pub metadata: Option<VideoMetadata>,
}
