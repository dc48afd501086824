//! Configuration types for pitchtrack

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration for [`crate::TrackingClient`]
///
/// All fields have sensible defaults; a zero-configuration client talks to
/// `http://127.0.0.1:8000/api` and polls progress once per second.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the analysis API (default: `http://127.0.0.1:8000/api`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Url,

    /// Period between progress polls while a tracking job runs (default: 1s)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Per-request timeout for JSON calls (default: 30s, None = no timeout)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Option<Duration>,

    /// Timeout override for uploads, which may be large (default: None,
    /// falls back to `request_timeout`)
    #[serde(default)]
    pub upload_timeout: Option<Duration>,

    /// Directory where exported files are written (default: "./exports")
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Capacity of the broadcast event channel (default: 256)
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            upload_timeout: None,
            export_dir: default_export_dir(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Config {
    /// Validate configuration values
    ///
    /// Returns [`Error::Config`] naming the offending key when a value is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll_interval must be greater than zero".to_string(),
                key: Some("poll_interval".to_string()),
            });
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::Config {
                message: "event_channel_capacity must be greater than zero".to_string(),
                key: Some("event_channel_capacity".to_string()),
            });
        }
        Ok(())
    }
}

fn default_api_base_url() -> Url {
    // The literal is well-formed, so this cannot fail at runtime
    #[allow(clippy::expect_used)]
    let url = Url::parse("http://127.0.0.1:8000/api").expect("default API base URL is valid");
    url
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_request_timeout() -> Option<Duration> {
    Some(Duration::from_secs(30))
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_event_channel_capacity() -> usize {
    256
}
