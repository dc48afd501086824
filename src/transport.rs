//! HTTP transport for the analysis API
//!
//! [`ApiClient`] is the leaf dependency of the whole crate: it issues one
//! request per call, maps non-success statuses to [`Error::Server`] and
//! connection-level failures to [`Error::Transport`], and parses response
//! bodies into the wire types from [`crate::types`]. The JSON field names
//! are preserved bit-for-bit for compatibility with the server.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{CalibrationPoint, ProgressSample, ResultsBundle, SessionId, UploadResponse};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// JSON body for `POST /calibrate`
#[derive(Debug, Serialize)]
struct CalibrateRequest<'a> {
    session_id: &'a SessionId,
    points: &'a [CalibrationPoint],
}

/// JSON body for `POST /track`
#[derive(Debug, Serialize)]
struct TrackRequest<'a> {
    session_id: &'a SessionId,
}

/// Generic `{status: ...}` response returned by calibrate and track
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    /// Status string reported by the server (`"success"`, `"started"`, ...)
    pub status: String,
}

/// HTTP client for the analysis API
///
/// Cheap to clone: the underlying `reqwest::Client` is reference-counted.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    upload_timeout: Option<std::time::Duration>,
}

impl ApiClient {
    /// Create a new API client from configuration
    ///
    /// Applies `config.request_timeout` to every request issued through the
    /// client; uploads may override it via `config.upload_timeout`.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        // Reject bases like "data:" URLs up front rather than on first use
        if config.api_base_url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("API base URL {} cannot have paths", config.api_base_url),
                key: Some("api_base_url".to_string()),
            });
        }

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            upload_timeout: config.upload_timeout,
        })
    }

    /// Build an endpoint URL by appending path segments to the API base
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        {
            // cannot_be_a_base was ruled out in new(), so this cannot fail
            #[allow(clippy::expect_used)]
            let mut path = url.path_segments_mut().expect("base URL validated in new()");
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Map a response to `Error::Server` unless its status is 2xx
    fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Error::Server {
                status: response.status().as_u16(),
            })
        }
    }

    /// `GET /health` - liveness probe
    pub async fn health(&self) -> Result<()> {
        let url = self.endpoint(&["health"]);
        debug!(%url, "health check");
        let response = self.http.get(url).send().await?;
        Self::ensure_success(response)?;
        Ok(())
    }

    /// `POST /upload` - multipart upload of the video file (field `video`)
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse> {
        let url = self.endpoint(&["upload"]);
        debug!(%url, file_name, size = bytes.len(), "uploading video");

        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("video", part);

        let mut request = self.http.post(url).multipart(form);
        if let Some(timeout) = self.upload_timeout {
            request = request.timeout(timeout);
        }

        let response = Self::ensure_success(request.send().await?)?;
        Ok(response.json().await?)
    }

    /// `POST /calibrate` - submit pitch calibration points
    pub async fn calibrate(
        &self,
        session_id: &SessionId,
        points: &[CalibrationPoint],
    ) -> Result<StatusResponse> {
        let url = self.endpoint(&["calibrate"]);
        debug!(%url, session_id = %session_id, count = points.len(), "submitting calibration");

        let body = CalibrateRequest { session_id, points };
        let response = Self::ensure_success(self.http.post(url).json(&body).send().await?)?;
        Ok(response.json().await?)
    }

    /// `POST /track` - ask the server to start the tracking job
    pub async fn start_tracking(&self, session_id: &SessionId) -> Result<StatusResponse> {
        let url = self.endpoint(&["track"]);
        debug!(%url, session_id = %session_id, "requesting tracking start");

        let body = TrackRequest { session_id };
        let response = Self::ensure_success(self.http.post(url).json(&body).send().await?)?;
        Ok(response.json().await?)
    }

    /// `GET /progress/{session_id}` - poll job progress
    pub async fn progress(&self, session_id: &SessionId) -> Result<ProgressSample> {
        let url = self.endpoint(&["progress", session_id.as_str()]);
        let response = Self::ensure_success(self.http.get(url).send().await?)?;
        Ok(response.json().await?)
    }

    /// `GET /results/{session_id}` - fetch the final results bundle
    pub async fn results(&self, session_id: &SessionId) -> Result<ResultsBundle> {
        let url = self.endpoint(&["results", session_id.as_str()]);
        debug!(%url, session_id = %session_id, "fetching results");
        let response = Self::ensure_success(self.http.get(url).send().await?)?;
        Ok(response.json().await?)
    }

    /// `GET /export/{session_id}/{format}` - download an export of the results
    pub async fn export(&self, session_id: &SessionId, format: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(&["export", session_id.as_str(), format]);
        debug!(%url, session_id = %session_id, format, "downloading export");
        let response = Self::ensure_success(self.http.get(url).send().await?)?;
        Ok(response.bytes().await?.to_vec())
    }
}
