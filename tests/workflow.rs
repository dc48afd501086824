//! End-to-end workflow tests against a mocked analysis API.
//!
//! These drive the public API only: upload → calibrate → track → poll →
//! results → export, plus the polling edge cases (transport errors mid-poll,
//! superseding a session while its poller runs).

use pitchtrack::{
    CalibrationPoint, Config, Event, ProgressStatus, Stage, TrackingClient,
};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        api_base_url: Url::parse(&format!("{}/api", server.uri())).expect("valid test URL"),
        poll_interval: Duration::from_millis(20),
        ..Default::default()
    }
}

fn calibration_points() -> Vec<CalibrationPoint> {
    vec![
        CalibrationPoint { x: 100.0, y: 50.0 },
        CalibrationPoint { x: 1820.0, y: 55.0 },
        CalibrationPoint { x: 1810.0, y: 1030.0 },
        CalibrationPoint { x: 110.0, y: 1025.0 },
    ]
}

async fn mount_happy_path(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "abc123",
            "metadata": {"fps": 30.0, "frames": 900, "width": 1920, "height": 1080, "duration": 30.0}
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/calibrate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/track"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "started"})),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/results/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "team_stats": {"total_distance": 12500, "avg_speed": 7.9, "duration": 1800},
            "players": [
                {"name": "Player1", "role": "forward", "distance": 2500, "avg_speed": 8.2, "max_speed": 24.5}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/export/abc123/csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"name,distance\nPlayer1,2500\n".to_vec()))
        .mount(server)
        .await;
}

/// Mount progress responses `0, 50` running followed by a persistent
/// `100, completed`. Limited mocks are mounted first, so they are consumed
/// in order before the terminal response takes over.
async fn mount_progress_sequence(server: &MockServer) {
    for progress in [0.0, 50.0] {
        Mock::given(method("GET"))
            .and(path("/api/progress/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "progress": progress, "status": "running"
            })))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/progress/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "progress": 100.0, "status": "completed"
        })))
        .mount(server)
        .await;
}

/// Drain broadcast events until a `Results` event arrives, collecting
/// progress percentages seen on the way.
async fn wait_for_results(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
) -> (Vec<f64>, pitchtrack::ResultsBundle) {
    let mut seen_progress = Vec::new();
    let deadline = Duration::from_secs(5);
    loop {
        let event = tokio::time::timeout(deadline, events.recv())
            .await
            .expect("timed out waiting for results event")
            .expect("event channel closed");
        match event {
            Event::Progress { percent, .. } => seen_progress.push(percent),
            Event::Results { bundle, .. } => return (seen_progress, bundle),
            _ => {}
        }
    }
}

#[tokio::test]
async fn full_workflow_upload_to_export() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    mount_progress_sequence(&server).await;

    let export_dir = tempfile::tempdir().expect("create temp dir");
    let config = Config {
        export_dir: export_dir.path().to_path_buf(),
        ..test_config(&server)
    };
    let client = TrackingClient::new(config).expect("build client");
    let mut events = client.subscribe();

    // Upload from a real file on disk
    let video = export_dir.path().join("match.mp4");
    tokio::fs::write(&video, b"not really a video")
        .await
        .expect("write fixture");
    let response = client.upload(&video).await.expect("upload");
    assert_eq!(response.session_id.as_str(), "abc123");
    let metadata = response.metadata.expect("metadata");
    assert_eq!(metadata.frames, 900);
    assert_eq!(metadata.width, 1920);
    assert_eq!(metadata.height, 1080);
    assert_eq!(client.current_stage().await, Stage::Uploaded);

    client
        .calibrate(&calibration_points())
        .await
        .expect("calibrate");
    assert_eq!(client.current_stage().await, Stage::Calibrated);

    client.start_tracking().await.expect("start tracking");
    assert_eq!(client.current_stage().await, Stage::Tracking);

    // The poller drives the session to completion and fetches results
    let (seen_progress, bundle) = wait_for_results(&mut events).await;
    assert_eq!(seen_progress.last().copied(), Some(100.0));
    assert!(
        seen_progress.windows(2).all(|w| w[0] <= w[1]),
        "progress must be monotonic: {seen_progress:?}"
    );
    assert_eq!(client.current_stage().await, Stage::Completed);

    let team = bundle.team_stats.expect("team stats");
    assert!((team.total_distance_meters - 12500.0).abs() < f64::EPSILON);
    assert!((team.avg_speed_kph - 7.9).abs() < f64::EPSILON);
    assert_eq!(bundle.players.len(), 1);
    assert_eq!(bundle.players[0].name, "Player1");
    assert!((bundle.players[0].max_speed_kph - 24.5).abs() < f64::EPSILON);

    // fetch_results is repeatable for a completed session
    let again = client.fetch_results().await.expect("fetch results");
    assert_eq!(again, bundle);

    // Export is a side channel: bytes come back, stage stays Completed
    let bytes = client.export("csv").await.expect("export");
    assert_eq!(bytes, b"name,distance\nPlayer1,2500\n");
    assert_eq!(client.current_stage().await, Stage::Completed);

    // export_to_dir writes <session_id>.<format> under the export dir
    let written = client.export_to_dir("csv").await.expect("export to dir");
    assert!(written.ends_with("abc123.csv"));
    let on_disk = tokio::fs::read(&written).await.expect("read export");
    assert_eq!(on_disk, bytes);

    client.shutdown().await;
}

#[tokio::test]
async fn poller_stops_after_terminal_status() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    mount_progress_sequence(&server).await;

    let client = TrackingClient::new(test_config(&server)).expect("build client");
    let mut events = client.subscribe();

    client
        .upload_bytes("match.mp4", b"fake".to_vec())
        .await
        .expect("upload");
    client
        .calibrate(&calibration_points())
        .await
        .expect("calibrate");
    client.start_tracking().await.expect("start tracking");
    wait_for_results(&mut events).await;

    // No further progress requests after the terminal status was observed
    tokio::time::sleep(Duration::from_millis(100)).await;
    let count_after_terminal = progress_request_count(&server, "abc123").await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        progress_request_count(&server, "abc123").await,
        count_after_terminal,
        "poller must stop exactly once and stay stopped"
    );

    client.shutdown().await;
}

#[tokio::test]
async fn poller_survives_transport_errors() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    // Two failing ticks, then a terminal completion
    for _ in 0..2 {
        Mock::given(method("GET"))
            .and(path("/api/progress/abc123"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/progress/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "progress": 100.0, "status": "completed"
        })))
        .mount(&server)
        .await;

    let client = TrackingClient::new(test_config(&server)).expect("build client");
    let mut events = client.subscribe();

    client
        .upload_bytes("match.mp4", b"fake".to_vec())
        .await
        .expect("upload");
    client
        .calibrate(&calibration_points())
        .await
        .expect("calibrate");
    client.start_tracking().await.expect("start tracking");

    // Despite two failed ticks, the poller keeps going and completes
    let (_, bundle) = wait_for_results(&mut events).await;
    assert_eq!(bundle.players.len(), 1);
    assert_eq!(client.current_stage().await, Stage::Completed);

    client.shutdown().await;
}

#[tokio::test]
async fn unknown_progress_status_keeps_polling() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/progress/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "progress": 5.0, "status": "warming_up"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/progress/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "progress": 100.0, "status": "completed"
        })))
        .mount(&server)
        .await;

    // Sanity: the unknown status parses as Unknown, not an error
    assert_eq!(
        ProgressStatus::from("warming_up".to_string()),
        ProgressStatus::Unknown("warming_up".to_string())
    );

    let client = TrackingClient::new(test_config(&server)).expect("build client");
    let mut events = client.subscribe();

    client
        .upload_bytes("match.mp4", b"fake".to_vec())
        .await
        .expect("upload");
    client
        .calibrate(&calibration_points())
        .await
        .expect("calibrate");
    client.start_tracking().await.expect("start tracking");

    wait_for_results(&mut events).await;
    assert_eq!(client.current_stage().await, Stage::Completed);

    client.shutdown().await;
}

#[tokio::test]
async fn new_upload_stops_previous_poller() {
    let server = MockServer::start().await;
    // First upload creates abc123, second creates def456
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"session_id": "abc123"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"session_id": "def456"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/calibrate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/track"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "started"})),
        )
        .mount(&server)
        .await;
    // The first session's job never finishes
    Mock::given(method("GET"))
        .and(path("/api/progress/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "progress": 40.0, "status": "running"
        })))
        .mount(&server)
        .await;

    let client = TrackingClient::new(test_config(&server)).expect("build client");

    client
        .upload_bytes("first.mp4", b"first".to_vec())
        .await
        .expect("first upload");
    client
        .calibrate(&calibration_points())
        .await
        .expect("calibrate");
    client.start_tracking().await.expect("start tracking");

    // Let the first poller take a few ticks
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(progress_request_count(&server, "abc123").await > 0);

    // A second upload replaces the session; the old poller must be gone
    client
        .upload_bytes("second.mp4", b"second".to_vec())
        .await
        .expect("second upload");
    assert_eq!(client.session_id().await.expect("session").as_str(), "def456");
    assert_eq!(client.current_stage().await, Stage::Uploaded);

    let count_after_replacement = progress_request_count(&server, "abc123").await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        progress_request_count(&server, "abc123").await,
        count_after_replacement,
        "old session's poller must not keep polling"
    );

    client.shutdown().await;
}

async fn progress_request_count(server: &MockServer, session_id: &str) -> usize {
    let target = format!("/api/progress/{session_id}");
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|request| request.url.path() == target)
        .count()
}
