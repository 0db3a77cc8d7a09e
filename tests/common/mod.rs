//! Scripted drivers, models and catalog mocks for session tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use anyhow::{Result, anyhow};
use futures::future::BoxFuture;
use serde_json::json;
use tokio::sync::Notify;
use tokio::time::sleep;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use moodplay::SessionController;
use moodplay::capture::{CameraDriver, CaptureSource};
use moodplay::catalog::CatalogClient;
use moodplay::classifier::{ExpressionModel, MoodClassifier};
use moodplay::engine::{ClockTransport, PlaybackEngine};
use moodplay::model::{ExpressionScores, FaceScan, Frame, Mood, SessionState};

pub fn test_frame() -> Frame {
    Frame::new(64, 64, vec![0u8; 64 * 64 * 4])
}

pub fn single_face(mood: Mood, score: f32) -> FaceScan {
    FaceScan::Single(ExpressionScores::new().with(mood, score))
}

/// Camera whose open always fails, as if the user denied permission.
pub struct DeniedCamera;

impl CameraDriver for DeniedCamera {
    fn open(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Err(anyhow!("permission denied")) })
    }

    fn grab(&self) -> Result<Frame> {
        Err(anyhow!("camera not open"))
    }

    fn shutdown(&self) {}
}

/// Working camera that counts shutdowns for teardown assertions.
#[derive(Default)]
pub struct TestCamera {
    pub shutdowns: AtomicUsize,
}

impl CameraDriver for TestCamera {
    fn open(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn grab(&self) -> Result<Frame> {
        Ok(test_frame())
    }

    fn shutdown(&self) {
        self.shutdowns
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Expression model that replies with a scripted sequence of scans, one
/// per detection pass. An exhausted script keeps reporting no face.
pub struct ScriptedModel {
    scans: Mutex<VecDeque<FaceScan>>,
}

impl ScriptedModel {
    pub fn new(scans: Vec<FaceScan>) -> Arc<Self> {
        Arc::new(Self {
            scans: Mutex::new(scans.into()),
        })
    }
}

impl ExpressionModel for ScriptedModel {
    fn load(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn detect<'a>(&'a self, _frame: &'a Frame) -> BoxFuture<'a, Result<FaceScan>> {
        Box::pin(async {
            Ok(self
                .scans
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(FaceScan::NoFace))
        })
    }
}

/// Expression model whose load blocks until released.
pub struct GatedModel {
    gate: Notify,
    scan: FaceScan,
}

impl GatedModel {
    pub fn new(scan: FaceScan) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            scan,
        })
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

impl ExpressionModel for GatedModel {
    fn load(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async {
            self.gate.notified().await;
            Ok(())
        })
    }

    fn detect<'a>(&'a self, _frame: &'a Frame) -> BoxFuture<'a, Result<FaceScan>> {
        Box::pin(async { Ok(self.scan.clone()) })
    }
}

/// Expression model whose assets never load.
pub struct BrokenModel;

impl ExpressionModel for BrokenModel {
    fn load(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Err(anyhow!("model download failed")) })
    }

    fn detect<'a>(&'a self, _frame: &'a Frame) -> BoxFuture<'a, Result<FaceScan>> {
        Box::pin(async { Ok(FaceScan::NoFace) })
    }
}

pub fn song(title: &str, artist: &str, mood: &str, url: &str) -> serde_json::Value {
    json!({
        "title": title,
        "artist": artist,
        "mood": mood,
        "audioUrl": url,
    })
}

/// Mount a `GET /songs?mood=` expectation answering with `songs` after
/// `delay`.
pub async fn mock_songs(
    server: &MockServer,
    mood: &str,
    songs: Vec<serde_json::Value>,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path("/songs"))
        .and(query_param("mood", mood))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(delay)
                .set_body_json(json!({
                    "message": "songs fetched successfully",
                    "songs": songs,
                })),
        )
        .mount(server)
        .await;
}

/// Mount a `GET /songs?mood=` expectation that always fails with
/// `status`.
pub async fn mock_songs_error(server: &MockServer, mood: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/songs"))
        .and(query_param("mood", mood))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Start a full session against a fresh mock catalog backend.
///
/// `durations` seeds the clock transport's per-URL track lengths; other
/// URLs fall back to five minutes.
pub async fn start_session(
    camera: Arc<dyn CameraDriver>,
    model: Arc<dyn ExpressionModel>,
    durations: &[(&str, u64)],
) -> (SessionController, MockServer) {
    let server = MockServer::start().await;
    let capture = CaptureSource::new(camera);
    let classifier = MoodClassifier::new(model);
    let catalog = CatalogClient::with_timeout(server.uri(), Duration::from_millis(800)).unwrap();
    let table: HashMap<String, Duration> = durations
        .iter()
        .map(|(url, secs)| (url.to_string(), Duration::from_secs(*secs)))
        .collect();
    let transport = Arc::new(ClockTransport::with_durations(
        Duration::from_secs(300),
        table,
    ));
    let (engine, events) = PlaybackEngine::new(transport);
    let controller = SessionController::start(capture, classifier, catalog, engine, events).await;
    (controller, server)
}

/// Poll the session until `predicate` holds, panicking after two
/// seconds.
pub async fn wait_for<F>(controller: &SessionController, what: &str, predicate: F) -> SessionState
where
    F: Fn(&SessionState) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let state = controller.snapshot().await;
        if predicate(&state) {
            return state;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}; last state: {state:?}");
        }
        sleep(Duration::from_millis(10)).await;
    }
}
