//! Controller module - session orchestration
//!
//! The session controller coordinates the capture source, the mood
//! classifier, the catalog client and the playback engine, and owns the
//! session state they all feed into. It is organized into submodules by
//! responsibility:
//!
//! - `detect`: the detect-mood-and-recommend flow
//! - `playback`: playback commands and the engine snapshot listener

mod detect;
mod playback;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::{Mutex as StdMutex, PoisonError};

use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::capture::CaptureSource;
use crate::catalog::CatalogClient;
use crate::classifier::MoodClassifier;
use crate::engine::PlaybackEngine;
use crate::model::{PlaybackState, SessionEvent, SessionState};

/// Orchestrates one user session.
///
/// Cheap to clone; all clones share the same session. Consumers read the
/// session through [`SessionController::snapshot`] and never mutate it
/// directly: every change flows through the state reducer.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    pub(crate) capture: Arc<CaptureSource>,
    pub(crate) classifier: Arc<MoodClassifier>,
    pub(crate) catalog: CatalogClient,
    pub(crate) engine: Arc<PlaybackEngine>,
    pub(crate) fetch_tickets: Arc<AtomicU64>,
    tasks: Arc<StdMutex<Vec<JoinHandle<()>>>>,
}

impl SessionController {
    /// Wire the components together and start the session.
    ///
    /// Acquires the camera (a denied or missing device degrades the
    /// session instead of failing it), kicks off the expression model
    /// load in the background, and starts mirroring playback engine
    /// snapshots into the session state. `engine_events` must be the
    /// receiver returned by [`PlaybackEngine::new`] for `engine`.
    pub async fn start(
        capture: CaptureSource,
        classifier: MoodClassifier,
        catalog: CatalogClient,
        engine: PlaybackEngine,
        engine_events: UnboundedReceiver<PlaybackState>,
    ) -> Self {
        let controller = Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            capture: Arc::new(capture),
            classifier: Arc::new(classifier),
            catalog,
            engine: Arc::new(engine),
            fetch_tickets: Arc::new(AtomicU64::new(0)),
            tasks: Arc::new(StdMutex::new(Vec::new())),
        };

        if let Err(e) = controller.capture.acquire().await {
            tracing::warn!(error = %e, "Starting session without a camera");
            controller
                .apply(SessionEvent::NoticeRaised {
                    message: format!("Camera unavailable: {e}"),
                })
                .await;
        }

        let loader = {
            let controller = controller.clone();
            tokio::spawn(async move {
                match controller.classifier.load_models().await {
                    Ok(()) => controller.apply(SessionEvent::ModelReady).await,
                    Err(e) => {
                        controller
                            .apply(SessionEvent::ModelFailed {
                                reason: format!("Mood detection unavailable: {e}"),
                            })
                            .await
                    }
                }
            })
        };
        let listener = controller.spawn_engine_listener(engine_events);
        controller.track_task(loader);
        controller.track_task(listener);

        tracing::info!("Session started");
        controller
    }

    /// Current session state, cloned for rendering.
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Dismiss the current notice, if any.
    pub async fn clear_notice(&self) {
        self.apply(SessionEvent::NoticeCleared).await;
    }

    /// End the session: close the state to further events, release the
    /// camera, stop playback and its progress clock, and stop the
    /// background tasks. Idempotent.
    pub async fn teardown(&self) {
        tracing::info!("Session teardown");
        self.apply(SessionEvent::TornDown).await;
        self.capture.release();
        self.engine.release().await;

        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            tasks.drain(..).collect()
        };
        for handle in handles {
            handle.abort();
        }
    }

    /// Fold one event into the session state.
    pub(crate) async fn apply(&self, event: SessionEvent) {
        let mut state = self.state.lock().await;
        let next = state.clone().apply(event);
        *state = next;
    }

    pub(crate) fn track_task(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}
