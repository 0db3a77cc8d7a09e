//! Mood-driven music session core.
//!
//! Coordinates four independently failing subsystems into one observable
//! session: camera capture, facial expression inference, a mood-tagged
//! track catalog, and audio playback. The host (a desktop shell, a TUI,
//! a test harness) supplies the platform pieces through the
//! [`capture::CameraDriver`], [`classifier::ExpressionModel`] and
//! [`engine::AudioTransport`] seams and drives the session through
//! [`SessionController`].
//!
//! All session state lives in one [`SessionState`] value mutated only by
//! its reducer, playback truth flows through a single ordered snapshot
//! stream, and overlapping catalog fetches are sequenced so the newest
//! one wins.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use moodplay::capture::{CaptureSource, StaticCamera};
//! use moodplay::catalog::CatalogClient;
//! use moodplay::classifier::{ExpressionModel, MoodClassifier};
//! use moodplay::engine::{ClockTransport, PlaybackEngine};
//! use moodplay::model::Frame;
//! use moodplay::SessionController;
//!
//! # async fn run(model: Arc<dyn ExpressionModel>) -> Result<(), Box<dyn std::error::Error>> {
//! let camera = StaticCamera::new(Frame::new(640, 480, vec![0; 640 * 480 * 4]));
//! let capture = CaptureSource::new(Arc::new(camera));
//! let classifier = MoodClassifier::new(model);
//! let catalog = CatalogClient::from_env()?;
//! let (engine, events) =
//!     PlaybackEngine::new(Arc::new(ClockTransport::new(Duration::from_secs(180))));
//!
//! let session = SessionController::start(capture, classifier, catalog, engine, events).await;
//!
//! session.detect_mood_and_recommend().await;
//! let state = session.snapshot().await;
//! for track in &state.recommended {
//!     println!("{} - {}", track.artist, track.title);
//! }
//! if let Some(track) = state.recommended.first() {
//!     session.play_pause(track).await;
//!     session.seek(25.0).await;
//! }
//!
//! session.teardown().await;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod catalog;
pub mod classifier;
pub mod controller;
pub mod engine;
pub mod error;
pub mod model;

pub use controller::SessionController;
pub use error::{DeviceError, FetchError, LoadError, NotReadyError, PlaybackError};
pub use model::{Mood, MoodResult, PlaybackState, SessionEvent, SessionState, Track};
