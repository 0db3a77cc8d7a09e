//! Playback engine
//!
//! Owns the session's single audio transport. Operations and the
//! progress clock publish [`PlaybackState`] snapshots on one channel, so
//! the consumer sees playback truth as a single ordered stream: a seek
//! snapshot can never be overtaken by a progress tick that was sampled
//! before it.
//!
//! - `transport`: the [`AudioTransport`] seam and the built-in
//!   [`ClockTransport`]

mod transport;

pub use transport::{AudioTransport, ClockTransport};

use std::sync::Arc;
use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::PlaybackError;
use crate::model::{PlaybackState, Track, progress_percent};

/// Interval between progress snapshots while a track is playing.
const PROGRESS_TICK: Duration = Duration::from_millis(250);

#[derive(Default)]
struct EngineState {
    current: Option<Track>,
    duration: Duration,
    playing: bool,
}

impl EngineState {
    fn snapshot(&self, progress_percent: f64) -> PlaybackState {
        PlaybackState {
            current: self.current.clone(),
            playing: self.playing,
            progress_percent,
        }
    }
}

struct EngineShared {
    transport: Arc<dyn AudioTransport>,
    state: Mutex<EngineState>,
    updates: UnboundedSender<PlaybackState>,
}

impl EngineShared {
    /// Vacates the current track after a transport failure and reports
    /// the idle state.
    fn reset_to_idle(&self, state: &mut EngineState) {
        self.transport.stop();
        state.current = None;
        state.duration = Duration::ZERO;
        state.playing = false;
        let _ = self.updates.send(state.snapshot(0.0));
    }
}

/// Drives one audio transport and reports every state change.
///
/// Create with [`PlaybackEngine::new`], which also hands back the
/// snapshot receiver. Must be created inside a tokio runtime; the
/// progress clock runs as a spawned task until [`PlaybackEngine::release`]
/// or drop.
pub struct PlaybackEngine {
    shared: Arc<EngineShared>,
    /// Serializes track switches. Held across the media load so
    /// overlapping selections apply in arrival order; the state lock is
    /// not.
    select_lock: Mutex<()>,
    ticker: StdMutex<Option<JoinHandle<()>>>,
}

impl PlaybackEngine {
    pub fn new(transport: Arc<dyn AudioTransport>) -> (Self, UnboundedReceiver<PlaybackState>) {
        let (updates, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(EngineShared {
            transport,
            state: Mutex::new(EngineState::default()),
            updates,
        });
        let ticker = tokio::spawn(run_progress_clock(shared.clone()));
        (
            Self {
                shared,
                select_lock: Mutex::new(()),
                ticker: StdMutex::new(Some(ticker)),
            },
            receiver,
        )
    }

    /// Load `track` and start playing it from the beginning.
    ///
    /// Always starts at zero: switching to a track that played earlier in
    /// the session does not resume it mid-way. The state lock is released
    /// while the media loads, so pause, seek and the progress clock see a
    /// vacated slot mid-load instead of queueing behind it; overlapping
    /// selections are serialized in arrival order. On failure the engine
    /// is left idle and the previous track stays stopped.
    pub async fn select_and_play(&self, track: Track) -> Result<(), PlaybackError> {
        let _switch = self.select_lock.lock().await;
        tracing::info!(title = %track.title, url = %track.audio_url, "Selecting track");
        {
            let mut state = self.shared.state.lock().await;
            self.shared.transport.stop();
            state.current = None;
            state.duration = Duration::ZERO;
            state.playing = false;
        }

        let duration = match self.shared.transport.load(&track.audio_url).await {
            Ok(duration) => duration,
            Err(e) => {
                let mut state = self.shared.state.lock().await;
                self.shared.reset_to_idle(&mut state);
                return Err(PlaybackError::UnsupportedMedia {
                    url: track.audio_url.clone(),
                    source: e,
                });
            }
        };

        let mut state = self.shared.state.lock().await;
        if let Err(e) = self.shared.transport.play() {
            self.shared.reset_to_idle(&mut state);
            return Err(PlaybackError::Transport(e));
        }
        state.current = Some(track);
        state.duration = duration;
        state.playing = true;
        let _ = self.shared.updates.send(state.snapshot(0.0));
        Ok(())
    }

    /// Stop advancing and hold the position. No-op without a current
    /// track. A transport failure vacates the slot.
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        let mut state = self.shared.state.lock().await;
        if state.current.is_none() {
            tracing::debug!("Pause with no current track ignored");
            return Ok(());
        }
        if state.playing {
            if let Err(e) = self.shared.transport.pause() {
                self.shared.reset_to_idle(&mut state);
                return Err(PlaybackError::Transport(e));
            }
            state.playing = false;
        }
        let progress = progress_percent(self.shared.transport.position(), state.duration);
        let _ = self.shared.updates.send(state.snapshot(progress));
        Ok(())
    }

    /// Continue playing from the current position.
    ///
    /// No-op without a current track. A track that ran to its end stays
    /// parked there: resuming only advances again after a seek back below
    /// the end.
    pub async fn resume(&self) -> Result<(), PlaybackError> {
        let mut state = self.shared.state.lock().await;
        if state.current.is_none() {
            tracing::debug!("Resume with no current track ignored");
            return Ok(());
        }
        let position = self.shared.transport.position();
        if !state.duration.is_zero() && position >= state.duration {
            tracing::debug!("Resume at end of track ignored");
            return Ok(());
        }
        if !state.playing {
            if let Err(e) = self.shared.transport.play() {
                self.shared.reset_to_idle(&mut state);
                return Err(PlaybackError::Transport(e));
            }
            state.playing = true;
        }
        let progress = progress_percent(position, state.duration);
        let _ = self.shared.updates.send(state.snapshot(progress));
        Ok(())
    }

    /// Jump to `percent` of the current track.
    ///
    /// Input outside `[0, 100]` is clamped, never rejected; without a
    /// current track the call is a no-op. Seeking does not change whether
    /// the track is playing.
    pub async fn seek(&self, percent: f64) -> Result<(), PlaybackError> {
        let mut state = self.shared.state.lock().await;
        if state.current.is_none() {
            tracing::debug!(percent, "Seek with no current track ignored");
            return Ok(());
        }
        let clamped = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let target = if state.duration.is_zero() {
            Duration::ZERO
        } else {
            state.duration.mul_f64(clamped / 100.0)
        };
        if let Err(e) = self.shared.transport.seek(target) {
            self.shared.reset_to_idle(&mut state);
            return Err(PlaybackError::Transport(e));
        }

        let progress = progress_percent(target, state.duration);
        tracing::debug!(percent, clamped, "Seek applied");
        let _ = self.shared.updates.send(state.snapshot(progress));
        Ok(())
    }

    /// Stop the transport and the progress clock. Idempotent; part of
    /// session teardown.
    pub async fn release(&self) {
        self.abort_ticker();
        let mut state = self.shared.state.lock().await;
        self.shared.transport.stop();
        state.current = None;
        state.duration = Duration::ZERO;
        state.playing = false;
        tracing::debug!("Playback engine released");
    }

    fn abort_ticker(&self) {
        let handle = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.abort_ticker();
    }
}

/// Periodically samples the transport while a track plays.
///
/// Detects the end of the track: playback parks paused at full progress
/// instead of advancing past the media. Snapshots are sent while holding
/// the state lock, same as the operations, which keeps the update stream
/// totally ordered.
async fn run_progress_clock(shared: Arc<EngineShared>) {
    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let mut state = shared.state.lock().await;
        if !state.playing || state.current.is_none() {
            continue;
        }
        let position = shared.transport.position();
        let ended = !state.duration.is_zero() && position >= state.duration;
        if ended {
            state.playing = false;
            if let Err(e) = shared.transport.pause() {
                tracing::debug!(error = %e, "Transport pause at end of track failed");
            }
            tracing::debug!("Track ended");
            let _ = shared.updates.send(state.snapshot(100.0));
        } else {
            let progress = progress_percent(position, state.duration);
            let _ = shared.updates.send(state.snapshot(progress));
        }
    }
}
