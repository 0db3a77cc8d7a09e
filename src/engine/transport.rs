//! Audio transport seam and the built-in clock transport

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Result, bail};
use futures::future::BoxFuture;
use tokio::time::Instant;

/// One audio output handle.
///
/// The playback engine drives exactly one transport per session. `load`
/// resolves the media and reports its duration (zero when unknown);
/// `position` is sampled by the engine's progress clock, so it must be
/// cheap and non-blocking.
pub trait AudioTransport: Send + Sync {
    /// Load `url` and prepare playback at position zero, paused.
    ///
    /// May suspend while the media resolves. The engine does not hold
    /// its state lock across the load, so controls issued mid-load stay
    /// responsive and act on a vacated slot.
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Duration>>;
    /// Start or continue advancing from the current position.
    fn play(&self) -> Result<()>;
    /// Stop advancing and hold the position.
    fn pause(&self) -> Result<()>;
    /// Jump to an absolute position.
    fn seek(&self, position: Duration) -> Result<()>;
    /// Current position. Zero with nothing loaded.
    fn position(&self) -> Duration;
    /// Drop the loaded media. Idempotent.
    fn stop(&self);
}

struct ClockState {
    /// `None` while nothing is loaded.
    duration: Option<Duration>,
    anchor_position: Duration,
    anchor_at: Instant,
    running: bool,
}

impl ClockState {
    fn idle() -> Self {
        Self {
            duration: None,
            anchor_position: Duration::ZERO,
            anchor_at: Instant::now(),
            running: false,
        }
    }

    fn position_at(&self, now: Instant) -> Duration {
        let Some(duration) = self.duration else {
            return Duration::ZERO;
        };
        let mut position = self.anchor_position;
        if self.running {
            position += now.saturating_duration_since(self.anchor_at);
        }
        if !duration.is_zero() {
            position = position.min(duration);
        }
        position
    }
}

/// Transport that advances positions against the tokio clock without
/// producing sound.
///
/// The default transport for hosts with no platform audio stack wired
/// in, and a deterministic one under a paused test clock. Durations are
/// resolved per URL from a configured table, falling back to a default;
/// a zero default models media of unknown length.
pub struct ClockTransport {
    default_duration: Duration,
    durations: HashMap<String, Duration>,
    state: Mutex<ClockState>,
}

impl ClockTransport {
    pub fn new(default_duration: Duration) -> Self {
        Self::with_durations(default_duration, HashMap::new())
    }

    pub fn with_durations(
        default_duration: Duration,
        durations: HashMap<String, Duration>,
    ) -> Self {
        Self {
            default_duration,
            durations,
            state: Mutex::new(ClockState::idle()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioTransport for ClockTransport {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Duration>> {
        Box::pin(async move {
            let duration = self
                .durations
                .get(url)
                .copied()
                .unwrap_or(self.default_duration);
            let mut state = self.state();
            state.duration = Some(duration);
            state.anchor_position = Duration::ZERO;
            state.anchor_at = Instant::now();
            state.running = false;
            tracing::debug!(url, ?duration, "Clock transport loaded");
            Ok(duration)
        })
    }

    fn play(&self) -> Result<()> {
        let mut state = self.state();
        if state.duration.is_none() {
            bail!("nothing loaded");
        }
        if !state.running {
            state.anchor_at = Instant::now();
            state.running = true;
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let now = Instant::now();
        let mut state = self.state();
        if state.duration.is_none() {
            bail!("nothing loaded");
        }
        state.anchor_position = state.position_at(now);
        state.anchor_at = now;
        state.running = false;
        Ok(())
    }

    fn seek(&self, position: Duration) -> Result<()> {
        let now = Instant::now();
        let mut state = self.state();
        let Some(duration) = state.duration else {
            bail!("nothing loaded");
        };
        state.anchor_position = if duration.is_zero() {
            position
        } else {
            position.min(duration)
        };
        state.anchor_at = now;
        Ok(())
    }

    fn position(&self) -> Duration {
        let now = Instant::now();
        self.state().position_at(now)
    }

    fn stop(&self) {
        *self.state() = ClockState::idle();
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{advance, sleep};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn position_advances_only_while_playing() {
        let transport = ClockTransport::new(Duration::from_secs(100));
        transport.load("u1").await.unwrap();
        assert_eq!(transport.position(), Duration::ZERO);

        transport.play().unwrap();
        advance(Duration::from_secs(3)).await;
        assert_eq!(transport.position(), Duration::from_secs(3));

        transport.pause().unwrap();
        advance(Duration::from_secs(5)).await;
        assert_eq!(transport.position(), Duration::from_secs(3));

        transport.play().unwrap();
        advance(Duration::from_secs(1)).await;
        assert_eq!(transport.position(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn position_saturates_at_the_duration() {
        let transport = ClockTransport::new(Duration::from_secs(2));
        transport.load("u1").await.unwrap();
        transport.play().unwrap();
        advance(Duration::from_secs(10)).await;
        assert_eq!(transport.position(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn seek_clamps_to_the_duration() {
        let transport = ClockTransport::new(Duration::from_secs(10));
        transport.load("u1").await.unwrap();
        transport.seek(Duration::from_secs(40)).unwrap();
        assert_eq!(transport.position(), Duration::from_secs(10));
        transport.seek(Duration::from_secs(4)).unwrap();
        assert_eq!(transport.position(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn per_url_durations_override_the_default() {
        let transport = ClockTransport::with_durations(
            Duration::from_secs(300),
            HashMap::from([("short".to_string(), Duration::from_secs(1))]),
        );
        assert_eq!(transport.load("short").await.unwrap(), Duration::from_secs(1));
        assert_eq!(
            transport.load("anything-else").await.unwrap(),
            Duration::from_secs(300)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_unloads() {
        let transport = ClockTransport::new(Duration::from_secs(100));
        transport.load("u1").await.unwrap();
        transport.play().unwrap();
        sleep(Duration::from_secs(1)).await;

        transport.stop();
        assert_eq!(transport.position(), Duration::ZERO);
        assert!(transport.play().is_err());
        assert!(transport.pause().is_err());
        assert!(transport.seek(Duration::ZERO).is_err());
        // stop is idempotent
        transport.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_models_unknown_length() {
        let transport = ClockTransport::new(Duration::ZERO);
        transport.load("stream").await.unwrap();
        transport.play().unwrap();
        advance(Duration::from_secs(500)).await;
        // no saturation when the length is unknown
        assert_eq!(transport.position(), Duration::from_secs(500));
    }
}
