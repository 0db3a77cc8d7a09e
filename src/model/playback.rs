//! Playback state shared with session consumers

use std::time::Duration;

use super::track::Track;

/// Consumer-visible playback state.
///
/// Exactly one per session. It lives inside the session state and is
/// refreshed only from playback engine snapshots, so consumers never see
/// a progress value the engine did not produce.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackState {
    /// Track loaded into the audio transport, if any.
    pub current: Option<Track>,
    pub playing: bool,
    /// Elapsed share of the current track, in `[0, 100]`.
    pub progress_percent: f64,
}

impl PlaybackState {
    /// Nothing loaded, nothing playing.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }
}

/// Percent of `duration` covered by `position`, clamped to `[0, 100]`.
///
/// A zero duration (media of unknown length) reports 0 rather than
/// dividing by zero.
pub(crate) fn progress_percent(position: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    (position.as_secs_f64() / duration.as_secs_f64() * 100.0).clamp(0.0, 100.0)
}
