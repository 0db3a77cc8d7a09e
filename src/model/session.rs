//! Session state aggregate and its reducer

use super::playback::PlaybackState;
use super::track::Track;
use super::types::MoodResult;

/// Aggregate state for one user session.
///
/// The session controller owns one value of this behind a lock and
/// mutates it exclusively through [`SessionState::apply`], so every
/// transition is a pure, replayable step that tests can drive without a
/// camera, a network or a runtime.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// Last detection outcome; `None` until the first detection pass.
    pub mood: Option<MoodResult>,
    /// Tracks recommended for the current mood. Replaced wholesale when
    /// the newest catalog fetch resolves.
    pub recommended: Vec<Track>,
    pub playback: PlaybackState,
    /// True once the expression model finished loading.
    pub model_ready: bool,
    /// Non-fatal, consumer-visible notice: a denied camera, a failed
    /// playback operation. Cleared explicitly.
    pub notice: Option<String>,
    /// Ticket of the newest issued catalog fetch. Only ever advances.
    fetch_epoch: u64,
    /// Set by teardown. A closed session ignores every further event.
    closed: bool,
}

/// One observed fact the reducer folds into the session state.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// The expression model finished loading.
    ModelReady,
    /// The expression model failed to load. The session stays usable,
    /// detection just never becomes available.
    ModelFailed { reason: String },
    /// A detection pass resolved.
    MoodResolved { mood: MoodResult },
    /// A catalog fetch was issued for the latest detected mood.
    FetchIssued { ticket: u64 },
    /// A catalog fetch resolved. Lands only while `ticket` is still the
    /// newest issued fetch; superseded results are dropped.
    FetchResolved { ticket: u64, tracks: Vec<Track> },
    /// A catalog fetch failed. Same ticket rule. Clears the shelf but
    /// keeps the mood, so "nothing for this mood" stays presentable.
    FetchFailed { ticket: u64 },
    /// Snapshot pushed by the playback engine, operations and progress
    /// ticks alike.
    PlaybackApplied { playback: PlaybackState },
    /// Something non-fatal the consumer should see.
    NoticeRaised { message: String },
    NoticeCleared,
    /// Session teardown.
    TornDown,
}

impl SessionState {
    /// Step function `(state, event) -> state`.
    ///
    /// Pure: no I/O, no clocks, no locks. The one concurrency rule that
    /// lives here is the fetch ticket comparison: a resolution older
    /// than the newest issued fetch never overwrites newer results, and
    /// issue tickets only move forward even when their events arrive out
    /// of order.
    pub fn apply(mut self, event: SessionEvent) -> SessionState {
        if self.closed {
            return self;
        }
        match event {
            SessionEvent::ModelReady => {
                self.model_ready = true;
            }
            SessionEvent::ModelFailed { reason } => {
                self.model_ready = false;
                self.notice = Some(reason);
            }
            SessionEvent::MoodResolved { mood } => {
                if !mood.is_detected() {
                    self.recommended.clear();
                }
                self.mood = Some(mood);
            }
            SessionEvent::FetchIssued { ticket } => {
                self.fetch_epoch = self.fetch_epoch.max(ticket);
            }
            SessionEvent::FetchResolved { ticket, tracks } => {
                if ticket == self.fetch_epoch {
                    self.recommended = tracks;
                }
            }
            SessionEvent::FetchFailed { ticket } => {
                if ticket == self.fetch_epoch {
                    self.recommended.clear();
                }
            }
            SessionEvent::PlaybackApplied { playback } => {
                self.playback = playback;
            }
            SessionEvent::NoticeRaised { message } => {
                self.notice = Some(message);
            }
            SessionEvent::NoticeCleared => {
                self.notice = None;
            }
            SessionEvent::TornDown => {
                self.closed = true;
            }
        }
        self
    }

    /// True after teardown.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
