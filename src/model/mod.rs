//! Model module - session state and data types
//!
//! All data structures the session works over, organized by
//! responsibility:
//!
//! - `types`: detection inputs and outcomes (frames, scores, moods)
//! - `track`: track metadata and the catalog wire models
//! - `playback`: the consumer-visible playback snapshot
//! - `session`: the session state aggregate and its reducer

mod playback;
mod session;
mod track;
mod types;

pub use types::{ExpressionScores, FaceScan, Frame, Mood, MoodResult, ParseMoodError};

pub use track::{NewTrack, Track};
pub(crate) use track::{CreatedSong, SongsResponse};

pub use playback::PlaybackState;
pub(crate) use playback::progress_percent;

pub use session::{SessionEvent, SessionState};
