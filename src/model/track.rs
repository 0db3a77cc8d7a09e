//! Track metadata and catalog wire models

use serde::Deserialize;

/// A playable item from the track catalog.
///
/// Immutable once fetched. Identity is the hosted audio location
/// ([`Track::is_same`]): two tracks with the same title but different
/// audio URLs are different tracks, and the same URL under refreshed
/// metadata is still the same track.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    /// Label of the mood shelf this track is filed under.
    pub mood: String,
    /// Hosted audio location. The backend serializes this as `audioUrl`;
    /// older records carry `audio` instead.
    #[serde(rename = "audioUrl", alias = "audio")]
    pub audio_url: String,
}

impl Track {
    /// Tracks are identified by where their audio lives.
    pub fn is_same(&self, other: &Track) -> bool {
        self.audio_url == other.audio_url
    }
}

/// Metadata for a track upload.
#[derive(Clone, Debug)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub mood: String,
}

/// Wire shape of `GET /songs`.
#[derive(Debug, Deserialize)]
pub(crate) struct SongsResponse {
    #[allow(dead_code)] // Required for deserialization, not read
    pub message: String,
    pub songs: Vec<Track>,
}

/// Wire shape of `POST /songs`.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedSong {
    #[allow(dead_code)] // Required for deserialization, not read
    pub message: String,
    pub song: Track,
}
