//! Playback commands and the engine snapshot listener

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::error::PlaybackError;
use crate::model::{PlaybackState, SessionEvent, Track};

use super::SessionController;

impl SessionController {
    /// Toggle `track`: pause it if it is the current playing track,
    /// resume it if it is the current paused track, otherwise start it
    /// from the beginning.
    ///
    /// Whether `track` sits on the current recommendation shelf is not
    /// checked: a playing track outlives the catalog that suggested it.
    pub async fn play_pause(&self, track: &Track) {
        let playback = self.snapshot().await.playback;
        let result = match &playback.current {
            Some(current) if current.is_same(track) => {
                if playback.playing {
                    tracing::debug!(title = %track.title, "Pausing current track");
                    self.engine.pause().await
                } else {
                    tracing::debug!(title = %track.title, "Resuming current track");
                    self.engine.resume().await
                }
            }
            _ => self.engine.select_and_play(track.clone()).await,
        };
        if let Err(e) = result {
            self.raise_playback_notice(&e).await;
        }
    }

    /// Seek to `percent` of the current track. Forwarded to the engine,
    /// which clamps out-of-range input and ignores the call while nothing
    /// is loaded.
    pub async fn seek(&self, percent: f64) {
        if let Err(e) = self.engine.seek(percent).await {
            self.raise_playback_notice(&e).await;
        }
    }

    async fn raise_playback_notice(&self, error: &PlaybackError) {
        tracing::error!(error = %error, "Playback operation failed");
        self.apply(SessionEvent::NoticeRaised {
            message: format!("Playback failed: {error}"),
        })
        .await;
    }

    /// Drain engine snapshots into the session state.
    ///
    /// Operations and progress ticks arrive on the same channel, so the
    /// session observes playback states exactly in the order the engine
    /// produced them.
    pub(crate) fn spawn_engine_listener(
        &self,
        mut events: UnboundedReceiver<PlaybackState>,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(playback) = events.recv().await {
                controller
                    .apply(SessionEvent::PlaybackApplied { playback })
                    .await;
            }
            tracing::debug!("Engine snapshot channel closed");
        })
    }
}
