//! Mood detection and recommendation flow

use std::sync::atomic::Ordering;

use crate::model::{Mood, MoodResult, SessionEvent};

use super::SessionController;

impl SessionController {
    /// Detect the user's mood from the current camera frame and refresh
    /// the recommended tracks for it.
    ///
    /// Ignored entirely while the expression model is still loading.
    /// Capture failures and faceless frames resolve to a no-detection
    /// outcome rather than an error; only a detected mood issues a
    /// catalog fetch, and only the newest issued fetch is allowed to
    /// update the recommendations.
    pub async fn detect_mood_and_recommend(&self) {
        if !self.classifier.is_ready().await {
            tracing::debug!("Detection ignored, expression model not ready");
            return;
        }

        let frame = match self.capture.current_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!(error = %e, "Frame capture failed, treating as no detection");
                None
            }
        };

        let result = match frame {
            Some(frame) => match self.classifier.classify(&frame).await {
                Ok(result) => result,
                // the model went un-ready between the check and the call
                Err(_) => {
                    tracing::debug!("Detection ignored, expression model not ready");
                    return;
                }
            },
            None => MoodResult::NotDetected,
        };

        match result {
            MoodResult::NotDetected => {
                tracing::info!("No mood detected");
                self.apply(SessionEvent::MoodResolved {
                    mood: MoodResult::NotDetected,
                })
                .await;
            }
            MoodResult::Detected { label, ranking } => {
                tracing::info!(mood = %label, "Mood detected");
                self.apply(SessionEvent::MoodResolved {
                    mood: MoodResult::Detected { label, ranking },
                })
                .await;
                self.refresh_recommendations(label).await;
            }
        }
    }

    /// Issue a catalog fetch for `mood` without blocking the caller.
    ///
    /// Detections can overlap; each fetch carries a ticket and the
    /// reducer only lands the newest one, so a slow older response never
    /// overwrites a fresher shelf.
    async fn refresh_recommendations(&self, mood: Mood) {
        let ticket = self.fetch_tickets.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply(SessionEvent::FetchIssued { ticket }).await;

        let controller = self.clone();
        let fetch = tokio::spawn(async move {
            match controller.catalog.fetch_by_mood(mood.as_str()).await {
                Ok(tracks) => {
                    tracing::debug!(mood = %mood, ticket, count = tracks.len(), "Recommendations fetched");
                    controller
                        .apply(SessionEvent::FetchResolved { ticket, tracks })
                        .await;
                }
                Err(e) => {
                    tracing::error!(mood = %mood, ticket, error = %e, "Recommendation fetch failed");
                    controller
                        .apply(SessionEvent::FetchFailed { ticket })
                        .await;
                }
            }
        });
        self.track_task(fetch);
    }
}
