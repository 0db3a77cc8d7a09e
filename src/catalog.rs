//! Track catalog client
//!
//! Thin HTTP client for the songs backend: fetch the tracks filed under
//! a mood and upload new ones. Calls are stateless; sequencing overlapped
//! fetches (newest call wins) is the session reducer's job, not the
//! client's.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;
use crate::model::{CreatedSong, NewTrack, SongsResponse, Track};

/// Environment variable holding the backend base URL.
const BASE_URL_ENV: &str = "MOODPLAY_API_URL";

/// Request deadline in seconds. Fetches fail at the deadline instead of
/// hanging a detection pass.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Retry attempts for transient failures.
const MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff in milliseconds.
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Client for the track catalog backend.
#[derive(Clone, Debug)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
    max_retries: u32,
}

impl CatalogClient {
    /// Create a client with the default request deadline.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request deadline.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(FetchError::MissingBaseUrl);
        }

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("moodplay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            max_retries: MAX_RETRIES,
        })
    }

    /// Create a client from the `MOODPLAY_API_URL` environment variable.
    pub fn from_env() -> Result<Self, FetchError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Err(FetchError::MissingBaseUrl),
        }
    }

    /// Fetch every track filed under `mood`.
    ///
    /// An unknown or empty label yields an empty list, not an error. The
    /// request deadline and bounded retries guarantee the call terminates
    /// with tracks or a [`FetchError`].
    pub async fn fetch_by_mood(&self, mood: &str) -> Result<Vec<Track>, FetchError> {
        tracing::debug!(mood, "Fetching tracks by mood");

        let body = self
            .with_retry(|| async { self.request_songs(mood).await })
            .await?;
        let response: SongsResponse = serde_json::from_str(&body)?;

        tracing::debug!(mood, count = response.songs.len(), "Tracks fetched");
        Ok(response.songs)
    }

    /// Upload a new track with its audio bytes.
    ///
    /// Administrative call, never issued by the session controller. Not
    /// retried: the multipart body is consumed by the attempt.
    pub async fn create_track(&self, new: &NewTrack, audio: Vec<u8>) -> Result<Track, FetchError> {
        tracing::debug!(
            title = %new.title,
            artist = %new.artist,
            mood = %new.mood,
            bytes = audio.len(),
            "Uploading track"
        );

        // the backend stores uploads under an epoch-millis file name
        let file_name = chrono::Utc::now().timestamp_millis().to_string();
        let form = reqwest::multipart::Form::new()
            .text("title", new.title.clone())
            .text("artist", new.artist.clone())
            .text("mood", new.mood.clone())
            .part("audio", reqwest::multipart::Part::bytes(audio).file_name(file_name));

        let response = self
            .http
            .post(format!("{}/songs", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        let created: CreatedSong = serde_json::from_str(&body)?;

        tracing::info!(title = %created.song.title, url = %created.song.audio_url, "Track uploaded");
        Ok(created.song)
    }

    async fn request_songs(&self, mood: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(format!("{}/songs", self.base_url))
            .query(&[("mood", mood)])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        response.text().await.map_err(map_transport_error)
    }

    /// Run `operation`, retrying transient failures with exponential
    /// backoff.
    async fn with_retry<T, F, Fut>(&self, operation: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay_ms = RETRY_BASE_DELAY_MS * 2u64.pow(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms,
                        error = %e,
                        "Catalog request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = CatalogClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            CatalogClient::new(""),
            Err(FetchError::MissingBaseUrl)
        ));
    }

    #[test]
    fn from_env_requires_the_variable() {
        temp_env::with_var(BASE_URL_ENV, None::<&str>, || {
            assert!(matches!(
                CatalogClient::from_env(),
                Err(FetchError::MissingBaseUrl)
            ));
        });
        temp_env::with_var(BASE_URL_ENV, Some("   "), || {
            assert!(matches!(
                CatalogClient::from_env(),
                Err(FetchError::MissingBaseUrl)
            ));
        });
        temp_env::with_var(BASE_URL_ENV, Some("http://localhost:3000"), || {
            assert!(CatalogClient::from_env().is_ok());
        });
    }
}
