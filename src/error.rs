//! Error taxonomy for the session core
//!
//! Component boundaries expose typed errors; the trait seams underneath
//! them (`CameraDriver`, `ExpressionModel`, `AudioTransport`) report
//! plain `anyhow::Error` values that get wrapped here. Ambiguous face
//! scans are not an error at all: they fold into a no-detection result.

use thiserror::Error;

/// Camera failures at the capture boundary.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device is missing, busy, or the user denied access.
    #[error("camera unavailable or permission denied")]
    Unavailable(#[source] anyhow::Error),

    /// A frame was requested outside an open acquire/release window.
    #[error("camera handle is not acquired")]
    NotAcquired,
}

/// Expression model assets failed to load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("expression model assets failed to load")]
    Assets(#[source] anyhow::Error),

    /// A previous load attempt already failed; the model stays unusable
    /// for the rest of the session.
    #[error("expression model previously failed to load")]
    Failed,
}

/// Classification was attempted before the expression model finished
/// loading. Callers treat this as "ignore and keep waiting", not as a
/// session failure.
#[derive(Debug, Error)]
#[error("expression model is not ready")]
pub struct NotReadyError;

/// Track catalog request failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No backend base URL was configured.
    #[error("catalog base URL is not configured")]
    MissingBaseUrl,

    /// Transport-level failure from the HTTP client.
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The request exceeded the client deadline.
    #[error("catalog request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("catalog returned status {status}")]
    Status { status: reqwest::StatusCode },

    /// The response body was not the expected shape.
    #[error("failed to parse catalog response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether the failure is transient and worth retrying.
    ///
    /// Retries on timeouts, connect failures and server errors (5xx);
    /// never on client errors or malformed bodies.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(e.status(), Some(status) if status.is_server_error())
            }
            FetchError::Status { status } => status.is_server_error(),
            _ => false,
        }
    }
}

/// Playback engine failures. Non-fatal: the engine reverts to idle for
/// the affected track and the session carries on.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The transport could not load the track's media.
    #[error("unsupported media: {url}")]
    UnsupportedMedia {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The transport rejected a play/pause/seek command.
    #[error("audio transport failure")]
    Transport(#[source] anyhow::Error),
}
