//! Error types for the snap service client.

use hydronav_core::Error;
use std::time::Duration;
use thiserror::Error;

/// Name reported in `CollaboratorUnavailable`.
pub const COLLABORATOR: &str = "hydrologic snap service";

/// Errors produced by the snap service client.
#[derive(Error, Debug)]
pub enum SnapError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("invalid response payload: {0}")]
    Payload(String),

    /// The service answered but could not place the point.
    #[error("snap of {point} rejected: {reason}")]
    Rejected { point: String, reason: String },
}

impl SnapError {
    /// Classify a reqwest error, separating timeouts from other transport failures.
    pub(crate) fn from_request(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            SnapError::Timeout(timeout)
        } else {
            SnapError::Http(e)
        }
    }
}

impl From<SnapError> for Error {
    fn from(e: SnapError) -> Self {
        match e {
            SnapError::Rejected { point, reason } => Error::SnapFailed {
                feature: point,
                reason,
            },
            other => Error::unavailable(COLLABORATOR, other.to_string()),
        }
    }
}

/// Result alias for snap client operations.
pub type Result<T> = std::result::Result<T, SnapError>;
