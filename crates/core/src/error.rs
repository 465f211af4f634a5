//! Error types for HydroNav

use crate::network::SegmentId;
use thiserror::Error;

/// Main error type for HydroNav operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown seed segment: {0}")]
    InvalidSeed(SegmentId),

    #[error("Unknown navigation mode: {0:?} (expected UM, UT, DM or DD)")]
    InvalidMode(String),

    #[error("Invalid navigation distance: {0} (must be finite and non-negative)")]
    InvalidDistance(f64),

    #[error("Point is not on the network: {distance} away, tolerance {tolerance}")]
    NotOnNetwork {
        /// Segment the point was tested against, when there was one
        segment: Option<SegmentId>,
        distance: f64,
        tolerance: f64,
    },

    #[error("Feature not found: {origin}/{identifier}")]
    FeatureNotFound { origin: String, identifier: String },

    #[error("Could not snap {feature} onto the network: {reason}")]
    SnapFailed { feature: String, reason: String },

    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Shorthand for a collaborator transport failure.
    pub fn unavailable(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Error::CollaboratorUnavailable {
            collaborator,
            reason: reason.into(),
        }
    }

    /// Errors caused by the caller's input or by data the caller referenced.
    ///
    /// `SnapFailed` counts as a caller/data problem; mapping it onto a
    /// transport status is left to the service layer.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSeed(_)
                | Error::InvalidMode(_)
                | Error::InvalidDistance(_)
                | Error::FeatureNotFound { .. }
                | Error::SnapFailed { .. }
                | Error::NotOnNetwork { .. }
        )
    }

    /// Outcomes the pour-point fallback chain consumes internally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NotOnNetwork { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Result type alias for HydroNav operations
pub type Result<T> = std::result::Result<T, Error>;
