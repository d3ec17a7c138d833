//! Error types for pharmacy discovery.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    /// The routing service could not produce a road distance for a pair.
    #[error("Routing unavailable: {0}")]
    RoutingUnavailable(String),

    /// The store could not supply the candidate pharmacies.
    #[error("Candidate data unavailable: {0}")]
    CandidateDataUnavailable(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid coordinate: lat={latitude:?}, lon={longitude:?}")]
    InvalidCoordinate {
        latitude: Option<f64>,
        longitude: Option<f64>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LocatorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LocatorError::RoutingUnavailable(format!("timed out: {}", err))
        } else {
            LocatorError::RoutingUnavailable(err.to_string())
        }
    }
}
