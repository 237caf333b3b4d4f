//! Error types for FedSense.

use thiserror::Error;

/// Result type alias for FedSense operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in FedSense operations.
///
/// Insufficient history is never an error: predictors and pattern learners
/// decline with `None` instead.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // Simulation errors
    #[error("Hour out of sequence: expected {expected}, got {got}")]
    HourOutOfSequence { expected: u32, got: u32 },

    // Visualization errors
    #[error("Visualization sink failed: {0}")]
    Sink(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
