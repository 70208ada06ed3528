//! Error types for Planwright

use std::time::Duration;

use thiserror::Error;

/// Result type alias for Planwright operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Planwright operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The text-generation service could not be reached or rejected the request
    #[error("Stream transport error: {0}")]
    StreamTransport(String),

    /// Final-mode parse found no month or week headers
    #[error("No recognizable plan structure in generated text")]
    ParseFailure,

    /// Too few unique tasks in a single attempt
    #[error("Insufficient unique tasks: found {found}, expected {expected}")]
    ValidationShortfall { found: usize, expected: usize },

    /// Shortfall or parse failure persisted past the retry budget
    #[error(
        "Insufficient unique tasks after {attempts} attempts: found {found}, expected {expected}"
    )]
    RetriesExhausted {
        attempts: u32,
        found: usize,
        expected: usize,
    },

    /// Goal text rejected before generation
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    /// A second generation was started while one is in flight
    #[error("A plan generation is already in progress")]
    GenerationInProgress,

    /// The requester exceeded its request budget
    #[error("Rate limit exceeded for '{key}', retry in {}s", retry_after.as_secs())]
    RateLimited { key: String, retry_after: Duration },

    /// Persistence collaborator failed to store a plan
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a fresh generation attempt may fix this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ParseFailure | Error::ValidationShortfall { .. })
    }
}
