//! Error types for text-generation API calls

use thiserror::Error;

/// Result type for API calls
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur while talking to the text-generation API
#[derive(Error, Debug)]
pub enum LlmError {
    /// Connection, TLS or body read failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No API key configured
    #[error(
        "API key not found. Set PLANWRIGHT_API_KEY or add it to ~/.config/planwright/secrets.toml"
    )]
    MissingApiKey,

    /// Base URL could not be parsed
    #[error("Invalid base URL: {0}")]
    Url(#[from] url::ParseError),
}

impl LlmError {
    /// Check if the service asked us to slow down
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::Api { status: 429, .. })
    }
}

impl From<LlmError> for planwright_core::Error {
    fn from(err: LlmError) -> Self {
        planwright_core::Error::StreamTransport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_stream_transport() {
        let err: planwright_core::Error = LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }
        .into();
        assert!(matches!(err, planwright_core::Error::StreamTransport(ref m) if m.contains("503")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rate_limit_status() {
        let err = LlmError::Api {
            status: 429,
            message: String::new(),
        };
        assert!(err.is_rate_limit());
        assert!(!LlmError::MissingApiKey.is_rate_limit());
    }
}
