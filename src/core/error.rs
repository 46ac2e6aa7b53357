//! Custom error types for Quaero
//!
//! Provides a unified error handling system across all modules. None of these
//! errors cross `Agent::process`; the agent loop turns them into failed
//! observations, degraded decisions or a graceful-failure answer.

use thiserror::Error;

/// Main error type for Quaero operations
#[derive(Error, Debug)]
pub enum QuaeroError {
    /// Language model transport or API errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Search capability errors
    #[error("Search error: {0}")]
    Search(String),

    /// Content extraction errors
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed URLs
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience Result type for Quaero operations
pub type Result<T> = std::result::Result<T, QuaeroError>;

impl QuaeroError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a search error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(QuaeroError::llm("boom").to_string(), "LLM error: boom");
        assert_eq!(
            QuaeroError::fetch("HTTP 404").to_string(),
            "Fetch error: HTTP 404"
        );
    }

    #[test]
    fn test_url_error_conversion() {
        let err: QuaeroError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, QuaeroError::Url(_)));
    }
}
