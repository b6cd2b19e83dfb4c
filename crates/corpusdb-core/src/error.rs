//! Error types for the CorpusDB crates

use thiserror::Error;

/// Result type alias for CorpusDB operations
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Main error type for the CorpusDB client
#[derive(Error, Debug, Clone)]
pub enum CorpusError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache backend errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Persisted cache data could not be reconstructed from its stored form.
    /// Surfaced to the caller rather than treated as absent.
    #[error("Cache decode error for key '{key}': {message}")]
    Decode { key: String, message: String },

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors (rejected or missing bearer token)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Backend resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl CorpusError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }

    /// Create a new cache decode error
    pub fn decode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new HTTP error
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http(message.into())
    }

    /// Create a new authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a new not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<anyhow::Error> for CorpusError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<std::io::Error> for CorpusError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for CorpusError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}
