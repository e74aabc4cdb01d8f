//! Error types for hdev

use hdev_session::StorageError;
use thiserror::Error;

/// Result type alias for hdev operations
pub type HdevResult<T> = Result<T, HdevError>;

/// Main error type for hdev
#[derive(Error, Debug, Clone)]
pub enum HdevError {
    /// Transport failure talking to the model API
    #[error("Model API error: {0}")]
    ModelApi(String),

    /// Token counting call failed
    #[error("Token counting error: {0}")]
    TokenCounting(String),

    /// Summary generation failed or produced nothing
    #[error("Summarization error: {0}")]
    Summarization(String),

    /// Session could not be saved or loaded
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl HdevError {
    /// Create a new model API error
    pub fn model_api(message: impl Into<String>) -> Self {
        Self::ModelApi(message.into())
    }

    /// Create a new token counting error
    pub fn token_counting(message: impl Into<String>) -> Self {
        Self::TokenCounting(message.into())
    }

    /// Create a new summarization error
    pub fn summarization(message: impl Into<String>) -> Self {
        Self::Summarization(message.into())
    }

    /// Create a new persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Transient failures worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HdevError::ModelApi(_)
                | HdevError::TokenCounting(_)
                | HdevError::Summarization(_)
                | HdevError::Persistence(_)
                | HdevError::Io(_)
        )
    }
}

impl From<std::io::Error> for HdevError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HdevError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<StorageError> for HdevError {
    fn from(err: StorageError) -> Self {
        Self::Persistence(err.to_string())
    }
}
