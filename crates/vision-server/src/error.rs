//! Error types for the Vision Plus server.

use thiserror::Error;

/// Server-level errors. Only raised during startup; the message loop never
/// propagates faults.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Environment configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model configuration file could not be used
    #[error("Model configuration error: {0}")]
    ModelConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ServerError.
pub type ServerResult<T> = Result<T, ServerError>;

impl From<envy::Error> for ServerError {
    fn from(err: envy::Error) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ModelConfig(err.to_string())
    }
}
