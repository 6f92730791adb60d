//! Model registry error types.

use thiserror::Error;

/// Errors raised by model loading and inference.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model is not registered.
    #[error("Model not loaded: {0}")]
    NotLoaded(String),

    /// The load procedure rejected the model.
    #[error("Failed to load model {name}: {reason}")]
    LoadFailed { name: String, reason: String },

    /// Inference could not be completed.
    #[error("Inference failed: {0}")]
    Inference(String),
}
