//! Step execution error types.

use thiserror::Error;

/// Failure signalled by a step. The display string is recorded on the task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepError {
    /// Step ran but did not succeed.
    #[error("Step failed: {0}")]
    Failed(String),

    /// Step references a model that is not registered.
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Step descriptor is unusable.
    #[error("Invalid step: {0}")]
    Invalid(String),
}
