//! Step execution capabilities.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use vision_models::ModelRegistry;

use crate::error::StepError;
use crate::types::Step;

/// Executes one workflow step on behalf of a task.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Run `step` to completion, or return the failure that stops the task.
    async fn execute(&self, step: &Step, task_id: &str) -> Result<(), StepError>;
}

/// Placeholder executor that logs the step and waits a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedStepExecutor {
    delay: Duration,
}

impl SimulatedStepExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedStepExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl StepExecutor for SimulatedStepExecutor {
    async fn execute(&self, step: &Step, task_id: &str) -> Result<(), StepError> {
        tracing::info!(
            step = step.name().unwrap_or("<unnamed>"),
            task_id = %task_id,
            "Executing step"
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Dispatches steps carrying a `model` key to the model registry.
///
/// `data` (optional) is forwarded as the inference input. Steps without a
/// `model` key complete immediately.
pub struct ModelStepExecutor {
    registry: Arc<ModelRegistry>,
}

impl ModelStepExecutor {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl StepExecutor for ModelStepExecutor {
    async fn execute(&self, step: &Step, task_id: &str) -> Result<(), StepError> {
        let model = match step.get("model") {
            None => {
                tracing::debug!(step = step.name().unwrap_or("<unnamed>"), "No model for step");
                return Ok(());
            }
            Some(Value::String(model)) => model,
            Some(other) => {
                return Err(StepError::Invalid(format!("model must be a string, got {}", other)))
            }
        };

        let data = step.get("data").cloned().unwrap_or_else(|| Value::Object(Default::default()));

        let result = self
            .registry
            .run_inference(model, &data)
            .await
            .ok_or_else(|| StepError::ModelNotLoaded(model.clone()))?;

        tracing::info!(
            step = step.name().unwrap_or("<unnamed>"),
            task_id = %task_id,
            model = %result.model,
            device = %result.device,
            "Model step completed"
        );

        Ok(())
    }
}
