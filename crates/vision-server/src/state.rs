//! Application state for the Vision Plus server.
//!
//! This module defines the shared state passed to every WebSocket
//! connection via Axum's state management.

use std::sync::Arc;
use std::time::Duration;

use vision_automation::{AutomationEngine, ModelStepExecutor, SimulatedStepExecutor, StepExecutor};
use vision_models::ModelRegistry;
use vision_protocol::Payload;

use crate::config::{ServerConfig, StepMode};
use crate::handler::MessageHandler;
use crate::hub::ConnectionHub;

/// Shared application state.
///
/// Holds the messaging layer plus the model registry and automation engine,
/// so request/response services can be mounted next to the WebSocket route.
#[derive(Clone)]
pub struct AppState {
    /// Live connections
    pub hub: ConnectionHub,

    /// Envelope dispatch
    pub handler: Arc<MessageHandler>,

    /// Model registry
    pub models: Arc<ModelRegistry>,

    /// Workflow engine
    pub automation: Arc<AutomationEngine>,

    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build all core services from configuration.
    ///
    /// `model_config` is the snapshot answered to `config_request`.
    pub fn new(config: ServerConfig, model_config: Payload) -> Self {
        let hub = ConnectionHub::new();
        let handler = Arc::new(MessageHandler::new(hub.clone(), model_config));
        let models = Arc::new(ModelRegistry::new());

        let executor: Arc<dyn StepExecutor> = match config.step_mode {
            StepMode::Simulated => Arc::new(SimulatedStepExecutor::new(Duration::from_millis(
                config.step_delay_ms,
            ))),
            StepMode::Model => Arc::new(ModelStepExecutor::new(models.clone())),
        };

        Self {
            hub,
            handler,
            models,
            automation: Arc::new(AutomationEngine::new(executor)),
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_automation::{Step, TaskStatus};

    use crate::config::default_model_config;

    #[tokio::test]
    async fn test_model_step_mode_uses_registry() {
        let config = ServerConfig {
            step_mode: StepMode::Model,
            ..ServerConfig::default()
        };
        let state = AppState::new(config, default_model_config());

        let steps = vec![Step::named("segment").with("model", serde_json::json!("seg"))];
        let id = state.automation.create_workflow("segment", steps).await;

        assert!(!state.automation.execute_workflow(&id).await);
        assert!(state.models.load_model("segmentation", "seg").await);
        assert!(state.automation.execute_workflow(&id).await);

        let tasks = state.automation.list_active_tasks().await;
        let last = state.automation.get_task_status(&tasks[1]).await.into_option().unwrap();
        assert_eq!(last.status, TaskStatus::Completed);
    }

    #[test]
    fn test_state_defaults() {
        let state = AppState::new(ServerConfig::default(), default_model_config());
        assert_eq!(state.config.port, 8765);
        assert_eq!(state.uptime_seconds(), 0);
    }
}
