//! Server configuration.

use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

use vision_protocol::Payload;

use crate::error::{ServerError, ServerResult};

/// How workflow steps are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Log and wait `step_delay_ms` per step.
    Simulated,
    /// Dispatch steps with a `model` key to the model registry.
    Model,
}

/// Server configuration loaded from environment variables.
///
/// Environment variables are prefixed with `VISION_`:
/// - `VISION_HOST`: Bind address (default: "localhost")
/// - `VISION_PORT`: WebSocket port (default: 8765)
/// - `VISION_MODEL_CONFIG`: JSON file with the configuration pushed to clients
/// - `VISION_STEP_MODE`: `simulated` or `model` (default: simulated)
/// - `VISION_STEP_DELAY_MS`: Simulated step duration (default: 1000)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the model configuration snapshot
    #[serde(default)]
    pub model_config: Option<PathBuf>,

    /// Step execution strategy
    #[serde(default = "default_step_mode")]
    pub step_mode: StepMode,

    /// Simulated step duration in milliseconds
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_step_mode() -> StepMode {
    StepMode::Simulated
}

fn default_step_delay_ms() -> u64 {
    1000
}

/// Configuration pushed to clients when no file is configured.
pub fn default_model_config() -> Payload {
    let value = json!({
        "models": {
            "segmentation": {
                "enabled": true,
                "config": {
                    "device": ["cuda", "cpu", "mps"],
                    "models": {}
                }
            }
        }
    });

    match value {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("VISION_").from_env::<ServerConfig>()
    }

    /// Address suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configuration snapshot served to clients.
    pub fn load_model_config(&self) -> ServerResult<Payload> {
        let Some(ref path) = self.model_config else {
            return Ok(default_model_config());
        };

        let raw = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(ServerError::ModelConfig(format!(
                "{} must contain a JSON object",
                path.display()
            ))),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_config: None,
            step_mode: default_step_mode(),
            step_delay_ms: default_step_delay_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8765);
        assert_eq!(config.step_mode, StepMode::Simulated);
        assert_eq!(config.bind_address(), "localhost:8765");
    }

    #[test]
    fn test_default_model_config_lists_devices() {
        let config = tokio_test::assert_ok!(ServerConfig::default().load_model_config());
        let devices = &config["models"]["segmentation"]["config"]["device"];
        assert_eq!(devices, &json!(["cuda", "cpu", "mps"]));
    }

    #[test]
    fn test_model_config_from_file() {
        let path = std::env::temp_dir().join(format!("vision-model-config-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"models": {{"depth": {{"enabled": false}}}}}}"#).unwrap();

        let config = ServerConfig {
            model_config: Some(path.clone()),
            ..ServerConfig::default()
        };
        let loaded = config.load_model_config().unwrap();
        assert_eq!(loaded["models"]["depth"]["enabled"], json!(false));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_model_config_must_be_object() {
        let path = std::env::temp_dir().join(format!("vision-model-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let config = ServerConfig {
            model_config: Some(path.clone()),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.load_model_config(),
            Err(ServerError::ModelConfig(_))
        ));

        std::fs::remove_file(path).unwrap();
    }
}
