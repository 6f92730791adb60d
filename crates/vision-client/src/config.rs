//! Client configuration.

use std::time::Duration;
use anyhow::Result;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Unique client identifier (UUID).
    pub client_id: String,

    /// Server WebSocket URI.
    pub server_uri: String,

    /// Fixed delay between connection attempts.
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("VISION_CLIENT_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let server_uri = std::env::var("VISION_SERVER_URI")
            .unwrap_or_else(|_| "ws://localhost:8765".to_string());

        let reconnect_secs: u64 = std::env::var("VISION_RECONNECT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            client_id,
            server_uri,
            reconnect_delay: Duration::from_secs(reconnect_secs),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            server_uri: "ws://localhost:8765".to_string(),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}
