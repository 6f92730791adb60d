//! Envelope dispatch for messages received from subscribers.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use vision_protocol::{now_timestamp, Envelope, MessageType, Payload};

use crate::hub::{ConnectionHub, ConnectionId};

/// Handles decoded messages and answers through the hub.
///
/// Malformed input is logged and dropped; unknown message types are ignored.
/// Nothing here can end a connection.
pub struct MessageHandler {
    hub: ConnectionHub,
    config: Arc<RwLock<Payload>>,
}

impl MessageHandler {
    pub fn new(hub: ConnectionHub, config: Payload) -> Self {
        Self {
            hub,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Current configuration snapshot.
    pub async fn config_snapshot(&self) -> Payload {
        self.config.read().await.clone()
    }

    /// Replace the configuration and push it to every live connection.
    /// Returns how many connections it was sent to.
    pub async fn publish_config(&self, config: Payload) -> usize {
        *self.config.write().await = config.clone();
        let sent = self.hub.broadcast(MessageType::Config, config).await;
        tracing::info!(connections = sent, "Configuration published");
        sent
    }

    /// Parse and dispatch one raw text frame from `connection_id`.
    pub async fn handle_message(&self, connection_id: ConnectionId, raw: &str) {
        let envelope = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(connection = %connection_id, error = %e, "Invalid JSON message");
                return;
            }
        };

        match envelope.message_type() {
            MessageType::ConfigRequest => {
                let snapshot = self.config_snapshot().await;
                self.hub.send(connection_id, MessageType::Config, snapshot).await;
            }
            MessageType::Inference => {
                self.handle_inference(connection_id, &envelope.payload).await;
            }
            other => {
                tracing::debug!(connection = %connection_id, message_type = %other, "Ignoring message");
            }
        }
    }

    /// Acknowledge an inference request.
    async fn handle_inference(&self, connection_id: ConnectionId, request: &Payload) {
        let model = request.get("model").cloned().unwrap_or(Value::Null);
        tracing::info!(connection = %connection_id, model = %model, "Inference request received");

        let mut response = Payload::new();
        response.insert("status".to_string(), Value::String("received".to_string()));
        response.insert("model".to_string(), model);
        response.insert("timestamp".to_string(), Value::String(now_timestamp()));

        self.hub
            .send(connection_id, MessageType::InferenceResponse, response)
            .await;
    }
}
