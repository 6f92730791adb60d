//! Reconnecting WebSocket subscriber.

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use vision_protocol::{now_timestamp, Envelope, MessageType, Payload};

use crate::cache::ConfigCache;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Connection lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Connection established and `config_request` sent.
    Connected,
    /// Session ended, cleanly or not.
    Disconnected { reason: String },
    /// About to wait before the next attempt.
    Reconnecting { delay: Duration },
}

/// Result of a locally dispatched inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalInference {
    pub status: String,
    pub model: String,
    pub device: String,
    pub timestamp: String,
}

/// Client that keeps a single connection to the server alive.
///
/// Retries forever with a fixed delay; the only way to stop it is to drop
/// or abort the task running [`VisionClient::run`].
pub struct VisionClient {
    config: ClientConfig,
    cache: RwLock<ConfigCache>,
    connected: AtomicBool,
    events: broadcast::Sender<ConnectionEvent>,
}

impl VisionClient {
    pub fn new(config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            config,
            cache: RwLock::new(ConfigCache::new()),
            connected: AtomicBool::new(false),
            events,
        }
    }

    /// Whether a session is currently open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Receive connection lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the cached server configuration.
    pub async fn cached_config(&self) -> Payload {
        self.cache.read().await.values().clone()
    }

    fn emit(&self, event: ConnectionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Connect and keep reconnecting. Never returns.
    pub async fn run(&self) {
        let delay = self.config.reconnect_delay;

        loop {
            let reason = match self.run_session().await {
                Ok(()) => {
                    tracing::warn!(uri = %self.config.server_uri, "Connection closed");
                    "connection closed".to_string()
                }
                Err(e) => {
                    tracing::error!(uri = %self.config.server_uri, error = %e, "Connection failed");
                    e.to_string()
                }
            };

            self.connected.store(false, Ordering::SeqCst);
            self.emit(ConnectionEvent::Disconnected { reason });

            tracing::info!(delay_secs = delay.as_secs(), "Attempting to reconnect");
            self.emit(ConnectionEvent::Reconnecting { delay });
            tokio::time::sleep(delay).await;
        }
    }

    /// One connection attempt: connect, request config, then process
    /// messages until the server goes away.
    async fn run_session(&self) -> Result<(), ClientError> {
        let (socket, _) = connect_async(self.config.server_uri.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(
            uri = %self.config.server_uri,
            client_id = %self.config.client_id,
            "Connected to Vision Plus server"
        );
        self.emit(ConnectionEvent::Connected);

        let request = Envelope::new(MessageType::ConfigRequest, Payload::new()).encode()?;
        sink.send(Message::text(request)).await?;

        while let Some(frame) = stream.next().await {
            match frame? {
                Message::Text(text) => self.handle_message(text.as_str()).await,
                Message::Close(_) => break,
                _ => {}
            }
        }

        Ok(())
    }

    /// Parse and dispatch one raw text frame.
    pub async fn handle_message(&self, raw: &str) {
        let envelope = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(error = %e, "Invalid JSON message");
                return;
            }
        };

        match envelope.message_type() {
            MessageType::Config => {
                self.cache.write().await.merge(envelope.payload);
                tracing::info!("Configuration updated");
            }
            MessageType::Inference => {
                self.process_inference(&envelope.payload).await;
            }
            MessageType::Status => {
                tracing::info!(status = %serde_json::Value::Object(envelope.payload), "Status update");
            }
            other => {
                tracing::debug!(message_type = %other, "Ignoring message");
            }
        }
    }

    /// Run a requested inference if the model is in the cached configuration.
    ///
    /// Requests for models missing from the cache are dropped without a log
    /// line or reply.
    pub async fn process_inference(&self, payload: &Payload) -> Option<LocalInference> {
        let model = payload.get("model").and_then(Value::as_str)?;
        if !self.cache.read().await.has_model(model) {
            return None;
        }

        tracing::info!(model = %model, "Processing inference request");
        match self.run_inference(payload).await {
            Ok(result) => {
                tracing::info!(model = %result.model, device = %result.device, "Inference completed");
                Some(result)
            }
            Err(e) => {
                tracing::error!(model = %model, error = %e, "Inference failed");
                None
            }
        }
    }

    /// Build an inference result on the first cached device for the model.
    pub async fn run_inference(&self, payload: &Payload) -> Result<LocalInference, ClientError> {
        let model = payload
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Config("inference request has no model".to_string()))?;

        let cache = self.cache.read().await;
        let device = cache
            .first_device(model)
            .ok_or_else(|| ClientError::Config(format!("no device configured for {}", model)))?;

        Ok(LocalInference {
            status: "success".to_string(),
            model: model.to_string(),
            device: device.to_string(),
            timestamp: now_timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn client() -> VisionClient {
        VisionClient::new(ClientConfig::default())
    }

    #[tokio::test]
    async fn test_config_pushes_are_merged() {
        let client = client();

        client
            .handle_message(r#"{"type":"config","payload":{"models":{"x":1}}}"#)
            .await;
        client
            .handle_message(r#"{"type":"config","payload":{"models":{"y":2}}}"#)
            .await;

        let config = client.cached_config().await;
        assert_eq!(config["models"], json!({"x": 1, "y": 2}));
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped() {
        let client = client();
        client.handle_message("not json at all").await;
        client.handle_message(r#"{"type":"status","payload":{"fps":30}}"#).await;
        client.handle_message(r#"{"type":"mystery"}"#).await;

        assert!(client.cached_config().await.is_empty());
    }

    #[tokio::test]
    async fn test_inference_uses_first_cached_device() {
        let client = client();
        client
            .handle_message(
                r#"{"type":"config","payload":{"models":{"segmentation":{"enabled":true,"config":{"device":["cuda","cpu","mps"],"models":{}}}}}}"#,
            )
            .await;

        let result = client
            .process_inference(&payload(json!({"model": "segmentation"})))
            .await
            .unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(result.model, "segmentation");
        assert_eq!(result.device, "cuda");
    }

    #[tokio::test]
    async fn test_inference_for_unknown_model_is_ignored() {
        let client = client();
        client
            .handle_message(r#"{"type":"config","payload":{"models":{"segmentation":{}}}}"#)
            .await;

        assert!(client
            .process_inference(&payload(json!({"model": "depth"})))
            .await
            .is_none());
        assert!(client.process_inference(&Payload::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_inference_without_device_list_fails() {
        let client = client();
        client
            .handle_message(r#"{"type":"config","payload":{"models":{"segmentation":{}}}}"#)
            .await;

        let request = payload(json!({"model": "segmentation"}));
        assert!(client.process_inference(&request).await.is_none());
        assert!(matches!(
            client.run_inference(&request).await,
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_starts_disconnected() {
        assert!(!client().is_connected());
    }
}
