//! Connection hub for managing live WebSocket subscribers.
//!
//! Each connection is identified by a generated handle and owns an outbound
//! channel drained by its writer task. The hub keeps membership only.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use vision_protocol::{Envelope, MessageType, Payload};

/// Transport handle for one connection.
pub type ConnectionId = Uuid;

/// Outbound channel feeding a connection's writer task.
pub type EnvelopeSender = mpsc::UnboundedSender<Envelope>;

/// Registry of currently open connections.
#[derive(Clone, Default)]
pub struct ConnectionHub {
    connections: Arc<RwLock<HashMap<ConnectionId, EnvelopeSender>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the live set. Returns the new total.
    pub async fn register(&self, connection_id: ConnectionId, sender: EnvelopeSender) -> usize {
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, sender);
        let total = connections.len();

        tracing::info!(connection = %connection_id, total, "Client connected");
        total
    }

    /// Remove a connection from the live set. Returns the new total.
    pub async fn unregister(&self, connection_id: ConnectionId) -> usize {
        let mut connections = self.connections.write().await;
        connections.remove(&connection_id);
        let total = connections.len();

        tracing::info!(connection = %connection_id, total, "Client disconnected");
        total
    }

    /// Wrap `payload` in an envelope and queue it for exactly one connection.
    ///
    /// Returns `false` if the connection is not (or no longer) open.
    pub async fn send(
        &self,
        connection_id: ConnectionId,
        message_type: MessageType,
        payload: Payload,
    ) -> bool {
        let connections = self.connections.read().await;
        let Some(sender) = connections.get(&connection_id) else {
            tracing::debug!(connection = %connection_id, "Send to unknown connection");
            return false;
        };

        let envelope = Envelope::new(message_type, payload);
        if sender.send(envelope).is_ok() {
            tracing::debug!(connection = %connection_id, "Message queued");
            true
        } else {
            false
        }
    }

    /// Send the same message to every live connection. Returns how many
    /// connections accepted it.
    pub async fn broadcast(&self, message_type: MessageType, payload: Payload) -> usize {
        let envelope = Envelope::new(message_type, payload);
        let connections = self.connections.read().await;

        let mut sent = 0;
        for (connection_id, sender) in connections.iter() {
            if sender.send(envelope.clone()).is_ok() {
                sent += 1;
            } else {
                tracing::debug!(connection = %connection_id, "Broadcast failed for connection");
            }
        }
        sent
    }

    /// Check if a connection is registered.
    pub async fn is_connected(&self, connection_id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&connection_id)
    }

    /// Get total connection count.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
