//! WebSocket transport.
//!
//! Clients connect to `GET /` and exchange JSON envelopes as text frames.
//! Every connection runs a writer task draining its hub channel and a reader
//! task feeding the [`MessageHandler`](crate::MessageHandler).

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use vision_protocol::Envelope;

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "connections": state.hub.connection_count().await,
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// WebSocket upgrade endpoint.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection from registration to cleanup.
///
/// The reader loop runs in its own task and is awaited here, so `unregister`
/// executes exactly once whether the peer closes cleanly, the transport
/// errors, or the loop panics.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
    state.hub.register(connection_id, tx).await;

    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let text = match envelope.encode() {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(connection = %connection_id, error = %e, "Dropping unencodable message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let handler = state.handler.clone();
    let reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => handler.handle_message(connection_id, text.as_str()).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(connection = %connection_id, error = %e, "Connection error");
                    break;
                }
            }
        }
    });

    if let Err(e) = reader.await {
        tracing::error!(connection = %connection_id, error = %e, "Connection loop aborted");
    }

    state.hub.unregister(connection_id).await;

    // The hub held the only sender, so the writer drains and exits.
    let _ = writer.await;
}
