//! Vision Plus server library.
//!
//! Hosts the real-time messaging layer and owns the core services:
//!
//! - **Connection hub**: live set of WebSocket subscribers, unicast and broadcast
//! - **Message handler**: envelope dispatch (`config_request`, `inference`)
//! - **WebSocket endpoint**: per-connection reader/writer tasks with guaranteed cleanup
//! - **AppState**: model registry and automation engine for embedding services
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`error`]: Server error types
//! - [`handler`]: Message dispatch
//! - [`hub`]: Connection registry
//! - [`state`]: Shared application state
//! - [`ws`]: WebSocket transport and router

pub mod config;
pub mod error;
pub mod handler;
pub mod hub;
pub mod result_ext;
pub mod state;
pub mod ws;

pub use config::{ServerConfig, StepMode};
pub use error::{ServerError, ServerResult};
pub use handler::MessageHandler;
pub use hub::{ConnectionHub, ConnectionId};
pub use result_ext::ResultExt;
pub use state::AppState;
pub use ws::build_router;
