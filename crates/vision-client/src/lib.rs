//! Vision Plus Client
//!
//! Keeps one persistent WebSocket connection to the server, caches the
//! configuration it pushes, and resolves local inference requests against
//! that cache.
//!
//! This crate provides:
//! - Reconnecting subscriber with a fixed retry interval
//! - Recursive configuration cache
//! - Local inference stub driven by cached device lists

pub mod cache;
pub mod config;
pub mod error;
pub mod subscriber;

pub use cache::ConfigCache;
pub use config::ClientConfig;
pub use error::ClientError;
pub use subscriber::{ConnectionEvent, LocalInference, VisionClient};
