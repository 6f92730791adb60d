//! Vision Plus wire protocol.
//!
//! Every message exchanged between the server and its subscribers is a JSON
//! envelope of the shape:
//!
//! ```json
//! { "type": "config_request", "payload": {}, "timestamp": "2026-01-01T00:00:00.000000Z" }
//! ```
//!
//! This crate provides:
//! - [`Envelope`] with encode/decode helpers
//! - [`MessageType`] for dispatching on the `type` field
//! - [`ProtocolError`] for codec failures

pub mod envelope;
pub mod error;

pub use envelope::{now_timestamp, Envelope, MessageType, Payload};
pub use error::ProtocolError;
