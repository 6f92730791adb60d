//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Incoming text is not a valid envelope.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Envelope could not be serialized.
    #[error("Encode error: {0}")]
    Encode(String),
}
