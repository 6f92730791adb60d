//! Client error types.

use thiserror::Error;
use vision_protocol::ProtocolError;

/// Errors that can end a connection session or a local inference.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connect, read or write failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Envelope encode/decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Cached configuration lacks a required entry.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Config("no device list for seg".to_string());
        assert_eq!(err.to_string(), "Configuration error: no device list for seg");

        let err: ClientError = ProtocolError::Malformed("eof".to_string()).into();
        assert_eq!(err.to_string(), "Malformed message: eof");
    }

    #[test]
    fn test_error_from_transport() {
        let err: ClientError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
