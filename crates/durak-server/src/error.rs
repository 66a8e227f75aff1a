//! Unified error type for the server boundary.

use durak_lobby::LobbyError;
use durak_protocol::ProtocolError;

use crate::identity::IdentityError;

/// Top-level error wrapping every layer a connection can fail in. The
/// `#[from]` impls let handler code use `?` across layer boundaries.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Encode/decode failure at the protocol layer.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation was rejected.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// An identity assertion failed verification.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// WebSocket-level failure (handshake, framing, closed mid-send).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Socket-level failure (bind, accept).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use durak_protocol::RoomId;

    #[test]
    fn test_from_lobby_error() {
        let err = LobbyError::RoomNotFound(RoomId(3));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Lobby(_)));
        assert!(server_err.to_string().contains("R-3"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Protocol(_)));
    }

    #[test]
    fn test_from_identity_error() {
        let err = IdentityError("expired".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Identity(_)));
        assert!(server_err.to_string().contains("expired"));
    }
}
