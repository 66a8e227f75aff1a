//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bytes are malformed or don't match any known message shape.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// A structurally valid message arrived where it isn't allowed
    /// (e.g. anything before `authenticate`).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
