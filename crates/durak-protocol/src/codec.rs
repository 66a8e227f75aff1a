//! Codec seam between typed messages and raw connection bytes.
//!
//! The boundary layer doesn't care how messages are serialized; it only
//! needs something implementing [`Codec`]. [`JsonCodec`] is the wire
//! format the browser client speaks. A binary codec could be swapped in
//! without touching the lobby or handler code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes typed values to bytes and decodes bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON codec via `serde_json`. Human-readable, which keeps the protocol
/// debuggable from browser devtools.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientMessage, RoomId};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let msg = ClientMessage::JoinRoom { room_id: RoomId(12) };
        let bytes = codec.encode(&msg).unwrap();
        let back: ClientMessage = codec.decode(&bytes).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_json_codec_decode_garbage_fails() {
        let codec = JsonCodec;
        let result: Result<ClientMessage, _> = codec.decode(b"not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_decode_wrong_shape_fails() {
        let codec = JsonCodec;
        let result: Result<ClientMessage, _> =
            codec.decode(br#"{"kind":"join_room"}"#);
        assert!(result.is_err());
    }
}
