//! Wire protocol for the Durak session server.
//!
//! Everything in this crate travels over the WebSocket connection between
//! client and server: identifiers, cards, rules, the public projections of
//! rooms and game state, and the tagged message envelopes themselves.
//!
//! Messages are JSON objects of the form `{ "type": "...", ...fields }`
//! (internally tagged serde enums with snake_case tags), matching what the
//! browser client speaks.

mod codec;
mod error;
mod message;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{
    AutoStartInfo, ClientMessage, GameView, PlayerInfo, RoomInfo, SeatView,
    ServerMessage, ServerStats, TablePair,
};
pub use types::{
    Card, CardCount, ConnectionId, GameMode, GamePhase, PlayerId, Rank,
    RoomId, RoomStatus, Rules, Suit, ThrowingMode,
};
