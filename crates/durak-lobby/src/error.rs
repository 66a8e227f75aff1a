//! Error types for the lobby layer.

use durak_protocol::{PlayerId, RoomId};

/// Validation failures for room operations. None of these mutate state;
/// the boundary layer answers them with an `error` reply and the
/// connection stays open.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The room does not exist.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Every slot is occupied.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The game has already started, so new players can't join.
    #[error("game in room {0} has already started")]
    AlreadyStarted(RoomId),

    /// The player is already a member of another room.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The requested rules cannot seat anyone. A room needs at least one
    /// slot for its host; undersized-but-nonzero rooms are allowed (they
    /// exist, they just never start).
    #[error("max players must be at least 1, got {0}")]
    InvalidMaxPlayers(usize),
}
