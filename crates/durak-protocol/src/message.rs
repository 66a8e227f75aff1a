//! Message envelopes and the public projections they carry.
//!
//! Both enums are internally tagged (`{ "type": "join_room", ... }`) so the
//! client can switch on a single `type` field. The projections here are the
//! client-safe shapes: no connection handles, no other players' hands, no
//! face-down deck contents.

use serde::{Deserialize, Serialize};

use crate::types::{
    Card, GamePhase, PlayerId, RoomId, RoomStatus, Rules, Suit,
};

// ---------------------------------------------------------------------------
// Public projections
// ---------------------------------------------------------------------------

/// A player as other clients see them. `hand_count` replaces the actual
/// hand, which is only ever revealed to its owner via [`GameView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    pub connected: bool,
    pub hand_count: usize,
}

/// The public view of a room, broadcast in room events and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: RoomId,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: usize,
    pub rules: Rules,
    pub status: RoomStatus,
    /// Unix milliseconds at room creation.
    pub created_at: u64,
    pub host_id: PlayerId,
}

/// One attack on the table and its (optional) covering card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePair {
    pub attack: Card,
    pub defense: Option<Card>,
}

/// A seat in the running game, as visible to every participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub hand_count: usize,
}

/// One player's view of the game state. Each participant receives their
/// own: `your_hand` differs per recipient, everything else is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub room_id: RoomId,
    pub phase: GamePhase,
    pub players: Vec<SeatView>,
    pub your_hand: Vec<Card>,
    pub deck_count: usize,
    pub table: Vec<TablePair>,
    pub trump_card: Card,
    pub trump_suit: Suit,
    pub attacker_index: usize,
    pub defender_index: usize,
    pub turn: u32,
}

/// Readiness snapshot computed over *connected* players, broadcast after
/// every ready toggle and with the auto-start countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoStartInfo {
    pub ready_count: usize,
    pub total_connected: usize,
    pub all_ready: bool,
    pub can_start: bool,
    pub auto_starting: bool,
    pub countdown_ms: u64,
}

/// Coarse server counters, answered to `get_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub total_rooms: usize,
    pub waiting_rooms: usize,
    pub playing_rooms: usize,
    pub connected_clients: usize,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// `authenticate` must be the first message on a fresh connection; all
/// others are rejected until the identity assertion has been verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Present an identity assertion for verification. The assertion is
    /// opaque here; the configured identity provider interprets it.
    Authenticate { assertion: String },

    /// Create a room and auto-join it as host.
    CreateRoom { name: String, rules: Rules },

    /// Join a room, or reconnect to one we already belong to.
    JoinRoom { room_id: RoomId },

    /// Voluntarily leave the current room.
    LeaveRoom,

    /// Toggle our readiness flag.
    SetReady,

    /// Liveness refresh.
    Heartbeat,

    /// Request the current list of open rooms.
    GetRooms,

    /// Request server counters.
    GetStats,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Identity verified; echoes the caller's own player record.
    Authenticated { player: PlayerInfo },

    RoomCreated { room: RoomInfo },
    RoomJoined { room: RoomInfo },
    RoomLeft,

    /// Broadcast to a room when membership or readiness changes.
    PlayerJoined { room: RoomInfo },
    PlayerReconnected { player_id: PlayerId, room: RoomInfo },
    PlayerLeft { room: RoomInfo },
    PlayerDisconnected { player_id: PlayerId },
    PlayerReadyChanged { room: RoomInfo, info: AutoStartInfo },

    /// All connected players are ready; the game starts after the
    /// countdown unless someone un-readies or drops.
    AutoStartCountdown { info: AutoStartInfo },

    /// The game has started. `game` is the recipient's own view.
    GameStarted { room: RoomInfo, game: GameView },

    /// Current game view, sent on reconnection into a running game.
    GameState { game: GameView },

    RoomsList { rooms: Vec<RoomInfo> },
    ServerStats { stats: ServerStats },
    HeartbeatResponse { timestamp: u64 },

    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
