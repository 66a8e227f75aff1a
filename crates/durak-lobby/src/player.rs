//! The per-room player record.

use std::time::{SystemTime, UNIX_EPOCH};

use durak_protocol::{Card, PlayerId, PlayerInfo};

/// A player as a room tracks them. Created on first join, mutated by
/// ready toggles and connectivity changes, removed only on explicit
/// leave or room deletion — an abrupt disconnect keeps the record (and
/// the seat) alive for the grace window.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    pub connected: bool,
    /// Unix milliseconds of the last heartbeat or connectivity change.
    pub last_seen: u64,
    /// Empty until the game starts.
    pub hand: Vec<Card>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ready: false,
            connected: true,
            last_seen: unix_ms(),
            hand: Vec::new(),
        }
    }

    /// Client-safe projection: the hand collapses to a count.
    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            ready: self.ready,
            connected: self.connected,
            hand_count: self.hand.len(),
        }
    }
}

/// Wall-clock now in unix milliseconds.
pub(crate) fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
