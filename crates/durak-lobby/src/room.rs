//! One session's container: players, slots, connections, status.

use std::collections::HashMap;

use durak_game::GameState;
use durak_protocol::{
    AutoStartInfo, PlayerId, RoomId, RoomInfo, RoomStatus, Rules,
    ServerMessage,
};
use tokio::sync::mpsc;

use crate::player::{Player, unix_ms};

/// The connection handle a room holds per member: an unbounded channel
/// whose receiving end is drained by that player's connection task.
/// Sending never blocks; a closed receiver just means the player is gone.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

/// A single game session.
///
/// Owns the player records exclusively once they join. Seating is a slot
/// array indexed `[0, max_players)`: clients get a stable layout
/// independent of join order, and a seat survives disconnection — only an
/// explicit leave (or room deletion) frees it.
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub rules: Rules,
    pub status: RoomStatus,
    pub host_id: PlayerId,
    /// Unix milliseconds at creation.
    pub created_at: u64,
    pub game: Option<GameState>,
    players: HashMap<PlayerId, Player>,
    senders: HashMap<PlayerId, OutboundSender>,
    slots: Vec<Option<PlayerId>>,
}

impl Room {
    pub fn new(id: RoomId, name: String, rules: Rules, host_id: PlayerId) -> Self {
        Self {
            id,
            name,
            rules,
            status: RoomStatus::Waiting,
            host_id,
            created_at: unix_ms(),
            game: None,
            players: HashMap::new(),
            senders: HashMap::new(),
            slots: vec![None; rules.max_players],
        }
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Seats a new player at the lowest free slot. Returns the slot
    /// index, or `None` if every slot is occupied. The player map and
    /// slot array are updated together; callers never observe one
    /// without the other.
    pub fn add_player(&mut self, player: Player, sender: OutboundSender) -> Option<usize> {
        if self.players.len() >= self.rules.max_players {
            return None;
        }
        let slot = self.slots.iter().position(Option::is_none)?;
        self.slots[slot] = Some(player.id.clone());
        self.senders.insert(player.id.clone(), sender);
        self.players.insert(player.id.clone(), player);
        Some(slot)
    }

    /// Removes a player entirely and frees their slot. Explicit-leave
    /// path only; disconnects go through [`Room::disconnect_player`].
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<Player> {
        let player = self.players.remove(player_id)?;
        self.senders.remove(player_id);
        if let Some(slot) = self.slot_of(player_id) {
            self.slots[slot] = None;
        }
        Some(player)
    }

    /// Marks a player unreachable. Touches connectivity metadata only —
    /// the record and the seat stay.
    pub fn disconnect_player(&mut self, player_id: &PlayerId) {
        if let Some(player) = self.players.get_mut(player_id) {
            player.connected = false;
            player.last_seen = unix_ms();
            self.senders.remove(player_id);
        }
    }

    /// Restores connectivity and swaps in the new connection handle.
    /// Seating is untouched: reconnection must not reshuffle the table.
    pub fn reconnect_player(&mut self, player_id: &PlayerId, sender: OutboundSender) {
        if let Some(player) = self.players.get_mut(player_id) {
            player.connected = true;
            player.last_seen = unix_ms();
            self.senders.insert(player_id.clone(), sender);
        }
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn player_mut(&mut self, player_id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn slot_of(&self, player_id: &PlayerId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref() == Some(player_id))
    }

    /// Players in seating order (slot order, occupied seats only).
    pub fn seated_players(&self) -> impl Iterator<Item = &Player> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|id| self.players.get(id))
    }

    /// Connected players in seating order.
    pub fn connected_players(&self) -> Vec<&Player> {
        self.seated_players().filter(|p| p.connected).collect()
    }

    // -----------------------------------------------------------------
    // Readiness
    // -----------------------------------------------------------------

    /// Readiness snapshot over *connected* players only. A disconnected
    /// player's stale ready flag must not hold up (or trigger) a start.
    pub fn readiness(&self) -> AutoStartInfo {
        let connected = self.connected_players();
        let ready_count = connected.iter().filter(|p| p.ready).count();
        let total_connected = connected.len();
        let all_ready = total_connected > 0 && ready_count == total_connected;
        AutoStartInfo {
            ready_count,
            total_connected,
            all_ready,
            can_start: total_connected >= 2 && all_ready,
            auto_starting: false,
            countdown_ms: 0,
        }
    }

    // -----------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------

    /// Sends to every member with a live connection handle. A failed
    /// send is logged and skipped; it never aborts delivery to the rest.
    pub fn broadcast(&self, message: &ServerMessage, exclude: Option<&PlayerId>) {
        for (player_id, sender) in &self.senders {
            if Some(player_id) == exclude {
                continue;
            }
            if sender.send(message.clone()).is_err() {
                tracing::warn!(
                    room_id = %self.id,
                    %player_id,
                    "dropping broadcast to closed connection"
                );
            }
        }
    }

    /// Sends to a single member, if they have a live connection.
    pub fn send_to(&self, player_id: &PlayerId, message: ServerMessage) {
        if let Some(sender) = self.senders.get(player_id) {
            if sender.send(message).is_err() {
                tracing::warn!(
                    room_id = %self.id,
                    %player_id,
                    "dropping send to closed connection"
                );
            }
        }
    }

    /// The client-safe projection: no connection handles, no hands, no
    /// deck. Players appear in seating order.
    pub fn to_public_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self.seated_players().map(Player::to_info).collect(),
            max_players: self.rules.max_players,
            rules: self.rules,
            status: self.status,
            created_at: self.created_at,
            host_id: self.host_id.clone(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use durak_protocol::{CardCount, GameMode, ThrowingMode};

    fn rules(max_players: usize) -> Rules {
        Rules {
            game_mode: GameMode::Classic,
            throwing_mode: ThrowingMode::Standard,
            card_count: CardCount::ThirtySix,
            max_players,
        }
    }

    fn room(max_players: usize) -> Room {
        Room::new(RoomId(1), "table".into(), rules(max_players), pid("host"))
    }

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    fn sender() -> OutboundSender {
        mpsc::unbounded_channel().0
    }

    fn join(room: &mut Room, id: &str) -> Option<usize> {
        room.add_player(Player::new(pid(id), id.to_uppercase()), sender())
    }

    #[test]
    fn test_add_player_fills_slots_in_order() {
        let mut room = room(3);
        assert_eq!(join(&mut room, "a"), Some(0));
        assert_eq!(join(&mut room, "b"), Some(1));
        assert_eq!(join(&mut room, "c"), Some(2));
        assert_eq!(join(&mut room, "d"), None);
    }

    #[test]
    fn test_remove_player_frees_the_same_slot() {
        let mut room = room(3);
        join(&mut room, "a");
        join(&mut room, "b");

        room.remove_player(&pid("a"));
        assert_eq!(room.player_count(), 1);
        assert_eq!(room.slot_of(&pid("b")), Some(1));

        // The freed slot is reused by the next join.
        assert_eq!(join(&mut room, "c"), Some(0));
    }

    #[test]
    fn test_disconnect_keeps_record_and_slot() {
        let mut room = room(2);
        join(&mut room, "a");
        join(&mut room, "b");

        room.disconnect_player(&pid("a"));

        let p = room.player(&pid("a")).unwrap();
        assert!(!p.connected);
        assert_eq!(room.slot_of(&pid("a")), Some(0));
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn test_reconnect_restores_connectivity_without_moving_seats() {
        let mut room = room(2);
        join(&mut room, "a");
        join(&mut room, "b");
        room.disconnect_player(&pid("a"));

        room.reconnect_player(&pid("a"), sender());

        assert!(room.player(&pid("a")).unwrap().connected);
        assert_eq!(room.slot_of(&pid("a")), Some(0));
        assert_eq!(room.slot_of(&pid("b")), Some(1));
    }

    #[test]
    fn test_readiness_counts_connected_players_only() {
        let mut room = room(3);
        join(&mut room, "a");
        join(&mut room, "b");
        join(&mut room, "c");
        room.player_mut(&pid("a")).unwrap().ready = true;
        room.player_mut(&pid("b")).unwrap().ready = true;
        room.player_mut(&pid("c")).unwrap().ready = true;
        room.disconnect_player(&pid("c"));

        let info = room.readiness();
        assert_eq!(info.total_connected, 2);
        assert_eq!(info.ready_count, 2);
        assert!(info.all_ready);
        assert!(info.can_start);
    }

    #[test]
    fn test_readiness_requires_two_connected_players() {
        let mut room = room(4);
        join(&mut room, "a");
        room.player_mut(&pid("a")).unwrap().ready = true;

        let info = room.readiness();
        assert!(info.all_ready);
        assert!(!info.can_start);
    }

    #[test]
    fn test_readiness_never_starts_below_two_slots() {
        // A room capped below 2 players can never meet the precondition.
        let mut room = room(1);
        join(&mut room, "a");
        room.player_mut(&pid("a")).unwrap().ready = true;
        assert!(!room.readiness().can_start);
    }

    #[test]
    fn test_broadcast_skips_closed_connections() {
        let mut room = room(3);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        room.add_player(Player::new(pid("a"), "A"), tx_a);
        room.add_player(Player::new(pid("b"), "B"), tx_b);
        drop(rx_b); // b's connection is gone

        room.broadcast(&ServerMessage::RoomLeft, None);

        // a still got the message even though sending to b failed.
        assert!(rx_a.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_excludes_requested_player() {
        let mut room = room(3);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        room.add_player(Player::new(pid("a"), "A"), tx_a);
        room.add_player(Player::new(pid("b"), "B"), tx_b);

        room.broadcast(&ServerMessage::RoomLeft, Some(&pid("a")));

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_to_public_info_lists_players_in_seat_order() {
        let mut room = room(3);
        join(&mut room, "a");
        join(&mut room, "b");
        room.remove_player(&pid("a"));
        join(&mut room, "c"); // takes slot 0

        let info = room.to_public_info();
        assert_eq!(info.players.len(), 2);
        assert_eq!(info.players[0].id, pid("c"));
        assert_eq!(info.players[1].id, pid("b"));
        assert_eq!(info.status, RoomStatus::Waiting);
        assert_eq!(info.host_id, pid("host"));
    }
}
