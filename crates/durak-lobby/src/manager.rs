//! The room registry: creates, tracks, and mutates rooms.
//!
//! `RoomManager` is the synchronous single-writer core. It never blocks
//! and never sleeps; everything time-based (auto-start commit, eviction)
//! lives in [`crate::Lobby`], which calls back into the revalidating
//! entry points here ([`RoomManager::commit_auto_start`],
//! [`RoomManager::try_evict`]) when a timer fires.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use durak_protocol::{
    AutoStartInfo, ConnectionId, PlayerId, RoomId, RoomInfo, RoomStatus,
    ServerMessage, ServerStats,
};

use crate::eviction::EvictionKind;
use crate::player::{Player, unix_ms};
use crate::room::{OutboundSender, Room};
use crate::LobbyError;

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Result of [`RoomManager::join_room`] for a room that accepted the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new player record was created and seated.
    Joined,
    /// The player was already a member; their connection was restored.
    Reconnected,
}

/// All mutable lobby state: the room registry, the player→room index,
/// and the identified connections that receive global room listings.
///
/// Not thread-safe by itself — by design. A single [`crate::Lobby`]
/// mutex guards one instance, which is what makes every operation an
/// atomic state transition.
pub struct RoomManager {
    rooms: HashMap<RoomId, Room>,
    /// A player is in at most one room at a time.
    player_rooms: HashMap<PlayerId, RoomId>,
    /// Every identified connection, for `rooms_list` re-broadcasts.
    clients: HashMap<ConnectionId, OutboundSender>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            clients: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------
    // Connection bookkeeping
    // -----------------------------------------------------------------

    /// Registers an identified connection for global broadcasts.
    pub fn register_client(&mut self, conn_id: ConnectionId, sender: OutboundSender) {
        self.clients.insert(conn_id, sender);
    }

    pub fn unregister_client(&mut self, conn_id: ConnectionId) {
        self.clients.remove(&conn_id);
    }

    // -----------------------------------------------------------------
    // Room operations
    // -----------------------------------------------------------------

    /// Creates a room with `player_id` as host, seated at slot 0.
    pub fn create_room(
        &mut self,
        name: String,
        rules: durak_protocol::Rules,
        player_id: PlayerId,
        display_name: String,
        sender: OutboundSender,
    ) -> Result<RoomId, LobbyError> {
        if rules.max_players == 0 {
            return Err(LobbyError::InvalidMaxPlayers(rules.max_players));
        }
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(LobbyError::AlreadyInRoom(player_id, *current));
        }

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let mut room = Room::new(room_id, name, rules, player_id.clone());

        let host = Player::new(player_id.clone(), display_name);
        room.add_player(host, sender)
            .expect("validated rules always leave the host a slot");

        room.send_to(
            &player_id,
            ServerMessage::RoomCreated { room: room.to_public_info() },
        );

        self.rooms.insert(room_id, room);
        self.player_rooms.insert(player_id.clone(), room_id);
        tracing::info!(%room_id, %player_id, "room created");

        self.broadcast_rooms_list();
        Ok(room_id)
    }

    /// Joins a room, or reconnects an existing member.
    ///
    /// An existing member is recognized *before* the status check, so a
    /// player who dropped mid-game can come back while the room is
    /// `playing`; "already started" only ever rejects non-members.
    pub fn join_room(
        &mut self,
        room_id: RoomId,
        player_id: PlayerId,
        display_name: String,
        sender: OutboundSender,
    ) -> Result<JoinOutcome, LobbyError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(LobbyError::RoomNotFound(room_id))?;

        if room.contains(&player_id) {
            room.reconnect_player(&player_id, sender);
            self.player_rooms.insert(player_id.clone(), room_id);

            room.send_to(
                &player_id,
                ServerMessage::RoomJoined { room: room.to_public_info() },
            );
            if let Some(game) = &room.game {
                room.send_to(
                    &player_id,
                    ServerMessage::GameState { game: game.view_for(&player_id) },
                );
            }
            room.broadcast(
                &ServerMessage::PlayerReconnected {
                    player_id: player_id.clone(),
                    room: room.to_public_info(),
                },
                Some(&player_id),
            );

            tracing::info!(%room_id, %player_id, "player reconnected");
            self.broadcast_rooms_list();
            return Ok(JoinOutcome::Reconnected);
        }

        if room.status != RoomStatus::Waiting {
            return Err(LobbyError::AlreadyStarted(room_id));
        }
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(LobbyError::AlreadyInRoom(player_id, *current));
        }

        let player = Player::new(player_id.clone(), display_name);
        if room.add_player(player, sender).is_none() {
            return Err(LobbyError::RoomFull(room_id));
        }
        self.player_rooms.insert(player_id.clone(), room_id);

        room.send_to(
            &player_id,
            ServerMessage::RoomJoined { room: room.to_public_info() },
        );
        room.broadcast(
            &ServerMessage::PlayerJoined { room: room.to_public_info() },
            Some(&player_id),
        );

        tracing::info!(
            %room_id,
            %player_id,
            players = room.player_count(),
            "player joined"
        );
        self.broadcast_rooms_list();
        Ok(JoinOutcome::Joined)
    }

    /// Explicit voluntary exit: the record is deleted and the slot
    /// freed. Returns the room id if the room is now structurally empty
    /// and should enter the short eviction grace window. No-op for a
    /// player who isn't in a room.
    pub fn leave_room(&mut self, player_id: &PlayerId) -> Option<RoomId> {
        let room_id = self.player_rooms.remove(player_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        room.send_to(player_id, ServerMessage::RoomLeft);
        room.remove_player(player_id);

        tracing::info!(
            %room_id,
            %player_id,
            players = room.player_count(),
            "player left"
        );

        let now_empty = room.is_empty();
        if !now_empty {
            room.broadcast(
                &ServerMessage::PlayerLeft { room: room.to_public_info() },
                None,
            );
        }

        self.broadcast_rooms_list();
        now_empty.then_some(room_id)
    }

    /// Involuntary exit: connectivity metadata flips, the record and the
    /// seat stay. Returns the room id if *every* member is now
    /// unreachable and the long grace window should be armed.
    pub fn handle_disconnection(&mut self, player_id: &PlayerId) -> Option<RoomId> {
        let room_id = *self.player_rooms.get(player_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        room.disconnect_player(player_id);
        room.broadcast(
            &ServerMessage::PlayerDisconnected { player_id: player_id.clone() },
            None,
        );

        tracing::info!(%room_id, %player_id, "player disconnected");

        room.connected_players().is_empty().then_some(room_id)
    }

    /// Toggles readiness and broadcasts the fresh snapshot. Returns the
    /// room id when the snapshot says the auto-start protocol should be
    /// triggered. No-op for a player who isn't in a waiting room.
    pub fn set_ready(&mut self, player_id: &PlayerId) -> Option<RoomId> {
        let room_id = *self.player_rooms.get(player_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        if room.status != RoomStatus::Waiting {
            return None;
        }

        let player = room.player_mut(player_id)?;
        player.ready = !player.ready;
        let ready = player.ready;

        let info = room.readiness();
        room.broadcast(
            &ServerMessage::PlayerReadyChanged {
                room: room.to_public_info(),
                info,
            },
            None,
        );

        tracing::debug!(%room_id, %player_id, ready, "readiness toggled");
        info.can_start.then_some(room_id)
    }

    /// Liveness refresh. The acknowledgment reply is the boundary
    /// layer's job; this only updates the player record.
    pub fn handle_heartbeat(&mut self, player_id: &PlayerId) {
        if let Some(room_id) = self.player_rooms.get(player_id) {
            if let Some(room) = self.rooms.get_mut(room_id) {
                if let Some(player) = room.player_mut(player_id) {
                    player.last_seen = unix_ms();
                    player.connected = true;
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Auto-start
    // -----------------------------------------------------------------

    /// Broadcasts the countdown notice that precedes a delayed commit.
    pub fn announce_auto_start(&self, room_id: RoomId, countdown_ms: u64) {
        if let Some(room) = self.rooms.get(&room_id) {
            let info = AutoStartInfo {
                auto_starting: true,
                countdown_ms,
                ..room.readiness()
            };
            room.broadcast(&ServerMessage::AutoStartCountdown { info }, None);
        }
    }

    /// The delayed half of the auto-start protocol. Called when the
    /// countdown elapses; *revalidates against live state* — the room
    /// must still exist, still be `waiting`, and still satisfy
    /// `can_start` — because readiness may have changed while the timer
    /// ran. Aborts silently when revalidation fails.
    ///
    /// On a setup failure the room stays `waiting`, a failure notice is
    /// broadcast, and nothing is retried: the next readiness change
    /// re-triggers the protocol.
    pub fn commit_auto_start(&mut self, room_id: RoomId) {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        if room.status != RoomStatus::Waiting || !room.readiness().can_start {
            tracing::debug!(%room_id, "auto-start aborted at revalidation");
            return;
        }

        let seated: Vec<durak_game::SetupPlayer> = room
            .connected_players()
            .iter()
            .map(|p| durak_game::SetupPlayer {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect();

        let state = match durak_game::deal(room_id, &room.rules, &seated) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(%room_id, %error, "game setup failed");
                room.broadcast(
                    &ServerMessage::Error {
                        message: format!("failed to start game: {error}"),
                    },
                    None,
                );
                return;
            }
        };

        room.status = RoomStatus::Playing;
        for seat in &state.players {
            if let Some(player) = room.player_mut(&seat.id) {
                player.hand = seat.hand.clone();
            }
        }

        let public = room.to_public_info();
        for seat in &state.players {
            room.send_to(
                &seat.id,
                ServerMessage::GameStarted {
                    room: public.clone(),
                    game: state.view_for(&seat.id),
                },
            );
        }
        room.game = Some(state);

        tracing::info!(
            %room_id,
            players = seated.len(),
            "game started"
        );
        self.broadcast_rooms_list();
    }

    // -----------------------------------------------------------------
    // Eviction
    // -----------------------------------------------------------------

    /// The delayed half of both eviction tiers. Re-checks the tier's
    /// predicate against live state; a room that was rejoined (or had a
    /// member reconnect) during the grace window is left untouched.
    /// Returns whether the room was deleted.
    pub fn try_evict(&mut self, room_id: RoomId, kind: EvictionKind) -> bool {
        let Some(room) = self.rooms.get(&room_id) else {
            return false;
        };

        let still_abandoned = match kind {
            EvictionKind::EmptyRoom => room.is_empty(),
            EvictionKind::AllDisconnected => room.connected_players().is_empty(),
        };
        if !still_abandoned {
            tracing::debug!(%room_id, ?kind, "eviction aborted at revalidation");
            return false;
        }

        let room = self.rooms.remove(&room_id).expect("checked above");
        for player in room.seated_players() {
            self.player_rooms.remove(&player.id);
        }
        tracing::info!(%room_id, ?kind, "room evicted");

        self.broadcast_rooms_list();
        true
    }

    // -----------------------------------------------------------------
    // Listings and stats
    // -----------------------------------------------------------------

    /// Public views of every room still accepting players.
    pub fn rooms_list(&self) -> Vec<RoomInfo> {
        self.rooms
            .values()
            .filter(|room| room.status.is_joinable())
            .map(Room::to_public_info)
            .collect()
    }

    /// Sends the current listing to one connection.
    pub fn send_rooms_list(&self, sender: &OutboundSender) {
        let _ = sender.send(ServerMessage::RoomsList { rooms: self.rooms_list() });
    }

    /// Pushes the listing to every identified connection.
    fn broadcast_rooms_list(&self) {
        let message = ServerMessage::RoomsList { rooms: self.rooms_list() };
        for sender in self.clients.values() {
            let _ = sender.send(message.clone());
        }
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            total_rooms: self.rooms.len(),
            waiting_rooms: self
                .rooms
                .values()
                .filter(|r| r.status == RoomStatus::Waiting)
                .count(),
            playing_rooms: self
                .rooms
                .values()
                .filter(|r| r.status == RoomStatus::Playing)
                .count(),
            connected_clients: self.clients.len(),
        }
    }

    // -----------------------------------------------------------------
    // Introspection (used by the lobby wrapper and tests)
    // -----------------------------------------------------------------

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player_room(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.player_rooms.get(player_id).copied()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
