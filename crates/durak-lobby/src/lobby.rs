//! The async boundary around the lobby state.
//!
//! `Lobby` owns the one mutex that guards [`RoomManager`], the eviction
//! side table, and the in-flight auto-start set, and it spawns every
//! timer. Handlers call its methods; each locks, runs one synchronous
//! state transition to completion, and unlocks. Timer callbacks re-lock
//! and go through the manager's revalidating entry points, so state
//! captured at scheduling time is never trusted at fire time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use durak_protocol::{
    ConnectionId, PlayerId, RoomId, RoomInfo, Rules, ServerStats,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::eviction::{EvictionKind, EvictionScheduler};
use crate::manager::RoomManager;
use crate::room::OutboundSender;
use crate::{JoinOutcome, LobbyError};

/// Timing knobs for the lobby. Defaults mirror the production values:
/// a short UI countdown before a game commit, a short grace for rooms
/// everyone left, a longer one for rooms that merely lost connectivity.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Delay between the auto-start trigger and its revalidated commit.
    pub auto_start_delay: Duration,
    /// Grace window before an explicitly emptied room is deleted.
    pub empty_room_grace: Duration,
    /// Grace window before an all-disconnected room is deleted.
    pub all_disconnected_grace: Duration,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            auto_start_delay: Duration::from_millis(1500),
            empty_room_grace: Duration::from_secs(30),
            all_disconnected_grace: Duration::from_secs(60),
        }
    }
}

struct LobbyInner {
    manager: RoomManager,
    evictions: EvictionScheduler,
    /// Rooms with a countdown in flight. Suppresses duplicate
    /// countdowns only; correctness comes from commit-time revalidation.
    pending_starts: HashSet<RoomId>,
}

/// Handle to the shared lobby. Cheap to clone; every clone locks the
/// same state. Construct one per server — there is deliberately no
/// global instance, so tests can run isolated lobbies side by side.
#[derive(Clone)]
pub struct Lobby {
    inner: Arc<Mutex<LobbyInner>>,
    config: LobbyConfig,
}

impl Lobby {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LobbyInner {
                manager: RoomManager::new(),
                evictions: EvictionScheduler::new(),
                pending_starts: HashSet::new(),
            })),
            config,
        }
    }

    // -----------------------------------------------------------------
    // Connection bookkeeping
    // -----------------------------------------------------------------

    pub async fn register_client(&self, conn_id: ConnectionId, sender: OutboundSender) {
        self.inner.lock().await.manager.register_client(conn_id, sender);
    }

    pub async fn unregister_client(&self, conn_id: ConnectionId) {
        self.inner.lock().await.manager.unregister_client(conn_id);
    }

    // -----------------------------------------------------------------
    // Room operations
    // -----------------------------------------------------------------

    pub async fn create_room(
        &self,
        name: String,
        rules: Rules,
        player_id: PlayerId,
        display_name: String,
        sender: OutboundSender,
    ) -> Result<RoomId, LobbyError> {
        let mut inner = self.inner.lock().await;
        inner
            .manager
            .create_room(name, rules, player_id, display_name, sender)
    }

    /// Joins or reconnects. Either way the room has a legitimate member
    /// again, so any pending eviction timer is cancelled.
    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        display_name: String,
        sender: OutboundSender,
    ) -> Result<JoinOutcome, LobbyError> {
        let mut inner = self.inner.lock().await;
        let outcome =
            inner
                .manager
                .join_room(room_id, player_id, display_name, sender)?;
        inner.evictions.cancel(room_id);
        Ok(outcome)
    }

    pub async fn leave_room(&self, player_id: &PlayerId) {
        let mut inner = self.inner.lock().await;
        if let Some(empty_room) = inner.manager.leave_room(player_id) {
            self.arm_eviction(&mut inner, empty_room, EvictionKind::EmptyRoom);
        }
    }

    pub async fn handle_disconnection(&self, player_id: &PlayerId) {
        let mut inner = self.inner.lock().await;
        if let Some(dead_room) = inner.manager.handle_disconnection(player_id) {
            // Distinct from the empty-room tier: the room still has
            // members, they are just unreachable. Arm the long window
            // unless one is already pending.
            if inner.evictions.pending_kind(dead_room).is_none() {
                self.arm_eviction(&mut inner, dead_room, EvictionKind::AllDisconnected);
            }
        }
    }

    pub async fn set_ready(&self, player_id: &PlayerId) {
        let mut inner = self.inner.lock().await;
        let Some(room_id) = inner.manager.set_ready(player_id) else {
            return;
        };

        // Trigger phase of the two-phase start. The countdown notice
        // goes out now; the commit happens after the delay, against
        // whatever the room looks like then.
        if !inner.pending_starts.insert(room_id) {
            return;
        }
        let delay = self.config.auto_start_delay;
        inner
            .manager
            .announce_auto_start(room_id, delay.as_millis() as u64);

        let shared = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.lock().await;
            inner.pending_starts.remove(&room_id);
            inner.manager.commit_auto_start(room_id);
        });
    }

    pub async fn handle_heartbeat(&self, player_id: &PlayerId) {
        self.inner.lock().await.manager.handle_heartbeat(player_id);
    }

    // -----------------------------------------------------------------
    // Listings and stats
    // -----------------------------------------------------------------

    pub async fn rooms_list(&self) -> Vec<RoomInfo> {
        self.inner.lock().await.manager.rooms_list()
    }

    pub async fn send_rooms_list(&self, sender: &OutboundSender) {
        self.inner.lock().await.manager.send_rooms_list(sender);
    }

    pub async fn stats(&self) -> ServerStats {
        self.inner.lock().await.manager.stats()
    }

    // -----------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------

    /// Arms an eviction timer for `room_id`, replacing any earlier one.
    /// The spawned task re-locks and revalidates through
    /// [`RoomManager::try_evict`]; a room that became legitimate during
    /// the window survives even if the cancel path never ran.
    fn arm_eviction(&self, inner: &mut LobbyInner, room_id: RoomId, kind: EvictionKind) {
        let grace = match kind {
            EvictionKind::EmptyRoom => self.config.empty_room_grace,
            EvictionKind::AllDisconnected => self.config.all_disconnected_grace,
        };
        tracing::debug!(%room_id, ?kind, ?grace, "eviction armed");

        let shared = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut inner = shared.lock().await;
            inner.evictions.complete(room_id);
            inner.manager.try_evict(room_id, kind);
        });
        inner
            .evictions
            .track(room_id, kind, Instant::now() + grace, handle);
    }

    // -----------------------------------------------------------------
    // Test and diagnostic introspection
    // -----------------------------------------------------------------

    /// Runs `f` with the locked manager. Lets tests inspect rooms
    /// without widening the public mutation surface.
    pub async fn with_manager<R>(&self, f: impl FnOnce(&RoomManager) -> R) -> R {
        let inner = self.inner.lock().await;
        f(&inner.manager)
    }

    /// The eviction tier currently armed for a room, if any.
    pub async fn pending_eviction(&self, room_id: RoomId) -> Option<EvictionKind> {
        self.inner.lock().await.evictions.pending_kind(room_id)
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new(LobbyConfig::default())
    }
}
