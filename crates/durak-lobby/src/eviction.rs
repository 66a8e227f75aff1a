//! Grace-window tracking for abandoned rooms.
//!
//! Two independent tiers share one side table keyed by room id:
//!
//! - **Empty room** (short window): armed when explicit leaves drop a
//!   room's membership to zero.
//! - **All disconnected** (long window): armed when every member goes
//!   unreachable while the room is still structurally occupied.
//!
//! Cancelling here is an optimization: the timer's callback re-checks
//! the predicate against live state before deleting anything, so a
//! cancellation that loses the race with its timer is still harmless.

use std::collections::HashMap;

use durak_protocol::RoomId;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Which abandonment predicate a pending timer will re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionKind {
    /// `|players| == 0` — everyone left explicitly.
    EmptyRoom,
    /// Every member has `connected == false`; records and seats remain.
    AllDisconnected,
}

struct PendingEviction {
    kind: EvictionKind,
    deadline: Instant,
    handle: JoinHandle<()>,
}

/// The side table of armed eviction timers, at most one per room.
/// Scheduling a new timer for a room replaces (and aborts) the old one.
pub struct EvictionScheduler {
    pending: HashMap<RoomId, PendingEviction>,
}

impl EvictionScheduler {
    pub fn new() -> Self {
        Self { pending: HashMap::new() }
    }

    /// Tracks a freshly spawned timer task, replacing any earlier one.
    pub fn track(
        &mut self,
        room_id: RoomId,
        kind: EvictionKind,
        deadline: Instant,
        handle: JoinHandle<()>,
    ) {
        if let Some(old) = self
            .pending
            .insert(room_id, PendingEviction { kind, deadline, handle })
        {
            old.handle.abort();
        }
    }

    /// Cancels the pending timer for a room, if any. Called when a join
    /// or reconnection makes the room legitimate again.
    pub fn cancel(&mut self, room_id: RoomId) -> bool {
        match self.pending.remove(&room_id) {
            Some(pending) => {
                pending.handle.abort();
                tracing::debug!(
                    %room_id,
                    kind = ?pending.kind,
                    "pending eviction cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Drops the entry for a timer that has fired. Does not abort.
    pub fn complete(&mut self, room_id: RoomId) {
        self.pending.remove(&room_id);
    }

    /// The tier currently armed for a room, if any.
    pub fn pending_kind(&self, room_id: RoomId) -> Option<EvictionKind> {
        self.pending.get(&room_id).map(|p| p.kind)
    }

    /// Remaining time before the armed timer fires, if any.
    pub fn deadline(&self, room_id: RoomId) -> Option<Instant> {
        self.pending.get(&room_id).map(|p| p.deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for EvictionScheduler {
    fn default() -> Self {
        Self::new()
    }
}
