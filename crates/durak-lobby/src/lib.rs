//! Room lifecycle coordination for the Durak server.
//!
//! This crate owns all mutable session state: the room registry, each
//! room's players/slots/connections, readiness and auto-start, and the
//! grace-window eviction of abandoned rooms.
//!
//! # Concurrency model
//!
//! [`RoomManager`] is a plain synchronous state machine — no locks, no
//! `await`. [`Lobby`] wraps one instance (plus the eviction side table)
//! in a single `tokio::sync::Mutex`, giving the single-writer discipline
//! the design relies on: a handler locks, mutates to completion, unlocks.
//! Outbound sends are unbounded-channel pushes, so no network I/O ever
//! happens under the lock.
//!
//! Every *delayed* action — the auto-start commit and both eviction
//! tiers — re-locks and revalidates live state when its timer fires
//! instead of trusting whatever was true at scheduling time.

mod error;
mod eviction;
mod lobby;
mod manager;
mod player;
mod room;

pub use error::LobbyError;
pub use eviction::{EvictionKind, EvictionScheduler};
pub use lobby::{Lobby, LobbyConfig};
pub use manager::{JoinOutcome, RoomManager};
pub use player::Player;
pub use room::{OutboundSender, Room};
