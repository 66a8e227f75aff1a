//! Game setup and state for Durak sessions.
//!
//! This crate owns the deterministic session initializer: deck
//! construction, shuffle, deal, trump draw, and first-attacker
//! determination. It produces the [`GameState`] a room stores when it
//! transitions to `playing`. Turn resolution (attack/defense legality,
//! throw-in, win detection) is deliberately not here — it belongs to a
//! separate engine.

mod error;
mod setup;
mod state;

pub use error::SetupError;
pub use setup::{HAND_SIZE, SetupPlayer, build_deck, deal, deal_with};
pub use state::{GameState, Seat};
