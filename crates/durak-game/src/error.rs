//! Error types for game setup.

/// Reasons the session initializer can refuse to produce a game.
///
/// Both are validation failures: the room stays `waiting` and nothing is
/// dealt. There is no partial state to roll back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// Fewer than two players at commit time.
    #[error("need at least 2 players to start a game, got {0}")]
    NotEnoughPlayers(usize),

    /// The configured deck cannot give every player a full hand plus one
    /// trump card. This includes the exact-exhaustion case where dealing
    /// would leave no card to draw the trump from.
    #[error(
        "a {deck_size}-card deck cannot deal {hand_size} cards to \
         {players} players and still draw a trump"
    )]
    NotEnoughCards {
        deck_size: usize,
        hand_size: usize,
        players: usize,
    },
}
