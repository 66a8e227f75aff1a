//! The full (server-side) game state and its per-player projection.

use durak_protocol::{
    Card, GamePhase, GameView, PlayerId, RoomId, SeatView, Suit, TablePair,
};

/// One occupied seat in the game: a player and their dealt hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
}

/// The complete state of a running game. Server-internal: it contains
/// every hand and the face-down deck, so it is never sent to a client
/// as-is — clients get [`GameState::view_for`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub room_id: RoomId,
    pub phase: GamePhase,
    /// Seating order; `attacker_index`/`defender_index` index into this.
    pub players: Vec<Seat>,
    /// Remaining draw pile, top of the pile at the end.
    pub deck: Vec<Card>,
    pub table: Vec<TablePair>,
    pub trump_card: Card,
    pub trump_suit: Suit,
    pub attacker_index: usize,
    pub defender_index: usize,
    pub turn: u32,
}

impl GameState {
    /// The dealt hand of `player`, if they are seated in this game.
    pub fn hand_of(&self, player: &PlayerId) -> Option<&[Card]> {
        self.players
            .iter()
            .find(|seat| &seat.id == player)
            .map(|seat| seat.hand.as_slice())
    }

    /// Projects the state for one recipient: their own hand in full,
    /// everyone else reduced to a card count, the deck to its size.
    pub fn view_for(&self, player: &PlayerId) -> GameView {
        GameView {
            room_id: self.room_id,
            phase: self.phase,
            players: self
                .players
                .iter()
                .map(|seat| SeatView {
                    id: seat.id.clone(),
                    name: seat.name.clone(),
                    hand_count: seat.hand.len(),
                })
                .collect(),
            your_hand: self.hand_of(player).map(<[_]>::to_vec).unwrap_or_default(),
            deck_count: self.deck.len(),
            table: self.table.clone(),
            trump_card: self.trump_card,
            trump_suit: self.trump_suit,
            attacker_index: self.attacker_index,
            defender_index: self.defender_index,
            turn: self.turn,
        }
    }
}
