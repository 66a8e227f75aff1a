//! Identifiers, cards, and the immutable per-room rule set.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's stable external identifier.
///
/// Produced by the identity-verification collaborator (e.g. `tg_184772` for
/// a Telegram account) and opaque to this server. It survives reconnects:
/// the underlying connection may change, the `PlayerId` does not.
///
/// `#[serde(transparent)]` serializes it as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room's unique identifier, allocated from a process-local counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Opaque identifier for one accepted connection.
///
/// Never sent on the wire; it keys the server-side registry that maps a
/// live connection to a verified identity. A reconnecting player gets a
/// fresh `ConnectionId` but keeps their `PlayerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Card suit. Serialized as the unicode symbol the client renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    #[serde(rename = "♠")]
    Spades,
    #[serde(rename = "♥")]
    Hearts,
    #[serde(rename = "♦")]
    Diamonds,
    #[serde(rename = "♣")]
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] =
        [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        };
        f.write_str(sym)
    }
}

/// Card rank. Variant order is combat order, so the derived `Ord`
/// gives `Six < Seven < … < Ace`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub enum Rank {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

impl Rank {
    const FULL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Ranks present in a deck of the given size, lowest first.
    /// 36 cards → 6..A, 52 cards → 2..A.
    pub fn for_deck(card_count: CardCount) -> &'static [Rank] {
        match card_count {
            CardCount::ThirtySix => &Self::FULL[4..],
            CardCount::FiftyTwo => &Self::FULL,
        }
    }
}

/// A single playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.rank, self.suit)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Deck size. On the wire this is the bare number 36 or 52, so we
/// round-trip through `u8` instead of a tagged representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CardCount {
    ThirtySix,
    FiftyTwo,
}

impl CardCount {
    pub fn deck_size(self) -> usize {
        match self {
            CardCount::ThirtySix => 36,
            CardCount::FiftyTwo => 52,
        }
    }
}

impl TryFrom<u8> for CardCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            36 => Ok(CardCount::ThirtySix),
            52 => Ok(CardCount::FiftyTwo),
            other => Err(format!("invalid card count {other}, expected 36 or 52")),
        }
    }
}

impl From<CardCount> for u8 {
    fn from(value: CardCount) -> u8 {
        value.deck_size() as u8
    }
}

/// Game variant: whether the defender may transfer the attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Classic,
    Transferable,
}

/// How additional cards may be thrown in during an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrowingMode {
    Standard,
    Smart,
}

/// The rule set a room is created with. Immutable for the room's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    pub game_mode: GameMode,
    pub throwing_mode: ThrowingMode,
    pub card_count: CardCount,
    pub max_players: usize,
}

// ---------------------------------------------------------------------------
// Lifecycle enums shared with clients
// ---------------------------------------------------------------------------

/// A room's lifecycle status. Transitions only move forward:
/// `waiting → playing → finished`. A finished session is never reopened;
/// a new game means a new room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Whether new players may still join.
    pub fn is_joinable(self) -> bool {
        matches!(self, RoomStatus::Waiting)
    }

    /// Whether transitioning to `target` respects the forward-only order.
    pub fn can_transition_to(self, target: RoomStatus) -> bool {
        matches!(
            (self, target),
            (RoomStatus::Waiting, RoomStatus::Playing)
                | (RoomStatus::Playing, RoomStatus::Finished)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Playing => "playing",
            RoomStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Phase of an in-progress game. Setup always opens in `attack`; the
/// remaining phases belong to the turn-resolution engine, which lives
/// outside this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Attack,
    Defend,
    Throwing,
    Finished,
}

// =========================================================================
// Tests
// =========================================================================
