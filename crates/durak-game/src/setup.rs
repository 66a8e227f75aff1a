//! The deterministic session initializer.
//!
//! Given the seated players and the room's rules, builds a shuffled deck,
//! deals every player a full hand, draws the trump, and decides who
//! attacks first. Pure apart from the injected RNG, so tests can seed it.

use rand::Rng;
use rand::seq::SliceRandom;

use durak_protocol::{
    Card, CardCount, GamePhase, PlayerId, Rank, RoomId, Rules, Suit,
};

use crate::{GameState, Seat, SetupError};

/// Cards dealt to each player at the start of a game.
pub const HAND_SIZE: usize = 6;

/// A player entering the game: identity plus display name, in seating
/// order. Hands don't exist yet; this function creates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPlayer {
    pub id: PlayerId,
    pub name: String,
}

/// Builds an unshuffled deck for the configured size: 4 suits crossed
/// with the rank range (36 → 6..A, 52 → 2..A).
pub fn build_deck(card_count: CardCount) -> Vec<Card> {
    let ranks = Rank::for_deck(card_count);
    let mut deck = Vec::with_capacity(card_count.deck_size());
    for suit in Suit::ALL {
        for &rank in ranks {
            deck.push(Card::new(suit, rank));
        }
    }
    deck
}

/// Deals a new game with the thread-local RNG. See [`deal_with`].
pub fn deal(
    room_id: RoomId,
    rules: &Rules,
    players: &[SetupPlayer],
) -> Result<GameState, SetupError> {
    deal_with(room_id, rules, players, &mut rand::rng())
}

/// Deals a new game using the supplied RNG.
///
/// Fails before touching any cards if there are fewer than two players,
/// or if the deck cannot supply [`HAND_SIZE`] cards per player *plus* one
/// trump. Exact exhaustion — dealing consumes the whole deck with nothing
/// left for the trump — counts as a failure rather than drawing the trump
/// from someone's hand.
pub fn deal_with(
    room_id: RoomId,
    rules: &Rules,
    players: &[SetupPlayer],
    rng: &mut impl Rng,
) -> Result<GameState, SetupError> {
    if players.len() < 2 {
        return Err(SetupError::NotEnoughPlayers(players.len()));
    }

    let deck_size = rules.card_count.deck_size();
    if players.len() * HAND_SIZE + 1 > deck_size {
        return Err(SetupError::NotEnoughCards {
            deck_size,
            hand_size: HAND_SIZE,
            players: players.len(),
        });
    }

    let mut deck = build_deck(rules.card_count);
    deck.shuffle(rng);

    // Deal in seating order, taking from the top of the pile.
    let seats: Vec<Seat> = players
        .iter()
        .map(|p| Seat {
            id: p.id.clone(),
            name: p.name.clone(),
            hand: deck.split_off(deck.len() - HAND_SIZE),
        })
        .collect();

    // The size check above guarantees a card remains for the trump. The
    // trump is removed from the draw pile, not peeked at.
    let trump_card = deck.pop().expect("deck size was checked");
    let trump_suit = trump_card.suit;

    let attacker_index = first_attacker(&seats, trump_suit);
    let defender_index = (attacker_index + 1) % seats.len();

    Ok(GameState {
        room_id,
        phase: GamePhase::Attack,
        players: seats,
        deck,
        table: Vec::new(),
        trump_card,
        trump_suit,
        attacker_index,
        defender_index,
        turn: 1,
    })
}

/// Index of the seat holding the lowest trump card. Distinct physical
/// cards can't tie, so the scan is unambiguous; if nobody holds a trump,
/// seat 0 opens.
fn first_attacker(seats: &[Seat], trump_suit: Suit) -> usize {
    let mut attacker = 0;
    let mut lowest: Option<Rank> = None;

    for (index, seat) in seats.iter().enumerate() {
        let min_trump = seat
            .hand
            .iter()
            .filter(|card| card.suit == trump_suit)
            .map(|card| card.rank)
            .min();

        if let Some(rank) = min_trump {
            if lowest.is_none_or(|current| rank < current) {
                lowest = Some(rank);
                attacker = index;
            }
        }
    }

    attacker
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn rules(card_count: CardCount, max_players: usize) -> Rules {
        Rules {
            game_mode: durak_protocol::GameMode::Classic,
            throwing_mode: durak_protocol::ThrowingMode::Standard,
            card_count,
            max_players,
        }
    }

    fn players(n: usize) -> Vec<SetupPlayer> {
        (0..n)
            .map(|i| SetupPlayer {
                id: PlayerId::new(format!("p{i}")),
                name: format!("Player {i}"),
            })
            .collect()
    }

    fn seat(id: &str, hand: Vec<Card>) -> Seat {
        Seat { id: PlayerId::new(id), name: id.to_uppercase(), hand }
    }

    #[test]
    fn test_build_deck_36_has_36_unique_cards() {
        let deck = build_deck(CardCount::ThirtySix);
        assert_eq!(deck.len(), 36);
        let unique: HashSet<_> = deck.iter().copied().collect();
        assert_eq!(unique.len(), 36);
        assert!(!deck.contains(&Card::new(Suit::Spades, Rank::Two)));
    }

    #[test]
    fn test_build_deck_52_has_52_unique_cards() {
        let deck = build_deck(CardCount::FiftyTwo);
        assert_eq!(deck.len(), 52);
        let unique: HashSet<_> = deck.iter().copied().collect();
        assert_eq!(unique.len(), 52);
        assert!(deck.contains(&Card::new(Suit::Spades, Rank::Two)));
    }

    #[test]
    fn test_deal_arithmetic_for_all_supported_counts() {
        // For every player count and deck size the rules allow: everyone
        // gets exactly HAND_SIZE cards and the remaining deck is
        // C - 6N - 1 (one card consumed as trump).
        for card_count in [CardCount::ThirtySix, CardCount::FiftyTwo] {
            let deck_size = card_count.deck_size();
            for n in 2..=8 {
                let result = deal_with(
                    RoomId(1),
                    &rules(card_count, n),
                    &players(n),
                    &mut StdRng::seed_from_u64(7),
                );

                if n * HAND_SIZE + 1 > deck_size {
                    assert_eq!(
                        result.unwrap_err(),
                        SetupError::NotEnoughCards {
                            deck_size,
                            hand_size: HAND_SIZE,
                            players: n,
                        }
                    );
                    continue;
                }

                let state = result.unwrap();
                assert_eq!(state.players.len(), n);
                for seat in &state.players {
                    assert_eq!(seat.hand.len(), HAND_SIZE);
                }
                assert_eq!(state.deck.len(), deck_size - HAND_SIZE * n - 1);

                // Conservation: hands + deck + trump = whole deck, no dupes.
                let mut all: Vec<Card> = state
                    .players
                    .iter()
                    .flat_map(|s| s.hand.iter().copied())
                    .chain(state.deck.iter().copied())
                    .collect();
                all.push(state.trump_card);
                let unique: HashSet<_> = all.iter().copied().collect();
                assert_eq!(unique.len(), deck_size);
            }
        }
    }

    #[test]
    fn test_deal_rejects_single_player() {
        let result = deal_with(
            RoomId(1),
            &rules(CardCount::ThirtySix, 2),
            &players(1),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(result.unwrap_err(), SetupError::NotEnoughPlayers(1));
    }

    #[test]
    fn test_deal_rejects_exact_exhaustion() {
        // Six players × 6 cards = 36: the deck empties with no trump left.
        let result = deal_with(
            RoomId(1),
            &rules(CardCount::ThirtySix, 6),
            &players(6),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(SetupError::NotEnoughCards { .. })));
    }

    #[test]
    fn test_deal_opens_in_attack_phase_with_adjacent_defender() {
        let state = deal_with(
            RoomId(9),
            &rules(CardCount::ThirtySix, 4),
            &players(3),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();

        assert_eq!(state.phase, GamePhase::Attack);
        assert!(state.table.is_empty());
        assert_eq!(state.turn, 1);
        assert_eq!(state.trump_suit, state.trump_card.suit);
        assert!(state.attacker_index < 3);
        assert_eq!(
            state.defender_index,
            (state.attacker_index + 1) % 3
        );
        assert_ne!(state.attacker_index, state.defender_index);
    }

    #[test]
    fn test_deal_attacker_holds_lowest_trump() {
        let state = deal_with(
            RoomId(2),
            &rules(CardCount::ThirtySix, 2),
            &players(2),
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();

        let lowest_in_hands: Option<Rank> = state
            .players
            .iter()
            .flat_map(|s| s.hand.iter())
            .filter(|c| c.suit == state.trump_suit)
            .map(|c| c.rank)
            .min();

        if let Some(lowest) = lowest_in_hands {
            let attacker = &state.players[state.attacker_index];
            assert!(
                attacker
                    .hand
                    .iter()
                    .any(|c| c.suit == state.trump_suit && c.rank == lowest)
            );
        } else {
            assert_eq!(state.attacker_index, 0);
        }
    }

    #[test]
    fn test_first_attacker_picks_lowest_trump_holder() {
        let seats = vec![
            seat("a", vec![Card::new(Suit::Hearts, Rank::King)]),
            seat("b", vec![Card::new(Suit::Hearts, Rank::Seven)]),
            seat("c", vec![Card::new(Suit::Spades, Rank::Six)]),
        ];
        assert_eq!(first_attacker(&seats, Suit::Hearts), 1);
    }

    #[test]
    fn test_first_attacker_defaults_to_seat_zero_without_trumps() {
        let seats = vec![
            seat("a", vec![Card::new(Suit::Clubs, Rank::Nine)]),
            seat("b", vec![Card::new(Suit::Spades, Rank::Ace)]),
        ];
        assert_eq!(first_attacker(&seats, Suit::Diamonds), 0);
    }

    #[test]
    fn test_deal_is_deterministic_for_a_fixed_seed() {
        let a = deal_with(
            RoomId(5),
            &rules(CardCount::FiftyTwo, 4),
            &players(4),
            &mut StdRng::seed_from_u64(99),
        )
        .unwrap();
        let b = deal_with(
            RoomId(5),
            &rules(CardCount::FiftyTwo, 4),
            &players(4),
            &mut StdRng::seed_from_u64(99),
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
