use serde::{Deserialize, Serialize};

use super::cards::Card;

pub type Chips = u64;
pub type SeatId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    pub fn next(self) -> Option<Street> {
        match self {
            Street::Preflop => Some(Street::Flop),
            Street::Flop => Some(Street::Turn),
            Street::Turn => Some(Street::River),
            Street::River => None,
        }
    }

    /// Community cards dealt when this street opens.
    pub fn cards_dealt(self) -> usize {
        match self {
            Street::Preflop => 0,
            Street::Flop => 3,
            Street::Turn | Street::River => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// In the hand, still owes a decision this round.
    Waiting,
    /// In the hand, has acted this round.
    Acted,
    AllIn,
    Folded,
    SittingOut,
}

impl SeatStatus {
    pub fn can_act(self) -> bool {
        matches!(self, SeatStatus::Waiting | SeatStatus::Acted)
    }

    /// Still eligible to win pots.
    pub fn in_hand(self) -> bool {
        !matches!(self, SeatStatus::Folded | SeatStatus::SittingOut)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatState {
    pub index: SeatId,
    pub chips: Chips,
    pub hole_cards: Option<[Card; 2]>,
    /// Committed on the current street.
    pub bet: Chips,
    /// Committed on completed streets of this hand.
    pub total_invested: Chips,
    pub status: SeatStatus,
    pub has_acted: bool,
    pub is_button: bool,
    pub is_sb: bool,
    pub is_bb: bool,
}

impl SeatState {
    pub fn new(index: SeatId, chips: Chips) -> Self {
        Self {
            index,
            chips,
            hole_cards: None,
            bet: 0,
            total_invested: 0,
            status: SeatStatus::Waiting,
            has_acted: false,
            is_button: false,
            is_sb: false,
            is_bb: false,
        }
    }

    /// Total committed to the hand so far, current street included.
    pub fn committed(&self) -> Chips {
        self.total_invested + self.bet
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pot {
    pub amount: Chips,
    /// Seats that can win this pot; always a subset of the previous pot's.
    pub eligible: Vec<SeatId>,
    pub is_main: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Btn,
    Sb,
    Bb,
    Utg,
    Mp,
    Hj,
    Co,
}

/// Position labels by offset from the button for each table size. Heads-up
/// has only the button (which is also the small blind) and the big blind.
/// The seven-handed row is headroom beyond the shipped six-seat cap; it is
/// where `Mp` enters the rotation.
pub fn position_labels(num_players: usize) -> &'static [Position] {
    use Position::*;
    match num_players {
        2 => &[Btn, Bb],
        3 => &[Btn, Sb, Bb],
        4 => &[Btn, Sb, Bb, Utg],
        5 => &[Btn, Sb, Bb, Utg, Co],
        6 => &[Btn, Sb, Bb, Utg, Hj, Co],
        7 => &[Btn, Sb, Bb, Utg, Mp, Hj, Co],
        _ => &[],
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoldemConfig {
    pub starting_chips: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Stop after this many completed hands; `None` plays to elimination.
    pub max_hands: Option<u64>,
}

impl Default for HoldemConfig {
    fn default() -> Self {
        Self { starting_chips: 1000, small_blind: 10, big_blind: 20, max_hands: None }
    }
}

impl HoldemConfig {
    /// The deeper-stacked preset.
    pub fn deep_stack() -> Self {
        Self { starting_chips: 10_000, small_blind: 50, big_blind: 100, max_hands: None }
    }

    pub fn single_hand(mut self) -> Self {
        self.max_hands = Some(1);
        self
    }
}
