//! Hand events surfaced as per-turn annotations in the match log.

use serde_json::json;

use crate::game::GameEventRecord;

use super::actions::HoldemAction;
use super::cards::Card;
use super::eval::HandClass;
use super::types::{Chips, SeatId, Street};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlindKind {
    Small,
    Big,
}

impl BlindKind {
    fn label(self) -> &'static str {
        match self {
            BlindKind::Small => "small",
            BlindKind::Big => "big",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HandEvent {
    HandStart {
        hand_number: u64,
        button: SeatId,
        small_blind_seat: SeatId,
        big_blind_seat: SeatId,
    },
    BlindPosted {
        seat: SeatId,
        blind: BlindKind,
        amount: Chips,
        all_in: bool,
    },
    /// A normalized player action as the engine applied it.
    Action {
        seat: SeatId,
        action: HoldemAction,
        all_in: bool,
    },
    StreetDealt {
        street: Street,
        cards: Vec<Card>,
    },
    /// Betting is closed early; the remaining board runs out.
    AllInRunout,
    /// Hole cards revealed at showdown. Only ever emitted once the
    /// information is public.
    Showdown {
        reveals: Vec<(SeatId, [Card; 2])>,
    },
    PotAwarded {
        pot_index: usize,
        amount: Chips,
        winners: Vec<SeatId>,
        hand: Option<HandClass>,
    },
    HandEnd {
        hand_number: u64,
        chips: Vec<Chips>,
    },
}

impl HandEvent {
    pub fn into_record(self) -> GameEventRecord {
        match self {
            HandEvent::HandStart { hand_number, button, small_blind_seat, big_blind_seat } => {
                GameEventRecord::with_data(
                    "HAND_START",
                    json!({
                        "handNumber": hand_number,
                        "button": button,
                        "smallBlindSeat": small_blind_seat,
                        "bigBlindSeat": big_blind_seat,
                    }),
                )
            }
            HandEvent::BlindPosted { seat, blind, amount, all_in } => GameEventRecord::with_data(
                "BLIND_POSTED",
                json!({
                    "seat": seat,
                    "blind": blind.label(),
                    "amount": amount,
                    "allIn": all_in,
                }),
            ),
            HandEvent::Action { seat, action, all_in } => {
                let mut data = json!({"seat": seat, "allIn": all_in});
                if let HoldemAction::Bet { to } | HoldemAction::Raise { to } = action {
                    data["to"] = json!(to);
                }
                GameEventRecord::with_data(action.kind(), data)
            }
            HandEvent::StreetDealt { street, cards } => GameEventRecord::with_data(
                "STREET",
                json!({"street": street, "cards": cards}),
            ),
            HandEvent::AllInRunout => GameEventRecord::new("ALL_IN_RUNOUT"),
            HandEvent::Showdown { reveals } => {
                let reveals: Vec<serde_json::Value> = reveals
                    .into_iter()
                    .map(|(seat, cards)| json!({"seat": seat, "cards": cards}))
                    .collect();
                GameEventRecord::with_data("SHOWDOWN", json!({ "reveals": reveals }))
            }
            HandEvent::PotAwarded { pot_index, amount, winners, hand } => {
                GameEventRecord::with_data(
                    "POT_AWARDED",
                    json!({
                        "potIndex": pot_index,
                        "amount": amount,
                        "winners": winners,
                        "hand": hand,
                    }),
                )
            }
            HandEvent::HandEnd { hand_number, chips } => GameEventRecord::with_data(
                "HAND_END",
                json!({"handNumber": hand_number, "chips": chips}),
            ),
        }
    }
}

pub fn into_records(events: Vec<HandEvent>) -> Vec<GameEventRecord> {
    events.into_iter().map(HandEvent::into_record).collect()
}
