//! Per-seat observation: the public table plus only the observer's own
//! hole cards.

use serde::Serialize;

use super::cards::Card;
use super::state::HoldemState;
use super::types::{position_labels, Chips, Position, Pot, SeatId, SeatStatus, Street};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub index: SeatId,
    pub chips: Chips,
    pub bet: Chips,
    pub total_invested: Chips,
    pub status: SeatStatus,
    pub has_acted: bool,
    pub is_button: bool,
    pub is_sb: bool,
    pub is_bb: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldemObservation {
    pub player_index: SeatId,
    pub hand_number: u64,
    pub street: Street,
    pub button: SeatId,
    pub community: Vec<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<[Card; 2]>,
    pub pot: Chips,
    pub pots: Vec<Pot>,
    pub current_bet: Chips,
    pub min_raise: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_act: Option<SeatId>,
    pub seats: Vec<SeatView>,
}

/// Position of `seat` by its offset from the button among the seats dealt
/// into this hand.
fn position_of(state: &HoldemState, seat: SeatId) -> Option<Position> {
    let dealt: Vec<SeatId> = state
        .seats
        .iter()
        .filter(|s| s.hole_cards.is_some() || s.status.in_hand())
        .map(|s| s.index)
        .collect();
    if !dealt.contains(&seat) {
        return None;
    }
    let labels = position_labels(dealt.len());
    let button_slot = dealt.iter().position(|&id| id == state.button)?;
    let seat_slot = dealt.iter().position(|&id| id == seat)?;
    let offset = (seat_slot + dealt.len() - button_slot) % dealt.len();
    labels.get(offset).copied()
}

pub fn observe(state: &HoldemState, player: SeatId) -> HoldemObservation {
    let seats = state
        .seats
        .iter()
        .map(|s| SeatView {
            index: s.index,
            chips: s.chips,
            bet: s.bet,
            total_invested: s.total_invested,
            status: s.status,
            has_acted: s.has_acted,
            is_button: s.is_button,
            is_sb: s.is_sb,
            is_bb: s.is_bb,
            position: position_of(state, s.index),
        })
        .collect();

    HoldemObservation {
        player_index: player,
        hand_number: state.hand_number,
        street: state.betting.street,
        button: state.button,
        community: state.community.clone(),
        hole_cards: state.seats.get(player).and_then(|s| s.hole_cards),
        pot: state.pot_total(),
        pots: state.pots.clone(),
        current_bet: state.betting.current_bet,
        min_raise: state.betting.min_raise,
        to_act: state.to_act,
        seats,
    }
}
