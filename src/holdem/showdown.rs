//! Runout, per-pot evaluation, and chip awards.

use std::collections::BTreeSet;

use super::errors::StateError;
use super::eval::{best_five_of_seven, EvaluatedHand};
use super::events::HandEvent;
use super::state::HoldemState;
use super::types::{SeatId, Street};

/// Deal any missing community cards, burning one before each street, using
/// the tracked deck so the runout replays deterministically.
pub fn run_out(state: &mut HoldemState) -> Result<Vec<HandEvent>, StateError> {
    let mut events = Vec::new();
    if state.community.len() >= 5 {
        return Ok(events);
    }
    events.push(HandEvent::AllInRunout);
    while state.community.len() < 5 {
        let street = match state.community.len() {
            0 => Street::Flop,
            3 => Street::Turn,
            4 => Street::River,
            _ => return Err(StateError::InvalidTransition),
        };
        state.burn_one()?;
        let cards = state.deal_community(street.cards_dealt())?;
        events.push(HandEvent::StreetDealt { street, cards });
    }
    Ok(events)
}

fn best_hand(state: &HoldemState, seat: SeatId) -> Result<EvaluatedHand, StateError> {
    let hole = state.seat(seat).hole_cards.ok_or_else(|| {
        StateError::InvariantViolation(format!("seat {seat} reached showdown without hole cards"))
    })?;
    if state.community.len() != 5 {
        return Err(StateError::InvariantViolation(
            "showdown before the board is complete".to_string(),
        ));
    }
    let seven = [
        hole[0],
        hole[1],
        state.community[0],
        state.community[1],
        state.community[2],
        state.community[3],
        state.community[4],
    ];
    Ok(best_five_of_seven(&seven))
}

/// Evaluate every pot in creation order and move the chips. Bets must be
/// swept and pots rebuilt before calling.
pub fn resolve_showdown(state: &mut HoldemState) -> Result<Vec<HandEvent>, StateError> {
    let mut events = Vec::new();

    // Reveal order is public information at this point.
    let mut revealed: BTreeSet<SeatId> = BTreeSet::new();
    for pot in &state.pots {
        if pot.eligible.len() > 1 {
            revealed.extend(pot.eligible.iter().copied());
        }
    }
    if !revealed.is_empty() {
        let mut reveals = Vec::with_capacity(revealed.len());
        for &seat in &revealed {
            let hole = state.seat(seat).hole_cards.ok_or_else(|| {
                StateError::InvariantViolation(format!(
                    "seat {seat} reached showdown without hole cards"
                ))
            })?;
            reveals.push((seat, hole));
        }
        events.push(HandEvent::Showdown { reveals });
    }

    let pots = state.pots.clone();
    for (pot_index, pot) in pots.iter().enumerate() {
        if pot.amount == 0 {
            continue;
        }
        if pot.eligible.is_empty() {
            return Err(StateError::InvariantViolation(format!(
                "pot {pot_index} has chips but no eligible seats"
            )));
        }
        let (winners, winning_hand) = if pot.eligible.len() == 1 {
            (vec![pot.eligible[0]], None)
        } else {
            let mut best: Option<EvaluatedHand> = None;
            let mut winners: Vec<SeatId> = Vec::new();
            for &seat in &pot.eligible {
                let hand = best_hand(state, seat)?;
                match best.as_ref() {
                    Some(current) if hand < *current => {}
                    Some(current) if hand == *current => winners.push(seat),
                    _ => {
                        best = Some(hand);
                        winners = vec![seat];
                    }
                }
            }
            (winners, best.map(|h| h.class))
        };

        // Equal split; the odd chips go to the earliest-seated winner.
        let share = pot.amount / winners.len() as u64;
        let remainder = pot.amount % winners.len() as u64;
        for &seat in &winners {
            state.seat_mut(seat).chips += share;
        }
        if remainder > 0 {
            let earliest = *winners.iter().min().ok_or_else(|| {
                StateError::InvariantViolation("empty winner set".to_string())
            })?;
            state.seat_mut(earliest).chips += remainder;
        }
        events.push(HandEvent::PotAwarded {
            pot_index,
            amount: pot.amount,
            winners,
            hand: winning_hand,
        });
    }

    // All pot money has moved back to stacks.
    for seat in state.seats.iter_mut() {
        seat.total_invested = 0;
    }
    state.pots.clear();
    Ok(events)
}

/// Everyone else folded: the last seat standing takes everything, no
/// evaluation and no reveals.
pub fn settle_by_folds(state: &mut HoldemState, winner: SeatId) -> Vec<HandEvent> {
    state.sweep_bets();
    let mut events = Vec::new();
    let pots = state.pots.clone();
    for (pot_index, pot) in pots.iter().enumerate() {
        if pot.amount == 0 {
            continue;
        }
        state.seat_mut(winner).chips += pot.amount;
        events.push(HandEvent::PotAwarded {
            pot_index,
            amount: pot.amount,
            winners: vec![winner],
            hand: None,
        });
    }
    for seat in state.seats.iter_mut() {
        seat.total_invested = 0;
    }
    state.pots.clear();
    events
}
