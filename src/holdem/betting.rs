//! Action application and betting-round termination.

use super::actions::HoldemAction;
use super::errors::ActionError;
use super::events::HandEvent;
use super::rules::{is_full_raise, min_raise_to, price_to_call};
use super::state::HoldemState;
use super::types::{Chips, SeatId, SeatStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundTransition {
    Continued { next_to_act: SeatId },
    StreetEnd,
    HandEndByFolds { winner: SeatId },
}

fn mark_acted(state: &mut HoldemState, seat: SeatId) {
    let s = state.seat_mut(seat);
    s.has_acted = true;
    if s.status == SeatStatus::Waiting {
        s.status = SeatStatus::Acted;
    }
}

/// Move chips from the stack to the current-street bet, flipping to all-in
/// when the stack empties.
fn commit(state: &mut HoldemState, seat: SeatId, amount: Chips) {
    let s = state.seat_mut(seat);
    let pay = amount.min(s.chips);
    s.chips -= pay;
    s.bet += pay;
    if s.chips == 0 {
        s.status = SeatStatus::AllIn;
    }
}

/// A full raise reopens the action: everyone else who could act owes a fresh
/// decision.
fn reopen_action(state: &mut HoldemState, raiser: SeatId) {
    for s in state.seats.iter_mut() {
        if s.index != raiser && s.status.can_act() {
            s.has_acted = false;
            if s.status == SeatStatus::Acted {
                s.status = SeatStatus::Waiting;
            }
        }
    }
}

fn register_full_raise(state: &mut HoldemState, seat: SeatId, delta: Chips) {
    state.betting.min_raise = delta;
    state.betting.last_raiser = Some(seat);
    state.betting.num_raises += 1;
    reopen_action(state, seat);
}

/// Apply one action for `seat`, mutating the state and reporting how the
/// round moved. Validation here is a backstop: the orchestrator only sends
/// actions drawn from the legal set.
pub fn apply_action(
    state: &mut HoldemState,
    seat: SeatId,
    action: HoldemAction,
) -> Result<(RoundTransition, Vec<HandEvent>), ActionError> {
    if state.to_act != Some(seat) {
        return Err(ActionError::NotPlayersTurn);
    }
    if !state.seat(seat).status.can_act() {
        return Err(ActionError::ActorCannotAct);
    }

    let price = price_to_call(state, seat);
    match action {
        HoldemAction::Fold => {
            state.seat_mut(seat).status = SeatStatus::Folded;
            state.seat_mut(seat).has_acted = true;
        }
        HoldemAction::Check => {
            if price > 0 {
                return Err(ActionError::CannotCheckFacingBet);
            }
            mark_acted(state, seat);
        }
        HoldemAction::Call => {
            if price == 0 {
                return Err(ActionError::IllegalAction);
            }
            commit(state, seat, price); // short stacks call all-in
            mark_acted(state, seat);
        }
        HoldemAction::Bet { to } => {
            if state.betting.current_bet != 0 {
                return Err(ActionError::CannotBetWhenOpened);
            }
            if to < state.config.big_blind {
                return Err(ActionError::BelowMinimum);
            }
            let needed = to.saturating_sub(state.seat(seat).bet);
            if needed > state.seat(seat).chips {
                return Err(ActionError::InsufficientChips);
            }
            commit(state, seat, needed);
            mark_acted(state, seat);
            state.betting.current_bet = to;
            register_full_raise(state, seat, to);
        }
        HoldemAction::Raise { to } => {
            if state.betting.current_bet == 0 {
                return Err(ActionError::CannotRaiseUnopened);
            }
            if to < min_raise_to(state) {
                return Err(ActionError::BelowMinimum);
            }
            let needed = to.saturating_sub(state.seat(seat).bet);
            if needed > state.seat(seat).chips {
                return Err(ActionError::InsufficientChips);
            }
            let delta = to - state.betting.current_bet;
            commit(state, seat, needed);
            mark_acted(state, seat);
            state.betting.current_bet = to;
            register_full_raise(state, seat, delta);
        }
        HoldemAction::AllIn => {
            let stack = state.seat(seat).chips;
            if stack == 0 {
                return Err(ActionError::ActorCannotAct);
            }
            let total_to = state.seat(seat).bet + stack;
            let current = state.betting.current_bet;
            commit(state, seat, stack);
            state.seat_mut(seat).has_acted = true;
            if total_to > current {
                let delta = total_to - current;
                let full = current == 0 || is_full_raise(state, delta);
                state.betting.current_bet = total_to;
                if full {
                    register_full_raise(state, seat, delta.max(state.config.big_blind));
                }
                // A short all-in raises the price but does not reopen action
                // for seats that already acted.
            }
        }
    }

    let all_in = state.seat(seat).status == SeatStatus::AllIn;
    let events = vec![HandEvent::Action { seat, action, all_in }];

    // One seat left in the hand ends it without a showdown.
    let in_hand = state.in_hand_seats();
    if in_hand.len() == 1 {
        return Ok((RoundTransition::HandEndByFolds { winner: in_hand[0] }, events));
    }

    if state.round_complete() {
        return Ok((RoundTransition::StreetEnd, events));
    }

    let next = state
        .next_pending_after(seat)
        .ok_or(ActionError::IllegalAction)?;
    state.to_act = Some(next);
    Ok((RoundTransition::Continued { next_to_act: next }, events))
}
