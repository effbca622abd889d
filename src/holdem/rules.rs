//! No-limit pricing, raise bookkeeping, side pots, and the legal-action set.

use super::actions::HoldemAction;
use super::state::HoldemState;
use super::types::{Chips, Pot, SeatId, SeatState};

pub fn price_to_call(state: &HoldemState, seat: SeatId) -> Chips {
    let s = state.seat(seat);
    if !s.status.can_act() {
        return 0;
    }
    state.betting.current_bet.saturating_sub(s.bet)
}

/// Minimum total a raise must reach: the current bet plus the last full
/// raise (never less than the big blind).
pub fn min_raise_to(state: &HoldemState) -> Chips {
    state.betting.current_bet + state.betting.min_raise.max(state.config.big_blind)
}

pub fn is_full_raise(state: &HoldemState, raise_delta: Chips) -> bool {
    raise_delta >= state.betting.min_raise.max(state.config.big_blind)
}

/// Side pots from the multiset of committed totals.
///
/// Levels are the unique totals of seats still in the hand; each tier takes
/// `min(invested, level) - min(invested, prev)` from every contributor, so
/// folded money lands in the tiers it reached. Anything a folded seat put in
/// above the top live level spills into the last pot.
pub fn compute_pots(seats: &[SeatState]) -> Vec<Pot> {
    let total_swept: Chips = seats.iter().map(|s| s.total_invested).sum();
    if total_swept == 0 {
        return Vec::new();
    }

    let mut levels: Vec<Chips> = seats
        .iter()
        .filter(|s| s.status.in_hand() && s.total_invested > 0)
        .map(|s| s.total_invested)
        .collect();
    levels.sort_unstable();
    levels.dedup();
    if levels.is_empty() {
        // Only folded money remains; the fold-out settlement path awards it.
        return vec![Pot { amount: total_swept, eligible: Vec::new(), is_main: true }];
    }

    let mut pots = Vec::with_capacity(levels.len());
    let mut prev: Chips = 0;
    let mut accounted: Chips = 0;
    for (idx, &level) in levels.iter().enumerate() {
        let mut amount: Chips = 0;
        for seat in seats {
            amount += seat.total_invested.min(level).saturating_sub(prev.min(seat.total_invested));
        }
        let eligible: Vec<SeatId> = seats
            .iter()
            .filter(|s| s.status.in_hand() && s.total_invested >= level)
            .map(|s| s.index)
            .collect();
        accounted += amount;
        pots.push(Pot { amount, eligible, is_main: idx == 0 });
        prev = level;
    }
    // Folded chips above the top live level.
    let residual = total_swept - accounted;
    if residual > 0 {
        if let Some(last) = pots.last_mut() {
            last.amount += residual;
        }
    }
    pots
}

/// The discrete candidate set the orchestrator treats as legality itself:
/// fold or check, call, the minimum wager, a pot-sized wager, and all-in.
/// Order matters; `legal[0]` is the misbehavior fallback (fold facing a bet,
/// check otherwise).
pub fn legal_actions(state: &HoldemState, seat: SeatId) -> Vec<HoldemAction> {
    if state.finished || state.to_act != Some(seat) {
        return Vec::new();
    }
    let s = state.seat(seat);
    if !s.status.can_act() || s.chips == 0 {
        return Vec::new();
    }

    let price = price_to_call(state, seat);
    let reach = s.bet + s.chips; // highest total this seat can bet to
    let mut out = Vec::new();

    if price > 0 {
        out.push(HoldemAction::Fold);
        out.push(HoldemAction::Call);
    } else {
        out.push(HoldemAction::Check);
    }

    if state.betting.current_bet == 0 {
        let min_to = state.config.big_blind;
        if reach > min_to {
            out.push(HoldemAction::Bet { to: min_to });
            let pot_to = state.pot_total();
            if pot_to > min_to && pot_to < reach {
                out.push(HoldemAction::Bet { to: pot_to });
            }
        }
    } else if !s.has_acted {
        // A seat that already acted may not raise again unless a full raise
        // reopened the action (which clears `has_acted`).
        let min_to = min_raise_to(state);
        if reach > min_to {
            out.push(HoldemAction::Raise { to: min_to });
            let pot_to = state.betting.current_bet + state.pot_total() + price;
            if pot_to > min_to && pot_to < reach {
                out.push(HoldemAction::Raise { to: pot_to });
            }
        }
    }

    out.push(HoldemAction::AllIn);
    out
}
