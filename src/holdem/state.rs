use serde::{Deserialize, Serialize};

use super::cards::Card;
use super::errors::{InvariantCheck, StateError};
use super::rules;
use super::types::{Chips, HoldemConfig, Pot, SeatId, SeatState, SeatStatus, Street};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BettingRound {
    pub street: Street,
    /// Highest `bet` any seat must match this round.
    pub current_bet: Chips,
    /// Last full-raise delta; the next raise must add at least this much.
    pub min_raise: Chips,
    pub last_raiser: Option<SeatId>,
    pub num_raises: u32,
    pub pot_before_street: Chips,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldemState {
    pub seed: String,
    pub config: HoldemConfig,
    pub hand_number: u64,
    pub hands_completed: u64,
    pub button: SeatId,
    pub seats: Vec<SeatState>,
    pub deck: Vec<Card>,
    /// Draw cursor into `deck`; keeps the deck indexable for replay.
    pub next_card: usize,
    pub burns: Vec<Card>,
    pub community: Vec<Card>,
    pub betting: BettingRound,
    pub pots: Vec<Pot>,
    pub to_act: Option<SeatId>,
    /// Chip total at reset; conservation reference for invariant checks.
    pub total_chips: Chips,
    pub finished: bool,
}

impl HoldemState {
    pub fn seat(&self, id: SeatId) -> &SeatState {
        &self.seats[id]
    }

    pub fn seat_mut(&mut self, id: SeatId) -> &mut SeatState {
        &mut self.seats[id]
    }

    pub fn in_hand_seats(&self) -> Vec<SeatId> {
        self.seats
            .iter()
            .filter(|s| s.status.in_hand())
            .map(|s| s.index)
            .collect()
    }

    pub fn actionable_seats(&self) -> Vec<SeatId> {
        self.seats
            .iter()
            .filter(|s| s.status.can_act())
            .map(|s| s.index)
            .collect()
    }

    /// Whether this seat still owes a decision on the current round.
    pub fn needs_action(&self, id: SeatId) -> bool {
        let seat = self.seat(id);
        seat.status.can_act() && (seat.bet != self.betting.current_bet || !seat.has_acted)
    }

    /// First seat after `from` (cyclic) satisfying `pred`.
    pub fn next_seat_where<F>(&self, from: SeatId, pred: F) -> Option<SeatId>
    where
        F: Fn(&SeatState) -> bool,
    {
        let n = self.seats.len();
        (1..=n)
            .map(|offset| (from + offset) % n)
            .find(|&id| pred(&self.seats[id]))
    }

    pub fn next_pending_after(&self, from: SeatId) -> Option<SeatId> {
        self.next_seat_where(from, |s| {
            s.status.can_act() && (s.bet != self.betting.current_bet || !s.has_acted)
        })
    }

    /// The round is over once nobody who can act still owes a match or a
    /// first decision.
    pub fn round_complete(&self) -> bool {
        self.seats.iter().all(|s| !self.needs_action(s.index))
    }

    /// Roll current-street bets into `total_invested` and rebuild the pots.
    pub fn sweep_bets(&mut self) {
        for seat in &mut self.seats {
            seat.total_invested += seat.bet;
            seat.bet = 0;
        }
        self.rebuild_pots();
    }

    pub fn rebuild_pots(&mut self) {
        self.pots = rules::compute_pots(&self.seats);
    }

    /// Chips in the middle, live bets included.
    pub fn pot_total(&self) -> Chips {
        let swept: Chips = self.pots.iter().map(|p| p.amount).sum();
        let live: Chips = self.seats.iter().map(|s| s.bet).sum();
        swept + live
    }

    /// Open a fresh betting round. Bets must already be swept.
    pub fn begin_street(&mut self, street: Street) {
        for seat in &mut self.seats {
            if seat.status == SeatStatus::Acted {
                seat.status = SeatStatus::Waiting;
            }
            if seat.status.can_act() {
                seat.has_acted = false;
            }
        }
        self.betting = BettingRound {
            street,
            current_bet: 0,
            min_raise: self.config.big_blind,
            last_raiser: None,
            num_raises: 0,
            pot_before_street: self.pots.iter().map(|p| p.amount).sum(),
        };
        self.to_act = self.first_to_act(street);
    }

    /// Preflop action starts left of the big blind; postflop, left of the
    /// button.
    pub fn first_to_act(&self, street: Street) -> Option<SeatId> {
        let anchor = match street {
            Street::Preflop => self
                .seats
                .iter()
                .find(|s| s.is_bb)
                .map(|s| s.index)
                .unwrap_or(self.button),
            _ => self.button,
        };
        self.next_pending_after(anchor)
    }

    pub fn draw_card(&mut self) -> Result<Card, StateError> {
        let card = self
            .deck
            .get(self.next_card)
            .copied()
            .ok_or(StateError::DeckExhausted)?;
        self.next_card += 1;
        Ok(card)
    }

    pub fn burn_one(&mut self) -> Result<(), StateError> {
        let card = self.draw_card()?;
        self.burns.push(card);
        Ok(())
    }

    pub fn deal_community(&mut self, count: usize) -> Result<Vec<Card>, StateError> {
        let mut dealt = Vec::with_capacity(count);
        for _ in 0..count {
            let card = self.draw_card()?;
            self.community.push(card);
            dealt.push(card);
        }
        Ok(dealt)
    }
}

impl InvariantCheck for HoldemState {
    fn validate_invariants(&self) -> Result<(), StateError> {
        // Chip conservation.
        let held: Chips = self.seats.iter().map(|s| s.chips).sum();
        let committed: Chips = self.seats.iter().map(|s| s.committed()).sum();
        if held + committed != self.total_chips {
            return Err(StateError::InvariantViolation(format!(
                "chips do not balance: {held} held + {committed} committed != {}",
                self.total_chips
            )));
        }

        // Pots carry exactly the swept money.
        let potted: Chips = self.pots.iter().map(|p| p.amount).sum();
        let swept: Chips = self.seats.iter().map(|s| s.total_invested).sum();
        if potted != swept {
            return Err(StateError::InvariantViolation(format!(
                "pots hold {potted} but {swept} was swept"
            )));
        }

        // Out-of-hand seats are never pot-eligible, and eligibility shrinks
        // monotonically from the main pot down the side pots.
        let mut previous: Option<&Pot> = None;
        for pot in &self.pots {
            for &id in &pot.eligible {
                if !self.seats[id].status.in_hand() {
                    return Err(StateError::InvariantViolation(format!(
                        "seat {id} is out of the hand but eligible for a pot"
                    )));
                }
            }
            if let Some(prev) = previous {
                if !pot.eligible.iter().all(|id| prev.eligible.contains(id)) {
                    return Err(StateError::InvariantViolation(
                        "side-pot eligibility is not a subset chain".to_string(),
                    ));
                }
            }
            previous = Some(pot);
        }
        Ok(())
    }
}
