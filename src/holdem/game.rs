//! `GameDefinition` implementation: hand lifecycle, blinds, elimination.

use crate::game::{
    GameDefinition, GameError, MatchResults, PlayerCount, ResetOutcome, ResetParams, StepOutcome,
};
use crate::rng::DeterministicRng;

use super::actions::HoldemAction;
use super::betting::{self, RoundTransition};
use super::cards::standard_deck;
use super::errors::{ActionError, StateError};
use super::events::{into_records, BlindKind, HandEvent};
use super::observe::{observe, HoldemObservation};
use super::rules;
use super::showdown;
use super::state::{BettingRound, HoldemState};
use super::types::{Chips, HoldemConfig, SeatId, SeatState, SeatStatus, Street};

const LOG_TARGET: &str = "arena::holdem";

pub const GAME_ID: &str = "nl-holdem";
pub const GAME_VERSION: &str = "1.0.0";

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// No-Limit Texas Hold'em, the reference discipline.
#[derive(Clone, Copy, Debug, Default)]
pub struct HoldemGame;

impl From<StateError> for GameError {
    fn from(err: StateError) -> Self {
        GameError::InvariantViolation(err.to_string())
    }
}

fn action_error(player: SeatId, err: ActionError) -> GameError {
    GameError::IllegalAction { player, detail: err.to_string() }
}

impl HoldemGame {
    /// Rotate the button, post blinds, shuffle a forked deck, and deal.
    /// Leaves `to_act` as `None` when the blinds already ended all action
    /// (both seats all-in), which the callers resolve with an immediate
    /// runout.
    fn start_hand(
        &self,
        state: &mut HoldemState,
        deck_rng: DeterministicRng,
        events: &mut Vec<HandEvent>,
    ) -> Result<(), StateError> {
        state.hand_number += 1;

        for seat in state.seats.iter_mut() {
            seat.bet = 0;
            seat.total_invested = 0;
            seat.hole_cards = None;
            seat.has_acted = false;
            seat.is_button = false;
            seat.is_sb = false;
            seat.is_bb = false;
            seat.status = if seat.chips > 0 {
                SeatStatus::Waiting
            } else {
                SeatStatus::SittingOut
            };
        }

        let live: Vec<SeatId> = state
            .seats
            .iter()
            .filter(|s| s.status == SeatStatus::Waiting)
            .map(|s| s.index)
            .collect();
        if live.len() < 2 {
            return Err(StateError::InvariantViolation(
                "hand started with fewer than two funded seats".to_string(),
            ));
        }

        let button = state
            .next_seat_where(state.button, |s| s.status == SeatStatus::Waiting)
            .ok_or_else(|| StateError::InvariantViolation("no live button".to_string()))?;
        state.button = button;
        state.seat_mut(button).is_button = true;

        // Heads-up: the button posts the small blind.
        let (sb_seat, bb_seat) = if live.len() == 2 {
            let other = state
                .next_seat_where(button, |s| s.status == SeatStatus::Waiting)
                .ok_or_else(|| StateError::InvariantViolation("missing blind seat".to_string()))?;
            (button, other)
        } else {
            let sb = state
                .next_seat_where(button, |s| s.status == SeatStatus::Waiting)
                .ok_or_else(|| StateError::InvariantViolation("missing blind seat".to_string()))?;
            let bb = state
                .next_seat_where(sb, |s| s.status == SeatStatus::Waiting)
                .ok_or_else(|| StateError::InvariantViolation("missing blind seat".to_string()))?;
            (sb, bb)
        };
        state.seat_mut(sb_seat).is_sb = true;
        state.seat_mut(bb_seat).is_bb = true;

        events.push(HandEvent::HandStart {
            hand_number: state.hand_number,
            button,
            small_blind_seat: sb_seat,
            big_blind_seat: bb_seat,
        });

        let mut deck_rng = deck_rng;
        state.deck = deck_rng.shuffle(&standard_deck());
        state.next_card = 0;
        state.burns.clear();
        state.community.clear();
        state.pots.clear();

        for (seat, blind, amount) in [
            (sb_seat, BlindKind::Small, state.config.small_blind),
            (bb_seat, BlindKind::Big, state.config.big_blind),
        ] {
            let s = state.seat_mut(seat);
            let pay = amount.min(s.chips);
            s.chips -= pay;
            s.bet += pay;
            let all_in = s.chips == 0;
            if all_in {
                s.status = SeatStatus::AllIn;
            }
            events.push(HandEvent::BlindPosted { seat, blind, amount: pay, all_in });
        }

        // Two cards each, one at a time, starting left of the button.
        let mut order = Vec::with_capacity(live.len());
        let mut cursor = button;
        for _ in 0..live.len() {
            cursor = state
                .next_seat_where(cursor, |s| s.status.in_hand())
                .ok_or_else(|| StateError::InvariantViolation("deal order broke".to_string()))?;
            order.push(cursor);
        }
        let mut firsts = Vec::with_capacity(order.len());
        for _ in &order {
            firsts.push(state.draw_card()?);
        }
        for (slot, &seat) in order.iter().enumerate() {
            let second = state.draw_card()?;
            state.seat_mut(seat).hole_cards = Some([firsts[slot], second]);
        }

        state.betting = BettingRound {
            street: Street::Preflop,
            current_bet: state.config.big_blind,
            min_raise: state.config.big_blind,
            last_raiser: None,
            num_raises: 0,
            pot_before_street: 0,
        };
        state.to_act = state.first_to_act(Street::Preflop);
        Ok(())
    }

    /// Close out the completed hand and either start the next one or mark
    /// the match finished. Loops because a freshly started hand can already
    /// be all-in from the blinds.
    fn finish_hand(
        &self,
        state: &mut HoldemState,
        rng: &DeterministicRng,
        events: &mut Vec<HandEvent>,
    ) -> Result<(), StateError> {
        loop {
            state.hands_completed += 1;
            events.push(HandEvent::HandEnd {
                hand_number: state.hand_number,
                chips: state.seats.iter().map(|s| s.chips).collect(),
            });

            let funded = state.seats.iter().filter(|s| s.chips > 0).count();
            let capped = state
                .config
                .max_hands
                .map_or(false, |max| state.hands_completed >= max);
            if funded < 2 || capped {
                tracing::debug!(
                    target = LOG_TARGET,
                    hands = state.hands_completed,
                    funded,
                    "match over"
                );
                state.finished = true;
                state.to_act = None;
                return Ok(());
            }

            let label = format!("new-hand:{}", state.hand_number + 1);
            self.start_hand(state, rng.fork(&label), events)?;
            if state.to_act.is_some() {
                return Ok(());
            }

            // The blinds put everyone all-in; run this hand out immediately.
            state.sweep_bets();
            events.extend(showdown::run_out(state)?);
            events.extend(showdown::resolve_showdown(state)?);
        }
    }
}

impl GameDefinition for HoldemGame {
    type State = HoldemState;
    type Action = HoldemAction;
    type Observation = HoldemObservation;
    type Config = HoldemConfig;

    fn id(&self) -> &str {
        GAME_ID
    }

    fn version(&self) -> &str {
        GAME_VERSION
    }

    fn player_count(&self) -> PlayerCount {
        PlayerCount::Range { min: MIN_PLAYERS, max: MAX_PLAYERS }
    }

    fn reset(
        &self,
        params: ResetParams<'_, HoldemConfig>,
    ) -> Result<ResetOutcome<HoldemState>, GameError> {
        let count = self.player_count();
        if !count.supports(params.num_players) {
            return Err(GameError::InvalidPlayerCount {
                got: params.num_players,
                min: count.min(),
                max: count.max(),
            });
        }
        let config = params.config;
        if config.small_blind == 0 || config.big_blind < config.small_blind {
            return Err(GameError::InvalidConfig(
                "blinds must satisfy 0 < smallBlind <= bigBlind".to_string(),
            ));
        }
        // Stacks below the blinds are playable: forced posts go all-in short.
        if config.starting_chips == 0 {
            return Err(GameError::InvalidConfig(
                "startingChips must be positive".to_string(),
            ));
        }
        if config.max_hands == Some(0) {
            return Err(GameError::InvalidConfig("maxHands must be positive".to_string()));
        }

        let seats: Vec<SeatState> = (0..params.num_players)
            .map(|i| SeatState::new(i, config.starting_chips))
            .collect();
        let total_chips: Chips = config.starting_chips * params.num_players as Chips;
        let mut state = HoldemState {
            seed: params.seed.to_string(),
            config,
            hand_number: 0,
            hands_completed: 0,
            // One before the first seat, so the opening rotation lands on 0.
            button: params.num_players - 1,
            seats,
            deck: Vec::new(),
            next_card: 0,
            burns: Vec::new(),
            community: Vec::new(),
            betting: BettingRound {
                street: Street::Preflop,
                current_bet: 0,
                min_raise: 0,
                last_raiser: None,
                num_raises: 0,
                pot_before_street: 0,
            },
            pots: Vec::new(),
            to_act: None,
            total_chips,
            finished: false,
        };

        let base = DeterministicRng::new(params.seed);
        let mut events = Vec::new();
        self.start_hand(&mut state, base.fork("new-hand:1"), &mut events)?;
        if state.to_act.is_none() {
            // Forced posts left nobody able to act; the opening hand (and
            // any equally degenerate successors) resolves right here.
            state.sweep_bets();
            events.extend(showdown::run_out(&mut state)?);
            events.extend(showdown::resolve_showdown(&mut state)?);
            self.finish_hand(&mut state, &base, &mut events)?;
        }
        Ok(ResetOutcome::with_events(state, into_records(events)))
    }

    fn observe(&self, state: &HoldemState, player: usize) -> HoldemObservation {
        observe(state, player)
    }

    fn legal_actions(&self, state: &HoldemState, player: usize) -> Vec<HoldemAction> {
        rules::legal_actions(state, player)
    }

    fn current_player(&self, state: &HoldemState) -> Option<usize> {
        if state.finished {
            None
        } else {
            state.to_act
        }
    }

    fn step(
        &self,
        state: &HoldemState,
        player: usize,
        action: &HoldemAction,
        rng: &mut DeterministicRng,
    ) -> Result<StepOutcome<HoldemState>, GameError> {
        if state.finished {
            return Err(GameError::IllegalAction {
                player,
                detail: "match already finished".to_string(),
            });
        }
        let mut state = state.clone();
        let (transition, mut events) = betting::apply_action(&mut state, player, *action)
            .map_err(|e| action_error(player, e))?;

        match transition {
            RoundTransition::Continued { .. } => {}
            RoundTransition::HandEndByFolds { winner } => {
                events.extend(showdown::settle_by_folds(&mut state, winner));
                self.finish_hand(&mut state, rng, &mut events)?;
            }
            RoundTransition::StreetEnd => {
                let street = state.betting.street;
                state.sweep_bets();
                let betting_over = state.actionable_seats().len() < 2;
                if street == Street::River || betting_over {
                    events.extend(showdown::run_out(&mut state)?);
                    events.extend(showdown::resolve_showdown(&mut state)?);
                    self.finish_hand(&mut state, rng, &mut events)?;
                } else {
                    let next_street = street.next().ok_or(StateError::InvalidTransition)?;
                    state.burn_one()?;
                    let cards = state.deal_community(next_street.cards_dealt())?;
                    events.push(HandEvent::StreetDealt { street: next_street, cards });
                    state.begin_street(next_street);
                }
            }
        }

        Ok(StepOutcome { state, events: into_records(events) })
    }

    fn is_terminal(&self, state: &HoldemState) -> bool {
        state.finished
    }

    fn results(&self, state: &HoldemState) -> Result<MatchResults, GameError> {
        if !state.finished {
            return Err(GameError::NotTerminal);
        }
        let scores: Vec<f64> = state.seats.iter().map(|s| s.chips as f64).collect();
        Ok(MatchResults::from_scores(&scores))
    }

    fn hand_number(&self, state: &HoldemState) -> Option<u64> {
        Some(state.hand_number)
    }
}
