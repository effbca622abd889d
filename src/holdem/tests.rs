#![cfg(test)]

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::canonical::canonical_hash;
use crate::game::{GameDefinition, ResetParams};
use crate::rng::DeterministicRng;

use super::actions::HoldemAction;
use super::cards::{Card, Suit};
use super::errors::InvariantCheck;
use super::game::HoldemGame;
use super::state::HoldemState;
use super::types::{Chips, HoldemConfig, Position, SeatStatus, Street};

fn reset(
    num_players: usize,
    config: HoldemConfig,
    seed: &str,
) -> (HoldemGame, HoldemState, DeterministicRng) {
    let game = HoldemGame;
    let outcome = game
        .reset(ResetParams { seed, num_players, config })
        .unwrap();
    (game, outcome.state, DeterministicRng::new(seed))
}

fn act(
    game: &HoldemGame,
    state: &HoldemState,
    rng: &mut DeterministicRng,
    action: HoldemAction,
) -> HoldemState {
    let player = game.current_player(state).expect("someone to act");
    let legal = game.legal_actions(state, player);
    assert!(
        legal.contains(&action),
        "action {action:?} not legal for seat {player}: {legal:?}"
    );
    let outcome = game.step(state, player, &action, rng).unwrap();
    outcome.state.validate_invariants().unwrap();
    outcome.state
}

fn total_chips(state: &HoldemState) -> Chips {
    state.seats.iter().map(|s| s.chips + s.committed()).sum()
}

#[test]
fn heads_up_fold_hands_the_blinds_to_the_big_blind() {
    let config = HoldemConfig::default().single_hand();
    let (game, state, mut rng) = reset(2, config, "fold-test");

    // Button is seat 0 and posts the small blind heads-up; it acts first.
    assert!(state.seat(0).is_button && state.seat(0).is_sb);
    assert!(state.seat(1).is_bb);
    assert_eq!(game.current_player(&state), Some(0));
    let legal = game.legal_actions(&state, 0);
    assert_eq!(legal[0], HoldemAction::Fold);

    let state = act(&game, &state, &mut rng, HoldemAction::Fold);
    assert!(game.is_terminal(&state));
    assert_eq!(state.seat(0).chips, 990);
    assert_eq!(state.seat(1).chips, 1010);

    let results = game.results(&state).unwrap();
    assert_eq!(results.winner, Some(1));
    assert!(!results.is_draw);
    assert_eq!(results.players[1].rank, 1);
}

#[test]
fn heads_up_raise_and_fold_moves_the_raise_back() {
    let config = HoldemConfig::default().single_hand();
    let (game, state, mut rng) = reset(2, config, "raise-fold");
    let state = act(&game, &state, &mut rng, HoldemAction::Raise { to: 60 });
    let state = act(&game, &state, &mut rng, HoldemAction::Fold);
    assert!(game.is_terminal(&state));
    assert_eq!(state.seat(0).chips, 1020);
    assert_eq!(state.seat(1).chips, 980);
}

#[test]
fn checked_down_hand_reaches_showdown_with_a_full_board() {
    let config = HoldemConfig::default().single_hand();
    let (game, state, mut rng) = reset(2, config, "check-down");

    // Preflop: button completes, big blind checks the option.
    let state = act(&game, &state, &mut rng, HoldemAction::Call);
    assert_eq!(game.current_player(&state), Some(1));
    let state = act(&game, &state, &mut rng, HoldemAction::Check);
    assert_eq!(state.betting.street, Street::Flop);
    assert_eq!(state.community.len(), 3);
    // Postflop the big blind acts first heads-up.
    assert_eq!(game.current_player(&state), Some(1));

    let mut state = state;
    for _ in 0..2 {
        state = act(&game, &state, &mut rng, HoldemAction::Check);
    }
    assert_eq!(state.betting.street, Street::Turn);
    for _ in 0..2 {
        state = act(&game, &state, &mut rng, HoldemAction::Check);
    }
    assert_eq!(state.betting.street, Street::River);
    for _ in 0..2 {
        state = act(&game, &state, &mut rng, HoldemAction::Check);
    }

    assert!(game.is_terminal(&state));
    assert_eq!(state.community.len(), 5);
    assert_eq!(state.burns.len(), 3);
    // 2 seats x 2 hole cards + 3 burns + 5 community drawn from the deck.
    assert_eq!(state.next_card, 12);
    assert_eq!(total_chips(&state), 2000);
}

#[test]
fn preflop_all_in_call_runs_the_board_out() {
    let config = HoldemConfig::default().single_hand();
    let (game, state, mut rng) = reset(2, config, "allin-runout");
    let state = act(&game, &state, &mut rng, HoldemAction::AllIn);
    let state = act(&game, &state, &mut rng, HoldemAction::Call);

    assert!(game.is_terminal(&state));
    assert_eq!(state.community.len(), 5);
    assert_eq!(state.burns.len(), 3);
    assert_eq!(total_chips(&state), 2000);
    // Either one side doubled or the board chopped the stacks back.
    let chips: Vec<Chips> = state.seats.iter().map(|s| s.chips).collect();
    assert!(chips == vec![2000, 0] || chips == vec![0, 2000] || chips == vec![1000, 1000]);
}

#[test]
fn elimination_without_hand_cap_finishes_the_match() {
    let config = HoldemConfig { max_hands: None, ..HoldemConfig::default() };
    let (game, state, mut rng) = reset(2, config, "stack-out");
    let state = act(&game, &state, &mut rng, HoldemAction::AllIn);
    let state = act(&game, &state, &mut rng, HoldemAction::Call);

    assert_eq!(total_chips(&state), 2000);
    if game.is_terminal(&state) {
        // Someone was felted; the survivor holds everything.
        assert!(state.seats.iter().any(|s| s.chips == 2000));
    } else {
        // Chopped pot: the next hand is already under way.
        assert!(state.to_act.is_some());
        assert_eq!(state.hand_number, 2);
    }
}

#[test]
fn six_handed_positions_follow_the_button() {
    let (game, state, _) = reset(6, HoldemConfig::default(), "positions");
    assert_eq!(state.button, 0);
    assert!(state.seat(1).is_sb && state.seat(2).is_bb);
    // UTG opens the preflop action.
    assert_eq!(game.current_player(&state), Some(3));

    let obs = game.observe(&state, 0);
    let positions: Vec<Option<Position>> = obs.seats.iter().map(|s| s.position).collect();
    assert_eq!(
        positions,
        vec![
            Some(Position::Btn),
            Some(Position::Sb),
            Some(Position::Bb),
            Some(Position::Utg),
            Some(Position::Hj),
            Some(Position::Co),
        ]
    );
}

#[test]
fn observations_hide_other_seats_hole_cards() {
    let (game, state, _) = reset(3, HoldemConfig::default(), "privacy");

    // Perturb seat 1's hole cards; seat 0's observation must not change.
    let mut perturbed = state.clone();
    perturbed.seats[1].hole_cards = Some([Card::new(2, Suit::Clubs), Card::new(3, Suit::Clubs)]);

    let before = canonical_hash(&game.observe(&state, 0)).unwrap();
    let after = canonical_hash(&game.observe(&perturbed, 0)).unwrap();
    assert_eq!(before, after);

    // While seat 1 itself sees the difference.
    let own_before = canonical_hash(&game.observe(&state, 1)).unwrap();
    let own_after = canonical_hash(&game.observe(&perturbed, 1)).unwrap();
    assert_ne!(own_before, own_after);
}

#[test]
fn observation_exposes_own_cards_only() {
    let (game, state, _) = reset(3, HoldemConfig::default(), "own-cards");
    let obs = game.observe(&state, 2);
    assert_eq!(obs.player_index, 2);
    assert_eq!(obs.hole_cards, state.seats[2].hole_cards);
    for seat in &obs.seats {
        // SeatView carries no card fields at all; spot-check the JSON.
        let value = serde_json::to_value(seat).unwrap();
        assert!(value.get("holeCards").is_none());
        assert!(value.get("hole_cards").is_none());
    }
}

#[test]
fn decks_are_deterministic_per_seed_and_differ_across_hands() {
    let (_, a, _) = reset(2, HoldemConfig::default(), "deck-seed");
    let (_, b, _) = reset(2, HoldemConfig::default(), "deck-seed");
    assert_eq!(a.deck, b.deck);

    let (_, c, _) = reset(2, HoldemConfig::default(), "deck-seed-2");
    assert_ne!(a.deck, c.deck);
}

#[test]
fn blinds_are_posted_short_when_stacks_cannot_cover() {
    let config = HoldemConfig {
        starting_chips: 20,
        small_blind: 10,
        big_blind: 20,
        max_hands: Some(1),
    };
    // Big blind exactly covers and is all-in from the post; the small
    // blind still has chips, so the hand waits on its decision.
    let (game, state, _) = reset(2, config, "short-blind");
    assert!(!game.is_terminal(&state));
    assert_eq!(state.seat(1).status, SeatStatus::AllIn);
    assert_eq!(state.seat(1).bet, 20);
    assert_eq!(game.current_player(&state), Some(0));
    assert_eq!(total_chips(&state), 40);
}

#[test]
fn reset_surfaces_the_opening_hand_events() {
    let game = HoldemGame;
    let outcome = game
        .reset(ResetParams {
            seed: "reset-events",
            num_players: 2,
            config: HoldemConfig::default(),
        })
        .unwrap();
    let kinds: Vec<&str> = outcome.events.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, vec!["HAND_START", "BLIND_POSTED", "BLIND_POSTED"]);
}

#[test]
fn blinds_that_consume_both_stacks_resolve_the_hand_in_reset() {
    // Both forced posts are all-in, so no seat can act: the whole opening
    // hand (runout included) happens inside reset.
    let config = HoldemConfig {
        starting_chips: 10,
        small_blind: 10,
        big_blind: 20,
        max_hands: Some(1),
    };
    let game = HoldemGame;
    let outcome = game
        .reset(ResetParams { seed: "blind-all-in", num_players: 2, config })
        .unwrap();
    let state = outcome.state;

    assert!(game.is_terminal(&state));
    assert_eq!(game.current_player(&state), None);
    assert_eq!(state.hands_completed, 1);
    assert_eq!(state.community.len(), 5);
    assert_eq!(state.burns.len(), 3);
    assert_eq!(total_chips(&state), 20);

    let results = game.results(&state).unwrap();
    let score_sum: f64 = results.players.iter().map(|p| p.score).sum();
    assert!((score_sum - 20.0).abs() < f64::EPSILON);

    // The hand's whole story rides on the reset outcome.
    let kinds: Vec<&str> = outcome.events.iter().map(|e| e.kind.as_str()).collect();
    assert!(kinds.contains(&"HAND_START"));
    assert_eq!(kinds.iter().filter(|k| **k == "BLIND_POSTED").count(), 2);
    assert!(kinds.contains(&"ALL_IN_RUNOUT"));
    assert!(kinds.contains(&"POT_AWARDED"));
    assert!(kinds.contains(&"HAND_END"));
}

#[test]
fn multi_way_all_ins_split_into_side_pots_and_conserve_chips() {
    let config = HoldemConfig {
        starting_chips: 500,
        small_blind: 10,
        big_blind: 20,
        max_hands: Some(1),
    };
    let (game, state, mut rng) = reset(3, config, "side-pot-hand");
    // Trim stacks to force layered all-ins: 120 / 50 / 500.
    let mut state = state;
    state.seats[0].chips = 120 - state.seats[0].bet;
    state.seats[1].chips = 50 - state.seats[1].bet;
    state.total_chips = 120 + 50 + 500;

    // Seat 0 is the button and opens; everyone shoves or calls.
    let state = act(&game, &state, &mut rng, HoldemAction::AllIn);
    let state = act(&game, &state, &mut rng, HoldemAction::AllIn);
    let state = act(&game, &state, &mut rng, HoldemAction::Call);

    assert!(game.is_terminal(&state));
    assert_eq!(total_chips(&state), 670);
    // Seat 2 covered everyone; whatever happened, it kept its overage.
    assert!(state.seat(2).chips >= 500 - 120);
}

#[test]
fn random_legal_walk_preserves_invariants_to_termination() {
    let mut picker = StdRng::seed_from_u64(0xC0FFEE);
    let config = HoldemConfig {
        starting_chips: 300,
        small_blind: 5,
        big_blind: 10,
        max_hands: Some(4),
    };
    let (game, mut state, mut rng) = reset(3, config, "random-walk");

    let mut steps = 0usize;
    while !game.is_terminal(&state) {
        steps += 1;
        assert!(steps < 2_000, "walk failed to terminate");
        let player = game.current_player(&state).expect("non-terminal state has an actor");
        let legal = game.legal_actions(&state, player);
        assert!(!legal.is_empty());
        let action = legal[picker.gen_range(0..legal.len())];
        let outcome = game.step(&state, player, &action, &mut rng).unwrap();
        state = outcome.state;
        state.validate_invariants().unwrap();
        assert_eq!(total_chips(&state), 900);
    }

    let results = game.results(&state).unwrap();
    let score_sum: f64 = results.players.iter().map(|p| p.score).sum();
    assert!((score_sum - 900.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn full_match_log_replays_cleanly() {
    use crate::agent::Agent;
    use crate::agents::SeededRandomAgent;
    use crate::orchestrator::{run_match, MatchOptions};
    use crate::replay::{verify_replay, ReplayOptions};
    use std::sync::Arc;

    let game = HoldemGame;
    let agents: Vec<Arc<dyn Agent>> = vec![
        Arc::new(SeededRandomAgent::new("hero")),
        Arc::new(SeededRandomAgent::new("villain")),
        Arc::new(SeededRandomAgent::new("third")),
    ];
    let config = HoldemConfig { max_hands: Some(3), ..HoldemConfig::default() };
    let mut opts = MatchOptions::new("holdem-e2e").with_config(config);
    opts.match_id = Some("holdem-e2e-match".to_string());
    let report = run_match(&game, &agents, opts).await.unwrap();

    let score_sum: f64 = report.results.players.iter().map(|p| p.score).sum();
    assert!((score_sum - 3000.0).abs() < f64::EPSILON);

    // The opening hand's annotations ride on MATCH_START.
    let crate::events::MatchEvent::MatchStart { events: Some(start_events), .. } =
        &report.events[0]
    else {
        panic!("expected MATCH_START with reset events");
    };
    assert_eq!(start_events[0].kind, "HAND_START");

    let verified = verify_replay(&game, &report.events, &ReplayOptions::default());
    assert!(verified.success, "replay issues: {:?}", verified.errors);
    assert_eq!(verified.turns_verified, report.total_turns);
}
