//! Replay verifier: reconstructs a match from its event log and cross-checks
//! seed, observation hashes, action legality, and final results.

use thiserror::Error;

use crate::canonical::{canonical_bytes_of, canonical_hash};
use crate::events::MatchEvent;
use crate::game::{GameDefinition, ResetParams};
use crate::hashing::verify_seed;
use crate::rng::DeterministicRng;

const LOG_TARGET: &str = "arena::replay";

#[derive(Clone, Debug)]
pub struct ReplayOptions {
    /// Disable for schemas whose observations carry externally supplied,
    /// non-canonicalizable data.
    pub check_observation_hashes: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self { check_observation_hashes: true }
    }
}

/// One discrepancy found while replaying. The verifier accumulates all of
/// them instead of stopping at the first.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ReplayIssue {
    #[error("missing {which} event")]
    MissingEvent { which: &'static str },
    #[error("seed reveal does not match the published commitment")]
    SeedMismatch,
    #[error("observation hash mismatch at turn {turn}")]
    ObservationHashMismatch { turn: u64 },
    #[error("recorded action is not legal at turn {turn}")]
    ActionIllegal { turn: u64 },
    #[error("recorded action failed to decode at turn {turn}: {detail}")]
    ActionDecode { turn: u64, detail: String },
    #[error("final results do not match the reconstructed state")]
    ResultsMismatch,
    #[error("replay state error: {detail}")]
    State { detail: String },
}

#[derive(Clone, Debug)]
pub struct ReplayReport {
    pub success: bool,
    pub match_id: Option<String>,
    pub errors: Vec<ReplayIssue>,
    pub turns_verified: u64,
    pub total_turns: u64,
}

/// Replay `events` against `game` and report every discrepancy.
///
/// Read-only: the log is never mutated. Per-turn `events` annotations are
/// game-authored commentary and are ignored here; state is re-derived purely
/// from the revealed seed and the recorded actions.
pub fn verify_replay<G>(game: &G, events: &[MatchEvent], opts: &ReplayOptions) -> ReplayReport
where
    G: GameDefinition,
{
    let mut errors: Vec<ReplayIssue> = Vec::new();
    let mut turns_verified: u64 = 0;

    let start = events.iter().find_map(|e| match e {
        MatchEvent::MatchStart { match_id, agents, seed_commit, config, .. } => {
            Some((match_id.clone(), agents.len(), seed_commit.clone(), config.clone()))
        }
        _ => None,
    });
    let end = events.iter().rev().find_map(|e| match e {
        MatchEvent::MatchEnd { seed_reveal, results, total_turns, .. } => {
            Some((seed_reveal.clone(), results.clone(), *total_turns))
        }
        _ => None,
    });

    let match_id = start.as_ref().map(|(id, ..)| id.clone());
    if start.is_none() {
        errors.push(ReplayIssue::MissingEvent { which: "MATCH_START" });
    }
    if end.is_none() {
        errors.push(ReplayIssue::MissingEvent { which: "MATCH_END" });
    }
    let (Some((_, num_players, seed_commit, config_value)), Some((seed_reveal, recorded_results, total_turns))) =
        (start, end)
    else {
        return ReplayReport { success: false, match_id, errors, turns_verified: 0, total_turns: 0 };
    };

    if !verify_seed(&seed_reveal, &seed_commit) {
        errors.push(ReplayIssue::SeedMismatch);
    }

    let config: G::Config = match config_value {
        Some(value) => match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                errors.push(ReplayIssue::State { detail: format!("config failed to decode: {e}") });
                return ReplayReport { success: false, match_id, errors, turns_verified, total_turns };
            }
        },
        None => G::Config::default(),
    };

    let mut rng = DeterministicRng::new(seed_reveal.clone());
    // Reset events are annotations, ignored here like the per-turn ones.
    let mut state = match game.reset(ResetParams { seed: &seed_reveal, num_players, config }) {
        Ok(outcome) => outcome.state,
        Err(e) => {
            errors.push(ReplayIssue::State { detail: format!("reset failed: {e}") });
            return ReplayReport { success: false, match_id, errors, turns_verified, total_turns };
        }
    };

    let turns: Vec<&MatchEvent> = events
        .iter()
        .filter(|e| matches!(e, MatchEvent::Turn { .. }))
        .collect();
    if turns.len() as u64 != total_turns {
        errors.push(ReplayIssue::State {
            detail: format!("log has {} turn events but MATCH_END reports {total_turns}", turns.len()),
        });
    }

    let mut diverged = false;
    for (expected_index, event) in turns.iter().enumerate() {
        let MatchEvent::Turn {
            turn_index,
            player_index,
            observation_hash,
            action,
            illegal_action,
            ..
        } = event
        else {
            continue;
        };
        if *turn_index != expected_index as u64 {
            errors.push(ReplayIssue::State {
                detail: format!("turn {turn_index} out of order, expected {expected_index}"),
            });
        }

        match game.current_player(&state) {
            Some(pid) if pid == *player_index => {}
            other => {
                errors.push(ReplayIssue::State {
                    detail: format!(
                        "turn {turn_index} recorded for player {player_index} but state expects {other:?}"
                    ),
                });
                diverged = true;
                break;
            }
        }

        if opts.check_observation_hashes {
            let observation = game.observe(&state, *player_index);
            match canonical_hash(&observation) {
                Ok(actual) if actual == *observation_hash => {}
                Ok(_) => errors.push(ReplayIssue::ObservationHashMismatch { turn: *turn_index }),
                Err(e) => errors.push(ReplayIssue::State {
                    detail: format!("observation at turn {turn_index} not hashable: {e}"),
                }),
            }
        }

        let decoded: G::Action = match serde_json::from_value(action.clone()) {
            Ok(decoded) => decoded,
            Err(e) => {
                errors.push(ReplayIssue::ActionDecode {
                    turn: *turn_index,
                    detail: e.to_string(),
                });
                diverged = true;
                break;
            }
        };

        let legal = game.legal_actions(&state, *player_index);
        let action_bytes = canonical_bytes_of(&decoded).ok();
        let is_legal = legal.iter().any(|candidate| {
            canonical_bytes_of(candidate).ok() == action_bytes && action_bytes.is_some()
        });
        if !is_legal && !*illegal_action {
            errors.push(ReplayIssue::ActionIllegal { turn: *turn_index });
        }

        match game.step(&state, *player_index, &decoded, &mut rng) {
            Ok(outcome) => {
                state = outcome.state;
                turns_verified += 1;
            }
            Err(e) => {
                errors.push(ReplayIssue::State {
                    detail: format!("step failed at turn {turn_index}: {e}"),
                });
                diverged = true;
                break;
            }
        }
    }

    if !diverged {
        if game.is_terminal(&state) {
            match game.results(&state) {
                Ok(actual) => {
                    let matches = canonical_bytes_of(&actual).ok()
                        == canonical_bytes_of(&recorded_results).ok();
                    if !matches {
                        errors.push(ReplayIssue::ResultsMismatch);
                    }
                }
                Err(e) => errors.push(ReplayIssue::State {
                    detail: format!("results unavailable after replay: {e}"),
                }),
            }
        } else {
            errors.push(ReplayIssue::State {
                detail: "state is not terminal after replaying all turns".to_string(),
            });
        }
    }

    let success = errors.is_empty();
    tracing::info!(
        target = LOG_TARGET,
        match_id = ?match_id,
        success,
        turns_verified,
        issues = errors.len(),
        "replay verification finished"
    );
    ReplayReport { success, match_id, errors, turns_verified, total_turns }
}
