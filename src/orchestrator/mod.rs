//! Match lifecycle: couples a discipline with agents under one
//! seed-committed PRNG, enforces per-turn deadlines, and emits the totally
//! ordered event log.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::agent::{sanitize_reason, Agent, DecideClock, DecideInput, TurnMeta};
use crate::canonical::{canonical_bytes_of, canonical_hash, CanonicalError};
use crate::events::{AgentInfo, MatchEvent};
use crate::game::{GameDefinition, GameError, MatchResults, ResetParams};
use crate::hashing::commit_seed;
use crate::rng::DeterministicRng;

const LOG_TARGET: &str = "arena::orchestrator";

pub const DEFAULT_TURN_TIMEOUT_MS: u64 = 5_000;

/// Callback invoked synchronously, in emission order, for every event.
pub type EventSink = Box<dyn FnMut(&MatchEvent) + Send>;

pub struct MatchOptions<C> {
    pub match_id: Option<String>,
    pub seed: String,
    pub turn_timeout_ms: u64,
    pub game_config: Option<C>,
    pub event_sink: Option<EventSink>,
}

impl<C> MatchOptions<C> {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            match_id: None,
            seed: seed.into(),
            turn_timeout_ms: DEFAULT_TURN_TIMEOUT_MS,
            game_config: None,
            event_sink: None,
        }
    }

    pub fn with_config(mut self, config: C) -> Self {
        self.game_config = Some(config);
        self
    }

    pub fn with_timeout_ms(mut self, turn_timeout_ms: u64) -> Self {
        self.turn_timeout_ms = turn_timeout_ms;
        self
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("game step failed at turn {turn}: {source}")]
    GameStep {
        turn: u64,
        #[source]
        source: GameError,
    },
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}

/// Everything a completed match leaves behind.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub match_id: String,
    pub game_id: String,
    pub game_version: String,
    pub seed: String,
    pub seed_commit: String,
    pub agents: Vec<AgentInfo>,
    pub results: MatchResults,
    pub events: Vec<MatchEvent>,
    pub total_turns: u64,
    pub total_time_ms: u64,
}

enum Decision {
    Decided(crate::agent::DecideOutput),
    TimedOut,
    Errored(String),
}

fn spawn_decide<F>(name: String, future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    use tracing::Instrument;
    let span = tracing::info_span!("decide", task_name = %name);
    tokio::spawn(future.instrument(span))
}

fn emit(events: &mut Vec<MatchEvent>, sink: &mut Option<EventSink>, event: MatchEvent) {
    if let Some(sink) = sink.as_mut() {
        sink(&event);
    }
    events.push(event);
}

/// Run one match to completion.
///
/// Agent misbehavior (timeout, illegal action, outright failure) is recovered
/// locally by substituting `legal_actions[0]` and recorded on the `TURN`
/// event. A failing `step` is fatal: the match ends with a best-effort
/// `MATCH_END` and surfaces `MatchError::GameStep`.
pub async fn run_match<G>(
    game: &G,
    agents: &[Arc<dyn Agent>],
    mut opts: MatchOptions<G::Config>,
) -> Result<MatchReport, MatchError>
where
    G: GameDefinition,
{
    let num_players = agents.len();
    let count = game.player_count();
    if !count.supports(num_players) {
        return Err(MatchError::InvalidConfiguration(format!(
            "game {} supports {}..={} players, got {num_players}",
            game.id(),
            count.min(),
            count.max()
        )));
    }

    let match_id = opts
        .match_id
        .take()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let seed = opts.seed.clone();
    let seed_commit = commit_seed(&seed);
    let mut rng = DeterministicRng::new(seed.clone());

    let mut agent_infos = Vec::with_capacity(num_players);
    for agent in agents {
        let meta = agent.metadata();
        agent_infos.push(AgentInfo {
            id: meta.id.clone(),
            version: meta.version.clone(),
            display_name: meta.display_name.clone(),
            fingerprint: meta.fingerprint()?,
        });
    }

    let config = opts.game_config.clone().unwrap_or_default();
    let config_value = match &opts.game_config {
        Some(c) => Some(
            serde_json::to_value(c)
                .map_err(|e| MatchError::InvalidConfiguration(e.to_string()))?,
        ),
        None => None,
    };

    let reset = game
        .reset(ResetParams { seed: &seed, num_players, config })
        .map_err(|e| MatchError::InvalidConfiguration(e.to_string()))?;
    let mut state = reset.state;
    let reset_events = if reset.events.is_empty() {
        None
    } else {
        Some(reset.events)
    };

    let started = Instant::now();
    let mut events: Vec<MatchEvent> = Vec::new();
    let mut sink = opts.event_sink.take();

    tracing::info!(
        target = LOG_TARGET,
        %match_id,
        game_id = %game.id(),
        players = num_players,
        %seed_commit,
        "match starting"
    );

    emit(
        &mut events,
        &mut sink,
        MatchEvent::MatchStart {
            match_id: match_id.clone(),
            started_at: Utc::now(),
            game_id: game.id().to_string(),
            game_version: game.version().to_string(),
            agents: agent_infos.clone(),
            seed_commit: seed_commit.clone(),
            config: config_value,
            events: reset_events,
        },
    );

    let mut turn_index: u64 = 0;
    loop {
        if game.is_terminal(&state) {
            break;
        }
        let Some(pid) = game.current_player(&state) else {
            break;
        };

        let observation = game.observe(&state, pid);
        let observation_value = serde_json::to_value(&observation)
            .map_err(CanonicalError::from)?;
        let observation_hash = canonical_hash(&observation_value)?;

        let legal = game.legal_actions(&state, pid);
        if legal.is_empty() {
            let err = GameError::InvariantViolation(format!(
                "no legal actions for current player {pid}"
            ));
            return finish_failed(
                game, &state, &mut events, &mut sink, &seed, turn_index, started, err,
            );
        }
        let mut legal_values = Vec::with_capacity(legal.len());
        let mut legal_canon = Vec::with_capacity(legal.len());
        for action in &legal {
            let value = serde_json::to_value(action).map_err(CanonicalError::from)?;
            legal_canon.push(canonical_bytes_of(&value)?);
            legal_values.push(value);
        }

        let input = DecideInput {
            match_id: match_id.clone(),
            game_id: game.id().to_string(),
            game_version: game.version().to_string(),
            player_index: pid,
            observation: observation_value,
            legal_actions: legal_values.clone(),
            clock: DecideClock { turn_timeout_ms: opts.turn_timeout_ms },
            meta: TurnMeta {
                turn_index,
                hand_number: game.hand_number(&state),
            },
        };

        let agent = agents[pid].clone();
        let deadline = Duration::from_millis(opts.turn_timeout_ms);
        let decide_started = Instant::now();
        let mut handle = spawn_decide(
            format!("decide:{match_id}:{turn_index}"),
            async move { agent.decide(input).await },
        );
        let decision = match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(Ok(output))) => Decision::Decided(output),
            Ok(Ok(Err(err))) => Decision::Errored(err.to_string()),
            Ok(Err(join_err)) => Decision::Errored(format!("agent task failed: {join_err}")),
            Err(_) => {
                // Soft cancellation: abandon the worker, never block on it.
                handle.abort();
                agents[pid].cancel();
                Decision::TimedOut
            }
        };
        let timing_ms = decide_started.elapsed().as_millis() as u64;

        let mut timed_out = false;
        let mut illegal_action = false;
        let mut original_action: Option<Value> = None;
        let chosen = match decision {
            Decision::Decided(output) => {
                if let Some(reason) = output.reason.as_deref() {
                    let reason = sanitize_reason(reason);
                    tracing::debug!(target = LOG_TARGET, %match_id, turn_index, player = pid, %reason, "agent reason");
                }
                match canonical_bytes_of(&output.action) {
                    Ok(bytes) => match legal_canon.iter().position(|c| *c == bytes) {
                        Some(idx) => idx,
                        None => {
                            illegal_action = true;
                            original_action = Some(output.action);
                            0
                        }
                    },
                    Err(_) => {
                        illegal_action = true;
                        original_action = Some(output.action);
                        0
                    }
                }
            }
            Decision::TimedOut => {
                timed_out = true;
                tracing::warn!(
                    target = LOG_TARGET,
                    %match_id,
                    turn_index,
                    player = pid,
                    timeout_ms = opts.turn_timeout_ms,
                    "decision timed out, substituting first legal action"
                );
                0
            }
            Decision::Errored(message) => {
                illegal_action = true;
                let reason = sanitize_reason(&message);
                tracing::warn!(
                    target = LOG_TARGET,
                    %match_id,
                    turn_index,
                    player = pid,
                    %reason,
                    "agent error, substituting first legal action"
                );
                0
            }
        };
        let action = legal[chosen].clone();
        let action_value = legal_values[chosen].clone();

        let outcome = match game.step(&state, pid, &action, &mut rng) {
            Ok(outcome) => outcome,
            Err(err) => {
                return finish_failed(
                    game, &state, &mut events, &mut sink, &seed, turn_index, started, err,
                );
            }
        };
        state = outcome.state;

        emit(
            &mut events,
            &mut sink,
            MatchEvent::Turn {
                turn_index,
                player_index: pid,
                observation_hash,
                action: action_value,
                timing_ms,
                timed_out,
                illegal_action,
                original_action,
                events: if outcome.events.is_empty() {
                    None
                } else {
                    Some(outcome.events)
                },
            },
        );
        turn_index += 1;
    }

    let results = game
        .results(&state)
        .map_err(|source| MatchError::GameStep { turn: turn_index, source })?;
    let total_time_ms = started.elapsed().as_millis() as u64;

    emit(
        &mut events,
        &mut sink,
        MatchEvent::MatchEnd {
            seed_reveal: seed.clone(),
            results: results.clone(),
            total_turns: turn_index,
            total_time_ms,
        },
    );

    tracing::info!(
        target = LOG_TARGET,
        %match_id,
        total_turns = turn_index,
        total_time_ms,
        winner = ?results.winner,
        "match finished"
    );

    Ok(MatchReport {
        match_id,
        game_id: game.id().to_string(),
        game_version: game.version().to_string(),
        seed,
        seed_commit,
        agents: agent_infos,
        results,
        events,
        total_turns: turn_index,
        total_time_ms,
    })
}

/// Best-effort `MATCH_END` after a fatal game failure, then surface the error.
#[allow(clippy::too_many_arguments)]
fn finish_failed<G: GameDefinition>(
    game: &G,
    state: &G::State,
    events: &mut Vec<MatchEvent>,
    sink: &mut Option<EventSink>,
    seed: &str,
    turn: u64,
    started: Instant,
    source: GameError,
) -> Result<MatchReport, MatchError> {
    tracing::error!(target = LOG_TARGET, turn, error = %source, "game step failed, aborting match");
    let results = if game.is_terminal(state) {
        game.results(state).unwrap_or_else(|_| MatchResults::empty())
    } else {
        MatchResults::empty()
    };
    emit(
        events,
        sink,
        MatchEvent::MatchEnd {
            seed_reveal: seed.to_string(),
            results,
            total_turns: turn,
            total_time_ms: started.elapsed().as_millis() as u64,
        },
    );
    Err(MatchError::GameStep { turn, source })
}

#[cfg(test)]
mod tests;
