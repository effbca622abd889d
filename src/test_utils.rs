//! Shared fixtures for core tests: a minimal discipline plus a few
//! deliberately misbehaving agents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::agent::{Agent, AgentError, AgentMetadata, DecideInput, DecideOutput};
use crate::game::{
    GameDefinition, GameError, MatchResults, PlayerCount, ResetOutcome, ResetParams, StepOutcome,
};
use crate::rng::DeterministicRng;

/// Tiny sequential game: each seat in turn picks one of `{1, 2, 3}` for a
/// fixed number of rounds; the higher tally wins. With `rng_bonus` the step
/// also consumes the match PRNG, which exercises replay determinism.
pub struct PickGame {
    pub rounds: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PickConfig {
    #[serde(default)]
    pub rng_bonus: bool,
}

#[derive(Clone, Debug)]
pub struct PickState {
    pub tallies: Vec<u64>,
    pub turns_taken: u64,
    pub total_turns: u64,
    pub next: usize,
    pub rng_bonus: bool,
}

#[derive(Serialize)]
pub struct PickObservation {
    pub you: usize,
    pub tallies: Vec<u64>,
    pub turns_taken: u64,
}

impl GameDefinition for PickGame {
    type State = PickState;
    type Action = u32;
    type Observation = PickObservation;
    type Config = PickConfig;

    fn id(&self) -> &str {
        "pick"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn player_count(&self) -> PlayerCount {
        PlayerCount::Range { min: 2, max: 4 }
    }

    fn reset(&self, params: ResetParams<'_, PickConfig>) -> Result<ResetOutcome<PickState>, GameError> {
        if !self.player_count().supports(params.num_players) {
            return Err(GameError::InvalidPlayerCount {
                got: params.num_players,
                min: self.player_count().min(),
                max: self.player_count().max(),
            });
        }
        Ok(ResetOutcome::new(PickState {
            tallies: vec![0; params.num_players],
            turns_taken: 0,
            total_turns: self.rounds * params.num_players as u64,
            next: 0,
            rng_bonus: params.config.rng_bonus,
        }))
    }

    fn observe(&self, state: &PickState, player: usize) -> PickObservation {
        PickObservation {
            you: player,
            tallies: state.tallies.clone(),
            turns_taken: state.turns_taken,
        }
    }

    fn legal_actions(&self, state: &PickState, player: usize) -> Vec<u32> {
        if self.current_player(state) == Some(player) {
            vec![1, 2, 3]
        } else {
            vec![]
        }
    }

    fn current_player(&self, state: &PickState) -> Option<usize> {
        if state.turns_taken < state.total_turns {
            Some(state.next)
        } else {
            None
        }
    }

    fn step(
        &self,
        state: &PickState,
        player: usize,
        action: &u32,
        rng: &mut DeterministicRng,
    ) -> Result<StepOutcome<PickState>, GameError> {
        if !self.legal_actions(state, player).contains(action) {
            return Err(GameError::IllegalAction {
                player,
                detail: format!("{action} not in legal set"),
            });
        }
        let mut next = state.clone();
        let bonus = if state.rng_bonus {
            u64::from(rng.next_u32() % 4)
        } else {
            0
        };
        next.tallies[player] += u64::from(*action) + bonus;
        next.turns_taken += 1;
        next.next = (player + 1) % state.tallies.len();
        Ok(StepOutcome { state: next, events: Vec::new() })
    }

    fn is_terminal(&self, state: &PickState) -> bool {
        state.turns_taken >= state.total_turns
    }

    fn results(&self, state: &PickState) -> Result<MatchResults, GameError> {
        if !self.is_terminal(state) {
            return Err(GameError::NotTerminal);
        }
        let scores: Vec<f64> = state.tallies.iter().map(|&t| t as f64).collect();
        Ok(MatchResults::from_scores(&scores))
    }
}

/// Returns a constant JSON value for every decision, legal or not.
pub struct FixedJsonAgent {
    metadata: AgentMetadata,
    action: Value,
}

impl FixedJsonAgent {
    pub fn new(id: &str, action: Value) -> Self {
        Self {
            metadata: AgentMetadata::local(id, format!("fixed:{id}")),
            action,
        }
    }
}

#[async_trait]
impl Agent for FixedJsonAgent {
    fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    async fn decide(&self, _input: DecideInput) -> Result<DecideOutput, AgentError> {
        Ok(DecideOutput::action(self.action.clone()))
    }
}

/// Sleeps past any reasonable deadline before answering.
pub struct SleepyAgent {
    metadata: AgentMetadata,
    pub sleep: Duration,
}

impl SleepyAgent {
    pub fn new(id: &str, sleep: Duration) -> Self {
        Self {
            metadata: AgentMetadata::local(id, format!("sleepy:{id}")),
            sleep,
        }
    }
}

#[async_trait]
impl Agent for SleepyAgent {
    fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    async fn decide(&self, input: DecideInput) -> Result<DecideOutput, AgentError> {
        tokio::time::sleep(self.sleep).await;
        let action = input
            .legal_actions
            .last()
            .cloned()
            .ok_or_else(|| AgentError::Failed("no legal actions".to_string()))?;
        Ok(DecideOutput::action(action))
    }
}

/// Fails every decision outright.
pub struct FailingAgent {
    metadata: AgentMetadata,
}

impl FailingAgent {
    pub fn new(id: &str) -> Self {
        Self { metadata: AgentMetadata::local(id, format!("failing:{id}")) }
    }
}

#[async_trait]
impl Agent for FailingAgent {
    fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    async fn decide(&self, _input: DecideInput) -> Result<DecideOutput, AgentError> {
        Err(AgentError::Failed("synthetic failure".to_string()))
    }
}
