//! The discipline contract: everything the orchestrator needs from a game.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::rng::DeterministicRng;

pub type PlayerIndex = usize;

/// How many seats a discipline supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCount {
    Exact(usize),
    Range { min: usize, max: usize },
}

impl PlayerCount {
    pub fn supports(&self, n: usize) -> bool {
        match *self {
            PlayerCount::Exact(k) => n == k,
            PlayerCount::Range { min, max } => (min..=max).contains(&n),
        }
    }

    pub fn min(&self) -> usize {
        match *self {
            PlayerCount::Exact(k) => k,
            PlayerCount::Range { min, .. } => min,
        }
    }

    pub fn max(&self) -> usize {
        match *self {
            PlayerCount::Exact(k) => k,
            PlayerCount::Range { max, .. } => max,
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("player count {got} outside supported range {min}..={max}")]
    InvalidPlayerCount { got: usize, min: usize, max: usize },
    #[error("invalid game config: {0}")]
    InvalidConfig(String),
    #[error("illegal action for player {player}: {detail}")]
    IllegalAction { player: PlayerIndex, detail: String },
    #[error("results requested before the game is terminal")]
    NotTerminal,
    #[error("game invariant violated: {0}")]
    InvariantViolation(String),
}

/// Inputs to `GameDefinition::reset`.
#[derive(Clone, Debug)]
pub struct ResetParams<'a, C> {
    pub seed: &'a str,
    pub num_players: usize,
    pub config: C,
}

/// Discipline-authored annotation embedded in `TURN` events.
///
/// Replay verification ignores these; they exist for human and downstream
/// consumers of the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEventRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl GameEventRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), data: None }
    }

    pub fn with_data(kind: impl Into<String>, data: Value) -> Self {
        Self { kind: kind.into(), data: Some(data) }
    }
}

/// Result of one `step`.
#[derive(Clone, Debug)]
pub struct StepOutcome<S> {
    pub state: S,
    pub events: Vec<GameEventRecord>,
}

/// Result of `reset`: the initial state plus whatever the discipline did
/// before the first turn (blind posts, the opening deal, even a whole hand
/// when forced posts leave nobody able to act). The orchestrator attaches
/// these to `MATCH_START`.
#[derive(Clone, Debug)]
pub struct ResetOutcome<S> {
    pub state: S,
    pub events: Vec<GameEventRecord>,
}

impl<S> ResetOutcome<S> {
    pub fn new(state: S) -> Self {
        Self { state, events: Vec::new() }
    }

    pub fn with_events(state: S, events: Vec<GameEventRecord>) -> Self {
        Self { state, events }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub player_index: PlayerIndex,
    pub score: f64,
    pub rank: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResults {
    pub players: Vec<PlayerResult>,
    pub winner: Option<PlayerIndex>,
    pub is_draw: bool,
}

impl MatchResults {
    /// Competition ranking over per-seat scores: rank = 1 + number of seats
    /// with a strictly greater score; tied top scores make the match a draw.
    pub fn from_scores(scores: &[f64]) -> Self {
        let players: Vec<PlayerResult> = scores
            .iter()
            .enumerate()
            .map(|(idx, &score)| {
                let rank = 1 + scores.iter().filter(|&&s| s > score).count() as u32;
                PlayerResult { player_index: idx, score, rank, stats: None }
            })
            .collect();
        let leaders: Vec<PlayerIndex> = players
            .iter()
            .filter(|p| p.rank == 1)
            .map(|p| p.player_index)
            .collect();
        let is_draw = leaders.len() != 1;
        let winner = if is_draw { None } else { Some(leaders[0]) };
        Self { players, winner, is_draw }
    }

    pub fn empty() -> Self {
        Self { players: Vec::new(), winner: None, is_draw: false }
    }
}

/// A discipline. The orchestrator treats `State`, `Action`, `Observation`
/// and `Config` as opaque; it only serializes them across the agent
/// boundary and compares actions by canonical encoding.
pub trait GameDefinition: Send + Sync {
    type State: Clone + Send;
    type Action: Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send;
    type Observation: Serialize;
    type Config: Serialize + DeserializeOwned + Clone + Default + Send + Sync;

    fn id(&self) -> &str;
    fn version(&self) -> &str;
    fn player_count(&self) -> PlayerCount;

    /// Pure construction of the initial state, together with any pre-turn
    /// discipline events. Fails with `InvalidPlayerCount` outside the
    /// supported seat range.
    fn reset(
        &self,
        params: ResetParams<'_, Self::Config>,
    ) -> Result<ResetOutcome<Self::State>, GameError>;

    /// Per-seat projection; must not leak information the game considers
    /// private to other seats.
    fn observe(&self, state: &Self::State, player: PlayerIndex) -> Self::Observation;

    /// Empty iff the seat may not act right now.
    fn legal_actions(&self, state: &Self::State, player: PlayerIndex) -> Vec<Self::Action>;

    /// `None` iff the state is terminal.
    fn current_player(&self, state: &Self::State) -> Option<PlayerIndex>;

    /// Advance the state. The orchestrator only ever passes actions drawn
    /// from `legal_actions` (it substitutes before calling).
    fn step(
        &self,
        state: &Self::State,
        player: PlayerIndex,
        action: &Self::Action,
        rng: &mut DeterministicRng,
    ) -> Result<StepOutcome<Self::State>, GameError>;

    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Defined only once `is_terminal` holds.
    fn results(&self, state: &Self::State) -> Result<MatchResults, GameError>;

    /// Hand counter for multi-hand disciplines; surfaces as
    /// `meta.handNumber` in decide inputs.
    fn hand_number(&self, _state: &Self::State) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_count_bounds() {
        let exact = PlayerCount::Exact(2);
        assert!(exact.supports(2));
        assert!(!exact.supports(3));
        let range = PlayerCount::Range { min: 2, max: 6 };
        assert!(range.supports(2) && range.supports(6));
        assert!(!range.supports(1) && !range.supports(7));
    }

    #[test]
    fn competition_ranking_with_ties() {
        let results = MatchResults::from_scores(&[10.0, 30.0, 30.0, 5.0]);
        let ranks: Vec<u32> = results.players.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![3, 1, 1, 4]);
        assert!(results.is_draw);
        assert_eq!(results.winner, None);
    }

    #[test]
    fn sole_leader_wins() {
        let results = MatchResults::from_scores(&[0.0, 1.0]);
        assert_eq!(results.winner, Some(1));
        assert!(!results.is_draw);
        assert_eq!(results.players[1].rank, 1);
        assert_eq!(results.players[0].rank, 2);
    }
}
