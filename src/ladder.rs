//! Elo ratings and the deterministic round-robin ladder.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::game::GameDefinition;
use crate::orchestrator::{run_match, MatchError, MatchOptions, MatchReport, DEFAULT_TURN_TIMEOUT_MS};

const LOG_TARGET: &str = "arena::ladder";

pub const DEFAULT_K_FACTOR: f64 = 32.0;
pub const DEFAULT_INITIAL_RATING: i32 = 1500;

#[derive(Clone, Copy, Debug)]
pub struct EloConfig {
    pub k_factor: f64,
    pub initial_rating: i32,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self { k_factor: DEFAULT_K_FACTOR, initial_rating: DEFAULT_INITIAL_RATING }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRating {
    pub id: String,
    pub rating: i32,
    pub matches: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

impl PlayerRating {
    fn new(id: &str, rating: i32) -> Self {
        Self { id: id.to_string(), rating, matches: 0, wins: 0, losses: 0, draws: 0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairOutcome {
    WinA,
    WinB,
    Draw,
}

/// Probability that a player rated `ra` beats one rated `rb`.
pub fn expected_score(ra: i32, rb: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(rb - ra) / 400.0))
}

/// Shared rating table. The only mutable state a ladder shares across
/// matches; every update runs as one critical section so concurrent ladders
/// cannot interleave reads and writes of a pair.
pub struct RatingTable {
    config: EloConfig,
    inner: Mutex<HashMap<String, PlayerRating>>,
}

impl RatingTable {
    pub fn new(config: EloConfig) -> Self {
        Self { config, inner: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, id: &str) -> Option<PlayerRating> {
        self.inner.lock().get(id).cloned()
    }

    /// Apply one match outcome to both players atomically. The winner's
    /// delta and the loser's delta are the same rounded magnitude with
    /// opposite signs.
    pub fn record_match(&self, a: &str, b: &str, outcome: PairOutcome) {
        let mut table = self.inner.lock();
        let initial = self.config.initial_rating;
        let ra = table
            .entry(a.to_string())
            .or_insert_with(|| PlayerRating::new(a, initial))
            .rating;
        let rb = table
            .entry(b.to_string())
            .or_insert_with(|| PlayerRating::new(b, initial))
            .rating;

        let actual_a = match outcome {
            PairOutcome::WinA => 1.0,
            PairOutcome::Draw => 0.5,
            PairOutcome::WinB => 0.0,
        };
        let delta = (self.config.k_factor * (actual_a - expected_score(ra, rb))).round() as i32;

        if let Some(player) = table.get_mut(a) {
            player.rating += delta;
            player.matches += 1;
            match outcome {
                PairOutcome::WinA => player.wins += 1,
                PairOutcome::WinB => player.losses += 1,
                PairOutcome::Draw => player.draws += 1,
            }
        }
        if let Some(player) = table.get_mut(b) {
            player.rating -= delta;
            player.matches += 1;
            match outcome {
                PairOutcome::WinA => player.losses += 1,
                PairOutcome::WinB => player.wins += 1,
                PairOutcome::Draw => player.draws += 1,
            }
        }
    }

    /// Ratings sorted descending, id ascending on ties.
    pub fn standings(&self) -> Vec<PlayerRating> {
        let mut out: Vec<PlayerRating> = self.inner.lock().values().cloned().collect();
        out.sort_by(|x, y| y.rating.cmp(&x.rating).then_with(|| x.id.cmp(&y.id)));
        out
    }
}

/// All unordered pairs `(i, j)` with `i < j`, lexicographic.
pub fn round_robin_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(n.saturating_mul(n.saturating_sub(1)) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Sub-seed for one ladder match; makes the whole tournament a pure function
/// of `(base_seed, agents, config)`.
pub fn pair_seed(base_seed: &str, id_a: &str, id_b: &str, match_number: usize) -> String {
    format!("{base_seed}:{id_a}:{id_b}:{match_number}")
}

pub struct LadderOptions<C> {
    pub base_seed: String,
    pub matches_per_pair: usize,
    pub turn_timeout_ms: u64,
    pub game_config: Option<C>,
    pub elo: EloConfig,
}

impl<C> LadderOptions<C> {
    pub fn new(base_seed: impl Into<String>) -> Self {
        Self {
            base_seed: base_seed.into(),
            matches_per_pair: 1,
            turn_timeout_ms: DEFAULT_TURN_TIMEOUT_MS,
            game_config: None,
            elo: EloConfig::default(),
        }
    }
}

pub struct LadderReport {
    pub standings: Vec<PlayerRating>,
    pub reports: Vec<MatchReport>,
}

/// Round-robin over every agent pair on a two-player discipline.
///
/// Seats alternate each match of a pair (odd-numbered matches swap), and
/// every match gets its own derived sub-seed.
pub async fn run_round_robin<G>(
    game: &G,
    agents: &[Arc<dyn Agent>],
    opts: LadderOptions<G::Config>,
) -> Result<LadderReport, MatchError>
where
    G: GameDefinition,
{
    if !game.player_count().supports(2) {
        return Err(MatchError::InvalidConfiguration(format!(
            "ladder requires a two-player discipline, {} does not support 2 seats",
            game.id()
        )));
    }
    if agents.len() < 2 {
        return Err(MatchError::InvalidConfiguration(
            "ladder requires at least two agents".to_string(),
        ));
    }

    let table = RatingTable::new(opts.elo);
    let mut reports = Vec::new();

    for (i, j) in round_robin_pairs(agents.len()) {
        let id_a = agents[i].metadata().id.clone();
        let id_b = agents[j].metadata().id.clone();
        for match_number in 0..opts.matches_per_pair {
            let swapped = match_number % 2 == 1;
            let seats: [Arc<dyn Agent>; 2] = if swapped {
                [agents[j].clone(), agents[i].clone()]
            } else {
                [agents[i].clone(), agents[j].clone()]
            };
            let seed = pair_seed(&opts.base_seed, &id_a, &id_b, match_number);
            let mut match_opts: MatchOptions<G::Config> = MatchOptions::new(seed.clone());
            match_opts.match_id = Some(seed);
            match_opts.turn_timeout_ms = opts.turn_timeout_ms;
            match_opts.game_config = opts.game_config.clone();

            let report = run_match(game, &seats, match_opts).await?;

            let outcome = match (report.results.is_draw, report.results.winner) {
                (true, _) | (false, None) => PairOutcome::Draw,
                (false, Some(seat)) => {
                    let winner_is_a = (seat == 0) != swapped;
                    if winner_is_a {
                        PairOutcome::WinA
                    } else {
                        PairOutcome::WinB
                    }
                }
            };
            table.record_match(&id_a, &id_b, outcome);
            tracing::info!(
                target = LOG_TARGET,
                match_id = %report.match_id,
                a = %id_a,
                b = %id_b,
                match_number,
                outcome = ?outcome,
                "ladder match recorded"
            );
            reports.push(report);
        }
    }

    Ok(LadderReport { standings: table.standings(), reports })
}
