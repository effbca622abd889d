//! Deterministic match core for adversarial turn-based games.
//!
//! Couples a pluggable [`game::GameDefinition`] with a set of
//! [`agent::Agent`]s under a seed-committed PRNG, enforces per-turn
//! deadlines with illegal-action fallback, emits a totally ordered event
//! log, and verifies logs by replaying them. No-Limit Texas Hold'em ships
//! as the reference discipline; an Elo ladder consumes match outcomes.

pub mod agent;
pub mod agents;
pub mod canonical;
pub mod events;
pub mod game;
pub mod hashing;
pub mod holdem;
pub mod ladder;
pub mod logging;
pub mod orchestrator;
pub mod replay;
pub mod rng;

#[cfg(test)]
pub mod test_utils;

pub use agent::{Agent, AgentError, AgentKind, AgentMetadata, DecideInput, DecideOutput};
pub use canonical::canonical_hash;
pub use events::{read_jsonl, write_jsonl, AgentInfo, MatchEvent};
pub use game::{GameDefinition, GameError, MatchResults, PlayerCount, PlayerResult};
pub use hashing::{commit_seed, sha256_hex, verify_seed};
pub use ladder::{run_round_robin, EloConfig, LadderOptions, RatingTable};
pub use orchestrator::{run_match, MatchError, MatchOptions, MatchReport};
pub use replay::{verify_replay, ReplayOptions, ReplayReport};
pub use rng::DeterministicRng;
