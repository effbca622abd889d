//! Typed match events and the JSONL on-disk form.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::game::{GameEventRecord, MatchResults};

/// Public descriptor of one seated agent, embedded in `MATCH_START` so a
/// later reader knows exactly which agent variant played.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub id: String,
    pub version: String,
    pub display_name: String,
    pub fingerprint: String,
}

/// One line of the match log. Exactly one `MatchStart` opens a match, `Turn`
/// events follow in strict `turn_index` order from 0, and exactly one
/// `MatchEnd` closes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatchEvent {
    #[serde(rename = "MATCH_START", rename_all = "camelCase")]
    MatchStart {
        match_id: String,
        started_at: DateTime<Utc>,
        game_id: String,
        game_version: String,
        agents: Vec<AgentInfo>,
        seed_commit: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config: Option<Value>,
        /// Discipline annotations produced during `reset`, before any turn
        /// exists to carry them (blind posts, the opening deal, and the
        /// like). Ignored by replay verification, like per-turn `events`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        events: Option<Vec<GameEventRecord>>,
    },
    #[serde(rename = "TURN", rename_all = "camelCase")]
    Turn {
        turn_index: u64,
        player_index: usize,
        observation_hash: String,
        action: Value,
        timing_ms: u64,
        timed_out: bool,
        illegal_action: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_action: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        events: Option<Vec<GameEventRecord>>,
    },
    #[serde(rename = "MATCH_END", rename_all = "camelCase")]
    MatchEnd {
        seed_reveal: String,
        results: MatchResults,
        total_turns: u64,
        total_time_ms: u64,
    },
}

impl MatchEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            MatchEvent::MatchStart { .. } => "MATCH_START",
            MatchEvent::Turn { .. } => "TURN",
            MatchEvent::MatchEnd { .. } => "MATCH_END",
        }
    }
}

#[derive(Debug, Error)]
pub enum JsonlError {
    #[error("io error on event log: {0}")]
    Io(#[from] io::Error),
    #[error("event is not encodable: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("line {line}: blank lines are not allowed in event logs")]
    BlankLine { line: usize },
    #[error("line {line}: malformed event: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Write events as UTF-8 JSONL: one event per line, LF-terminated, no
/// trailing data.
pub fn write_jsonl<W: Write>(events: &[MatchEvent], mut writer: W) -> Result<(), JsonlError> {
    for event in events {
        let line = serde_json::to_string(event).map_err(JsonlError::Encode)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Read a JSONL event log, rejecting blank lines.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<MatchEvent>, JsonlError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx + 1;
        if line.trim().is_empty() {
            return Err(JsonlError::BlankLine { line: number });
        }
        let event = serde_json::from_str(&line)
            .map_err(|source| JsonlError::Parse { line: number, source })?;
        events.push(event);
    }
    Ok(events)
}
