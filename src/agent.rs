//! The agent contract and the identity scheme for agent variants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::canonical::{canonical_hash, CanonicalError};

/// Longest reason string that may reach a log line.
pub const MAX_REASON_LEN: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Local,
    Llm,
    Webhook,
    Framework,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetadata {
    pub id: String,
    pub version: String,
    pub display_name: String,
    pub kind: AgentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl AgentMetadata {
    pub fn local(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: "1.0.0".to_string(),
            display_name: display_name.into(),
            kind: AgentKind::Local,
            config: None,
        }
    }

    /// Digest over `(id, version, config)`; identifies the precise agent
    /// variant that played. An absent config hashes as JSON null so the
    /// digest shape is stable.
    pub fn fingerprint(&self) -> Result<String, CanonicalError> {
        canonical_hash(&json!({
            "id": self.id,
            "version": self.version,
            "config": self.config.clone().unwrap_or(Value::Null),
        }))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideClock {
    pub turn_timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMeta {
    pub turn_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_number: Option<u64>,
}

/// Everything an agent sees for one decision. Observation and legal actions
/// cross this boundary as JSON so out-of-process transports compose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideInput {
    pub match_id: String,
    pub game_id: String,
    pub game_version: String,
    pub player_index: usize,
    pub observation: Value,
    pub legal_actions: Vec<Value>,
    pub clock: DecideClock,
    pub meta: TurnMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideOutput {
    pub action: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DecideOutput {
    pub fn action(action: Value) -> Self {
        Self { action, reason: None }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent failed to decide: {0}")]
    Failed(String),
    #[error("agent returned malformed output: {0}")]
    Malformed(String),
}

/// A decision-making agent. Agents may be nondeterministic, but conformant
/// ones derive their randomness from `(match_id, turn_index)` so whole
/// matches stay reproducible.
#[async_trait]
pub trait Agent: Send + Sync {
    fn metadata(&self) -> &AgentMetadata;

    async fn decide(&self, input: DecideInput) -> Result<DecideOutput, AgentError>;

    /// Hook for long-lived transports to drop in-flight work after the
    /// orchestrator abandons a timed-out decision.
    fn cancel(&self) {}
}

/// Strip control characters and cap length before a reason may be logged or
/// displayed. Agent-authored text is untrusted.
pub fn sanitize_reason(reason: &str) -> String {
    reason
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_REASON_LEN)
        .collect()
}
