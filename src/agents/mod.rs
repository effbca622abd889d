//! Baseline local agents: enough to exercise the contract in tests and
//! ladders without any network transport.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::agent::{Agent, AgentError, AgentMetadata, DecideInput, DecideOutput};
use crate::rng::DeterministicRng;

/// Always plays `legal_actions[0]`: the same choice the orchestrator's
/// fallback makes, so it doubles as the misbehavior baseline.
pub struct FirstLegalAgent {
    metadata: AgentMetadata,
}

impl FirstLegalAgent {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let display = format!("first-legal:{id}");
        Self { metadata: AgentMetadata::local(id, display) }
    }
}

#[async_trait]
impl Agent for FirstLegalAgent {
    fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    async fn decide(&self, input: DecideInput) -> Result<DecideOutput, AgentError> {
        let action = input
            .legal_actions
            .first()
            .cloned()
            .ok_or_else(|| AgentError::Failed("no legal actions offered".to_string()))?;
        Ok(DecideOutput::action(action))
    }
}

/// Plays a fixed action list in order, then falls back to `legal_actions[0]`.
/// Scripted actions are taken verbatim; an off-script entry exercises the
/// orchestrator's illegal-action path on purpose.
pub struct ScriptedAgent {
    metadata: AgentMetadata,
    script: Vec<Value>,
    cursor: Mutex<usize>,
}

impl ScriptedAgent {
    pub fn new(id: impl Into<String>, script: Vec<Value>) -> Self {
        let id = id.into();
        let display = format!("scripted:{id}");
        Self {
            metadata: AgentMetadata::local(id, display),
            script,
            cursor: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    async fn decide(&self, input: DecideInput) -> Result<DecideOutput, AgentError> {
        let next = {
            let mut cursor = self.cursor.lock();
            let next = self.script.get(*cursor).cloned();
            *cursor += 1;
            next
        };
        match next {
            Some(action) => Ok(DecideOutput::action(action)),
            None => {
                let action = input
                    .legal_actions
                    .first()
                    .cloned()
                    .ok_or_else(|| AgentError::Failed("no legal actions offered".to_string()))?;
                Ok(DecideOutput::action(action))
            }
        }
    }
}

/// Uniform random over the legal set, with randomness derived from
/// `(match_id, turn_index)` so whole matches replay bit-for-bit.
pub struct SeededRandomAgent {
    metadata: AgentMetadata,
}

impl SeededRandomAgent {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let display = format!("random:{id}");
        Self { metadata: AgentMetadata::local(id, display) }
    }
}

#[async_trait]
impl Agent for SeededRandomAgent {
    fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    async fn decide(&self, input: DecideInput) -> Result<DecideOutput, AgentError> {
        let mut rng =
            DeterministicRng::new(format!("{}:{}", input.match_id, input.meta.turn_index));
        let action = rng
            .pick(&input.legal_actions)
            .map_err(|e| AgentError::Failed(e.to_string()))?
            .clone();
        Ok(DecideOutput::action(action))
    }
}
