use serde::{Deserialize, Serialize};

use super::types::Chips;

/// A betting decision. `Bet` and `Raise` carry the total current-round bet
/// the seat wants to reach, not the increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldemAction {
    Fold,
    /// Only when nothing is owed.
    Check,
    /// Match the current bet, going all-in if short.
    Call,
    /// First voluntary wager of an unopened round.
    Bet { to: Chips },
    Raise { to: Chips },
    /// Push the whole stack; normalized to a bet, call, or raise internally.
    AllIn,
}

impl HoldemAction {
    /// Upper-cased kind string used for per-turn log annotations.
    pub fn kind(&self) -> &'static str {
        match self {
            HoldemAction::Fold => "FOLD",
            HoldemAction::Check => "CHECK",
            HoldemAction::Call => "CALL",
            HoldemAction::Bet { .. } => "BET",
            HoldemAction::Raise { .. } => "RAISE",
            HoldemAction::AllIn => "ALL_IN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_form_is_snake_case_external_tagging() {
        assert_eq!(serde_json::to_value(HoldemAction::Fold).unwrap(), json!("fold"));
        assert_eq!(
            serde_json::to_value(HoldemAction::Raise { to: 60 }).unwrap(),
            json!({"raise": {"to": 60}})
        );
        let back: HoldemAction = serde_json::from_value(json!({"bet": {"to": 40}})).unwrap();
        assert_eq!(back, HoldemAction::Bet { to: 40 });
    }
}
