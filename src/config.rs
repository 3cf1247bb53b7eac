//! Engine configuration, loadable from RON.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterKind {
    Wild,
    Trainer,
}

/// Rank of each command category in move order. Higher ranks resolve first;
/// equal ranks fall through to move priority (for two fights) and then to
/// field order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPrecedence {
    pub fight: i8,
    pub ball: i8,
    pub switch: i8,
    pub run: i8,
}

impl Default for CommandPrecedence {
    fn default() -> Self {
        Self {
            fight: 0,
            ball: 1,
            switch: 1,
            run: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BattleConfig {
    pub seed: u64,
    pub kind: EncounterKind,
    pub double: bool,
    pub precedence: CommandPrecedence,
    pub gravity_accuracy_multiplier: f32,
    /// How often an encounter-end save is offered again after failing.
    pub save_retry_limit: u8,
    /// Safety stop for automated encounters.
    pub max_turns: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            kind: EncounterKind::Wild,
            double: false,
            precedence: CommandPrecedence::default(),
            gravity_accuracy_multiplier: 1.67,
            save_retry_limit: 3,
            max_turns: 200,
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        ron::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn battlers_per_side(&self) -> usize {
        if self.double {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_ron_falls_back_to_defaults() {
        let config = BattleConfig::from_ron_str("(seed: 12, kind: Trainer, double: true)")
            .expect("config should parse");
        assert_eq!(config.seed, 12);
        assert_eq!(config.kind, EncounterKind::Trainer);
        assert_eq!(config.battlers_per_side(), 2);
        assert_eq!(config.precedence, CommandPrecedence::default());
        assert_eq!(config.save_retry_limit, 3);
    }

    #[test]
    fn malformed_ron_is_reported() {
        assert!(BattleConfig::from_ron_str("(seed: \"twelve\")").is_err());
    }
}
