use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-volatile status. A combatant carries at most one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusEffect {
    Poison,
    Toxic,
    Paralysis,
    Sleep,
    Freeze,
    Burn,
}

impl StatusEffect {
    /// Statuses that act during end-of-turn upkeep rather than when moving.
    pub fn is_post_turn(self) -> bool {
        matches!(
            self,
            StatusEffect::Poison | StatusEffect::Toxic | StatusEffect::Burn
        )
    }

    pub fn obtain_text(self) -> &'static str {
        match self {
            StatusEffect::Poison => "was poisoned!",
            StatusEffect::Toxic => "was badly poisoned!",
            StatusEffect::Paralysis => "was paralyzed! It may be unable to move!",
            StatusEffect::Sleep => "fell asleep!",
            StatusEffect::Freeze => "was frozen solid!",
            StatusEffect::Burn => "was burned!",
        }
    }

    pub fn activation_text(self) -> &'static str {
        match self {
            StatusEffect::Poison | StatusEffect::Toxic => "is hurt by poison!",
            StatusEffect::Paralysis => "is paralyzed! It can't move!",
            StatusEffect::Sleep => "is fast asleep.",
            StatusEffect::Freeze => "is frozen solid!",
            StatusEffect::Burn => "is hurt by its burn!",
        }
    }

    pub fn overlap_text(self) -> &'static str {
        match self {
            StatusEffect::Poison | StatusEffect::Toxic => "is already poisoned!",
            StatusEffect::Paralysis => "is already paralyzed!",
            StatusEffect::Sleep => "is already asleep!",
            StatusEffect::Freeze => "is already frozen!",
            StatusEffect::Burn => "is already burned!",
        }
    }

    pub fn heal_text(self) -> &'static str {
        match self {
            StatusEffect::Poison | StatusEffect::Toxic => "was cured of its poison!",
            StatusEffect::Paralysis => "was cured of paralysis!",
            StatusEffect::Sleep => "woke up!",
            StatusEffect::Freeze => "thawed out!",
            StatusEffect::Burn => "was cured of its burn!",
        }
    }
}

impl fmt::Display for StatusEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusEffect::Poison => "poison",
            StatusEffect::Toxic => "toxic",
            StatusEffect::Paralysis => "paralysis",
            StatusEffect::Sleep => "sleep",
            StatusEffect::Freeze => "freeze",
            StatusEffect::Burn => "burn",
        };
        write!(f, "{}", name)
    }
}
