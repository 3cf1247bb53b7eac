use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BattleStat, HookKind};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerryKind {
    /// Restores a quarter of max HP below half health.
    Sitrus,
    /// Cures any status or confusion.
    Lum,
    Liechi,
    Ganlon,
    Petaya,
    Apicot,
    Salac,
    /// Raises the critical-hit ratio in a pinch.
    Lansat,
    /// Sharply raises a random stat in a pinch.
    Starf,
}

impl BerryKind {
    /// The stat a pinch berry raises by one stage.
    pub fn pinch_stat(self) -> Option<BattleStat> {
        match self {
            BerryKind::Liechi => Some(BattleStat::Attack),
            BerryKind::Ganlon => Some(BattleStat::Defense),
            BerryKind::Petaya => Some(BattleStat::SpAttack),
            BerryKind::Apicot => Some(BattleStat::SpDefense),
            BerryKind::Salac => Some(BattleStat::Speed),
            _ => None,
        }
    }
}

/// Persistent, stackable held items and side-wide passives.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    /// Leftovers: heals 1/16 max HP per stack at turn end.
    TurnHeal,
    /// Shell Bell: heals 1/8 of damage dealt per stack after a move.
    HitHeal,
    /// King's Rock: 10% flinch chance per stack on damaging hits.
    FlinchChance,
    /// Reviver Seed: revives once at half HP.
    InstantRevive,
    Berry(BerryKind),
    /// Rocky Helmet: attackers making contact lose 1/6 of their max HP.
    ContactDamage,
    /// Clear Amulet: blocks stat drops caused by opponents.
    StatDropGuard,
    /// X Accuracy (side-wide): +1 accuracy stage per stack.
    AccuracyBooster,
}

impl ModifierKind {
    /// What the item does while held. Side-wide passives have no hooks and
    /// are read by the calculations they affect.
    pub fn hooks(self) -> Vec<HookKind> {
        match self {
            ModifierKind::TurnHeal => vec![HookKind::TurnHeal { divisor: 16 }],
            ModifierKind::HitHeal => vec![HookKind::HealFromDamage { divisor: 8 }],
            ModifierKind::FlinchChance => vec![HookKind::FlinchOnHit { chance: 10 }],
            ModifierKind::InstantRevive => vec![HookKind::InstantRevive],
            ModifierKind::Berry(berry) => vec![HookKind::Berry(berry)],
            ModifierKind::ContactDamage => vec![HookKind::ContactDamage { divisor: 6 }],
            ModifierKind::StatDropGuard => vec![HookKind::ProtectStats],
            ModifierKind::AccuracyBooster => Vec::new(),
        }
    }

    pub fn max_stack(self) -> u8 {
        match self {
            ModifierKind::TurnHeal | ModifierKind::HitHeal => 4,
            ModifierKind::FlinchChance => 3,
            ModifierKind::InstantRevive
            | ModifierKind::ContactDamage
            | ModifierKind::StatDropGuard => 1,
            ModifierKind::Berry(BerryKind::Lum) => 2,
            ModifierKind::Berry(_) => 3,
            ModifierKind::AccuracyBooster => 5,
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModifierKind::TurnHeal => "Leftovers".to_string(),
            ModifierKind::HitHeal => "Shell Bell".to_string(),
            ModifierKind::FlinchChance => "King's Rock".to_string(),
            ModifierKind::InstantRevive => "Reviver Seed".to_string(),
            ModifierKind::Berry(berry) => format!("{:?} Berry", berry),
            ModifierKind::ContactDamage => "Rocky Helmet".to_string(),
            ModifierKind::StatDropGuard => "Clear Amulet".to_string(),
            ModifierKind::AccuracyBooster => "X Accuracy".to_string(),
        };
        write!(f, "{}", name)
    }
}
