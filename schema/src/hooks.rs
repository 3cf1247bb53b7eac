use serde::{Deserialize, Serialize};

use crate::{BattleStat, BerryKind, StatusEffect, TriggerStage, WeatherKind};

/// Declarative behaviour contributed by an ability or a held item. Compiled
/// into effect attributes by the engine, the same way move effects are.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HookKind {
    /// Opponents spend one extra use on every move.
    ExtraMoveCost,
    /// Contact with the holder may inflict a status on the attacker.
    ContactStatus { status: StatusEffect, chance: u8 },
    /// Attackers making contact lose `1/divisor` of their max HP.
    ContactDamage { divisor: u16 },
    /// Damaging strikes may make the target flinch. The chance is per stack.
    FlinchOnHit { chance: u8 },
    /// After a move, heals `1/divisor` of the damage it dealt, per stack.
    HealFromDamage { divisor: u16 },
    /// At turn end, heals `1/divisor` of max HP, per stack.
    TurnHeal { divisor: u16 },
    /// Raise a stat at the end of every turn.
    PostTurnStatBoost { stat: BattleStat, levels: i8 },
    /// Stat drops caused by others are blocked.
    ProtectStats,
    /// The holder ignores the opponent's accuracy and evasion stages.
    IgnoreOpponentStages,
    /// Revives the holder at half HP instead of fainting.
    InstantRevive,
    /// Eaten at turn end once its condition is met.
    Berry(BerryKind),
    /// Starts a weather when the holder enters the field.
    SummonWeather { weather: WeatherKind, turns: u8 },
    /// Changes every opponent's stat when the holder enters the field.
    SummonStatChange { stat: BattleStat, levels: i8 },
    /// No damage from sandstorm or hail.
    WeatherImmunity,
}

impl HookKind {
    /// The stage the hook runs at. Passive hooks have none and are queried
    /// directly by the calculations they affect.
    pub fn stage(&self) -> Option<TriggerStage> {
        let stage = match self {
            HookKind::ExtraMoveCost => TriggerStage::MoveCost,
            HookKind::ContactStatus { .. } | HookKind::ContactDamage { .. } => {
                TriggerStage::PostDefend
            }
            HookKind::FlinchOnHit { .. } => TriggerStage::PostAttack,
            HookKind::HealFromDamage { .. } => TriggerStage::PostMove,
            HookKind::TurnHeal { .. } | HookKind::PostTurnStatBoost { .. } | HookKind::Berry(_) => {
                TriggerStage::TurnEnd
            }
            HookKind::ProtectStats => TriggerStage::PreStatChange,
            HookKind::InstantRevive => TriggerStage::PreFaint,
            HookKind::SummonWeather { .. } | HookKind::SummonStatChange { .. } => {
                TriggerStage::PostSummon
            }
            HookKind::WeatherImmunity => TriggerStage::PreWeatherDamage,
            HookKind::IgnoreOpponentStages => return None,
        };
        Some(stage)
    }
}
