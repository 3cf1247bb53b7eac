use crate::combatant::{Combatant, MAX_STAT_STAGE};
use schema::{BattleStat, MoveCategory, StatusEffect};

/// Stat stage multipliers:
/// Negative stages: (2 / (2 + |stage|))
/// Positive stages: ((2 + stage) / 2)
pub fn stat_stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-MAX_STAT_STAGE, MAX_STAT_STAGE);
    if stage < 0 {
        2.0 / (2.0 + f64::from(-stage))
    } else {
        (2.0 + f64::from(stage)) / 2.0
    }
}

/// Accuracy ratio for an attacker accuracy stage against a target evasion
/// stage. The difference is capped at six stages either way.
pub fn accuracy_multiplier(accuracy_stage: i8, evasion_stage: i8) -> f64 {
    let diff = i32::from(accuracy_stage) - i32::from(evasion_stage);
    if diff >= 0 {
        f64::from(3 + diff.min(6)) / 3.0
    } else {
        3.0 / f64::from(3 + (-diff).min(6))
    }
}

fn apply_stage(base: u16, stage: i8) -> u32 {
    (f64::from(base) * stat_stage_multiplier(stage)).round() as u32
}

/// A stat after its temporary stage.
pub fn effective_stat(combatant: &Combatant, stat: BattleStat) -> u32 {
    apply_stage(combatant.stats.get(stat), combatant.stages.get(stat))
}

/// Offensive stat for a move's category; status moves use none.
pub fn effective_attack(combatant: &Combatant, category: MoveCategory) -> u32 {
    match category {
        MoveCategory::Physical => effective_stat(combatant, BattleStat::Attack),
        MoveCategory::Special => effective_stat(combatant, BattleStat::SpAttack),
        MoveCategory::Status => 0,
    }
}

pub fn effective_defense(combatant: &Combatant, category: MoveCategory) -> u32 {
    match category {
        MoveCategory::Physical => effective_stat(combatant, BattleStat::Defense),
        MoveCategory::Special => effective_stat(combatant, BattleStat::SpDefense),
        MoveCategory::Status => 0,
    }
}

/// Speed used for field order: stage-adjusted, quartered under paralysis.
pub fn effective_speed(combatant: &Combatant) -> u32 {
    let speed = effective_stat(combatant, BattleStat::Speed);
    if combatant.status_effect() == Some(StatusEffect::Paralysis) {
        speed / 4
    } else {
        speed
    }
}
