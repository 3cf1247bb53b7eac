use crate::battle::stats::{accuracy_multiplier, effective_attack, effective_defense};
use crate::combatant::{Combatant, MAX_STAT_STAGE};
use crate::content::ContentTable;
use crate::field::Field;
use crate::modifiers::ModifierOwner;
use crate::rng::RandomSequence;
use schema::{
    BattleStat, HookKind, ModifierKind, MoveData, MoveTarget, MultiHit, StatusEffect, TagKind,
    WeatherKind,
};

/// Everything the accuracy roll needs to know about one strike.
pub struct HitCheckInput<'a> {
    pub user: &'a Combatant,
    pub target: &'a Combatant,
    pub move_data: &'a MoveData,
    pub field: &'a Field,
    pub content: &'a ContentTable,
    pub gravity_multiplier: f32,
}

/// Decide whether a strike connects. Draws from the sequence only when the
/// outcome is not already decided.
pub fn move_hits(input: &HitCheckInput<'_>, rng: &mut RandomSequence) -> bool {
    let HitCheckInput {
        user,
        target,
        move_data,
        field,
        content,
        gravity_multiplier,
    } = *input;

    if move_data.target == MoveTarget::User {
        return true;
    }

    // Follow-up strikes of a multi-hit activation reuse the first result.
    if let Some(hits_left) = user.turn_data.hits_left {
        if hits_left < user.turn_data.hit_count {
            return true;
        }
    }

    if let Some(hidden) = target.hiding_tag() {
        if !move_data.hits_through(hidden) {
            return false;
        }
    }

    if user
        .tag(TagKind::LockOn)
        .is_some_and(|tag| tag.source == Some(target.id))
    {
        return true;
    }

    let Some(base_accuracy) = move_data.accuracy else {
        return true;
    };

    let mut accuracy = f64::from(base_accuracy);
    if !move_data.flags.one_hit_ko && field.gravity() {
        accuracy = (accuracy * f64::from(gravity_multiplier)).floor();
    }

    let mut accuracy_stage = user.stages.get(BattleStat::Accuracy);
    let mut evasion_stage = target.stages.get(BattleStat::Evasion);
    if ignores_opponent_stages(content, target) {
        accuracy_stage = 0;
    }
    if ignores_opponent_stages(content, user) {
        evasion_stage = 0;
    }
    let boost = field
        .modifiers
        .stack_of(ModifierKind::AccuracyBooster, ModifierOwner::Side(user.side));
    accuracy_stage = accuracy_stage
        .saturating_add(i8::try_from(boost).unwrap_or(MAX_STAT_STAGE))
        .min(MAX_STAT_STAGE);

    let roll = rng.rand_int(100, 1, "accuracy");
    f64::from(roll) <= accuracy * accuracy_multiplier(accuracy_stage, evasion_stage)
}

fn ignores_opponent_stages(content: &ContentTable, combatant: &Combatant) -> bool {
    content
        .ability_of(combatant)
        .is_some_and(|a| a.has_hook(|h| matches!(h, HookKind::IgnoreOpponentStages)))
}

/// Strike count for a multi-hit move: 2 and 3 at 37.5% each, 4 and 5 at 12.5%.
pub fn roll_hit_count(multi_hit: Option<MultiHit>, rng: &mut RandomSequence) -> u8 {
    match multi_hit {
        None => 1,
        Some(MultiHit::Fixed(n)) => n.max(1),
        Some(MultiHit::TwoToFive) => match rng.rand_int(16, 0, "hit count") {
            10..=15 => 2,
            4..=9 => 3,
            2..=3 => 4,
            _ => 5,
        },
    }
}

/// Critical hit with a 1/16 base rate, 1/8 with a crit boost.
pub fn roll_critical(user: &Combatant, rng: &mut RandomSequence) -> bool {
    let odds = if user.has_tag(TagKind::CritBoost) { 8 } else { 16 };
    rng.rand_int(odds, 0, "critical hit") == 0
}

pub struct DamageInput<'a> {
    pub user: &'a Combatant,
    pub target: &'a Combatant,
    pub move_data: &'a MoveData,
    pub effectiveness: f32,
    pub weather: Option<WeatherKind>,
    pub critical: bool,
    /// Random factor in [85, 100].
    pub roll: u32,
}

/// Standard damage formula with weather, STAB, type effectiveness, critical
/// hits, the burn penalty and the random spread. Never below 1 for a connecting
/// damaging move.
pub fn calculate_damage(input: &DamageInput<'_>) -> u16 {
    let move_data = input.move_data;
    if !move_data.is_damaging() || input.effectiveness <= 0.0 {
        return 0;
    }
    if move_data.flags.one_hit_ko {
        return input.target.hp;
    }

    let attack = effective_attack(input.user, move_data.category).max(1) as f64;
    let defense = effective_defense(input.target, move_data.category).max(1) as f64;
    let level = f64::from(input.user.level);
    let power = f64::from(move_data.power);

    let mut damage = ((2.0 * level / 5.0 + 2.0) * power * attack / defense) / 50.0 + 2.0;
    if let Some(weather) = input.weather {
        damage *= weather.damage_multiplier(move_data.element);
    }
    if input.critical {
        damage *= 1.5;
    }
    if input.user.types.contains(&move_data.element) {
        damage *= 1.5;
    }
    damage *= f64::from(input.effectiveness);
    if input.user.status_effect() == Some(StatusEffect::Burn)
        && move_data.category == schema::MoveCategory::Physical
    {
        damage *= 0.5;
    }
    damage = damage * f64::from(input.roll) / 100.0;

    (damage.floor() as u32).clamp(1, u32::from(u16::MAX)) as u16
}

/// Escape chance out of 256 for the player's `attempts`th try.
pub fn escape_chance(player_speed: u32, enemy_speed: u32, attempts: u32) -> u32 {
    let enemy_speed = enemy_speed.max(1);
    (player_speed * 128 / enemy_speed + 30 * attempts) % 256
}

/// Shake threshold out of 65536 for a capture attempt. A `None` ball
/// multiplier is a guaranteed catch.
pub fn capture_threshold(target: &Combatant, ball_multiplier: Option<f64>) -> Option<u32> {
    let multiplier = ball_multiplier?;
    let max_hp = f64::from(target.max_hp().max(1));
    let hp = f64::from(target.hp);
    let status_multiplier = match target.status_effect() {
        Some(StatusEffect::Sleep | StatusEffect::Freeze) => 2.5,
        Some(_) => 1.5,
        None => 1.0,
    };
    let x = (((3.0 * max_hp - 2.0 * hp) * f64::from(target.catch_rate) * multiplier)
        / (3.0 * max_hp)
        * status_multiplier)
        .round()
        .max(1.0);
    Some((65536.0 / (255.0 / x).sqrt().sqrt()).round() as u32)
}
