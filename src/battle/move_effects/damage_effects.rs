// In: src/battle/move_effects/damage_effects.rs

use super::{EffectContext, MoveEffect};
use crate::battle::calculators::{calculate_damage, roll_critical, DamageInput};
use crate::battle::phases::{apply_damage, queue_faint_check, DamageSource, PokemonHealPhase};
use crate::errors::BattleResult;

/// Deals the move's damage to the target.
#[derive(Debug)]
pub struct DamageEffect;

impl MoveEffect for DamageEffect {
    fn name(&self) -> &'static str {
        "damage"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let move_data = ctx.move_data(self.name())?;
        if !move_data.is_damaging() || ctx.result.effectiveness <= 0.0 {
            return Ok(());
        }

        let weather = ctx.field.weather();
        let user = ctx.field.get(ctx.user)?;
        let target = ctx.field.get(ctx.target)?;
        let one_hit_ko = move_data.flags.one_hit_ko;
        let critical = !one_hit_ko && roll_critical(user, ctx.rng);
        let roll = ctx.rng.rand_int(16, 85, "damage spread");
        let damage = calculate_damage(&DamageInput {
            user,
            target,
            move_data,
            effectiveness: ctx.result.effectiveness,
            weather,
            critical,
            roll,
        });

        let dealt = apply_damage(
            ctx.field,
            ctx.phases,
            ctx.events,
            ctx.target,
            damage,
            Some(DamageSource {
                combatant: ctx.user,
                move_id: move_data.id,
                result: ctx.result.hit_result,
            }),
        )?;
        ctx.result.damage_dealt = ctx.result.damage_dealt.saturating_add(dealt);
        ctx.field.get_mut(ctx.user)?.turn_data.damage_dealt += u32::from(dealt);

        if critical {
            ctx.phases.queue_message("A critical hit!");
        }
        if one_hit_ko {
            ctx.phases.queue_message("It's a one-hit KO!");
        } else if ctx.result.effectiveness > 1.0 {
            ctx.phases.queue_message("It's super effective!");
        } else if ctx.result.effectiveness < 1.0 {
            ctx.phases.queue_message("It's not very effective...");
        }
        queue_faint_check(ctx.field, ctx.phases, ctx.target)
    }
}

/// The user takes a fraction of the damage it just dealt.
#[derive(Debug)]
pub struct RecoilEffect {
    pub divisor: u16,
}

impl MoveEffect for RecoilEffect {
    fn name(&self) -> &'static str {
        "recoil"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if ctx.result.damage_dealt == 0 {
            return Ok(());
        }
        let recoil = (ctx.result.damage_dealt / self.divisor.max(1)).max(1);
        apply_damage(ctx.field, ctx.phases, ctx.events, ctx.user, recoil, None)?;
        let name = ctx.name_of(ctx.user);
        ctx.phases.queue_message(format!("{} is damaged by recoil!", name));
        queue_faint_check(ctx.field, ctx.phases, ctx.user)
    }
}

/// Heals the user by a fraction of the damage dealt.
#[derive(Debug)]
pub struct DrainEffect {
    pub divisor: u16,
}

impl MoveEffect for DrainEffect {
    fn name(&self) -> &'static str {
        "drain"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if ctx.result.damage_dealt == 0 {
            return Ok(());
        }
        let amount = (ctx.result.damage_dealt / self.divisor.max(1)).max(1);
        let target_name = ctx.name_of(ctx.target);
        ctx.phases.insert_next(Box::new(PokemonHealPhase::new(
            ctx.user,
            amount,
            Some(format!("{} had its energy drained!", target_name)),
            false,
        )));
        Ok(())
    }
}

/// On a miss, the user takes a fraction of its own max HP.
#[derive(Debug)]
pub struct CrashDamageEffect {
    pub divisor: u16,
}

impl MoveEffect for CrashDamageEffect {
    fn name(&self) -> &'static str {
        "crash damage"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let user = ctx.field.get(ctx.user)?;
        let amount = (user.max_hp() / self.divisor.max(1)).max(1);
        let name = user.name.clone();
        ctx.phases
            .queue_message(format!("{} kept going and crashed!", name));
        apply_damage(ctx.field, ctx.phases, ctx.events, ctx.user, amount, None)?;
        queue_faint_check(ctx.field, ctx.phases, ctx.user)
    }
}
