// In: src/battle/move_effects/held_effects.rs

//! Reactive effects contributed by abilities and held items. The holder is
//! always `ctx.user`; `ctx.target` is whoever it reacts to.

use super::{start_weather, EffectContext, HookSource, MoveEffect};
use crate::battle::phases::{
    apply_damage, queue_faint_check, BerryPhase, ObtainStatusEffectPhase, PokemonHealPhase,
    StatChangePhase,
};
use crate::battle::state::BattleEvent;
use crate::combatant::BattlerTag;
use crate::errors::BattleResult;
use crate::modifiers::{berry_applies, ModifierOwner};
use schema::{BattleStat, BerryKind, StatusEffect, TagKind, WeatherKind};

/// Opponents pay one more use for every move.
#[derive(Debug)]
pub struct ExtraCostEffect;

impl MoveEffect for ExtraCostEffect {
    fn name(&self) -> &'static str {
        "extra cost"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        ctx.result.extra_cost = ctx.result.extra_cost.saturating_add(1);
        Ok(())
    }
}

/// Contact with the holder may afflict the attacker.
#[derive(Debug)]
pub struct ContactStatusEffect {
    pub status: StatusEffect,
    pub chance: u8,
}

impl MoveEffect for ContactStatusEffect {
    fn name(&self) -> &'static str {
        "contact status"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if !ctx.move_data(self.name())?.flags.contact || ctx.target == ctx.user {
            return Ok(());
        }
        let attacker = ctx.field.get(ctx.target)?;
        if !attacker.is_active() || attacker.status.is_some() {
            return Ok(());
        }
        if !ctx.rng.chance(self.chance, "contact status") {
            return Ok(());
        }
        ctx.phases.insert_next(Box::new(ObtainStatusEffectPhase::new(
            ctx.target,
            self.status,
            Some(ctx.user),
        )));
        Ok(())
    }
}

/// Attackers making contact lose a fraction of their max HP.
#[derive(Debug)]
pub struct ContactDamageEffect {
    pub divisor: u16,
    pub source: HookSource,
}

impl MoveEffect for ContactDamageEffect {
    fn name(&self) -> &'static str {
        "contact damage"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if !ctx.move_data(self.name())?.flags.contact || ctx.target == ctx.user {
            return Ok(());
        }
        let attacker = ctx.field.get(ctx.target)?;
        if !attacker.is_active() {
            return Ok(());
        }
        let amount = (attacker.max_hp() / self.divisor.max(1)).max(1);
        let text = format!(
            "{} was hurt by {}'s {}!",
            attacker.name,
            ctx.name_of(ctx.user),
            self.source.label()
        );
        ctx.phases.queue_message(text);
        apply_damage(ctx.field, ctx.phases, ctx.events, ctx.target, amount, None)?;
        queue_faint_check(ctx.field, ctx.phases, ctx.target)
    }
}

/// A damaging strike by the holder may make the target flinch.
#[derive(Debug)]
pub struct FlinchOnHitEffect {
    pub chance: u8,
    pub source: HookSource,
}

impl MoveEffect for FlinchOnHitEffect {
    fn name(&self) -> &'static str {
        "flinch on hit"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if ctx.result.damage_dealt == 0 || ctx.field.get(ctx.target)?.is_fainted() {
            return Ok(());
        }
        let stacks = self.source.stacks(ctx.field, ctx.user);
        if !ctx.rng.chance(self.chance.saturating_mul(stacks), "flinch on hit") {
            return Ok(());
        }
        let tag = BattlerTag::new(TagKind::Flinched).with_source(ctx.user, ctx.move_data.map(|m| m.id));
        if ctx.field.get_mut(ctx.target)?.add_tag(tag) {
            ctx.events.push(BattleEvent::TagAdded {
                combatant: ctx.target,
                tag: TagKind::Flinched,
            });
        }
        Ok(())
    }
}

/// Heals the holder by a share of the damage its move dealt.
#[derive(Debug)]
pub struct HealFromDamageEffect {
    pub divisor: u16,
    pub source: HookSource,
}

impl MoveEffect for HealFromDamageEffect {
    fn name(&self) -> &'static str {
        "heal from damage"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let holder = ctx.field.get(ctx.user)?;
        let damage = holder.turn_data.damage_dealt;
        if !holder.is_active() || damage == 0 {
            return Ok(());
        }
        let name = holder.name.clone();
        let per_stack = u16::try_from((damage / u32::from(self.divisor.max(1))).max(1)).unwrap_or(u16::MAX);
        let amount = per_stack.saturating_mul(u16::from(self.source.stacks(ctx.field, ctx.user)));
        ctx.phases.insert_next(Box::new(PokemonHealPhase::new(
            ctx.user,
            amount,
            Some(format!(
                "{} restored a little HP using its {}!",
                name,
                self.source.label()
            )),
            false,
        )));
        Ok(())
    }
}

/// Heals a fraction of max HP at the end of the turn.
#[derive(Debug)]
pub struct TurnHealEffect {
    pub divisor: u16,
    pub source: HookSource,
}

impl MoveEffect for TurnHealEffect {
    fn name(&self) -> &'static str {
        "turn heal"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let holder = ctx.field.get(ctx.user)?;
        if holder.hp >= holder.max_hp() {
            return Ok(());
        }
        let name = holder.name.clone();
        let per_stack = (holder.max_hp() / self.divisor.max(1)).max(1);
        let amount = per_stack.saturating_mul(u16::from(self.source.stacks(ctx.field, ctx.user)));
        ctx.phases.insert_next(Box::new(PokemonHealPhase::new(
            ctx.user,
            amount,
            Some(format!(
                "{} restored a little HP using its {}!",
                name,
                self.source.label()
            )),
            false,
        )));
        Ok(())
    }
}

/// Blocks a stat drop caused by someone else.
#[derive(Debug)]
pub struct StatGuardEffect {
    pub source: HookSource,
}

impl MoveEffect for StatGuardEffect {
    fn name(&self) -> &'static str {
        "stat guard"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        ctx.result.blocked_by = Some(self.source.label());
        ctx.result.cancelled = true;
        Ok(())
    }
}

/// Brings the holder back at half HP instead of letting it faint. Items are
/// used up.
#[derive(Debug)]
pub struct ReviveEffect {
    pub source: HookSource,
}

impl MoveEffect for ReviveEffect {
    fn name(&self) -> &'static str {
        "revive"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if let HookSource::Item(kind) = self.source {
            if !ctx
                .field
                .modifiers
                .consume(kind, ModifierOwner::Combatant(ctx.user))
            {
                return Ok(());
            }
            ctx.events.push(BattleEvent::ModifierConsumed {
                combatant: ctx.user,
                kind,
            });
        }
        let holder = ctx.field.get_mut(ctx.user)?;
        holder.hp = (holder.max_hp() / 2).max(1);
        holder.status = None;
        let hp = holder.hp;
        let name = holder.name.clone();
        ctx.events.push(BattleEvent::Revived {
            combatant: ctx.user,
            hp,
        });
        ctx.phases.queue_message(format!(
            "{} was revived by its {}!",
            name,
            self.source.label()
        ));
        ctx.result.cancelled = true;
        Ok(())
    }
}

/// Schedules a berry to be eaten once its condition holds.
#[derive(Debug)]
pub struct BerryEffect {
    pub berry: BerryKind,
}

impl MoveEffect for BerryEffect {
    fn name(&self) -> &'static str {
        "berry"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if berry_applies(self.berry, ctx.field.get(ctx.user)?) {
            ctx.phases
                .insert_next(Box::new(BerryPhase::new(ctx.user, self.berry)));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SummonWeatherEffect {
    pub weather: WeatherKind,
    pub turns: u8,
}

impl MoveEffect for SummonWeatherEffect {
    fn name(&self) -> &'static str {
        "summon weather"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        start_weather(
            ctx.field,
            ctx.events,
            ctx.phases,
            self.weather,
            self.turns,
            Some(ctx.user),
        );
        Ok(())
    }
}

/// Changes a stat of every active opponent when the holder enters.
#[derive(Debug)]
pub struct SummonStatChangeEffect {
    pub stat: BattleStat,
    pub levels: i8,
}

impl MoveEffect for SummonStatChangeEffect {
    fn name(&self) -> &'static str {
        "summon stat change"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        for opponent in ctx.field.opponents_of(ctx.user) {
            ctx.phases.insert_next(Box::new(StatChangePhase::new(
                opponent,
                Some(ctx.user),
                vec![self.stat],
                self.levels,
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct WeatherImmunityEffect;

impl MoveEffect for WeatherImmunityEffect {
    fn name(&self) -> &'static str {
        "weather immunity"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        ctx.result.cancelled = true;
        Ok(())
    }
}
