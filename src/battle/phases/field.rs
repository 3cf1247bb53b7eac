// In: src/battle/phases/field.rs

//! Field-wide effects: the weather's end-of-turn pass and what happens to a
//! combatant as it enters the field.

use super::{apply_damage, queue_faint_check};
use crate::battle::move_effects::{apply_held_stage, EffectResult, TriggerStage};
use crate::battle::scheduler::Phase;
use crate::battle::state::BattleContext;
use crate::collaborators::{Animation, CommonAnim};
use crate::combatant::CombatantId;
use crate::errors::BattleResult;
use async_trait::async_trait;
use schema::{ArenaTagKind, ElementType};

// --- WEATHER ---

/// Announces the ongoing weather and deals its damage. Queued once per turn
/// after every move has resolved.
#[derive(Debug, Default)]
pub struct WeatherEffectPhase;

#[async_trait]
impl Phase for WeatherEffectPhase {
    fn name(&self) -> &'static str {
        "WeatherEffectPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let Some(weather) = ctx.field.weather() else {
            return Ok(());
        };
        ctx.show_message(weather.lapse_text()).await;
        let Some(damage_text) = weather.damage_text() else {
            return Ok(());
        };

        for id in ctx.field.active_ids() {
            let combatant = ctx.field.get(id)?;
            if combatant.types.iter().any(|t| weather.is_type_immune(*t)) {
                continue;
            }
            let mut guard = EffectResult::default();
            apply_held_stage(ctx, TriggerStage::PreWeatherDamage, id, id, None, &mut guard)?;
            if guard.cancelled {
                tracing::debug!(combatant = ?id, ?weather, "weather damage prevented");
                continue;
            }

            let combatant = ctx.field.get(id)?;
            let amount = combatant.max_hp().div_ceil(16);
            ctx.phases
                .queue_message(format!("{} {}", combatant.name, damage_text));
            ctx.play_animation(Animation::Common {
                anim: CommonAnim::Weather(weather),
                target: id,
            })
            .await;
            apply_damage(&mut ctx.field, &mut ctx.phases, &mut ctx.events, id, amount, None)?;
            queue_faint_check(&ctx.field, &mut ctx.phases, id)?;
        }
        Ok(())
    }
}

// --- SUMMONING ---

/// Runs after a combatant enters the field: entry hazards on its side, then
/// its own `PostSummon` attributes.
#[derive(Debug)]
pub struct PostSummonPhase {
    combatant: CombatantId,
}

impl PostSummonPhase {
    pub fn new(combatant: CombatantId) -> Self {
        Self { combatant }
    }

    fn spikes(&self, ctx: &mut BattleContext) -> BattleResult<()> {
        let combatant = ctx.field.get(self.combatant)?;
        let grounded = !combatant.types.contains(&ElementType::Flying);
        if !grounded || !ctx.field.has_arena_tag(ArenaTagKind::Spikes, Some(combatant.side)) {
            return Ok(());
        }
        let amount = (combatant.max_hp() / 8).max(1);
        ctx.phases
            .queue_message(format!("{} is hurt by the spikes!", combatant.name));
        apply_damage(&mut ctx.field, &mut ctx.phases, &mut ctx.events, self.combatant, amount, None)?;
        queue_faint_check(&ctx.field, &mut ctx.phases, self.combatant)
    }
}

#[async_trait]
impl Phase for PostSummonPhase {
    fn name(&self) -> &'static str {
        "PostSummonPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        if !ctx.field.get(self.combatant)?.is_active() {
            return Ok(());
        }
        self.spikes(ctx)?;
        if !ctx.field.get(self.combatant)?.is_active() {
            return Ok(());
        }
        let mut result = EffectResult::default();
        apply_held_stage(
            ctx,
            TriggerStage::PostSummon,
            self.combatant,
            self.combatant,
            None,
            &mut result,
        )
    }
}
