// In: src/battle/phases/status.rs

use super::{apply_damage, queue_faint_check};
use crate::battle::move_effects::{apply_held_stage, EffectResult, TriggerStage};
use crate::battle::scheduler::Phase;
use crate::battle::state::{BattleContext, BattleEvent};
use crate::collaborators::{Animation, CommonAnim};
use crate::combatant::{CombatantId, StatusState};
use crate::errors::BattleResult;
use async_trait::async_trait;
use schema::{ArenaTagKind, BattleStat, ElementType, StatusEffect};

// --- STAT STAGES ---

/// Raises or lowers stat stages, subject to drop protection.
#[derive(Debug)]
pub struct StatChangePhase {
    target: CombatantId,
    /// Who caused the change; drops a combatant inflicts on itself are never
    /// blocked.
    source: Option<CombatantId>,
    stats: Vec<BattleStat>,
    levels: i8,
}

impl StatChangePhase {
    pub fn new(target: CombatantId, source: Option<CombatantId>, stats: Vec<BattleStat>, levels: i8) -> Self {
        Self {
            target,
            source,
            stats,
            levels,
        }
    }

    /// Reason the drop is blocked, if any: the side's mist first, then the
    /// target's own `PreStatChange` attributes.
    fn drop_guard(&self, ctx: &mut BattleContext) -> BattleResult<Option<String>> {
        if self.levels >= 0 || self.source == Some(self.target) {
            return Ok(None);
        }
        let side = ctx.field.get(self.target)?.side;
        if ctx.field.has_arena_tag(ArenaTagKind::Mist, Some(side)) {
            return Ok(Some("Mist".to_string()));
        }
        let mut result = EffectResult::default();
        apply_held_stage(
            ctx,
            TriggerStage::PreStatChange,
            self.target,
            self.source.unwrap_or(self.target),
            None,
            &mut result,
        )?;
        Ok(result.blocked_by)
    }
}

fn change_text(name: &str, stat: BattleStat, delta: i8, requested: i8) -> String {
    let phrase = match (delta, requested > 0) {
        (0, true) => "won't go any higher!",
        (0, false) => "won't go any lower!",
        (1, _) => "rose!",
        (2, _) => "sharply rose!",
        (d, _) if d >= 3 => "rose drastically!",
        (-1, _) => "fell!",
        (-2, _) => "harshly fell!",
        _ => "severely fell!",
    };
    format!("{}'s {} {}", name, stat, phrase)
}

#[async_trait]
impl Phase for StatChangePhase {
    fn name(&self) -> &'static str {
        "StatChangePhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        if !ctx.field.get(self.target)?.is_active() {
            return Ok(());
        }
        let name = ctx.name_of(self.target);

        if let Some(reason) = self.drop_guard(ctx)? {
            for stat in &self.stats {
                ctx.events.push(BattleEvent::StatChangeBlocked {
                    target: self.target,
                    stat: *stat,
                    reason: reason.clone(),
                });
            }
            let text = if reason == "Mist" {
                format!("{} is protected by the mist!", name)
            } else {
                format!("{}'s {} prevents its stats from being lowered!", name, reason)
            };
            ctx.show_message(&text).await;
            return Ok(());
        }

        let mut animated = false;
        for stat in self.stats.clone() {
            let combatant = ctx.field.get_mut(self.target)?;
            let old_stage = combatant.stages.get(stat);
            let delta = combatant.stages.change(stat, self.levels);
            if delta != 0 {
                ctx.events.push(BattleEvent::StatStageChanged {
                    target: self.target,
                    stat,
                    old_stage,
                    new_stage: old_stage + delta,
                });
                if !animated {
                    animated = true;
                    ctx.play_animation(Animation::StatChange {
                        target: self.target,
                        rising: delta > 0,
                    })
                    .await;
                }
            }
            ctx.show_message(&change_text(&name, stat, delta, self.levels))
                .await;
        }
        Ok(())
    }
}

// --- NON-VOLATILE STATUS ---

fn immune_by_type(status: StatusEffect, types: &[ElementType]) -> bool {
    let immune = match status {
        StatusEffect::Poison | StatusEffect::Toxic => ElementType::Poison,
        StatusEffect::Burn => ElementType::Fire,
        StatusEffect::Freeze => ElementType::Ice,
        StatusEffect::Paralysis => ElementType::Electric,
        StatusEffect::Sleep => return false,
    };
    types.contains(&immune)
}

/// Tries to give a combatant a non-volatile status.
#[derive(Debug)]
pub struct ObtainStatusEffectPhase {
    target: CombatantId,
    status: StatusEffect,
    source: Option<CombatantId>,
}

impl ObtainStatusEffectPhase {
    pub fn new(target: CombatantId, status: StatusEffect, source: Option<CombatantId>) -> Self {
        Self {
            target,
            status,
            source,
        }
    }
}

#[async_trait]
impl Phase for ObtainStatusEffectPhase {
    fn name(&self) -> &'static str {
        "ObtainStatusEffectPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let target = ctx.field.get(self.target)?;
        if !target.is_active() {
            return Ok(());
        }
        let name = target.name.clone();

        if let Some(current) = target.status_effect() {
            if current == self.status {
                ctx.show_message(&format!("{} {}", name, self.status.overlap_text()))
                    .await;
            }
            return Ok(());
        }
        if immune_by_type(self.status, &target.types) {
            tracing::debug!(target = ?self.target, status = ?self.status, "type immunity");
            return Ok(());
        }

        let cure_turn = match self.status {
            StatusEffect::Sleep => ctx.rng.rand_int(3, 2, "sleep turns"),
            _ => 0,
        };
        ctx.field.get_mut(self.target)?.status = Some(StatusState {
            effect: self.status,
            turn_count: 0,
            cure_turn,
        });
        ctx.events.push(BattleEvent::StatusApplied {
            target: self.target,
            status: self.status,
        });
        tracing::debug!(target = ?self.target, source = ?self.source, status = ?self.status, "status applied");

        ctx.play_animation(Animation::Common {
            anim: CommonAnim::for_status(self.status),
            target: self.target,
        })
        .await;
        ctx.show_message(&format!("{} {}", name, self.status.obtain_text()))
            .await;
        Ok(())
    }
}

/// End-of-turn damage from poison, toxic and burn.
#[derive(Debug)]
pub struct PostTurnStatusEffectPhase {
    target: CombatantId,
}

impl PostTurnStatusEffectPhase {
    pub fn new(target: CombatantId) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Phase for PostTurnStatusEffectPhase {
    fn name(&self) -> &'static str {
        "PostTurnStatusEffectPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let combatant = ctx.field.get_mut(self.target)?;
        if !combatant.is_active() {
            return Ok(());
        }
        let max_hp = combatant.max_hp();
        let name = combatant.name.clone();
        let Some(status) = combatant.status.as_mut() else {
            return Ok(());
        };
        if !status.effect.is_post_turn() {
            return Ok(());
        }
        status.turn_count += 1;
        let effect = status.effect;
        let damage = match effect {
            StatusEffect::Toxic => {
                let scaled = (f64::from(max_hp) / 16.0 * f64::from(status.turn_count)).floor();
                (scaled as u16).max(1)
            }
            _ => (max_hp >> 3).max(1),
        };

        ctx.show_message(&format!("{} {}", name, effect.activation_text()))
            .await;
        ctx.play_animation(Animation::Common {
            anim: CommonAnim::for_status(effect),
            target: self.target,
        })
        .await;
        apply_damage(&mut ctx.field, &mut ctx.phases, &mut ctx.events, self.target, damage, None)?;
        queue_faint_check(&ctx.field, &mut ctx.phases, self.target)
    }
}
