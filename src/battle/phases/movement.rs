// In: src/battle/phases/movement.rs

//! The three phases of one move activation.
//!
//! `MovePhase` decides whether the move happens at all and against whom.
//! `MoveEffectPhase` performs one strike against every target and re-inserts
//! itself while strikes remain. `MoveEndPhase` settles costs and bookkeeping.

use super::CommonAnimPhase;
use crate::battle::calculators::{move_hits, roll_hit_count, HitCheckInput};
use crate::battle::move_effects::{
    apply_held_stage, apply_stage, has_charge_effect, EffectAttribute, EffectContext, EffectResult,
    TriggerStage,
};
use crate::battle::move_pipeline::{
    check_status, effectiveness, move_cost, reachable, resolve_targets, MoveStage, StatusCheck,
};
use crate::battle::scheduler::Phase;
use crate::battle::state::{BattleContext, BattleEvent, PreventionReason};
use crate::battle::tags::lapse_tags;
use crate::collaborators::{Animation, CommonAnim};
use crate::combatant::{CombatantId, HitResult, MoveResult, TurnMove};
use crate::content::ContentTable;
use crate::errors::BattleResult;
use crate::field::BattlerIndex;
use async_trait::async_trait;
use schema::{LapseTrigger, MoveData, MoveId, TagKind};
use std::sync::Arc;

// --- MOVE PHASE ---

/// Pre-checks and target resolution for one combatant's move.
#[derive(Debug)]
pub struct MovePhase {
    user: CombatantId,
    move_id: MoveId,
    targets: Vec<BattlerIndex>,
    ignore_pp: bool,
}

impl MovePhase {
    pub fn new(user: CombatantId, move_id: MoveId, targets: Vec<BattlerIndex>) -> Self {
        Self {
            user,
            move_id,
            targets,
            ignore_pp: false,
        }
    }

    /// Forced and follow-up moves skip the use checks and cost nothing.
    pub fn ignoring_pp(mut self, ignore_pp: bool) -> Self {
        self.ignore_pp = ignore_pp;
        self
    }

    fn follow_up(&self) -> bool {
        self.ignore_pp && self.move_id != MoveId::STRUGGLE
    }

    fn skips_use_checks(&self) -> bool {
        self.ignore_pp || self.move_id == MoveId::STRUGGLE
    }

    /// Records a turn on which the combatant did not get to move.
    fn prevent(&self, ctx: &mut BattleContext, reason: PreventionReason, attempted: Option<MoveId>) -> BattleResult<()> {
        let user = ctx.field.get_mut(self.user)?;
        user.move_history.push(TurnMove {
            move_id: attempted,
            targets: Vec::new(),
            result: MoveResult::Fail,
            follow_up: false,
        });
        user.turn_data.last_result = Some(MoveResult::Fail);
        let hidden = user.hiding_tag();
        if let Some(kind) = hidden {
            user.remove_tag(kind);
            ctx.events.push(BattleEvent::TagRemoved {
                combatant: self.user,
                tag: kind,
            });
        }

        ctx.events.push(BattleEvent::ActionPrevented {
            combatant: self.user,
            reason,
        });
        ctx.events.push(BattleEvent::MoveResolved {
            user: self.user,
            move_id: self.move_id,
            result: MoveResult::Fail,
            hits: 0,
        });
        tracing::debug!(user = ?self.user, move_id = ?self.move_id, ?reason, "move prevented");
        Ok(())
    }

    /// Use and disable checks. Returns `false` when the move cannot start.
    async fn check_uses(&self, ctx: &mut BattleContext, move_name: &str) -> BattleResult<bool> {
        let user = ctx.field.get(self.user)?;
        let name = user.name.clone();
        let disabled = user.is_move_disabled(self.move_id);
        let uses_left = user.move_slot(self.move_id).map_or(0, |slot| slot.uses_left());
        if disabled {
            ctx.show_message(&format!("{}'s {} is disabled!", name, move_name))
                .await;
            self.prevent(ctx, PreventionReason::Disabled, Some(self.move_id))?;
            return Ok(false);
        }
        if uses_left == 0 {
            ctx.show_message(&format!("{} used {}!", name, move_name))
                .await;
            ctx.show_message("But it failed!").await;
            self.prevent(ctx, PreventionReason::NoUsesLeft, Some(self.move_id))?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Non-volatile status gate. Returns `false` when the status stops the
    /// move.
    async fn status_gate(&self, ctx: &mut BattleContext) -> BattleResult<bool> {
        let combatant = ctx.field.get_mut(self.user)?;
        let Some(mut status) = combatant.status else {
            return Ok(true);
        };
        let outcome = check_status(&mut status, &mut ctx.rng);
        combatant.status = Some(status);
        let name = combatant.name.clone();

        match outcome {
            StatusCheck::Unaffected => Ok(true),
            StatusCheck::Prevented(effect) => {
                ctx.show_message(&format!("{} {}", name, effect.activation_text()))
                    .await;
                ctx.phases.insert_next(Box::new(CommonAnimPhase::new(
                    CommonAnim::for_status(effect),
                    self.user,
                )));
                self.prevent(ctx, PreventionReason::Status(effect), None)?;
                Ok(false)
            }
            StatusCheck::Cured(effect) => {
                ctx.field.get_mut(self.user)?.status = None;
                ctx.events.push(BattleEvent::StatusCured {
                    target: self.user,
                    status: effect,
                });
                ctx.show_message(&format!("{} {}", name, effect.heal_text()))
                    .await;
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl Phase for MovePhase {
    fn name(&self) -> &'static str {
        "MovePhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let user = ctx.field.get_mut(self.user)?;
        if !user.is_active() {
            return Ok(());
        }
        user.turn_data.acted = true;
        let content = Arc::clone(&ctx.content);
        let entry = content.move_entry(self.move_id)?;
        let move_data = &entry.data;
        tracing::debug!(user = ?self.user, move_id = ?self.move_id, stage = %MoveStage::PreCheck, "move phase");

        if !self.skips_use_checks() && !self.check_uses(ctx, &move_data.name).await? {
            return Ok(());
        }
        if !self.status_gate(ctx).await? {
            return Ok(());
        }
        if let Some(tag) = lapse_tags(ctx, self.user, LapseTrigger::Move).await? {
            return self.prevent(ctx, PreventionReason::Tag(tag), None);
        }

        tracing::trace!(stage = %MoveStage::TargetResolve, "resolving targets");
        let targets = resolve_targets(&ctx.field, self.user, move_data, &self.targets)?;

        let user = ctx.field.get(self.user)?;
        let name = user.name.clone();
        let releasing = user.last_move().is_some_and(|last| {
            last.move_id == Some(self.move_id) && last.result == MoveResult::Other
        });
        let charging = has_charge_effect(&entry.attributes) && !releasing;
        if !charging {
            ctx.show_message(&format!("{} used {}!", name, move_data.name))
                .await;
            ctx.play_animation(Animation::Move {
                user: self.user,
                move_id: self.move_id,
            })
            .await;
        }
        ctx.events.push(BattleEvent::MoveUsed {
            user: self.user,
            move_id: self.move_id,
        });

        // Nobody left to act on: the move fails without using it up.
        if targets.is_empty() {
            self.fail(ctx, "But it failed!").await?;
            ctx.phases.insert_next(Box::new(MoveEndPhase::new(
                self.user,
                self.move_id,
                true,
            )));
            return Ok(());
        }

        let cancelled_by = ctx
            .field
            .weather()
            .filter(|weather| move_data.is_damaging() && weather.cancels(move_data.element));
        match cancelled_by.and_then(|weather| weather.cancel_text()) {
            Some(text) => self.fail(ctx, text).await?,
            None => {
                ctx.phases.insert_next(Box::new(MoveEffectPhase::new(
                    self.user,
                    self.move_id,
                    targets,
                    self.follow_up(),
                )));
            }
        }
        ctx.phases.insert_next(Box::new(MoveEndPhase::new(
            self.user,
            self.move_id,
            self.ignore_pp,
        )));
        Ok(())
    }
}

impl MovePhase {
    async fn fail(&self, ctx: &mut BattleContext, text: &str) -> BattleResult<()> {
        let user = ctx.field.get_mut(self.user)?;
        user.move_history.push(TurnMove {
            move_id: Some(self.move_id),
            targets: Vec::new(),
            result: MoveResult::Fail,
            follow_up: self.follow_up(),
        });
        user.turn_data.last_result = Some(MoveResult::Fail);
        ctx.show_message(text).await;
        ctx.events.push(BattleEvent::MoveFailed {
            user: self.user,
            move_id: self.move_id,
        });
        tracing::debug!(user = ?self.user, move_id = ?self.move_id, text, "move failed");
        Ok(())
    }
}

// --- MOVE EFFECT PHASE ---

/// Applies the staged effect attributes of the move to one target.
#[allow(clippy::too_many_arguments)]
fn run_stage(
    ctx: &mut BattleContext,
    attributes: &[EffectAttribute],
    stage: TriggerStage,
    user: CombatantId,
    target: CombatantId,
    move_data: &MoveData,
    content: &ContentTable,
    result: &mut EffectResult,
) -> BattleResult<()> {
    let mut effect_ctx = EffectContext {
        user,
        target,
        move_data: Some(move_data),
        content,
        field: &mut ctx.field,
        rng: &mut ctx.rng,
        phases: &mut ctx.phases,
        events: &mut ctx.events,
        result,
    };
    apply_stage(attributes, stage, &mut effect_ctx)
}

/// One strike of a move against each of its targets.
#[derive(Debug)]
pub struct MoveEffectPhase {
    user: CombatantId,
    move_id: MoveId,
    targets: Vec<CombatantId>,
    follow_up: bool,
}

impl MoveEffectPhase {
    pub fn new(user: CombatantId, move_id: MoveId, targets: Vec<CombatantId>, follow_up: bool) -> Self {
        Self {
            user,
            move_id,
            targets,
            follow_up,
        }
    }

    fn history_entry(&self, ctx: &BattleContext, result: MoveResult) -> TurnMove {
        TurnMove {
            move_id: Some(self.move_id),
            targets: self
                .targets
                .iter()
                .filter_map(|id| ctx.field.battler_index(*id))
                .collect(),
            result,
            follow_up: self.follow_up,
        }
    }

    fn record(&self, ctx: &mut BattleContext, entry: TurnMove) -> BattleResult<()> {
        let user = ctx.field.get_mut(self.user)?;
        user.turn_data.last_result = Some(entry.result);
        user.move_history.push(entry);
        Ok(())
    }

    /// Ability and held-item reactions to a landed strike: the attacker's
    /// first, then the defender's while it is still standing.
    fn after_hit(&self, ctx: &mut BattleContext, move_data: &MoveData, target: CombatantId, damage: u16) -> BattleResult<()> {
        let mut attack = EffectResult {
            damage_dealt: damage,
            ..EffectResult::default()
        };
        apply_held_stage(ctx, TriggerStage::PostAttack, self.user, target, Some(move_data), &mut attack)?;

        if target == self.user || !ctx.field.get(target)?.is_active() {
            return Ok(());
        }
        let mut defend = EffectResult {
            damage_dealt: damage,
            ..EffectResult::default()
        };
        apply_held_stage(ctx, TriggerStage::PostDefend, target, self.user, Some(move_data), &mut defend)
    }
}

#[async_trait]
impl Phase for MoveEffectPhase {
    fn name(&self) -> &'static str {
        "MoveEffectPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let user = ctx.field.get(self.user)?;
        if !user.is_active() {
            return Ok(());
        }
        let first_strike = user.turn_data.hits_left.is_none();
        let content = Arc::clone(&ctx.content);
        let entry = content.move_entry(self.move_id)?;
        let move_data = &entry.data;
        let attributes = entry.attributes.as_slice();

        if first_strike {
            self.targets
                .retain(|id| ctx.field.get(*id).is_ok_and(|c| c.is_active()));
        } else {
            self.targets.retain(|id| reachable(&ctx.field, *id, move_data));
        }
        let Some(&lead) = self.targets.first() else {
            if first_strike {
                let entry = self.history_entry(ctx, MoveResult::Fail);
                self.record(ctx, entry)?;
                ctx.phases.queue_message("But it failed!");
            }
            return Ok(());
        };

        if first_strike {
            let mut pre = EffectResult::default();
            run_stage(ctx, attributes, TriggerStage::PreApply, self.user, lead, move_data, &content, &mut pre)?;
            if pre.overridden {
                let entry = self.history_entry(ctx, pre.move_result.unwrap_or(MoveResult::Other));
                return self.record(ctx, entry);
            }

            lapse_tags(ctx, self.user, LapseTrigger::MoveEffect).await?;
            let hits = roll_hit_count(move_data.multi_hit, &mut ctx.rng);
            let turn_data = &mut ctx.field.get_mut(self.user)?.turn_data;
            turn_data.hits_left = Some(hits);
            turn_data.hit_count = hits;
            let entry = self.history_entry(ctx, MoveResult::Pending);
            self.record(ctx, entry)?;
        }

        let (hits_left, hit_count) = {
            let turn_data = &ctx.field.get(self.user)?.turn_data;
            (turn_data.hits_left.unwrap_or(1), turn_data.hit_count)
        };
        let strike = hit_count.saturating_sub(hits_left) + 1;
        let user_name = ctx.name_of(self.user);

        let mut landed = false;
        let mut missed = false;
        let mut override_result = None;
        for target in self.targets.clone() {
            if !ctx.field.get(target)?.is_active() {
                continue;
            }
            let target_name = ctx.name_of(target);
            let mut result = EffectResult::default();

            tracing::trace!(stage = %MoveStage::HitCheck, ?target, strike, "hit check");
            let hit = move_hits(
                &HitCheckInput {
                    user: ctx.field.get(self.user)?,
                    target: ctx.field.get(target)?,
                    move_data,
                    field: &ctx.field,
                    content: &content,
                    gravity_multiplier: ctx.config.gravity_accuracy_multiplier,
                },
                &mut ctx.rng,
            );
            if !hit {
                missed = true;
                ctx.phases
                    .queue_message(format!("{}'s attack missed!", user_name));
                ctx.events.push(BattleEvent::MoveMissed {
                    user: self.user,
                    target,
                    move_id: self.move_id,
                });
                run_stage(ctx, attributes, TriggerStage::Miss, self.user, target, move_data, &content, &mut result)?;
                continue;
            }

            let protected = target != self.user
                && !move_data.flags.ignore_protect
                && ctx.field.get(target)?.has_tag(TagKind::Protected);
            if protected {
                ctx.phases
                    .queue_message(format!("{} protected itself!", target_name));
                continue;
            }

            let (multiplier, hit_result) = effectiveness(move_data, ctx.field.get(target)?);
            if hit_result == HitResult::NoEffect {
                ctx.phases
                    .queue_message(format!("It doesn't affect {}...", target_name));
                continue;
            }
            result.effectiveness = multiplier;
            result.hit_result = hit_result;

            ctx.events.push(BattleEvent::MoveHit {
                user: self.user,
                target,
                move_id: self.move_id,
                hit: strike,
            });
            tracing::trace!(stage = %MoveStage::EffectApply, ?target, "applying effects");
            if !landed {
                run_stage(ctx, attributes, TriggerStage::PostApplySelf, self.user, target, move_data, &content, &mut result)?;
            }
            landed = true;
            run_stage(ctx, attributes, TriggerStage::PostApplyTarget, self.user, target, move_data, &content, &mut result)?;
            run_stage(ctx, attributes, TriggerStage::Hit, self.user, target, move_data, &content, &mut result)?;
            if let Some(forced) = result.move_result {
                override_result = Some(forced);
            }

            self.after_hit(ctx, move_data, target, result.damage_dealt)?;
        }

        let strike_result = override_result.unwrap_or(if landed {
            MoveResult::Success
        } else if missed {
            MoveResult::Miss
        } else {
            MoveResult::NoEffect
        });
        let user = ctx.field.get_mut(self.user)?;
        let earlier_success = user.turn_data.last_result == Some(MoveResult::Success);
        let result = if earlier_success && override_result.is_none() {
            MoveResult::Success
        } else {
            strike_result
        };
        user.turn_data.last_result = Some(result);
        if let Some(last) = user.move_history.last_mut() {
            last.result = result;
        }
        if !landed {
            user.turn_data.hit_count = 0;
            user.turn_data.hits_left = Some(0);
        }
        Ok(())
    }

    async fn end(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let content = Arc::clone(&ctx.content);
        let move_data = content.move_data(self.move_id)?;
        let any_target_reachable = self
            .targets
            .iter()
            .any(|id| reachable(&ctx.field, *id, move_data));
        let user = ctx.field.get_mut(self.user)?;
        let Some(hits_left) = user.turn_data.hits_left else {
            return Ok(());
        };
        if hits_left == 0 {
            return Ok(());
        }
        let remaining = hits_left - 1;
        user.turn_data.hits_left = Some(remaining);

        if remaining >= 1 && user.is_active() && any_target_reachable {
            ctx.phases.insert_next(Box::new(MoveEffectPhase::new(
                self.user,
                self.move_id,
                self.targets.clone(),
                self.follow_up,
            )));
            return Ok(());
        }

        let total = user.turn_data.hit_count.saturating_sub(remaining);
        user.turn_data.hit_count = total;
        if total > 1 {
            ctx.phases.queue_message(format!("Hit {} times!", total));
        }
        Ok(())
    }
}

// --- MOVE END PHASE ---

/// Settles a finished activation: history, cost, after-move items and tags.
#[derive(Debug)]
pub struct MoveEndPhase {
    user: CombatantId,
    move_id: MoveId,
    ignore_pp: bool,
}

impl MoveEndPhase {
    pub fn new(user: CombatantId, move_id: MoveId, ignore_pp: bool) -> Self {
        Self {
            user,
            move_id,
            ignore_pp,
        }
    }
}

#[async_trait]
impl Phase for MoveEndPhase {
    fn name(&self) -> &'static str {
        "MoveEndPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        tracing::trace!(user = ?self.user, stage = %MoveStage::Cleanup, "move cleanup");
        let content = Arc::clone(&ctx.content);
        let move_data = content.move_data(self.move_id)?;
        let cost = if self.ignore_pp || self.move_id == MoveId::STRUGGLE {
            0
        } else {
            move_cost(ctx, self.user, move_data)?
        };

        let user = ctx.field.get_mut(self.user)?;
        let result = match user.turn_data.last_result {
            Some(MoveResult::Pending) => MoveResult::Success,
            Some(result) => result,
            None => MoveResult::Fail,
        };
        if let Some(last) = user.move_history.last_mut() {
            if last.result == MoveResult::Pending {
                last.result = result;
            }
        }
        if cost > 0 {
            user.spend_pp(self.move_id, cost)?;
        }
        user.turn_data.last_result = Some(result);
        user.turn_data.hits_left = None;
        let hits = user.turn_data.hit_count;
        let active = user.is_active();

        if active {
            let mut after = EffectResult::default();
            apply_held_stage(ctx, TriggerStage::PostMove, self.user, self.user, Some(move_data), &mut after)?;
        }

        ctx.events.push(BattleEvent::MoveResolved {
            user: self.user,
            move_id: self.move_id,
            result,
            hits,
        });
        if active {
            lapse_tags(ctx, self.user, LapseTrigger::AfterMove).await?;
        }
        Ok(())
    }
}
