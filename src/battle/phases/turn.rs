// In: src/battle/phases/turn.rs

use super::{
    AttemptCapturePhase, AttemptRunPhase, MovePhase, PostTurnStatusEffectPhase, SwitchSummonPhase,
    WeatherEffectPhase,
};
use crate::battle::commands::{validate, CommandKind, TurnCommand};
use crate::battle::move_effects::{apply_held_stage, EffectResult, TriggerStage};
use crate::battle::move_pipeline::{candidate_targets, default_targets, needs_selection};
use crate::battle::scheduler::Phase;
use crate::battle::state::{BattleContext, BattleEvent};
use crate::battle::tags::lapse_tags;
use crate::battle::turn_order::{field_order, move_order};
use crate::combatant::CombatantId;
use crate::errors::BattleResult;
use crate::field::BattlerIndex;
use async_trait::async_trait;
use schema::{LapseTrigger, MoveId};

/// Rejected choices tolerated before the combatant falls back to its
/// default command.
const MAX_COMMAND_ATTEMPTS: usize = 3;

// --- TURN SETUP ---

/// Clears last turn's bookkeeping and queues one command phase per active
/// slot, followed by the turn start.
#[derive(Debug, Default)]
pub struct TurnInitPhase;

#[async_trait]
impl Phase for TurnInitPhase {
    fn name(&self) -> &'static str {
        "TurnInitPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        ctx.commands.clear();
        for id in ctx.field.active_ids() {
            ctx.field.get_mut(id)?.reset_turn_data();
        }
        for index in BattlerIndex::all() {
            if ctx.field.active_at(index).is_some() {
                ctx.phases.push(Box::new(CommandPhase::new(index)));
            }
        }
        ctx.phases.push(Box::new(TurnStartPhase));
        Ok(())
    }
}

// --- COMMAND COLLECTION ---

/// Collects and validates the command of one slot.
#[derive(Debug)]
pub struct CommandPhase {
    index: BattlerIndex,
}

impl CommandPhase {
    pub fn new(index: BattlerIndex) -> Self {
        Self { index }
    }

    async fn choose(&self, ctx: &mut BattleContext, id: CombatantId) -> BattleResult<TurnCommand> {
        if let Some(queued) = ctx.field.get_mut(id)?.move_queue.pop_front() {
            tracing::debug!(combatant = ?id, move_id = ?queued.move_id, "forced follow-up");
            return Ok(TurnCommand::follow_up(&queued));
        }

        let side = self.index.side();
        for attempt in 1..=MAX_COMMAND_ATTEMPTS {
            let (input, field, content) = ctx.decision_view(side);
            let command = input.choose_command(field, content, id).await;
            match validate(&ctx.field, &ctx.content, id, &command)? {
                Ok(()) => return Ok(command),
                Err(rejection) => {
                    tracing::debug!(combatant = ?id, attempt, %rejection, "command rejected");
                    ctx.show_message(&rejection.to_string()).await;
                }
            }
        }
        tracing::warn!(combatant = ?id, "no valid command chosen, using the fallback");
        Ok(TurnCommand::fallback(ctx.field.get(id)?))
    }
}

#[async_trait]
impl Phase for CommandPhase {
    fn name(&self) -> &'static str {
        "CommandPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let Some(id) = ctx.field.active_at(self.index).map(|c| c.id) else {
            return Ok(());
        };
        if ctx.commands.get(self.index).is_some_and(|c| c.skip) {
            return Ok(());
        }

        let mut command = self.choose(ctx, id).await?;

        if let CommandKind::Fight { move_id, .. } = command.kind {
            if command.targets.is_empty() {
                let target = ctx.content.move_data(move_id)?.target;
                let candidates = candidate_targets(&ctx.field, id, target)?;
                if needs_selection(target, &candidates) {
                    ctx.phases.insert_next(Box::new(SelectTargetPhase::new(
                        self.index, id, move_id, candidates,
                    )));
                } else {
                    command.targets = default_targets(&ctx.field, id, target)?;
                }
            }
        }

        if ctx.field.double && self.index.slot() == 0 && command.pre_empts_partner() {
            ctx.commands.mark_partner_skipped(self.index, &command);
        }

        ctx.events.push(BattleEvent::CommandChosen {
            combatant: id,
            command: command.describe(&ctx.content),
        });
        ctx.commands.set(self.index, command);
        Ok(())
    }
}

/// Asks the chooser which slot a single-target move should hit.
#[derive(Debug)]
pub struct SelectTargetPhase {
    index: BattlerIndex,
    user: CombatantId,
    move_id: MoveId,
    candidates: Vec<BattlerIndex>,
}

impl SelectTargetPhase {
    pub fn new(index: BattlerIndex, user: CombatantId, move_id: MoveId, candidates: Vec<BattlerIndex>) -> Self {
        Self {
            index,
            user,
            move_id,
            candidates,
        }
    }
}

#[async_trait]
impl Phase for SelectTargetPhase {
    fn name(&self) -> &'static str {
        "SelectTargetPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let (input, field, _) = ctx.decision_view(self.index.side());
        let choice = input
            .choose_target(field, self.user, self.move_id, &self.candidates)
            .await;
        let target = if self.candidates.contains(&choice) {
            Some(choice)
        } else {
            self.candidates.first().copied()
        };
        if let Some(command) = ctx.commands.get_mut(self.index) {
            command.targets = target.into_iter().collect();
        }
        Ok(())
    }
}

// --- TURN START ---

/// Orders the collected commands and queues the phases that carry them out,
/// followed by upkeep.
#[derive(Debug, Default)]
pub struct TurnStartPhase;

#[async_trait]
impl Phase for TurnStartPhase {
    fn name(&self) -> &'static str {
        "TurnStartPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let by_speed = field_order(&ctx.field, &mut ctx.rng)?;
        let ordered = move_order(
            &by_speed,
            &ctx.field,
            &ctx.commands,
            &ctx.config.precedence,
            &ctx.content,
        )?;

        for entry in ordered {
            let Some(command) = ctx.commands.get(entry.index).cloned() else {
                continue;
            };
            match command.kind {
                CommandKind::Fight { move_id, ignore_pp } => {
                    ctx.phases.push(Box::new(
                        MovePhase::new(entry.combatant, move_id, command.targets)
                            .ignoring_pp(ignore_pp),
                    ));
                }
                CommandKind::Ball { tier } => {
                    let side = entry.index.side().opponent();
                    if let Some(target) = ctx.field.active_on_side(side).first() {
                        ctx.phases
                            .push(Box::new(AttemptCapturePhase::new(*target, tier)));
                    }
                }
                CommandKind::Switch {
                    roster_index,
                    baton_pass,
                } => {
                    ctx.phases.push(Box::new(SwitchSummonPhase::new(
                        entry.index,
                        roster_index,
                        baton_pass,
                    )));
                }
                CommandKind::Run => {
                    ctx.phases
                        .push(Box::new(AttemptRunPhase::new(entry.combatant)));
                }
            }
        }

        ctx.phases.push(Box::new(WeatherEffectPhase));
        for id in by_speed {
            ctx.phases.push(Box::new(PostTurnStatusEffectPhase::new(id)));
        }
        ctx.phases.push(Box::new(TurnEndPhase));
        Ok(())
    }
}

// --- TURN END ---

/// Upkeep: tag lapses, disable countdown, `TurnEnd` attributes of abilities
/// and held items, then arena tag expiry. Tags with no countdown stay.
#[derive(Debug, Default)]
pub struct TurnEndPhase;

impl TurnEndPhase {
    async fn upkeep(&self, ctx: &mut BattleContext, id: CombatantId) -> BattleResult<()> {
        lapse_tags(ctx, id, LapseTrigger::TurnEnd).await?;

        let combatant = ctx.field.get_mut(id)?;
        let name = combatant.name.clone();
        if let Some(move_id) = combatant.summon_data.disabled_move {
            combatant.summon_data.disabled_turns = combatant.summon_data.disabled_turns.saturating_sub(1);
            if combatant.summon_data.disabled_turns == 0 {
                combatant.summon_data.disabled_move = None;
                let move_name = ctx.content.move_data(move_id)?.name.clone();
                ctx.phases
                    .queue_message(format!("{}'s {} is disabled no more!", name, move_name));
            }
        }

        let mut result = EffectResult::default();
        apply_held_stage(ctx, TriggerStage::TurnEnd, id, id, None, &mut result)?;

        ctx.field.get_mut(id)?.summon_data.turns_on_field += 1;
        Ok(())
    }

    fn expire_arena_tags(&self, ctx: &mut BattleContext) {
        let (expired, kept): (Vec<_>, Vec<_>) = ctx
            .field
            .arena_tags
            .drain(..)
            .map(|mut tag| {
                if tag.turns_left > 0 {
                    tag.turns_left -= 1;
                    (tag, true)
                } else {
                    (tag, false)
                }
            })
            .partition(|(tag, counted)| *counted && tag.turns_left == 0);
        let kept = kept.into_iter().map(|(tag, _)| tag).collect();
        let expired: Vec<_> = expired.into_iter().map(|(tag, _)| tag).collect();
        ctx.field.arena_tags = kept;

        for tag in expired {
            ctx.events.push(BattleEvent::ArenaTagRemoved {
                kind: tag.kind,
                side: tag.side,
            });
            let text = match tag.side {
                Some(side) => format!("{} {}", side.team_label(), tag.kind.end_text()),
                None => tag.kind.end_text().to_string(),
            };
            ctx.phases.queue_message(text);
        }
    }
}

#[async_trait]
impl Phase for TurnEndPhase {
    fn name(&self) -> &'static str {
        "TurnEndPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        for id in ctx.field.active_ids() {
            self.upkeep(ctx, id).await?;
        }
        self.expire_arena_tags(ctx);
        Ok(())
    }
}
