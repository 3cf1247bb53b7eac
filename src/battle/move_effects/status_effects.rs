// In: src/battle/move_effects/status_effects.rs

use super::{EffectContext, MoveEffect};
use crate::battle::phases::ObtainStatusEffectPhase;
use crate::battle::state::BattleEvent;
use crate::combatant::{BattlerTag, MoveResult};
use crate::errors::BattleResult;
use schema::{MoveCategory, StatusEffect, TagKind};

/// Inflicts a non-volatile status, possibly with a secondary-effect chance.
#[derive(Debug)]
pub struct StatusInflictEffect {
    pub status: StatusEffect,
    pub chance: u8,
}

impl MoveEffect for StatusInflictEffect {
    fn name(&self) -> &'static str {
        "status"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let target = ctx.field.get(ctx.target)?;
        if target.is_fainted() {
            return Ok(());
        }
        // Secondary effects stay quiet against an already-afflicted target.
        if self.chance < 100 && target.status.is_some() {
            return Ok(());
        }
        if !ctx.rng.chance(self.chance, "status chance") {
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

#[derive(Debug)]
pub struct FlinchEffect {
    pub chance: u8,
}

impl MoveEffect for FlinchEffect {
    fn name(&self) -> &'static str {
        "flinch"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if ctx.field.get(ctx.target)?.is_fainted() || !ctx.rng.chance(self.chance, "flinch chance")
        {
            return Ok(());
        }
        let move_id = ctx.move_data.map(|m| m.id);
        let tag = BattlerTag::new(TagKind::Flinched).with_source(ctx.user, move_id);
        if ctx.field.get_mut(ctx.target)?.add_tag(tag) {
            ctx.events.push(BattleEvent::TagAdded {
                combatant: ctx.target,
                tag: TagKind::Flinched,
            });
        }
        Ok(())
    }
}

/// Attaches a volatile tag to the user or the target.
#[derive(Debug)]
pub struct AddTagEffect {
    pub tag: TagKind,
    pub self_target: bool,
    pub chance: u8,
}

impl AddTagEffect {
    fn added_text(&self, holder: &str, other: &str) -> Option<String> {
        match self.tag {
            TagKind::Confused => Some(format!("{} became confused!", holder)),
            TagKind::Protected => Some(format!("{} protected itself!", holder)),
            TagKind::LockOn => Some(format!("{} took aim at {}!", holder, other)),
            TagKind::CritBoost => Some(format!("{} is getting pumped!", holder)),
            TagKind::Trapped => Some(format!("{} can no longer escape!", holder)),
            _ => None,
        }
    }
}

impl MoveEffect for AddTagEffect {
    fn name(&self) -> &'static str {
        "add tag"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let (holder, other) = if self.self_target {
            (ctx.user, ctx.target)
        } else {
            (ctx.target, ctx.user)
        };
        if ctx.field.get(holder)?.is_fainted() || !ctx.rng.chance(self.chance, "tag chance") {
            return Ok(());
        }

        let mut tag = BattlerTag::new(self.tag).with_source(ctx.user, ctx.move_data.map(|m| m.id));
        match self.tag {
            TagKind::Confused => {
                let turns = ctx.rng.rand_int(4, 2, "confusion turns") as u8;
                tag = tag.with_turns(turns);
            }
            // The lock points at the combatant it guarantees hits against.
            TagKind::LockOn => tag.source = Some(other),
            _ => {}
        }

        if ctx.field.get_mut(holder)?.add_tag(tag) {
            ctx.events.push(BattleEvent::TagAdded {
                combatant: holder,
                tag: self.tag,
            });
            let text = self.added_text(&ctx.name_of(holder), &ctx.name_of(other));
            if let Some(text) = text {
                ctx.phases.queue_message(text);
            }
        } else if ctx
            .move_data
            .is_some_and(|m| m.category == MoveCategory::Status)
        {
            ctx.result.move_result = Some(MoveResult::Fail);
            ctx.phases.queue_message("But it failed!");
        }
        Ok(())
    }
}

/// Disables the target's last used move for a number of turns.
#[derive(Debug)]
pub struct DisableEffect {
    pub turns: u8,
}

impl MoveEffect for DisableEffect {
    fn name(&self) -> &'static str {
        "disable"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let target = ctx.field.get(ctx.target)?;
        let last = target
            .move_history
            .iter()
            .rev()
            .find_map(|m| m.move_id)
            .filter(|id| target.move_slot(*id).is_some());

        match last {
            Some(move_id) if target.summon_data.disabled_move.is_none() => {
                let move_name = ctx.content.move_data(move_id)?.name.clone();
                let name = target.name.clone();
                let target = ctx.field.get_mut(ctx.target)?;
                target.summon_data.disabled_move = Some(move_id);
                target.summon_data.disabled_turns = self.turns;
                ctx.phases
                    .queue_message(format!("{}'s {} was disabled!", name, move_name));
            }
            _ => {
                ctx.result.move_result = Some(MoveResult::Fail);
                ctx.phases.queue_message("But it failed!");
            }
        }
        Ok(())
    }
}
