// In: src/battle/move_effects/special_effects.rs

use super::{EffectContext, MoveEffect};
use crate::battle::phases::PokemonHealPhase;
use crate::battle::state::BattleEvent;
use crate::combatant::{BattlerTag, MoveResult, QueuedMove};
use crate::errors::BattleResult;
use schema::TagKind;

/// First half of a two-turn move. On the charging turn the user optionally
/// hides, queues the release as a follow-up, and the rest of the move is
/// overridden.
#[derive(Debug)]
pub struct ChargeEffect {
    pub hide: Option<TagKind>,
    pub text: String,
}

impl ChargeEffect {
    /// The release turn directly follows a charging turn of the same move.
    fn is_release_turn(&self, ctx: &EffectContext<'_>) -> BattleResult<bool> {
        let move_id = ctx.move_data(self.name())?.id;
        let user = ctx.field.get(ctx.user)?;
        Ok(user.last_move().is_some_and(|last| {
            last.move_id == Some(move_id) && last.result == MoveResult::Other
        }))
    }
}

impl MoveEffect for ChargeEffect {
    fn name(&self) -> &'static str {
        "charge"
    }

    fn is_charge(&self) -> bool {
        true
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if self.is_release_turn(ctx)? {
            return Ok(());
        }

        let targets = ctx.field.battler_index(ctx.target).into_iter().collect();
        let move_id = ctx.move_data(self.name())?.id;
        let user = ctx.field.get_mut(ctx.user)?;
        let name = user.name.clone();
        if let Some(hide) = self.hide {
            let tag = BattlerTag::new(hide).with_source(ctx.user, Some(move_id));
            if user.add_tag(tag) {
                ctx.events.push(BattleEvent::TagAdded {
                    combatant: ctx.user,
                    tag: hide,
                });
            }
        }
        user.move_queue.push_back(QueuedMove {
            move_id,
            targets,
            ignore_pp: true,
        });

        ctx.phases.queue_message(format!("{} {}", name, self.text));
        ctx.result.overridden = true;
        ctx.result.cancelled = true;
        ctx.result.move_result = Some(MoveResult::Other);
        Ok(())
    }
}

/// The user must skip its next move.
#[derive(Debug)]
pub struct RechargeEffect;

impl MoveEffect for RechargeEffect {
    fn name(&self) -> &'static str {
        "recharge"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let move_id = ctx.move_data(self.name())?.id;
        let tag = BattlerTag::new(TagKind::Recharging).with_source(ctx.user, Some(move_id));
        if ctx.field.get_mut(ctx.user)?.add_tag(tag) {
            ctx.events.push(BattleEvent::TagAdded {
                combatant: ctx.user,
                tag: TagKind::Recharging,
            });
        }
        Ok(())
    }
}

/// Restores a fraction of the user's max HP.
#[derive(Debug)]
pub struct HealEffect {
    pub divisor: u16,
}

impl MoveEffect for HealEffect {
    fn name(&self) -> &'static str {
        "heal"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let user = ctx.field.get(ctx.user)?;
        if user.hp >= user.max_hp() {
            ctx.result.move_result = Some(MoveResult::Fail);
            ctx.phases
                .queue_message(format!("{}'s HP is full!", user.name));
            return Ok(());
        }
        let amount = (user.max_hp() / self.divisor.max(1)).max(1);
        let text = format!("{} regained health!", user.name);
        ctx.phases.insert_next(Box::new(PokemonHealPhase::new(
            ctx.user,
            amount,
            Some(text),
            false,
        )));
        Ok(())
    }
}
