// In: src/battle/phases/faint.rs

use super::{BattleEndPhase, PostSummonPhase};
use crate::battle::move_effects::{apply_held_stage, EffectResult, TriggerStage};
use crate::battle::scheduler::Phase;
use crate::battle::state::{BattleContext, BattleEvent, EncounterOutcome};
use crate::battle::tags::lapse_tags;
use crate::collaborators::Animation;
use crate::combatant::{CombatantId, Side};
use crate::errors::BattleResult;
use crate::field::BattlerIndex;
use async_trait::async_trait;
use schema::LapseTrigger;

// --- FAINTING ---

/// Handles a combatant that reached zero HP: lets its `PreFaint` attributes
/// revive it, or takes it off the field and decides what happens to its slot.
#[derive(Debug)]
pub struct FaintPhase {
    combatant: CombatantId,
}

impl FaintPhase {
    pub fn new(combatant: CombatantId) -> Self {
        Self { combatant }
    }

    fn revive(&self, ctx: &mut BattleContext) -> BattleResult<bool> {
        let mut result = EffectResult::default();
        apply_held_stage(
            ctx,
            TriggerStage::PreFaint,
            self.combatant,
            self.combatant,
            None,
            &mut result,
        )?;
        Ok(result.cancelled)
    }
}

#[async_trait]
impl Phase for FaintPhase {
    fn name(&self) -> &'static str {
        "FaintPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let combatant = ctx.field.get(self.combatant)?;
        if !combatant.on_field || combatant.hp > 0 {
            return Ok(());
        }
        let side = combatant.side;
        let name = combatant.name.clone();
        let Some(index) = ctx.field.battler_index(self.combatant) else {
            return Ok(());
        };

        if self.revive(ctx)? {
            return Ok(());
        }

        lapse_tags(ctx, self.combatant, LapseTrigger::Faint).await?;
        ctx.show_message(&format!("{} fainted!", name)).await;
        ctx.events.push(BattleEvent::Fainted {
            combatant: self.combatant,
        });
        ctx.play_animation(Animation::Faint(self.combatant)).await;

        for other in ctx.field.active_ids() {
            ctx.field.get_mut(other)?.remove_tags_sourced_by(self.combatant);
        }
        ctx.field.withdraw(self.combatant)?;
        tracing::info!(combatant = ?self.combatant, ?side, "fainted");

        if ctx.field.side_defeated(side) {
            let outcome = match side {
                Side::Player => EncounterOutcome::Defeat,
                Side::Enemy => EncounterOutcome::Victory,
            };
            ctx.phases.clear();
            ctx.phases.push(Box::new(BattleEndPhase::new(outcome)));
        } else if !ctx.field.reserves(side).is_empty() {
            ctx.phases
                .push(Box::new(SwitchSummonPhase::replacement(index)));
        }
        Ok(())
    }
}

// --- SWITCHING ---

/// Who goes into the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummonChoice {
    /// Ask the side's command source to pick among the reserves.
    Replacement,
    /// A specific roster member.
    Roster(usize),
}

/// Withdraws the occupant of a slot, if any, and sends in a new combatant.
#[derive(Debug)]
pub struct SwitchSummonPhase {
    index: BattlerIndex,
    choice: SummonChoice,
    baton_pass: bool,
    /// Leads wait for the whole field before their post-summon pass.
    post_summon: bool,
}

impl SwitchSummonPhase {
    pub fn new(index: BattlerIndex, roster_index: usize, baton_pass: bool) -> Self {
        Self {
            index,
            choice: SummonChoice::Roster(roster_index),
            baton_pass,
            post_summon: true,
        }
    }

    pub fn replacement(index: BattlerIndex) -> Self {
        Self {
            index,
            choice: SummonChoice::Replacement,
            baton_pass: false,
            post_summon: true,
        }
    }

    /// An opening send-out. The caller queues the post-summon pass.
    pub fn lead(index: BattlerIndex, roster_index: usize) -> Self {
        Self {
            post_summon: false,
            ..Self::new(index, roster_index, false)
        }
    }

    async fn incoming(&self, ctx: &mut BattleContext) -> BattleResult<Option<CombatantId>> {
        let side = self.index.side();
        let reserves = ctx.field.reserves(side);
        match self.choice {
            SummonChoice::Roster(position) => Ok(ctx
                .field
                .roster(side)
                .get(position)
                .copied()
                .filter(|id| reserves.contains(id))),
            SummonChoice::Replacement => {
                if reserves.is_empty() {
                    return Ok(None);
                }
                let (input, field, _) = ctx.decision_view(side);
                let chosen = input.choose_replacement(field, side, &reserves).await;
                // A pick outside the offer falls back to the first reserve.
                Ok(chosen
                    .filter(|id| reserves.contains(id))
                    .or_else(|| reserves.first().copied()))
            }
        }
    }
}

#[async_trait]
impl Phase for SwitchSummonPhase {
    fn name(&self) -> &'static str {
        "SwitchSummonPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let side = self.index.side();
        let Some(incoming) = self.incoming(ctx).await? else {
            tracing::debug!(index = ?self.index, "nobody to send out");
            return Ok(());
        };

        let outgoing = ctx.field.at(self.index);
        let mut stages = None;
        if let Some(outgoing) = outgoing {
            let leaving = ctx.field.get(outgoing)?;
            if leaving.is_active() {
                let name = leaving.name.clone();
                if self.baton_pass {
                    stages = Some(leaving.stages);
                }
                if side == Side::Player {
                    ctx.show_message(&format!("Come back, {}!", name)).await;
                } else {
                    ctx.show_message(&format!("{} withdrew {}!", side.team_label(), name))
                        .await;
                }
            }
            for other in ctx.field.active_ids() {
                ctx.field.get_mut(other)?.remove_tags_sourced_by(outgoing);
            }
            ctx.field.withdraw(outgoing)?;
        }

        ctx.field.send_out(self.index, incoming, false)?;
        if let Some(stages) = stages {
            ctx.field.get_mut(incoming)?.stages = stages;
        }
        let name = ctx.name_of(incoming);
        let text = match side {
            Side::Player => format!("Go! {}!", name),
            Side::Enemy => format!("{} sent out {}!", side.team_label(), name),
        };
        ctx.show_message(&text).await;
        ctx.play_animation(Animation::Summon(incoming)).await;
        ctx.events.push(BattleEvent::SwitchedIn {
            combatant: incoming,
            side,
        });
        if self.post_summon {
            ctx.phases
                .insert_next(Box::new(PostSummonPhase::new(incoming)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::scheduler::PhaseScheduler;
    use crate::battle::tests::common::{context_with, duel, messages, TestCombatantBuilder};
    use crate::combatant::BattlerTag;
    use crate::modifiers::ModifierOwner;
    use pretty_assertions::assert_eq;
    use schema::{BattleStat, ModifierKind, TagKind};

    #[tokio::test]
    async fn reviver_seed_brings_the_combatant_back_at_half_health() {
        let (mut field, a, _) = duel(
            TestCombatantBuilder::new("A", 50).with_hp(100).build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field.get_mut(a).expect("a").hp = 0;
        field
            .modifiers
            .add(ModifierKind::InstantRevive, ModifierOwner::Combatant(a), 1);
        let mut ctx = context_with(field, vec![]);
        ctx.phases.push(Box::new(FaintPhase::new(a)));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        let revived = ctx.field.get(a).expect("a");
        assert_eq!(revived.hp, 50);
        assert!(revived.is_active());
        assert_eq!(ctx.outcome, None);
        assert_eq!(ctx.field.modifiers.held(a, ModifierKind::InstantRevive), 0);
        assert_eq!(messages(&ctx), vec!["A was revived by its Reviver Seed!"]);
    }

    #[tokio::test]
    async fn last_enemy_fainting_ends_the_encounter_in_victory() {
        let (mut field, a, b) = duel(
            TestCombatantBuilder::new("A", 50).build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field.get_mut(b).expect("b").hp = 0;
        field
            .get_mut(b)
            .expect("b")
            .add_tag(BattlerTag::new(TagKind::Trapped).with_source(a, None));
        field
            .get_mut(a)
            .expect("a")
            .add_tag(BattlerTag::new(TagKind::Trapped).with_source(b, None));
        let mut ctx = context_with(field, vec![]);
        ctx.phases.push(Box::new(FaintPhase::new(b)));
        ctx.phases.push(Box::new(super::super::MessagePhase::new("never shown")));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(ctx.outcome, Some(EncounterOutcome::Victory));
        assert!(!ctx.field.get(a).expect("a").has_tag(TagKind::Trapped));
        assert!(!messages(&ctx).iter().any(|m| m == "never shown"));
        assert_eq!(messages(&ctx)[0], "B fainted!");
    }

    #[tokio::test]
    async fn fainted_slots_are_refilled_from_reserves() {
        let (mut field, _, b) = duel(
            TestCombatantBuilder::new("A", 50).build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        let reserve = field.add_combatant(Side::Enemy, TestCombatantBuilder::new("C", 50).build());
        field.get_mut(b).expect("b").hp = 0;
        let mut ctx = context_with(field, vec![]);
        ctx.phases.push(Box::new(FaintPhase::new(b)));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(ctx.field.at(BattlerIndex::ENEMY), Some(reserve));
        assert_eq!(ctx.outcome, None);
        assert!(messages(&ctx).contains(&"The opposing team sent out C!".to_string()));
    }

    #[tokio::test]
    async fn baton_pass_hands_over_stat_stages() {
        let (mut field, a, _) = duel(
            TestCombatantBuilder::new("A", 50).build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        let reserve = field.add_combatant(Side::Player, TestCombatantBuilder::new("C", 50).build());
        field.get_mut(a).expect("a").stages.change(BattleStat::Attack, 2);
        let mut ctx = context_with(field, vec![]);
        ctx.phases
            .push(Box::new(SwitchSummonPhase::new(BattlerIndex::PLAYER, 1, true)));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        let incoming = ctx.field.get(reserve).expect("c");
        assert!(incoming.is_active());
        assert_eq!(incoming.stages.get(BattleStat::Attack), 2);
        assert!(!ctx.field.get(a).expect("a").on_field);
        assert_eq!(messages(&ctx), vec!["Come back, A!", "Go! C!"]);
    }
}
