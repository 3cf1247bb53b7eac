// In: src/battle/encounter.rs

//! Drives an encounter turn by turn until it has an outcome.

use crate::battle::phases::{BattleEndPhase, PostSummonPhase, SwitchSummonPhase, TurnInitPhase};
use crate::battle::scheduler::PhaseScheduler;
use crate::battle::state::{BattleContext, BattleEvent, EncounterOutcome};
use crate::collaborators::SaveBoundary;
use crate::combatant::Side;
use crate::errors::BattleResult;
use crate::field::BattlerIndex;

/// Owns the battle context for the lifetime of one encounter.
#[derive(Debug)]
pub struct Encounter {
    ctx: BattleContext,
}

impl Encounter {
    pub fn new(ctx: BattleContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &BattleContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut BattleContext {
        &mut self.ctx
    }

    pub fn into_context(self) -> BattleContext {
        self.ctx
    }

    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.ctx.outcome
    }

    /// Sends the leading roster members into every empty slot, then runs
    /// their post-summon passes once both sides are out.
    pub async fn start(&mut self) -> BattleResult<()> {
        let per_side = self.ctx.field.slots_per_side();
        for side in [Side::Player, Side::Enemy] {
            let roster_len = self.ctx.field.roster(side).len();
            for slot in 0..per_side.min(roster_len) {
                let index = BattlerIndex::new(side, slot);
                if self.ctx.field.at(index).is_none() {
                    self.ctx
                        .phases
                        .push(Box::new(SwitchSummonPhase::lead(index, slot)));
                }
            }
        }
        PhaseScheduler::run(&mut self.ctx).await?;
        for id in self.ctx.field.active_ids() {
            self.ctx.phases.push(Box::new(PostSummonPhase::new(id)));
        }
        PhaseScheduler::run(&mut self.ctx).await?;
        tracing::info!(kind = ?self.ctx.field.kind, double = self.ctx.field.double, "encounter started");
        Ok(())
    }

    /// Resolves one full turn. Returns the outcome once there is one.
    pub async fn run_turn(&mut self) -> BattleResult<Option<EncounterOutcome>> {
        if self.ctx.outcome.is_some() {
            return Ok(self.ctx.outcome);
        }
        if self.ctx.field.turn >= self.ctx.config.max_turns {
            self.ctx
                .phases
                .push(Box::new(BattleEndPhase::new(EncounterOutcome::TurnLimit)));
            PhaseScheduler::run(&mut self.ctx).await?;
            return Ok(self.ctx.outcome);
        }

        self.ctx.field.turn += 1;
        let turn = self.ctx.field.turn;
        self.ctx.rng.rekey(turn);
        self.ctx.events.push(BattleEvent::TurnStarted { turn });
        tracing::info!(turn, "turn started");

        self.ctx.phases.push(Box::new(TurnInitPhase));
        let phases = PhaseScheduler::run(&mut self.ctx).await?;
        tracing::debug!(turn, phases, "turn resolved");

        if self.ctx.outcome.is_none() {
            self.save_turn().await;
        }
        Ok(self.ctx.outcome)
    }

    /// Turn-boundary save. A failure is reported and play goes on.
    async fn save_turn(&mut self) {
        let snapshot = self.ctx.snapshot();
        if let Err(err) = self
            .ctx
            .persistence
            .save(&snapshot, SaveBoundary::TurnEnd)
            .await
        {
            tracing::warn!(error = %err, turn = self.ctx.field.turn, "turn-end save failed");
            self.ctx.events.push(BattleEvent::SaveFailed {
                reason: err.to_string(),
            });
            self.ctx
                .show_message("Could not save progress. Continuing without saving.")
                .await;
        }
    }

    /// Runs turns until the encounter ends.
    pub async fn run(&mut self) -> BattleResult<EncounterOutcome> {
        self.start().await?;
        loop {
            if let Some(outcome) = self.run_turn().await? {
                return Ok(outcome);
            }
        }
    }
}
