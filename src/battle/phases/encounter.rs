// In: src/battle/phases/encounter.rs

use crate::battle::calculators::{capture_threshold, escape_chance};
use crate::battle::commands::BallTier;
use crate::battle::scheduler::Phase;
use crate::battle::state::{BattleContext, BattleEvent, EncounterOutcome};
use crate::battle::stats::effective_speed;
use crate::collaborators::{Animation, SaveBoundary};
use crate::combatant::CombatantId;
use crate::errors::BattleResult;
use async_trait::async_trait;

const SHAKE_CHECKS: u8 = 3;

// --- RUNNING ---

#[derive(Debug)]
pub struct AttemptRunPhase {
    user: CombatantId,
}

impl AttemptRunPhase {
    pub fn new(user: CombatantId) -> Self {
        Self { user }
    }
}

#[async_trait]
impl Phase for AttemptRunPhase {
    fn name(&self) -> &'static str {
        "AttemptRunPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let user = ctx.field.get(self.user)?;
        if !user.is_active() {
            return Ok(());
        }
        let user_speed = effective_speed(user);
        let opponents = ctx.field.opponents_of(self.user);
        let mut total = 0;
        for id in &opponents {
            total += effective_speed(ctx.field.get(*id)?);
        }
        let enemy_speed = total / (opponents.len() as u32).max(1);

        let chance = escape_chance(user_speed, enemy_speed, ctx.field.escape_attempts);
        ctx.field.escape_attempts += 1;
        let success = ctx.rng.rand_int(256, 0, "escape") < chance;
        ctx.events.push(BattleEvent::EscapeAttempted { success });
        tracing::debug!(chance, success, "escape attempt");

        if success {
            ctx.show_message("You got away safely!").await;
            ctx.phases.clear();
            ctx.phases
                .push(Box::new(BattleEndPhase::new(EncounterOutcome::Fled)));
        } else {
            ctx.show_message("You can't escape!").await;
        }
        Ok(())
    }
}

// --- CAPTURE ---

#[derive(Debug)]
pub struct AttemptCapturePhase {
    target: CombatantId,
    tier: BallTier,
}

impl AttemptCapturePhase {
    pub fn new(target: CombatantId, tier: BallTier) -> Self {
        Self { target, tier }
    }
}

#[async_trait]
impl Phase for AttemptCapturePhase {
    fn name(&self) -> &'static str {
        "AttemptCapturePhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let target = ctx.field.get(self.target)?;
        if !target.is_active() {
            return Ok(());
        }
        let name = target.name.clone();
        let threshold = capture_threshold(target, self.tier.multiplier());

        ctx.show_message(&format!("You threw a {}!", self.tier.name()))
            .await;

        let shakes = match threshold {
            None => SHAKE_CHECKS,
            Some(y) => {
                let mut shakes = 0;
                while shakes < SHAKE_CHECKS && ctx.rng.rand_int(65536, 0, "shake check") < y {
                    shakes += 1;
                }
                shakes
            }
        };
        let success = shakes == SHAKE_CHECKS;

        ctx.play_animation(Animation::Capture { shakes }).await;
        ctx.events.push(BattleEvent::CaptureAttempted {
            target: self.target,
            shakes,
            success,
        });

        if success {
            ctx.show_message(&format!("Gotcha! {} was caught!", name))
                .await;
            ctx.field.withdraw(self.target)?;
            ctx.phases.clear();
            ctx.phases.push(Box::new(BattleEndPhase::new(
                EncounterOutcome::Captured(self.target),
            )));
        } else {
            ctx.show_message(&format!("Oh no! {} broke free!", name))
                .await;
        }
        Ok(())
    }
}

// --- ENDING ---

/// Records the outcome and makes the end-of-encounter save, retrying as
/// long as the player agrees and the retry budget allows.
#[derive(Debug)]
pub struct BattleEndPhase {
    outcome: EncounterOutcome,
}

impl BattleEndPhase {
    pub fn new(outcome: EncounterOutcome) -> Self {
        Self { outcome }
    }

    fn text(&self) -> Option<&'static str> {
        match self.outcome {
            EncounterOutcome::Victory => Some("You won the battle!"),
            EncounterOutcome::Defeat => Some("You have no more fighters left!"),
            EncounterOutcome::TurnLimit => Some("The battle dragged on and was called off."),
            EncounterOutcome::Fled | EncounterOutcome::Captured(_) => None,
        }
    }
}

#[async_trait]
impl Phase for BattleEndPhase {
    fn name(&self) -> &'static str {
        "BattleEndPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        ctx.outcome = Some(self.outcome);
        ctx.events.push(BattleEvent::EncounterEnded {
            outcome: self.outcome,
        });
        if let Some(text) = self.text() {
            ctx.show_message(text).await;
        }
        tracing::info!(outcome = ?self.outcome, turn = ctx.field.turn, "encounter ended");

        let mut attempts = 0;
        loop {
            attempts += 1;
            let snapshot = ctx.snapshot();
            match ctx.persistence.save(&snapshot, SaveBoundary::EncounterEnd).await {
                Ok(()) => break,
                Err(err) => {
                    tracing::warn!(error = %err, attempts, "end-of-encounter save failed");
                    ctx.events.push(BattleEvent::SaveFailed {
                        reason: err.to_string(),
                    });
                    let retry = attempts < ctx.config.save_retry_limit
                        && ctx
                            .presentation
                            .confirm("Could not save your progress. Try again?")
                            .await;
                    if !retry {
                        ctx.show_message("Continuing without saving.").await;
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
