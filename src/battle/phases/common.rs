// In: src/battle/phases/common.rs

use super::StatChangePhase;
use crate::battle::scheduler::{Phase, PhaseQueue};
use crate::battle::state::{BattleContext, BattleEvent, EventBus};
use crate::collaborators::{Animation, CommonAnim};
use crate::combatant::{AttackRecord, BattlerTag, CombatantId, HitResult};
use crate::errors::BattleResult;
use crate::field::Field;
use crate::modifiers::{berry_applies, ModifierOwner};
use async_trait::async_trait;
use schema::{BattleStat, BerryKind, ModifierKind, MoveId, TagKind};

/// Page separator inside a message.
const PAGE_BREAK: char = '$';

// --- MESSAGES AND ANIMATIONS ---

/// Shows one page of text. Further pages are shown by a new message phase
/// scheduled right behind this one.
#[derive(Debug)]
pub struct MessagePhase {
    text: String,
}

impl MessagePhase {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Phase for MessagePhase {
    fn name(&self) -> &'static str {
        "MessagePhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        match self.text.split_once(PAGE_BREAK) {
            Some((page, rest)) => {
                ctx.show_message(page).await;
                if !rest.is_empty() {
                    ctx.phases.insert_next(Box::new(MessagePhase::new(rest)));
                }
            }
            None => ctx.show_message(&self.text).await,
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct CommonAnimPhase {
    anim: CommonAnim,
    target: CombatantId,
}

impl CommonAnimPhase {
    pub fn new(anim: CommonAnim, target: CombatantId) -> Self {
        Self { anim, target }
    }
}

#[async_trait]
impl Phase for CommonAnimPhase {
    fn name(&self) -> &'static str {
        "CommonAnimPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        ctx.play_animation(Animation::Common {
            anim: self.anim,
            target: self.target,
        })
        .await;
        Ok(())
    }
}

// --- DAMAGE ---

/// Who caused a hit, recorded on the defender.
#[derive(Debug, Clone, Copy)]
pub struct DamageSource {
    pub combatant: CombatantId,
    pub move_id: MoveId,
    pub result: HitResult,
}

/// Plays the hit flash and HP drain of damage already applied to the field.
#[derive(Debug)]
pub struct DamagePhase {
    target: CombatantId,
    amount: u16,
}

#[async_trait]
impl Phase for DamagePhase {
    fn name(&self) -> &'static str {
        "DamagePhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        ctx.play_animation(Animation::Damage {
            target: self.target,
            amount: self.amount,
        })
        .await;
        Ok(())
    }
}

/// Subtracts HP right away and schedules the visual feedback. Returns the
/// HP actually lost.
pub fn apply_damage(
    field: &mut Field,
    phases: &mut PhaseQueue,
    events: &mut EventBus,
    target: CombatantId,
    amount: u16,
    source: Option<DamageSource>,
) -> BattleResult<u16> {
    let combatant = field.get_mut(target)?;
    let dealt = combatant.take_damage(amount);
    if let Some(source) = source {
        combatant.turn_data.attacks_received.push(AttackRecord {
            move_id: source.move_id,
            source: source.combatant,
            result: source.result,
            damage: dealt,
        });
    }
    events.push(BattleEvent::DamageDealt {
        target,
        amount: dealt,
        remaining_hp: combatant.hp,
    });
    phases.insert_next(Box::new(DamagePhase {
        target,
        amount: dealt,
    }));
    Ok(dealt)
}

/// Schedules a faint check for a combatant left at zero HP.
pub fn queue_faint_check(field: &Field, phases: &mut PhaseQueue, target: CombatantId) -> BattleResult<()> {
    if field.get(target)?.is_fainted() {
        phases.insert_next(Box::new(super::FaintPhase::new(target)));
    }
    Ok(())
}

// --- HEALING ---

#[derive(Debug)]
pub struct PokemonHealPhase {
    target: CombatantId,
    amount: u16,
    message: Option<String>,
    /// Say so when the target is already at full HP.
    show_full: bool,
}

impl PokemonHealPhase {
    pub fn new(target: CombatantId, amount: u16, message: Option<String>, show_full: bool) -> Self {
        Self {
            target,
            amount,
            message,
            show_full,
        }
    }
}

#[async_trait]
impl Phase for PokemonHealPhase {
    fn name(&self) -> &'static str {
        "PokemonHealPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let target = ctx.field.get(self.target)?;
        if !target.is_active() {
            return Ok(());
        }
        if target.hp >= target.max_hp() {
            if self.show_full {
                let text = format!("{}'s HP is full!", target.name);
                ctx.show_message(&text).await;
            }
            return Ok(());
        }

        ctx.play_animation(Animation::Common {
            anim: CommonAnim::Heal,
            target: self.target,
        })
        .await;
        let combatant = ctx.field.get_mut(self.target)?;
        let healed = combatant.restore_hp(self.amount);
        let new_hp = combatant.hp;
        ctx.events.push(BattleEvent::Healed {
            target: self.target,
            amount: healed,
            new_hp,
        });
        if let Some(text) = self.message.take() {
            ctx.show_message(&text).await;
        }
        Ok(())
    }
}

// --- BERRIES ---

/// Eats one held berry if its condition is still met.
#[derive(Debug)]
pub struct BerryPhase {
    target: CombatantId,
    berry: BerryKind,
}

impl BerryPhase {
    pub fn new(target: CombatantId, berry: BerryKind) -> Self {
        Self { target, berry }
    }
}

#[async_trait]
impl Phase for BerryPhase {
    fn name(&self) -> &'static str {
        "BerryPhase"
    }

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
        let combatant = ctx.field.get(self.target)?;
        if !combatant.is_active() || !berry_applies(self.berry, combatant) {
            return Ok(());
        }
        let name = combatant.name.clone();
        let kind = ModifierKind::Berry(self.berry);
        if !ctx
            .field
            .modifiers
            .consume(kind, ModifierOwner::Combatant(self.target))
        {
            return Ok(());
        }
        ctx.events.push(BattleEvent::ModifierConsumed {
            combatant: self.target,
            kind,
        });
        ctx.show_message(&format!("{} ate its {}!", name, kind)).await;
        ctx.play_animation(Animation::Common {
            anim: CommonAnim::Berry,
            target: self.target,
        })
        .await;
        self.eat(ctx, self.berry)
    }
}

impl BerryPhase {
    fn eat(&self, ctx: &mut BattleContext, berry: BerryKind) -> BattleResult<()> {
        let combatant = ctx.field.get_mut(self.target)?;
        let name = combatant.name.clone();
        match berry {
            BerryKind::Sitrus => {
                let amount = (combatant.max_hp() / 4).max(1);
                ctx.phases.insert_next(Box::new(PokemonHealPhase::new(
                    self.target,
                    amount,
                    Some(format!("{} restored its health!", name)),
                    false,
                )));
            }
            BerryKind::Lum => {
                if let Some(status) = combatant.status.take() {
                    ctx.events.push(BattleEvent::StatusCured {
                        target: self.target,
                        status: status.effect,
                    });
                    ctx.phases
                        .queue_message(format!("{} {}", name, status.effect.heal_text()));
                }
                if combatant.remove_tag(TagKind::Confused) {
                    ctx.events.push(BattleEvent::TagRemoved {
                        combatant: self.target,
                        tag: TagKind::Confused,
                    });
                    ctx.phases
                        .queue_message(format!("{} snapped out of confusion!", name));
                }
            }
            BerryKind::Lansat => {
                if combatant.add_tag(BattlerTag::new(TagKind::CritBoost)) {
                    ctx.events.push(BattleEvent::TagAdded {
                        combatant: self.target,
                        tag: TagKind::CritBoost,
                    });
                    ctx.phases.queue_message(format!("{} is getting pumped!", name));
                }
            }
            BerryKind::Starf => {
                let raisable: Vec<BattleStat> = BattleStat::BOOSTABLE
                    .iter()
                    .copied()
                    .filter(|stat| combatant.stages.clamped_delta(*stat, 2) > 0)
                    .collect();
                if let Some(stat) = ctx.rng.pick(&raisable, "starf stat") {
                    ctx.phases.insert_next(Box::new(StatChangePhase::new(
                        self.target,
                        Some(self.target),
                        vec![stat],
                        2,
                    )));
                }
            }
            other => {
                if let Some(stat) = other.pinch_stat() {
                    ctx.phases.insert_next(Box::new(StatChangePhase::new(
                        self.target,
                        Some(self.target),
                        vec![stat],
                        1,
                    )));
                }
            }
        }
        Ok(())
    }
}
