// In: src/battle/move_effects/mod.rs

//! Effect attributes and the staged pipeline that applies them.
//!
//! Moves, abilities and held items all carry ordered lists of
//! [`EffectAttribute`]s, each bound to one [`TriggerStage`]. The phases call
//! [`apply_stage`] once per stage; the attributes mutate the field directly or
//! enqueue follow-up phases, and never run phases themselves.
//!
//! Ability and item attributes are gathered per holder and applied through
//! [`apply_held_stage`].

// --- 1. DECLARE HELPER MODULES ---
mod damage_effects;
mod held_effects;
mod special_effects;
mod stat_effects;
mod status_effects;

// --- 2. IMPORTS ---
use crate::battle::scheduler::PhaseQueue;
use crate::battle::state::{BattleContext, EventBus};
use crate::combatant::{CombatantId, HitResult, MoveResult};
use crate::content::ContentTable;
use crate::errors::{BattleError, BattleResult};
use crate::field::Field;
use crate::rng::RandomSequence;
use schema::{EffectKind, EffectSpec, HookKind, ModifierKind, MoveData};
use std::fmt;
use std::sync::Arc;

pub use self::damage_effects::{CrashDamageEffect, DamageEffect, DrainEffect, RecoilEffect};
pub use self::held_effects::{
    BerryEffect, ContactDamageEffect, ContactStatusEffect, ExtraCostEffect, FlinchOnHitEffect,
    HealFromDamageEffect, ReviveEffect, StatGuardEffect, SummonStatChangeEffect,
    SummonWeatherEffect, TurnHealEffect, WeatherImmunityEffect,
};
pub use self::special_effects::{ChargeEffect, HealEffect, RechargeEffect};
pub use self::stat_effects::{start_weather, ArenaTagEffect, StatChangeEffect};
pub use self::status_effects::{AddTagEffect, DisableEffect, FlinchEffect, StatusInflictEffect};
pub use schema::TriggerStage;

// --- 3. PIPELINE TYPES ---

/// Shared accumulator threaded through every attribute of one strike.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectResult {
    /// Set during `PreApply` to replace the rest of the move.
    pub overridden: bool,
    /// Stops the remaining attributes of the current stage.
    pub cancelled: bool,
    pub hit_result: HitResult,
    pub effectiveness: f32,
    pub damage_dealt: u16,
    /// Overrides the classification recorded for the move.
    pub move_result: Option<MoveResult>,
    /// Uses added on top of the base cost of one.
    pub extra_cost: u8,
    /// Name of whatever blocked a stat drop.
    pub blocked_by: Option<String>,
}

impl Default for EffectResult {
    fn default() -> Self {
        Self {
            overridden: false,
            cancelled: false,
            hit_result: HitResult::Effective,
            effectiveness: 1.0,
            damage_dealt: 0,
            move_result: None,
            extra_cost: 0,
            blocked_by: None,
        }
    }
}

/// What an attribute sees when it runs.
pub struct EffectContext<'a> {
    pub user: CombatantId,
    pub target: CombatantId,
    /// The move being resolved. Held stages outside a move have none.
    pub move_data: Option<&'a MoveData>,
    pub content: &'a ContentTable,
    pub field: &'a mut Field,
    pub rng: &'a mut RandomSequence,
    pub phases: &'a mut PhaseQueue,
    pub events: &'a mut EventBus,
    pub result: &'a mut EffectResult,
}

impl<'a> EffectContext<'a> {
    pub fn move_data(&self, effect: &'static str) -> BattleResult<&'a MoveData> {
        self.move_data.ok_or(BattleError::NoMoveInFlight(effect))
    }

    pub fn name_of(&self, id: CombatantId) -> String {
        self.field
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }
}

/// A single effect capability. Implementations hold their own parameters.
pub trait MoveEffect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()>;

    /// Charge effects take over the self-targeted stage of their move.
    fn is_charge(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub struct EffectAttribute {
    pub stage: TriggerStage,
    pub order: i8,
    pub effect: Arc<dyn MoveEffect>,
}

impl EffectAttribute {
    pub fn new(stage: TriggerStage, order: i8, effect: impl MoveEffect + 'static) -> Self {
        Self {
            stage,
            order,
            effect: Arc::new(effect),
        }
    }
}

/// Runs every attribute of `stage` in declared order. An attribute that sets
/// `cancelled` ends this stage early; later stages are unaffected.
pub fn apply_stage(
    attributes: &[EffectAttribute],
    stage: TriggerStage,
    ctx: &mut EffectContext<'_>,
) -> BattleResult<()> {
    ctx.result.cancelled = false;
    let mut staged: Vec<&EffectAttribute> =
        attributes.iter().filter(|a| a.stage == stage).collect();
    staged.sort_by_key(|a| a.order);

    for attribute in staged {
        if ctx.result.cancelled {
            tracing::trace!(?stage, "stage short-circuited");
            break;
        }
        tracing::trace!(?stage, effect = attribute.effect.name(), "apply effect");
        attribute.effect.apply(ctx)?;
    }
    Ok(())
}

pub fn has_charge_effect(attributes: &[EffectAttribute]) -> bool {
    attributes.iter().any(|a| a.effect.is_charge())
}

/// Runs the ability and held-item attributes of `holder` bound to `stage`.
/// `other` becomes the effect target; pass the holder itself when nobody else
/// is involved.
pub fn apply_held_stage(
    ctx: &mut BattleContext,
    stage: TriggerStage,
    holder: CombatantId,
    other: CombatantId,
    move_data: Option<&MoveData>,
    result: &mut EffectResult,
) -> BattleResult<()> {
    let content = Arc::clone(&ctx.content);
    let attributes = content.held_attributes(&ctx.field, holder)?;
    if !attributes.iter().any(|a| a.stage == stage) {
        return Ok(());
    }
    tracing::trace!(?holder, ?stage, "held stage");
    let mut effect_ctx = EffectContext {
        user: holder,
        target: other,
        move_data,
        content: &content,
        field: &mut ctx.field,
        rng: &mut ctx.rng,
        phases: &mut ctx.phases,
        events: &mut ctx.events,
        result,
    };
    apply_stage(&attributes, stage, &mut effect_ctx)
}

// --- 4. REGISTRY ---

/// Builds the executable attribute for a declarative effect description.
pub fn compile_effect(spec: &EffectSpec) -> EffectAttribute {
    let effect: Arc<dyn MoveEffect> = match &spec.kind {
        EffectKind::Damage => Arc::new(DamageEffect),
        EffectKind::StatChange {
            stats,
            levels,
            self_target,
            chance,
        } => Arc::new(StatChangeEffect {
            stats: stats.clone(),
            levels: *levels,
            self_target: *self_target,
            chance: *chance,
        }),
        EffectKind::Status { status, chance } => Arc::new(StatusInflictEffect {
            status: *status,
            chance: *chance,
        }),
        EffectKind::Flinch { chance } => Arc::new(FlinchEffect { chance: *chance }),
        EffectKind::AddTag {
            tag,
            self_target,
            chance,
        } => Arc::new(AddTagEffect {
            tag: *tag,
            self_target: *self_target,
            chance: *chance,
        }),
        EffectKind::Recharge => Arc::new(RechargeEffect),
        EffectKind::Charge { hide, text } => Arc::new(ChargeEffect {
            hide: *hide,
            text: text.clone(),
        }),
        EffectKind::Recoil { divisor } => Arc::new(RecoilEffect { divisor: *divisor }),
        EffectKind::Drain { divisor } => Arc::new(DrainEffect { divisor: *divisor }),
        EffectKind::Heal { divisor } => Arc::new(HealEffect { divisor: *divisor }),
        EffectKind::ArenaTag { kind, turns } => Arc::new(ArenaTagEffect {
            kind: *kind,
            turns: *turns,
        }),
        EffectKind::CrashDamage { divisor } => Arc::new(CrashDamageEffect { divisor: *divisor }),
        EffectKind::Disable { turns } => Arc::new(DisableEffect { turns: *turns }),
    };
    EffectAttribute {
        stage: spec.stage,
        order: spec.order,
        effect,
    }
}

/// Where a held attribute comes from. Items scale with their stack count.
#[derive(Debug, Clone, PartialEq)]
pub enum HookSource {
    Ability(String),
    Item(ModifierKind),
}

impl HookSource {
    pub fn label(&self) -> String {
        match self {
            HookSource::Ability(name) => name.clone(),
            HookSource::Item(kind) => kind.to_string(),
        }
    }

    pub fn stacks(&self, field: &Field, holder: CombatantId) -> u8 {
        match self {
            HookSource::Ability(_) => 1,
            HookSource::Item(kind) => field.modifiers.held(holder, *kind),
        }
    }
}

/// Builds the executable attribute for an ability or item hook. Passive
/// hooks compile to nothing.
pub fn compile_hook(hook: &HookKind, source: &HookSource) -> Option<EffectAttribute> {
    let stage = hook.stage()?;
    let effect: Arc<dyn MoveEffect> = match hook {
        HookKind::ExtraMoveCost => Arc::new(ExtraCostEffect),
        HookKind::ContactStatus { status, chance } => Arc::new(ContactStatusEffect {
            status: *status,
            chance: *chance,
        }),
        HookKind::ContactDamage { divisor } => Arc::new(ContactDamageEffect {
            divisor: *divisor,
            source: source.clone(),
        }),
        HookKind::FlinchOnHit { chance } => Arc::new(FlinchOnHitEffect {
            chance: *chance,
            source: source.clone(),
        }),
        HookKind::HealFromDamage { divisor } => Arc::new(HealFromDamageEffect {
            divisor: *divisor,
            source: source.clone(),
        }),
        HookKind::TurnHeal { divisor } => Arc::new(TurnHealEffect {
            divisor: *divisor,
            source: source.clone(),
        }),
        HookKind::PostTurnStatBoost { stat, levels } => Arc::new(StatChangeEffect {
            stats: vec![*stat],
            levels: *levels,
            self_target: true,
            chance: 100,
        }),
        HookKind::ProtectStats => Arc::new(StatGuardEffect {
            source: source.clone(),
        }),
        HookKind::InstantRevive => Arc::new(ReviveEffect {
            source: source.clone(),
        }),
        HookKind::Berry(berry) => Arc::new(BerryEffect { berry: *berry }),
        HookKind::SummonWeather { weather, turns } => Arc::new(SummonWeatherEffect {
            weather: *weather,
            turns: *turns,
        }),
        HookKind::SummonStatChange { stat, levels } => Arc::new(SummonStatChangeEffect {
            stat: *stat,
            levels: *levels,
        }),
        HookKind::WeatherImmunity => Arc::new(WeatherImmunityEffect),
        HookKind::IgnoreOpponentStages => return None,
    };
    Some(EffectAttribute {
        stage,
        order: 0,
        effect,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Combatant, Side};
    use crate::config::EncounterKind;
    use pretty_assertions::assert_eq;
    use schema::{BaseStats, ElementType, MoveCategory, MoveFlags, MoveId, MoveTarget};
    use std::sync::Mutex;

    /// Records its label into a shared log when applied.
    #[derive(Debug)]
    struct Recorder {
        label: &'static str,
        cancel: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl MoveEffect for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
            self.log.lock().expect("log lock").push(self.label);
            if self.cancel {
                ctx.result.cancelled = true;
            }
            Ok(())
        }
    }

    fn recorded(
        stage: TriggerStage,
        order: i8,
        label: &'static str,
        cancel: bool,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> EffectAttribute {
        EffectAttribute::new(
            stage,
            order,
            Recorder {
                label,
                cancel,
                log: Arc::clone(log),
            },
        )
    }

    fn run_stages(attributes: &[EffectAttribute], stages: &[TriggerStage]) {
        let mut field = Field::new(EncounterKind::Wild, false);
        let stats = BaseStats {
            hp: 10,
            ..BaseStats::default()
        };
        let user = field.add_combatant(
            Side::Player,
            Combatant::new("A", 5, vec![ElementType::Normal], stats),
        );
        let target = field.add_combatant(
            Side::Enemy,
            Combatant::new("B", 5, vec![ElementType::Normal], stats),
        );
        let move_data = MoveData {
            id: MoveId(1),
            name: "Splash".to_string(),
            element: ElementType::Normal,
            category: MoveCategory::Status,
            power: 0,
            accuracy: None,
            pp: 5,
            priority: 0,
            target: MoveTarget::NearOther,
            flags: MoveFlags::default(),
            multi_hit: None,
            effects: Vec::new(),
        };
        let content = ContentTable::default();
        let mut rng = RandomSequence::new(1);
        let mut phases = PhaseQueue::default();
        let mut events = EventBus::new();
        let mut result = EffectResult::default();
        let mut ctx = EffectContext {
            user,
            target,
            move_data: Some(&move_data),
            content: &content,
            field: &mut field,
            rng: &mut rng,
            phases: &mut phases,
            events: &mut events,
            result: &mut result,
        };
        for stage in stages {
            apply_stage(attributes, *stage, &mut ctx).expect("stage applies");
        }
    }

    #[test]
    fn attributes_run_in_declared_order_within_a_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let attributes = vec![
            recorded(TriggerStage::Hit, 2, "late", false, &log),
            recorded(TriggerStage::Hit, -1, "early", false, &log),
            recorded(TriggerStage::PostApplySelf, 0, "other stage", false, &log),
            recorded(TriggerStage::Hit, 0, "middle", false, &log),
        ];
        run_stages(&attributes, &[TriggerStage::Hit]);
        assert_eq!(*log.lock().expect("log"), vec!["early", "middle", "late"]);
    }

    #[test]
    fn cancellation_stops_only_the_current_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let attributes = vec![
            recorded(TriggerStage::PostApplyTarget, 0, "blocker", true, &log),
            recorded(TriggerStage::PostApplyTarget, 1, "skipped", false, &log),
            recorded(TriggerStage::Hit, 0, "next stage", false, &log),
        ];
        run_stages(
            &attributes,
            &[TriggerStage::PostApplyTarget, TriggerStage::Hit],
        );
        assert_eq!(*log.lock().expect("log"), vec!["blocker", "next stage"]);
    }
}
