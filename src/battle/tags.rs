// In: src/battle/tags.rs

//! Lapsing of volatile battler tags.
//!
//! Each tag lists the triggers it reacts to. A combatant lapses its tags at
//! most once per trigger per turn, so follow-up strikes of a multi-hit move
//! or a repeated phase never count a tag down twice.

use crate::battle::phases::{apply_damage, queue_faint_check};
use crate::battle::state::{BattleContext, BattleEvent};
use crate::battle::stats::{effective_attack, effective_defense};
use crate::collaborators::{Animation, CommonAnim};
use crate::combatant::{Combatant, CombatantId};
use crate::errors::BattleResult;
use schema::{LapseTrigger, MoveCategory, TagKind};

const CONFUSION_POWER: f64 = 40.0;

/// What a single lapse did to its tag.
enum Lapse {
    Keep,
    Remove,
    /// Remove, and stop the move that triggered the lapse.
    Cancel,
    /// Keep the tag but stop the move.
    Stop,
}

/// Lapses every tag of `id` that listens to `trigger`. Returns the tag that
/// stopped the combatant from moving, if any.
pub async fn lapse_tags(
    ctx: &mut BattleContext,
    id: CombatantId,
    trigger: LapseTrigger,
) -> BattleResult<Option<TagKind>> {
    let combatant = ctx.field.get_mut(id)?;
    if combatant.turn_data.lapsed.contains(&trigger) {
        return Ok(None);
    }
    combatant.turn_data.lapsed.push(trigger);

    let kinds: Vec<TagKind> = combatant
        .tags
        .iter()
        .filter(|t| t.triggers.contains(&trigger))
        .map(|t| t.kind)
        .collect();

    let mut stopped_by = None;
    for kind in kinds {
        let lapse = match kind {
            TagKind::Flinched => flinch(ctx, id, trigger).await,
            TagKind::Confused => confusion(ctx, id).await?,
            TagKind::Recharging => {
                let name = ctx.name_of(id);
                ctx.show_message(&format!("{} must recharge!", name)).await;
                Lapse::Cancel
            }
            TagKind::Trapped => {
                let source = ctx.field.get(id)?.tag(kind).and_then(|t| t.source);
                let holder_present = source
                    .and_then(|s| ctx.field.get(s).ok())
                    .is_some_and(Combatant::is_active);
                if holder_present {
                    Lapse::Keep
                } else {
                    Lapse::Remove
                }
            }
            _ => count_down(ctx.field.get_mut(id)?, kind),
        };

        if matches!(lapse, Lapse::Remove | Lapse::Cancel) && ctx.field.get_mut(id)?.remove_tag(kind) {
            ctx.events.push(BattleEvent::TagRemoved { combatant: id, tag: kind });
        }
        if matches!(lapse, Lapse::Cancel | Lapse::Stop) {
            tracing::debug!(combatant = ?id, ?trigger, tag = ?kind, "tag stopped the move");
            stopped_by = Some(kind);
            break;
        }
    }
    Ok(stopped_by)
}

fn count_down(combatant: &mut Combatant, kind: TagKind) -> Lapse {
    let Some(tag) = combatant.tags.iter_mut().find(|t| t.kind == kind) else {
        return Lapse::Keep;
    };
    tag.turns_left = tag.turns_left.saturating_sub(1);
    if tag.turns_left == 0 {
        Lapse::Remove
    } else {
        Lapse::Keep
    }
}

async fn flinch(ctx: &mut BattleContext, id: CombatantId, trigger: LapseTrigger) -> Lapse {
    if trigger != LapseTrigger::Move {
        return Lapse::Remove;
    }
    let name = ctx.name_of(id);
    ctx.show_message(&format!("{} flinched!", name)).await;
    Lapse::Cancel
}

async fn confusion(ctx: &mut BattleContext, id: CombatantId) -> BattleResult<Lapse> {
    let name = ctx.name_of(id);
    if let Lapse::Remove = count_down(ctx.field.get_mut(id)?, TagKind::Confused) {
        ctx.show_message(&format!("{} snapped out of confusion!", name)).await;
        return Ok(Lapse::Remove);
    }

    ctx.show_message(&format!("{} is confused!", name)).await;
    ctx.play_animation(Animation::Common {
        anim: CommonAnim::Confusion,
        target: id,
    })
    .await;

    if ctx.rng.rand_int(3, 0, "confusion self-hit") != 0 {
        return Ok(Lapse::Keep);
    }

    ctx.show_message("It hurt itself in its confusion!").await;
    let damage = confusion_damage(ctx.field.get(id)?);
    apply_damage(&mut ctx.field, &mut ctx.phases, &mut ctx.events, id, damage, None)?;
    queue_faint_check(&ctx.field, &mut ctx.phases, id)?;
    Ok(Lapse::Stop)
}

/// Typeless physical strike against the confused combatant itself.
fn confusion_damage(combatant: &Combatant) -> u16 {
    let attack = effective_attack(combatant, MoveCategory::Physical).max(1) as f64;
    let defense = effective_defense(combatant, MoveCategory::Physical).max(1) as f64;
    let level = f64::from(combatant.level);
    let damage = ((2.0 * level / 5.0 + 2.0) * CONFUSION_POWER * attack / defense) / 50.0 + 2.0;
    (damage.floor() as u32).clamp(1, u32::from(u16::MAX)) as u16
}
