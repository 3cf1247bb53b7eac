// In: src/battle/move_pipeline.rs

//! Building blocks of single-move resolution.
//!
//! A move runs PreCheck and TargetResolve inside `MovePhase`, HitCheck and
//! EffectApply inside one `MoveEffectPhase` per strike, and Cleanup inside
//! `MoveEndPhase`. The helpers here hold the rules those phases share.

use crate::battle::move_effects::{apply_held_stage, EffectResult, TriggerStage};
use crate::battle::state::BattleContext;
use crate::combatant::{Combatant, CombatantId, HitResult, StatusState};
use crate::errors::BattleResult;
use crate::field::{BattlerIndex, Field};
use crate::rng::RandomSequence;
use schema::{MoveCategory, MoveData, MoveTarget, StatusEffect};
use std::fmt;

/// Where a move is in its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    PreCheck,
    TargetResolve,
    HitCheck,
    EffectApply,
    Cleanup,
}

impl fmt::Display for MoveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// --- PRECHECK ---

/// Result of the non-volatile status roll made before a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCheck {
    Unaffected,
    Prevented(StatusEffect),
    /// The status ended; the move goes ahead.
    Cured(StatusEffect),
}

/// Advances the status counter and rolls whether it stops the move.
/// Post-turn statuses act during upkeep instead and are left alone.
pub fn check_status(status: &mut StatusState, rng: &mut RandomSequence) -> StatusCheck {
    if status.effect.is_post_turn() {
        return StatusCheck::Unaffected;
    }
    status.turn_count += 1;
    match status.effect {
        StatusEffect::Paralysis => {
            if rng.rand_int(4, 0, "full paralysis") == 0 {
                StatusCheck::Prevented(StatusEffect::Paralysis)
            } else {
                StatusCheck::Unaffected
            }
        }
        StatusEffect::Sleep => {
            if status.turn_count >= status.cure_turn {
                StatusCheck::Cured(StatusEffect::Sleep)
            } else {
                StatusCheck::Prevented(StatusEffect::Sleep)
            }
        }
        StatusEffect::Freeze => {
            if rng.rand_int(5, 0, "thaw") == 0 {
                StatusCheck::Cured(StatusEffect::Freeze)
            } else {
                StatusCheck::Prevented(StatusEffect::Freeze)
            }
        }
        _ => StatusCheck::Unaffected,
    }
}

// --- TARGET RESOLVE ---

/// Slots a move could address. Field-wide and side-wide moves address the
/// user's own slot so their effect applies once.
pub fn candidate_targets(field: &Field, user: CombatantId, target: MoveTarget) -> BattleResult<Vec<BattlerIndex>> {
    let combatant = field.get(user)?;
    let own = field.battler_index(user);
    let side = combatant.side;
    let indices = |ids: Vec<CombatantId>| -> Vec<BattlerIndex> {
        ids.into_iter()
            .filter_map(|id| field.battler_index(id))
            .collect()
    };

    Ok(match target {
        MoveTarget::User | MoveTarget::UserSide | MoveTarget::EnemySide | MoveTarget::BothSides => {
            own.into_iter().collect()
        }
        MoveTarget::NearEnemy | MoveTarget::AllNearEnemies => {
            indices(field.active_on_side(side.opponent()))
        }
        MoveTarget::NearOther | MoveTarget::AllNearOthers => indices(
            field
                .active_ids()
                .into_iter()
                .filter(|id| *id != user)
                .collect(),
        ),
        MoveTarget::NearAlly => indices(field.ally_of(user).into_iter().collect()),
    })
}

/// Single-target moves with more than one candidate ask the chooser.
pub fn needs_selection(target: MoveTarget, candidates: &[BattlerIndex]) -> bool {
    !target.is_spread() && target != MoveTarget::User && candidates.len() > 1
}

/// Targets used when nobody was asked: every candidate of a spread move,
/// otherwise the first opposing candidate.
pub fn default_targets(field: &Field, user: CombatantId, target: MoveTarget) -> BattleResult<Vec<BattlerIndex>> {
    let candidates = candidate_targets(field, user, target)?;
    if target.is_spread() || target == MoveTarget::User {
        return Ok(candidates);
    }
    let side = field.get(user)?.side;
    let preferred = candidates
        .iter()
        .copied()
        .find(|index| index.side() != side)
        .or_else(|| candidates.first().copied());
    Ok(preferred.into_iter().collect())
}

/// Turns declared slots into the combatants the move will act on.
///
/// A single-target move whose declared target has left the field is
/// redirected to the next candidate. Targets hidden behind a semi-invulnerable
/// tag are dropped unless the move reaches through it.
pub fn resolve_targets(
    field: &Field,
    user: CombatantId,
    move_data: &MoveData,
    declared: &[BattlerIndex],
) -> BattleResult<Vec<CombatantId>> {
    let mut targets: Vec<CombatantId> = declared
        .iter()
        .filter_map(|index| field.active_at(*index).map(|c| c.id))
        .collect();

    let single = !move_data.target.is_spread() && move_data.target != MoveTarget::User;
    if targets.is_empty() && single && !declared.is_empty() {
        let redirected = default_targets(field, user, move_data.target)?;
        targets = redirected
            .iter()
            .filter_map(|index| field.active_at(*index).map(|c| c.id))
            .collect();
    }

    targets.retain(|id| *id == user || reachable(field, *id, move_data));
    Ok(targets)
}

/// Active and not hidden from this move.
pub fn reachable(field: &Field, id: CombatantId, move_data: &MoveData) -> bool {
    field.get(id).is_ok_and(|c| {
        c.is_active()
            && c
                .hiding_tag()
                .map_or(true, |hidden| move_data.hits_through(hidden))
    })
}

// --- EFFECT APPLY ---

/// Type multiplier and the hit result it implies. Status moves always land
/// as `Other`.
pub fn effectiveness(move_data: &MoveData, target: &Combatant) -> (f32, HitResult) {
    if move_data.category == MoveCategory::Status {
        return (1.0, HitResult::Other);
    }
    let multiplier = move_data.element.effectiveness(&target.types);
    (multiplier, HitResult::from_multiplier(multiplier))
}

// --- CLEANUP ---

/// Uses spent by one activation: one, plus whatever each active opponent
/// adds at the `MoveCost` stage, whoever the move targets. Spending never
/// goes past the slot's remaining uses.
pub fn move_cost(ctx: &mut BattleContext, user: CombatantId, move_data: &MoveData) -> BattleResult<u8> {
    let mut result = EffectResult::default();
    for opponent in ctx.field.opponents_of(user) {
        apply_held_stage(
            ctx,
            TriggerStage::MoveCost,
            opponent,
            user,
            Some(move_data),
            &mut result,
        )?;
    }
    Ok(1u8.saturating_add(result.extra_cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{builtin_content, context_with, double_field, duel_field};
    use crate::combatant::BattlerTag;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{MoveId, TagKind};

    #[rstest]
    #[case(StatusEffect::Paralysis, 0, 0, StatusCheck::Prevented(StatusEffect::Paralysis))]
    #[case(StatusEffect::Paralysis, 0, 3, StatusCheck::Unaffected)]
    #[case(StatusEffect::Freeze, 0, 0, StatusCheck::Cured(StatusEffect::Freeze))]
    #[case(StatusEffect::Freeze, 0, 4, StatusCheck::Prevented(StatusEffect::Freeze))]
    #[case(StatusEffect::Sleep, 3, 0, StatusCheck::Prevented(StatusEffect::Sleep))]
    #[case(StatusEffect::Sleep, 1, 0, StatusCheck::Cured(StatusEffect::Sleep))]
    fn status_rolls(
        #[case] effect: StatusEffect,
        #[case] cure_turn: u32,
        #[case] draw: u32,
        #[case] expected: StatusCheck,
    ) {
        let mut status = StatusState {
            effect,
            turn_count: 0,
            cure_turn,
        };
        let mut rng = RandomSequence::scripted(vec![draw]);
        assert_eq!(check_status(&mut status, &mut rng), expected);
        assert_eq!(status.turn_count, 1);
    }

    #[test]
    fn poison_is_left_for_upkeep() {
        let mut status = StatusState {
            effect: StatusEffect::Poison,
            turn_count: 0,
            cure_turn: 0,
        };
        let mut rng = RandomSequence::scripted(vec![]);
        assert_eq!(check_status(&mut status, &mut rng), StatusCheck::Unaffected);
        assert_eq!(status.turn_count, 0);
    }

    #[test]
    fn hidden_targets_are_filtered_unless_reached() {
        let (mut field, a, b) = duel_field();
        field
            .get_mut(b)
            .expect("b")
            .add_tag(BattlerTag::new(TagKind::Underground));
        let content = builtin_content();
        let tackle = content.move_data(MoveId(33)).expect("tackle");
        let earthquake = content.move_data(MoveId(89)).expect("earthquake");

        let declared = [BattlerIndex::ENEMY];
        assert!(resolve_targets(&field, a, tackle, &declared)
            .expect("resolve")
            .is_empty());
        assert_eq!(resolve_targets(&field, a, earthquake, &declared).expect("resolve"), vec![b]);
    }

    #[test]
    fn single_target_moves_are_redirected_when_the_target_left() {
        let (mut field, ids) = double_field();
        let content = builtin_content();
        let tackle = content.move_data(MoveId(33)).expect("tackle");
        field.get_mut(ids[2]).expect("enemy").hp = 0;

        let resolved =
            resolve_targets(&field, ids[0], tackle, &[BattlerIndex::ENEMY]).expect("resolve");
        assert_eq!(resolved, vec![ids[3]]);
    }

    #[test]
    fn selection_is_needed_only_for_single_targets_with_choices() {
        let (field, ids) = double_field();
        let near = candidate_targets(&field, ids[0], MoveTarget::NearEnemy).expect("candidates");
        assert_eq!(near, vec![BattlerIndex::ENEMY, BattlerIndex::ENEMY_2]);
        assert!(needs_selection(MoveTarget::NearEnemy, &near));
        assert!(!needs_selection(MoveTarget::AllNearEnemies, &near));

        let own = candidate_targets(&field, ids[0], MoveTarget::BothSides).expect("candidates");
        assert_eq!(own, vec![BattlerIndex::PLAYER]);
    }

    #[test]
    fn pressure_raises_the_cost_per_opponent() {
        let (mut field, a, b) = duel_field();
        field.get_mut(b).expect("b").ability = Some(schema::AbilityId(46));
        let mut ctx = context_with(field, vec![]);
        let content = builtin_content();
        let tackle = content.move_data(MoveId(33)).expect("tackle");
        let swords_dance = content.move_data(MoveId(14)).expect("swords dance");
        assert_eq!(move_cost(&mut ctx, a, tackle).expect("cost"), 2);
        assert_eq!(move_cost(&mut ctx, a, swords_dance).expect("cost"), 2);
        // The holder's own moves are not taxed.
        assert_eq!(move_cost(&mut ctx, b, tackle).expect("cost"), 1);
    }

    #[test]
    fn each_pressure_holder_adds_a_use() {
        let (mut field, ids) = double_field();
        for enemy in &ids[2..] {
            field.get_mut(*enemy).expect("enemy").ability = Some(schema::AbilityId(46));
        }
        let mut ctx = context_with(field, vec![]);
        let content = builtin_content();
        let swords_dance = content.move_data(MoveId(14)).expect("swords dance");
        assert_eq!(move_cost(&mut ctx, ids[0], swords_dance).expect("cost"), 3);
    }

    #[test]
    fn hiding_makes_a_combatant_unreachable() {
        let (mut field, _, b) = duel_field();
        let content = builtin_content();
        let tackle = content.move_data(MoveId(33)).expect("tackle");
        assert!(reachable(&field, b, tackle));
        field
            .get_mut(b)
            .expect("b")
            .add_tag(BattlerTag::new(TagKind::InAir));
        assert!(!reachable(&field, b, tackle));
    }
}
