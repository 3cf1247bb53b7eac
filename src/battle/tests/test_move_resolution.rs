#[cfg(test)]
mod tests {
    use crate::battle::move_effects::{EffectAttribute, EffectContext, MoveEffect};
    use crate::battle::phases::{MovePhase, StatChangePhase};
    use crate::battle::scheduler::PhaseScheduler;
    use crate::battle::state::{BattleEvent, EncounterOutcome, PreventionReason};
    use crate::battle::tests::common::{
        context_with, count_events, duel, messages, TestCombatantBuilder,
    };
    use crate::combatant::{BattlerTag, MoveResult, Side};
    use crate::content::ContentTable;
    use crate::errors::BattleResult;
    use crate::field::BattlerIndex;
    use crate::modifiers::ModifierOwner;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{
        AbilityData, AbilityId, BattleStat, ModifierKind, MoveId, StatusEffect, TagKind,
        TriggerStage, WeatherKind,
    };
    use std::sync::Arc;

    const GUILLOTINE: MoveId = MoveId(12);
    const DOUBLE_KICK: MoveId = MoveId(24);
    const TACKLE: MoveId = MoveId(33);
    const DIG: MoveId = MoveId(91);
    const PROTECT: MoveId = MoveId(182);
    const SWORDS_DANCE: MoveId = MoveId(14);
    const WATER_GUN: MoveId = MoveId(55);

    // Draws for one ordinary strike: accuracy 50, no critical, lowest spread.
    const PLAIN_STRIKE: [u32; 3] = [50, 1, 85];

    /// Sends the target underground as soon as it is struck.
    #[derive(Debug)]
    struct HideTarget;

    impl MoveEffect for HideTarget {
        fn name(&self) -> &'static str {
            "hide target"
        }

        fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
            ctx.field
                .get_mut(ctx.target)?
                .add_tag(BattlerTag::new(TagKind::Underground));
            Ok(())
        }
    }

    /// Raises the holder's Defense whenever it is hit.
    #[derive(Debug)]
    struct HardenWhenHit;

    impl MoveEffect for HardenWhenHit {
        fn name(&self) -> &'static str {
            "harden when hit"
        }

        fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
            ctx.phases.insert_next(Box::new(StatChangePhase::new(
                ctx.user,
                Some(ctx.user),
                vec![BattleStat::Defense],
                1,
            )));
            Ok(())
        }
    }

    fn content_with(register: impl FnOnce(&mut ContentTable)) -> Arc<ContentTable> {
        let mut content = ContentTable::builtin().expect("builtin content");
        register(&mut content);
        Arc::new(content)
    }

    fn pp_used(ctx: &crate::battle::state::BattleContext, id: crate::combatant::CombatantId, move_id: MoveId) -> u8 {
        ctx.field
            .get(id)
            .expect("combatant")
            .move_slot(move_id)
            .expect("known move")
            .pp_used
    }

    #[rstest]
    #[case(30, true)]
    #[case(31, false)]
    #[tokio::test]
    async fn accuracy_roll_must_not_exceed_the_accuracy(#[case] roll: u32, #[case] hits: bool) {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![GUILLOTINE])
                .build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        // Guillotine has 30% accuracy; a one-hit KO still draws the spread.
        let mut ctx = context_with(field, vec![roll, 85]);
        ctx.phases
            .push(Box::new(MovePhase::new(a, GUILLOTINE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        let target = ctx.field.get(b).expect("b");
        if hits {
            assert_eq!(target.hp, 0);
            assert_eq!(ctx.outcome, Some(EncounterOutcome::Victory));
            assert!(messages(&ctx).contains(&"It's a one-hit KO!".to_string()));
        } else {
            assert_eq!(target.hp, 100);
            assert_eq!(
                ctx.field.get(a).expect("a").last_move().map(|m| m.result),
                Some(MoveResult::Miss)
            );
            assert_eq!(
                messages(&ctx),
                vec!["A used Guillotine!", "A's attack missed!"]
            );
            assert_eq!(pp_used(&ctx, a, GUILLOTINE), 1);
        }
    }

    #[tokio::test]
    async fn full_paralysis_records_a_turn_without_a_move() {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .with_status(StatusEffect::Paralysis)
                .build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        let mut ctx = context_with(field, vec![0]);
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        let user = ctx.field.get(a).expect("a");
        let last = user.last_move().expect("history entry");
        assert_eq!(last.move_id, None);
        assert_eq!(last.result, MoveResult::Fail);
        assert_eq!(pp_used(&ctx, a, TACKLE), 0);
        assert_eq!(ctx.field.get(b).expect("b").hp, 100);
        assert_eq!(messages(&ctx), vec!["A is paralyzed! It can't move!"]);
        assert!(ctx.events.events().contains(&BattleEvent::ActionPrevented {
            combatant: a,
            reason: PreventionReason::Status(StatusEffect::Paralysis),
        }));
        assert_eq!(
            count_events(&ctx, |e| matches!(e, BattleEvent::MoveUsed { .. })),
            0
        );
    }

    #[tokio::test]
    async fn a_move_with_no_reachable_target_fails_without_costing_a_use() {
        let (mut field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field
            .get_mut(b)
            .expect("b")
            .add_tag(BattlerTag::new(TagKind::Underground));
        let mut ctx = context_with(field, vec![]);
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(messages(&ctx), vec!["A used Tackle!", "But it failed!"]);
        assert_eq!(
            ctx.field.get(a).expect("a").last_move().map(|m| m.result),
            Some(MoveResult::Fail)
        );
        assert_eq!(pp_used(&ctx, a, TACKLE), 0);
        assert!(ctx.events.events().contains(&BattleEvent::MoveFailed {
            user: a,
            move_id: TACKLE,
        }));
    }

    #[tokio::test]
    async fn multi_hit_moves_roll_accuracy_once_and_report_the_count() {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![DOUBLE_KICK])
                .build(),
            TestCombatantBuilder::new("B", 50).with_hp(300).build(),
        );
        // Second strike: no accuracy draw, only critical and spread.
        let mut ctx = context_with(field, vec![50, 1, 85, 1, 85]);
        ctx.phases
            .push(Box::new(MovePhase::new(a, DOUBLE_KICK, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        let hits: Vec<u8> = ctx
            .events
            .events()
            .iter()
            .filter_map(|e| match e {
                BattleEvent::MoveHit { target, hit, .. } if *target == b => Some(*hit),
                _ => None,
            })
            .collect();
        assert_eq!(hits, vec![1, 2]);
        assert!(messages(&ctx).contains(&"Hit 2 times!".to_string()));
        assert!(ctx.events.events().contains(&BattleEvent::MoveResolved {
            user: a,
            move_id: DOUBLE_KICK,
            result: MoveResult::Success,
            hits: 2,
        }));
        assert_eq!(pp_used(&ctx, a, DOUBLE_KICK), 1);
    }

    #[tokio::test]
    async fn multi_hit_moves_stop_when_the_target_faints() {
        let (mut field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![DOUBLE_KICK])
                .build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        let reserve = field.add_combatant(Side::Enemy, TestCombatantBuilder::new("C", 50).build());
        field.get_mut(b).expect("b").hp = 1;
        let mut ctx = context_with(field, PLAIN_STRIKE.to_vec());
        ctx.phases
            .push(Box::new(MovePhase::new(a, DOUBLE_KICK, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(
            count_events(&ctx, |e| matches!(e, BattleEvent::MoveHit { .. })),
            1
        );
        assert!(ctx.events.events().contains(&BattleEvent::MoveResolved {
            user: a,
            move_id: DOUBLE_KICK,
            result: MoveResult::Success,
            hits: 1,
        }));
        assert!(!messages(&ctx).iter().any(|m| m.starts_with("Hit ")));
        assert_eq!(ctx.field.at(BattlerIndex::ENEMY), Some(reserve));
    }

    #[tokio::test]
    async fn multi_hit_moves_stop_when_the_target_hides() {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![DOUBLE_KICK])
                .build(),
            TestCombatantBuilder::new("B", 50).with_hp(300).build(),
        );
        let mut ctx = context_with(field, PLAIN_STRIKE.to_vec());
        ctx.content = content_with(|content| {
            content
                .register_attribute(DOUBLE_KICK, EffectAttribute::new(TriggerStage::Hit, 1, HideTarget))
                .expect("double kick registered");
        });
        ctx.phases
            .push(Box::new(MovePhase::new(a, DOUBLE_KICK, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert!(ctx.field.get(b).expect("b").has_tag(TagKind::Underground));
        assert_eq!(
            count_events(&ctx, |e| matches!(e, BattleEvent::MoveHit { .. })),
            1
        );
        assert!(ctx.events.events().contains(&BattleEvent::MoveResolved {
            user: a,
            move_id: DOUBLE_KICK,
            result: MoveResult::Success,
            hits: 1,
        }));
        assert!(!messages(&ctx).contains(&"Hit 2 times!".to_string()));
    }

    #[tokio::test]
    async fn charge_moves_hide_the_user_and_release_on_the_next_turn() {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50).with_moves(vec![DIG]).build(),
            TestCombatantBuilder::new("B", 50)
                .with_moves(vec![TACKLE])
                .build(),
        );
        let mut ctx = context_with(field, PLAIN_STRIKE.to_vec());
        ctx.phases
            .push(Box::new(MovePhase::new(a, DIG, vec![BattlerIndex::ENEMY])));
        ctx.phases
            .push(Box::new(MovePhase::new(b, TACKLE, vec![BattlerIndex::PLAYER])));

        PhaseScheduler::run(&mut ctx).await.expect("charging turn");

        let user = ctx.field.get(a).expect("a");
        assert!(user.has_tag(TagKind::Underground));
        assert_eq!(user.last_move().map(|m| m.result), Some(MoveResult::Other));
        assert_eq!(
            messages(&ctx),
            vec![
                "A burrowed its way under the ground!",
                "B used Tackle!",
                "But it failed!"
            ]
        );
        assert_eq!(pp_used(&ctx, a, DIG), 1);

        // Next turn: the queued release.
        for id in [a, b] {
            ctx.field.get_mut(id).expect("combatant").reset_turn_data();
        }
        let queued = ctx
            .field
            .get_mut(a)
            .expect("a")
            .move_queue
            .pop_front()
            .expect("release queued");
        assert!(queued.ignore_pp);
        ctx.phases.push(Box::new(
            MovePhase::new(a, queued.move_id, queued.targets).ignoring_pp(true),
        ));

        PhaseScheduler::run(&mut ctx).await.expect("release turn");

        let user = ctx.field.get(a).expect("a");
        assert!(!user.has_tag(TagKind::Underground));
        let last = user.last_move().expect("history");
        assert_eq!(last.result, MoveResult::Success);
        assert!(last.follow_up);
        assert_eq!(pp_used(&ctx, a, DIG), 1);
        assert!(ctx.field.get(b).expect("b").hp < 100);
        assert!(messages(&ctx).contains(&"A used Dig!".to_string()));
    }

    #[tokio::test]
    async fn protection_blocks_the_strike_after_the_accuracy_roll() {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            TestCombatantBuilder::new("B", 50)
                .with_moves(vec![PROTECT])
                .build(),
        );
        let mut ctx = context_with(field, vec![50]);
        ctx.phases
            .push(Box::new(MovePhase::new(b, PROTECT, vec![BattlerIndex::ENEMY])));
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(ctx.field.get(b).expect("b").hp, 100);
        assert!(messages(&ctx).contains(&"B protected itself!".to_string()));
        assert_eq!(
            ctx.field.get(a).expect("a").last_move().map(|m| m.result),
            Some(MoveResult::NoEffect)
        );
    }

    #[tokio::test]
    async fn contact_with_a_static_holder_can_paralyze_the_attacker() {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            TestCombatantBuilder::new("B", 50)
                .with_ability(AbilityId(9))
                .build(),
        );
        let mut draws = PLAIN_STRIKE.to_vec();
        draws.push(10);
        let mut ctx = context_with(field, draws);
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(
            ctx.field.get(a).expect("a").status_effect(),
            Some(StatusEffect::Paralysis)
        );
        assert!(ctx.field.get(b).expect("b").hp < 100);
    }

    #[tokio::test]
    async fn pressure_costs_an_extra_use() {
        let (field, a, _) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            TestCombatantBuilder::new("B", 50)
                .with_ability(AbilityId(46))
                .build(),
        );
        let mut ctx = context_with(field, PLAIN_STRIKE.to_vec());
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(pp_used(&ctx, a, TACKLE), 2);
    }

    #[tokio::test]
    async fn pressure_taxes_moves_that_only_target_the_user() {
        let (field, a, _) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![SWORDS_DANCE])
                .build(),
            TestCombatantBuilder::new("B", 50)
                .with_ability(AbilityId(46))
                .build(),
        );
        let mut ctx = context_with(field, vec![]);
        ctx.phases
            .push(Box::new(MovePhase::new(a, SWORDS_DANCE, vec![BattlerIndex::PLAYER])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(ctx.field.get(a).expect("a").stages.get(BattleStat::Attack), 2);
        assert_eq!(pp_used(&ctx, a, SWORDS_DANCE), 2);
    }

    #[tokio::test]
    async fn harsh_sunlight_evaporates_water_moves() {
        let (mut field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![WATER_GUN])
                .build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field.set_weather(WeatherKind::HarshSun, 0, None);
        let mut ctx = context_with(field, vec![]);
        ctx.phases
            .push(Box::new(MovePhase::new(a, WATER_GUN, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(ctx.field.get(b).expect("b").hp, 100);
        assert_eq!(
            messages(&ctx),
            vec![
                "A used Water Gun!",
                "The Water-type attack evaporated in the harsh sunlight!"
            ]
        );
        assert_eq!(
            ctx.field.get(a).expect("a").last_move().map(|m| m.result),
            Some(MoveResult::Fail)
        );
        assert_eq!(pp_used(&ctx, a, WATER_GUN), 1);
    }

    #[tokio::test]
    async fn kings_rock_can_make_the_target_flinch() {
        let (mut field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field
            .modifiers
            .add(ModifierKind::FlinchChance, ModifierOwner::Combatant(a), 1);
        let mut draws = PLAIN_STRIKE.to_vec();
        draws.push(5);
        let mut ctx = context_with(field, draws);
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert!(ctx.field.get(b).expect("b").has_tag(TagKind::Flinched));
        assert!(ctx.events.events().contains(&BattleEvent::TagAdded {
            combatant: b,
            tag: TagKind::Flinched,
        }));
    }

    #[rstest]
    #[case::rocky_helmet(None, Some(ModifierKind::ContactDamage), 84, "A was hurt by B's Rocky Helmet!")]
    #[case::rough_skin(Some(AbilityId(24)), None, 88, "A was hurt by B's Rough Skin!")]
    #[tokio::test]
    async fn contact_hurts_the_attacker(
        #[case] ability: Option<AbilityId>,
        #[case] item: Option<ModifierKind>,
        #[case] expected_hp: u16,
        #[case] text: &str,
    ) {
        let mut defender = TestCombatantBuilder::new("B", 50);
        if let Some(ability) = ability {
            defender = defender.with_ability(ability);
        }
        let (mut field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            defender.build(),
        );
        if let Some(kind) = item {
            field.modifiers.add(kind, ModifierOwner::Combatant(b), 1);
        }
        let mut ctx = context_with(field, PLAIN_STRIKE.to_vec());
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert_eq!(ctx.field.get(a).expect("a").hp, expected_hp);
        assert!(messages(&ctx).contains(&text.to_string()));
    }

    #[tokio::test]
    async fn shell_bell_heals_a_share_of_the_damage_dealt() {
        let (mut field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field.get_mut(a).expect("a").hp = 50;
        field
            .modifiers
            .add(ModifierKind::HitHeal, ModifierOwner::Combatant(a), 1);
        let mut ctx = context_with(field, PLAIN_STRIKE.to_vec());
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        let dealt = 100 - ctx.field.get(b).expect("b").hp;
        assert!(dealt > 0);
        assert_eq!(ctx.field.get(a).expect("a").hp, 50 + (dealt / 8).max(1));
        assert!(messages(&ctx)
            .contains(&"A restored a little HP using its Shell Bell!".to_string()));
    }

    #[tokio::test]
    async fn registered_ability_attributes_react_to_hits() {
        let (field, a, b) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_moves(vec![TACKLE])
                .build(),
            TestCombatantBuilder::new("B", 50)
                .with_ability(AbilityId(192))
                .build(),
        );
        let mut ctx = context_with(field, PLAIN_STRIKE.to_vec());
        ctx.content = content_with(|content| {
            content.insert_ability(AbilityData {
                id: AbilityId(192),
                name: "Stamina".to_string(),
                hooks: Vec::new(),
            });
            content
                .register_ability_attribute(
                    AbilityId(192),
                    EffectAttribute::new(TriggerStage::PostDefend, 0, HardenWhenHit),
                )
                .expect("stamina registered");
        });
        ctx.phases
            .push(Box::new(MovePhase::new(a, TACKLE, vec![BattlerIndex::ENEMY])));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        assert!(ctx.field.get(b).expect("b").hp < 100);
        assert_eq!(ctx.field.get(b).expect("b").stages.get(BattleStat::Defense), 1);
    }
}
