#[cfg(test)]
mod tests {
    use crate::battle::ai::ScoringAi;
    use crate::battle::encounter::Encounter;
    use crate::battle::phases::TurnInitPhase;
    use crate::battle::scheduler::PhaseScheduler;
    use crate::battle::state::{BattleContext, BattleEvent, EncounterOutcome};
    use crate::battle::tags::lapse_tags;
    use crate::battle::tests::common::{
        builtin_content, context_with, count_events, double_field, duel, messages,
        TestCombatantBuilder,
    };
    use crate::collaborators::{
        MemoryPersistence, RecordingPresentation, SaveBoundary, ScriptedCommand, ScriptedCommands,
    };
    use crate::combatant::{BattlerTag, Side};
    use crate::config::BattleConfig;
    use crate::field::{BattlerIndex, Field};
    use pretty_assertions::assert_eq;
    use schema::{LapseTrigger, MoveId, TagKind};

    #[tokio::test]
    async fn tags_lapse_once_per_trigger_per_turn() {
        let (mut field, a, _) = duel(
            TestCombatantBuilder::new("A", 50).build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field
            .get_mut(a)
            .expect("a")
            .add_tag(BattlerTag::new(TagKind::Confused).with_turns(3));
        // One draw: no self-hit.
        let mut ctx = context_with(field, vec![1]);

        let first = lapse_tags(&mut ctx, a, LapseTrigger::Move).await.expect("lapse");
        let second = lapse_tags(&mut ctx, a, LapseTrigger::Move).await.expect("lapse");

        assert_eq!(first, None);
        assert_eq!(second, None);
        let confusion = ctx.field.get(a).expect("a").tag(TagKind::Confused).cloned();
        assert_eq!(confusion.map(|t| t.turns_left), Some(2));
        assert_eq!(messages(&ctx), vec!["A is confused!"]);
    }

    #[tokio::test]
    async fn confusion_self_hit_stops_the_move() {
        let (mut field, a, _) = duel(
            TestCombatantBuilder::new("A", 50).build(),
            TestCombatantBuilder::new("B", 50).build(),
        );
        field
            .get_mut(a)
            .expect("a")
            .add_tag(BattlerTag::new(TagKind::Confused).with_turns(3));
        let mut ctx = context_with(field, vec![0]);

        let stopped = lapse_tags(&mut ctx, a, LapseTrigger::Move).await.expect("lapse");

        assert_eq!(stopped, Some(TagKind::Confused));
        assert!(ctx.field.get(a).expect("a").hp < 100);
        assert_eq!(
            messages(&ctx),
            vec!["A is confused!", "It hurt itself in its confusion!"]
        );
    }

    fn spread_speeds(field: &mut Field, ids: &[crate::combatant::CombatantId]) {
        for (rank, id) in ids.iter().enumerate() {
            field.get_mut(*id).expect("combatant").stats.speed = 100 - rank as u16 * 10;
        }
    }

    #[tokio::test]
    async fn running_in_a_double_battle_skips_the_partner() {
        let (mut field, ids) = double_field();
        spread_speeds(&mut field, &ids);
        // Escape roll 0 always succeeds.
        let mut ctx = context_with(field, vec![0]);
        ctx.player_input = Box::new(ScriptedCommands::new(vec![ScriptedCommand::Run]));
        ctx.phases.push(Box::new(TurnInitPhase));

        PhaseScheduler::run(&mut ctx).await.expect("run");

        let partner = ctx
            .commands
            .get(BattlerIndex::PLAYER_2)
            .expect("placeholder command");
        assert!(partner.skip);
        assert_eq!(ctx.outcome, Some(EncounterOutcome::Fled));
        assert_eq!(
            count_events(&ctx, |e| matches!(
                e,
                BattleEvent::CommandChosen { combatant, .. } if *combatant == ids[1]
            )),
            0
        );
        assert_eq!(
            count_events(&ctx, |e| matches!(e, BattleEvent::MoveUsed { .. })),
            0
        );
        assert!(messages(&ctx).contains(&"You got away safely!".to_string()));
    }

    #[tokio::test]
    async fn a_failed_turn_end_save_does_not_stop_the_encounter() {
        let (field, _, _) = duel(
            TestCombatantBuilder::new("A", 50)
                .with_hp(300)
                .with_speed(60)
                .build(),
            TestCombatantBuilder::new("B", 50)
                .with_hp(300)
                .with_speed(40)
                .build(),
        );
        let persistence = MemoryPersistence::new().failing(1);
        let log = persistence.log();
        let mut ctx = context_with(field, vec![]);
        ctx.persistence = Box::new(persistence);
        let mut encounter = Encounter::new(ctx);

        let first = encounter.run_turn().await.expect("first turn");
        let second = encounter.run_turn().await.expect("second turn");

        assert_eq!(first, None);
        assert_eq!(second, None);
        let ctx = encounter.context();
        assert_eq!(ctx.field.turn, 2);
        assert_eq!(
            count_events(ctx, |e| matches!(e, BattleEvent::SaveFailed { .. })),
            1
        );
        assert!(messages(ctx)
            .contains(&"Could not save progress. Continuing without saving.".to_string()));
        assert_eq!(log.boundaries().await, vec![SaveBoundary::TurnEnd]);
        let saved = log.latest().await.expect("snapshot");
        assert_eq!(saved.field.turn, 2);
    }

    #[tokio::test]
    async fn the_turn_limit_ends_the_encounter() {
        let (field, _, _) = duel(
            TestCombatantBuilder::new("A", 50).with_hp(300).build(),
            TestCombatantBuilder::new("B", 50).with_hp(300).build(),
        );
        let mut ctx = context_with(field, vec![]);
        ctx.config.max_turns = 1;
        let mut encounter = Encounter::new(ctx);

        assert_eq!(encounter.run_turn().await.expect("turn"), None);
        assert_eq!(
            encounter.run_turn().await.expect("limit"),
            Some(EncounterOutcome::TurnLimit)
        );
        assert_eq!(encounter.context().field.turn, 1);
    }

    fn ai_encounter(seed: u64) -> Encounter {
        let content = builtin_content();
        let mut field = Field::new(crate::config::EncounterKind::Wild, false);
        for (side, name, moves) in [
            (Side::Player, "A", vec![MoveId(33), MoveId(24), MoveId(14)]),
            (Side::Player, "A2", vec![MoveId(52), MoveId(98)]),
            (Side::Enemy, "B", vec![MoveId(23), MoveId(45), MoveId(86)]),
            (Side::Enemy, "B2", vec![MoveId(85), MoveId(71)]),
        ] {
            field.add_combatant(side, TestCombatantBuilder::new(name, 50).with_moves(moves).build());
        }
        let config = BattleConfig {
            seed,
            ..BattleConfig::default()
        };
        let ctx = BattleContext::new(
            field,
            content,
            config,
            Box::new(RecordingPresentation::new()),
            Box::new(ScoringAi::new(seed + 1)),
            Box::new(ScoringAi::new(seed + 2)),
            Box::new(MemoryPersistence::new()),
        );
        Encounter::new(ctx)
    }

    #[tokio::test]
    async fn computer_controlled_encounters_finish_and_replay_identically() {
        let mut first = ai_encounter(42);
        let mut second = ai_encounter(42);

        let outcome = first.run().await.expect("first encounter");
        let replay = second.run().await.expect("second encounter");

        assert!(matches!(
            outcome,
            EncounterOutcome::Victory | EncounterOutcome::Defeat | EncounterOutcome::TurnLimit
        ));
        assert_eq!(outcome, replay);
        let ctx = first.context();
        assert_eq!(
            count_events(ctx, |e| matches!(e, BattleEvent::TurnStarted { .. })),
            ctx.field.turn as usize
        );
        assert_eq!(ctx.events.events(), second.context().events.events());
    }
}
