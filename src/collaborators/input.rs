// In: src/collaborators/input.rs

use crate::battle::commands::{BallTier, TurnCommand};
use crate::combatant::{CombatantId, Side};
use crate::content::ContentTable;
use crate::field::{BattlerIndex, Field};
use async_trait::async_trait;
use schema::MoveId;
use std::collections::VecDeque;

/// Anything that decides what a side does: a UI, an AI, a script.
#[async_trait]
pub trait CommandSource: Send {
    /// The command for one active combatant. It is validated afterwards; a
    /// rejected command leads to another call.
    async fn choose_command(
        &mut self,
        field: &Field,
        content: &ContentTable,
        combatant: CombatantId,
    ) -> TurnCommand;

    /// Picks one of `candidates` for a single-target move.
    async fn choose_target(
        &mut self,
        field: &Field,
        user: CombatantId,
        move_id: MoveId,
        candidates: &[BattlerIndex],
    ) -> BattlerIndex;

    /// Picks who replaces a fainted combatant. `None` leaves the slot empty.
    async fn choose_replacement(
        &mut self,
        field: &Field,
        side: Side,
        options: &[CombatantId],
    ) -> Option<CombatantId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedCommand {
    /// Use the move in this slot.
    Move(usize),
    /// Send out this roster index.
    Switch(usize),
    Run,
    Ball(BallTier),
}

/// Replays prepared choices in order; once a queue runs dry it uses the
/// first usable move, the first candidate target and the first replacement.
#[derive(Debug, Default)]
pub struct ScriptedCommands {
    commands: VecDeque<ScriptedCommand>,
    targets: VecDeque<BattlerIndex>,
    replacements: VecDeque<usize>,
}

impl ScriptedCommands {
    pub fn new(commands: Vec<ScriptedCommand>) -> Self {
        Self {
            commands: commands.into(),
            ..Self::default()
        }
    }

    pub fn with_targets(mut self, targets: Vec<BattlerIndex>) -> Self {
        self.targets = targets.into();
        self
    }

    /// Replacement choices as positions in the offered list.
    pub fn with_replacements(mut self, replacements: Vec<usize>) -> Self {
        self.replacements = replacements.into();
        self
    }
}

#[async_trait]
impl CommandSource for ScriptedCommands {
    async fn choose_command(
        &mut self,
        field: &Field,
        _content: &ContentTable,
        combatant: CombatantId,
    ) -> TurnCommand {
        let Ok(user) = field.get(combatant) else {
            return TurnCommand::run();
        };
        match self.commands.pop_front() {
            Some(ScriptedCommand::Move(index)) => user
                .moves
                .get(index)
                .map(|slot| TurnCommand::fight(slot.move_id))
                .unwrap_or_else(|| TurnCommand::fallback(user)),
            Some(ScriptedCommand::Switch(index)) => TurnCommand::switch(index),
            Some(ScriptedCommand::Run) => TurnCommand::run(),
            Some(ScriptedCommand::Ball(tier)) => TurnCommand::ball(tier),
            None => TurnCommand::fallback(user),
        }
    }

    async fn choose_target(
        &mut self,
        _field: &Field,
        _user: CombatantId,
        _move_id: MoveId,
        candidates: &[BattlerIndex],
    ) -> BattlerIndex {
        match self.targets.pop_front() {
            Some(target) if candidates.contains(&target) => target,
            _ => candidates.first().copied().unwrap_or(BattlerIndex::ENEMY),
        }
    }

    async fn choose_replacement(
        &mut self,
        _field: &Field,
        _side: Side,
        options: &[CombatantId],
    ) -> Option<CombatantId> {
        let position = self.replacements.pop_front().unwrap_or(0);
        options.get(position).or(options.first()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Combatant, MoveSlot};
    use crate::config::EncounterKind;
    use pretty_assertions::assert_eq;
    use schema::{BaseStats, ElementType};

    #[tokio::test]
    async fn scripted_commands_fall_back_to_the_first_usable_move() {
        let mut field = Field::new(EncounterKind::Wild, false);
        let id = field.add_combatant(
            Side::Player,
            Combatant::new("A", 5, vec![ElementType::Normal], BaseStats::default())
                .with_moves(vec![MoveSlot::new(MoveId(33), 35), MoveSlot::new(MoveId(45), 40)]),
        );
        let content = ContentTable::default();
        let mut source = ScriptedCommands::new(vec![ScriptedCommand::Move(1), ScriptedCommand::Run]);

        let first = source.choose_command(&field, &content, id).await;
        let second = source.choose_command(&field, &content, id).await;
        let third = source.choose_command(&field, &content, id).await;

        assert_eq!(first.move_id(), Some(MoveId(45)));
        assert_eq!(second, TurnCommand::run());
        assert_eq!(third.move_id(), Some(MoveId(33)));
    }
}
