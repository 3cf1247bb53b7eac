// In: src/battle/commands.rs

//! Turn commands: what each active combatant chose to do this turn, and the
//! rules that decide whether a choice is allowed.

use crate::combatant::{Combatant, CombatantId, QueuedMove};
use crate::config::{CommandPrecedence, EncounterKind};
use crate::content::ContentTable;
use crate::errors::{BattleResult, CommandError, CommandResult};
use crate::field::{BattlerIndex, Field};
use schema::{MoveId, TagKind};
use serde::{Deserialize, Serialize};

/// Ball used for an in-encounter capture attempt.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallTier {
    Poke,
    Great,
    Ultra,
    Master,
}

impl BallTier {
    /// Catch-rate multiplier; `None` never fails.
    pub fn multiplier(self) -> Option<f64> {
        match self {
            BallTier::Poke => Some(1.0),
            BallTier::Great => Some(1.5),
            BallTier::Ultra => Some(2.0),
            BallTier::Master => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BallTier::Poke => "Poké Ball",
            BallTier::Great => "Great Ball",
            BallTier::Ultra => "Ultra Ball",
            BallTier::Master => "Master Ball",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Fight { move_id: MoveId, ignore_pp: bool },
    Ball { tier: BallTier },
    /// Send out the roster member at `roster_index` of the user's side.
    Switch { roster_index: usize, baton_pass: bool },
    Run,
}

impl CommandKind {
    pub fn precedence(&self, table: &CommandPrecedence) -> i8 {
        match self {
            CommandKind::Fight { .. } => table.fight,
            CommandKind::Ball { .. } => table.ball,
            CommandKind::Switch { .. } => table.switch,
            CommandKind::Run => table.run,
        }
    }
}

/// One combatant's action for the current turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TurnCommand {
    pub kind: CommandKind,
    pub targets: Vec<BattlerIndex>,
    /// Set when an allied command pre-empted this one.
    pub skip: bool,
}

impl TurnCommand {
    fn of(kind: CommandKind) -> Self {
        Self {
            kind,
            targets: Vec::new(),
            skip: false,
        }
    }

    pub fn fight(move_id: MoveId) -> Self {
        Self::of(CommandKind::Fight {
            move_id,
            ignore_pp: false,
        })
    }

    pub fn switch(roster_index: usize) -> Self {
        Self::of(CommandKind::Switch {
            roster_index,
            baton_pass: false,
        })
    }

    pub fn run() -> Self {
        Self::of(CommandKind::Run)
    }

    pub fn ball(tier: BallTier) -> Self {
        Self::of(CommandKind::Ball { tier })
    }

    /// A forced follow-up (second half of a charge move, etc.).
    pub fn follow_up(queued: &QueuedMove) -> Self {
        Self {
            kind: CommandKind::Fight {
                move_id: queued.move_id,
                ignore_pp: queued.ignore_pp,
            },
            targets: queued.targets.clone(),
            skip: false,
        }
    }

    /// The placeholder left in a partner's slot when `leader` pre-empts it.
    pub fn following(leader: &TurnCommand) -> Self {
        Self {
            kind: leader.kind.clone(),
            targets: Vec::new(),
            skip: true,
        }
    }

    /// Picks a move slot, rejecting slots that cannot be used right now.
    pub fn use_slot(combatant: &Combatant, index: usize) -> CommandResult<Self> {
        let slot = combatant
            .moves
            .get(index)
            .ok_or(CommandError::InvalidMoveIndex(index))?;
        if slot.uses_left() == 0 {
            return Err(CommandError::NoUsesLeft(format!("{:?}", slot.move_id)));
        }
        if combatant.is_move_disabled(slot.move_id) {
            return Err(CommandError::MoveDisabled(format!("{:?}", slot.move_id)));
        }
        Ok(Self::fight(slot.move_id))
    }

    /// What a combatant does when nothing else is allowed.
    pub fn fallback(combatant: &Combatant) -> Self {
        match combatant.usable_slots().first() {
            Some(index) => Self::fight(combatant.moves[*index].move_id),
            None => Self {
                kind: CommandKind::Fight {
                    move_id: MoveId::STRUGGLE,
                    ignore_pp: true,
                },
                targets: Vec::new(),
                skip: false,
            },
        }
    }

    pub fn move_id(&self) -> Option<MoveId> {
        match self.kind {
            CommandKind::Fight { move_id, .. } => Some(move_id),
            _ => None,
        }
    }

    /// Running and throwing a ball take the whole side's turn.
    pub fn pre_empts_partner(&self) -> bool {
        matches!(self.kind, CommandKind::Run | CommandKind::Ball { .. })
    }

    /// Short label for logs and events.
    pub fn describe(&self, content: &ContentTable) -> String {
        match &self.kind {
            CommandKind::Fight { move_id, .. } => content
                .move_data(*move_id)
                .map(|m| format!("Fight({})", m.name))
                .unwrap_or_else(|_| format!("Fight({:?})", move_id)),
            CommandKind::Ball { tier } => format!("Ball({})", tier.name()),
            CommandKind::Switch { roster_index, .. } => format!("Switch({})", roster_index),
            CommandKind::Run => "Run".to_string(),
        }
    }
}

/// Commands of the current turn, indexed by battler slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnCommands([Option<TurnCommand>; 4]);

impl TurnCommands {
    pub fn get(&self, index: BattlerIndex) -> Option<&TurnCommand> {
        self.0.get(usize::from(index.0)).and_then(|c| c.as_ref())
    }

    pub fn get_mut(&mut self, index: BattlerIndex) -> Option<&mut TurnCommand> {
        self.0.get_mut(usize::from(index.0)).and_then(|c| c.as_mut())
    }

    pub fn set(&mut self, index: BattlerIndex, command: TurnCommand) {
        if let Some(slot) = self.0.get_mut(usize::from(index.0)) {
            *slot = Some(command);
        }
    }

    pub fn clear(&mut self) {
        self.0 = Default::default();
    }

    /// Marks the ally slot of `index` as pre-empted by `leader`.
    pub fn mark_partner_skipped(&mut self, index: BattlerIndex, leader: &TurnCommand) {
        let partner = BattlerIndex::new(index.side(), 1 - index.slot());
        match self.get_mut(partner) {
            Some(command) => command.skip = true,
            None => self.set(partner, TurnCommand::following(leader)),
        }
    }
}

fn move_name(content: &ContentTable, move_id: MoveId) -> String {
    content
        .move_data(move_id)
        .map(|m| m.name.clone())
        .unwrap_or_else(|_| format!("{:?}", move_id))
}

/// Checks a command against the current field. A rejection is shown to the
/// chooser, who is asked again.
pub fn validate(
    field: &Field,
    content: &ContentTable,
    id: CombatantId,
    command: &TurnCommand,
) -> BattleResult<CommandResult<()>> {
    let combatant = field.get(id)?;
    Ok(match &command.kind {
        CommandKind::Fight { move_id, ignore_pp } => {
            validate_fight(combatant, content, *move_id, *ignore_pp)
        }
        CommandKind::Switch { roster_index, .. } => {
            let reserves = field.reserves(combatant.side);
            let wanted = field.roster(combatant.side).get(*roster_index);
            if !wanted.is_some_and(|w| reserves.contains(w)) {
                Err(CommandError::InvalidSwitch(*roster_index))
            } else if combatant.has_tag(TagKind::Trapped) {
                Err(CommandError::Trapped(combatant.name.clone()))
            } else {
                Ok(())
            }
        }
        CommandKind::Run => {
            if field.kind == EncounterKind::Trainer {
                Err(CommandError::CannotRunFromTrainer)
            } else if combatant.has_tag(TagKind::Trapped) {
                Err(CommandError::Trapped(combatant.name.clone()))
            } else {
                Ok(())
            }
        }
        CommandKind::Ball { .. } => {
            if field.kind == EncounterKind::Trainer {
                Err(CommandError::CannotCatchTrainerOwned)
            } else if field.active_on_side(combatant.side.opponent()).len() > 1 {
                Err(CommandError::TooManyTargets)
            } else {
                Ok(())
            }
        }
    })
}

fn validate_fight(
    combatant: &Combatant,
    content: &ContentTable,
    move_id: MoveId,
    ignore_pp: bool,
) -> CommandResult<()> {
    if ignore_pp || move_id == MoveId::STRUGGLE {
        return Ok(());
    }
    let Some(slot) = combatant.move_slot(move_id) else {
        return Err(CommandError::NotKnown(move_name(content, move_id)));
    };
    if slot.uses_left() == 0 {
        return Err(CommandError::NoUsesLeft(move_name(content, move_id)));
    }
    if combatant.is_move_disabled(move_id) {
        return Err(CommandError::MoveDisabled(move_name(content, move_id)));
    }
    Ok(())
}
