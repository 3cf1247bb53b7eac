use crate::combatant::CombatantId;
use crate::field::BattlerIndex;
use schema::{AbilityId, MoveId};
use thiserror::Error;

/// Main error type for the battle phase engine.
///
/// Every variant is an invariant violation: it aborts the running encounter.
/// Game outcomes such as a miss or a failed escape are never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error("combatant {0:?} is not registered on the field")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0:?} is not active on the field")]
    InactiveCombatant(CombatantId),

    #[error("no combatant occupies battler slot {0:?}")]
    EmptySlot(BattlerIndex),

    #[error("resource underflow on {combatant:?}: {detail}")]
    ResourceUnderflow {
        combatant: CombatantId,
        detail: String,
    },

    #[error("effect {0} needs a move in flight")]
    NoMoveInFlight(&'static str),

    #[error("phase {phase} failed: {reason}")]
    PhaseFailed { phase: &'static str, reason: String },

    #[error("content error: {0}")]
    Content(#[from] ContentError),
}

/// Errors raised by content lookups and content loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("move {0:?} is missing from the content table")]
    MoveNotFound(MoveId),

    #[error("ability {0:?} is missing from the content table")]
    AbilityNotFound(AbilityId),

    #[error("move {0:?} is defined twice")]
    DuplicateMove(MoveId),

    #[error("malformed content: {0}")]
    Malformed(String),
}

/// A rejected command. Shown to whoever issued it; they are asked again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("move slot {0} does not exist")]
    InvalidMoveIndex(usize),

    #[error("{0} is not a known move!")]
    NotKnown(String),

    #[error("{0} has no uses left!")]
    NoUsesLeft(String),

    #[error("{0} is disabled!")]
    MoveDisabled(String),

    #[error("party slot {0} cannot be sent out")]
    InvalidSwitch(usize),

    #[error("{0} is trapped and cannot escape!")]
    Trapped(String),

    #[error("you can't run from a trainer battle!")]
    CannotRunFromTrainer,

    #[error("you can't throw a ball at a trainer's creature!")]
    CannotCatchTrainerOwned,

    #[error("there are too many targets to throw a ball!")]
    TooManyTargets,
}

/// Failure reported by a persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("could not encode snapshot: {0}")]
    Encode(String),

    #[error("save rejected by storage: {0}")]
    Storage(String),
}

/// Errors from loading engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("could not parse config: {0}")]
    Parse(String),
}

pub type BattleResult<T> = Result<T, BattleError>;
pub type ContentResult<T> = Result<T, ContentError>;
pub type CommandResult<T> = Result<T, CommandError>;
