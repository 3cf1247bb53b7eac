use serde::{Deserialize, Serialize};
use std::fmt;

use crate::WeatherKind;

/// Named events at which a battler tag is re-evaluated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LapseTrigger {
    /// The tagged combatant is about to use a move.
    Move,
    /// The tagged combatant's move is about to take effect.
    MoveEffect,
    /// The tagged combatant finished its move.
    AfterMove,
    /// End-of-turn upkeep.
    TurnEnd,
    /// The tagged combatant fainted.
    Faint,
}

/// Volatile conditions attached to a single combatant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Flinched,
    Confused,
    Protected,
    Recharging,
    /// Semi-invulnerable while digging.
    Underground,
    /// Semi-invulnerable while flying up.
    InAir,
    /// The next move against the locked target cannot miss.
    LockOn,
    CritBoost,
    Trapped,
}

impl TagKind {
    /// Triggers at which the tag lapses and its default lifetime in lapses.
    /// A lifetime of 0 means the tag stays until removed explicitly.
    pub fn lapse_policy(self) -> (&'static [LapseTrigger], u8) {
        match self {
            TagKind::Flinched => (&[LapseTrigger::Move, LapseTrigger::TurnEnd], 1),
            TagKind::Confused => (&[LapseTrigger::Move], 0),
            TagKind::Protected => (&[LapseTrigger::TurnEnd], 1),
            TagKind::Recharging => (&[LapseTrigger::Move], 1),
            TagKind::Underground | TagKind::InAir => (&[LapseTrigger::MoveEffect], 1),
            TagKind::LockOn => (&[LapseTrigger::TurnEnd], 2),
            TagKind::CritBoost => (&[], 0),
            TagKind::Trapped => (&[LapseTrigger::TurnEnd], 0),
        }
    }

    /// Tags that make the holder untargetable unless a move hits through them.
    pub fn is_hiding(self) -> bool {
        matches!(self, TagKind::Underground | TagKind::InAir)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Conditions attached to the field, either globally or to one side.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArenaTagKind {
    Gravity,
    TrickRoom,
    /// Side condition blocking stat drops caused by the opposing side.
    Mist,
    /// Entry hazard hurting every grounded combatant sent out on the side.
    Spikes,
    Weather(WeatherKind),
}

impl ArenaTagKind {
    pub fn is_side_tag(self) -> bool {
        matches!(self, ArenaTagKind::Mist | ArenaTagKind::Spikes)
    }

    pub fn start_text(self) -> &'static str {
        match self {
            ArenaTagKind::Gravity => "Gravity intensified!",
            ArenaTagKind::TrickRoom => "The dimensions were twisted!",
            ArenaTagKind::Mist => "became shrouded in mist!",
            ArenaTagKind::Spikes => "is surrounded by spikes!",
            ArenaTagKind::Weather(weather) => weather.start_text(),
        }
    }

    pub fn end_text(self) -> &'static str {
        match self {
            ArenaTagKind::Gravity => "Gravity returned to normal!",
            ArenaTagKind::TrickRoom => "The twisted dimensions returned to normal!",
            ArenaTagKind::Mist => "is no longer protected by mist!",
            ArenaTagKind::Spikes => "is no longer surrounded by spikes!",
            ArenaTagKind::Weather(weather) => weather.end_text(),
        }
    }
}
