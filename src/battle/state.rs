// In: src/battle/state.rs

use crate::battle::commands::TurnCommands;
use crate::battle::scheduler::PhaseQueue;
use crate::collaborators::{
    Animation, CommandSource, EncounterSnapshot, Persistence, Presentation,
};
use crate::combatant::{CombatantId, MoveResult, Side};
use crate::config::BattleConfig;
use crate::content::ContentTable;
use crate::field::Field;
use crate::rng::RandomSequence;
use schema::{ArenaTagKind, BattleStat, ModifierKind, MoveId, StatusEffect, TagKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How an encounter finished.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterOutcome {
    Victory,
    Defeat,
    Fled,
    Captured(CombatantId),
    /// The configured turn cap was reached first.
    TurnLimit,
}

/// Why a combatant could not act this turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreventionReason {
    Status(StatusEffect),
    Tag(TagKind),
    NoUsesLeft,
    Disabled,
}

/// Machine-readable record of everything that happened in an encounter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn management
    TurnStarted {
        turn: u32,
    },
    CommandChosen {
        combatant: CombatantId,
        command: String,
    },

    // Move resolution
    MoveUsed {
        user: CombatantId,
        move_id: MoveId,
    },
    ActionPrevented {
        combatant: CombatantId,
        reason: PreventionReason,
    },
    MoveMissed {
        user: CombatantId,
        target: CombatantId,
        move_id: MoveId,
    },
    MoveFailed {
        user: CombatantId,
        move_id: MoveId,
    },
    MoveHit {
        user: CombatantId,
        target: CombatantId,
        move_id: MoveId,
        hit: u8,
    },
    MoveResolved {
        user: CombatantId,
        move_id: MoveId,
        result: MoveResult,
        hits: u8,
    },

    // Health
    DamageDealt {
        target: CombatantId,
        amount: u16,
        remaining_hp: u16,
    },
    Healed {
        target: CombatantId,
        amount: u16,
        new_hp: u16,
    },
    Fainted {
        combatant: CombatantId,
    },
    Revived {
        combatant: CombatantId,
        hp: u16,
    },

    // Stats, statuses and tags
    StatStageChanged {
        target: CombatantId,
        stat: BattleStat,
        old_stage: i8,
        new_stage: i8,
    },
    StatChangeBlocked {
        target: CombatantId,
        stat: BattleStat,
        reason: String,
    },
    StatusApplied {
        target: CombatantId,
        status: StatusEffect,
    },
    StatusCured {
        target: CombatantId,
        status: StatusEffect,
    },
    TagAdded {
        combatant: CombatantId,
        tag: TagKind,
    },
    TagRemoved {
        combatant: CombatantId,
        tag: TagKind,
    },
    ArenaTagAdded {
        kind: ArenaTagKind,
        side: Option<Side>,
    },
    ArenaTagRemoved {
        kind: ArenaTagKind,
        side: Option<Side>,
    },
    ModifierConsumed {
        combatant: CombatantId,
        kind: ModifierKind,
    },

    // Field changes and encounter actions
    SwitchedIn {
        combatant: CombatantId,
        side: Side,
    },
    EscapeAttempted {
        success: bool,
    },
    CaptureAttempted {
        target: CombatantId,
        shakes: u8,
        success: bool,
    },

    Message {
        text: String,
    },
    SaveFailed {
        reason: String,
    },
    EncounterEnded {
        outcome: EncounterOutcome,
    },
}

#[derive(Debug, Default, Clone)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        tracing::trace!(?event, "battle event");
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Exports the full log as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}

/// Everything a phase can see or touch. Owned by the encounter driver and
/// lent to one phase at a time.
pub struct BattleContext {
    pub field: Field,
    pub rng: RandomSequence,
    pub content: Arc<ContentTable>,
    pub config: BattleConfig,
    pub phases: PhaseQueue,
    pub events: EventBus,
    pub commands: TurnCommands,
    pub outcome: Option<EncounterOutcome>,
    pub presentation: Box<dyn Presentation>,
    pub player_input: Box<dyn CommandSource>,
    pub enemy_input: Box<dyn CommandSource>,
    pub persistence: Box<dyn Persistence>,
}

impl BattleContext {
    pub fn new(
        field: Field,
        content: Arc<ContentTable>,
        config: BattleConfig,
        presentation: Box<dyn Presentation>,
        player_input: Box<dyn CommandSource>,
        enemy_input: Box<dyn CommandSource>,
        persistence: Box<dyn Persistence>,
    ) -> Self {
        Self {
            rng: RandomSequence::new(config.seed),
            field,
            content,
            config,
            phases: PhaseQueue::default(),
            events: EventBus::new(),
            commands: TurnCommands::default(),
            outcome: None,
            presentation,
            player_input,
            enemy_input,
            persistence,
        }
    }

    /// Replaces the random sequence, e.g. with a scripted one.
    pub fn with_rng(mut self, rng: RandomSequence) -> Self {
        self.rng = rng;
        self
    }

    /// The side's command source together with the read-only state it
    /// decides on.
    pub fn decision_view(&mut self, side: Side) -> (&mut dyn CommandSource, &Field, &ContentTable) {
        let input = match side {
            Side::Player => self.player_input.as_mut(),
            Side::Enemy => self.enemy_input.as_mut(),
        };
        (input, &self.field, self.content.as_ref())
    }

    pub fn name_of(&self, id: CombatantId) -> String {
        self.field
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    /// Shows a message and records it on the event bus.
    pub async fn show_message(&mut self, text: &str) {
        self.events.push(BattleEvent::Message {
            text: text.to_string(),
        });
        self.presentation.show_message(text).await;
    }

    pub async fn play_animation(&mut self, animation: Animation) {
        self.presentation.play_animation(&animation).await;
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            field: self.field.clone(),
            rng: self.rng.state(),
            outcome: self.outcome,
        }
    }
}

impl std::fmt::Debug for BattleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleContext")
            .field("turn", &self.field.turn)
            .field("phases", &self.phases)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn event_bus_exports_json() {
        let mut bus = EventBus::new();
        bus.push(BattleEvent::TurnStarted { turn: 1 });
        bus.push(BattleEvent::Message {
            text: "Hello".to_string(),
        });
        let json = bus.to_json().expect("events serialize");
        let parsed: Vec<BattleEvent> = serde_json::from_str(&json).expect("events parse");
        assert_eq!(parsed, bus.events());
        assert_eq!(bus.len(), 2);
    }
}
