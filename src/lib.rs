// In: src/lib.rs

//! Battle Phases
//!
//! The turn-resolution engine of a turn-based creature battle simulator.
//! A turn is a queue of phases run one at a time by a cooperative scheduler;
//! moves resolve through a staged effect pipeline, and every random outcome
//! is drawn from one reproducible sequence per encounter.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod collaborators;
pub mod combatant;
pub mod config;
pub mod content;
pub mod errors;
pub mod field;
pub mod modifiers;
pub mod rng;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    AbilityData, AbilityId, ArenaTagKind, BaseStats, BattleStat, BerryKind, EffectKind,
    EffectSpec, ElementType, HookKind, LapseTrigger, ModifierKind, MoveCategory, MoveData,
    MoveId, MoveTarget, StatusEffect, TagKind, TriggerStage, WeatherKind,
};

// --- From this crate's modules (`src/`) ---

// Driving an encounter.
pub use battle::ai::ScoringAi;
pub use battle::encounter::Encounter;
pub use battle::scheduler::{Phase, PhaseQueue, PhaseScheduler};
pub use battle::state::{BattleContext, BattleEvent, EncounterOutcome, EventBus};

// Core runtime types.
pub use combatant::{Combatant, CombatantId, Side};
pub use config::{BattleConfig, EncounterKind};
pub use content::ContentTable;
pub use field::{BattlerIndex, Field};
pub use rng::RandomSequence;

// Crate-specific error and result types.
pub use errors::{BattleError, BattleResult, CommandError, ConfigError, ContentError, PersistenceError};
