// In: src/collaborators/mod.rs

//! Interfaces to everything the engine does not own: presentation, command
//! input and persistence. Each comes with a headless implementation used by
//! tests and the demo binary.

mod input;
mod persistence;
mod presentation;

pub use input::{CommandSource, ScriptedCommand, ScriptedCommands};
pub use persistence::{EncounterSnapshot, MemoryPersistence, Persistence, SaveBoundary, SaveLog};
pub use presentation::{Animation, CommonAnim, Presentation, RecordingPresentation, Transcript};
