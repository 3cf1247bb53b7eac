// In: src/collaborators/persistence.rs

use crate::battle::state::EncounterOutcome;
use crate::errors::PersistenceError;
use crate::field::Field;
use crate::rng::RandomState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where in the encounter a save was requested.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveBoundary {
    TurnEnd,
    EncounterEnd,
}

/// Everything needed to resume an encounter at a turn boundary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EncounterSnapshot {
    pub field: Field,
    pub rng: RandomState,
    pub outcome: Option<EncounterOutcome>,
}

impl EncounterSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        postcard::to_allocvec(self).map_err(|e| PersistenceError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        postcard::from_bytes(bytes).map_err(|e| PersistenceError::Encode(e.to_string()))
    }
}

#[async_trait]
pub trait Persistence: Send {
    /// Stores a snapshot. The engine awaits completion before moving on.
    async fn save(
        &mut self,
        snapshot: &EncounterSnapshot,
        boundary: SaveBoundary,
    ) -> Result<(), PersistenceError>;
}

/// Shared handle to the saves a [`MemoryPersistence`] accepted.
#[derive(Debug, Clone, Default)]
pub struct SaveLog(Arc<Mutex<Vec<(SaveBoundary, Vec<u8>)>>>);

impl SaveLog {
    pub async fn boundaries(&self) -> Vec<SaveBoundary> {
        self.0.lock().await.iter().map(|(b, _)| *b).collect()
    }

    pub async fn latest(&self) -> Option<EncounterSnapshot> {
        let saves = self.0.lock().await;
        let (_, bytes) = saves.last()?;
        EncounterSnapshot::from_bytes(bytes).ok()
    }
}

/// Keeps postcard-encoded snapshots in memory. Can be told to reject saves.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    log: SaveLog,
    /// Outcomes for upcoming saves; `false` rejects. Empty means accept.
    scripted: VecDeque<bool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the next `count` saves.
    pub fn failing(mut self, count: usize) -> Self {
        self.scripted.extend((0..count).map(|_| false));
        self
    }

    pub fn log(&self) -> SaveLog {
        self.log.clone()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn save(
        &mut self,
        snapshot: &EncounterSnapshot,
        boundary: SaveBoundary,
    ) -> Result<(), PersistenceError> {
        if !self.scripted.pop_front().unwrap_or(true) {
            return Err(PersistenceError::Storage("storage unavailable".to_string()));
        }
        let bytes = snapshot.to_bytes()?;
        self.log.0.lock().await.push((boundary, bytes));
        Ok(())
    }
}
