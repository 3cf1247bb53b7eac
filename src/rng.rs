//! Seeded random sequence shared by everything that rolls dice during an
//! encounter: tie-breaks, accuracy, critical hits, hit counts, status rolls.
//!
//! The sequence is keyed by the encounter seed and the turn number, so a turn
//! replayed from a snapshot draws the same numbers in the same order. All
//! consumers draw from this single stream; the order of draws is fixed by the
//! order in which phases run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const TURN_KEY_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Clone, Debug)]
enum Source {
    Seeded(ChaCha8Rng),
    /// Pre-recorded outcomes, returned verbatim. Once exhausted the sequence
    /// continues from a fixed seeded stream.
    Scripted {
        outcomes: VecDeque<u32>,
        fallback: ChaCha8Rng,
    },
}

#[derive(Clone, Debug)]
pub struct RandomSequence {
    source: Source,
    encounter_seed: u64,
    turn: u32,
}

/// Serializable position of a seeded sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomState {
    pub encounter_seed: u64,
    pub turn: u32,
    pub word_pos: u128,
}

fn turn_seed(encounter_seed: u64, turn: u32) -> u64 {
    encounter_seed.wrapping_add(u64::from(turn).wrapping_mul(TURN_KEY_STRIDE))
}

impl RandomSequence {
    /// Sequence for the start of an encounter (turn 0).
    pub fn new(encounter_seed: u64) -> Self {
        Self::keyed(encounter_seed, 0)
    }

    pub fn keyed(encounter_seed: u64, turn: u32) -> Self {
        Self {
            source: Source::Seeded(ChaCha8Rng::seed_from_u64(turn_seed(encounter_seed, turn))),
            encounter_seed,
            turn,
        }
    }

    /// A sequence that returns `outcomes` in order. Each outcome must already
    /// lie in the range of the draw that consumes it.
    pub fn scripted(outcomes: Vec<u32>) -> Self {
        Self {
            source: Source::Scripted {
                outcomes: outcomes.into(),
                fallback: ChaCha8Rng::seed_from_u64(0),
            },
            encounter_seed: 0,
            turn: 0,
        }
    }

    /// Re-key a seeded sequence for a new turn. Scripted sequences keep
    /// their remaining outcomes.
    pub fn rekey(&mut self, turn: u32) {
        self.turn = turn;
        if let Source::Seeded(rng) = &mut self.source {
            *rng = ChaCha8Rng::seed_from_u64(turn_seed(self.encounter_seed, turn));
        }
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_scripted(&self) -> bool {
        matches!(self.source, Source::Scripted { .. })
    }

    /// Uniform integer in `[min, min + range)`. A zero range yields `min`.
    pub fn rand_int(&mut self, range: u32, min: u32, reason: &str) -> u32 {
        if range <= 1 {
            return min;
        }
        let value = match &mut self.source {
            Source::Seeded(rng) => rng.random_range(min..min + range),
            Source::Scripted { outcomes, fallback } => match outcomes.pop_front() {
                Some(value) if value >= min && value < min + range => value,
                Some(value) => {
                    tracing::warn!(value, min, range, reason, "scripted outcome out of range");
                    value.clamp(min, min + range - 1)
                }
                None => fallback.random_range(min..min + range),
            },
        };
        tracing::trace!(value, min, range, reason, "rng draw");
        value
    }

    /// Fair coin. `true` means the first of the two compared items wins.
    pub fn coin_flip(&mut self, reason: &str) -> bool {
        self.rand_int(2, 0, reason) == 0
    }

    /// Percentage roll; `percent >= 100` always succeeds without drawing.
    pub fn chance(&mut self, percent: u8, reason: &str) -> bool {
        if percent >= 100 {
            return true;
        }
        if percent == 0 {
            return false;
        }
        self.rand_int(100, 0, reason) < u32::from(percent)
    }

    pub fn pick<T: Copy>(&mut self, items: &[T], reason: &str) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        let index = self.rand_int(items.len() as u32, 0, reason) as usize;
        items.get(index).copied()
    }

    pub fn state(&self) -> RandomState {
        let word_pos = match &self.source {
            Source::Seeded(rng) => rng.get_word_pos(),
            Source::Scripted { fallback, .. } => fallback.get_word_pos(),
        };
        RandomState {
            encounter_seed: self.encounter_seed,
            turn: self.turn,
            word_pos,
        }
    }

    pub fn from_state(state: &RandomState) -> Self {
        let mut sequence = Self::keyed(state.encounter_seed, state.turn);
        if let Source::Seeded(rng) = &mut sequence.source {
            rng.set_word_pos(state.word_pos);
        }
        sequence
    }
}
