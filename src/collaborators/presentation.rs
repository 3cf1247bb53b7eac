// In: src/collaborators/presentation.rs

use crate::combatant::CombatantId;
use async_trait::async_trait;
use schema::{MoveId, StatusEffect, WeatherKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Short effect animations shared by many sources.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonAnim {
    Poison,
    Toxic,
    Paralysis,
    Sleep,
    Freeze,
    Burn,
    Confusion,
    Heal,
    Berry,
    HeldItem,
    Weather(WeatherKind),
}

impl CommonAnim {
    pub fn for_status(status: StatusEffect) -> Self {
        match status {
            StatusEffect::Poison => CommonAnim::Poison,
            StatusEffect::Toxic => CommonAnim::Toxic,
            StatusEffect::Paralysis => CommonAnim::Paralysis,
            StatusEffect::Sleep => CommonAnim::Sleep,
            StatusEffect::Freeze => CommonAnim::Freeze,
            StatusEffect::Burn => CommonAnim::Burn,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Animation {
    Move {
        user: CombatantId,
        move_id: MoveId,
    },
    Common {
        anim: CommonAnim,
        target: CombatantId,
    },
    StatChange {
        target: CombatantId,
        rising: bool,
    },
    Damage {
        target: CombatantId,
        amount: u16,
    },
    Faint(CombatantId),
    Summon(CombatantId),
    Capture {
        shakes: u8,
    },
}

/// Rendering, audio and message display. Every call completes at most once;
/// the engine never inspects the presenter's internal state.
#[async_trait]
pub trait Presentation: Send {
    async fn show_message(&mut self, text: &str);

    async fn play_animation(&mut self, animation: &Animation);

    /// Asks a yes/no question, e.g. whether to retry a failed save.
    async fn confirm(&mut self, prompt: &str) -> bool;
}

/// Shared view of everything a [`RecordingPresentation`] was asked to show.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Arc<Mutex<Vec<String>>>,
    animations: Arc<Mutex<Vec<Animation>>>,
}

impl Transcript {
    pub async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }

    pub async fn animations(&self) -> Vec<Animation> {
        self.animations.lock().await.clone()
    }

    /// Whether any shown message contains `needle`.
    pub async fn mentions(&self, needle: &str) -> bool {
        self.messages.lock().await.iter().any(|m| m.contains(needle))
    }
}

/// Headless presenter that records instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    transcript: Transcript,
    answers: VecDeque<bool>,
    echo: bool,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers returned by `confirm`, in order. Once exhausted it answers `false`.
    pub fn with_answers(mut self, answers: Vec<bool>) -> Self {
        self.answers = answers.into();
        self
    }

    /// Also prints every message to stdout.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

#[async_trait]
impl Presentation for RecordingPresentation {
    async fn show_message(&mut self, text: &str) {
        if self.echo {
            println!("{}", text);
        }
        self.transcript.messages.lock().await.push(text.to_string());
    }

    async fn play_animation(&mut self, animation: &Animation) {
        self.transcript
            .animations
            .lock()
            .await
            .push(animation.clone());
    }

    async fn confirm(&mut self, prompt: &str) -> bool {
        let answer = self.answers.pop_front().unwrap_or(false);
        self.transcript
            .messages
            .lock()
            .await
            .push(format!("{} [{}]", prompt, if answer { "yes" } else { "no" }));
        answer
    }
}
