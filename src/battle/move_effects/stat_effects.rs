// In: src/battle/move_effects/stat_effects.rs

use super::{EffectContext, MoveEffect};
use crate::battle::phases::{CommonAnimPhase, StatChangePhase};
use crate::battle::scheduler::PhaseQueue;
use crate::battle::state::{BattleEvent, EventBus};
use crate::collaborators::CommonAnim;
use crate::combatant::{CombatantId, MoveResult};
use crate::errors::BattleResult;
use crate::field::{ArenaTag, Field};
use schema::{ArenaTagKind, BattleStat, MoveTarget, WeatherKind};

/// Raises or lowers stat stages on the user or the target.
#[derive(Debug)]
pub struct StatChangeEffect {
    pub stats: Vec<BattleStat>,
    pub levels: i8,
    pub self_target: bool,
    pub chance: u8,
}

impl MoveEffect for StatChangeEffect {
    fn name(&self) -> &'static str {
        "stat change"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        if !ctx.rng.chance(self.chance, "stat change chance") {
            return Ok(());
        }
        let target = if self.self_target { ctx.user } else { ctx.target };
        if ctx.field.get(target)?.is_fainted() {
            return Ok(());
        }
        ctx.phases.insert_next(Box::new(StatChangePhase::new(
            target,
            Some(ctx.user),
            self.stats.clone(),
            self.levels,
        )));
        Ok(())
    }
}

/// Replaces the weather, announcing the old one's end and the new one's start.
/// Returns false when that weather is already in effect.
pub fn start_weather(
    field: &mut Field,
    events: &mut EventBus,
    phases: &mut PhaseQueue,
    weather: WeatherKind,
    turns: u8,
    source: Option<CombatantId>,
) -> bool {
    let previous = field.weather();
    if !field.set_weather(weather, turns, source) {
        return false;
    }
    if let Some(previous) = previous {
        events.push(BattleEvent::ArenaTagRemoved {
            kind: ArenaTagKind::Weather(previous),
            side: None,
        });
    }
    events.push(BattleEvent::ArenaTagAdded {
        kind: ArenaTagKind::Weather(weather),
        side: None,
    });
    if let Some(source) = source {
        phases.insert_next(Box::new(CommonAnimPhase::new(CommonAnim::Weather(weather), source)));
    }
    phases.queue_message(weather.start_text());
    true
}

/// Starts a field-wide or side condition. Trick Room toggles; other tags
/// fail while already active. Hazards land on the opposing side.
#[derive(Debug)]
pub struct ArenaTagEffect {
    pub kind: ArenaTagKind,
    pub turns: u8,
}

impl MoveEffect for ArenaTagEffect {
    fn name(&self) -> &'static str {
        "arena tag"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>) -> BattleResult<()> {
        let user_side = ctx.field.get(ctx.user)?.side;
        let side_hit = match ctx.move_data.map(|m| m.target) {
            Some(MoveTarget::EnemySide) => user_side.opponent(),
            _ => user_side,
        };
        let side = self.kind.is_side_tag().then_some(side_hit);

        if let ArenaTagKind::Weather(weather) = self.kind {
            let started = start_weather(
                ctx.field,
                ctx.events,
                ctx.phases,
                weather,
                self.turns,
                Some(ctx.user),
            );
            if !started {
                ctx.result.move_result = Some(MoveResult::Fail);
                ctx.phases.queue_message("But it failed!");
            }
            return Ok(());
        }

        if self.kind == ArenaTagKind::TrickRoom && ctx.field.remove_arena_tag(self.kind, side) {
            ctx.events
                .push(BattleEvent::ArenaTagRemoved { kind: self.kind, side });
            ctx.phases.queue_message(self.kind.end_text());
            return Ok(());
        }

        let added = ctx.field.add_arena_tag(ArenaTag {
            kind: self.kind,
            side,
            turns_left: self.turns,
            source: Some(ctx.user),
        });
        if !added {
            ctx.result.move_result = Some(MoveResult::Fail);
            ctx.phases.queue_message("But it failed!");
            return Ok(());
        }

        ctx.events
            .push(BattleEvent::ArenaTagAdded { kind: self.kind, side });
        let text = match side {
            Some(side) => format!("{} {}", side.team_label(), self.kind.start_text()),
            None => self.kind.start_text().to_string(),
        };
        ctx.phases.queue_message(text);
        Ok(())
    }
}
