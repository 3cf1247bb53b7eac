//! A scoring command source for computer-controlled sides.

use crate::battle::commands::TurnCommand;
use crate::battle::stats::effective_attack;
use crate::collaborators::CommandSource;
use crate::combatant::{Combatant, CombatantId, Side, MAX_STAT_STAGE};
use crate::content::ContentTable;
use crate::field::{BattlerIndex, Field};
use crate::rng::RandomSequence;
use async_trait::async_trait;
use ordered_float::OrderedFloat;
use schema::{EffectKind, MoveCategory, MoveData, MoveId};

/// Picks the highest scoring usable move, or a switch when nothing beats
/// the switch baseline.
///
/// The tie-break jitter comes from a sequence of its own so that computer
/// decisions never consume the encounter's shared random stream.
#[derive(Debug)]
pub struct ScoringAi {
    jitter: RandomSequence,
}

impl ScoringAi {
    pub fn new(seed: u64) -> Self {
        Self {
            jitter: RandomSequence::new(seed),
        }
    }

    /// A factor in [0.95, 1.05) that breaks ties and avoids repetitive loops.
    fn noise(&mut self) -> f32 {
        let roll = self.jitter.rand_int(100, 0, "ai jitter") as f32;
        0.95 + roll / 1000.0
    }

    fn score_move(&mut self, move_data: &MoveData, attacker: &Combatant, defender: Option<&Combatant>) -> f32 {
        // --- Step 1: Damage ---
        let mut damage_score = 0.0;
        if move_data.is_damaging() {
            let Some(defender) = defender else {
                return 0.0;
            };
            let effectiveness = move_data.element.effectiveness(&defender.types);
            // Immune targets make this a terrible choice.
            if effectiveness < 0.1 {
                return -1.0;
            }
            let stab = if attacker.types.contains(&move_data.element) {
                1.5
            } else {
                1.0
            };
            let stat = effective_attack(attacker, move_data.category) as f32;
            let normalized_power = stat / (f32::from(attacker.level) * 2.0).max(1.0);
            damage_score = f32::from(move_data.power) * effectiveness * stab * normalized_power;
        }

        // --- Step 2: Utility ---
        let mut utility_score = 0.0;
        for effect in &move_data.effects {
            match &effect.kind {
                EffectKind::StatChange {
                    stats,
                    levels,
                    self_target: true,
                    chance,
                } if *levels > 0 => {
                    for stat in stats {
                        let stage = attacker.stages.get(*stat);
                        if stage < MAX_STAT_STAGE {
                            let potential = 1.0 - f32::from(stage) / f32::from(MAX_STAT_STAGE);
                            utility_score += 20.0 * f32::from(*levels) * potential * f32::from(*chance) / 100.0;
                        }
                    }
                }
                EffectKind::StatChange {
                    stats,
                    levels,
                    self_target: false,
                    chance,
                } if *levels < 0 => {
                    let room = defender.is_some_and(|d| stats.iter().any(|s| d.stages.get(*s) > -MAX_STAT_STAGE));
                    if room {
                        utility_score += 15.0 * f32::from(levels.unsigned_abs()) * f32::from(*chance) / 100.0;
                    }
                }
                EffectKind::Status { chance, .. } => {
                    if defender.is_some_and(|d| d.status.is_none()) {
                        utility_score += 45.0 * f32::from(*chance) / 100.0;
                    }
                }
                EffectKind::Flinch { chance } => {
                    utility_score += 30.0 * f32::from(*chance) / 100.0;
                }
                EffectKind::Heal { .. } => {
                    utility_score += 40.0 * (1.0 - attacker.hp_ratio());
                }
                _ => {}
            }
        }

        // --- Step 3: Combine ---
        if move_data.category == MoveCategory::Status && utility_score < 1.0 {
            return -1.0;
        }
        let mut score = damage_score + utility_score;
        if move_data.category != MoveCategory::Status {
            // Sure-hit moves get a slight edge.
            let accuracy = move_data.accuracy.unwrap_or(101);
            score *= f32::from(accuracy) / 100.0;
        }
        score * self.noise()
    }

    fn score_switch(&mut self) -> f32 {
        1.0 + (self.noise() - 0.95)
    }
}

#[async_trait]
impl CommandSource for ScoringAi {
    async fn choose_command(
        &mut self,
        field: &Field,
        content: &ContentTable,
        combatant: CombatantId,
    ) -> TurnCommand {
        let Ok(user) = field.get(combatant) else {
            return TurnCommand::run();
        };
        let defender = field
            .opponents_of(combatant)
            .first()
            .and_then(|id| field.get(*id).ok());

        let mut best_move: Option<(MoveId, f32)> = None;
        for index in user.usable_slots() {
            let move_id = user.moves[index].move_id;
            let Ok(move_data) = content.move_data(move_id) else {
                continue;
            };
            let score = self.score_move(move_data, user, defender);
            if best_move.map_or(true, |(_, best)| OrderedFloat(score) > OrderedFloat(best)) {
                best_move = Some((move_id, score));
            }
        }

        let roster = field.roster(user.side);
        let best_switch = field
            .reserves(user.side)
            .into_iter()
            .filter_map(|id| roster.iter().position(|r| *r == id))
            .map(|position| (position, self.score_switch()))
            .max_by_key(|(_, score)| OrderedFloat(*score));

        match (best_move, best_switch) {
            (Some((move_id, move_score)), Some((position, switch_score))) => {
                if switch_score > move_score {
                    TurnCommand::switch(position)
                } else {
                    TurnCommand::fight(move_id)
                }
            }
            (Some((move_id, _)), None) => TurnCommand::fight(move_id),
            (None, Some((position, _))) if user.moves.is_empty() => TurnCommand::switch(position),
            _ => TurnCommand::fallback(user),
        }
    }

    async fn choose_target(
        &mut self,
        field: &Field,
        user: CombatantId,
        _move_id: MoveId,
        candidates: &[BattlerIndex],
    ) -> BattlerIndex {
        let side = field.get(user).map(|c| c.side).unwrap_or(Side::Enemy);
        // Prefer the weakest opponent; allies only when nothing else is offered.
        candidates
            .iter()
            .copied()
            .filter_map(|index| field.active_at(index).map(|c| (index, c)))
            .filter(|(_, c)| c.side != side)
            .min_by_key(|(_, c)| OrderedFloat(c.hp_ratio()))
            .map(|(index, _)| index)
            .or_else(|| candidates.first().copied())
            .unwrap_or(BattlerIndex::new(side.opponent(), 0))
    }

    async fn choose_replacement(
        &mut self,
        _field: &Field,
        _side: Side,
        options: &[CombatantId],
    ) -> Option<CombatantId> {
        options.first().copied()
    }
}
