use crate::errors::{BattleError, BattleResult};
use crate::field::BattlerIndex;
use schema::{
    AbilityId, BaseStats, BattleStat, ElementType, LapseTrigger, MoveId, StatusEffect, TagKind,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable handle of a combatant inside the field's arena. Never reused
/// within an encounter, so tags and modifiers can refer to their source
/// after it faints or switches out.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombatantId(pub u32);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Enemy => 1,
        }
    }

    pub fn team_label(self) -> &'static str {
        match self {
            Side::Player => "Your team",
            Side::Enemy => "The opposing team",
        }
    }
}

pub const MAX_STAT_STAGE: i8 = 6;

/// Temporary stat stages, each bounded to [-6, +6].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatStageSet([i8; BattleStat::COUNT]);

impl StatStageSet {
    pub fn get(&self, stat: BattleStat) -> i8 {
        self.0[stat.index()]
    }

    /// The change that would actually apply after clamping.
    pub fn clamped_delta(&self, stat: BattleStat, levels: i8) -> i8 {
        let current = self.get(stat);
        (current + levels).clamp(-MAX_STAT_STAGE, MAX_STAT_STAGE) - current
    }

    /// Applies a change and returns the delta that took effect.
    pub fn change(&mut self, stat: BattleStat, levels: i8) -> i8 {
        let delta = self.clamped_delta(stat, levels);
        self.0[stat.index()] += delta;
        delta
    }

    pub fn reset(&mut self) {
        self.0 = [0; BattleStat::COUNT];
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSlot {
    pub move_id: MoveId,
    pub pp_used: u8,
    pub max_pp: u8,
}

impl MoveSlot {
    pub fn new(move_id: MoveId, max_pp: u8) -> Self {
        Self {
            move_id,
            pp_used: 0,
            max_pp,
        }
    }

    pub fn uses_left(&self) -> u8 {
        self.max_pp.saturating_sub(self.pp_used)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusState {
    pub effect: StatusEffect,
    /// Turns spent under this status; drives toxic damage and sleep cures.
    pub turn_count: u32,
    /// Turn count at which sleep ends.
    pub cure_turn: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BattlerTag {
    pub kind: TagKind,
    pub triggers: Vec<LapseTrigger>,
    /// Remaining lapses; 0 means the tag persists until removed.
    pub turns_left: u8,
    pub source: Option<CombatantId>,
    pub source_move: Option<MoveId>,
}

impl BattlerTag {
    pub fn new(kind: TagKind) -> Self {
        let (triggers, turns) = kind.lapse_policy();
        Self {
            kind,
            triggers: triggers.to_vec(),
            turns_left: turns,
            source: None,
            source_move: None,
        }
    }

    pub fn with_turns(mut self, turns: u8) -> Self {
        self.turns_left = turns;
        self
    }

    pub fn with_source(mut self, source: CombatantId, move_id: Option<MoveId>) -> Self {
        self.source = Some(source);
        self.source_move = move_id;
        self
    }
}

/// Final classification of a move activation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    Pending,
    Success,
    Miss,
    Fail,
    NoEffect,
    Other,
}

/// Outcome of one strike against one target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HitResult {
    Effective,
    SuperEffective,
    NotVeryEffective,
    NoEffect,
    Fail,
    Other,
}

impl HitResult {
    pub fn from_multiplier(multiplier: f32) -> Self {
        if multiplier <= 0.0 {
            HitResult::NoEffect
        } else if multiplier > 1.0 {
            HitResult::SuperEffective
        } else if multiplier < 1.0 {
            HitResult::NotVeryEffective
        } else {
            HitResult::Effective
        }
    }

    /// Results that connected with the target.
    pub fn is_damaging(self) -> bool {
        self < HitResult::NoEffect
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TurnMove {
    /// `None` records a turn where the combatant was prevented from moving.
    pub move_id: Option<MoveId>,
    pub targets: Vec<BattlerIndex>,
    pub result: MoveResult,
    pub follow_up: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueuedMove {
    pub move_id: MoveId,
    pub targets: Vec<BattlerIndex>,
    pub ignore_pp: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttackRecord {
    pub move_id: MoveId,
    pub source: CombatantId,
    pub result: HitResult,
    pub damage: u16,
}

/// Per-turn scratch state, reset at the start of every turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnData {
    pub acted: bool,
    pub hits_left: Option<u8>,
    pub hit_count: u8,
    pub damage_dealt: u32,
    pub attacks_received: Vec<AttackRecord>,
    pub last_result: Option<MoveResult>,
    /// Lapse triggers already evaluated this turn.
    pub lapsed: Vec<LapseTrigger>,
}

/// State that lasts while the combatant stays on the field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SummonData {
    pub disabled_move: Option<MoveId>,
    pub disabled_turns: u8,
    pub turns_on_field: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub level: u8,
    pub types: Vec<ElementType>,
    pub stats: BaseStats,
    pub hp: u16,
    pub moves: Vec<MoveSlot>,
    pub ability: Option<AbilityId>,
    pub status: Option<StatusState>,
    pub stages: StatStageSet,
    pub tags: Vec<BattlerTag>,
    pub turn_data: TurnData,
    pub summon_data: SummonData,
    pub move_history: Vec<TurnMove>,
    pub move_queue: VecDeque<QueuedMove>,
    pub catch_rate: u8,
    pub on_field: bool,
}

impl Combatant {
    /// A combatant at full health. The id is assigned when it joins a field.
    pub fn new(name: impl Into<String>, level: u8, types: Vec<ElementType>, stats: BaseStats) -> Self {
        Self {
            id: CombatantId(0),
            name: name.into(),
            side: Side::Player,
            level,
            types,
            stats,
            hp: stats.hp,
            moves: Vec::new(),
            ability: None,
            status: None,
            stages: StatStageSet::default(),
            tags: Vec::new(),
            turn_data: TurnData::default(),
            summon_data: SummonData::default(),
            move_history: Vec::new(),
            move_queue: VecDeque::new(),
            catch_rate: 45,
            on_field: false,
        }
    }

    pub fn with_moves(mut self, moves: Vec<MoveSlot>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_ability(mut self, ability: AbilityId) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn with_catch_rate(mut self, catch_rate: u8) -> Self {
        self.catch_rate = catch_rate;
        self
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn is_active(&self) -> bool {
        self.on_field && !self.is_fainted()
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp() == 0 {
            return 0.0;
        }
        f32::from(self.hp) / f32::from(self.max_hp())
    }

    /// Removes up to `amount` HP; returns what was actually lost.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Restores up to `amount` HP; returns what was actually restored.
    pub fn restore_hp(&mut self, amount: u16) -> u16 {
        let healed = amount.min(self.max_hp() - self.hp);
        self.hp += healed;
        healed
    }

    pub fn status_effect(&self) -> Option<StatusEffect> {
        self.status.map(|s| s.effect)
    }

    pub fn has_tag(&self, kind: TagKind) -> bool {
        self.tags.iter().any(|t| t.kind == kind)
    }

    pub fn tag(&self, kind: TagKind) -> Option<&BattlerTag> {
        self.tags.iter().find(|t| t.kind == kind)
    }

    /// Adds a tag unless one of the same kind is already present.
    pub fn add_tag(&mut self, tag: BattlerTag) -> bool {
        if self.has_tag(tag.kind) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, kind: TagKind) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.kind != kind);
        before != self.tags.len()
    }

    pub fn remove_tags_sourced_by(&mut self, source: CombatantId) {
        self.tags.retain(|t| t.source != Some(source));
    }

    pub fn hiding_tag(&self) -> Option<TagKind> {
        self.tags.iter().map(|t| t.kind).find(|k| k.is_hiding())
    }

    pub fn last_move(&self) -> Option<&TurnMove> {
        self.move_history.last()
    }

    pub fn move_slot(&self, move_id: MoveId) -> Option<&MoveSlot> {
        self.moves.iter().find(|m| m.move_id == move_id)
    }

    pub fn is_move_disabled(&self, move_id: MoveId) -> bool {
        self.summon_data.disabled_move == Some(move_id) && self.summon_data.disabled_turns > 0
    }

    /// A slot that has uses left and is not disabled.
    pub fn can_use_slot(&self, index: usize) -> bool {
        self.moves
            .get(index)
            .is_some_and(|slot| slot.uses_left() > 0 && !self.is_move_disabled(slot.move_id))
    }

    pub fn usable_slots(&self) -> Vec<usize> {
        (0..self.moves.len())
            .filter(|i| self.can_use_slot(*i))
            .collect()
    }

    /// Spends uses of a known move. Spending more than what remains is
    /// capped at the slot's maximum; spending from an already overdrawn
    /// slot is an invariant violation.
    pub fn spend_pp(&mut self, move_id: MoveId, cost: u8) -> BattleResult<()> {
        let id = self.id;
        let Some(slot) = self.moves.iter_mut().find(|m| m.move_id == move_id) else {
            return Ok(());
        };
        if slot.pp_used > slot.max_pp {
            return Err(BattleError::ResourceUnderflow {
                combatant: id,
                detail: format!("move {:?} used {} of {}", move_id, slot.pp_used, slot.max_pp),
            });
        }
        slot.pp_used = slot.pp_used.saturating_add(cost).min(slot.max_pp);
        Ok(())
    }

    pub fn reset_turn_data(&mut self) {
        self.turn_data = TurnData::default();
    }

    /// Clears everything that does not survive leaving the field.
    pub fn reset_summon(&mut self, keep_stages: bool) {
        self.summon_data = SummonData::default();
        self.tags.clear();
        self.move_queue.clear();
        if !keep_stages {
            self.stages.reset();
        }
    }
}
