use serde::{Deserialize, Serialize};

use crate::{ArenaTagKind, BattleStat, ElementType, StatusEffect, TagKind};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveId(pub u16);

impl MoveId {
    /// Fallback move used when nothing else is usable.
    pub const STRUGGLE: MoveId = MoveId(165);
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

/// Which battlers a move addresses, relative to its user.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveTarget {
    User,
    /// One adjacent battler, ally or enemy.
    NearOther,
    NearEnemy,
    AllNearEnemies,
    AllNearOthers,
    NearAlly,
    UserSide,
    EnemySide,
    /// The whole field (e.g. Gravity).
    BothSides,
}

impl MoveTarget {
    /// Targets that address several battlers and never prompt for a choice.
    pub fn is_spread(self) -> bool {
        matches!(
            self,
            MoveTarget::AllNearEnemies
                | MoveTarget::AllNearOthers
                | MoveTarget::UserSide
                | MoveTarget::EnemySide
                | MoveTarget::BothSides
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MoveFlags {
    #[serde(default)]
    pub contact: bool,
    #[serde(default)]
    pub ignore_protect: bool,
    #[serde(default)]
    pub one_hit_ko: bool,
    /// Hiding tags this move still reaches (Earthquake vs. Dig).
    #[serde(default)]
    pub hits_hidden: Vec<TagKind>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiHit {
    Fixed(u8),
    /// Two to five strikes, weighted towards the low end.
    TwoToFive,
}

/// Points at which effect attributes run.
///
/// The first five belong to move resolution. The rest are reactive stages of
/// abilities and held items: the holder runs as the effect's user and the
/// other party, if any, as its target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriggerStage {
    /// Before any hit check; may override the whole move.
    PreApply,
    PostApplySelf,
    PostApplyTarget,
    Hit,
    Miss,
    /// The holder's strike landed. The defender is the target.
    PostAttack,
    /// The holder was struck. The attacker is the target.
    PostDefend,
    /// The holder finished a move.
    PostMove,
    /// An opponent pays for a move. The mover is the target.
    MoveCost,
    /// Someone else is about to lower the holder's stats.
    PreStatChange,
    /// The holder is about to faint.
    PreFaint,
    /// The holder entered the field.
    PostSummon,
    /// The holder is about to take weather damage.
    PreWeatherDamage,
    TurnEnd,
}

/// Declarative description of one effect fragment. Compiled into an
/// executable attribute by the engine's effect registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum EffectKind {
    Damage,
    StatChange {
        stats: Vec<BattleStat>,
        levels: i8,
        self_target: bool,
        #[serde(default = "always")]
        chance: u8,
    },
    Status {
        status: StatusEffect,
        #[serde(default = "always")]
        chance: u8,
    },
    Flinch {
        chance: u8,
    },
    AddTag {
        tag: TagKind,
        self_target: bool,
        #[serde(default = "always")]
        chance: u8,
    },
    Recharge,
    /// Two-turn move: the first turn charges (optionally hiding the user).
    Charge {
        hide: Option<TagKind>,
        text: String,
    },
    Recoil {
        divisor: u16,
    },
    Drain {
        divisor: u16,
    },
    Heal {
        divisor: u16,
    },
    ArenaTag {
        kind: ArenaTagKind,
        turns: u8,
    },
    CrashDamage {
        divisor: u16,
    },
    Disable {
        turns: u8,
    },
}

fn always() -> u8 {
    100
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EffectSpec {
    pub stage: TriggerStage,
    #[serde(default)]
    pub order: i8,
    pub kind: EffectKind,
}

impl EffectSpec {
    pub fn new(stage: TriggerStage, kind: EffectKind) -> Self {
        Self {
            stage,
            order: 0,
            kind,
        }
    }

    pub fn ordered(mut self, order: i8) -> Self {
        self.order = order;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveData {
    pub id: MoveId,
    pub name: String,
    pub element: ElementType,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u16,
    /// `None` never misses.
    pub accuracy: Option<u8>,
    pub pp: u8,
    #[serde(default)]
    pub priority: i8,
    pub target: MoveTarget,
    #[serde(default)]
    pub flags: MoveFlags,
    #[serde(default)]
    pub multi_hit: Option<MultiHit>,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

impl MoveData {
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status
    }

    pub fn hits_through(&self, tag: TagKind) -> bool {
        self.flags.hits_hidden.contains(&tag)
    }

    pub fn is_charge_move(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e.kind, EffectKind::Charge { .. }))
    }
}
