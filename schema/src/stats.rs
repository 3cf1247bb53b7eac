use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Stats that carry a temporary stage in battle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display,
)]
pub enum BattleStat {
    Attack,
    Defense,
    #[strum(serialize = "Sp. Atk")]
    SpAttack,
    #[strum(serialize = "Sp. Def")]
    SpDefense,
    Speed,
    #[strum(serialize = "accuracy")]
    Accuracy,
    #[strum(serialize = "evasiveness")]
    Evasion,
}

impl BattleStat {
    pub const COUNT: usize = 7;

    /// The five stats a random stat boost (e.g. a Starf berry) may pick from.
    pub const BOOSTABLE: [BattleStat; 5] = [
        BattleStat::Attack,
        BattleStat::Defense,
        BattleStat::SpAttack,
        BattleStat::SpDefense,
        BattleStat::Speed,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

impl BaseStats {
    /// Raw value of a stat; accuracy and evasion have no raw value and return 0.
    pub fn get(&self, stat: BattleStat) -> u16 {
        match stat {
            BattleStat::Attack => self.attack,
            BattleStat::Defense => self.defense,
            BattleStat::SpAttack => self.sp_attack,
            BattleStat::SpDefense => self.sp_defense,
            BattleStat::Speed => self.speed,
            BattleStat::Accuracy | BattleStat::Evasion => 0,
        }
    }
}
