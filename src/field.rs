use crate::combatant::{Combatant, CombatantId, Side};
use crate::config::EncounterKind;
use crate::errors::{BattleError, BattleResult};
use crate::modifiers::ModifierSet;
use schema::{ArenaTagKind, WeatherKind};
use serde::{Deserialize, Serialize};

/// Field slot address: 0-1 are the player's slots, 2-3 the enemy's.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BattlerIndex(pub u8);

impl BattlerIndex {
    pub const PLAYER: BattlerIndex = BattlerIndex(0);
    pub const PLAYER_2: BattlerIndex = BattlerIndex(1);
    pub const ENEMY: BattlerIndex = BattlerIndex(2);
    pub const ENEMY_2: BattlerIndex = BattlerIndex(3);

    pub fn new(side: Side, slot: usize) -> Self {
        BattlerIndex((side.index() * 2 + slot.min(1)) as u8)
    }

    pub fn side(self) -> Side {
        if self.0 < 2 {
            Side::Player
        } else {
            Side::Enemy
        }
    }

    pub fn slot(self) -> usize {
        usize::from(self.0 % 2)
    }

    pub fn all() -> [BattlerIndex; 4] {
        [Self::PLAYER, Self::PLAYER_2, Self::ENEMY, Self::ENEMY_2]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArenaTag {
    pub kind: ArenaTagKind,
    /// `None` for field-wide tags.
    pub side: Option<Side>,
    pub turns_left: u8,
    pub source: Option<CombatantId>,
}

/// Both sides of an encounter. Combatants live in an arena addressed by
/// `CombatantId`; the active slots and rosters only hold ids.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    combatants: Vec<Combatant>,
    rosters: [Vec<CombatantId>; 2],
    active: [[Option<CombatantId>; 2]; 2],
    pub kind: EncounterKind,
    pub double: bool,
    pub arena_tags: Vec<ArenaTag>,
    pub modifiers: ModifierSet,
    pub turn: u32,
    pub escape_attempts: u32,
}

impl Field {
    pub fn new(kind: EncounterKind, double: bool) -> Self {
        Self {
            combatants: Vec::new(),
            rosters: [Vec::new(), Vec::new()],
            active: [[None; 2]; 2],
            kind,
            double,
            arena_tags: Vec::new(),
            modifiers: ModifierSet::default(),
            turn: 0,
            escape_attempts: 0,
        }
    }

    pub fn slots_per_side(&self) -> usize {
        if self.double {
            2
        } else {
            1
        }
    }

    /// Registers a combatant in its side's roster. It joins the field only
    /// when sent out.
    pub fn add_combatant(&mut self, side: Side, mut combatant: Combatant) -> CombatantId {
        let id = CombatantId(self.combatants.len() as u32);
        combatant.id = id;
        combatant.side = side;
        combatant.on_field = false;
        self.combatants.push(combatant);
        self.rosters[side.index()].push(id);
        id
    }

    pub fn get(&self, id: CombatantId) -> BattleResult<&Combatant> {
        self.combatants
            .get(id.0 as usize)
            .ok_or(BattleError::UnknownCombatant(id))
    }

    pub fn get_mut(&mut self, id: CombatantId) -> BattleResult<&mut Combatant> {
        self.combatants
            .get_mut(id.0 as usize)
            .ok_or(BattleError::UnknownCombatant(id))
    }

    /// Like `get`, but the combatant must be on the field and conscious.
    pub fn get_active(&self, id: CombatantId) -> BattleResult<&Combatant> {
        let combatant = self.get(id)?;
        if !combatant.is_active() {
            return Err(BattleError::InactiveCombatant(id));
        }
        Ok(combatant)
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn roster(&self, side: Side) -> &[CombatantId] {
        &self.rosters[side.index()]
    }

    /// Conscious roster members not currently on the field.
    pub fn reserves(&self, side: Side) -> Vec<CombatantId> {
        self.rosters[side.index()]
            .iter()
            .copied()
            .filter(|id| {
                self.get(*id)
                    .map(|c| !c.on_field && !c.is_fainted())
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn side_defeated(&self, side: Side) -> bool {
        self.rosters[side.index()]
            .iter()
            .all(|id| self.get(*id).map(|c| c.is_fainted()).unwrap_or(true))
    }

    /// Puts a roster member into a slot, withdrawing whoever was there.
    pub fn send_out(&mut self, index: BattlerIndex, id: CombatantId, keep_stages: bool) -> BattleResult<()> {
        if let Some(previous) = self.at(index) {
            self.get_mut(previous)?.on_field = false;
        }
        let combatant = self.get_mut(id)?;
        combatant.reset_summon(keep_stages);
        combatant.reset_turn_data();
        combatant.on_field = true;
        self.active[index.side().index()][index.slot()] = Some(id);
        Ok(())
    }

    /// Takes a combatant off the field, leaving its slot empty.
    pub fn withdraw(&mut self, id: CombatantId) -> BattleResult<()> {
        if let Some(index) = self.battler_index(id) {
            self.active[index.side().index()][index.slot()] = None;
        }
        self.get_mut(id)?.on_field = false;
        Ok(())
    }

    /// Occupant of a slot, conscious or not.
    pub fn at(&self, index: BattlerIndex) -> Option<CombatantId> {
        self.active
            .get(index.side().index())
            .and_then(|slots| slots.get(index.slot()))
            .copied()
            .flatten()
    }

    pub fn active_at(&self, index: BattlerIndex) -> Option<&Combatant> {
        self.at(index)
            .and_then(|id| self.get(id).ok())
            .filter(|c| c.is_active())
    }

    pub fn battler_index(&self, id: CombatantId) -> Option<BattlerIndex> {
        BattlerIndex::all()
            .into_iter()
            .find(|index| self.at(*index) == Some(id))
    }

    /// Active combatants in battler-index order.
    pub fn active_ids(&self) -> Vec<CombatantId> {
        BattlerIndex::all()
            .into_iter()
            .filter_map(|index| self.active_at(index).map(|c| c.id))
            .collect()
    }

    pub fn active_on_side(&self, side: Side) -> Vec<CombatantId> {
        self.active_ids()
            .into_iter()
            .filter(|id| self.get(*id).map(|c| c.side == side).unwrap_or(false))
            .collect()
    }

    pub fn opponents_of(&self, id: CombatantId) -> Vec<CombatantId> {
        match self.get(id) {
            Ok(c) => self.active_on_side(c.side.opponent()),
            Err(_) => Vec::new(),
        }
    }

    pub fn ally_of(&self, id: CombatantId) -> Option<CombatantId> {
        let side = self.get(id).ok()?.side;
        self.active_on_side(side).into_iter().find(|other| *other != id)
    }

    pub fn has_arena_tag(&self, kind: ArenaTagKind, side: Option<Side>) -> bool {
        self.arena_tags
            .iter()
            .any(|t| t.kind == kind && (side.is_none() || t.side == side))
    }

    /// Adds an arena tag; a tag of the same kind on the same side is not stacked.
    pub fn add_arena_tag(&mut self, tag: ArenaTag) -> bool {
        if self
            .arena_tags
            .iter()
            .any(|t| t.kind == tag.kind && t.side == tag.side)
        {
            return false;
        }
        self.arena_tags.push(tag);
        true
    }

    pub fn remove_arena_tag(&mut self, kind: ArenaTagKind, side: Option<Side>) -> bool {
        let before = self.arena_tags.len();
        self.arena_tags
            .retain(|t| !(t.kind == kind && t.side == side));
        before != self.arena_tags.len()
    }

    pub fn trick_room(&self) -> bool {
        self.has_arena_tag(ArenaTagKind::TrickRoom, None)
    }

    pub fn gravity(&self) -> bool {
        self.has_arena_tag(ArenaTagKind::Gravity, None)
    }

    pub fn weather(&self) -> Option<WeatherKind> {
        self.arena_tags.iter().find_map(|t| match t.kind {
            ArenaTagKind::Weather(weather) => Some(weather),
            _ => None,
        })
    }

    /// Replaces the current weather. Starting the weather already in effect
    /// does nothing and returns false.
    pub fn set_weather(&mut self, weather: WeatherKind, turns: u8, source: Option<CombatantId>) -> bool {
        if self.weather() == Some(weather) {
            return false;
        }
        self.arena_tags
            .retain(|t| !matches!(t.kind, ArenaTagKind::Weather(_)));
        self.arena_tags.push(ArenaTag {
            kind: ArenaTagKind::Weather(weather),
            side: None,
            turns_left: turns,
            source,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema::{BaseStats, ElementType};

    fn mon(name: &str) -> Combatant {
        Combatant::new(
            name,
            10,
            vec![ElementType::Normal],
            BaseStats {
                hp: 30,
                ..BaseStats::default()
            },
        )
    }

    #[test]
    fn battler_indices_map_to_sides_and_slots() {
        assert_eq!(BattlerIndex::new(Side::Player, 1), BattlerIndex::PLAYER_2);
        assert_eq!(BattlerIndex::new(Side::Enemy, 0), BattlerIndex::ENEMY);
        assert_eq!(BattlerIndex::ENEMY_2.side(), Side::Enemy);
        assert_eq!(BattlerIndex::ENEMY_2.slot(), 1);
    }

    #[test]
    fn fainted_combatants_drop_out_of_the_active_list() {
        let mut field = Field::new(EncounterKind::Wild, false);
        let a = field.add_combatant(Side::Player, mon("A"));
        let b = field.add_combatant(Side::Enemy, mon("B"));
        field.send_out(BattlerIndex::PLAYER, a, false).expect("send out");
        field.send_out(BattlerIndex::ENEMY, b, false).expect("send out");
        assert_eq!(field.active_ids(), vec![a, b]);

        field.get_mut(b).expect("b exists").hp = 0;
        assert_eq!(field.active_ids(), vec![a]);
        assert!(field.side_defeated(Side::Enemy));
        assert!(matches!(
            field.get_active(b),
            Err(BattleError::InactiveCombatant(_))
        ));
    }

    #[test]
    fn reserves_exclude_fielded_and_fainted_members() {
        let mut field = Field::new(EncounterKind::Trainer, false);
        let lead = field.add_combatant(Side::Enemy, mon("Lead"));
        let fainted = field.add_combatant(Side::Enemy, mon("Down"));
        let reserve = field.add_combatant(Side::Enemy, mon("Back"));
        field.get_mut(fainted).expect("exists").hp = 0;
        field.send_out(BattlerIndex::ENEMY, lead, false).expect("send out");
        assert_eq!(field.reserves(Side::Enemy), vec![reserve]);
    }

    #[test]
    fn new_weather_replaces_the_old() {
        let mut field = Field::new(EncounterKind::Wild, false);
        assert!(field.set_weather(WeatherKind::Rain, 5, None));
        assert!(!field.set_weather(WeatherKind::Rain, 5, None));
        assert!(field.set_weather(WeatherKind::Sandstorm, 5, None));
        assert_eq!(field.weather(), Some(WeatherKind::Sandstorm));
        assert_eq!(field.arena_tags.len(), 1);
    }
}
