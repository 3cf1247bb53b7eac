//! Read-only content lookups: move and ability definitions plus the compiled
//! effect attributes of every move, ability and held item.

use crate::battle::move_effects::{compile_effect, compile_hook, EffectAttribute, HookSource};
use crate::combatant::{Combatant, CombatantId};
use crate::errors::{BattleResult, ContentError, ContentResult};
use crate::field::Field;
use schema::{AbilityData, AbilityId, ModifierKind, MoveData, MoveId};
use serde::Deserialize;
use std::collections::HashMap;

const BUILTIN_CONTENT: &str = include_str!("../data/content.ron");

/// A move definition together with its executable effect attributes.
#[derive(Debug, Clone)]
pub struct MoveEntry {
    pub data: MoveData,
    pub attributes: Vec<EffectAttribute>,
}

/// An ability with the attributes compiled from its hooks.
#[derive(Debug, Clone)]
pub struct AbilityEntry {
    pub data: AbilityData,
    pub attributes: Vec<EffectAttribute>,
}

#[derive(Deserialize)]
struct ContentFile {
    moves: Vec<MoveData>,
    #[serde(default)]
    abilities: Vec<AbilityData>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentTable {
    moves: HashMap<MoveId, MoveEntry>,
    abilities: HashMap<AbilityId, AbilityEntry>,
    /// Hand-registered item attributes, on top of the item's own hooks.
    modifier_extras: HashMap<ModifierKind, Vec<EffectAttribute>>,
}

impl ContentTable {
    /// The catalog shipped with the crate.
    pub fn builtin() -> ContentResult<Self> {
        Self::from_ron_str(BUILTIN_CONTENT)
    }

    pub fn from_ron_str(source: &str) -> ContentResult<Self> {
        let file: ContentFile =
            ron::from_str(source).map_err(|e| ContentError::Malformed(e.to_string()))?;
        let mut table = Self::default();
        for data in file.moves {
            table.insert_move(data)?;
        }
        for ability in file.abilities {
            table.insert_ability(ability);
        }
        Ok(table)
    }

    /// Adds a move, compiling its declared effects.
    pub fn insert_move(&mut self, data: MoveData) -> ContentResult<()> {
        if self.moves.contains_key(&data.id) {
            return Err(ContentError::DuplicateMove(data.id));
        }
        let attributes = data.effects.iter().map(compile_effect).collect();
        self.moves.insert(data.id, MoveEntry { data, attributes });
        Ok(())
    }

    /// Adds an ability, compiling its hooks.
    pub fn insert_ability(&mut self, data: AbilityData) {
        let source = HookSource::Ability(data.name.clone());
        let attributes = data
            .hooks
            .iter()
            .filter_map(|hook| compile_hook(hook, &source))
            .collect();
        self.abilities.insert(data.id, AbilityEntry { data, attributes });
    }

    /// Attaches a hand-written attribute to an existing move.
    pub fn register_attribute(&mut self, move_id: MoveId, attribute: EffectAttribute) -> ContentResult<()> {
        let entry = self
            .moves
            .get_mut(&move_id)
            .ok_or(ContentError::MoveNotFound(move_id))?;
        entry.attributes.push(attribute);
        Ok(())
    }

    pub fn register_ability_attribute(
        &mut self,
        ability_id: AbilityId,
        attribute: EffectAttribute,
    ) -> ContentResult<()> {
        let entry = self
            .abilities
            .get_mut(&ability_id)
            .ok_or(ContentError::AbilityNotFound(ability_id))?;
        entry.attributes.push(attribute);
        Ok(())
    }

    pub fn register_modifier_attribute(&mut self, kind: ModifierKind, attribute: EffectAttribute) {
        self.modifier_extras.entry(kind).or_default().push(attribute);
    }

    /// Every attribute an item contributes while held.
    pub fn modifier_attributes(&self, kind: ModifierKind) -> Vec<EffectAttribute> {
        let source = HookSource::Item(kind);
        let mut attributes: Vec<EffectAttribute> = kind
            .hooks()
            .iter()
            .filter_map(|hook| compile_hook(hook, &source))
            .collect();
        if let Some(extra) = self.modifier_extras.get(&kind) {
            attributes.extend(extra.iter().cloned());
        }
        attributes
    }

    /// The ability's attributes followed by those of each held item, in the
    /// order the items were gained.
    pub fn held_attributes(&self, field: &Field, id: CombatantId) -> BattleResult<Vec<EffectAttribute>> {
        let combatant = field.get(id)?;
        let mut attributes = combatant
            .ability
            .and_then(|ability| self.abilities.get(&ability))
            .map(|entry| entry.attributes.clone())
            .unwrap_or_default();
        for kind in field.modifiers.held_kinds(id) {
            attributes.extend(self.modifier_attributes(kind));
        }
        Ok(attributes)
    }

    pub fn move_entry(&self, id: MoveId) -> ContentResult<&MoveEntry> {
        self.moves.get(&id).ok_or(ContentError::MoveNotFound(id))
    }

    pub fn move_data(&self, id: MoveId) -> ContentResult<&MoveData> {
        self.move_entry(id).map(|entry| &entry.data)
    }

    pub fn ability(&self, id: AbilityId) -> ContentResult<&AbilityData> {
        self.abilities
            .get(&id)
            .map(|entry| &entry.data)
            .ok_or(ContentError::AbilityNotFound(id))
    }

    /// The combatant's ability, if it has one the table knows.
    pub fn ability_of(&self, combatant: &Combatant) -> Option<&AbilityData> {
        combatant
            .ability
            .and_then(|id| self.abilities.get(&id))
            .map(|entry| &entry.data)
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}
