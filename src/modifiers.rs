//! Held items and side-wide passives with bounded stacks.

use crate::combatant::{Combatant, CombatantId, Side};
use schema::{BerryKind, ModifierKind, TagKind};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierOwner {
    Combatant(CombatantId),
    Side(Side),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub owner: ModifierOwner,
    pub stack_count: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ModifierSet(Vec<Modifier>);

impl ModifierSet {
    /// Adds stacks up to the kind's maximum and returns the resulting count.
    pub fn add(&mut self, kind: ModifierKind, owner: ModifierOwner, count: u8) -> u8 {
        let max = kind.max_stack();
        if let Some(existing) = self
            .0
            .iter_mut()
            .find(|m| m.kind == kind && m.owner == owner)
        {
            existing.stack_count = existing.stack_count.saturating_add(count).min(max);
            return existing.stack_count;
        }
        let stack_count = count.min(max);
        if stack_count > 0 {
            self.0.push(Modifier {
                kind,
                owner,
                stack_count,
            });
        }
        stack_count
    }

    pub fn stack_of(&self, kind: ModifierKind, owner: ModifierOwner) -> u8 {
        self.0
            .iter()
            .find(|m| m.kind == kind && m.owner == owner)
            .map(|m| m.stack_count)
            .unwrap_or(0)
    }

    pub fn held(&self, id: CombatantId, kind: ModifierKind) -> u8 {
        self.stack_of(kind, ModifierOwner::Combatant(id))
    }

    /// Uses up one stack; the modifier disappears when none are left.
    pub fn consume(&mut self, kind: ModifierKind, owner: ModifierOwner) -> bool {
        let Some(position) = self
            .0
            .iter()
            .position(|m| m.kind == kind && m.owner == owner)
        else {
            return false;
        };
        self.0[position].stack_count -= 1;
        if self.0[position].stack_count == 0 {
            self.0.remove(position);
        }
        true
    }

    /// Kinds held by one combatant, in the order they were first gained.
    pub fn held_kinds(&self, id: CombatantId) -> Vec<ModifierKind> {
        self.0
            .iter()
            .filter(|m| m.owner == ModifierOwner::Combatant(id))
            .map(|m| m.kind)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.0.iter()
    }
}

/// Whether a held berry would activate for this combatant right now.
pub fn berry_applies(berry: BerryKind, combatant: &Combatant) -> bool {
    let pinch = combatant.hp_ratio() < 0.25;
    match berry {
        BerryKind::Sitrus => combatant.hp_ratio() < 0.5,
        BerryKind::Lum => combatant.status.is_some() || combatant.has_tag(TagKind::Confused),
        BerryKind::Lansat => pinch && !combatant.has_tag(TagKind::CritBoost),
        BerryKind::Starf => pinch,
        other => match other.pinch_stat() {
            Some(stat) => pinch && combatant.stages.clamped_delta(stat, 1) > 0,
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{BaseStats, ElementType};

    #[rstest]
    #[case(ModifierKind::TurnHeal, 10, 4)]
    #[case(ModifierKind::InstantRevive, 3, 1)]
    #[case(ModifierKind::Berry(BerryKind::Lum), 5, 2)]
    fn stacks_are_capped_per_kind(#[case] kind: ModifierKind, #[case] added: u8, #[case] expected: u8) {
        let mut set = ModifierSet::default();
        let owner = ModifierOwner::Combatant(CombatantId(0));
        set.add(kind, owner, 1);
        assert_eq!(set.add(kind, owner, added), expected);
    }

    #[test]
    fn consuming_the_last_stack_removes_the_modifier() {
        let mut set = ModifierSet::default();
        let owner = ModifierOwner::Combatant(CombatantId(1));
        let berry = ModifierKind::Berry(BerryKind::Sitrus);
        set.add(berry, owner, 2);
        assert!(set.consume(berry, owner));
        assert_eq!(set.stack_of(berry, owner), 1);
        assert!(set.consume(berry, owner));
        assert!(!set.consume(berry, owner));
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn sitrus_waits_for_half_health() {
        let mut c = Combatant::new(
            "Test",
            10,
            vec![ElementType::Normal],
            BaseStats {
                hp: 100,
                ..BaseStats::default()
            },
        );
        c.hp = 50;
        assert!(!berry_applies(BerryKind::Sitrus, &c));
        c.hp = 49;
        assert!(berry_applies(BerryKind::Sitrus, &c));
        assert!(!berry_applies(BerryKind::Salac, &c));
    }
}
