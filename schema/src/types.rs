use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum ElementType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    /// Used for self-inflicted confusion damage and fixed-damage effects.
    Typeless,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Per attacking type: (super effective against, resisted by, no effect on).
type Matchups = (&'static [ElementType], &'static [ElementType], &'static [ElementType]);

impl ElementType {
    fn matchups(self) -> Matchups {
        use ElementType::*;
        match self {
            Normal => (&[], &[Rock], &[Ghost]),
            Fighting => (&[Normal, Rock, Ice], &[Flying, Poison, Bug, Psychic], &[Ghost]),
            Flying => (&[Fighting, Bug, Grass], &[Rock, Electric], &[]),
            Poison => (&[Bug, Grass], &[Poison, Ground, Rock, Ghost], &[]),
            Ground => (&[Poison, Rock, Fire, Electric], &[Bug, Grass], &[Flying]),
            Rock => (&[Flying, Bug, Fire, Ice], &[Fighting, Ground], &[]),
            Bug => (&[Poison, Grass, Psychic], &[Fighting, Flying, Ghost, Fire], &[]),
            Ghost => (&[Ghost, Psychic], &[], &[Normal]),
            Fire => (&[Bug, Grass, Ice], &[Rock, Fire, Water, Dragon], &[]),
            Water => (&[Ground, Rock, Fire], &[Water, Grass, Dragon], &[]),
            Grass => (&[Ground, Rock, Water], &[Flying, Poison, Bug, Fire, Grass, Dragon], &[]),
            Electric => (&[Flying, Water], &[Grass, Electric, Dragon], &[Ground]),
            Psychic => (&[Fighting, Poison], &[Psychic], &[]),
            Ice => (&[Flying, Ground, Grass, Dragon], &[Water, Ice], &[]),
            Dragon => (&[Dragon], &[], &[]),
            Typeless => (&[], &[], &[]),
        }
    }

    /// Multiplier of an attacking type against a single defending type:
    /// 2.0, 1.0, 0.5 or 0.0.
    pub fn effectiveness_against(self, defending: ElementType) -> f32 {
        let (strong, weak, immune) = self.matchups();
        if immune.contains(&defending) {
            0.0
        } else if strong.contains(&defending) {
            2.0
        } else if weak.contains(&defending) {
            0.5
        } else {
            1.0
        }
    }

    /// Combined multiplier against every type of a defender.
    pub fn effectiveness(self, defending: &[ElementType]) -> f32 {
        defending
            .iter()
            .map(|t| self.effectiveness_against(*t))
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::ElementType::*;
    use rstest::rstest;

    #[rstest]
    #[case(Electric, vec![Ground], 0.0)]
    #[case(Water, vec![Fire], 2.0)]
    #[case(Fire, vec![Water], 0.5)]
    #[case(Ice, vec![Ground, Flying], 4.0)]
    #[case(Typeless, vec![Ghost], 1.0)]
    fn effectiveness_multiplies_across_types(
        #[case] attacking: super::ElementType,
        #[case] defending: Vec<super::ElementType>,
        #[case] expected: f32,
    ) {
        assert_eq!(attacking.effectiveness(&defending), expected);
    }
}
