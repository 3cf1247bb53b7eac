use serde::{Deserialize, Serialize};

use crate::HookKind;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbilityId(pub u16);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AbilityData {
    pub id: AbilityId,
    pub name: String,
    pub hooks: Vec<HookKind>,
}

impl AbilityData {
    pub fn has_hook(&self, predicate: impl Fn(&HookKind) -> bool) -> bool {
        self.hooks.iter().any(predicate)
    }
}
