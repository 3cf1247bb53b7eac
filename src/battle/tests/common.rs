use crate::battle::state::{BattleContext, BattleEvent};
use crate::collaborators::{MemoryPersistence, RecordingPresentation, ScriptedCommands};
use crate::combatant::{Combatant, CombatantId, MoveSlot, Side, StatusState};
use crate::config::{BattleConfig, EncounterKind};
use crate::content::ContentTable;
use crate::field::{BattlerIndex, Field};
use crate::rng::RandomSequence;
use schema::{AbilityId, BaseStats, ElementType, MoveId, StatusEffect};
use std::sync::Arc;

/// The shipped catalog. Panics if it fails to load, which would be a bug in
/// the catalog itself.
pub fn builtin_content() -> Arc<ContentTable> {
    match ContentTable::builtin() {
        Ok(content) => Arc::new(content),
        Err(err) => panic!("Failed to load builtin content: {}", err),
    }
}

/// A builder for creating test combatants with common defaults.
///
/// # Example
/// ```ignore
/// let combatant = TestCombatantBuilder::new("A", 50)
///     .with_moves(vec![MoveId(33)])
///     .with_status(StatusEffect::Paralysis)
///     .build();
/// ```
pub struct TestCombatantBuilder {
    name: String,
    level: u8,
    stats: BaseStats,
    types: Vec<ElementType>,
    moves: Vec<MoveId>,
    ability: Option<AbilityId>,
    status: Option<StatusEffect>,
}

impl TestCombatantBuilder {
    pub fn new(name: &str, level: u8) -> Self {
        Self {
            name: name.to_string(),
            level,
            stats: BaseStats {
                hp: 100,
                attack: 50,
                defense: 50,
                sp_attack: 50,
                sp_defense: 50,
                speed: 50,
            },
            types: vec![ElementType::Normal],
            moves: Vec::new(),
            ability: None,
            status: None,
        }
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.stats.speed = speed;
        self
    }

    /// Sets the maximum HP; the combatant starts at full health.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.stats.hp = hp;
        self
    }

    pub fn with_moves(mut self, moves: Vec<MoveId>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_ability(mut self, ability: AbilityId) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn with_status(mut self, status: StatusEffect) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_types(mut self, types: Vec<ElementType>) -> Self {
        self.types = types;
        self
    }

    pub fn build(self) -> Combatant {
        let content = builtin_content();
        let slots = self
            .moves
            .iter()
            .map(|id| {
                let max_pp = content.move_data(*id).map(|m| m.pp).unwrap_or(10);
                MoveSlot::new(*id, max_pp)
            })
            .collect();
        let mut combatant =
            Combatant::new(self.name, self.level, self.types, self.stats).with_moves(slots);
        combatant.ability = self.ability;
        combatant.status = self.status.map(|effect| StatusState {
            effect,
            turn_count: 0,
            cure_turn: 0,
        });
        combatant
    }
}

fn send_out(field: &mut Field, index: BattlerIndex, id: CombatantId) {
    if let Err(err) = field.send_out(index, id, false) {
        panic!("Failed to send out {:?}: {}", id, err);
    }
}

/// A wild singles field with `a` and `b` facing each other.
pub fn duel(a: Combatant, b: Combatant) -> (Field, CombatantId, CombatantId) {
    let mut field = Field::new(EncounterKind::Wild, false);
    let a = field.add_combatant(Side::Player, a);
    let b = field.add_combatant(Side::Enemy, b);
    send_out(&mut field, BattlerIndex::PLAYER, a);
    send_out(&mut field, BattlerIndex::ENEMY, b);
    (field, a, b)
}

/// `duel` with default combatants named "A" and "B".
pub fn duel_field() -> (Field, CombatantId, CombatantId) {
    duel(
        TestCombatantBuilder::new("A", 50).build(),
        TestCombatantBuilder::new("B", 50).build(),
    )
}

/// A wild doubles field with all four slots filled. The ids come back in
/// slot order: player, player ally, enemy, enemy ally.
pub fn double_field() -> (Field, Vec<CombatantId>) {
    let mut field = Field::new(EncounterKind::Wild, true);
    let mut ids = Vec::new();
    for (index, name) in [
        (BattlerIndex::PLAYER, "A"),
        (BattlerIndex::PLAYER_2, "A2"),
        (BattlerIndex::ENEMY, "B"),
        (BattlerIndex::ENEMY_2, "B2"),
    ] {
        let id = field.add_combatant(index.side(), TestCombatantBuilder::new(name, 50).build());
        send_out(&mut field, index, id);
        ids.push(id);
    }
    (field, ids)
}

/// A context with scripted random outcomes and headless collaborators.
pub fn context_with(field: Field, outcomes: Vec<u32>) -> BattleContext {
    let config = BattleConfig {
        kind: field.kind,
        double: field.double,
        ..BattleConfig::default()
    };
    BattleContext::new(
        field,
        builtin_content(),
        config,
        Box::new(RecordingPresentation::new()),
        Box::new(ScriptedCommands::default()),
        Box::new(ScriptedCommands::default()),
        Box::new(MemoryPersistence::new()),
    )
    .with_rng(RandomSequence::scripted(outcomes))
}

/// Every message shown so far, in order.
pub fn messages(ctx: &BattleContext) -> Vec<String> {
    ctx.events
        .events()
        .iter()
        .filter_map(|event| match event {
            BattleEvent::Message { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// How often an event matching `predicate` was emitted.
pub fn count_events(ctx: &BattleContext, predicate: impl Fn(&BattleEvent) -> bool) -> usize {
    ctx.events.events().iter().filter(|e| predicate(e)).count()
}
