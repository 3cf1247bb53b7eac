// In: src/battle/turn_order.rs

//! Field order and move order.
//!
//! Field order sorts the active combatants by effective speed. Ties are
//! decided by a coin flip from the shared random sequence every time two tied
//! combatants are compared, so the draws depend only on the insertion order
//! of the active list. Trick Room reverses the finished order.
//!
//! Move order then ranks the commands built on top of field order.

use crate::battle::commands::{CommandKind, TurnCommands};
use crate::battle::stats::effective_speed;
use crate::combatant::CombatantId;
use crate::config::CommandPrecedence;
use crate::content::ContentTable;
use crate::errors::BattleResult;
use crate::field::{BattlerIndex, Field};
use crate::rng::RandomSequence;
use std::cmp::Reverse;

/// Active combatants, fastest first.
pub fn field_order(field: &Field, rng: &mut RandomSequence) -> BattleResult<Vec<CombatantId>> {
    let mut ranked: Vec<(CombatantId, u32)> = Vec::new();
    for id in field.active_ids() {
        let speed = effective_speed(field.get(id)?);
        let mut position = ranked.len();
        while position > 0 {
            let (_, ahead_speed) = ranked[position - 1];
            let overtakes = match speed.cmp(&ahead_speed) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => rng.coin_flip("speed tie"),
            };
            if !overtakes {
                break;
            }
            position -= 1;
        }
        ranked.insert(position, (id, speed));
    }

    let mut order: Vec<CombatantId> = ranked.into_iter().map(|(id, _)| id).collect();
    if field.trick_room() {
        order.reverse();
    }
    tracing::debug!(?order, "field order");
    Ok(order)
}

/// A combatant's slot and the position it will act in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedCommand {
    pub combatant: CombatantId,
    pub index: BattlerIndex,
}

/// Ranks this turn's commands: command precedence first, then move priority
/// for fights (other commands count as priority 0), then field order.
/// Skipped commands and combatants without a slot are left out.
pub fn move_order(
    field_order: &[CombatantId],
    field: &Field,
    commands: &TurnCommands,
    precedence: &CommandPrecedence,
    content: &ContentTable,
) -> BattleResult<Vec<OrderedCommand>> {
    let mut keyed = Vec::new();
    for (position, id) in field_order.iter().enumerate() {
        let Some(index) = field.battler_index(*id) else {
            continue;
        };
        let Some(command) = commands.get(index) else {
            continue;
        };
        if command.skip {
            continue;
        }
        let priority = match command.kind {
            CommandKind::Fight { move_id, .. } => content.move_data(move_id)?.priority,
            _ => 0,
        };
        let rank = command.kind.precedence(precedence);
        keyed.push((
            (Reverse(rank), Reverse(priority), position),
            OrderedCommand {
                combatant: *id,
                index,
            },
        ));
    }
    keyed.sort_by_key(|(key, _)| *key);
    Ok(keyed.into_iter().map(|(_, ordered)| ordered).collect())
}
