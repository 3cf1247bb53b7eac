// In: src/battle/phases/mod.rs

//! Every concrete phase the scheduler can run, grouped by concern.

mod common;
mod encounter;
mod faint;
mod field;
mod movement;
mod status;
mod turn;

pub use common::{
    apply_damage, queue_faint_check, BerryPhase, CommonAnimPhase, DamagePhase, DamageSource,
    MessagePhase, PokemonHealPhase,
};
pub use encounter::{AttemptCapturePhase, AttemptRunPhase, BattleEndPhase};
pub use faint::{FaintPhase, SummonChoice, SwitchSummonPhase};
pub use field::{PostSummonPhase, WeatherEffectPhase};
pub use movement::{MoveEffectPhase, MoveEndPhase, MovePhase};
pub use status::{ObtainStatusEffectPhase, PostTurnStatusEffectPhase, StatChangePhase};
pub use turn::{CommandPhase, SelectTargetPhase, TurnEndPhase, TurnInitPhase, TurnStartPhase};
