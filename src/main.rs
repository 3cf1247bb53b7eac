// In: src/main.rs

//! Headless demo: two computer-controlled sides fight a full encounter.
//!
//! Usage: `battle-phases [--seed N] [--double] [--trainer] [--config FILE] [--json]`

use battle_phases::collaborators::{MemoryPersistence, RecordingPresentation};
use battle_phases::combatant::MoveSlot;
use battle_phases::{
    BaseStats, BattleConfig, BattleContext, Combatant, ContentTable, ElementType, Encounter,
    EncounterKind, Field, MoveId, ScoringAi, Side,
};
use std::error::Error;
use std::sync::Arc;

struct Options {
    config: BattleConfig,
    json: bool,
}

fn parse_args() -> Result<Options, Box<dyn Error>> {
    let mut config = BattleConfig::default();
    let mut json = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--double" => config.double = true,
            "--trainer" => config.kind = EncounterKind::Trainer,
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                config.seed = value.parse()?;
            }
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                let source = std::fs::read_to_string(path)?;
                config = BattleConfig::from_ron_str(&source)?;
            }
            other => return Err(format!("unknown argument: {}", other).into()),
        }
    }
    Ok(Options { config, json })
}

fn fighter(
    content: &ContentTable,
    name: &str,
    types: Vec<ElementType>,
    stats: BaseStats,
    moves: &[u16],
) -> Result<Combatant, Box<dyn Error>> {
    let mut slots = Vec::new();
    for id in moves {
        let data = content.move_data(MoveId(*id))?;
        slots.push(MoveSlot::new(data.id, data.pp));
    }
    Ok(Combatant::new(name, 50, types, stats).with_moves(slots))
}

fn stats(hp: u16, attack: u16, defense: u16, sp_attack: u16, sp_defense: u16, speed: u16) -> BaseStats {
    BaseStats {
        hp,
        attack,
        defense,
        sp_attack,
        sp_defense,
        speed,
    }
}

fn build_field(content: &ContentTable, config: &BattleConfig) -> Result<Field, Box<dyn Error>> {
    let mut field = Field::new(config.kind, config.double);
    let player_team = [
        fighter(content, "Pikachu", vec![ElementType::Electric], stats(95, 60, 45, 55, 55, 95), &[85, 98, 86, 104])?,
        fighter(content, "Charmander", vec![ElementType::Fire], stats(99, 57, 48, 65, 55, 70), &[52, 154, 45, 116])?,
        fighter(content, "Machop", vec![ElementType::Fighting], stats(130, 85, 55, 40, 40, 40), &[24, 136, 28, 182])?,
    ];
    let enemy_team = [
        fighter(content, "Diglett", vec![ElementType::Ground], stats(70, 60, 30, 40, 50, 100), &[91, 89, 28, 23])?,
        fighter(content, "Gastly", vec![ElementType::Ghost, ElementType::Poison], stats(90, 40, 35, 95, 40, 85), &[95, 48, 71, 212])?,
        fighter(content, "Snorlax", vec![ElementType::Normal], stats(220, 105, 70, 70, 105, 35), &[33, 63, 105, 14])?,
    ];
    for combatant in player_team {
        field.add_combatant(Side::Player, combatant);
    }
    for combatant in enemy_team {
        field.add_combatant(Side::Enemy, combatant);
    }
    Ok(field)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args()?;
    let content = Arc::new(ContentTable::builtin()?);
    let field = build_field(&content, &options.config)?;
    let seed = options.config.seed;

    let presentation = if options.json {
        RecordingPresentation::new()
    } else {
        RecordingPresentation::new().echoing()
    };
    let ctx = BattleContext::new(
        field,
        content,
        options.config,
        Box::new(presentation),
        Box::new(ScoringAi::new(seed.wrapping_add(1))),
        Box::new(ScoringAi::new(seed.wrapping_add(2))),
        Box::new(MemoryPersistence::new()),
    );

    let mut encounter = Encounter::new(ctx);
    let outcome = encounter.run().await?;
    tracing::info!(?outcome, "demo finished");

    if options.json {
        println!("{}", encounter.context().events.to_json()?);
    } else {
        println!("Outcome: {:?} after {} turns", outcome, encounter.context().field.turn);
    }
    Ok(())
}
