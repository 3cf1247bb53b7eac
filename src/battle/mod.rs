pub mod ai;
pub mod calculators;
pub mod commands;
pub mod encounter;
pub mod move_effects;
pub mod move_pipeline;
pub mod phases;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod tags;
pub mod turn_order;

#[cfg(test)]
mod tests;
