// Battle schema - static content definitions
// Moves, abilities, held items, status effects, weather and tag kinds used by
// the phase engine. Everything here is plain data: behaviour lives in the main crate.

pub use abilities::*;
pub use hooks::*;
pub use items::*;
pub use moves::*;
pub use stats::*;
pub use status::*;
pub use tags::*;
pub use types::*;
pub use weather::*;

pub mod abilities;
pub mod hooks;
pub mod items;
pub mod moves;
pub mod stats;
pub mod status;
pub mod tags;
pub mod types;
pub mod weather;
