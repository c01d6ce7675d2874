// Use cases layer: application workflows for the arena server.

pub mod arena;
pub mod game;
pub mod handle;
pub mod ports;
pub mod types;

pub use arena::Arena;
pub use handle::{ArenaError, ArenaHandle, ArenaSettings};
pub use ports::Outbox;
pub use types::{BulletsUpdate, Dispatch, GameEvent, PlayerCommand, ServerEvent};
