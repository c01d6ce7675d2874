// Domain layer: arena state, gameplay tuning and simulation systems.

pub mod parties;
pub mod players;
pub mod state;
pub mod systems;
pub mod tuning;

pub use parties::PartyBook;
pub use players::PlayerStore;
pub use state::{
    CombatOutcome, Direction, PartyState, PlayerId, PlayerSnapshot, PlayerState, Projectile,
    ProjectileKind, ProjectileSnapshot, WeaponClass,
};
