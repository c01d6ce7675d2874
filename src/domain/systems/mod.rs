// Simulation systems that mutate the player store and projectile list.

pub mod combat;
pub mod projectiles;
