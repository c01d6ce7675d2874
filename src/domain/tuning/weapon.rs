use crate::domain::WeaponClass;
use std::time::Duration;

/// Gameplay tuning for a single weapon class.
#[derive(Debug, Clone, Copy)]
pub struct WeaponTuning {
    /// Minimum time between two accepted shots of this class.
    pub cooldown: Duration,

    /// Health removed per hit.
    pub damage: i32,

    /// Projectile travel per tick, in world units. Zero for melee.
    pub speed: f32,

    /// Projectile box edge for ranged weapons, pulse radius for melee.
    pub size: f32,
}

impl WeaponTuning {
    pub fn for_class(class: WeaponClass) -> Self {
        match class {
            // Travels the arena diagonal in one tick, so a shot settles on the next tick.
            WeaponClass::Sniper => Self {
                cooldown: Duration::from_millis(1000),
                damage: 75,
                speed: 1000.0,
                size: 4.0,
            },
            WeaponClass::Rapid => Self {
                cooldown: Duration::from_millis(150),
                damage: 20,
                speed: 12.0,
                size: 6.0,
            },
            WeaponClass::Melee => Self {
                cooldown: Duration::from_millis(500),
                damage: 100,
                speed: 0.0,
                size: 40.0,
            },
        }
    }
}

/// Ticks a melee pulse stays visible in projectile snapshots.
pub const MELEE_PULSE_TTL: u32 = 1;
