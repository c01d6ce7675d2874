// Domain-level arena entities and snapshot types.

use crate::domain::tuning::player::PlayerTuning;
use std::collections::HashMap;
use std::time::Instant;

/// Stable identifier of a live connection; doubles as the player id.
pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponClass {
    Sniper,
    Rapid,
    Melee,
}

impl WeaponClass {
    /// Maps the numeric weapon slot used on the wire (1, 2, 3).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Sniper),
            2 => Some(Self::Rapid),
            3 => Some(Self::Melee),
            _ => None,
        }
    }
}

/// Cardinal aim direction, in screen coordinates (+y points down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Resolves the `i`/`j`/`k`/`l` aim keys.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "i" => Some(Self::Up),
            "j" => Some(Self::Left),
            "k" => Some(Self::Down),
            "l" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn unit(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Left => (-1.0, 0.0),
            Self::Down => (0.0, 1.0),
            Self::Right => (1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub hp: i32,
    // Tracked explicitly so kill logic fires once per life.
    pub dead: bool,
    // Timestamp of the last accepted shot per weapon class.
    pub last_shot: HashMap<WeaponClass, Instant>,
}

impl PlayerState {
    /// Fresh player at the spawn point.
    pub fn spawn(id: PlayerId, tuning: &PlayerTuning) -> Self {
        Self {
            id,
            name: tuning.default_name.to_string(),
            x: tuning.spawn_x,
            y: tuning.spawn_y,
            hp: tuning.max_hp,
            dead: false,
            last_shot: HashMap::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Ballistic,
    MeleePulse,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u64,
    pub owner_id: PlayerId,
    pub kind: ProjectileKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Edge length of the square collision box anchored at (x, y).
    pub size: f32,
    pub damage: i32,
    /// Remaining ticks; only meaningful for melee pulses.
    pub ttl: Option<u32>,
}

/// Damage resolution result, reported to clients as hit or kill events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatOutcome {
    Hit { victim: PlayerId, hp: i32 },
    Killed { killer: PlayerId, victim: PlayerId },
}

#[derive(Debug, Clone)]
pub struct PartyState {
    pub code: String,
    pub leader: PlayerId,
    // Ordered, unique.
    pub members: Vec<PlayerId>,
}

impl PartyState {
    pub fn new(code: String, leader: PlayerId) -> Self {
        Self {
            code,
            leader,
            members: vec![leader],
        }
    }

    pub fn has_member(&self, player_id: PlayerId) -> bool {
        self.members.contains(&player_id)
    }
}

/// Player data as published to clients (no cooldown bookkeeping).
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub hp: i32,
    pub dead: bool,
}

impl From<&PlayerState> for PlayerSnapshot {
    fn from(p: &PlayerState) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            x: p.x,
            y: p.y,
            hp: p.hp,
            dead: p.dead,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub owner_id: PlayerId,
    pub kind: ProjectileKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub damage: i32,
    pub ttl: Option<u32>,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            kind: p.kind,
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            size: p.size,
            damage: p.damage,
            ttl: p.ttl,
        }
    }
}
