// Use-case level inputs/outputs for the arena world task.

use crate::domain::{Direction, PlayerId, PlayerSnapshot, ProjectileSnapshot, WeaponClass};

#[derive(Debug, Clone)]
pub enum GameEvent {
    Connect {
        player_id: PlayerId,
    },
    Disconnect {
        player_id: PlayerId,
    },
    Command {
        player_id: PlayerId,
        command: PlayerCommand,
    },
}

/// Commands a connected client can issue.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    SetName {
        name: String,
    },
    Move {
        x: f32,
        y: f32,
    },
    Shoot {
        weapon: WeaponClass,
        direction: Option<Direction>,
    },
    Respawn,
    CreateParty {
        code: String,
    },
    JoinParty {
        code: String,
    },
    StartMatch {
        code: String,
    },
}

/// Discrete state changes pushed to clients as they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    // Tells a fresh connection which player it controls.
    Identity {
        id: PlayerId,
    },
    CurrentPlayers(Vec<PlayerSnapshot>),
    NewPlayer {
        id: PlayerId,
        x: f32,
        y: f32,
    },
    PlayerMoved(PlayerSnapshot),
    PlayerDisconnected {
        id: PlayerId,
    },
    PlayerHit {
        victim: PlayerId,
        hp: i32,
    },
    PlayerKilled {
        killer: PlayerId,
        victim: PlayerId,
    },
    PlayerRespawned(PlayerSnapshot),
    PartyUpdate {
        code: String,
        leader: PlayerId,
        members: Vec<PlayerSnapshot>,
    },
    MatchStarted {
        members: Vec<PlayerSnapshot>,
    },
}

/// A server event addressed to an explicit set of connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub recipients: Vec<PlayerId>,
    pub event: ServerEvent,
}

/// Full projectile snapshot produced once per tick.
#[derive(Debug, Clone)]
pub struct BulletsUpdate {
    pub tick: u64,
    pub projectiles: Vec<ProjectileSnapshot>,
}
