// Wire protocol DTOs and conversions for arena client messages.
// Ids travel as decimal strings; everything else maps one-to-one onto use-case types.

use crate::domain::{Direction, PlayerSnapshot, ProjectileKind, ProjectileSnapshot, WeaponClass};
use crate::use_cases::{BulletsUpdate, PlayerCommand, ServerEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent before anything else.
    Identity { id: String },
    // Full player table, sent once to a freshly connected client.
    CurrentPlayers(BTreeMap<String, PlayerStateDto>),
    NewPlayer { id: String, x: f32, y: f32 },
    PlayerMoved(PlayerStateDto),
    PlayerDisconnected(String),
    PlayerHit { victim: String, hp: i32 },
    PlayerKilled { killer: String, victim: String },
    PlayerRespawned(RespawnDto),
    // Every live projectile, once per tick.
    BulletsUpdate(Vec<ProjectileDto>),
    PartyUpdate {
        code: String,
        leader: String,
        members: Vec<PlayerStateDto>,
    },
    MatchStarted { members: Vec<PlayerStateDto> },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    SetName { name: String },
    Move { x: f32, y: f32 },
    Shoot(ShootPayload),
    Respawn {},
    CreateParty { code: String },
    JoinParty { code: String },
    StartMatch { code: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShootPayload {
    /// Weapon slot: 1 sniper, 2 rapid, 3 melee.
    pub weapon: u8,
    /// Aim key (`i`/`j`/`k`/`l`); melee ignores it.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Why a well-formed client message was not turned into a command.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidCommand {
    UnknownWeapon(u8),
    UnknownDirection(String),
    NonFiniteCoordinates,
}

impl fmt::Display for InvalidCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownWeapon(code) => write!(f, "unknown weapon code {code}"),
            Self::UnknownDirection(dir) => write!(f, "unknown direction {dir:?}"),
            Self::NonFiniteCoordinates => write!(f, "non-finite coordinates"),
        }
    }
}

impl TryFrom<ClientMessage> for PlayerCommand {
    type Error = InvalidCommand;

    fn try_from(msg: ClientMessage) -> Result<Self, Self::Error> {
        Ok(match msg {
            ClientMessage::SetName { name } => PlayerCommand::SetName { name },
            ClientMessage::Move { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(InvalidCommand::NonFiniteCoordinates);
                }
                PlayerCommand::Move { x, y }
            }
            ClientMessage::Shoot(payload) => {
                let weapon = WeaponClass::from_code(payload.weapon)
                    .ok_or(InvalidCommand::UnknownWeapon(payload.weapon))?;
                let direction = match payload.dir {
                    None => None,
                    Some(dir) => Some(
                        Direction::from_symbol(&dir).ok_or(InvalidCommand::UnknownDirection(dir))?,
                    ),
                };
                PlayerCommand::Shoot { weapon, direction }
            }
            ClientMessage::Respawn {} => PlayerCommand::Respawn,
            ClientMessage::CreateParty { code } => PlayerCommand::CreateParty { code },
            ClientMessage::JoinParty { code } => PlayerCommand::JoinParty { code },
            ClientMessage::StartMatch { code } => PlayerCommand::StartMatch { code },
        })
    }
}

/// Player record as clients see it.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub hp: i32,
    pub dead: bool,
}

impl From<&PlayerSnapshot> for PlayerStateDto {
    fn from(player: &PlayerSnapshot) -> Self {
        Self {
            id: player.id.to_string(),
            name: player.name.clone(),
            x: player.x,
            y: player.y,
            hp: player.hp,
            dead: player.dead,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RespawnDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub hp: i32,
    pub dead: bool,
}

impl From<&PlayerSnapshot> for RespawnDto {
    fn from(player: &PlayerSnapshot) -> Self {
        Self {
            id: player.id.to_string(),
            x: player.x,
            y: player.y,
            hp: player.hp,
            dead: player.dead,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectileKindDto {
    Ballistic,
    MeleePulse,
}

impl From<ProjectileKind> for ProjectileKindDto {
    fn from(kind: ProjectileKind) -> Self {
        match kind {
            ProjectileKind::Ballistic => Self::Ballistic,
            ProjectileKind::MeleePulse => Self::MeleePulse,
        }
    }
}

/// Flattened projectile state for the per-tick snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectileDto {
    pub id: String,
    pub owner: String,
    pub kind: ProjectileKindDto,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub damage: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl From<&ProjectileSnapshot> for ProjectileDto {
    fn from(p: &ProjectileSnapshot) -> Self {
        Self {
            id: p.id.to_string(),
            owner: p.owner_id.to_string(),
            kind: p.kind.into(),
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

fn members_dto(members: &[PlayerSnapshot]) -> Vec<PlayerStateDto> {
    members.iter().map(PlayerStateDto::from).collect()
}

impl From<&ServerEvent> for ServerMessage {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::Identity { id } => ServerMessage::Identity { id: id.to_string() },
            ServerEvent::CurrentPlayers(players) => ServerMessage::CurrentPlayers(
                players
                    .iter()
                    .map(|p| (p.id.to_string(), PlayerStateDto::from(p)))
                    .collect(),
            ),
            ServerEvent::NewPlayer { id, x, y } => ServerMessage::NewPlayer {
                id: id.to_string(),
                x: *x,
                y: *y,
            },
            ServerEvent::PlayerMoved(player) => ServerMessage::PlayerMoved(player.into()),
            ServerEvent::PlayerDisconnected { id } => {
                ServerMessage::PlayerDisconnected(id.to_string())
            }
            ServerEvent::PlayerHit { victim, hp } => ServerMessage::PlayerHit {
                victim: victim.to_string(),
                hp: *hp,
            },
            ServerEvent::PlayerKilled { killer, victim } => ServerMessage::PlayerKilled {
                killer: killer.to_string(),
                victim: victim.to_string(),
            },
            ServerEvent::PlayerRespawned(player) => ServerMessage::PlayerRespawned(player.into()),
            ServerEvent::PartyUpdate {
                code,
                leader,
                members,
            } => ServerMessage::PartyUpdate {
                code: code.clone(),
                leader: leader.to_string(),
                members: members_dto(members),
            },
            ServerEvent::MatchStarted { members } => ServerMessage::MatchStarted {
                members: members_dto(members),
            },
        }
    }
}

impl From<BulletsUpdate> for ServerMessage {
    fn from(update: BulletsUpdate) -> Self {
        ServerMessage::BulletsUpdate(update.projectiles.iter().map(ProjectileDto::from).collect())
    }
}
