// Player State Store: the single table of live players, keyed by connection id.

use crate::domain::tuning::player::PlayerTuning;
use crate::domain::{PlayerId, PlayerState};
use std::collections::BTreeMap;

/// Ordered by id so collision scans visit players in a stable order.
#[derive(Debug, Default)]
pub struct PlayerStore {
    players: BTreeMap<PlayerId, PlayerState>,
    tuning: PlayerTuning,
}

impl PlayerStore {
    pub fn new(tuning: PlayerTuning) -> Self {
        Self {
            players: BTreeMap::new(),
            tuning,
        }
    }

    pub fn tuning(&self) -> &PlayerTuning {
        &self.tuning
    }

    /// Inserts a spawn-default player. An id that is already present keeps its state.
    pub fn insert(&mut self, id: PlayerId) -> &PlayerState {
        let tuning = self.tuning;
        self.players
            .entry(id)
            .or_insert_with(|| PlayerState::spawn(id, &tuning))
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<PlayerState> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        self.players.values_mut()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Returns false when the player is unknown or the name is blank.
    pub fn set_name(&mut self, id: PlayerId, name: &str) -> bool {
        let max_len = self.tuning.max_name_len;
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }

        player.name = trimmed.chars().take(max_len).collect();
        true
    }

    /// Overwrites the position of a live player. Unknown and dead players are ignored.
    pub fn move_to(&mut self, id: PlayerId, x: f32, y: f32) -> Option<&PlayerState> {
        let player = self.players.get_mut(&id)?;
        if player.dead {
            return None;
        }

        player.x = x;
        player.y = y;
        Some(player)
    }

    /// Back to the spawn point at full health, whatever the prior state.
    pub fn respawn(&mut self, id: PlayerId) -> Option<&PlayerState> {
        let tuning = self.tuning;
        let player = self.players.get_mut(&id)?;
        player.x = tuning.spawn_x;
        player.y = tuning.spawn_y;
        player.hp = tuning.max_hp;
        player.dead = false;
        Some(player)
    }
}
