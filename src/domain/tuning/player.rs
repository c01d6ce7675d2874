/// Gameplay tuning for arena players.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Health on spawn and respawn.
    pub max_hp: i32,

    /// Spawn point, also used by respawn.
    pub spawn_x: f32,
    pub spawn_y: f32,

    /// Edge length of the square hitbox anchored at the player position.
    pub hitbox: f32,

    /// Name assigned until the client sends `setName`.
    pub default_name: &'static str,

    /// Longest accepted display name, in characters.
    pub max_name_len: usize,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_hp: 100,
            spawn_x: 400.0,
            spawn_y: 300.0,
            hitbox: 20.0,
            default_name: "Anonymous",
            max_name_len: 32,
        }
    }
}
