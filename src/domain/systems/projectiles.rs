use crate::domain::systems::combat::apply_damage;
use crate::domain::tuning::arena::ArenaBounds;
use crate::domain::{CombatOutcome, PlayerStore, Projectile, ProjectileKind};

#[derive(Debug, Clone, Copy)]
pub struct ProjectileConfig {
    pub bounds: ArenaBounds,
    /// Player hitbox edge; also the longest distance covered by one collision sub-step.
    pub player_hitbox: f32,
}

enum Flight {
    Flying,
    Spent,
    Hit(Option<CombatOutcome>),
}

use Flight::{Flying, Hit, Spent};

/// Advances every projectile by one tick and resolves collisions.
///
/// Removals are marked during the pass and applied afterwards, so every projectile is processed
/// exactly once per tick.
pub fn tick_projectiles(
    players: &mut PlayerStore,
    projectiles: &mut Vec<Projectile>,
    cfg: ProjectileConfig,
) -> Vec<CombatOutcome> {
    let mut outcomes = Vec::new();
    let mut spent = vec![false; projectiles.len()];

    for (p, spent) in projectiles.iter_mut().zip(spent.iter_mut()) {
        let flight = match p.kind {
            ProjectileKind::MeleePulse => age_pulse(p),
            ProjectileKind::Ballistic => fly(p, players, cfg),
        };

        match flight {
            Flying => {}
            Spent => *spent = true,
            Hit(outcome) => {
                outcomes.extend(outcome);
                *spent = true;
            }
        }
    }

    let mut spent = spent.into_iter();
    projectiles.retain(|_| !spent.next().unwrap_or(false));

    outcomes
}

// A pulse carries no collision; it only has to survive one snapshot.
fn age_pulse(p: &mut Projectile) -> Flight {
    match p.ttl {
        Some(ttl) if ttl > 0 => {
            p.ttl = Some(ttl - 1);
            Flying
        }
        _ => Spent,
    }
}

fn fly(p: &mut Projectile, players: &mut PlayerStore, cfg: ProjectileConfig) -> Flight {
    // Sub-step fast projectiles so they cannot tunnel through a hitbox.
    let travel = p.vx.hypot(p.vy);
    let steps = (travel / cfg.player_hitbox).ceil().max(1.0) as u32;
    let (step_x, step_y) = (p.vx / steps as f32, p.vy / steps as f32);

    for _ in 0..steps {
        p.x += step_x;
        p.y += step_y;

        // First live non-owner in store order, not necessarily the nearest.
        let shot: &Projectile = p;
        let target = players
            .iter_mut()
            .filter(|player| player.id != shot.owner_id && player.is_alive())
            .find(|player| overlaps(shot, player.x, player.y, cfg.player_hitbox));

        if let Some(victim) = target {
            return Hit(apply_damage(victim, shot.owner_id, shot.damage));
        }
    }

    if cfg.bounds.contains(p.x, p.y) {
        Flying
    } else {
        Spent
    }
}

fn overlaps(p: &Projectile, x: f32, y: f32, hitbox: f32) -> bool {
    p.x < x + hitbox && p.x + p.size > x && p.y < y + hitbox && p.y + p.size > y
}
