use crate::domain::tuning::weapon::{MELEE_PULSE_TTL, WeaponTuning};
use crate::domain::{
    CombatOutcome, Direction, PlayerId, PlayerState, PlayerStore, Projectile, ProjectileKind,
    WeaponClass,
};
use std::time::Instant;
use tracing::{debug, info};

/// A shoot command as seen by the combat resolver.
#[derive(Debug, Clone, Copy)]
pub struct ShotRequest {
    pub shooter: PlayerId,
    pub weapon: WeaponClass,
    pub direction: Option<Direction>,
    pub now: Instant,
}

/// Applies `damage` to a live victim. Dead victims are left untouched, so a kill is reported
/// once per life.
pub fn apply_damage(
    victim: &mut PlayerState,
    killer: PlayerId,
    damage: i32,
) -> Option<CombatOutcome> {
    if victim.dead {
        return None;
    }

    victim.hp = (victim.hp - damage).max(0);
    if victim.hp == 0 {
        victim.dead = true;
        info!(killer_id = killer, victim_id = victim.id, "player killed");
        Some(CombatOutcome::Killed {
            killer,
            victim: victim.id,
        })
    } else {
        debug!(
            shooter_id = killer,
            victim_id = victim.id,
            victim_hp = victim.hp,
            "player hit"
        );
        Some(CombatOutcome::Hit {
            victim: victim.id,
            hp: victim.hp,
        })
    }
}

/// Validates and executes a shot.
///
/// Returns `None` when the shot is rejected (unknown or dead shooter, cooldown still running,
/// ranged shot without a direction). Accepted melee shots return the damage they dealt; accepted
/// ranged shots return no outcomes and push a projectile for the tick engine.
pub fn shoot(
    players: &mut PlayerStore,
    projectiles: &mut Vec<Projectile>,
    next_projectile_id: &mut u64,
    request: ShotRequest,
) -> Option<Vec<CombatOutcome>> {
    let tuning = WeaponTuning::for_class(request.weapon);

    let shooter = players.get(request.shooter)?;
    if shooter.dead {
        return None;
    }
    let cooling_down = shooter
        .last_shot
        .get(&request.weapon)
        .is_some_and(|last| request.now.saturating_duration_since(*last) < tuning.cooldown);
    if cooling_down {
        return None;
    }
    let (origin_x, origin_y) = (shooter.x, shooter.y);

    let outcomes = match request.weapon {
        WeaponClass::Melee => {
            let mut outcomes = Vec::new();
            for victim in players.iter_mut() {
                if victim.id == request.shooter || victim.dead {
                    continue;
                }
                let distance = (victim.x - origin_x).hypot(victim.y - origin_y);
                if distance >= tuning.size {
                    continue;
                }
                outcomes.extend(apply_damage(victim, request.shooter, tuning.damage));
            }

            // Visual only; damage has already been applied above.
            projectiles.push(Projectile {
                id: allocate_id(next_projectile_id),
                owner_id: request.shooter,
                kind: ProjectileKind::MeleePulse,
                x: origin_x,
                y: origin_y,
                vx: 0.0,
                vy: 0.0,
                size: tuning.size,
                damage: tuning.damage,
                ttl: Some(MELEE_PULSE_TTL),
            });
            outcomes
        }
        WeaponClass::Sniper | WeaponClass::Rapid => {
            let (dir_x, dir_y) = request.direction?.unit();
            projectiles.push(Projectile {
                id: allocate_id(next_projectile_id),
                owner_id: request.shooter,
                kind: ProjectileKind::Ballistic,
                x: origin_x,
                y: origin_y,
                vx: dir_x * tuning.speed,
                vy: dir_y * tuning.speed,
                size: tuning.size,
                damage: tuning.damage,
                ttl: None,
            });
            Vec::new()
        }
    };

    if let Some(shooter) = players.get_mut(request.shooter) {
        shooter.last_shot.insert(request.weapon, request.now);
    }

    Some(outcomes)
}

fn allocate_id(next_projectile_id: &mut u64) -> u64 {
    let id = *next_projectile_id;
    *next_projectile_id = next_projectile_id.wrapping_add(1);
    id
}
