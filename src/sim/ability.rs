//! Active abilities
//!
//! Each ability sits on its own cooldown. Cooldowns tick in real seconds,
//! so slow motion does not speed up recharging.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Aabb;
use super::state::{Enemy, Player};
use crate::levels::EnemyType;

pub const PUNCH_RADIUS: f32 = 90.0;
pub const LASER_LENGTH: f32 = 600.0;
pub const LASER_HEIGHT: f32 = 80.0;
/// Velocity set by the rocket
pub const ROCKET_VEL: Vec2 = Vec2::new(1200.0, -900.0);
pub const SLOW_MO_DURATION: f32 = 3.0;
pub const SLOW_MO_SCALE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    Punch,
    Laser,
    Rocket,
    SlowMo,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 4] = [
        AbilityKind::Punch,
        AbilityKind::Laser,
        AbilityKind::Rocket,
        AbilityKind::SlowMo,
    ];

    /// Seconds between uses
    pub fn cooldown(&self) -> f32 {
        match self {
            AbilityKind::Punch => 3.0,
            AbilityKind::Laser => 8.0,
            AbilityKind::Rocket => 10.0,
            AbilityKind::SlowMo => 15.0,
        }
    }

    fn index(&self) -> usize {
        match self {
            AbilityKind::Punch => 0,
            AbilityKind::Laser => 1,
            AbilityKind::Rocket => 2,
            AbilityKind::SlowMo => 3,
        }
    }
}

/// Enemy knocked out by an ability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Takedown {
    pub ty: EnemyType,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Abilities {
    cooldowns: [f32; 4],
    /// Seconds of slow motion left
    pub slow_mo_time: f32,
}

impl Abilities {
    pub fn cooldown(&self, kind: AbilityKind) -> f32 {
        self.cooldowns[kind.index()]
    }

    pub fn is_ready(&self, kind: AbilityKind) -> bool {
        self.cooldown(kind) <= 0.0
    }

    /// Make an ability usable right now
    pub fn reset(&mut self, kind: AbilityKind) {
        self.cooldowns[kind.index()] = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        for cooldown in &mut self.cooldowns {
            *cooldown = (*cooldown - dt).max(0.0);
        }
        self.slow_mo_time = (self.slow_mo_time - dt).max(0.0);
    }

    /// Simulation speed factor
    pub fn time_scale(&self) -> f32 {
        if self.slow_mo_time > 0.0 { SLOW_MO_SCALE } else { 1.0 }
    }

    /// Fire an ability. Returns `None` while it is recharging.
    pub fn activate(
        &mut self,
        kind: AbilityKind,
        player: &mut Player,
        enemies: &mut [Enemy],
    ) -> Option<Vec<Takedown>> {
        if !self.is_ready(kind) {
            return None;
        }
        self.cooldowns[kind.index()] = kind.cooldown();

        let takedowns = match kind {
            AbilityKind::Punch => {
                let center = player.pos;
                knock_out(enemies, |e| e.center().distance(center) <= PUNCH_RADIUS)
            }
            AbilityKind::Laser => {
                let beam = Aabb::new(
                    Vec2::new(player.pos.x, player.pos.y - LASER_HEIGHT * 0.5),
                    Vec2::new(LASER_LENGTH, LASER_HEIGHT),
                );
                knock_out(enemies, |e| e.aabb().overlaps(&beam))
            }
            AbilityKind::Rocket => {
                player.detach();
                player.vel = ROCKET_VEL;
                Vec::new()
            }
            AbilityKind::SlowMo => {
                self.slow_mo_time = SLOW_MO_DURATION;
                Vec::new()
            }
        };
        Some(takedowns)
    }
}

fn knock_out(enemies: &mut [Enemy], hit: impl Fn(&Enemy) -> bool) -> Vec<Takedown> {
    let mut takedowns = Vec::new();
    for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
        if hit(enemy) {
            enemy.health = 0;
            takedowns.push(Takedown {
                ty: enemy.ty(),
                pos: enemy.center(),
            });
        }
    }
    takedowns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::Upgrades;
    use crate::sim::state::EnemyKind;

    fn bird_at(id: u32, center: Vec2) -> Enemy {
        Enemy {
            id,
            kind: EnemyKind::Bird,
            pos: center - Vec2::splat(17.5),
            size: Vec2::splat(35.0),
            vel: Vec2::new(-120.0, 0.0),
            health: 1,
            color: 0,
        }
    }

    #[test]
    fn test_punch_hits_nearby_only() {
        let mut player = Player::new(&Upgrades::default());
        let mut enemies = vec![
            bird_at(1, player.pos + Vec2::new(60.0, 0.0)),
            bird_at(2, player.pos + Vec2::new(300.0, 0.0)),
        ];
        let mut abilities = Abilities::default();
        let hits = abilities
            .activate(AbilityKind::Punch, &mut player, &mut enemies)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(!enemies[0].is_alive());
        assert!(enemies[1].is_alive());
        // Recharging
        assert!(abilities.activate(AbilityKind::Punch, &mut player, &mut enemies).is_none());
        abilities.update(3.0);
        assert!(abilities.is_ready(AbilityKind::Punch));
    }

    #[test]
    fn test_laser_band_ahead() {
        let mut player = Player::new(&Upgrades::default());
        let mut enemies = vec![
            bird_at(1, player.pos + Vec2::new(500.0, 10.0)),
            bird_at(2, player.pos + Vec2::new(-100.0, 0.0)),
            bird_at(3, player.pos + Vec2::new(200.0, 200.0)),
        ];
        let mut abilities = Abilities::default();
        let hits = abilities
            .activate(AbilityKind::Laser, &mut player, &mut enemies)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ty, EnemyType::Bird);
        assert!(!enemies[0].is_alive());
    }

    #[test]
    fn test_rocket_detaches() {
        let mut player = Player::new(&Upgrades::default());
        player.is_swinging = true;
        player.tether_point = Some(Vec2::ZERO);
        let mut abilities = Abilities::default();
        abilities.activate(AbilityKind::Rocket, &mut player, &mut []).unwrap();
        assert!(!player.is_swinging);
        assert!(player.tether_point.is_none());
        assert_eq!(player.vel, ROCKET_VEL);
        abilities.reset(AbilityKind::Rocket);
        assert!(abilities.is_ready(AbilityKind::Rocket));
    }

    #[test]
    fn test_slow_mo_scale() {
        let mut player = Player::new(&Upgrades::default());
        let mut abilities = Abilities::default();
        assert_eq!(abilities.time_scale(), 1.0);
        abilities.activate(AbilityKind::SlowMo, &mut player, &mut []).unwrap();
        assert_eq!(abilities.time_scale(), SLOW_MO_SCALE);
        abilities.update(SLOW_MO_DURATION);
        assert_eq!(abilities.time_scale(), 1.0);
    }
}
