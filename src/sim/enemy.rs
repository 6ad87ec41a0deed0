//! Per-type enemy movement

use glam::Vec2;

use super::state::{Enemy, EnemyKind, Entity};

pub const BIRD_SPEED: f32 = 120.0;
pub const EAGLE_SPEED: f32 = 180.0;
pub const BAT_SPEED: f32 = 240.0;
pub const SNAKE_SPEED: f32 = 90.0;
pub const SLUG_SPEED: f32 = 30.0;
/// Spider thread speed
pub const SPIDER_SPEED: f32 = 120.0;
/// Spider range around its anchor
pub const SPIDER_RISE: f32 = 50.0;
pub const SPIDER_DROP: f32 = 100.0;
const BAT_DESCENT: f32 = 30.0;
const BAT_AMPLITUDE: f32 = 40.0;
const BAT_FREQUENCY: f32 = 3.0;
const SNAKE_AMPLITUDE: f32 = 10.0;
const SNAKE_FREQUENCY: f32 = 6.0;
pub const TROLL_ROPE: f32 = 180.0;
pub const TROLL_START_ANGLE: f32 = 0.8;
const CROC_LUNGE: f32 = -600.0;
pub const CROC_ATTACK_INTERVAL: f32 = 3.0;

/// Advance every live enemy by `dt`
pub fn update_enemies(enemies: &mut [Enemy], entities: &[Entity], gravity: f32, dt: f32) {
    for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
        update_enemy(enemy, entities, gravity, dt);
    }
}

fn update_enemy(enemy: &mut Enemy, entities: &[Entity], gravity: f32, dt: f32) {
    let size = enemy.size;
    match &mut enemy.kind {
        EnemyKind::Bird | EnemyKind::Eagle => {
            enemy.pos += enemy.vel * dt;
        }
        EnemyKind::Spider { anchor_y } => {
            enemy.pos.y += enemy.vel.y * dt;
            if enemy.pos.y > *anchor_y + SPIDER_DROP {
                enemy.vel.y = -SPIDER_SPEED;
            }
            if enemy.pos.y < *anchor_y - SPIDER_RISE {
                enemy.vel.y = SPIDER_SPEED;
            }
        }
        EnemyKind::Bat { base_y, phase } => {
            *phase += BAT_FREQUENCY * dt;
            *base_y += BAT_DESCENT * dt;
            enemy.pos.x += enemy.vel.x * dt;
            enemy.pos.y = *base_y + phase.sin() * BAT_AMPLITUDE;
        }
        EnemyKind::Troll {
            anchor,
            angle,
            angular_vel,
            length,
        } => {
            // Undamped pendulum
            *angular_vel += -(gravity / *length) * angle.sin() * dt;
            *angle += *angular_vel * dt;
            let bob = *anchor + Vec2::new(angle.sin(), angle.cos()) * *length;
            enemy.pos = bob - size * 0.5;
        }
        EnemyKind::Slug { branch_id } => {
            let perch = entities
                .iter()
                .find(|e| e.id == *branch_id)
                .filter(|e| e.branch().is_some_and(|b| !b.is_broken()));
            match perch {
                Some(branch) => {
                    enemy.pos.x += enemy.vel.x * dt;
                    let min_x = branch.pos.x;
                    let max_x = branch.right() - size.x;
                    if enemy.pos.x > max_x {
                        enemy.pos.x = max_x;
                        enemy.vel.x = -SLUG_SPEED;
                    } else if enemy.pos.x < min_x {
                        enemy.pos.x = min_x;
                        enemy.vel.x = SLUG_SPEED;
                    }
                    enemy.pos.y = branch.pos.y - size.y;
                }
                None => {
                    // Perch gone: drop
                    enemy.vel.y += gravity * dt;
                    enemy.pos += enemy.vel * dt;
                }
            }
        }
        EnemyKind::Snake { base_y, phase } => {
            *phase += SNAKE_FREQUENCY * dt;
            enemy.pos.x += enemy.vel.x * dt;
            enemy.pos.y = *base_y + phase.sin() * SNAKE_AMPLITUDE;
        }
        EnemyKind::Crocodile {
            surface_y,
            attack_timer,
        } => {
            *attack_timer -= dt;
            if *attack_timer <= 0.0 {
                enemy.vel.y = CROC_LUNGE;
                *attack_timer = CROC_ATTACK_INTERVAL;
            }
            enemy.vel.y += gravity * dt;
            enemy.pos.y += enemy.vel.y * dt;
            if enemy.pos.y >= *surface_y {
                enemy.pos.y = *surface_y;
                enemy.vel.y = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Branch, EntityKind};

    fn enemy(kind: EnemyKind, pos: Vec2, vel: Vec2) -> Enemy {
        Enemy {
            id: 1,
            kind,
            pos,
            size: Vec2::splat(35.0),
            vel,
            health: 1,
            color: 0,
        }
    }

    #[test]
    fn test_bird_glides_left() {
        let mut enemies = [enemy(
            EnemyKind::Bird,
            Vec2::new(100.0, 50.0),
            Vec2::new(-BIRD_SPEED, 0.0),
        )];
        update_enemies(&mut enemies, &[], 1800.0, 0.5);
        assert_eq!(enemies[0].pos, Vec2::new(40.0, 50.0));
    }

    #[test]
    fn test_spider_stays_on_thread() {
        let anchor_y = 300.0;
        let mut enemies = [enemy(
            EnemyKind::Spider { anchor_y },
            Vec2::new(0.0, anchor_y),
            Vec2::new(0.0, SPIDER_SPEED),
        )];
        for _ in 0..600 {
            update_enemies(&mut enemies, &[], 1800.0, 1.0 / 60.0);
            let y = enemies[0].pos.y;
            assert!(y >= anchor_y - SPIDER_RISE - 3.0 && y <= anchor_y + SPIDER_DROP + 3.0);
        }
    }

    #[test]
    fn test_troll_swings_symmetrically() {
        let anchor = Vec2::new(500.0, 0.0);
        let mut enemies = [enemy(
            EnemyKind::Troll {
                anchor,
                angle: TROLL_START_ANGLE,
                angular_vel: 0.0,
                length: TROLL_ROPE,
            },
            anchor,
            Vec2::ZERO,
        )];
        let mut min_angle = f32::MAX;
        for _ in 0..600 {
            update_enemies(&mut enemies, &[], 1800.0, 1.0 / 60.0);
            if let EnemyKind::Troll { angle, .. } = enemies[0].kind {
                min_angle = min_angle.min(angle);
            }
            let center = enemies[0].center();
            assert!((center.distance(anchor) - TROLL_ROPE).abs() < 1e-2);
        }
        // Reached the other side
        assert!(min_angle < -0.5);
    }

    #[test]
    fn test_slug_falls_when_branch_breaks() {
        let mut branch = Branch::new(Some(40.0));
        let mut entities = vec![Entity::new(
            7,
            EntityKind::Branch(branch),
            Vec2::new(0.0, 200.0),
            Vec2::new(100.0, 15.0),
            0,
        )];
        let mut enemies = [enemy(
            EnemyKind::Slug { branch_id: 7 },
            Vec2::new(10.0, 165.0),
            Vec2::new(SLUG_SPEED, 0.0),
        )];
        for _ in 0..300 {
            update_enemies(&mut enemies, &entities, 1800.0, 1.0 / 60.0);
            assert_eq!(enemies[0].pos.y, 165.0);
            assert!(enemies[0].pos.x >= 0.0 && enemies[0].pos.x <= 65.0);
        }

        branch.break_off(0.0);
        entities[0].kind = EntityKind::Branch(branch);
        update_enemies(&mut enemies, &entities, 1800.0, 0.1);
        assert!(enemies[0].pos.y > 165.0);
    }

    #[test]
    fn test_crocodile_lunges_and_returns() {
        let surface_y = 560.0;
        let mut enemies = [enemy(
            EnemyKind::Crocodile {
                surface_y,
                attack_timer: 0.0,
            },
            Vec2::new(0.0, surface_y),
            Vec2::ZERO,
        )];
        update_enemies(&mut enemies, &[], 1800.0, 1.0 / 60.0);
        assert!(enemies[0].pos.y < surface_y);
        for _ in 0..120 {
            update_enemies(&mut enemies, &[], 1800.0, 1.0 / 60.0);
        }
        assert_eq!(enemies[0].pos.y, surface_y);
    }

    #[test]
    fn test_dead_enemies_do_not_move() {
        let mut dead = enemy(EnemyKind::Bird, Vec2::ZERO, Vec2::new(-BIRD_SPEED, 0.0));
        dead.health = 0;
        let mut enemies = [dead];
        update_enemies(&mut enemies, &[], 1800.0, 1.0);
        assert_eq!(enemies[0].pos, Vec2::ZERO);
    }
}
