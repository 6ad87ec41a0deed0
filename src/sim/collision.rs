//! Player interaction resolver
//!
//! One pass per step over every live prop and enemy in storage order.
//! Overlaps are plain AABB tests; every overlapping effect applies, so a
//! player landing on a branch inside a web gets both.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::ability::Takedown;
use super::combo::Trick;
use super::geom::Aabb;
use super::physics::take_damage;
use super::state::{DamageResult, EntityKind, GameEvent, ParticleKind, Player, PowerupKind};
use super::world::World;
use crate::damping;
use crate::levels::EnemyType;
use crate::save::Upgrades;
use crate::tuning::Tuning;

/// Per-frame fluid drag; deeper fluids hold harder
const WATERFALL_DRAG: f32 = 0.97;
const LAKE_DRAG: f32 = 0.95;
const WATER_POCKET_DRAG: f32 = 0.92;
const LAVA_DRAG: f32 = 0.9;

const ROPE_POWERUP_SECONDS: f32 = 1.0;
const FORCE_POWERUP_BONUS: f32 = 0.05;

/// Everything the resolver changed outside the world store
#[derive(Debug, Clone, Default)]
pub struct CollisionReport {
    pub events: Vec<GameEvent>,
    /// Combo tricks in the order they happened
    pub tricks: Vec<Trick>,
    /// Currency picked up this step
    pub tokens: u32,
    pub reached_portal: bool,
    /// Set when an enemy hit took the last life
    pub killed_by: Option<EnemyType>,
    pub takedowns: Vec<Takedown>,
}

/// Resolve all player contacts for this step
pub fn resolve(
    player: &mut Player,
    world: &mut World,
    tuning: &Tuning,
    upgrades: &Upgrades,
    rng: &mut Pcg32,
    dt: f32,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    if !player.is_alive() {
        return report;
    }
    player.standing_on = None;

    attract_coins(player, world, tuning, upgrades, dt);
    resolve_entities(player, world, tuning, upgrades, rng, dt, &mut report);
    resolve_enemies(player, world, tuning, rng, &mut report);
    report
}

fn attract_coins(
    player: &Player,
    world: &mut World,
    tuning: &Tuning,
    upgrades: &Upgrades,
    dt: f32,
) {
    let radius = tuning.magnet_radius(upgrades.magnetism);
    if radius <= 0.0 {
        return;
    }
    let step = tuning.magnet_pull_speed * dt;
    for coin in world
        .entities
        .iter_mut()
        .filter(|e| matches!(e.kind, EntityKind::Coin))
    {
        let to_player = player.pos - coin.center();
        let dist = to_player.length();
        if dist < radius && dist > 0.0 {
            coin.pos += to_player / dist * step.min(dist);
        }
    }
}

/// Swept top-edge test: the feet crossed `top` this step while moving down
fn lands_on(player: &Player, surface: &Aabb) -> bool {
    let half = player.size.y * 0.5;
    let feet = player.pos.y + half;
    let prev_feet = player.prev_pos.y + half;
    let horizontal = player.pos.x + player.size.x * 0.5 > surface.min.x
        && player.pos.x - player.size.x * 0.5 < surface.max().x;
    horizontal && player.vel.y >= 0.0 && prev_feet <= surface.min.y && feet >= surface.min.y
}

fn settle_on(player: &mut Player, top: f32, id: u32) {
    player.pos.y = top - player.size.y * 0.5;
    player.vel.y = 0.0;
    player.jump_cooldown = 0.0;
    player.standing_on = Some(id);
}

fn resolve_entities(
    player: &mut Player,
    world: &mut World,
    tuning: &Tuning,
    upgrades: &Upgrades,
    rng: &mut Pcg32,
    dt: f32,
    report: &mut CollisionReport,
) {
    let mut removed = Vec::new();

    for i in 0..world.entities.len() {
        let (id, kind, bounds, center, color) = {
            let e = &world.entities[i];
            (e.id, e.kind, e.aabb(), e.center(), e.color)
        };

        // Platforms use the swept test, everything else plain overlap
        match kind {
            EntityKind::Branch(branch) if !branch.is_broken() => {
                if !lands_on(player, &bounds) {
                    continue;
                }
                // Unbreakable platforms survive any impact and are landed on
                let smashed = player.vel.y > tuning.branch_impact_break_speed && {
                    let spin: f32 = rng.random_range(-3.0..3.0);
                    world.entities[i]
                        .branch_mut()
                        .is_some_and(|b| b.break_off(spin))
                };
                let broke = smashed || {
                    settle_on(player, bounds.min.y, id);
                    world.entities[i]
                        .branch_mut()
                        .is_some_and(|b| b.wear(tuning.branch_stability_drain * dt))
                };
                if broke {
                    break_branch(player, world, rng, id, center, report);
                }
                continue;
            }
            EntityKind::Lilypad => {
                if lands_on(player, &bounds) {
                    settle_on(player, bounds.min.y, id);
                }
                continue;
            }
            _ => {}
        }

        if !player.aabb().overlaps(&bounds) {
            continue;
        }
        match kind {
            EntityKind::Coin => {
                removed.push(id);
                let luck = tuning.luck_chance_per_level * upgrades.luck as f32;
                let lucky = rng.random::<f32>() < luck;
                let amount = if lucky { 2 } else { 1 };
                report.tokens += amount;
                world.spawn_burst(rng, center, 0xFFD700FF, 5, 3.0, ParticleKind::Spark);
                if lucky {
                    world.spawn_text(center, "LUCKY!", 0xFFD700FF, 20.0);
                }
                report.events.push(GameEvent::CoinCollected { amount, lucky });
                report.tricks.push(Trick::Coin);
            }
            EntityKind::Portal => {
                report.reached_portal = true;
            }
            EntityKind::Flower => {
                removed.push(id);
                player.vel.y = tuning.flower_bounce;
                world.spawn_burst(rng, center, color, 5, 3.0, ParticleKind::Leaf);
                report.tricks.push(Trick::Bounce);
            }
            EntityKind::Web if !player.is_fever => {
                player.vel *= damping(tuning.web_drag_per_frame, dt);
            }
            EntityKind::Waterfall => player.vel *= damping(WATERFALL_DRAG, dt),
            EntityKind::Lake => player.vel *= damping(LAKE_DRAG, dt),
            EntityKind::WaterPocket => player.vel *= damping(WATER_POCKET_DRAG, dt),
            EntityKind::Lava => player.vel *= damping(LAVA_DRAG, dt),
            EntityKind::Updraft => {
                player.vel.y -= tuning.updraft_lift * dt;
            }
            EntityKind::Nest => {
                removed.push(id);
                world.spawn_burst(rng, center, 0xFFFFFFFF, 8, 4.0, ParticleKind::Egg);
                report.events.push(GameEvent::NestCracked);
                report.tricks.push(Trick::Nest);
            }
            EntityKind::Powerup(powerup) => {
                removed.push(id);
                let label = match powerup {
                    PowerupKind::Rope => {
                        player.run_rope_bonus += ROPE_POWERUP_SECONDS;
                        "+ROPE"
                    }
                    PowerupKind::Force => {
                        player.run_force_bonus += FORCE_POWERUP_BONUS;
                        "+FORCE"
                    }
                };
                world.spawn_text(center, label, 0x00E5FFFF, 25.0);
                report.events.push(GameEvent::PowerupCollected(powerup));
                report.tricks.push(Trick::Powerup);
            }
            _ => {}
        }
    }

    world.remove_entities(&removed);
}

fn break_branch(
    player: &mut Player,
    world: &mut World,
    rng: &mut Pcg32,
    id: u32,
    center: Vec2,
    report: &mut CollisionReport,
) {
    log::debug!("Branch {} broke", id);
    world.spawn_burst(rng, center, 0x795548FF, 8, 4.0, ParticleKind::Wood);
    report.events.push(GameEvent::BranchBroken { id });
    if player.standing_on == Some(id) {
        player.standing_on = None;
    }
    if player.anchor_id == Some(id) {
        player.detach();
        report.events.push(GameEvent::TetherSnapped);
    }
}

fn resolve_enemies(
    player: &mut Player,
    world: &mut World,
    tuning: &Tuning,
    rng: &mut Pcg32,
    report: &mut CollisionReport,
) {
    let mut bursts = Vec::new();

    for enemy in world.enemies.iter_mut().filter(|e| e.is_alive()) {
        if !player.aabb().overlaps(&enemy.aabb()) {
            continue;
        }
        if player.is_fever {
            enemy.health = 0;
            let takedown = Takedown {
                ty: enemy.ty(),
                pos: enemy.center(),
            };
            bursts.push(takedown.pos);
            report.takedowns.push(takedown);
            report.events.push(GameEvent::EnemyDefeated(takedown.ty));
            report.tricks.push(Trick::Takedown);
            continue;
        }

        let result = take_damage(player, 1, tuning);
        match result {
            DamageResult::Ignored => continue,
            DamageResult::ArmorAbsorbed => report.events.push(GameEvent::ArmorBroken),
            DamageResult::LifeLost | DamageResult::Killed => {
                report.events.push(GameEvent::Damaged {
                    lives: player.lives,
                });
            }
        }
        if enemy.knocks_back() {
            let away = (player.pos - enemy.center()).normalize_or(Vec2::NEG_Y);
            player.vel = away * tuning.knockback;
        }
        if result == DamageResult::Killed {
            report.killed_by = Some(enemy.ty());
            break;
        }
    }

    for pos in bursts {
        world.spawn_burst(rng, pos, 0xFF5252FF, 10, 4.0, ParticleKind::Spark);
    }
}
