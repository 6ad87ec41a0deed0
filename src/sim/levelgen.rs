//! Procedural level streaming
//!
//! The world is built in segments as the player approaches the frontier.
//! Each segment is a tree (or a cave ceiling), optional hazards, a ladder
//! of branches and maybe a few enemies, all conditioned on the biome.
//! Generation is total: a spawn whose prerequisite is missing is skipped.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::{
    BAT_SPEED, BIRD_SPEED, CROC_ATTACK_INTERVAL, EAGLE_SPEED, SLUG_SPEED, SNAKE_SPEED,
    SPIDER_SPEED, TROLL_ROPE, TROLL_START_ANGLE,
};
use super::state::{Branch, Color, EnemyKind, EntityKind, PowerupKind};
use super::world::World;
use crate::consts::{CANVAS_HEIGHT, PIXELS_PER_METER};
use crate::levels::{Biome, EnemyType, LevelConfig, TutorialKind};

/// Where the opening segments start
pub const OPENING_SEGMENTS: [f32; 2] = [500.0, 1000.0];
/// Gap between the frontier and the next segment start
const SEGMENT_GAP: std::ops::Range<f32> = 300.0..600.0;

const REGULAR_STABILITY: f32 = 40.0;
const STURDY_STABILITY: f32 = 60.0;
const BRANCH_HEIGHT: f32 = 15.0;
const COIN_SIZE: f32 = 20.0;
const COINS_PER_ARC: usize = 5;

/// Result of one segment request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentOutcome {
    /// Content placed; the new frontier
    Built { frontier: f32 },
    /// Past the level target: finish placed, no more segments
    Finished,
}

/// Frontier bookkeeping for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Generator {
    frontier: f32,
    finished: bool,
    segments: u32,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Furthest x covered by generated content
    pub fn frontier(&self) -> f32 {
        self.frontier
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    /// Build the opening stretch of a run
    pub fn prime(&mut self, world: &mut World, level: &LevelConfig, rng: &mut Pcg32) {
        for start in OPENING_SEGMENTS {
            self.build(world, level, rng, start);
        }
    }

    /// Generate segments until the frontier is `lookahead` past `player_x`
    pub fn ensure_ahead(
        &mut self,
        world: &mut World,
        level: &LevelConfig,
        rng: &mut Pcg32,
        player_x: f32,
        lookahead: f32,
    ) -> u32 {
        let mut built = 0;
        while !self.finished && self.frontier - player_x < lookahead {
            let start = self.frontier + rng.random_range(SEGMENT_GAP);
            self.build(world, level, rng, start);
            built += 1;
        }
        built
    }

    fn build(&mut self, world: &mut World, level: &LevelConfig, rng: &mut Pcg32, start: f32) {
        if self.finished {
            return;
        }
        match generate_segment(world, level, rng, start) {
            SegmentOutcome::Built { frontier } => {
                self.frontier = self.frontier.max(frontier);
                self.segments += 1;
            }
            SegmentOutcome::Finished => {
                self.frontier = self.frontier.max(start);
                self.finished = true;
            }
        }
    }
}

#[inline]
fn chance(rng: &mut Pcg32, p: f32) -> bool {
    rng.random::<f32>() < p
}

/// Canopy silhouette for a tree at `x` whose crown base is at `base_y`
pub fn tree_poly(x: f32, base_y: f32, biome: Biome) -> Vec<Vec2> {
    let p = |dx: f32, dy: f32| Vec2::new(x + dx, base_y + dy);
    match biome {
        Biome::Winter => vec![
            p(-50.0, 0.0),
            p(-60.0, -60.0),
            p(-40.0, -60.0),
            p(-50.0, -120.0),
            p(-30.0, -120.0),
            p(0.0, -200.0),
            p(30.0, -120.0),
            p(50.0, -120.0),
            p(40.0, -60.0),
            p(60.0, -60.0),
            p(50.0, 0.0),
        ],
        Biome::Cave => vec![
            p(-40.0, 0.0),
            p(-20.0, 100.0),
            p(0.0, 200.0),
            p(20.0, 100.0),
            p(40.0, 0.0),
        ],
        _ => {
            let squeeze = if biome == Biome::Volcano { 0.7 } else { 1.0 };
            [
                (-60.0, 0.0),
                (-70.0, -40.0),
                (-30.0, -80.0),
                (-50.0, -120.0),
                (0.0, -180.0),
                (50.0, -120.0),
                (30.0, -80.0),
                (70.0, -40.0),
                (60.0, 0.0),
            ]
            .into_iter()
            .map(|(dx, dy)| p(dx * squeeze, dy))
            .collect()
        }
    }
}

fn canopy_color(biome: Biome, rng: &mut Pcg32) -> Color {
    match biome {
        Biome::Autumn if chance(rng, 0.5) => 0xFFAB91FF,
        Biome::Volcano if chance(rng, 0.3) => 0x4E342EFF,
        _ => biome.style().canopy,
    }
}

/// Emit one segment of world starting at `start`
pub fn generate_segment(
    world: &mut World,
    level: &LevelConfig,
    rng: &mut Pcg32,
    start: f32,
) -> SegmentOutcome {
    let target_x = level.target_x();
    if start > target_x {
        place_finish(world, level);
        return SegmentOutcome::Finished;
    }

    let first_new = world.entities.len();
    let biome = level.biome;
    let style = biome.style();
    let is_tutorial = level.tutorial == TutorialKind::Basic;
    let is_l2_tutorial = level.tutorial == TutorialKind::Advanced;
    let is_cave = biome == Biome::Cave;
    let meters = start / PIXELS_PER_METER;

    let tree_height =
        (CANVAS_HEIGHT - 150.0) + (start * 0.003).sin() * 100.0 + rng.random_range(-300.0..300.0);
    let tree_x = start + rng.random_range(0.0..400.0);
    let crown_y = CANVAS_HEIGHT - tree_height;

    // Ceiling hazards
    if is_cave && chance(rng, 0.6) {
        let top = -50.0;
        let height = rng.random_range(200.0..400.0);
        world.spawn_shaped(
            EntityKind::Stalactite,
            Vec2::new(tree_x, top),
            Vec2::new(40.0, height),
            style.canopy,
            tree_poly(tree_x, 0.0, Biome::Cave),
        );
        if chance(rng, 0.4) {
            world.spawn_entity(
                EntityKind::Web,
                Vec2::new(tree_x + 40.0, top + 150.0),
                Vec2::splat(100.0),
                0xFFFFFF4D,
            );
        }
    }

    if !is_tutorial && !is_cave && chance(rng, 0.4) {
        world.spawn_entity(
            EntityKind::Updraft,
            Vec2::new(start, CANVAS_HEIGHT + 600.0),
            Vec2::new(80.0, 800.0),
            0xFFFFFF1A,
        );
    }

    if biome == Biome::Swamp && chance(rng, 0.3) {
        if chance(rng, 0.5) {
            world.spawn_entity(
                EntityKind::Waterfall,
                Vec2::new(start + 100.0, -500.0),
                Vec2::new(60.0, 1500.0),
                0x2196F366,
            );
        } else {
            let size = Vec2::new(rng.random_range(80.0..120.0), rng.random_range(80.0..120.0));
            let y = CANVAS_HEIGHT - 400.0 - rng.random_range(0.0..200.0);
            let pos = Vec2::new(start + 100.0, y);
            world.spawn_entity(EntityKind::WaterPocket, pos, size, 0x01579BB3);
        }
    }

    // Fluid pool along the bottom
    if chance(rng, level.liquid_chance()) {
        let is_volcano = biome == Biome::Volcano;
        let (kind, color) = if is_volcano {
            (EntityKind::Lava, 0xD32F2FFF)
        } else {
            (EntityKind::Lake, 0x2E7D32FF)
        };
        let width = rng.random_range(150.0..400.0);
        world.spawn_entity(
            kind,
            Vec2::new(start, CANVAS_HEIGHT - 40.0),
            Vec2::new(width, 40.0),
            color,
        );
        if biome == Biome::Swamp && chance(rng, 0.5) {
            let x = start + rng.random_range(50.0..100.0);
            world.spawn_entity(
                EntityKind::Lilypad,
                Vec2::new(x, CANVAS_HEIGHT - 45.0),
                Vec2::new(60.0, 10.0),
                0x81C784FF,
            );
        }
        if is_volcano && chance(rng, 0.4) {
            let x = start + rng.random_range(20.0..100.0);
            world.spawn_entity(
                EntityKind::Branch(Branch::new(Some(STURDY_STABILITY))),
                Vec2::new(x, CANVAS_HEIGHT - 45.0),
                Vec2::new(50.0, BRANCH_HEIGHT),
                0x5D4037FF,
            );
        }
    }

    // Tree
    if !is_cave {
        world.spawn_entity(
            EntityKind::Tree,
            Vec2::new(tree_x - 15.0, crown_y),
            Vec2::new(30.0, tree_height + 3000.0),
            style.trunk,
        );
        let canopy_y = crown_y - 80.0;
        let color = canopy_color(biome, rng);
        world.spawn_shaped(
            EntityKind::Tree,
            Vec2::new(tree_x - 60.0, canopy_y),
            Vec2::splat(120.0),
            color,
            tree_poly(tree_x, crown_y + 40.0, biome),
        );
        if chance(rng, 0.3) {
            let x = tree_x + rng.random_range(-40.0..40.0);
            let length = rng.random_range(150.0..300.0);
            world.spawn_entity(
                EntityKind::Vine,
                Vec2::new(x, canopy_y + 80.0),
                Vec2::new(4.0, length),
                0x4CAF50FF,
            );
        }
    }

    // Branch ladder
    let mut branches: usize = if is_tutorial {
        5
    } else if biome == Biome::Jungle {
        rng.random_range(2..4)
    } else {
        rng.random_range(3..6)
    };
    if is_l2_tutorial && meters > 200.0 && meters < 400.0 {
        branches = 5;
    }
    if is_cave || biome == Biome::Swamp {
        branches += 1;
    }

    if !is_tutorial && matches!(biome, Biome::Jungle | Biome::Swamp) && chance(rng, 0.4) {
        let x = tree_x + if chance(rng, 0.5) { 20.0 } else { -100.0 };
        world.spawn_entity(
            EntityKind::Branch(Branch::new(Some(STURDY_STABILITY))),
            Vec2::new(x, CANVAS_HEIGHT - 150.0),
            Vec2::new(100.0, BRANCH_HEIGHT),
            0x5D4037FF,
        );
    }

    let step = style.branch_spread / branches.max(1) as f32;
    for b in 0..branches {
        let y = crown_y + 50.0 + b as f32 * step + rng.random_range(-30.0..30.0);
        let width = rng.random_range(80.0..150.0);
        let x = if chance(rng, 0.5) { tree_x + 15.0 } else { tree_x - width + 15.0 };
        if y > CANVAS_HEIGHT - 50.0 {
            continue;
        }
        let branch = if is_tutorial {
            Branch::unbreakable()
        } else {
            Branch::new(Some(REGULAR_STABILITY))
        };
        world.spawn_entity(
            EntityKind::Branch(branch),
            Vec2::new(x, y),
            Vec2::new(width, BRANCH_HEIGHT),
            style.branch,
        );

        if biome == Biome::Jungle && chance(rng, 0.3) {
            let fx = x + rng.random_range(10.0..(width - 10.0));
            let color = if chance(rng, 0.5) { 0xE91E63FF } else { 0x9C27B0FF };
            let pos = Vec2::new(fx, y - 10.0);
            world.spawn_entity(EntityKind::Flower, pos, Vec2::splat(10.0), color);
        }
        if biome == Biome::Jungle && b < 2 && chance(rng, 0.1) {
            world.spawn_entity(
                EntityKind::Nest,
                Vec2::new(x + width / 2.0 - 15.0, y - 15.0),
                Vec2::new(30.0, 15.0),
                0x795548FF,
            );
        }
    }

    // Coin arc between trees
    if chance(rng, 0.35) {
        let base_y = (crown_y + 150.0).min(CANVAS_HEIGHT - 100.0);
        for i in 0..COINS_PER_ARC {
            let t = i as f32 / (COINS_PER_ARC - 1) as f32;
            let pos = Vec2::new(
                tree_x + 120.0 + i as f32 * 40.0,
                base_y - (t * std::f32::consts::PI).sin() * 80.0,
            );
            world.spawn_entity(EntityKind::Coin, pos, Vec2::splat(COIN_SIZE), 0xFFD700FF);
        }
    }

    if !is_tutorial && chance(rng, 0.05) {
        let kind = if chance(rng, 0.5) { PowerupKind::Rope } else { PowerupKind::Force };
        world.spawn_entity(
            EntityKind::Powerup(kind),
            Vec2::new(tree_x + 100.0, crown_y + 150.0),
            Vec2::splat(30.0),
            0x00E5FFFF,
        );
    }

    let spawned_enemies = spawn_enemies(world, level, rng, start, tree_x, tree_height);

    let frontier = world.entities[first_new..]
        .iter()
        .map(|e| e.pos.x)
        .fold(start, f32::max);
    log::debug!(
        "Segment at {:.0}: {} props, {} enemies, frontier {:.0}",
        start,
        world.entities.len() - first_new,
        spawned_enemies,
        frontier
    );
    SegmentOutcome::Built { frontier }
}

fn place_finish(world: &mut World, level: &LevelConfig) {
    if world.has_portal() {
        return;
    }
    let target_x = level.target_x();
    world.spawn_entity(
        EntityKind::Portal,
        Vec2::new(target_x, CANVAS_HEIGHT - 300.0),
        Vec2::new(100.0, 200.0),
        0x00E676FF,
    );
    world.spawn_entity(
        EntityKind::Branch(Branch::unbreakable()),
        Vec2::new(target_x - 50.0, CANVAS_HEIGHT - 100.0),
        Vec2::new(200.0, 20.0),
        0x3E2723FF,
    );
    log::info!("Finish portal placed at x={:.0} for level {}", target_x, level.id);
}

fn enemy_size(ty: EnemyType) -> Vec2 {
    match ty {
        EnemyType::Eagle => Vec2::new(80.0, 40.0),
        EnemyType::Troll => Vec2::new(50.0, 60.0),
        _ => Vec2::splat(35.0),
    }
}

fn spawn_enemies(
    world: &mut World,
    level: &LevelConfig,
    rng: &mut Pcg32,
    start: f32,
    tree_x: f32,
    tree_height: f32,
) -> usize {
    if level.tutorial == TutorialKind::Basic || start <= 500.0 || level.allowed_enemies.is_empty() {
        return 0;
    }
    let spawn_chance = (0.2 + 0.1 * level.difficulty).min(0.9);
    if !chance(rng, spawn_chance) {
        return 0;
    }
    let count = if level.difficulty > 5.0 && chance(rng, 0.4) { 2 } else { 1 };
    let meters = start / PIXELS_PER_METER;

    let mut spawned = 0;
    for i in 0..count {
        let offset = i as f32;
        let mut ty = level.allowed_enemies[rng.random_range(0..level.allowed_enemies.len())];
        let mut pos = Vec2::new(
            start + rng.random_range(100.0..300.0) + offset * 50.0,
            rng.random_range(100.0..400.0),
        );

        // The advanced tutorial only sends one bird at a fixed stretch
        if level.tutorial == TutorialKind::Advanced {
            if meters > 500.0 && meters < 600.0 {
                ty = EnemyType::Bird;
                pos.y = CANVAS_HEIGHT - 300.0;
            } else {
                continue;
            }
        }

        let size = enemy_size(ty);
        let placed = match ty {
            EnemyType::Bird | EnemyType::Eagle => {
                if level.tutorial != TutorialKind::Advanced {
                    pos.y = rng.random_range(40.0..300.0);
                }
                let (kind, speed) = if ty == EnemyType::Eagle {
                    (EnemyKind::Eagle, EAGLE_SPEED)
                } else {
                    (EnemyKind::Bird, BIRD_SPEED)
                };
                Some((kind, pos, Vec2::new(-speed, 0.0)))
            }
            EnemyType::Spider => {
                let pos = Vec2::new(
                    tree_x + offset * 30.0,
                    CANVAS_HEIGHT - tree_height + rng.random_range(300.0..700.0),
                );
                if i == 0 {
                    let web = pos + Vec2::new(-70.0, 50.0);
                    world.spawn_entity(EntityKind::Web, web, Vec2::splat(140.0), 0xFFFFFF66);
                }
                Some((
                    EnemyKind::Spider { anchor_y: pos.y },
                    pos,
                    Vec2::new(0.0, SPIDER_SPEED * 0.5),
                ))
            }
            EnemyType::Bat => {
                let pos = Vec2::new(pos.x, rng.random_range(50.0..200.0));
                Some((
                    EnemyKind::Bat { base_y: pos.y, phase: 0.0 },
                    pos,
                    Vec2::new(-BAT_SPEED, 0.0),
                ))
            }
            EnemyType::Troll => {
                let anchor = Vec2::new(start + rng.random_range(100.0..300.0), 200.0 - TROLL_ROPE);
                let bob = anchor
                    + Vec2::new(TROLL_START_ANGLE.sin(), TROLL_START_ANGLE.cos()) * TROLL_ROPE;
                Some((
                    EnemyKind::Troll {
                        anchor,
                        angle: TROLL_START_ANGLE,
                        angular_vel: 0.0,
                        length: TROLL_ROPE,
                    },
                    bob - size * 0.5,
                    Vec2::ZERO,
                ))
            }
            EnemyType::Slug => world
                .entities
                .iter()
                .find(|e| e.pos.x > start && e.branch().is_some_and(|b| !b.is_broken()))
                .map(|branch| {
                    (
                        EnemyKind::Slug { branch_id: branch.id },
                        Vec2::new(branch.pos.x + 10.0, branch.pos.y - size.y),
                        Vec2::new(SLUG_SPEED, 0.0),
                    )
                }),
            EnemyType::Snake => Some((
                EnemyKind::Snake { base_y: pos.y, phase: 0.0 },
                pos,
                Vec2::new(-SNAKE_SPEED, 0.0),
            )),
            EnemyType::Crocodile => {
                let lake = world
                    .entities
                    .iter()
                    .find(|e| {
                        e.pos.x >= start && matches!(e.kind, EntityKind::Lake | EntityKind::Lava)
                    })
                    .map(|e| (e.pos, e.size));
                match lake {
                    Some((lake_pos, lake_size)) => {
                        let span = (lake_size.x - size.x).max(1.0);
                        let surface_y = lake_pos.y - 20.0;
                        let timer = rng.random_range(1.0..CROC_ATTACK_INTERVAL);
                        Some((
                            EnemyKind::Crocodile {
                                surface_y,
                                attack_timer: timer,
                            },
                            Vec2::new(lake_pos.x + rng.random_range(0.0..span), surface_y),
                            Vec2::ZERO,
                        ))
                    }
                    None => None,
                }
            }
        };

        // Missing prerequisite: skip this spawn
        let Some((kind, pos, vel)) = placed else {
            log::trace!("Skipped {} spawn at {:.0}: no perch", ty.as_str(), start);
            continue;
        };
        world.spawn_enemy(kind, pos, size, vel);
        spawned += 1;
    }
    spawned
}
