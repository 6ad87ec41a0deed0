//! Streaming world store
//!
//! Flat, creation-ordered collections of props, enemies and cosmetic
//! transients. Ids come from one per-run counter so they are unique per
//! spawn.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::state::{
    Color, Enemy, EnemyKind, Entity, EntityKind, FLOATING_TEXT_LIFE, FLOATING_TEXT_VEL,
    FloatingText, Particle, ParticleKind,
};
use crate::consts::VOID_LIMIT;

/// Broken branches are dropped once they fall this far below the void line
const FALLING_CULL_DEPTH: f32 = 1000.0;

#[derive(Debug, Clone, Serialize)]
pub struct World {
    pub entities: Vec<Entity>,
    pub enemies: Vec<Enemy>,
    pub particles: Vec<Particle>,
    pub texts: Vec<FloatingText>,
    #[serde(skip)]
    next_id: u32,
    #[serde(skip)]
    max_particles: usize,
}

impl World {
    pub fn new(max_particles: usize) -> Self {
        Self {
            entities: Vec::new(),
            enemies: Vec::new(),
            particles: Vec::new(),
            texts: Vec::new(),
            next_id: 1,
            max_particles,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a prop and return its id
    pub fn spawn_entity(&mut self, kind: EntityKind, pos: Vec2, size: Vec2, color: Color) -> u32 {
        let id = self.next_entity_id();
        self.entities.push(Entity::new(id, kind, pos, size, color));
        id
    }

    /// Append a prop with a silhouette outline
    pub fn spawn_shaped(
        &mut self,
        kind: EntityKind,
        pos: Vec2,
        size: Vec2,
        color: Color,
        poly: Vec<Vec2>,
    ) -> u32 {
        let id = self.spawn_entity(kind, pos, size, color);
        if let Some(entity) = self.entities.last_mut() {
            entity.poly = Some(poly);
        }
        id
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2, size: Vec2, vel: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            kind,
            pos,
            size,
            vel,
            health: 1,
            color: 0x000000FF,
        });
        id
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: u32) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Remove every prop whose id is in `ids`
    pub fn remove_entities(&mut self, ids: &[u32]) {
        if ids.is_empty() {
            return;
        }
        self.entities.retain(|e| !ids.contains(&e.id));
    }

    pub fn has_portal(&self) -> bool {
        self.entities
            .iter()
            .any(|e| matches!(e.kind, EntityKind::Portal))
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
        if self.particles.len() > max {
            let excess = self.particles.len() - max;
            self.particles.drain(..excess);
        }
    }

    pub fn push_particle(&mut self, particle: Particle) {
        if self.max_particles == 0 {
            return;
        }
        if self.particles.len() >= self.max_particles {
            // Remove oldest particles to make room
            self.particles.remove(0);
        }
        self.particles.push(particle);
    }

    /// Radial burst of `count` particles
    pub fn spawn_burst(
        &mut self,
        rng: &mut Pcg32,
        pos: Vec2,
        color: Color,
        count: usize,
        size_base: f32,
        kind: ParticleKind,
    ) {
        for _ in 0..count {
            let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
            let speed: f32 = rng.random_range(120.0..420.0);
            let life: f32 = rng.random_range(0.33..1.0);
            self.push_particle(Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life,
                max_life: 1.0,
                color,
                size: size_base * rng.random_range(0.8f32..1.2),
                kind,
            });
        }
    }

    pub fn spawn_text(&mut self, pos: Vec2, text: impl Into<String>, color: Color, size: f32) {
        self.texts.push(FloatingText {
            pos,
            vel: FLOATING_TEXT_VEL,
            text: text.into(),
            color,
            size,
            life: FLOATING_TEXT_LIFE,
        });
    }

    /// Age particles and texts, and animate collapsing branches
    pub fn update_transients(&mut self, dt: f32, gravity: f32) {
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            p.life -= dt;
        }
        self.particles.retain(|p| p.life > 0.0);

        for t in &mut self.texts {
            t.pos += t.vel * dt;
            t.life -= dt;
        }
        self.texts.retain(|t| t.life > 0.0);

        for entity in &mut self.entities {
            let EntityKind::Branch(branch) = &mut entity.kind else {
                continue;
            };
            if let Some(falling) = branch.falling_mut() {
                falling.vel.y += gravity * dt;
                falling.angle += falling.spin * dt;
                entity.pos += falling.vel * dt;
            }
        }
    }

    /// Drop everything whose right edge is left of `left_edge`
    pub fn cull(&mut self, left_edge: f32) {
        let before = self.entities.len() + self.enemies.len();
        self.entities.retain(|e| {
            let fallen = e
                .branch()
                .is_some_and(|b| b.is_broken() && e.pos.y > VOID_LIMIT + FALLING_CULL_DEPTH);
            e.right() >= left_edge && !fallen
        });
        self.enemies
            .retain(|e| e.is_alive() && e.pos.x + e.size.x >= left_edge);
        let removed = before - self.entities.len() - self.enemies.len();
        if removed > 0 {
            log::trace!("Culled {} world objects left of {:.0}", removed, left_edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Branch;
    use rand::SeedableRng;

    #[test]
    fn test_ids_are_unique() {
        let mut world = World::new(10);
        let a = world.spawn_entity(EntityKind::Coin, Vec2::ZERO, Vec2::splat(10.0), 0);
        let b = world.spawn_enemy(EnemyKind::Bird, Vec2::ZERO, Vec2::splat(35.0), Vec2::ZERO);
        let c = world.spawn_entity(EntityKind::Vine, Vec2::ZERO, Vec2::splat(10.0), 0);
        assert!(a != b && b != c && a != c);
        assert!(world.entity(c).is_some());
    }

    #[test]
    fn test_cull_behind_camera() {
        let mut world = World::new(10);
        world.spawn_entity(EntityKind::Coin, Vec2::new(0.0, 0.0), Vec2::splat(10.0), 0);
        let keep =
            world.spawn_entity(EntityKind::Coin, Vec2::new(500.0, 0.0), Vec2::splat(10.0), 0);
        world.spawn_enemy(EnemyKind::Bird, Vec2::new(-100.0, 0.0), Vec2::splat(35.0), Vec2::ZERO);
        world.cull(100.0);
        assert_eq!(world.entities.len(), 1);
        assert_eq!(world.entities[0].id, keep);
        assert!(world.enemies.is_empty());
    }

    #[test]
    fn test_particle_cap_drops_oldest() {
        let mut world = World::new(5);
        let mut rng = Pcg32::seed_from_u64(1);
        world.spawn_burst(&mut rng, Vec2::ZERO, 0, 8, 3.0, ParticleKind::Spark);
        assert_eq!(world.particles.len(), 5);
        world.set_max_particles(0);
        assert!(world.particles.is_empty());
        world.spawn_burst(&mut rng, Vec2::ZERO, 0, 8, 3.0, ParticleKind::Spark);
        assert!(world.particles.is_empty());
    }

    #[test]
    fn test_transients_expire() {
        let mut world = World::new(100);
        let mut rng = Pcg32::seed_from_u64(2);
        world.spawn_burst(&mut rng, Vec2::ZERO, 0, 4, 3.0, ParticleKind::Wood);
        world.spawn_text(Vec2::new(0.0, 100.0), "OUCH!", 0xD50000FF, 30.0);
        world.update_transients(0.5, 0.0);
        assert_eq!(world.texts.len(), 1);
        assert_eq!(world.texts[0].pos.y, 70.0);
        world.update_transients(0.6, 0.0);
        assert!(world.particles.is_empty());
        assert!(world.texts.is_empty());
    }

    #[test]
    fn test_broken_branch_falls() {
        let mut world = World::new(0);
        let mut branch = Branch::new(Some(1.0));
        branch.break_off(2.0);
        let id =
            world.spawn_entity(EntityKind::Branch(branch), Vec2::ZERO, Vec2::new(100.0, 15.0), 0);
        world.update_transients(0.1, 1800.0);
        let entity = world.entity(id).unwrap();
        assert!(entity.pos.y > 0.0);
        assert!(entity.branch().unwrap().falling().unwrap().angle > 0.0);
    }
}
