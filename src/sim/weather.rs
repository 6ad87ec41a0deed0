//! Weather cycle and ambient particles
//!
//! Weather rotates through the level's allowed set on a randomized timer.
//! Wind pushes the player forward, rain thickens the air and fog only
//! flags the player for the renderer.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::ParticleKind;
use super::world::World;
use crate::chance_per_step;
use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::levels::{Biome, WeatherKind};
use crate::tuning::Tuning;

/// Per-frame roll before any ambient particle is considered
const AMBIENT_ROLL: f32 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    pub kind: WeatherKind,
    /// Seconds until the next change
    pub timer: f32,
}

impl Weather {
    pub fn new(kind: WeatherKind, rng: &mut Pcg32) -> Self {
        Self {
            kind,
            timer: rng.random_range(2.0..5.0),
        }
    }

    /// Count down and roll a new weather when due. Returns the new kind if it changed.
    pub fn update(
        &mut self,
        dt: f32,
        allowed: &[WeatherKind],
        rng: &mut Pcg32,
    ) -> Option<WeatherKind> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.timer = rng.random_range(1.0..3.0);
        let next = if allowed.is_empty() {
            WeatherKind::Clear
        } else {
            allowed[rng.random_range(0..allowed.len())]
        };
        if next == self.kind {
            return None;
        }
        log::info!("Weather changed: {:?} -> {:?}", self.kind, next);
        self.kind = next;
        Some(next)
    }

    /// Tailwind acceleration (px/s²)
    pub fn wind(&self, tuning: &Tuning) -> f32 {
        match self.kind {
            WeatherKind::Windy => tuning.wind_push,
            _ => 0.0,
        }
    }

    /// Per-frame drag factor on top of air drag
    pub fn drag_per_frame(&self, tuning: &Tuning) -> f32 {
        match self.kind {
            WeatherKind::Rain => tuning.rain_drag_per_frame,
            _ => 1.0,
        }
    }

    pub fn is_foggy(&self) -> bool {
        self.kind == WeatherKind::Fog
    }
}

/// Spawn weather and biome particles around the camera
pub fn spawn_ambient(
    world: &mut World,
    rng: &mut Pcg32,
    weather: WeatherKind,
    biome: Biome,
    camera: Vec2,
    dt: f32,
) {
    let (chance, kind) = match (weather, biome) {
        (WeatherKind::Rain, _) | (_, Biome::Swamp) => (0.3, ParticleKind::Rain),
        (_, Biome::Winter) => (0.2, ParticleKind::Snow),
        (_, Biome::Volcano) => (0.2, ParticleKind::Ash),
        (_, Biome::Cave) => (0.2, ParticleKind::Spore),
        (WeatherKind::Windy, _) => (0.1, ParticleKind::Wind),
        _ => return,
    };
    if rng.random::<f32>() >= chance_per_step(AMBIENT_ROLL * chance, dt) {
        return;
    }

    let (pos, vel, life, color, size) = match kind {
        ParticleKind::Rain => (
            Vec2::new(camera.x + rng.random::<f32>() * CANVAS_WIDTH + 200.0, camera.y - 100.0),
            Vec2::new(-300.0, rng.random_range(900.0..1200.0)),
            1.0,
            0x4FC3F7FF,
            2.0,
        ),
        ParticleKind::Snow => (
            Vec2::new(camera.x + rng.random::<f32>() * CANVAS_WIDTH, camera.y - 100.0),
            Vec2::new(rng.random_range(-60.0..60.0), rng.random_range(120.0..180.0)),
            2.0,
            0xFFFFFFFF,
            3.0,
        ),
        ParticleKind::Ash => (
            Vec2::new(camera.x + rng.random::<f32>() * CANVAS_WIDTH, camera.y + CANVAS_HEIGHT),
            Vec2::new(rng.random_range(-60.0..60.0), rng.random_range(-120.0..-60.0)),
            2.0,
            0x9E9E9EFF,
            3.0,
        ),
        ParticleKind::Spore => (
            Vec2::new(
                camera.x + rng.random::<f32>() * CANVAS_WIDTH,
                camera.y + rng.random::<f32>() * CANVAS_HEIGHT,
            ),
            Vec2::new(rng.random_range(-20.0..20.0), rng.random_range(-30.0..-10.0)),
            2.0,
            0xAED581B0,
            2.0,
        ),
        _ => (
            Vec2::new(camera.x - 100.0, camera.y + rng.random::<f32>() * CANVAS_HEIGHT),
            Vec2::new(rng.random_range(900.0..1200.0), rng.random_range(-60.0..60.0)),
            1.0,
            0xFFFFFF1A,
            40.0,
        ),
    };
    world.push_particle(super::state::Particle {
        pos,
        vel,
        life,
        max_life: life,
        color,
        size,
        kind,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_initial_timer_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let weather = Weather::new(WeatherKind::Clear, &mut rng);
            assert!((2.0..5.0).contains(&weather.timer));
        }
    }

    #[test]
    fn test_cycle_picks_from_allowed() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut weather = Weather::new(WeatherKind::Fog, &mut rng);
        let allowed = [WeatherKind::Fog, WeatherKind::Rain];
        let mut changes = 0;
        for _ in 0..2000 {
            if let Some(kind) = weather.update(0.1, &allowed, &mut rng) {
                assert!(allowed.contains(&kind));
                changes += 1;
            }
            assert!(weather.timer <= 5.0);
        }
        assert!(changes > 0);
    }

    #[test]
    fn test_empty_allowed_falls_back_to_clear() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut weather = Weather::new(WeatherKind::Windy, &mut rng);
        weather.timer = 0.0;
        assert_eq!(weather.update(0.1, &[], &mut rng), Some(WeatherKind::Clear));
    }

    #[test]
    fn test_physics_modifiers() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(6);
        let windy = Weather::new(WeatherKind::Windy, &mut rng);
        let rain = Weather::new(WeatherKind::Rain, &mut rng);
        assert_eq!(windy.wind(&tuning), 180.0);
        assert_eq!(windy.drag_per_frame(&tuning), 1.0);
        assert_eq!(rain.wind(&tuning), 0.0);
        assert_eq!(rain.drag_per_frame(&tuning), 0.998);
        assert!(Weather::new(WeatherKind::Fog, &mut rng).is_foggy());
    }

    #[test]
    fn test_ambient_particles_spawn() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut world = World::new(500);
        for _ in 0..600 {
            spawn_ambient(
                &mut world,
                &mut rng,
                WeatherKind::Clear,
                Biome::Winter,
                Vec2::ZERO,
                1.0 / 60.0,
            );
        }
        assert!(!world.particles.is_empty());
        assert!(world.particles.iter().all(|p| p.kind == ParticleKind::Snow));

        let mut clear = World::new(500);
        for _ in 0..600 {
            spawn_ambient(
                &mut clear,
                &mut rng,
                WeatherKind::Clear,
                Biome::Jungle,
                Vec2::ZERO,
                1.0 / 60.0,
            );
        }
        assert!(clear.particles.is_empty());
    }
}
