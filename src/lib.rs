//! Vine Swing - rope-swinging side-scroller simulation core
//!
//! Core modules:
//! - `sim`: Simulation (tether physics, level streaming, collisions, combos)
//! - `levels`: Static level table and biome descriptors
//! - `save`: Upgrade/currency record read at run start, run summary merge
//! - `tuning`: Data-driven game balance
//! - `settings`: Quality preferences (particle caps, trails)

pub mod error;
pub mod levels;
pub mod save;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use levels::{Biome, EnemyType, LevelConfig, TutorialKind, WeatherKind};
pub use save::{RunSummary, SaveData, Upgrades};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Reference frame rate the balance numbers were authored against
    pub const REFERENCE_HZ: f32 = 60.0;
    /// Default simulation timestep (one step per rendered frame)
    pub const SIM_DT: f32 = 1.0 / REFERENCE_HZ;

    /// Visible play area
    pub const CANVAS_WIDTH: f32 = 1024.0;
    pub const CANVAS_HEIGHT: f32 = 600.0;

    /// Hard ceiling (world y, smaller is higher)
    pub const CEILING_LIMIT: f32 = -200.0;
    /// Below this line the void countdown runs
    pub const VOID_LIMIT: f32 = CANVAS_HEIGHT + 300.0;
    /// Seconds a player may spend below the void line
    pub const VOID_TIMER_MAX_SECONDS: f32 = 3.0;

    /// World pixels per meter of distance
    pub const PIXELS_PER_METER: f32 = 20.0;

    /// Player lives
    pub const MAX_LIVES: u8 = 3;
    /// Player bounding box
    pub const PLAYER_SIZE: f32 = 30.0;
    /// Trail samples kept for rendering
    pub const TRAIL_LENGTH: usize = 20;

    /// Combo multiplier bounds
    pub const BASE_MULTIPLIER: f32 = 1.0;
    pub const MAX_MULTIPLIER: f32 = 5.0;

    /// Highest upgrade tier of the rope upgrade (rope no longer decays)
    pub const MAX_ROPE_TIER: u32 = 5;
    /// Number of levels in the campaign
    pub const MAX_LEVEL: u32 = 10;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert a per-frame multiplicative factor to one applied over `dt` seconds
#[inline]
pub fn damping(per_frame: f32, dt: f32) -> f32 {
    per_frame.powf(dt * consts::REFERENCE_HZ)
}

/// Convert a per-frame probability to the probability of at least one hit over `dt` seconds
#[inline]
pub fn chance_per_step(per_frame: f32, dt: f32) -> f32 {
    1.0 - (1.0 - per_frame.clamp(0.0, 1.0)).powf(dt * consts::REFERENCE_HZ)
}

#[cfg(test)]
mod tests {
    use super::*;
    use consts::SIM_DT;

    #[test]
    fn test_damping_matches_reference_frame() {
        assert!((damping(0.99, SIM_DT) - 0.99).abs() < 1e-6);
        assert!((damping(0.99, 2.0 * SIM_DT) - 0.99 * 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_chance_per_step() {
        assert!((chance_per_step(0.1, SIM_DT) - 0.1).abs() < 1e-6);
        assert_eq!(chance_per_step(0.0, 1.0), 0.0);
        assert!((chance_per_step(1.0, 0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(4.0, 8.0, 0.0), 4.0);
    }
}
