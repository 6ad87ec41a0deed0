//! Data-driven game balance
//!
//! Every value is a per-second rate (px/s, px/s², seconds) unless the name
//! says `per_frame`, in which case it is a 60 Hz reference factor that the
//! simulation rescales by `dt`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What happens to an expiring skill chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChainExpiry {
    /// Commit the chain score to the run score
    #[default]
    Bank,
    /// Drop the chain score
    Discard,
}

/// How the rope behaves as its integrity runs out
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RopeSlip {
    /// Full length until the snap
    #[default]
    Hard,
    /// Lengthen at `rate` px/s once fewer than `window` seconds remain
    Loosen { window: f32, rate: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Integration ===
    pub gravity: f32,
    pub air_drag_per_frame: f32,
    pub max_speed: f32,
    pub ceiling_restitution: f32,

    // === Input ===
    pub swing_force_base: f32,
    pub swing_force_per_level: f32,
    /// Backward pumping stops once vx is below this
    pub reverse_speed_limit: f32,
    pub air_control_base: f32,
    pub air_control_per_level: f32,
    pub fast_fall: f32,
    pub jump_impulse: f32,
    pub jump_cooldown: f32,

    // === Tether ===
    pub grapple_assist_radius: f32,
    pub min_rope_length: f32,
    pub rope_break_time: f32,
    pub rope_time_per_level: f32,
    pub launch_boost_per_level: f32,
    pub rope_slip: RopeSlip,

    // === Damage / void ===
    pub invulnerability_time: f32,
    pub safety_net_impulse: f32,

    // === Interactions ===
    pub flower_bounce: f32,
    pub web_drag_per_frame: f32,
    pub updraft_lift: f32,
    pub branch_stability_drain: f32,
    pub branch_impact_break_speed: f32,
    pub knockback: f32,
    pub magnet_radius_base: f32,
    pub magnet_radius_per_level: f32,
    pub magnet_pull_speed: f32,
    pub luck_chance_per_level: f32,

    // === Combo / fever ===
    pub chain_timeout: f32,
    pub chain_expiry: ChainExpiry,
    pub fever_base: f32,
    pub fever_per_level: f32,

    // === Weather ===
    pub wind_push: f32,
    pub rain_drag_per_frame: f32,

    // === Streaming ===
    pub lookahead: f32,
    pub cull_margin: f32,
    pub camera_follow_per_frame: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 1800.0,
            air_drag_per_frame: 0.99,
            max_speed: 1800.0,
            ceiling_restitution: -0.5,

            swing_force_base: 1800.0,
            swing_force_per_level: 360.0,
            reverse_speed_limit: -720.0,
            air_control_base: 1080.0,
            air_control_per_level: 180.0,
            fast_fall: 2880.0,
            jump_impulse: -720.0,
            jump_cooldown: 0.75,

            grapple_assist_radius: 250.0,
            min_rope_length: 20.0,
            rope_break_time: 4.5,
            rope_time_per_level: 0.5,
            launch_boost_per_level: 0.05,
            rope_slip: RopeSlip::Hard,

            invulnerability_time: 1.0,
            safety_net_impulse: -1500.0,

            flower_bounce: -600.0,
            web_drag_per_frame: 0.8,
            updraft_lift: 2400.0,
            branch_stability_drain: 60.0,
            branch_impact_break_speed: 1500.0,
            knockback: 600.0,
            magnet_radius_base: 60.0,
            magnet_radius_per_level: 30.0,
            magnet_pull_speed: 600.0,
            luck_chance_per_level: 0.1,

            chain_timeout: 2.5,
            chain_expiry: ChainExpiry::Bank,
            fever_base: 5.0,
            fever_per_level: 1.0,

            wind_push: 180.0,
            rain_drag_per_frame: 0.998,

            lookahead: 1000.0,
            cull_margin: 200.0,
            camera_follow_per_frame: 0.1,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let per_frame = [
            ("air_drag_per_frame", self.air_drag_per_frame),
            ("web_drag_per_frame", self.web_drag_per_frame),
            ("rain_drag_per_frame", self.rain_drag_per_frame),
            ("camera_follow_per_frame", self.camera_follow_per_frame),
        ];
        for (name, value) in per_frame {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidTuning(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        let positive = [
            ("max_speed", self.max_speed),
            ("chain_timeout", self.chain_timeout),
            ("min_rope_length", self.min_rope_length),
        ];
        for (name, value) in positive {
            // Also rejects NaN
            if !(value > 0.0) {
                return Err(ConfigError::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if let RopeSlip::Loosen { window, rate } = self.rope_slip {
            if window < 0.0 || rate < 0.0 {
                return Err(ConfigError::InvalidTuning(
                    "rope slip window and rate must be non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Tangential swing acceleration for a swing-force upgrade level
    pub fn swing_force(&self, level: u32, run_bonus: f32) -> f32 {
        self.swing_force_base
            + self.swing_force_per_level * level as f32
            + run_bonus * crate::consts::REFERENCE_HZ * crate::consts::REFERENCE_HZ
    }

    /// Horizontal air acceleration for an air-control upgrade level
    pub fn air_control(&self, level: u32) -> f32 {
        self.air_control_base + self.air_control_per_level * level as f32
    }

    /// Seconds of rope integrity at attach time
    pub fn rope_time(&self, level: u32, run_bonus: f32) -> f32 {
        self.rope_break_time + self.rope_time_per_level * level as f32 + run_bonus
    }

    /// Velocity multiplier applied on release
    pub fn launch_boost(&self, level: u32) -> f32 {
        1.0 + self.launch_boost_per_level * level as f32
    }

    pub fn fever_duration(&self, level: u32) -> f32 {
        self.fever_base + self.fever_per_level * level as f32
    }

    pub fn magnet_radius(&self, level: u32) -> f32 {
        if level == 0 {
            0.0
        } else {
            self.magnet_radius_base + self.magnet_radius_per_level * level as f32
        }
    }
}
