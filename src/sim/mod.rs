//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Variable timestep in seconds, balance authored at 60 Hz
//! - Seeded RNG only
//! - Stable iteration order (creation order)
//! - No rendering, audio or platform dependencies

pub mod ability;
pub mod collision;
pub mod combo;
pub mod enemy;
pub mod geom;
pub mod levelgen;
pub mod physics;
pub mod state;
pub mod tick;
pub mod tutorial;
pub mod weather;
pub mod world;

pub use ability::{Abilities, AbilityKind};
pub use combo::{SkillChain, SkillRank, Trick};
pub use geom::Aabb;
pub use levelgen::Generator;
pub use state::{
    Branch, DeathCause, Enemy, EnemyKind, Entity, EntityKind, GameEvent, Particle, ParticleKind,
    Player, PowerupKind, RunOutcome,
};
pub use tick::{Simulation, Snapshot, TickInput};
pub use tutorial::{Tutorial, TutorialStep};
pub use weather::Weather;
pub use world::World;
