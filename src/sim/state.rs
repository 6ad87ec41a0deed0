//! Simulation data model
//!
//! Everything the renderer reads after a step lives here. Positions are in
//! world pixels; velocities in px/s; timers in seconds.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ability::AbilityKind;
use super::combo::SkillRank;
use super::geom::Aabb;
use crate::consts::*;
use crate::levels::{EnemyType, WeatherKind};
use crate::save::Upgrades;

/// Packed 0xRRGGBBAA render hint
pub type Color = u32;

/// Where a fresh run places the player
pub const PLAYER_START: Vec2 = Vec2::new(215.0, 315.0);
/// Initial drift to the right (5 px/frame)
pub const PLAYER_START_VEL: Vec2 = Vec2::new(300.0, 0.0);

/// The swinging character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Center of the bounding box
    pub pos: Vec2,
    /// Center at the start of the last step
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// Render rotation (radians)
    pub rotation: f32,

    // === Tether ===
    pub is_swinging: bool,
    pub tether_point: Option<Vec2>,
    /// Entity the tether hangs from
    pub anchor_id: Option<u32>,
    pub rope_length: f32,
    /// Seconds of rope integrity remaining
    pub rope_timer: f32,

    // === Health ===
    pub lives: u8,
    pub armor_stack: u32,
    pub invulnerable_time: f32,

    // === Timers ===
    pub jump_cooldown: f32,
    /// Seconds spent below the void line
    pub fall_timer: f32,

    /// Recent centers for the renderer, newest last
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,

    // === Per-run bonuses ===
    /// Extra seconds of rope integrity from pickups
    pub run_rope_bonus: f32,
    /// Extra swing force (per-frame units) from pickups
    pub run_force_bonus: f32,

    // === Flags ===
    pub has_used_net: bool,
    pub is_fever: bool,
    pub fever_time: f32,
    pub in_fog: bool,
    /// Branch currently stood on
    pub standing_on: Option<u32>,
    /// Fastest speed reached this run
    pub max_speed: f32,
}

impl Player {
    /// Fresh player for a run start
    pub fn new(upgrades: &Upgrades) -> Self {
        Self {
            pos: PLAYER_START,
            prev_pos: PLAYER_START,
            vel: PLAYER_START_VEL,
            size: Vec2::splat(PLAYER_SIZE),
            rotation: 0.0,
            is_swinging: false,
            tether_point: None,
            anchor_id: None,
            rope_length: 0.0,
            rope_timer: 0.0,
            lives: MAX_LIVES,
            armor_stack: upgrades.armor,
            invulnerable_time: 0.0,
            jump_cooldown: 0.0,
            fall_timer: 0.0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
            run_rope_bonus: 0.0,
            run_force_bonus: 0.0,
            has_used_net: false,
            is_fever: false,
            fever_time: 0.0,
            in_fog: false,
            standing_on: None,
            max_speed: 0.0,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_time > 0.0
    }

    /// Push the current center onto the trail, keeping at most `cap` samples
    pub fn record_trail(&mut self, cap: usize) {
        if cap == 0 {
            self.trail.clear();
            return;
        }
        self.trail.push_back(self.pos);
        while self.trail.len() > cap {
            self.trail.pop_front();
        }
    }

    /// Drop the tether without any release boost
    pub fn detach(&mut self) {
        self.is_swinging = false;
        self.tether_point = None;
        self.anchor_id = None;
    }
}

/// Collapse animation of a broken branch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Falling {
    pub vel: Vec2,
    pub angle: f32,
    pub spin: f32,
}

/// Standable platform state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Remaining standing budget; `None` never breaks
    pub stability: Option<f32>,
    /// Set once and never cleared
    broken: Option<Falling>,
}

impl Branch {
    pub fn new(stability: Option<f32>) -> Self {
        Self {
            stability,
            broken: None,
        }
    }

    pub fn unbreakable() -> Self {
        Self::new(None)
    }

    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    pub fn falling(&self) -> Option<&Falling> {
        self.broken.as_ref()
    }

    pub fn falling_mut(&mut self) -> Option<&mut Falling> {
        self.broken.as_mut()
    }

    /// Drain the standing budget; returns true if this broke the branch
    pub fn wear(&mut self, amount: f32) -> bool {
        if self.is_broken() {
            return false;
        }
        let Some(stability) = self.stability.as_mut() else {
            return false;
        };
        *stability -= amount;
        if *stability <= 0.0 {
            self.break_off(0.0);
            return true;
        }
        false
    }

    /// Break irreversibly. Unbreakable branches ignore this.
    pub fn break_off(&mut self, spin: f32) -> bool {
        if self.is_broken() || self.stability.is_none() {
            return false;
        }
        self.broken = Some(Falling {
            vel: Vec2::ZERO,
            angle: 0.0,
            spin,
        });
        true
    }
}

/// Pickup bonus flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    /// +1 s rope integrity for the rest of the run
    Rope,
    /// +0.05 swing force for the rest of the run
    Force,
}

/// Terrain and prop kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Tree,
    Branch(Branch),
    Vine,
    Coin,
    Lake,
    Lava,
    Web,
    Portal,
    Stalactite,
    Nest,
    Waterfall,
    WaterPocket,
    Flower,
    Lilypad,
    Updraft,
    Powerup(PowerupKind),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Tree => "tree",
            EntityKind::Branch(_) => "branch",
            EntityKind::Vine => "vine",
            EntityKind::Coin => "coin",
            EntityKind::Lake => "lake",
            EntityKind::Lava => "lava",
            EntityKind::Web => "web",
            EntityKind::Portal => "portal",
            EntityKind::Stalactite => "stalactite",
            EntityKind::Nest => "nest",
            EntityKind::Waterfall => "waterfall",
            EntityKind::WaterPocket => "water_pocket",
            EntityKind::Flower => "flower",
            EntityKind::Lilypad => "lilypad",
            EntityKind::Updraft => "updraft",
            EntityKind::Powerup(_) => "powerup",
        }
    }
}

/// A world prop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub color: Color,
    /// Silhouette outline for non-rectangular props (world space)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly: Option<Vec<Vec2>>,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind, pos: Vec2, size: Vec2, color: Color) -> Self {
        Self {
            id,
            kind,
            pos,
            size,
            color,
            poly: None,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    /// Whether a tether may attach here
    pub fn is_anchor(&self) -> bool {
        match &self.kind {
            EntityKind::Tree | EntityKind::Vine | EntityKind::Stalactite => true,
            EntityKind::Branch(branch) => !branch.is_broken(),
            _ => false,
        }
    }

    pub fn branch(&self) -> Option<&Branch> {
        match &self.kind {
            EntityKind::Branch(branch) => Some(branch),
            _ => None,
        }
    }

    pub fn branch_mut(&mut self) -> Option<&mut Branch> {
        match &mut self.kind {
            EntityKind::Branch(branch) => Some(branch),
            _ => None,
        }
    }
}

/// Per-type enemy movement state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyKind {
    Bird,
    Eagle,
    /// Hangs from a thread and bobs around `anchor_y`
    Spider { anchor_y: f32 },
    /// Sine-wave dive
    Bat { base_y: f32, phase: f32 },
    /// Pendulum from a fixed anchor
    Troll {
        anchor: Vec2,
        angle: f32,
        angular_vel: f32,
        length: f32,
    },
    /// Crawls along a branch
    Slug { branch_id: u32 },
    Snake { base_y: f32, phase: f32 },
    /// Lurks at a fluid surface and lunges
    Crocodile { surface_y: f32, attack_timer: f32 },
}

impl EnemyKind {
    pub fn ty(&self) -> EnemyType {
        match self {
            EnemyKind::Bird => EnemyType::Bird,
            EnemyKind::Eagle => EnemyType::Eagle,
            EnemyKind::Spider { .. } => EnemyType::Spider,
            EnemyKind::Bat { .. } => EnemyType::Bat,
            EnemyKind::Troll { .. } => EnemyType::Troll,
            EnemyKind::Slug { .. } => EnemyType::Slug,
            EnemyKind::Snake { .. } => EnemyType::Snake,
            EnemyKind::Crocodile { .. } => EnemyType::Crocodile,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub health: u8,
    pub color: Color,
}

impl Enemy {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn ty(&self) -> EnemyType {
        self.kind.ty()
    }

    /// Heavy enemies shove the player after a hit
    pub fn knocks_back(&self) -> bool {
        matches!(
            self.kind,
            EnemyKind::Troll { .. } | EnemyKind::Eagle | EnemyKind::Crocodile { .. }
        )
    }
}

/// Visual flavour of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Spark,
    Wood,
    Leaf,
    Egg,
    Rain,
    Snow,
    Ash,
    Spore,
    Wind,
}

/// Cosmetic particle; never collides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left
    pub life: f32,
    pub max_life: f32,
    pub color: Color,
    pub size: f32,
    pub kind: ParticleKind,
}

/// Score pop-ups and warnings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub vel: Vec2,
    pub text: String,
    pub color: Color,
    pub size: f32,
    /// Seconds left
    pub life: f32,
}

/// Floating text lifetime (60 frames)
pub const FLOATING_TEXT_LIFE: f32 = 1.0;
/// Floating text drift (-1 px/frame)
pub const FLOATING_TEXT_VEL: Vec2 = Vec2::new(0.0, -60.0);

/// Why a lost run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Enemy(EnemyType),
    Void,
}

impl std::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeathCause::Enemy(ty) => write!(f, "hit by {}", ty.as_str()),
            DeathCause::Void => write!(f, "fell into the void"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Won,
    Lost(DeathCause),
}

/// What a damage request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// Zero damage, invulnerable or already dead
    Ignored,
    ArmorAbsorbed,
    LifeLost,
    Killed,
}

/// Fire-and-forget signals for audio/VFX collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    TetherAttached { anchor_id: u32 },
    TetherSnapped,
    TetherReleased,
    Jumped,
    CoinCollected { amount: u32, lucky: bool },
    PowerupCollected(PowerupKind),
    NestCracked,
    BranchBroken { id: u32 },
    Damaged { lives: u8 },
    ArmorBroken,
    VoidWarning,
    SafetyNet,
    FeverStarted,
    ChainBanked { score: u64 },
    RankUp(SkillRank),
    WeatherChanged(WeatherKind),
    AbilityUsed(AbilityKind),
    EnemyDefeated(EnemyType),
    Milestone { meters: u32 },
    RunEnded(RunOutcome),
}
