//! Skill chain (combo) state machine
//!
//! Idle until the first trick, then every trick inside the timeout window
//! extends the chain, adds `floor(base * multiplier)` and may raise the
//! multiplier up to `MAX_MULTIPLIER`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::{BASE_MULTIPLIER, MAX_MULTIPLIER};
use crate::tuning::ChainExpiry;

/// Recent tricks kept for display
pub const MAX_RECENT_EVENTS: usize = 5;

/// Chain rank, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillRank {
    #[default]
    Groovin,
    Wild,
    Ferocious,
    Mythic,
    Legend,
}

/// Descending threshold table; the first threshold met wins
pub const RANKS: [(u64, SkillRank); 5] = [
    (6000, SkillRank::Legend),
    (3000, SkillRank::Mythic),
    (1500, SkillRank::Ferocious),
    (500, SkillRank::Wild),
    (0, SkillRank::Groovin),
];

impl SkillRank {
    pub fn for_score(score: u64) -> Self {
        RANKS
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map(|(_, rank)| *rank)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillRank::Groovin => "GROOVIN",
            SkillRank::Wild => "WILD",
            SkillRank::Ferocious => "FEROCIOUS",
            SkillRank::Mythic => "MYTHIC",
            SkillRank::Legend => "LEGEND",
        }
    }
}

/// Scoring tricks the resolver reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trick {
    Coin,
    Bounce,
    Nest,
    Powerup,
    /// Release at high swing speed
    Launch,
    Takedown,
}

impl Trick {
    pub fn name(&self) -> &'static str {
        match self {
            Trick::Coin => "COIN",
            Trick::Bounce => "BOUNCE",
            Trick::Nest => "NEST RAID",
            Trick::Powerup => "POWER UP",
            Trick::Launch => "LAUNCH",
            Trick::Takedown => "TAKEDOWN",
        }
    }

    pub fn base_score(&self) -> u32 {
        match self {
            Trick::Coin => 10,
            Trick::Bounce => 15,
            Trick::Nest => 50,
            Trick::Powerup => 30,
            Trick::Launch => 25,
            Trick::Takedown => 100,
        }
    }

    pub fn multiplier_mod(&self) -> f32 {
        match self {
            Trick::Coin | Trick::Bounce => 0.1,
            Trick::Powerup | Trick::Launch => 0.2,
            Trick::Nest | Trick::Takedown => 0.5,
        }
    }
}

/// One recorded trick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEvent {
    pub trick: Trick,
    pub score: u32,
    pub multiplier_mod: f32,
}

/// What a trick did to the chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainUpdate {
    /// Points added to the chain score
    pub gained: u64,
    pub multiplier: f32,
    /// Set when the rank went up
    pub rank_up: Option<SkillRank>,
    /// Set on the trick that first hit `MAX_MULTIPLIER`
    pub reached_max: bool,
}

/// How a chain ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnd {
    Banked(u64),
    Discarded(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillChain {
    pub active: bool,
    /// Accumulated, not yet banked
    pub current_score: u64,
    pub multiplier: f32,
    pub events: VecDeque<SkillEvent>,
    /// Seconds until the chain expires
    pub timer: f32,
    pub rank: SkillRank,
}

impl Default for SkillChain {
    fn default() -> Self {
        Self {
            active: false,
            current_score: 0,
            multiplier: BASE_MULTIPLIER,
            events: VecDeque::with_capacity(MAX_RECENT_EVENTS),
            timer: 0.0,
            rank: SkillRank::Groovin,
        }
    }
}

impl SkillChain {
    /// Record a trick, starting a chain if idle
    pub fn trigger(&mut self, trick: Trick, timeout: f32) -> ChainUpdate {
        if !self.active {
            self.reset();
            self.active = true;
        }
        self.timer = timeout;

        let was_max = self.multiplier >= MAX_MULTIPLIER;
        let multiplier_mod = trick.multiplier_mod().max(0.0);
        self.multiplier = (self.multiplier + multiplier_mod).clamp(BASE_MULTIPLIER, MAX_MULTIPLIER);

        let base = trick.base_score();
        let gained = (base as f32 * self.multiplier).floor() as u64;
        self.current_score += gained;

        self.events.push_back(SkillEvent {
            trick,
            score: base,
            multiplier_mod,
        });
        while self.events.len() > MAX_RECENT_EVENTS {
            self.events.pop_front();
        }

        let rank = SkillRank::for_score(self.current_score);
        let rank_up = (rank > self.rank).then_some(rank);
        self.rank = rank;

        ChainUpdate {
            gained,
            multiplier: self.multiplier,
            rank_up,
            reached_max: !was_max && self.multiplier >= MAX_MULTIPLIER,
        }
    }

    /// Count down; returns how the chain ended if it expired this step
    pub fn update(&mut self, dt: f32, expiry: ChainExpiry) -> Option<ChainEnd> {
        if !self.active {
            return None;
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        let score = self.current_score;
        self.reset();
        Some(match expiry {
            ChainExpiry::Bank => ChainEnd::Banked(score),
            ChainExpiry::Discard => ChainEnd::Discarded(score),
        })
    }

    /// End the chain immediately and hand back its score
    pub fn take(&mut self) -> u64 {
        let score = if self.active { self.current_score } else { 0 };
        self.reset();
        score
    }

    /// Back to idle
    pub fn reset(&mut self) {
        self.active = false;
        self.current_score = 0;
        self.multiplier = BASE_MULTIPLIER;
        self.events.clear();
        self.timer = 0.0;
        self.rank = SkillRank::Groovin;
    }
}
