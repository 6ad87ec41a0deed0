//! Save-data boundary
//!
//! The core reads a `SaveData` at run start and hands back a `RunSummary`
//! at run end. Storage itself belongs to the host.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_LEVEL, MAX_ROPE_TIER};
use crate::error::ConfigError;
use crate::sim::state::RunOutcome;

/// Permanent upgrade levels bought in the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Upgrades {
    pub rope_length: u32,
    pub swing_force: u32,
    pub armor: u32,
    pub magnetism: u32,
    pub fever_duration: u32,
    pub luck: u32,
    pub launch_boost: u32,
    pub air_control: u32,
    pub safety_net: u32,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            rope_length: 1,
            swing_force: 1,
            armor: 0,
            magnetism: 0,
            fever_duration: 0,
            luck: 0,
            launch_boost: 0,
            air_control: 0,
            safety_net: 0,
        }
    }
}

impl Upgrades {
    /// Rope integrity no longer decays at the top tier
    pub fn rope_is_max_tier(&self) -> bool {
        self.rope_length >= MAX_ROPE_TIER
    }
}

/// Persistent player progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    pub total_tokens: u64,
    pub high_score: u64,
    pub max_level_reached: u32,
    pub skins: Vec<String>,
    pub equipped_skin: String,
    pub upgrades: Upgrades,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            total_tokens: 0,
            high_score: 0,
            max_level_reached: 1,
            skins: vec!["default".to_string()],
            equipped_skin: "default".to_string(),
            upgrades: Upgrades::default(),
        }
    }
}

/// What a finished run hands back to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub level_id: u32,
    pub outcome: RunOutcome,
    /// Permanent run score (distance milestones + banked chains)
    pub score: u64,
    /// Currency collected during the run
    pub tokens: u64,
    /// Meters travelled
    pub distance: u32,
    /// Fastest speed reached (px/s)
    pub max_speed: f32,
    /// Level unlocked by this run, if any
    pub unlocked_level: Option<u32>,
}

/// Result of merging a run into the save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeResult {
    pub new_high_score: bool,
    pub unlocked_level: Option<u32>,
}

impl SaveData {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether a level may be started
    pub fn is_unlocked(&self, level_id: u32) -> bool {
        level_id <= self.max_level_reached
    }

    /// The level a win on `level_id` would unlock
    pub fn unlock_after_win(&self, level_id: u32) -> Option<u32> {
        (level_id == self.max_level_reached && self.max_level_reached < MAX_LEVEL)
            .then_some(level_id + 1)
    }

    /// Check if a score beats the stored high score
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.high_score
    }

    /// Fold a finished run into the save
    pub fn merge_run(&mut self, run: &RunSummary) -> MergeResult {
        self.total_tokens += run.tokens;
        let new_high_score = self.qualifies(run.score);
        if new_high_score {
            self.high_score = run.score;
        }
        let unlocked_level = run
            .unlocked_level
            .filter(|&level| level > self.max_level_reached);
        if let Some(level) = unlocked_level {
            self.max_level_reached = level.min(MAX_LEVEL);
        }
        log::info!(
            "Merged run on level {}: +{} tokens (total {}), high score {}",
            run.level_id,
            run.tokens,
            self.total_tokens,
            self.high_score
        );
        MergeResult {
            new_high_score,
            unlocked_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::DeathCause;

    fn summary(outcome: RunOutcome, score: u64, tokens: u64, unlocked: Option<u32>) -> RunSummary {
        RunSummary {
            level_id: 1,
            outcome,
            score,
            tokens,
            distance: 100,
            max_speed: 900.0,
            unlocked_level: unlocked,
        }
    }

    #[test]
    fn test_merge_win_unlocks_next_level() {
        let mut save = SaveData::default();
        assert_eq!(save.unlock_after_win(1), Some(2));
        let result = save.merge_run(&summary(RunOutcome::Won, 500, 12, Some(2)));
        assert!(result.new_high_score);
        assert_eq!(result.unlocked_level, Some(2));
        assert_eq!(save.max_level_reached, 2);
        assert_eq!(save.total_tokens, 12);
        assert_eq!(save.high_score, 500);
    }

    #[test]
    fn test_merge_loss_keeps_tokens_and_best_score() {
        let mut save = SaveData {
            high_score: 1000,
            ..SaveData::default()
        };
        let lost = RunOutcome::Lost(DeathCause::Void);
        let result = save.merge_run(&summary(lost, 200, 5, None));
        assert!(!result.new_high_score);
        assert_eq!(save.high_score, 1000);
        assert_eq!(save.total_tokens, 5);
        assert_eq!(save.max_level_reached, 1);
    }

    #[test]
    fn test_unlock_only_from_frontier_level() {
        let save = SaveData {
            max_level_reached: 4,
            ..SaveData::default()
        };
        assert_eq!(save.unlock_after_win(2), None);
        assert_eq!(save.unlock_after_win(4), Some(5));
        let done = SaveData {
            max_level_reached: MAX_LEVEL,
            ..SaveData::default()
        };
        assert_eq!(done.unlock_after_win(MAX_LEVEL), None);
        assert!(done.is_unlocked(7));
    }

    #[test]
    fn test_old_saves_fill_missing_upgrades() {
        let json = r#"{"total_tokens": 40, "upgrades": {"rope_length": 5, "armor": 2}}"#;
        let save = SaveData::from_json(json).unwrap();
        assert_eq!(save.total_tokens, 40);
        assert_eq!(save.upgrades.armor, 2);
        assert_eq!(save.upgrades.swing_force, 1);
        assert_eq!(save.upgrades.safety_net, 0);
        assert!(save.upgrades.rope_is_max_tier());
        let round = SaveData::from_json(&save.to_json().unwrap()).unwrap();
        assert_eq!(round, save);
    }
}
