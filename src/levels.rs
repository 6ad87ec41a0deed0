//! Level table and biome descriptors
//!
//! A `LevelConfig` is handed to the simulation at run start and stays
//! immutable for the whole run.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::state::Color;

/// Environmental theme of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Biome {
    Jungle,
    Winter,
    Swamp,
    Autumn,
    Volcano,
    Cave,
}

/// Ambient weather
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherKind {
    #[default]
    Clear,
    Windy,
    Rain,
    Fog,
}

/// Onboarding sequence attached to a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TutorialKind {
    #[default]
    None,
    Basic,
    Advanced,
}

/// Enemy species a level may spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    Bird,
    Eagle,
    Spider,
    Bat,
    Troll,
    Slug,
    Snake,
    Crocodile,
}

impl EnemyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyType::Bird => "bird",
            EnemyType::Eagle => "eagle",
            EnemyType::Spider => "spider",
            EnemyType::Bat => "bat",
            EnemyType::Troll => "troll",
            EnemyType::Slug => "slug",
            EnemyType::Snake => "snake",
            EnemyType::Crocodile => "crocodile",
        }
    }
}

/// Render and generation hints for a biome
#[derive(Debug, Clone, Copy)]
pub struct BiomeStyle {
    pub canopy: Color,
    pub trunk: Color,
    pub branch: Color,
    /// Vertical spread of a branch ladder
    pub branch_spread: f32,
}

impl Biome {
    pub fn style(&self) -> BiomeStyle {
        match self {
            Biome::Jungle => BiomeStyle {
                canopy: 0x2E7D32FF,
                trunk: 0x3E2723FF,
                branch: 0x4E342EFF,
                branch_spread: 800.0,
            },
            Biome::Autumn => BiomeStyle {
                canopy: 0xD84315FF,
                trunk: 0x3E2723FF,
                branch: 0x4E342EFF,
                branch_spread: 300.0,
            },
            Biome::Winter => BiomeStyle {
                canopy: 0x81D4FAFF,
                trunk: 0x5D4037FF,
                branch: 0x455A64FF,
                branch_spread: 300.0,
            },
            Biome::Swamp => BiomeStyle {
                canopy: 0x33691EFF,
                trunk: 0x3E2723FF,
                branch: 0x4E342EFF,
                branch_spread: 300.0,
            },
            Biome::Volcano => BiomeStyle {
                canopy: 0x3E2723FF,
                trunk: 0x212121FF,
                branch: 0x333333FF,
                branch_spread: 300.0,
            },
            Biome::Cave => BiomeStyle {
                canopy: 0x546E7AFF,
                trunk: 0x37474FFF,
                branch: 0x4E342EFF,
                branch_spread: 300.0,
            },
        }
    }

    /// Base chance of a fluid pool per segment (swamp and volcano only)
    pub fn liquid_chance(&self) -> f32 {
        match self {
            Biome::Swamp => 0.8,
            Biome::Volcano => 0.3,
            _ => 0.0,
        }
    }
}

/// Static per-level descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Run-end distance in meters
    pub target_distance: u32,
    pub biome: Biome,
    pub difficulty: f32,
    #[serde(default)]
    pub allowed_enemies: Vec<EnemyType>,
    #[serde(default)]
    pub allowed_weather: Vec<WeatherKind>,
    #[serde(default)]
    pub tutorial: TutorialKind,
    /// Overrides the biome's fluid pool chance
    #[serde(default)]
    pub liquid_chance: Option<f32>,
}

impl LevelConfig {
    /// Target distance in world pixels
    pub fn target_x(&self) -> f32 {
        self.target_distance as f32 * crate::consts::PIXELS_PER_METER
    }

    pub fn liquid_chance(&self) -> f32 {
        self.liquid_chance.unwrap_or_else(|| self.biome.liquid_chance())
    }

    /// Weather the level starts in
    pub fn initial_weather(&self) -> WeatherKind {
        self.allowed_weather.first().copied().unwrap_or_default()
    }

    /// Check the descriptor is usable by the simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidLevel {
            id: self.id,
            reason: reason.to_string(),
        };
        if self.target_distance == 0 {
            return Err(invalid("target distance must be positive"));
        }
        if !self.difficulty.is_finite() || self.difficulty < 0.0 {
            return Err(invalid("difficulty must be a non-negative number"));
        }
        if let Some(chance) = self.liquid_chance {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid("liquid chance must be within [0, 1]"));
            }
        }
        if self.allowed_weather.is_empty() {
            log::warn!("Level {} has no weather list, defaulting to clear skies", self.id);
        }
        Ok(())
    }
}

/// Parse and validate a level table from JSON
pub fn load_levels(json: &str) -> Result<Vec<LevelConfig>, ConfigError> {
    let levels: Vec<LevelConfig> = serde_json::from_str(json)?;
    if levels.is_empty() {
        return Err(ConfigError::EmptyLevelTable);
    }
    for level in &levels {
        level.validate()?;
    }
    log::info!("Loaded {} levels", levels.len());
    Ok(levels)
}

/// Look up a level by id
pub fn find_level(levels: &[LevelConfig], id: u32) -> Result<&LevelConfig, ConfigError> {
    levels
        .iter()
        .find(|l| l.id == id)
        .ok_or(ConfigError::UnknownLevel(id))
}

/// The campaign shipped with the game
pub fn builtin_levels() -> Vec<LevelConfig> {
    use Biome::*;
    use EnemyType::*;
    use WeatherKind::*;

    let level = |id: u32,
                 name: &str,
                 description: &str,
                 target_distance: u32,
                 biome: Biome,
                 difficulty: f32,
                 allowed_enemies: &[EnemyType],
                 allowed_weather: &[WeatherKind],
                 tutorial: TutorialKind| LevelConfig {
        id,
        name: name.to_string(),
        description: description.to_string(),
        target_distance,
        biome,
        difficulty,
        allowed_enemies: allowed_enemies.to_vec(),
        allowed_weather: allowed_weather.to_vec(),
        tutorial,
        liquid_chance: None,
    };

    #[rustfmt::skip]
    let mut levels = vec![
        level(1, "Elven Outskirts", "The edge of the Kingdom.", 600, Jungle, 0.0,
              &[], &[Clear], TutorialKind::Basic),
        level(2, "Royal Canopy", "Deep in the Elven woods.", 1000, Jungle, 1.0,
              &[Bird], &[Clear], TutorialKind::Advanced),
        level(3, "The Great Lake", "Endless water below.", 1500, Swamp, 3.0,
              &[Bird, Snake, Crocodile], &[Clear, Rain], TutorialKind::None),
        level(4, "Misty Waters", "Fog rolls over the lake.", 2000, Swamp, 4.0,
              &[Eagle, Spider, Crocodile, Slug], &[Fog, Rain], TutorialKind::None),
        level(5, "Troll Valley", "Dark, damp, and dangerous.", 2500, Cave, 5.0,
              &[Spider, Bat, Troll], &[Clear], TutorialKind::None),
        level(6, "Lava Lake", "The floor is literal lava.", 3000, Volcano, 6.0,
              &[Bat, Eagle], &[Clear, Windy], TutorialKind::None),
        level(7, "Rocky Slopes", "Steep climb.", 3500, Volcano, 7.0,
              &[Eagle, Spider], &[Windy], TutorialKind::None),
        level(8, "Ash Storm", "Visibility low.", 4000, Volcano, 8.0,
              &[Eagle, Spider, Bat], &[Windy, Fog], TutorialKind::None),
        level(9, "The Peak", "Almost there.", 4500, Volcano, 9.0,
              &[Bird, Spider, Eagle, Crocodile, Bat], &[Windy], TutorialKind::None),
        level(10, "Magma Core", "The final test.", 5000, Volcano, 10.0,
              &[Bird, Spider, Eagle, Bat, Snake, Troll], &[Rain, Windy, Fog], TutorialKind::None),
    ];
    // The lava lake is nearly wall-to-wall fluid
    levels[5].liquid_chance = Some(0.9);
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_are_valid() {
        let levels = builtin_levels();
        assert_eq!(levels.len(), 10);
        for level in &levels {
            level.validate().unwrap();
        }
        assert_eq!(find_level(&levels, 6).unwrap().liquid_chance(), 0.9);
        assert_eq!(find_level(&levels, 3).unwrap().liquid_chance(), 0.8);
    }

    #[test]
    fn test_load_levels_from_json() {
        let json = r#"[
            {
                "id": 1,
                "name": "Test Grove",
                "target_distance": 300,
                "biome": "CAVE",
                "difficulty": 2.0,
                "allowed_enemies": ["spider", "bat"],
                "allowed_weather": ["FOG"],
                "tutorial": "NONE"
            }
        ]"#;
        let levels = load_levels(json).unwrap();
        assert_eq!(levels[0].biome, Biome::Cave);
        assert_eq!(levels[0].allowed_enemies, vec![EnemyType::Spider, EnemyType::Bat]);
        assert_eq!(levels[0].initial_weather(), WeatherKind::Fog);
        assert_eq!(levels[0].target_x(), 6000.0);
    }

    #[test]
    fn test_load_levels_rejects_bad_input() {
        assert!(matches!(load_levels("[]"), Err(ConfigError::EmptyLevelTable)));
        assert!(matches!(load_levels("{"), Err(ConfigError::Json(_))));

        let json = r#"[{
            "id": 4,
            "name": "x",
            "target_distance": 0,
            "biome": "JUNGLE",
            "difficulty": 1.0
        }]"#;
        assert!(matches!(
            load_levels(json),
            Err(ConfigError::InvalidLevel { id: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_level() {
        let levels = builtin_levels();
        assert!(matches!(find_level(&levels, 42), Err(ConfigError::UnknownLevel(42))));
    }

    #[test]
    fn test_empty_weather_defaults_to_clear() {
        let mut level = builtin_levels().remove(0);
        level.allowed_weather.clear();
        assert_eq!(level.initial_weather(), WeatherKind::Clear);
        assert!(level.validate().is_ok());
    }
}
