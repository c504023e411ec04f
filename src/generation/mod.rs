//! # Generation Module
//!
//! Procedural level generation.
//!
//! A level is built in stages, each in its own module:
//!
//! 1. [`partitioner`] splits the level into rectangular sections
//! 2. [`rooms`] carves a room into every section
//! 3. [`connector`] links neighbouring sections into one connected graph
//! 4. [`corridor`] carves the links into the tile grid
//! 5. [`decorator`] turns placeholder tiles into their final look
//! 6. [`items`] and [`encounters`] populate the finished level
//!
//! [`dungeon`] wires the stages together and stacks levels into a dungeon.

pub mod connector;
pub mod corridor;
pub mod decorator;
pub mod dungeon;
pub mod encounters;
pub mod items;
pub mod partitioner;
pub mod rooms;

pub use connector::*;
pub use corridor::*;
pub use decorator::*;
pub use dungeon::*;
pub use encounters::*;
pub use items::*;
pub use partitioner::*;
pub use rooms::*;

use crate::{config, CatacombResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// How a level is divided into sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartitionPolicy {
    /// Uniform grid of equally sized sections
    Grid { rows: u32, cols: u32 },
    /// Recursive binary splitting down to a minimum leaf size
    Bsp { min_width: u32, min_height: u32 },
}

/// Configuration for procedural generation.
///
/// Level configurations override these values where they set their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Level width in tiles
    pub width: u32,
    /// Level height in tiles
    pub height: u32,
    pub partition: PartitionPolicy,
    /// Smallest room side length
    pub min_room_size: u32,
    /// Attempts before a level is declared a failure
    pub max_attempts: u32,
    /// Items placed on each level
    pub item_count: usize,
    /// Creatures placed on each level
    pub creature_count: usize,
}

impl GenerationConfig {
    /// Creates the standard configuration for the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use catacomb::{GenerationConfig, PartitionPolicy};
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert_eq!(config.partition, PartitionPolicy::Grid { rows: 3, cols: 4 });
    /// assert!(config.min_room_size >= 3);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: config::DEFAULT_LEVEL_WIDTH,
            height: config::DEFAULT_LEVEL_HEIGHT,
            partition: PartitionPolicy::Grid { rows: 3, cols: 4 },
            min_room_size: 3,
            max_attempts: 10,
            item_count: 6,
            creature_count: 4,
        }
    }

    /// Creates a configuration for testing with smaller, simpler levels.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            width: 40,
            height: 20,
            partition: PartitionPolicy::Grid { rows: 2, cols: 2 },
            min_room_size: 3,
            max_attempts: 3,
            item_count: 2,
            creature_count: 1,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Something that builds a `T` from a configuration and a seeded generator.
pub trait Generator<T> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CatacombResult<T>;

    /// Checks a finished `T`; failures are [`crate::CatacombError::GenerationFailed`].
    fn validate(&self, content: &T, config: &GenerationConfig) -> CatacombResult<()>;

    /// Name used in log lines.
    fn generator_type(&self) -> &'static str;
}

/// Helpers shared by the generation stages.
pub mod utils {
    use crate::{CatacombError, CatacombResult, GenerationConfig, Level};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Validates that a level has walkable space and no isolated pockets.
    pub fn validate_level(level: &Level) -> CatacombResult<()> {
        let walkable = level
            .positions()
            .filter(|pos| !level.blocks_movement(*pos))
            .count();
        if walkable == 0 {
            return Err(CatacombError::GenerationFailed(
                "Level has no walkable tiles".to_string(),
            ));
        }
        if !level.is_fully_connected() {
            return Err(CatacombError::GenerationFailed(format!(
                "Level {} has unreachable areas",
                level.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Level, Position, TileId};

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.width, config::DEFAULT_LEVEL_WIDTH);
        assert!(config.max_attempts > 0);
        assert_eq!(GenerationConfig::default().seed, 42);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = GenerationConfig {
            partition: PartitionPolicy::Bsp {
                min_width: 8,
                min_height: 6,
            },
            ..GenerationConfig::for_testing(3)
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"bsp\""));
        let back: GenerationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_level() {
        let solid = Level::new(10, 10, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
        assert!(utils::validate_level(&solid).is_err());

        let mut split = solid.clone();
        split.set_wall(Position::new(1, 1), TileId::WALL_EMPTY);
        split.set_wall(Position::new(5, 5), TileId::WALL_EMPTY);
        assert!(utils::validate_level(&split).is_err());

        split.set_wall(Position::new(5, 5), TileId::WALL_GROUND);
        split.set_wall(Position::new(2, 1), TileId::WALL_EMPTY);
        assert!(utils::validate_level(&split).is_ok());
    }
}
