//! # Generation Module
//!
//! Procedural level generation: two interchangeable digging strategies and the
//! shared pipeline that turns a dug map into a playable level.
//!
//! A strategy ([`BspGenerator`] or [`TunnelingGenerator`]) only carves rooms and
//! corridors. [`DungeonGenerator`] then seals stray void, repairs connectivity,
//! tags room interiors, chooses the start and end rooms and populates the level
//! with creatures, doors, terrain features and items.

pub mod bsp;
pub mod dungeon;
pub mod encounters;
pub mod features;
pub mod items;
pub mod tunneling;

pub use bsp::*;
pub use dungeon::*;
pub use encounters::*;
pub use features::*;
pub use items::*;
pub use tunneling::*;

use crate::{config, ConfigError, ContentData, DelveResult, EntityManager, GameMap, RoomIdAllocator};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Which digging strategy lays out the rooms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DungeonAlgorithm {
    /// Binary space partition, one room per leaf.
    #[default]
    Bsp,
    /// Random non-overlapping rooms chained by corridors.
    Tunneling,
}

impl std::str::FromStr for DungeonAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bsp" => Ok(DungeonAlgorithm::Bsp),
            "tunnel" | "tunneling" => Ok(DungeonAlgorithm::Tunneling),
            other => Err(format!("unknown dungeon algorithm '{}'", other)),
        }
    }
}

/// Configuration for level generation.
///
/// The defaults reproduce the classic layout: an 80x60 map, BSP to depth 7,
/// rooms at least 6 cells on a side, 70% door chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Map width in cells
    pub width: i32,
    /// Map height in cells
    pub height: i32,
    /// Digging strategy
    pub algorithm: DungeonAlgorithm,
    /// BSP recursion depth
    pub bsp_depth: u32,
    /// Minimum room width (walls included)
    pub min_room_width: i32,
    /// Minimum room height (walls included)
    pub min_room_height: i32,
    /// Largest allowed aspect ratio of a BSP partition before it must be split the other way
    pub max_split_ratio: f64,
    /// Tunneling room side range
    pub tunnel_min_room_size: i32,
    pub tunnel_max_room_size: i32,
    /// Rooms the tunneling strategy tries to place
    pub tunnel_attempts: u32,
    /// Chance an attempt stamps the prefab room instead (first time only)
    pub prefab_chance: f64,
    /// Chance an L-shaped corridor runs horizontally first
    pub horizontal_first_chance: f64,
    /// Chance a qualifying corridor opening receives a door
    pub door_chance: f64,
    /// Rooms holding more creatures than this stop receiving new ones
    pub max_creatures_per_room: usize,
    /// Random positions tried per creature
    pub placement_retries: u32,
    /// Join unreachable rooms to the rest of the level
    pub ensure_connectivity: bool,
    /// Full generation attempts before giving up on a degenerate layout
    pub generation_attempts: u32,
}

impl GenerationConfig {
    /// Creates a configuration for a map of the given size.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{DungeonAlgorithm, GenerationConfig};
    ///
    /// let config = GenerationConfig::new(40, 30);
    /// assert_eq!(config.algorithm, DungeonAlgorithm::Bsp);
    /// assert_eq!(config.bsp_depth, 7);
    /// assert!(config.ensure_connectivity);
    /// ```
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            algorithm: DungeonAlgorithm::Bsp,
            bsp_depth: config::DEFAULT_BSP_DEPTH,
            min_room_width: config::MIN_ROOM_SIZE,
            min_room_height: config::MIN_ROOM_SIZE,
            max_split_ratio: 1.5,
            tunnel_min_room_size: 5,
            tunnel_max_room_size: 16,
            tunnel_attempts: 30,
            prefab_chance: 0.2,
            horizontal_first_chance: 0.5,
            door_chance: 0.7,
            max_creatures_per_room: 4,
            placement_retries: 5,
            ensure_connectivity: true,
            generation_attempts: 10,
        }
    }

    /// Creates a configuration for testing with a small map.
    pub fn for_testing() -> Self {
        Self::new(40, 30)
    }

    pub fn with_algorithm(mut self, algorithm: DungeonAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Rejects settings the diggers cannot work with.
    ///
    /// Chances must lie in `0.0..=1.0`. Rooms need at least a wall ring around
    /// one floor cell, and the tunneling size range must not be empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// assert!(GenerationConfig::default().validate().is_ok());
    ///
    /// let mut config = GenerationConfig::default();
    /// config.door_chance = 2.0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        const SMALLEST_ROOM: i32 = 3;

        ConfigError::check_at_least("generation.width", self.width, SMALLEST_ROOM)?;
        ConfigError::check_at_least("generation.height", self.height, SMALLEST_ROOM)?;
        ConfigError::check_at_least("generation.min_room_width", self.min_room_width, SMALLEST_ROOM)?;
        ConfigError::check_at_least(
            "generation.min_room_height",
            self.min_room_height,
            SMALLEST_ROOM,
        )?;
        ConfigError::check_at_least(
            "generation.tunnel_min_room_size",
            self.tunnel_min_room_size,
            SMALLEST_ROOM,
        )?;
        ConfigError::check_at_least(
            "generation.tunnel_max_room_size",
            self.tunnel_max_room_size,
            self.tunnel_min_room_size,
        )?;
        ConfigError::check_at_least("generation.max_split_ratio", self.max_split_ratio, 1.0)?;
        ConfigError::check_at_least("generation.generation_attempts", self.generation_attempts, 1)?;

        ConfigError::check_chance("generation.prefab_chance", self.prefab_chance)?;
        ConfigError::check_chance(
            "generation.horizontal_first_chance",
            self.horizontal_first_chance,
        )?;
        ConfigError::check_chance("generation.door_chance", self.door_chance)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(config::DEFAULT_DUNGEON_WIDTH, config::DEFAULT_DUNGEON_HEIGHT)
    }
}

/// Mutable state threaded through one generation run.
pub struct GenerationContext<'a> {
    pub rng: &'a mut StdRng,
    pub entities: &'a mut EntityManager,
    pub room_ids: &'a mut RoomIdAllocator,
    pub content: &'a ContentData,
}

/// A digging strategy.
pub trait Generator {
    /// Carves rooms and corridors into a Void map.
    ///
    /// A strategy may set `map.start_room`; the shared pipeline picks one at
    /// random otherwise.
    fn dig(&self, map: &mut GameMap, ctx: &mut GenerationContext<'_>) -> DelveResult<()>;

    fn generator_type(&self) -> &'static str;
}

pub mod utils {
    use crate::{DelveError, DelveResult, GameMap};

    /// Rooms whose centre cannot be reached from the first room's centre.
    pub fn unreachable_rooms(map: &GameMap) -> Vec<crate::RoomId> {
        let Some(first) = map.rooms().first() else {
            return Vec::new();
        };
        let reachable = crate::reachable_from(map, first.center());
        map.rooms()
            .iter()
            .filter(|room| !reachable.contains(&room.center()))
            .map(|room| room.id)
            .collect()
    }

    /// Checks a finished level: distinct start and end rooms joined by a walkable path.
    pub fn validate_level(map: &GameMap) -> DelveResult<()> {
        let (start, end) = match (map.start_vec, map.end_vec) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(DelveError::GenerationFailed(
                    "level has no start or end position".to_string(),
                ))
            }
        };
        if map.start_room == map.end_room {
            return Err(DelveError::GenerationFailed(
                "start and end share a room".to_string(),
            ));
        }
        if !map.path_exists(start, end) {
            return Err(DelveError::GenerationFailed(format!(
                "no path from {} to {}",
                start, end
            )));
        }
        Ok(())
    }
}
