//! # Delve
//!
//! Simulation core for a turn-based, grid-based dungeon crawler.
//!
//! ## Architecture Overview
//!
//! The crate knows nothing about drawing or input devices. A front end feeds it
//! [`PlayerAction`]s and reads back grid cells, the visible set and messages.
//!
//! - **Geometry**: [`Vector2`], [`Rect`] and [`Direction`] primitives
//! - **World**: [`GameMap`] grids of [`GameCell`]s, [`Room`]s and the owning [`World`]
//! - **Entity Registry**: [`EntityManager`] with per-kind component tables
//! - **Generation**: BSP and tunneling strategies sharing one post-processing pipeline
//! - **Perception**: recursive shadowcasting field of view
//! - **Behaviour**: A* pathfinding, monster state machine and combat resolution
//! - **Turn Loop**: [`GameState`] resolves player actions and runs the monsters' turn
//! - **Rendering**: an ASCII [`AsciiDisplay`] for terminals and logs
//!
//! Every random decision draws from one seeded [`rand::rngs::StdRng`], so a seed fully
//! determines a run.

pub mod game;
pub mod generation;
pub mod rendering;
pub mod utils;

pub use game::*;
pub use generation::*;
pub use rendering::*;
pub use utils::pathfinding::{astar, path_exists, reachable_from, walkable_neighbours};

/// Core error type for the simulation.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Content or configuration is malformed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Entity ID is not registered
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Room ID does not belong to the map
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Mistakes in content packs, capability strings and run settings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown capability '{0}'")]
    UnknownCapability(String),

    #[error("capability '{capability}' has no attribute '{attribute}'")]
    UnknownAttribute {
        capability: String,
        attribute: String,
    },

    #[error("capability '{capability}' is missing a value for '{attribute}'")]
    MissingValue {
        capability: String,
        attribute: String,
    },

    #[error("invalid value '{value}' for '{attribute}'")]
    InvalidValue { attribute: String, value: String },

    #[error("no entity template named '{0}'")]
    MissingTemplate(String),

    #[error("no terrain feature named '{0}'")]
    MissingFeature(String),

    #[error("no floor table for level {0}")]
    MissingFloor(u32),
}

impl ConfigError {
    pub(crate) fn invalid(attribute: &str, value: impl std::fmt::Display) -> Self {
        ConfigError::InvalidValue {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    /// Accepts probabilities in `0.0..=1.0`.
    pub(crate) fn check_chance(attribute: &str, value: f64) -> Result<(), Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(Self::invalid(attribute, value))
        }
    }

    pub(crate) fn check_at_least<T>(attribute: &str, value: T, min: T) -> Result<(), Self>
    where
        T: PartialOrd + std::fmt::Display,
    {
        if value >= min {
            Ok(())
        } else {
            Err(Self::invalid(attribute, value))
        }
    }
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation configuration constants.
pub mod config {
    /// Default dungeon width in cells
    pub const DEFAULT_DUNGEON_WIDTH: i32 = 80;

    /// Default dungeon height in cells
    pub const DEFAULT_DUNGEON_HEIGHT: i32 = 60;

    /// Default recursion depth of the BSP splitter
    pub const DEFAULT_BSP_DEPTH: u32 = 7;

    /// Smallest room footprint, walls included
    pub const MIN_ROOM_SIZE: i32 = 6;

    /// Player sight radius
    pub const PLAYER_FOV_RADIUS: i32 = 6;

    /// Monster sight radius when a template does not set one
    pub const MONSTER_FOV_RADIUS: i32 = 4;

    /// Inventory capacity when a template does not set one
    pub const DEFAULT_INVENTORY_SIZE: usize = 10;
}
