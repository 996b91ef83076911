//! # Utilities Module
//!
//! Grid search helpers shared by generation and monster behaviour.

pub mod pathfinding;

pub use self::pathfinding::*;
