//! # Player Actions
//!
//! The commands a front end can issue on the player's behalf, plus the key
//! bindings the headless binary and terminal front ends share.

use crate::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A command issued for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Step one cell, attacking whatever fighter stands there
    Move(Direction),
    /// Let a turn pass
    Wait,
    /// Pick up the items in the player's cell
    PickUp,
    /// Drink the oldest carried potion, identifying its kind
    Quaff,
}

impl PlayerAction {
    /// Maps a key to an action using vi-style movement keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Direction, PlayerAction};
    ///
    /// assert_eq!(PlayerAction::from_key('k'), Some(PlayerAction::Move(Direction::North)));
    /// assert_eq!(PlayerAction::from_key('n'), Some(PlayerAction::Move(Direction::SouthEast)));
    /// assert_eq!(PlayerAction::from_key('g'), Some(PlayerAction::PickUp));
    /// assert_eq!(PlayerAction::from_key('q'), Some(PlayerAction::Quaff));
    /// assert_eq!(PlayerAction::from_key('Q'), None);
    /// ```
    pub fn from_key(key: char) -> Option<PlayerAction> {
        let action = match key {
            'k' => PlayerAction::Move(Direction::North),
            'j' => PlayerAction::Move(Direction::South),
            'h' => PlayerAction::Move(Direction::West),
            'l' => PlayerAction::Move(Direction::East),
            'y' => PlayerAction::Move(Direction::NorthWest),
            'u' => PlayerAction::Move(Direction::NorthEast),
            'b' => PlayerAction::Move(Direction::SouthWest),
            'n' => PlayerAction::Move(Direction::SouthEast),
            'z' | ' ' | '.' => PlayerAction::Wait,
            'g' | ';' | ',' => PlayerAction::PickUp,
            'q' => PlayerAction::Quaff,
            _ => return None,
        };
        Some(action)
    }

    /// Parses a whitespace-separated script of keys, e.g. `"l l j g z"`.
    ///
    /// Unknown keys are reported back as the error.
    pub fn parse_script(script: &str) -> Result<Vec<PlayerAction>, char> {
        script
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| PlayerAction::from_key(c).ok_or(c))
            .collect()
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerAction::Move(direction) => write!(f, "move {:?}", direction),
            PlayerAction::Wait => write!(f, "wait"),
            PlayerAction::PickUp => write!(f, "pick up"),
            PlayerAction::Quaff => write!(f, "quaff"),
        }
    }
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The destination lies outside the map
    OutOfBounds,
    /// The destination is a wall or void
    NotWalkable,
    /// Another monster stands there
    Occupied,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            MoveRejection::OutOfBounds => "outside the map",
            MoveRejection::NotWalkable => "not walkable",
            MoveRejection::Occupied => "occupied",
        };
        write!(f, "{}", reason)
    }
}
