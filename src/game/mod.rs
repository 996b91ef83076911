//! # Game Module
//!
//! Core simulation state: geometry, the cell grid, the entity registry and the
//! systems that act on them every turn.
//!
//! This module contains the fundamental building blocks of the simulation:
//! - Geometry primitives shared by every other system
//! - World, map and room representation
//! - Entity registry with per-kind component tables
//! - Field of view, monster behaviour and combat
//! - The turn loop a front end drives through [`PlayerAction`]s

pub mod actions;
pub mod ai;
pub mod combat;
pub mod components;
pub mod content;
pub mod entities;
pub mod fov;
pub mod potions;
pub mod state;
pub mod world;

pub use actions::*;
pub use ai::*;
pub use combat::*;
pub use components::*;
pub use content::*;
pub use entities::*;
pub use fov::*;
pub use potions::*;
pub use state::*;
pub use world::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D integer coordinate on the grid.
///
/// # Examples
///
/// ```
/// use delve::Vector2;
///
/// let pos = Vector2::new(10, 5);
/// assert_eq!(pos + Vector2::new(1, -1), Vector2::new(11, 4));
/// assert_eq!(pos.manhattan_distance(Vector2::new(7, 9)), 7);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Vector2 {
    pub x: i32,
    pub y: i32,
}

impl Vector2 {
    /// Creates a new vector with the given coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Vector2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Calculates the Euclidean distance to another position.
    pub fn euclidean_distance(self, other: Vector2) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns all 8 neighbouring positions in [`Direction::all`] order.
    pub fn adjacent_positions(self) -> [Vector2; 8] {
        Direction::all().map(|dir| self + dir)
    }

    /// Returns the 4 cardinal neighbours in [`Direction::cardinal`] order.
    pub fn cardinal_adjacent_positions(self) -> [Vector2; 4] {
        Direction::cardinal().map(|dir| self + dir)
    }

    /// True when `other` is one of the 8 neighbours of `self`.
    pub fn is_adjacent(self, other: Vector2) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::ops::Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Add<Direction> for Vector2 {
    type Output = Self;

    fn add(self, dir: Direction) -> Self {
        self + dir.to_delta()
    }
}

/// The eight compass directions a creature can step in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    /// Converts a direction to a unit delta. North is negative y.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Direction, Vector2};
    ///
    /// assert_eq!(Direction::North.to_delta(), Vector2::new(0, -1));
    /// assert_eq!(Direction::SouthEast.to_delta(), Vector2::new(1, 1));
    /// ```
    pub fn to_delta(self) -> Vector2 {
        match self {
            Direction::NorthWest => Vector2::new(-1, -1),
            Direction::North => Vector2::new(0, -1),
            Direction::NorthEast => Vector2::new(1, -1),
            Direction::West => Vector2::new(-1, 0),
            Direction::East => Vector2::new(1, 0),
            Direction::SouthWest => Vector2::new(-1, 1),
            Direction::South => Vector2::new(0, 1),
            Direction::SouthEast => Vector2::new(1, 1),
        }
    }

    /// All eight directions: NW, N, NE, W, E, SW, S, SE.
    ///
    /// Neighbour scans depend on this order.
    pub fn all() -> [Direction; 8] {
        [
            Direction::NorthWest,
            Direction::North,
            Direction::NorthEast,
            Direction::West,
            Direction::East,
            Direction::SouthWest,
            Direction::South,
            Direction::SouthEast,
        ]
    }

    /// The cardinal directions: N, E, S, W.
    pub fn cardinal() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }
}

/// An axis-aligned rectangle. `end_x`/`end_y` are exclusive.
///
/// Rooms use the full rectangle including their walls; the interior is the
/// rectangle shrunk by one cell on each side.
///
/// # Examples
///
/// ```
/// use delve::{Rect, Vector2};
///
/// let rect = Rect::new(5, 5, 10, 10);
/// assert_eq!(rect.center(), Vector2::new(10, 10));
/// assert_eq!(rect.end_x(), 15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn end_x(&self) -> i32 {
        self.x + self.width
    }

    pub fn end_y(&self) -> i32 {
        self.y + self.height
    }

    /// Integer midpoint, truncated toward the top-left corner.
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    /// Closed-interval overlap test. Rectangles that merely touch intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.end_x()
            && self.end_x() >= other.x
            && self.y <= other.end_y()
            && self.end_y() >= other.y
    }

    /// Checks if a position lies inside the rectangle.
    pub fn contains(&self, pos: Vector2) -> bool {
        pos.x >= self.x && pos.x < self.end_x() && pos.y >= self.y && pos.y < self.end_y()
    }

    /// Checks if a position lies strictly inside the wall ring.
    pub fn interior_contains(&self, pos: Vector2) -> bool {
        pos.x > self.x && pos.x < self.end_x() - 1 && pos.y > self.y && pos.y < self.end_y() - 1
    }

    /// Positions strictly inside the wall ring, row by row.
    pub fn interior_positions(&self) -> impl Iterator<Item = Vector2> {
        let (x0, x1) = (self.x + 1, self.end_x() - 1);
        let (y0, y1) = (self.y + 1, self.end_y() - 1);
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| Vector2::new(x, y)))
    }

    /// Every position on the outer ring.
    pub fn wall_positions(&self) -> Vec<Vector2> {
        let mut positions = Vec::new();
        for x in self.x..self.end_x() {
            positions.push(Vector2::new(x, self.y));
            positions.push(Vector2::new(x, self.end_y() - 1));
        }
        for y in (self.y + 1)..(self.end_y() - 1) {
            positions.push(Vector2::new(self.x, y));
            positions.push(Vector2::new(self.end_x() - 1, y));
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center_truncates() {
        assert_eq!(Rect::new(5, 5, 10, 10).center(), Vector2::new(10, 10));
        assert_eq!(Rect::new(0, 0, 5, 7).center(), Vector2::new(2, 3));
    }

    #[test]
    fn test_rect_touching_intersects() {
        let a = Rect::new(0, 0, 5, 5);
        let b = Rect::new(5, 0, 5, 5);
        let c = Rect::new(6, 0, 5, 5);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_direction_order() {
        let deltas: Vec<Vector2> = Direction::all().iter().map(|d| d.to_delta()).collect();
        assert_eq!(
            deltas,
            vec![
                Vector2::new(-1, -1),
                Vector2::new(0, -1),
                Vector2::new(1, -1),
                Vector2::new(-1, 0),
                Vector2::new(1, 0),
                Vector2::new(-1, 1),
                Vector2::new(0, 1),
                Vector2::new(1, 1),
            ]
        );
        assert_eq!(
            Direction::cardinal(),
            [
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West
            ]
        );
    }

    #[test]
    fn test_interior_and_walls_partition_rect() {
        let rect = Rect::new(2, 3, 6, 5);
        let interior: Vec<_> = rect.interior_positions().collect();
        let walls = rect.wall_positions();
        assert_eq!(interior.len(), 4 * 3);
        assert_eq!(interior.len() + walls.len(), rect.area() as usize);
        assert!(interior.iter().all(|p| rect.interior_contains(*p)));
        assert!(walls.iter().all(|p| !rect.interior_contains(*p) && rect.contains(*p)));
    }

    #[test]
    fn test_adjacency() {
        let pos = Vector2::new(3, 3);
        assert!(pos.is_adjacent(Vector2::new(4, 4)));
        assert!(!pos.is_adjacent(pos));
        assert!(!pos.is_adjacent(Vector2::new(5, 3)));
        assert_eq!(pos.adjacent_positions()[0], Vector2::new(2, 2));
    }
}
