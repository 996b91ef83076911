//! # Pathfinding Algorithms
//!
//! A* for monster movement and breadth-first reachability for level validation,
//! both built on the `pathfinding` crate and walking only walkable cells.

use crate::{Direction, GameMap, Vector2};
use ::pathfinding::prelude::{astar as astar_search, bfs, bfs_reach};
use std::collections::HashSet;

/// Walkable in-bounds neighbours of `pos`.
///
/// With `allow_diagonal` the scan follows [`Direction::all`], otherwise
/// [`Direction::cardinal`].
pub fn walkable_neighbours(map: &GameMap, pos: Vector2, allow_diagonal: bool) -> Vec<Vector2> {
    let candidates: Vec<Vector2> = if allow_diagonal {
        Direction::all().iter().map(|dir| pos + *dir).collect()
    } else {
        Direction::cardinal().iter().map(|dir| pos + *dir).collect()
    };
    candidates
        .into_iter()
        .filter(|next| map.is_walkable(*next))
        .collect()
}

/// Finds a path from `start` to `goal` with A*.
///
/// The heuristic is the Manhattan distance and every step costs the Manhattan
/// distance between its two cells, so a diagonal step costs 2. The returned
/// path excludes `start` and ends at `goal`; it is empty when no path exists.
///
/// # Examples
///
/// ```
/// use delve::{astar, CellKind, GameMap, Vector2};
///
/// let mut map = GameMap::new(5, 3, 1);
/// for x in 0..5 {
///     map.get_mut(Vector2::new(x, 1)).unwrap().kind = CellKind::Corridor;
/// }
/// let path = astar(&map, Vector2::new(0, 1), Vector2::new(4, 1), false);
/// assert_eq!(path.len(), 4);
/// assert_eq!(path.last(), Some(&Vector2::new(4, 1)));
/// assert!(astar(&map, Vector2::new(0, 1), Vector2::new(0, 0), false).is_empty());
/// ```
pub fn astar(map: &GameMap, start: Vector2, goal: Vector2, allow_diagonal: bool) -> Vec<Vector2> {
    let result = astar_search(
        &start,
        |&pos| {
            walkable_neighbours(map, pos, allow_diagonal)
                .into_iter()
                .map(move |next| (next, pos.manhattan_distance(next)))
        },
        |&pos| pos.manhattan_distance(goal),
        |&pos| pos == goal,
    );

    match result {
        Some((path, _cost)) => path.into_iter().skip(1).collect(),
        None => Vec::new(),
    }
}

/// Whether `to` can be reached from `from` with cardinal steps over walkable cells.
pub fn path_exists(map: &GameMap, from: Vector2, to: Vector2) -> bool {
    if !map.is_walkable(from) || !map.is_walkable(to) {
        return false;
    }
    bfs(
        &from,
        |&pos| walkable_neighbours(map, pos, false),
        |&pos| pos == to,
    )
    .is_some()
}

/// Every walkable cell reachable from `from` with cardinal steps.
pub fn reachable_from(map: &GameMap, from: Vector2) -> HashSet<Vector2> {
    if !map.is_walkable(from) {
        return HashSet::new();
    }
    bfs_reach(from, |&pos| walkable_neighbours(map, pos, false)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellKind;

    /// Parses `#` as wall and anything else as room floor.
    fn map_from(rows: &[&str]) -> GameMap {
        let mut map = GameMap::new(rows[0].len() as i32, rows.len() as i32, 1);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let kind = if c == '#' { CellKind::Wall } else { CellKind::Room };
                map.get_mut(Vector2::new(x as i32, y as i32)).unwrap().kind = kind;
            }
        }
        map
    }

    #[test]
    fn test_path_excludes_start_and_ends_at_goal() {
        let map = map_from(&["#####", "#...#", "#...#", "#####"]);
        let path = astar(&map, Vector2::new(1, 1), Vector2::new(3, 2), true);
        assert!(!path.contains(&Vector2::new(1, 1)));
        assert_eq!(path.last(), Some(&Vector2::new(3, 2)));
    }

    #[test]
    fn test_start_equals_goal_is_empty() {
        let map = map_from(&["...", "..."]);
        assert!(astar(&map, Vector2::new(1, 1), Vector2::new(1, 1), true).is_empty());
    }

    #[test]
    fn test_routes_around_walls() {
        let map = map_from(&[
            "#######", //
            "#..#..#", //
            "#..#..#", //
            "#.....#", //
            "#######",
        ]);
        let path = astar(&map, Vector2::new(1, 1), Vector2::new(5, 1), false);
        assert_eq!(path.len(), 8);
        assert!(path.iter().all(|p| map.is_walkable(*p)));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_diagonal_costs_two() {
        // A diagonal step costs the same as two cardinal steps, so the cardinal
        // and diagonal searches find paths of equal cost on an open floor.
        let map = map_from(&["....", "....", "...."]);
        let diagonal = astar(&map, Vector2::new(0, 0), Vector2::new(2, 2), true);
        assert!(diagonal.len() >= 2 && diagonal.len() <= 4);
        let cost: i32 = std::iter::once(Vector2::new(0, 0))
            .chain(diagonal.iter().copied())
            .collect::<Vec<_>>()
            .windows(2)
            .map(|pair| pair[0].manhattan_distance(pair[1]))
            .sum();
        assert_eq!(cost, 4);
    }

    #[test]
    fn test_unreachable_goal() {
        let map = map_from(&["..#..", "..#.."]);
        assert!(astar(&map, Vector2::new(0, 0), Vector2::new(4, 0), true).is_empty());
        assert!(!path_exists(&map, Vector2::new(0, 0), Vector2::new(4, 0)));
        assert_eq!(reachable_from(&map, Vector2::new(0, 0)).len(), 4);
    }

    #[test]
    fn test_path_exists_is_cardinal() {
        // Only a diagonal gap joins the two halves.
        let map = map_from(&[".#", "#."]);
        assert!(!path_exists(&map, Vector2::new(0, 0), Vector2::new(1, 1)));
        assert_eq!(
            astar(&map, Vector2::new(0, 0), Vector2::new(1, 1), true),
            vec![Vector2::new(1, 1)]
        );
    }
}
