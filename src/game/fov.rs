//! # Field of View
//!
//! Recursive shadowcasting over eight octants. The engine works on a
//! [`TransparencyMap`] snapshot and returns the cells lit by a single
//! invocation; remembering what was seen is up to the caller.

use crate::{Door, EntityManager, GameMap, Vector2};
use std::collections::HashSet;

/// Octant transforms. Column `i` holds `xx, xy, yx, yy` for octant `i`.
const MULTIPLIERS: [[i32; 8]; 4] = [
    [1, 0, 0, -1, -1, 0, 0, 1],
    [0, 1, -1, 0, 0, -1, 1, 0],
    [0, 1, 1, 0, 0, -1, -1, 0],
    [1, 0, 0, 1, -1, 0, 0, -1],
];

/// Which cells let light through.
///
/// Walkable cells are transparent unless they hold a closed door. Rebuild the
/// map whenever a door opens or closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparencyMap {
    pub width: i32,
    pub height: i32,
    transparent: Vec<bool>,
}

impl TransparencyMap {
    /// A map where every cell is opaque.
    pub fn opaque(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            transparent: vec![false; (width.max(0) * height.max(0)) as usize],
        }
    }

    pub fn from_map(map: &GameMap, entities: &EntityManager) -> Self {
        let mut result = Self::opaque(map.width, map.height);
        for pos in map.positions() {
            let Some(cell) = map.get(pos) else {
                continue;
            };
            let closed_door = cell
                .entities
                .iter()
                .any(|id| entities.get::<Door>(*id).is_some_and(|door| !door.open));
            result.set(pos, cell.is_walkable() && !closed_door);
        }
        result
    }

    fn index(&self, pos: Vector2) -> Option<usize> {
        (pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn in_bounds(&self, pos: Vector2) -> bool {
        self.index(pos).is_some()
    }

    pub fn set(&mut self, pos: Vector2, transparent: bool) {
        if let Some(i) = self.index(pos) {
            self.transparent[i] = transparent;
        }
    }

    /// Out-of-map cells are opaque.
    pub fn is_transparent(&self, pos: Vector2) -> bool {
        self.index(pos).is_some_and(|i| self.transparent[i])
    }
}

/// Cells visible from `origin` within `radius`.
///
/// The origin itself is always visible when it lies on the map. A cell is lit
/// when `dx² + dy² <= radius²` and no opaque cell shadows it.
///
/// # Examples
///
/// ```
/// use delve::{compute_fov, TransparencyMap, Vector2};
///
/// let mut map = TransparencyMap::opaque(9, 9);
/// for y in 0..9 {
///     for x in 0..9 {
///         map.set(Vector2::new(x, y), true);
///     }
/// }
/// map.set(Vector2::new(5, 4), false);
///
/// let lit = compute_fov(&map, Vector2::new(4, 4), 3);
/// assert!(lit.contains(&Vector2::new(4, 4)));
/// assert!(lit.contains(&Vector2::new(5, 4)));
/// assert!(!lit.contains(&Vector2::new(7, 4)));
/// assert!(lit.contains(&Vector2::new(1, 4)));
/// ```
pub fn compute_fov(map: &TransparencyMap, origin: Vector2, radius: i32) -> HashSet<Vector2> {
    let mut lit = HashSet::new();
    if !map.in_bounds(origin) {
        return lit;
    }
    lit.insert(origin);

    for octant in 0..8 {
        let transform = Octant {
            xx: MULTIPLIERS[0][octant],
            xy: MULTIPLIERS[1][octant],
            yx: MULTIPLIERS[2][octant],
            yy: MULTIPLIERS[3][octant],
        };
        cast_light(map, &mut lit, origin, radius, 1, 1.0, 0.0, transform);
    }
    lit
}

#[derive(Debug, Clone, Copy)]
struct Octant {
    xx: i32,
    xy: i32,
    yx: i32,
    yy: i32,
}

#[allow(clippy::too_many_arguments)]
fn cast_light(
    map: &TransparencyMap,
    lit: &mut HashSet<Vector2>,
    origin: Vector2,
    radius: i32,
    row: i32,
    mut start: f64,
    end: f64,
    t: Octant,
) {
    if start < end {
        return;
    }
    let radius_squared = radius * radius;
    let mut new_start = 0.0;

    for j in row..=radius {
        let (mut dx, dy) = (-j - 1, -j);
        let mut blocked = false;

        while dx <= 0 {
            dx += 1;
            let pos = Vector2::new(
                origin.x + dx * t.xx + dy * t.xy,
                origin.y + dx * t.yx + dy * t.yy,
            );
            let l_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
            let r_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);

            if start < r_slope {
                continue;
            } else if end > l_slope {
                break;
            }

            if dx * dx + dy * dy <= radius_squared && map.in_bounds(pos) {
                lit.insert(pos);
            }

            let opaque = !map.is_transparent(pos);
            if blocked {
                if opaque {
                    new_start = r_slope;
                    continue;
                }
                blocked = false;
                start = new_start;
            } else if opaque && j < radius {
                blocked = true;
                cast_light(map, lit, origin, radius, j + 1, start, l_slope, t);
                new_start = r_slope;
            }
        }

        if blocked {
            break;
        }
    }
}
