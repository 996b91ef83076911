//! # Doors and Terrain Features
//!
//! Hangs doors in corridor openings along room walls and paints cosmetic
//! terrain (water, grass, dirt, bare floor) over walkable cells from a Perlin
//! noise field.

use crate::generation::GenerationContext;
use crate::{CellKind, DelveResult, Direction, Feature, GameMap, Rect, Vector2};
use log::debug;
use noise::{NoiseFn, Perlin};
use rand::Rng;

/// Noise samples per map side.
const FEATURE_FREQUENCY: f64 = 8.0;

/// Corridor cells on a room's outer ring that sit between two walls.
///
/// Openings in the top and bottom rows need walls east and west of them,
/// openings in the left and right columns need walls north and south. Corners
/// never qualify.
pub fn door_candidates(map: &GameMap, rect: Rect) -> Vec<Vector2> {
    let mut found = Vec::new();

    for x in (rect.x + 1)..(rect.end_x() - 1) {
        for y in [rect.y, rect.end_y() - 1] {
            let pos = Vector2::new(x, y);
            if is_opening(map, pos, Direction::East, Direction::West) {
                found.push(pos);
            }
        }
    }
    for y in (rect.y + 1)..(rect.end_y() - 1) {
        for x in [rect.x, rect.end_x() - 1] {
            let pos = Vector2::new(x, y);
            if is_opening(map, pos, Direction::North, Direction::South) {
                found.push(pos);
            }
        }
    }
    found
}

fn is_opening(map: &GameMap, pos: Vector2, a: Direction, b: Direction) -> bool {
    map.kind_at(pos) == CellKind::Corridor
        && map.kind_at(pos + a) == CellKind::Wall
        && map.kind_at(pos + b) == CellKind::Wall
}

fn has_door_nearby(map: &GameMap, ctx: &GenerationContext<'_>, pos: Vector2) -> bool {
    pos.cardinal_adjacent_positions().into_iter().any(|next| {
        map.entities_at(next).any(|id| {
            ctx.entities
                .get_entity(id)
                .is_ok_and(|entity| entity.name == "door")
        })
    })
}

/// Places doors in qualifying corridor openings of every room.
///
/// An opening next to an existing door is skipped without a roll; every other
/// one receives a closed door with probability `chance`.
pub fn place_doors(map: &mut GameMap, chance: f64, ctx: &mut GenerationContext<'_>) -> DelveResult<()> {
    let rects: Vec<Rect> = map.rooms().iter().map(|room| room.rect).collect();
    let mut placed = 0;

    for rect in rects {
        for pos in door_candidates(map, rect) {
            if has_door_nearby(map, ctx, pos) {
                continue;
            }
            if ctx.rng.gen_bool(chance) {
                let door = ctx.entities.spawn(ctx.content, "door")?;
                map.move_entity(ctx.entities, door, pos)?;
                placed += 1;
            }
        }
    }

    debug!("Placed {} doors", placed);
    Ok(())
}

/// Noise thresholds separating water, grass, dirt and floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureThresholds {
    pub water: f64,
    pub grass: f64,
    pub dirt: f64,
}

impl FeatureThresholds {
    pub fn roll<R: Rng>(rng: &mut R) -> Self {
        let water = rng.gen_range(0.2..0.4);
        let grass = water + rng.gen_range(0.1..0.2);
        Self {
            water,
            grass,
            dirt: grass + 0.1,
        }
    }

    /// Feature for a noise value in `[0, 1]`.
    pub fn classify(&self, n: f64) -> Feature {
        if n <= self.water {
            Feature::Water
        } else if n <= self.grass {
            Feature::Grass
        } else if n <= self.dirt {
            Feature::Dirt
        } else {
            Feature::Floor
        }
    }
}

/// Assigns a terrain feature to every walkable cell inside the outer border.
pub fn add_terrain_features<R: Rng>(map: &mut GameMap, rng: &mut R) {
    let thresholds = FeatureThresholds::roll(rng);
    let perlin = Perlin::new(rng.gen::<u32>());
    let fx = map.width as f64 / FEATURE_FREQUENCY;
    let fy = map.height as f64 / FEATURE_FREQUENCY;

    for y in 1..map.height - 1 {
        for x in 1..map.width - 1 {
            let pos = Vector2::new(x, y);
            let Some(cell) = map.get_mut(pos) else {
                continue;
            };
            if !cell.is_walkable() {
                continue;
            }
            let n = perlin.get([x as f64 / fx, y as f64 / fy]) * 0.5 + 0.5;
            cell.feature = Some(thresholds.classify(n));
        }
    }
}
