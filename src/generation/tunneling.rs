//! # Tunneling Digging
//!
//! Drops randomly sized rooms at random spots, rejecting overlaps, and chains
//! every new room to the one placed before it. Once per level an attempt may
//! stamp the pillared hall prefab instead of a plain room.

use crate::generation::{
    connect_rooms, dig_room, place_outer_walls, GenerationConfig, GenerationContext, Generator,
};
use crate::{CellKind, DelveResult, GameMap, Rect, Room, Vector2};
use log::debug;
use rand::Rng;

/// The prefab room. `#` cells stay Wall after the room is dug.
pub const PREFAB_ROOM: &str = "\
##########
#........#
#.##..##.#
#.##..##.#
#........#
#.##..##.#
#.##..##.#
#........#
##########";

fn prefab_size() -> (i32, i32) {
    let lines: Vec<&str> = PREFAB_ROOM.lines().collect();
    let width = lines.first().map(|line| line.len()).unwrap_or(0);
    (width as i32, lines.len() as i32)
}

/// Raises the prefab's inner walls in an already dug room. Cells in `keep_open`
/// were corridors before the room was dug and stay walkable.
fn stamp_prefab(map: &mut GameMap, rect: Rect, keep_open: &[Vector2]) {
    for (dy, line) in PREFAB_ROOM.lines().enumerate() {
        for (dx, c) in line.chars().enumerate() {
            let pos = Vector2::new(rect.x + dx as i32, rect.y + dy as i32);
            if c == '#' && rect.interior_contains(pos) && !keep_open.contains(&pos) {
                if let Some(cell) = map.get_mut(pos) {
                    cell.kind = CellKind::Wall;
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TunnelingGenerator {
    pub min_room_size: i32,
    pub max_room_size: i32,
    pub attempts: u32,
    pub prefab_chance: f64,
    pub horizontal_first_chance: f64,
}

impl TunnelingGenerator {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            min_room_size: config.tunnel_min_room_size,
            max_room_size: config.tunnel_max_room_size,
            attempts: config.tunnel_attempts,
            prefab_chance: config.prefab_chance,
            horizontal_first_chance: config.horizontal_first_chance,
        }
    }
}

impl Generator for TunnelingGenerator {
    fn dig(&self, map: &mut GameMap, ctx: &mut GenerationContext<'_>) -> DelveResult<()> {
        place_outer_walls(map);
        let mut prefab_done = false;

        for _ in 0..self.attempts {
            let prefab = ctx.rng.gen_bool(self.prefab_chance) && !prefab_done;
            let (width, height) = if prefab {
                prefab_done = true;
                prefab_size()
            } else {
                (
                    ctx.rng.gen_range(self.min_room_size..=self.max_room_size),
                    ctx.rng.gen_range(self.min_room_size..=self.max_room_size),
                )
            };

            let (max_x, max_y) = (map.width - width - 1, map.height - height - 1);
            if max_x < 0 || max_y < 0 {
                continue;
            }
            let rect = Rect::new(
                ctx.rng.gen_range(0..=max_x),
                ctx.rng.gen_range(0..=max_y),
                width,
                height,
            );
            if map.rooms().iter().any(|room| room.rect.intersects(&rect)) {
                continue;
            }

            let crossing: Vec<Vector2> = rect
                .interior_positions()
                .filter(|pos| map.kind_at(*pos) == CellKind::Corridor)
                .collect();
            let id = ctx.room_ids.allocate();
            dig_room(map, Room::new(id, rect));
            if prefab {
                debug!("Stamped prefab as {}", id);
                stamp_prefab(map, rect, &crossing);
            }

            let count = map.rooms().len();
            if count > 1 {
                let previous = map.rooms()[count - 2].id;
                connect_rooms(map, id, previous, self.horizontal_first_chance, ctx.rng)?;
            } else {
                map.start_room = Some(id);
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "TunnelingGenerator"
    }
}
