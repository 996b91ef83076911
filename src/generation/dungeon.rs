//! # Dungeon Generation
//!
//! Carving primitives shared by both strategies and the [`DungeonGenerator`]
//! that runs a strategy followed by the common post-processing pipeline.

use crate::generation::{
    add_terrain_features, place_creatures, place_doors, place_items, select_start_and_end,
    utils, BspGenerator, DungeonAlgorithm, GenerationConfig, GenerationContext, Generator,
    TunnelingGenerator,
};
use crate::{CellKind, DelveError, DelveResult, GameMap, Room, RoomId, Vector2};
use log::{debug, warn};
use rand::Rng;

/// Turns the outermost ring of the map into Wall.
pub fn place_outer_walls(map: &mut GameMap) {
    let (width, height) = (map.width, map.height);
    for pos in map.positions().collect::<Vec<_>>() {
        if pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1 {
            if let Some(cell) = map.get_mut(pos) {
                cell.kind = CellKind::Wall;
            }
        }
    }
}

/// Registers a room with the map and carves it.
///
/// The wall ring only replaces Void, so corridors crossing it stay open. Digging
/// over an existing corridor marks the room as connected.
pub fn dig_room(map: &mut GameMap, mut room: Room) {
    for pos in room.rect.wall_positions() {
        if let Some(cell) = map.get_mut(pos) {
            if cell.kind == CellKind::Void {
                cell.kind = CellKind::Wall;
            }
            cell.room_id = Some(room.id);
        }
    }

    for pos in room.rect.interior_positions() {
        if let Some(cell) = map.get_mut(pos) {
            if cell.kind == CellKind::Corridor {
                room.connected = true;
            }
            cell.kind = CellKind::Room;
            cell.room_id = Some(room.id);
        }
    }

    map.push_room(room);
}

/// Carves one corridor cell and walls in the Void around it.
pub fn carve_corridor_cell(map: &mut GameMap, pos: Vector2, tag: u32) {
    let touched_room = match map.get_mut(pos) {
        Some(cell) => {
            cell.kind = CellKind::Corridor;
            cell.debug_tag = Some(tag);
            cell.room_id
        }
        None => return,
    };

    if let Some(id) = touched_room {
        if let Ok(room) = map.room_mut(id) {
            room.connected = true;
        }
    }

    for neighbour in map.cells_around(pos) {
        if let Some(cell) = map.get_mut(neighbour) {
            if cell.kind == CellKind::Void {
                cell.kind = CellKind::Wall;
            }
        }
    }
}

fn carve_horizontal(map: &mut GameMap, x1: i32, x2: i32, y: i32, tag: u32) {
    for x in x1.min(x2)..=x1.max(x2) {
        carve_corridor_cell(map, Vector2::new(x, y), tag);
    }
}

fn carve_vertical(map: &mut GameMap, y1: i32, y2: i32, x: i32, tag: u32) {
    for y in y1.min(y2)..=y1.max(y2) {
        carve_corridor_cell(map, Vector2::new(x, y), tag);
    }
}

/// Joins the centres of two rooms with an L-shaped corridor.
pub fn connect_rooms<R: Rng>(
    map: &mut GameMap,
    first: RoomId,
    second: RoomId,
    horizontal_first_chance: f64,
    rng: &mut R,
) -> DelveResult<()> {
    let start = map.room(first)?.center();
    let end = map.room(second)?.center();
    let tag = map.next_tunnel_tag();

    if rng.gen_bool(horizontal_first_chance) {
        carve_horizontal(map, start.x, end.x, start.y, tag);
        carve_vertical(map, start.y, end.y, end.x, tag);
    } else {
        carve_vertical(map, start.y, end.y, start.x, tag);
        carve_horizontal(map, start.x, end.x, end.y, tag);
    }
    debug!("Corridor {} joins {} and {}", tag, first, second);
    Ok(())
}

/// Deletes a room, returning its interior to Void. The wall ring stays.
pub fn cancel_room(map: &mut GameMap, id: RoomId) -> DelveResult<()> {
    let room = map.remove_room(id).ok_or(DelveError::RoomNotFound(id))?;
    for pos in room.rect.interior_positions() {
        if let Some(cell) = map.get_mut(pos) {
            cell.kind = CellKind::Void;
            cell.room_id = None;
        }
    }
    Ok(())
}

/// Marks every non-wall interior cell of every room as Room.
pub fn tag_rooms(map: &mut GameMap) {
    let rects: Vec<_> = map.rooms().iter().map(|room| room.rect).collect();
    for rect in rects {
        for pos in rect.interior_positions() {
            if let Some(cell) = map.get_mut(pos) {
                if cell.kind != CellKind::Room && cell.kind != CellKind::Wall {
                    cell.kind = CellKind::Room;
                }
            }
        }
    }
}

/// Walls in any Void cell that touches a walkable cell.
pub fn seal_void(map: &mut GameMap) {
    let leaks: Vec<Vector2> = map
        .positions()
        .filter(|pos| map.kind_at(*pos) == CellKind::Void)
        .filter(|pos| map.cells_around(*pos).iter().any(|n| map.is_walkable(*n)))
        .collect();
    for pos in leaks {
        if let Some(cell) = map.get_mut(pos) {
            cell.kind = CellKind::Wall;
        }
    }
}

/// Joins every room unreachable from the first room to its nearest reachable room.
///
/// Returns the number of corridors added.
pub fn connect_stragglers<R: Rng>(
    map: &mut GameMap,
    horizontal_first_chance: f64,
    rng: &mut R,
) -> DelveResult<usize> {
    let mut added = 0;
    loop {
        let unreachable = utils::unreachable_rooms(map);
        let Some(&straggler) = unreachable.first() else {
            return Ok(added);
        };

        let center = map.room(straggler)?.center();
        let target = map
            .rooms()
            .iter()
            .filter(|room| !unreachable.contains(&room.id))
            .min_by(|a, b| {
                let da = a.center().euclidean_distance(center);
                let db = b.center().euclidean_distance(center);
                da.total_cmp(&db)
            })
            .map(|room| room.id)
            .ok_or_else(|| {
                DelveError::GenerationFailed("no reachable room to connect to".to_string())
            })?;

        warn!("{} is cut off, joining it to {}", straggler, target);
        connect_rooms(map, straggler, target, horizontal_first_chance, rng)?;
        map.room_mut(straggler)?.connected = true;
        added += 1;
    }
}

/// Runs a digging strategy and the shared post-processing pipeline.
#[derive(Debug, Clone)]
pub struct DungeonGenerator {
    pub config: GenerationConfig,
}

impl DungeonGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    fn strategy(&self) -> Box<dyn Generator> {
        match self.config.algorithm {
            DungeonAlgorithm::Bsp => Box::new(BspGenerator::from_config(&self.config)),
            DungeonAlgorithm::Tunneling => Box::new(TunnelingGenerator::from_config(&self.config)),
        }
    }

    /// Generates level `level` (1-based).
    ///
    /// Layouts with fewer than two rooms, or with rooms cut off from each other
    /// when connectivity repair is disabled, are discarded and dug again from the
    /// same random stream.
    pub fn generate(&self, level: u32, ctx: &mut GenerationContext<'_>) -> DelveResult<GameMap> {
        let floor = ctx.content.floor(level)?.clone();
        let strategy = self.strategy();

        for attempt in 1..=self.config.generation_attempts {
            let mut map = GameMap::new(self.config.width, self.config.height, level);
            strategy.dig(&mut map, ctx)?;
            seal_void(&mut map);

            if self.config.ensure_connectivity && !map.rooms().is_empty() {
                connect_stragglers(&mut map, self.config.horizontal_first_chance, ctx.rng)?;
            }

            if map.rooms().len() < 2 {
                warn!(
                    "{} attempt {} produced {} room(s), digging again",
                    strategy.generator_type(),
                    attempt,
                    map.rooms().len()
                );
                continue;
            }
            if !utils::unreachable_rooms(&map).is_empty() {
                warn!(
                    "{} attempt {} left rooms cut off, digging again",
                    strategy.generator_type(),
                    attempt
                );
                continue;
            }

            tag_rooms(&mut map);
            select_start_and_end(&mut map, ctx)?;
            place_creatures(&mut map, &floor, &self.config, ctx)?;
            place_doors(&mut map, self.config.door_chance, ctx)?;
            add_terrain_features(&mut map, ctx.rng);
            place_items(&mut map, ctx)?;

            utils::validate_level(&map)?;
            return Ok(map);
        }

        Err(DelveError::GenerationFailed(format!(
            "{} could not build a playable level in {} attempts",
            strategy.generator_type(),
            self.config.generation_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rect, RoomIdAllocator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn map_with_rooms(rects: &[Rect]) -> (GameMap, Vec<RoomId>) {
        let mut ids = RoomIdAllocator::new();
        let mut map = GameMap::new(40, 30, 1);
        place_outer_walls(&mut map);
        let mut room_ids = Vec::new();
        for rect in rects {
            let id = ids.allocate();
            dig_room(&mut map, Room::new(id, *rect));
            room_ids.push(id);
        }
        (map, room_ids)
    }

    #[test]
    fn test_outer_walls() {
        let mut map = GameMap::new(6, 4, 1);
        place_outer_walls(&mut map);
        assert_eq!(map.kind_at(Vector2::new(0, 0)), CellKind::Wall);
        assert_eq!(map.kind_at(Vector2::new(5, 3)), CellKind::Wall);
        assert_eq!(map.kind_at(Vector2::new(2, 2)), CellKind::Void);
    }

    #[test]
    fn test_dig_room_shapes_walls_and_interior() {
        let (map, ids) = map_with_rooms(&[Rect::new(2, 2, 6, 5)]);
        assert_eq!(map.kind_at(Vector2::new(2, 2)), CellKind::Wall);
        assert_eq!(map.kind_at(Vector2::new(3, 3)), CellKind::Room);
        assert_eq!(map.kind_at(Vector2::new(6, 5)), CellKind::Room);
        assert_eq!(map.kind_at(Vector2::new(7, 5)), CellKind::Wall);
        assert_eq!(map.get(Vector2::new(4, 4)).unwrap().room_id, Some(ids[0]));
        assert!(!map.room(ids[0]).unwrap().connected);
    }

    #[test]
    fn test_corridor_connects_and_walls_void() {
        let (mut map, ids) =
            map_with_rooms(&[Rect::new(2, 2, 6, 6), Rect::new(20, 15, 8, 8)]);
        let mut rng = StdRng::seed_from_u64(5);
        connect_rooms(&mut map, ids[0], ids[1], 0.5, &mut rng).unwrap();

        assert!(map.room(ids[0]).unwrap().connected);
        assert!(map.room(ids[1]).unwrap().connected);
        let start = map.room(ids[0]).unwrap().center();
        let end = map.room(ids[1]).unwrap().center();
        assert!(map.path_exists(start, end));

        for pos in map.positions() {
            if map.kind_at(pos) == CellKind::Corridor {
                assert_eq!(map.get(pos).unwrap().debug_tag, Some(1));
                for n in map.cells_around(pos) {
                    assert_ne!(map.kind_at(n), CellKind::Void, "void next to {}", pos);
                }
            }
        }
    }

    #[test]
    fn test_cancel_room_keeps_walls() {
        let (mut map, ids) = map_with_rooms(&[Rect::new(2, 2, 6, 6)]);
        cancel_room(&mut map, ids[0]).unwrap();
        assert!(map.rooms().is_empty());
        assert_eq!(map.kind_at(Vector2::new(4, 4)), CellKind::Void);
        assert_eq!(map.get(Vector2::new(4, 4)).unwrap().room_id, None);
        assert_eq!(map.kind_at(Vector2::new(2, 2)), CellKind::Wall);
        assert!(cancel_room(&mut map, ids[0]).is_err());
    }

    #[test]
    fn test_tag_rooms_converts_corridors_but_not_walls() {
        let (mut map, ids) = map_with_rooms(&[Rect::new(2, 2, 8, 8)]);
        map.get_mut(Vector2::new(4, 4)).unwrap().kind = CellKind::Corridor;
        map.get_mut(Vector2::new(5, 5)).unwrap().kind = CellKind::Wall;
        tag_rooms(&mut map);
        assert_eq!(map.kind_at(Vector2::new(4, 4)), CellKind::Room);
        assert_eq!(map.kind_at(Vector2::new(5, 5)), CellKind::Wall);
        assert_eq!(map.rooms()[0].id, ids[0]);
    }

    #[test]
    fn test_stragglers_get_joined() {
        let (mut map, ids) = map_with_rooms(&[
            Rect::new(2, 2, 6, 6),
            Rect::new(20, 2, 6, 6),
            Rect::new(10, 18, 7, 7),
        ]);
        assert_eq!(utils::unreachable_rooms(&map).len(), 2);

        let mut rng = StdRng::seed_from_u64(9);
        let added = connect_stragglers(&mut map, 0.5, &mut rng).unwrap();
        assert!(added >= 1 && added <= 2);
        assert!(utils::unreachable_rooms(&map).is_empty());
        for id in ids {
            assert!(map.room(id).unwrap().connected);
        }
    }

    #[test]
    fn test_seal_void() {
        let mut map = GameMap::new(5, 5, 1);
        map.get_mut(Vector2::new(2, 2)).unwrap().kind = CellKind::Floor;
        seal_void(&mut map);
        assert_eq!(map.kind_at(Vector2::new(1, 1)), CellKind::Wall);
        assert_eq!(map.kind_at(Vector2::new(3, 3)), CellKind::Wall);
        assert_eq!(map.kind_at(Vector2::new(0, 0)), CellKind::Void);
    }
}
