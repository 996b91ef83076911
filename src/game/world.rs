//! # World Representation
//!
//! The cell grid of a single dungeon level ([`GameMap`]), its rooms, and the
//! [`World`] that owns every level together with the entity registry.

use crate::generation::{DungeonGenerator, GenerationConfig, GenerationContext};
use crate::utils::pathfinding;
use crate::{
    ContentData, DelveError, DelveResult, Direction, Entity, EntityId, EntityManager, Rect,
    Vector2,
};
use log::{debug, info};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Terrain kind of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Void,
    Wall,
    Floor,
    Room,
    Corridor,
}

impl CellKind {
    /// Floor, Room and Corridor cells can be walked on.
    pub fn is_walkable(self) -> bool {
        matches!(self, CellKind::Floor | CellKind::Room | CellKind::Corridor)
    }

    /// Wall and Void block movement and light.
    pub fn is_blocking(self) -> bool {
        !self.is_walkable()
    }
}

/// Cosmetic terrain laid over walkable cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Water,
    Grass,
    Dirt,
    Floor,
}

impl Feature {
    /// Name of the matching entry in the content pack.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Water => "water",
            Feature::Grass => "grass",
            Feature::Dirt => "dirt",
            Feature::Floor => "floor",
        }
    }
}

/// One grid unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCell {
    pub kind: CellKind,
    pub feature: Option<Feature>,
    pub room_id: Option<RoomId>,
    /// Occupants. The grid only refers to entities, the registry owns them.
    pub entities: BTreeSet<EntityId>,
    /// Number of the corridor that carved this cell.
    pub debug_tag: Option<u32>,
}

impl GameCell {
    pub fn is_walkable(&self) -> bool {
        self.kind.is_walkable()
    }

    pub fn has_entities(&self) -> bool {
        !self.entities.is_empty()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room {}", self.0)
    }
}

/// Hands out room IDs. One allocator lives for a whole run so IDs stay unique
/// across every level generated in it.
#[derive(Debug, Clone, Default)]
pub struct RoomIdAllocator {
    next: u32,
}

impl RoomIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> RoomId {
        let id = RoomId(self.next);
        self.next += 1;
        id
    }
}

/// A rectangular carved area. The rectangle includes the wall ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub rect: Rect,
    pub connected: bool,
}

impl Room {
    pub fn new(id: RoomId, rect: Rect) -> Self {
        Self {
            id,
            rect,
            connected: false,
        }
    }

    pub fn center(&self) -> Vector2 {
        self.rect.center()
    }
}

/// A single dungeon level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    pub width: i32,
    pub height: i32,
    pub level: u32,
    cells: Vec<GameCell>,
    /// Rooms in carving order.
    rooms: Vec<Room>,
    pub start_vec: Option<Vector2>,
    pub end_vec: Option<Vector2>,
    pub start_room: Option<RoomId>,
    pub end_room: Option<RoomId>,
    tunnel_count: u32,
}

impl GameMap {
    /// Creates a map filled with Void.
    pub fn new(width: i32, height: i32, level: u32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            level,
            cells: vec![GameCell::default(); size],
            rooms: Vec::new(),
            start_vec: None,
            end_vec: None,
            start_room: None,
            end_room: None,
            tunnel_count: 0,
        }
    }

    pub fn in_bounds(&self, pos: Vector2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Vector2) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// The cell at `pos`, or `None` outside the map.
    pub fn get(&self, pos: Vector2) -> Option<&GameCell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, pos: Vector2) -> Option<&mut GameCell> {
        match self.index(pos) {
            Some(i) => Some(&mut self.cells[i]),
            None => None,
        }
    }

    pub fn kind_at(&self, pos: Vector2) -> CellKind {
        self.get(pos).map(|cell| cell.kind).unwrap_or_default()
    }

    /// False outside the map.
    pub fn is_walkable(&self, pos: Vector2) -> bool {
        self.get(pos).is_some_and(GameCell::is_walkable)
    }

    /// In-bounds neighbours of `pos` in [`Direction::all`] order.
    pub fn cells_around(&self, pos: Vector2) -> Vec<Vector2> {
        Direction::all()
            .into_iter()
            .map(|dir| pos + dir)
            .filter(|p| self.in_bounds(*p))
            .collect()
    }

    /// Every position on the map, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Vector2> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Vector2::new(x, y)))
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> DelveResult<&Room> {
        self.rooms
            .iter()
            .find(|room| room.id == id)
            .ok_or(DelveError::RoomNotFound(id))
    }

    pub fn room_mut(&mut self, id: RoomId) -> DelveResult<&mut Room> {
        self.rooms
            .iter_mut()
            .find(|room| room.id == id)
            .ok_or(DelveError::RoomNotFound(id))
    }

    pub(crate) fn push_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    pub(crate) fn remove_room(&mut self, id: RoomId) -> Option<Room> {
        let index = self.rooms.iter().position(|room| room.id == id)?;
        Some(self.rooms.remove(index))
    }

    /// Allocates the next corridor number for debug tagging.
    pub(crate) fn next_tunnel_tag(&mut self) -> u32 {
        self.tunnel_count += 1;
        self.tunnel_count
    }

    pub fn start_room(&self) -> Option<&Room> {
        self.start_room.and_then(|id| self.room(id).ok())
    }

    pub fn end_room(&self) -> Option<&Room> {
        self.end_room.and_then(|id| self.room(id).ok())
    }

    pub fn biggest_room(&self) -> Option<&Room> {
        self.rooms.iter().max_by_key(|room| room.rect.area())
    }

    pub fn entities_at(&self, pos: Vector2) -> impl Iterator<Item = EntityId> + '_ {
        self.get(pos)
            .into_iter()
            .flat_map(|cell| cell.entities.iter().copied())
    }

    /// Every occupant of the room's rectangle, walls included.
    pub fn entities_in_room(&self, id: RoomId) -> DelveResult<Vec<EntityId>> {
        let rect = self.room(id)?.rect;
        let mut found = Vec::new();
        for y in rect.y..rect.end_y() {
            for x in rect.x..rect.end_x() {
                found.extend(self.entities_at(Vector2::new(x, y)));
            }
        }
        Ok(found)
    }

    /// Moves an entity onto `to`, releasing its previous cell in the same step.
    pub fn move_entity(
        &mut self,
        entities: &mut EntityManager,
        id: EntityId,
        to: Vector2,
    ) -> DelveResult<()> {
        let target = self
            .index(to)
            .ok_or_else(|| DelveError::InvalidAction(format!("{} is outside the map", to)))?;
        let entity = entities.get_entity_mut(id)?;

        if let Some(from) = entity.position {
            if let Some(cell) = self.get_mut(from) {
                cell.entities.remove(&id);
            }
        }
        self.cells[target].entities.insert(id);
        entity.position = Some(to);
        Ok(())
    }

    /// Takes an entity off the grid. Its position becomes `None`.
    pub fn remove_entity(&mut self, entities: &mut EntityManager, id: EntityId) -> DelveResult<()> {
        let entity = entities.get_entity_mut(id)?;
        if let Some(from) = entity.position.take() {
            if let Some(cell) = self.get_mut(from) {
                cell.entities.remove(&id);
            }
        }
        Ok(())
    }

    /// Whether a walkable path joins the two positions.
    pub fn path_exists(&self, from: Vector2, to: Vector2) -> bool {
        pathfinding::path_exists(self, from, to)
    }

    /// Logs a one-line summary of the level.
    pub fn describe(&self) {
        info!(
            "Level {}: {}x{} cells, {} rooms",
            self.level,
            self.width,
            self.height,
            self.rooms.len()
        );
        if let Some(room) = self.biggest_room() {
            info!(
                "Biggest room: {} ({}x{} at {})",
                room.id,
                room.rect.width,
                room.rect.height,
                Vector2::new(room.rect.x, room.rect.y)
            );
        }
        debug!(
            "Start {:?} in {:?}, end {:?} in {:?}",
            self.start_vec, self.start_room, self.end_vec, self.end_room
        );
    }
}

/// Every level of a run plus the shared entity registry.
#[derive(Debug, Clone)]
pub struct World {
    pub maps: Vec<GameMap>,
    pub current_map: usize,
    pub entities: EntityManager,
    pub room_ids: RoomIdAllocator,
    pub content: ContentData,
}

impl World {
    pub fn new(content: ContentData) -> Self {
        Self {
            maps: Vec::new(),
            current_map: 0,
            entities: EntityManager::new(),
            room_ids: RoomIdAllocator::new(),
            content,
        }
    }

    /// Generates a level, appends it and returns its index.
    pub fn create_map(
        &mut self,
        config: &GenerationConfig,
        level: u32,
        rng: &mut StdRng,
    ) -> DelveResult<usize> {
        let mut ctx = GenerationContext {
            rng,
            entities: &mut self.entities,
            room_ids: &mut self.room_ids,
            content: &self.content,
        };
        let map = DungeonGenerator::new(config.clone()).generate(level, &mut ctx)?;
        map.describe();
        self.maps.push(map);
        Ok(self.maps.len() - 1)
    }

    pub fn current_map(&self) -> DelveResult<&GameMap> {
        self.maps
            .get(self.current_map)
            .ok_or_else(|| DelveError::InvalidState("no map has been generated".to_string()))
    }

    pub fn current_map_mut(&mut self) -> DelveResult<&mut GameMap> {
        self.maps
            .get_mut(self.current_map)
            .ok_or_else(|| DelveError::InvalidState("no map has been generated".to_string()))
    }

    /// The current map and the registry, borrowed together.
    pub fn current_parts_mut(&mut self) -> DelveResult<(&mut GameMap, &mut EntityManager)> {
        let map = self
            .maps
            .get_mut(self.current_map)
            .ok_or_else(|| DelveError::InvalidState("no map has been generated".to_string()))?;
        Ok((map, &mut self.entities))
    }

    /// Removes the entity from whichever cell holds it, then from the registry.
    pub fn destroy_entity(&mut self, id: EntityId) -> DelveResult<Entity> {
        let position = self.entities.get_entity(id)?.position;
        if let Some(pos) = position {
            for map in self.maps.iter_mut() {
                if let Some(cell) = map.get_mut(pos) {
                    cell.entities.remove(&id);
                }
            }
        }
        self.entities.destroy_entity(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentKind, PotionType};

    fn open_map() -> GameMap {
        let mut map = GameMap::new(10, 8, 1);
        for pos in Rect::new(0, 0, 10, 8).interior_positions() {
            map.get_mut(pos).unwrap().kind = CellKind::Room;
        }
        map
    }

    #[test]
    fn test_out_of_bounds_lookup() {
        let map = GameMap::new(5, 5, 1);
        assert!(map.get(Vector2::new(-1, 0)).is_none());
        assert!(map.get(Vector2::new(5, 0)).is_none());
        assert!(map.get(Vector2::new(4, 4)).is_some());
        assert!(!map.is_walkable(Vector2::new(99, 99)));
        assert_eq!(map.kind_at(Vector2::new(99, 99)), CellKind::Void);
    }

    #[test]
    fn test_cells_around_clips_to_map() {
        let map = GameMap::new(5, 5, 1);
        assert_eq!(map.cells_around(Vector2::new(0, 0)).len(), 3);
        assert_eq!(map.cells_around(Vector2::new(2, 2)).len(), 8);
    }

    #[test]
    fn test_move_entity_keeps_cell_and_position_in_sync() {
        let mut map = open_map();
        let mut entities = EntityManager::new();
        let id = entities.create_potion(PotionType::Health);

        map.move_entity(&mut entities, id, Vector2::new(2, 2)).unwrap();
        map.move_entity(&mut entities, id, Vector2::new(3, 2)).unwrap();

        assert!(map.get(Vector2::new(2, 2)).unwrap().entities.is_empty());
        assert!(map.get(Vector2::new(3, 2)).unwrap().entities.contains(&id));
        assert_eq!(
            entities.get_entity(id).unwrap().position,
            Some(Vector2::new(3, 2))
        );

        assert!(map.move_entity(&mut entities, id, Vector2::new(50, 2)).is_err());
        assert_eq!(
            entities.get_entity(id).unwrap().position,
            Some(Vector2::new(3, 2))
        );
    }

    #[test]
    fn test_remove_entity_clears_position() {
        let mut map = open_map();
        let mut entities = EntityManager::new();
        let id = entities.create_potion(PotionType::Health);
        map.move_entity(&mut entities, id, Vector2::new(2, 2)).unwrap();
        map.remove_entity(&mut entities, id).unwrap();
        assert!(!map.get(Vector2::new(2, 2)).unwrap().has_entities());
        assert_eq!(entities.get_entity(id).unwrap().position, None);
    }

    #[test]
    fn test_room_ids_are_monotonic() {
        let mut ids = RoomIdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert!(a < b);
    }

    #[test]
    fn test_entities_in_room_includes_walls() {
        let mut map = open_map();
        let mut entities = EntityManager::new();
        let room = Room::new(RoomId(4), Rect::new(1, 1, 5, 5));
        map.push_room(room);
        let on_wall = entities.create_potion(PotionType::Health);
        let outside = entities.create_potion(PotionType::Health);
        map.move_entity(&mut entities, on_wall, Vector2::new(1, 3)).unwrap();
        map.move_entity(&mut entities, outside, Vector2::new(7, 3)).unwrap();

        assert_eq!(map.entities_in_room(RoomId(4)).unwrap(), vec![on_wall]);
        assert!(matches!(
            map.entities_in_room(RoomId(5)),
            Err(DelveError::RoomNotFound(RoomId(5)))
        ));
    }

    #[test]
    fn test_world_destroy_entity_clears_cell() {
        let mut world = World::new(ContentData::default());
        world.maps.push(open_map());
        let id = world.entities.create_potion(PotionType::Poison);
        let map = &mut world.maps[0];
        map.move_entity(&mut world.entities, id, Vector2::new(4, 4))
            .unwrap();

        world.destroy_entity(id).unwrap();
        assert!(!world.maps[0].get(Vector2::new(4, 4)).unwrap().has_entities());
        assert!(world.entities.ids_with(ComponentKind::Potion).is_empty());
        assert!(world.destroy_entity(id).is_err());
    }
}
