//! # Encounter Placement
//!
//! Chooses where a level starts and ends, drops the stairs there, and scatters
//! the level's creature roster over every room except the starting one.

use crate::generation::{GenerationConfig, GenerationContext};
use crate::{ComponentKind, DelveError, DelveResult, FloorConfig, GameMap, RoomId, Vector2};
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

/// How many of the rooms farthest from the start are eligible as the end room.
const END_ROOM_CANDIDATES: usize = 3;

/// Picks the start and end rooms and places the stairs at their centres.
///
/// A start room already chosen by the digging strategy is kept; otherwise one is
/// drawn at random. The end room is drawn uniformly among the three rooms whose
/// centres lie farthest from the start room's centre.
pub fn select_start_and_end(map: &mut GameMap, ctx: &mut GenerationContext<'_>) -> DelveResult<()> {
    let start = match map.start_room {
        Some(id) => map.room(id)?.clone(),
        None => map
            .rooms()
            .choose(ctx.rng)
            .cloned()
            .ok_or_else(|| DelveError::GenerationFailed("level has no rooms".to_string()))?,
    };

    let mut others: Vec<(f64, RoomId)> = map
        .rooms()
        .iter()
        .filter(|room| room.id != start.id)
        .map(|room| (start.center().euclidean_distance(room.center()), room.id))
        .collect();
    others.sort_by(|a, b| a.0.total_cmp(&b.0));

    let farthest = &others[others.len().saturating_sub(END_ROOM_CANDIDATES)..];
    let &(_, end_id) = farthest.choose(ctx.rng).ok_or_else(|| {
        DelveError::GenerationFailed("level needs at least two rooms".to_string())
    })?;
    let end = map.room(end_id)?.clone();

    debug!("Start room: {} at {}", start.id, start.center());
    debug!("End room: {} at {}", end.id, end.center());

    map.start_room = Some(start.id);
    map.end_room = Some(end.id);
    map.start_vec = Some(start.center());
    map.end_vec = Some(end.center());

    place_stairs(map, ctx, start.center(), "stairs_up")?;
    place_stairs(map, ctx, end.center(), "stairs_down")?;
    Ok(())
}

fn place_stairs(
    map: &mut GameMap,
    ctx: &mut GenerationContext<'_>,
    pos: Vector2,
    kind: &str,
) -> DelveResult<()> {
    let id = ctx.entities.spawn(ctx.content, kind)?;
    map.move_entity(ctx.entities, id, pos)
}

/// Number of creatures standing in a room's rectangle.
fn creatures_in_room(map: &GameMap, ctx: &GenerationContext<'_>, room: RoomId) -> DelveResult<usize> {
    Ok(map
        .entities_in_room(room)?
        .into_iter()
        .filter(|id| ctx.entities.has_component(*id, ComponentKind::MonsterAi))
        .count())
}

/// Places the floor's creature roster.
///
/// Each creature gets `placement_retries` tries at a random room and a random
/// spot strictly inside it. Rooms already holding more than
/// `max_creatures_per_room` creatures leave the candidate pool. A creature
/// whose tries all fail is skipped.
pub fn place_creatures(
    map: &mut GameMap,
    floor: &FloorConfig,
    config: &GenerationConfig,
    ctx: &mut GenerationContext<'_>,
) -> DelveResult<()> {
    for name in floor.monsters.keys() {
        ctx.content.entity(name)?;
    }

    let mut candidates: Vec<RoomId> = map
        .rooms()
        .iter()
        .filter(|room| Some(room.id) != map.start_room)
        .map(|room| room.id)
        .collect();
    let mut placed = 0;
    let mut skipped = 0;

    for (name, &amount) in &floor.monsters {
        for _ in 0..amount {
            let mut done = false;
            for _ in 0..config.placement_retries {
                let Some(&room_id) = candidates.choose(ctx.rng) else {
                    break;
                };
                if creatures_in_room(map, ctx, room_id)? > config.max_creatures_per_room {
                    candidates.retain(|id| *id != room_id);
                    continue;
                }

                let rect = map.room(room_id)?.rect;
                let (max_x, max_y) = (rect.end_x() - 2, rect.end_y() - 2);
                if max_x < rect.x + 1 || max_y < rect.y + 1 {
                    continue;
                }
                let pos = Vector2::new(
                    ctx.rng.gen_range(rect.x + 1..=max_x),
                    ctx.rng.gen_range(rect.y + 1..=max_y),
                );
                let free = map
                    .get(pos)
                    .is_some_and(|cell| cell.is_walkable() && !cell.has_entities());
                if !free {
                    continue;
                }

                let id = ctx.entities.spawn(ctx.content, name)?;
                map.move_entity(ctx.entities, id, pos)?;
                placed += 1;
                done = true;
                break;
            }
            if !done {
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Placed {} creatures, {} found no room", placed, skipped);
    } else {
        debug!("Placed {} creatures", placed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{dig_room, place_outer_walls};
    use crate::{ContentData, EntityManager, MonsterAi, Rect, Room, RoomIdAllocator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    struct Fixture {
        map: GameMap,
        rng: StdRng,
        entities: EntityManager,
        room_ids: RoomIdAllocator,
        content: ContentData,
    }

    impl Fixture {
        fn new(rects: &[Rect]) -> Self {
            let mut room_ids = RoomIdAllocator::new();
            let mut map = GameMap::new(60, 40, 1);
            place_outer_walls(&mut map);
            for rect in rects {
                dig_room(&mut map, Room::new(room_ids.allocate(), *rect));
            }
            Self {
                map,
                rng: StdRng::seed_from_u64(21),
                entities: EntityManager::new(),
                room_ids,
                content: ContentData::builtin().unwrap(),
            }
        }

        fn run<T>(
            &mut self,
            f: impl FnOnce(&mut GameMap, &mut GenerationContext<'_>) -> T,
        ) -> T {
            let mut ctx = GenerationContext {
                rng: &mut self.rng,
                entities: &mut self.entities,
                room_ids: &mut self.room_ids,
                content: &self.content,
            };
            f(&mut self.map, &mut ctx)
        }

        fn named(&self, name: &str) -> Vec<Vector2> {
            self.entities
                .iter()
                .filter(|entity| entity.name == name)
                .filter_map(|entity| entity.position)
                .collect()
        }
    }

    fn four_rooms() -> Vec<Rect> {
        vec![
            Rect::new(2, 2, 8, 8),
            Rect::new(20, 2, 8, 8),
            Rect::new(40, 2, 8, 8),
            Rect::new(40, 25, 10, 10),
        ]
    }

    #[test]
    fn test_end_room_is_among_the_farthest() {
        let mut fixture = Fixture::new(&four_rooms());
        fixture.map.start_room = Some(RoomId(0));
        fixture
            .run(|map, ctx| select_start_and_end(map, ctx))
            .unwrap();

        let map = &fixture.map;
        assert_eq!(map.start_room, Some(RoomId(0)));
        assert_ne!(map.end_room, Some(RoomId(0)));
        assert_eq!(map.start_vec, Some(Vector2::new(6, 6)));
        assert_eq!(map.end_vec, map.end_room().map(|room| room.center()));

        assert_eq!(fixture.named("stairs_up"), vec![Vector2::new(6, 6)]);
        assert_eq!(fixture.named("stairs_down").len(), 1);
        assert_eq!(Some(fixture.named("stairs_down")[0]), map.end_vec);
    }

    #[test]
    fn test_two_rooms_always_pick_the_other() {
        let mut fixture = Fixture::new(&four_rooms()[..2]);
        fixture
            .run(|map, ctx| select_start_and_end(map, ctx))
            .unwrap();
        assert!(fixture.map.start_room.is_some());
        assert_ne!(fixture.map.start_room, fixture.map.end_room);
    }

    #[test]
    fn test_single_room_cannot_host_both_stairs() {
        let mut fixture = Fixture::new(&four_rooms()[..1]);
        let result = fixture.run(|map, ctx| select_start_and_end(map, ctx));
        assert!(matches!(result, Err(DelveError::GenerationFailed(_))));
    }

    #[test]
    fn test_creatures_avoid_the_start_room() {
        let mut fixture = Fixture::new(&four_rooms());
        fixture.map.start_room = Some(RoomId(0));
        let floor = FloorConfig {
            monsters: BTreeMap::from([("rat".to_string(), 6), ("goblin".to_string(), 2)]),
        };
        let config = GenerationConfig::default();
        fixture
            .run(|map, ctx| place_creatures(map, &floor, &config, ctx))
            .unwrap();

        let creatures = fixture.entities.ids_with(ComponentKind::MonsterAi);
        assert!(!creatures.is_empty());
        let start_rect = fixture.map.room(RoomId(0)).unwrap().rect;
        for id in creatures {
            let pos = fixture.entities.get_entity(id).unwrap().position.unwrap();
            assert!(!start_rect.contains(pos));
            assert!(fixture.map.is_walkable(pos));
            assert_eq!(fixture.map.entities_at(pos).count(), 1);
            assert!(fixture.entities.get::<MonsterAi>(id).is_some());
        }
    }

    #[test]
    fn test_crowded_rooms_stop_accepting_creatures() {
        let mut fixture = Fixture::new(&[Rect::new(2, 2, 8, 8), Rect::new(20, 2, 12, 12)]);
        fixture.map.start_room = Some(RoomId(0));
        let floor = FloorConfig {
            monsters: BTreeMap::from([("rat".to_string(), 40)]),
        };
        let mut config = GenerationConfig::default();
        config.placement_retries = 20;
        fixture
            .run(|map, ctx| place_creatures(map, &floor, &config, ctx))
            .unwrap();

        // The room is dropped once it holds more than the limit, so it ends up
        // with at most one past it.
        let count = fixture.entities.ids_with(ComponentKind::MonsterAi).len();
        assert!(count >= 5, "only {} placed", count);
        assert!(count <= config.max_creatures_per_room + 1);
    }

    #[test]
    fn test_unknown_creature_fails_before_spawning() {
        let mut fixture = Fixture::new(&four_rooms());
        let floor = FloorConfig {
            monsters: BTreeMap::from([("rat".to_string(), 2), ("zzz_wyrm".to_string(), 1)]),
        };
        let config = GenerationConfig::default();
        let result = fixture.run(|map, ctx| place_creatures(map, &floor, &config, ctx));
        assert!(matches!(result, Err(DelveError::Config(_))));
        assert!(fixture.entities.is_empty());
    }
}
