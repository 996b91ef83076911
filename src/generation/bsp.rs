//! # BSP Digging
//!
//! Recursively splits the map interior into partitions, digs one room per leaf
//! and joins sibling subtrees on the way back up. Rooms left unconnected after
//! the pass are deleted.

use crate::generation::{
    cancel_room, connect_rooms, dig_room, place_outer_walls, GenerationConfig, GenerationContext,
    Generator,
};
use crate::{DelveResult, GameMap, Rect, Room, RoomId};
use log::{debug, warn};
use rand::Rng;

/// A node of the partition tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BspNode {
    pub rect: Rect,
    /// Depth in the tree, the root is 0.
    pub level: u32,
    pub children: Option<Box<(BspNode, BspNode)>>,
}

impl BspNode {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            level: 0,
            children: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Splits this node in two. A horizontal split cuts at row `position`, a
    /// vertical one at column `position`.
    pub fn split_once(&mut self, horizontal: bool, position: i32) {
        let r = self.rect;
        let (first, second) = if horizontal {
            (
                Rect::new(r.x, r.y, r.width, position - r.y),
                Rect::new(r.x, position, r.width, r.end_y() - position),
            )
        } else {
            (
                Rect::new(r.x, r.y, position - r.x, r.height),
                Rect::new(position, r.y, r.end_x() - position, r.height),
            )
        };
        let level = self.level + 1;
        let child = |rect: Rect| BspNode {
            rect,
            level,
            children: None,
        };
        self.children = Some(Box::new((child(first), child(second))));
    }

    /// Splits recursively until `depth` runs out or the node is too small.
    ///
    /// A node wider than `max_h_ratio` times its height is always cut
    /// vertically, and vice versa, which keeps partitions roughly square.
    pub fn split_recursive<R: Rng>(
        &mut self,
        rng: &mut R,
        depth: u32,
        min_width: i32,
        min_height: i32,
        max_h_ratio: f64,
        max_v_ratio: f64,
    ) {
        let r = self.rect;
        let can_cut_rows = r.height >= 2 * min_height;
        let can_cut_columns = r.width >= 2 * min_width;

        let horizontal = match (can_cut_rows, can_cut_columns) {
            _ if depth == 0 => return,
            (false, false) => return,
            (true, false) => true,
            (false, true) => false,
            (true, true) => {
                if r.width as f64 > r.height as f64 * max_h_ratio {
                    false
                } else if r.height as f64 > r.width as f64 * max_v_ratio {
                    true
                } else {
                    rng.gen_range(0..=1) == 0
                }
            }
        };

        let position = if horizontal {
            rng.gen_range((r.y + min_height)..=(r.end_y() - min_height))
        } else {
            rng.gen_range((r.x + min_width)..=(r.end_x() - min_width))
        };

        self.split_once(horizontal, position);
        if let Some(children) = self.children.as_mut() {
            let (first, second) = &mut **children;
            first.split_recursive(rng, depth - 1, min_width, min_height, max_h_ratio, max_v_ratio);
            second.split_recursive(rng, depth - 1, min_width, min_height, max_h_ratio, max_v_ratio);
        }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&BspNode> {
        match &self.children {
            None => vec![self],
            Some(children) => {
                let mut leaves = children.0.leaves();
                leaves.extend(children.1.leaves());
                leaves
            }
        }
    }
}

/// Partition-and-connect digging strategy.
#[derive(Debug, Clone)]
pub struct BspGenerator {
    pub depth: u32,
    pub min_room_width: i32,
    pub min_room_height: i32,
    pub max_split_ratio: f64,
    pub horizontal_first_chance: f64,
}

impl BspGenerator {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            depth: config.bsp_depth,
            min_room_width: config.min_room_width,
            min_room_height: config.min_room_height,
            max_split_ratio: config.max_split_ratio,
            horizontal_first_chance: config.horizontal_first_chance,
        }
    }

    /// Builds the partition tree over the map interior.
    pub fn partition<R: Rng>(&self, map: &GameMap, rng: &mut R) -> BspNode {
        let mut root = BspNode::new(Rect::new(1, 1, map.width - 2, map.height - 2));
        root.split_recursive(
            rng,
            self.depth,
            self.min_room_width + 1,
            self.min_room_height + 1,
            self.max_split_ratio,
            self.max_split_ratio,
        );
        root
    }

    /// Post-order walk: children first, then join them.
    fn traverse(
        &self,
        node: &BspNode,
        map: &mut GameMap,
        ctx: &mut GenerationContext<'_>,
    ) -> DelveResult<()> {
        match &node.children {
            Some(children) => {
                self.traverse(&children.0, map, ctx)?;
                self.traverse(&children.1, map, ctx)?;
                self.connect_nodes(&children.0, &children.1, map, ctx)
            }
            None => {
                self.dig_leaf_room(node, map, ctx);
                Ok(())
            }
        }
    }

    /// Digs a randomly sized room somewhere inside the leaf.
    fn dig_leaf_room(&self, node: &BspNode, map: &mut GameMap, ctx: &mut GenerationContext<'_>) {
        let r = node.rect;
        if r.width < self.min_room_width || r.height < self.min_room_height {
            return;
        }
        let width = ctx.rng.gen_range(self.min_room_width..=r.width);
        let height = ctx.rng.gen_range(self.min_room_height..=r.height);
        let x = r.x + ctx.rng.gen_range(0..=r.width - width);
        let y = r.y + ctx.rng.gen_range(0..=r.height - height);

        let room = Room::new(ctx.room_ids.allocate(), Rect::new(x, y, width, height));
        dig_room(map, room);
    }

    /// Joins the first room touching each child. First match wins.
    fn connect_nodes(
        &self,
        first: &BspNode,
        second: &BspNode,
        map: &mut GameMap,
        ctx: &mut GenerationContext<'_>,
    ) -> DelveResult<()> {
        let room_a = map
            .rooms()
            .iter()
            .find(|room| room.rect.intersects(&first.rect))
            .map(|room| room.id);
        let room_b = map
            .rooms()
            .iter()
            .find(|room| room.rect.intersects(&second.rect) && Some(room.id) != room_a)
            .map(|room| room.id);

        let (Some(a), Some(b)) = (room_a, room_b) else {
            warn!(
                "No rooms to join between partitions {:?} and {:?}",
                first.rect, second.rect
            );
            return Ok(());
        };

        connect_rooms(map, a, b, self.horizontal_first_chance, ctx.rng)?;
        map.room_mut(a)?.connected = true;
        map.room_mut(b)?.connected = true;
        Ok(())
    }
}

impl Generator for BspGenerator {
    fn dig(&self, map: &mut GameMap, ctx: &mut GenerationContext<'_>) -> DelveResult<()> {
        place_outer_walls(map);
        let root = self.partition(map, ctx.rng);
        self.traverse(&root, map, ctx)?;

        let unconnected: Vec<RoomId> = map
            .rooms()
            .iter()
            .filter(|room| !room.connected)
            .map(|room| room.id)
            .collect();
        for id in unconnected {
            debug!("Deleting unconnected {}", id);
            cancel_room(map, id)?;
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "BspGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentData, EntityManager, RoomIdAllocator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_split_once_covers_parent() {
        let mut node = BspNode::new(Rect::new(1, 1, 20, 10));
        node.split_once(false, 8);
        let children = node.children.as_ref().unwrap();
        assert_eq!(children.0.rect, Rect::new(1, 1, 7, 10));
        assert_eq!(children.1.rect, Rect::new(8, 1, 13, 10));
        assert_eq!(children.0.level, 1);
    }

    #[test]
    fn test_partitions_respect_minimum_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut root = BspNode::new(Rect::new(1, 1, 78, 58));
        root.split_recursive(&mut rng, 7, 7, 7, 1.5, 1.5);

        let leaves = root.leaves();
        assert!(leaves.len() > 1);
        let area: i32 = leaves.iter().map(|leaf| leaf.rect.area()).sum();
        assert_eq!(area, 78 * 58);
        for leaf in leaves {
            assert!(leaf.rect.width >= 7 && leaf.rect.height >= 7, "{:?}", leaf.rect);
            assert!(leaf.level <= 7);
        }
    }

    #[test]
    fn test_uneven_minimums_never_cut_below_them() {
        // A wide partition whose width is still under two minimum widths must
        // be cut across its rows instead.
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut root = BspNode::new(Rect::new(1, 1, 16, 10));
            root.split_recursive(&mut rng, 4, 11, 4, 1.5, 1.5);
            for leaf in root.leaves() {
                assert!(leaf.rect.width >= 11 && leaf.rect.height >= 4, "{:?}", leaf.rect);
            }
        }
    }

    #[test]
    fn test_depth_zero_does_not_split() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut root = BspNode::new(Rect::new(1, 1, 78, 58));
        root.split_recursive(&mut rng, 0, 7, 7, 1.5, 1.5);
        assert!(root.is_leaf());
    }

    #[test]
    fn test_dig_leaves_only_connected_rooms() {
        let config = GenerationConfig::new(80, 60);
        let generator = BspGenerator::from_config(&config);
        let mut rng = StdRng::seed_from_u64(7);
        let mut entities = EntityManager::new();
        let mut room_ids = RoomIdAllocator::new();
        let content = ContentData::default();
        let mut ctx = GenerationContext {
            rng: &mut rng,
            entities: &mut entities,
            room_ids: &mut room_ids,
            content: &content,
        };

        let mut map = GameMap::new(80, 60, 1);
        generator.dig(&mut map, &mut ctx).unwrap();

        assert!(map.rooms().len() >= 2);
        for room in map.rooms() {
            assert!(room.connected);
            assert!(room.rect.x >= 1 && room.rect.end_x() <= 79);
            assert!(room.rect.width >= 6 && room.rect.height >= 6);
        }
        assert!(entities.is_empty());
    }
}
