//! Field of view stays within its radius and lights every open cell in range.

use delve::{compute_fov, TransparencyMap, Vector2};
use proptest::prelude::*;

const SIZE: i32 = 25;

fn grid(walls: &[(i32, i32)]) -> TransparencyMap {
    let mut map = TransparencyMap::opaque(SIZE, SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            map.set(Vector2::new(x, y), true);
        }
    }
    for &(x, y) in walls {
        map.set(Vector2::new(x, y), false);
    }
    map
}

proptest! {
    #[test]
    fn prop_nothing_lit_beyond_radius(
        walls in prop::collection::vec((0..SIZE, 0..SIZE), 0..120),
        ox in 0..SIZE,
        oy in 0..SIZE,
        radius in 0i32..12,
    ) {
        let map = grid(&walls);
        let origin = Vector2::new(ox, oy);
        let lit = compute_fov(&map, origin, radius);
        prop_assert!(lit.contains(&origin));
        for pos in lit {
            let (dx, dy) = (pos.x - ox, pos.y - oy);
            prop_assert!(dx * dx + dy * dy <= radius * radius, "{} lit from {}", pos, origin);
            prop_assert!(map.in_bounds(pos));
        }
    }

    #[test]
    fn prop_open_field_is_fully_lit(
        ox in 0..SIZE,
        oy in 0..SIZE,
        radius in 0i32..12,
    ) {
        let map = grid(&[]);
        let origin = Vector2::new(ox, oy);
        let lit = compute_fov(&map, origin, radius);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let (dx, dy) = (x - ox, y - oy);
                let pos = Vector2::new(x, y);
                prop_assert_eq!(lit.contains(&pos), dx * dx + dy * dy <= radius * radius);
            }
        }
    }

    #[test]
    fn prop_clear_straight_lines_are_lit(
        walls in prop::collection::vec((0..SIZE, 0..SIZE), 0..120),
        distance in 1i32..10,
    ) {
        // Walls are kept off the centre row and column.
        let center = SIZE / 2;
        let walls: Vec<(i32, i32)> = walls
            .into_iter()
            .filter(|&(x, y)| x != center && y != center)
            .collect();
        let map = grid(&walls);
        let origin = Vector2::new(center, center);
        let lit = compute_fov(&map, origin, distance);
        for target in [
            Vector2::new(center + distance, center),
            Vector2::new(center - distance, center),
            Vector2::new(center, center + distance),
            Vector2::new(center, center - distance),
        ] {
            prop_assert!(lit.contains(&target), "{} not lit", target);
        }
    }
}
