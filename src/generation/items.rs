//! # Item Placement
//!
//! Stocks a freshly generated level with its starting loot.

use crate::generation::GenerationContext;
use crate::{DelveError, DelveResult, GameMap, PotionType, Vector2};
use log::{debug, warn};

/// Puts a health potion on the cell east of the level's start position.
///
/// The potion is placed even when that cell is not walkable, with a warning,
/// so every level carries exactly one starting potion.
pub fn place_items(map: &mut GameMap, ctx: &mut GenerationContext<'_>) -> DelveResult<()> {
    let start = map
        .start_vec
        .ok_or_else(|| DelveError::InvalidState("items placed before the start".to_string()))?;
    let pos = start + Vector2::new(1, 0);
    if !map.is_walkable(pos) {
        warn!("Starting potion lands on a non-walkable cell at {}", pos);
    }

    let potion = ctx.entities.create_potion(PotionType::Health);
    map.move_entity(ctx.entities, potion, pos)?;
    debug!("Placed health potion {} at {}", potion, pos);
    Ok(())
}
