//! # Monster Behaviour
//!
//! Per-turn decisions for every entity carrying a [`MonsterAi`] component.
//!
//! Passive monsters only wander. Aggressive ones attack an adjacent player,
//! otherwise look around with their own field of view, chase the last place
//! they saw the player and forget the chase once they get there.

use crate::{
    astar, compute_fov, ComponentKind, ConfigError, DelveError, DelveResult, Direction, EntityId,
    EntityManager, GameMap, MonsterAi, MoveRejection, TransparencyMap, Vector2,
};
use log::{debug, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Wander tuning shared by every monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Chance an idle monster takes a wander step in a given turn
    pub wander_chance: f64,
    /// Weight of repeating the previous wander direction; every other
    /// direction weighs 1
    pub heading_weight: f64,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            wander_chance: 0.7,
            heading_weight: 2.5,
        }
    }
}

impl AiTuning {
    /// The wander chance must be a probability and the heading weight a
    /// positive number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_chance("ai.wander_chance", self.wander_chance)?;
        if self.heading_weight.is_finite() && self.heading_weight > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::invalid("ai.heading_weight", self.heading_weight))
        }
    }
}

/// What a monster did with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterAction {
    /// Stayed put
    Idle,
    /// Stepped onto the given cell
    Moved(Vector2),
    /// Wants to hit the target; the caller resolves the attack
    Attack(EntityId),
    /// Tried to step but the way was refused
    Blocked(MoveRejection),
}

/// Everything a monster may look at or change during its turn.
pub struct AiContext<'a> {
    pub map: &'a mut GameMap,
    pub entities: &'a mut EntityManager,
    pub transparency: &'a TransparencyMap,
    pub player: EntityId,
    pub tuning: &'a AiTuning,
}

/// Checks whether a creature may step onto `to`.
///
/// Cells holding another monster or the player are occupied; items, doors and
/// stairs do not get in the way.
pub fn check_move(
    map: &GameMap,
    entities: &EntityManager,
    to: Vector2,
    player: EntityId,
) -> Result<(), MoveRejection> {
    let cell = map.get(to).ok_or(MoveRejection::OutOfBounds)?;
    if !cell.is_walkable() {
        return Err(MoveRejection::NotWalkable);
    }
    let occupied = cell
        .entities
        .iter()
        .any(|id| *id == player || entities.has_component(*id, ComponentKind::MonsterAi));
    if occupied {
        return Err(MoveRejection::Occupied);
    }
    Ok(())
}

/// Moves `monster` onto `to` when [`check_move`] allows it.
pub fn try_move(
    ctx: &mut AiContext<'_>,
    monster: EntityId,
    to: Vector2,
) -> DelveResult<MonsterAction> {
    match check_move(ctx.map, ctx.entities, to, ctx.player) {
        Ok(()) => {
            ctx.map.move_entity(ctx.entities, monster, to)?;
            Ok(MonsterAction::Moved(to))
        }
        Err(rejection) => Ok(MonsterAction::Blocked(rejection)),
    }
}

/// Runs one turn for `monster`.
///
/// The monster's [`MonsterAi`] state is updated in place. Attacks are only
/// reported; applying them is up to the caller.
pub fn take_turn<R: Rng>(
    ctx: &mut AiContext<'_>,
    monster: EntityId,
    rng: &mut R,
) -> DelveResult<MonsterAction> {
    let pos = ctx
        .entities
        .get_entity(monster)?
        .position
        .ok_or_else(|| DelveError::InvalidState(format!("{} is not on the map", monster)))?;
    let mut ai = ctx
        .entities
        .get::<MonsterAi>(monster)
        .cloned()
        .ok_or_else(|| DelveError::InvalidState(format!("{} has no brain", monster)))?;

    let action = if ai.aggressive {
        hunt(ctx, monster, pos, &mut ai, rng)?
    } else {
        maybe_wander(ctx, monster, pos, &mut ai, rng)?
    };

    if let Some(state) = ctx.entities.get_mut::<MonsterAi>(monster) {
        *state = ai;
    }
    Ok(action)
}

fn hunt<R: Rng>(
    ctx: &mut AiContext<'_>,
    monster: EntityId,
    pos: Vector2,
    ai: &mut MonsterAi,
    rng: &mut R,
) -> DelveResult<MonsterAction> {
    if ai.last_player_pos == Some(pos) {
        debug!("{} reached the last known player position", monster);
        ai.forget_player();
    }

    let player_pos = ctx.entities.get_entity(ctx.player)?.position;

    if let Some(target) = player_pos {
        if pos.is_adjacent(target) {
            ai.spot_player(target);
            debug!("{} attacks the player", monster);
            return Ok(MonsterAction::Attack(ctx.player));
        }

        let visible = compute_fov(ctx.transparency, pos, ai.fov_radius);
        if visible.contains(&target) {
            debug!("{} can see the player", monster);
            ai.spot_player(target);
        }
    }

    match ai.last_player_pos {
        Some(goal) if ai.chasing => chase(ctx, monster, pos, goal, ai),
        _ => maybe_wander(ctx, monster, pos, ai, rng),
    }
}

/// Takes the first A* step towards `goal`, attacking instead when the player
/// stands on it.
fn chase(
    ctx: &mut AiContext<'_>,
    monster: EntityId,
    pos: Vector2,
    goal: Vector2,
    ai: &mut MonsterAi,
) -> DelveResult<MonsterAction> {
    let path = astar(ctx.map, pos, goal, ai.can_move_diagonal);
    let Some(&next) = path.first() else {
        warn!("{} has no path to {}, giving up the chase", monster, goal);
        ai.forget_player();
        return Ok(MonsterAction::Idle);
    };

    if Some(next) == ctx.entities.get_entity(ctx.player)?.position {
        return Ok(MonsterAction::Attack(ctx.player));
    }
    let action = try_move(ctx, monster, next)?;
    if let MonsterAction::Blocked(reason) = action {
        debug!("{} can't move to {}: {}", monster, next, reason);
    }
    Ok(action)
}

fn maybe_wander<R: Rng>(
    ctx: &mut AiContext<'_>,
    monster: EntityId,
    pos: Vector2,
    ai: &mut MonsterAi,
    rng: &mut R,
) -> DelveResult<MonsterAction> {
    if rng.gen_bool(ctx.tuning.wander_chance) {
        wander(ctx, monster, pos, ai, rng)
    } else {
        Ok(MonsterAction::Idle)
    }
}

/// Takes one random step, preferring to keep the previous heading.
pub fn wander<R: Rng>(
    ctx: &mut AiContext<'_>,
    monster: EntityId,
    pos: Vector2,
    ai: &mut MonsterAi,
    rng: &mut R,
) -> DelveResult<MonsterAction> {
    let candidates: Vec<Direction> = Direction::all()
        .into_iter()
        .filter(|dir| check_move(ctx.map, ctx.entities, pos + *dir, ctx.player).is_ok())
        .collect();
    if candidates.is_empty() {
        return Ok(MonsterAction::Idle);
    }

    let weights: Vec<f64> = candidates
        .iter()
        .map(|dir| {
            if Some(*dir) == ai.heading {
                ctx.tuning.heading_weight
            } else {
                1.0
            }
        })
        .collect();
    let index = WeightedIndex::new(&weights)
        .map_err(|e| DelveError::InvalidState(format!("bad wander weights: {}", e)))?;
    let direction = candidates[index.sample(rng)];

    let action = try_move(ctx, monster, pos + direction)?;
    if matches!(action, MonsterAction::Moved(_)) {
        ai.heading = Some(direction);
    }
    Ok(action)
}
