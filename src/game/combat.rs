//! # Combat Resolution
//!
//! Percentage to-hit rolls and flat damage. Death handling is left to the
//! caller, which knows whether the defender is the player.

use crate::{Combat, DelveError, DelveResult, EntityId, EntityManager, Health};
use log::debug;
use rand::Rng;

/// Each point of defense scales the attacker's accuracy by this factor.
pub const DEFENSE_FALLOFF: f64 = 0.987;

/// Hit chance in percent, `accuracy * 0.987^defense` clamped to `[0, 100]`.
///
/// # Examples
///
/// ```
/// use delve::chance_to_hit;
///
/// assert_eq!(chance_to_hit(100, 0), 100.0);
/// assert_eq!(chance_to_hit(0, 25), 0.0);
/// assert_eq!(chance_to_hit(250, 0), 100.0);
/// assert!((chance_to_hit(80, 10) - 70.19).abs() < 0.01);
/// ```
pub fn chance_to_hit(accuracy: i32, defense: i32) -> f64 {
    (accuracy as f64 * DEFENSE_FALLOFF.powi(defense)).clamp(0.0, 100.0)
}

/// Rolls a uniform integer in `0..=99` and hits when it does not exceed the
/// truncated chance.
pub fn roll_to_hit<R: Rng>(rng: &mut R, chance: f64) -> bool {
    rng.gen_range(0..=99) <= chance.floor() as i32
}

/// What happened when one entity attacked another.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub attacker: EntityId,
    pub defender: EntityId,
    pub hit: bool,
    /// Hit chance in percent.
    pub chance: f64,
    /// Damage dealt, zero on a miss.
    pub damage: i32,
    /// Defender's hit points after the attack.
    pub remaining_hp: i32,
    pub defender_dead: bool,
}

/// Resolves one attack and applies its damage.
///
/// Both sides need a [`Combat`] component and the defender needs [`Health`].
/// The defender is left in the registry even when it dies.
pub fn resolve_attack<R: Rng>(
    entities: &mut EntityManager,
    attacker: EntityId,
    defender: EntityId,
    rng: &mut R,
) -> DelveResult<AttackOutcome> {
    let attack = entities
        .get::<Combat>(attacker)
        .cloned()
        .ok_or_else(|| DelveError::InvalidAction(format!("{} cannot fight", attacker)))?;
    let defense = entities
        .get::<Combat>(defender)
        .map(|combat| combat.defense)
        .ok_or_else(|| DelveError::InvalidAction(format!("{} cannot fight", defender)))?;

    let chance = chance_to_hit(attack.accuracy, defense);
    let hit = roll_to_hit(rng, chance);

    let health = entities
        .get_mut::<Health>(defender)
        .ok_or_else(|| DelveError::InvalidAction(format!("{} cannot be hurt", defender)))?;
    let damage = if hit { attack.damage } else { 0 };
    let remaining_hp = health.take_damage(damage);

    debug!(
        "{} attacks {}: {:.1}% {} ({} hp left)",
        attacker,
        defender,
        chance,
        if hit { "hit" } else { "miss" },
        remaining_hp
    );

    Ok(AttackOutcome {
        attacker,
        defender,
        hit,
        chance,
        damage,
        remaining_hp,
        defender_dead: remaining_hp <= 0,
    })
}
