//! # Potions
//!
//! Potion types and the per-run colour scheme that hides what an unidentified
//! potion does.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotionType {
    Health,
    Poison,
    Confusion,
}

impl PotionType {
    /// Potion types that can appear in the dungeon.
    pub const BREWABLE: [PotionType; 2] = [PotionType::Health, PotionType::Poison];

    pub fn name(self) -> &'static str {
        match self {
            PotionType::Health => "health",
            PotionType::Poison => "poison",
            PotionType::Confusion => "confusion",
        }
    }

    pub fn from_name(name: &str) -> Option<PotionType> {
        match name {
            "health" => Some(PotionType::Health),
            "poison" => Some(PotionType::Poison),
            "confusion" => Some(PotionType::Confusion),
            _ => None,
        }
    }
}

pub const POTION_COLORS: [&str; 10] = [
    "blue", "yellow", "cyan", "black", "white", "red", "green", "magenta", "brown", "orange",
];

/// Tracks which colour stands for which potion and what the player has identified.
#[derive(Debug, Clone, Default)]
pub struct PotionSystem {
    colors: HashMap<PotionType, &'static str>,
    discovered: HashMap<PotionType, bool>,
}

impl PotionSystem {
    /// Shuffles the colour table and hands one colour to each brewable potion.
    pub fn setup<R: Rng>(rng: &mut R) -> Self {
        let mut colors = POTION_COLORS.to_vec();
        colors.shuffle(rng);

        let mut system = Self::default();
        for potion_type in PotionType::BREWABLE {
            if let Some(color) = colors.pop() {
                system.colors.insert(potion_type, color);
                system.discovered.insert(potion_type, false);
            }
        }
        system
    }

    /// The colour until the potion is identified, its real name afterwards.
    pub fn name_for(&self, potion_type: PotionType) -> &'static str {
        if self.is_discovered(potion_type) {
            return potion_type.name();
        }
        self.colors.get(&potion_type).copied().unwrap_or("murky")
    }

    pub fn is_discovered(&self, potion_type: PotionType) -> bool {
        self.discovered.get(&potion_type).copied().unwrap_or(false)
    }

    pub fn set_discovered(&mut self, potion_type: PotionType) {
        self.discovered.insert(potion_type, true);
    }
}
