//! # Game State Module
//!
//! The turn loop a front end talks to.
//!
//! [`GameState`] owns the [`World`], the run's random generator, the player's
//! field of view and memory of visited cells, and the message log. A front end
//! feeds it [`PlayerAction`]s through [`GameState::perform`] and reads the grid,
//! the visible set and the messages back.

use crate::{
    compute_fov, config, resolve_attack, take_turn, AiContext, AiTuning, ComponentKind,
    ConfigError, ContentData, DelveError, DelveResult, Direction, Door, EntityId, GameMap,
    GenerationConfig, Health, Inventory, MonsterAction, PlayerAction, Potion, PotionSystem,
    PotionType, TransparencyMap, Vector2, World,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Oldest messages are dropped past this many.
pub const MAX_MESSAGES: usize = 100;

/// Settings for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the run's single random generator
    pub seed: u64,
    /// Dungeon level to generate, starting at 1
    pub level: u32,
    /// Player sight radius
    pub fov_radius: i32,
    pub generation: GenerationConfig,
    pub ai: AiTuning,
    /// Content pack to load instead of the built-in one
    pub content_path: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            level: 1,
            fov_radius: config::PLAYER_FOV_RADIUS,
            generation: GenerationConfig::default(),
            ai: AiTuning::default(),
            content_path: None,
        }
    }
}

impl GameConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration. Missing fields take their
    /// defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GameConfig;
    ///
    /// let config = GameConfig::from_json_str(r#"{ "seed": 7, "generation": { "width": 40 } }"#).unwrap();
    /// assert_eq!(config.seed, 7);
    /// assert_eq!(config.level, 1);
    /// assert_eq!(config.generation.width, 40);
    /// assert_eq!(config.generation.height, 60);
    /// ```
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> DelveResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks every setting a run depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_at_least("level", self.level, 1)?;
        ConfigError::check_at_least("fov_radius", self.fov_radius, 0)?;
        self.generation.validate()?;
        self.ai.validate()
    }

    /// The configured content pack, or the built-in one.
    pub fn load_content(&self) -> DelveResult<ContentData> {
        match &self.content_path {
            Some(path) => ContentData::from_path(path),
            None => ContentData::builtin(),
        }
    }
}

/// Running totals for the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Number of enemies defeated
    pub enemies_defeated: u32,
    /// Number of items collected
    pub items_collected: u32,
    /// Total damage dealt
    pub damage_dealt: u64,
    /// Total damage taken
    pub damage_taken: u64,
    /// Number of times the player has died
    pub deaths: u32,
    /// Total steps taken
    pub steps_taken: u64,
    /// Doors opened by walking into them
    pub doors_opened: u32,
}

impl GameStatistics {
    /// Creates new empty statistics.
    pub fn new() -> Self {
        Self {
            enemies_defeated: 0,
            items_collected: 0,
            damage_dealt: 0,
            damage_taken: 0,
            deaths: 0,
            steps_taken: 0,
            doors_opened: 0,
        }
    }
}

impl Default for GameStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Central game state.
///
/// The player's action always completes, grid and field of view included,
/// before any monster acts. Monsters then act one after another in registry
/// order.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Every level and entity of the run
    pub world: World,
    pub player_id: EntityId,
    /// Turns spent so far
    pub turn_number: u64,
    pub statistics: GameStatistics,
    pub potions: PotionSystem,
    pub player_dead: bool,
    pub fov_radius: i32,
    pub ai: AiTuning,
    rng: StdRng,
    transparency: TransparencyMap,
    visible: HashSet<Vector2>,
    visited: HashSet<Vector2>,
    messages: VecDeque<String>,
}

impl GameState {
    /// Starts a run: loads content, generates the configured level and puts
    /// the player on its start position.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameConfig, GenerationConfig};
    ///
    /// let config = GameConfig {
    ///     seed: 3,
    ///     generation: GenerationConfig::for_testing(),
    ///     ..GameConfig::default()
    /// };
    /// let state = delve::GameState::new(&config).unwrap();
    /// let start = state.world.current_map().unwrap().start_vec;
    /// assert_eq!(Some(state.player_position().unwrap()), start);
    /// ```
    pub fn new(config: &GameConfig) -> DelveResult<Self> {
        config.validate()?;
        let content = config.load_content()?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut world = World::new(content);
        let index = world.create_map(&config.generation, config.level, &mut rng)?;
        world.current_map = index;

        let player_id = world.entities.spawn(&world.content, "player")?;
        let map = &mut world.maps[index];
        let start = map
            .start_vec
            .ok_or_else(|| DelveError::InvalidState("level has no start position".to_string()))?;
        map.move_entity(&mut world.entities, player_id, start)?;
        info!("Player enters level {} at {}", config.level, start);

        let potions = PotionSystem::setup(&mut rng);
        let mut state = Self::assemble(world, player_id, rng, potions, config)?;

        // The start room is known from the outset.
        let start_room = state.world.current_map()?.start_room().map(|room| room.rect);
        if let Some(rect) = start_room {
            for y in rect.y..rect.end_y() {
                for x in rect.x..rect.end_x() {
                    state.visited.insert(Vector2::new(x, y));
                }
            }
        }
        Ok(state)
    }

    /// Wraps an already built world whose player stands on the current map.
    pub fn from_world(world: World, player_id: EntityId, config: &GameConfig) -> DelveResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let potions = PotionSystem::setup(&mut rng);
        Self::assemble(world, player_id, rng, potions, config)
    }

    fn assemble(
        world: World,
        player_id: EntityId,
        rng: StdRng,
        potions: PotionSystem,
        config: &GameConfig,
    ) -> DelveResult<Self> {
        let transparency = TransparencyMap::from_map(world.current_map()?, &world.entities);
        let mut state = Self {
            world,
            player_id,
            turn_number: 0,
            statistics: GameStatistics::new(),
            potions,
            player_dead: false,
            fov_radius: config.fov_radius,
            ai: config.ai.clone(),
            rng,
            transparency,
            visible: HashSet::new(),
            visited: HashSet::new(),
            messages: VecDeque::new(),
        };
        state.refresh_visibility()?;
        Ok(state)
    }

    /// Resolves one player action.
    ///
    /// Returns whether a turn was spent. When it was, every monster acts
    /// before this returns. A dead player cannot act.
    pub fn perform(&mut self, action: PlayerAction) -> DelveResult<bool> {
        if self.player_dead {
            return Err(DelveError::InvalidAction(
                "the player is dead".to_string(),
            ));
        }

        debug!("Turn {}: player does {}", self.turn_number, action);
        let spent = match action {
            PlayerAction::Move(direction) => self.move_player(direction)?,
            PlayerAction::Wait => true,
            PlayerAction::PickUp => self.pickup()?,
            PlayerAction::Quaff => self.quaff()?,
        };

        if spent {
            self.turn_number += 1;
            self.enemies_turn()?;
        }
        Ok(spent)
    }

    fn move_player(&mut self, direction: Direction) -> DelveResult<bool> {
        let to = self.player_position()? + direction;
        if !self.world.current_map()?.is_walkable(to) {
            debug!("Player can't move to {}", to);
            self.message("You can't move there.");
            return Ok(false);
        }

        let occupants: Vec<EntityId> = self.world.current_map()?.entities_at(to).collect();
        let entities = &self.world.entities;
        if let Some(target) = occupants
            .iter()
            .copied()
            .find(|id| entities.has_component(*id, ComponentKind::Combat))
        {
            self.player_attack(target)?;
            return Ok(true);
        }
        if occupants
            .iter()
            .any(|id| entities.has_component(*id, ComponentKind::MonsterAi))
        {
            debug!("Player is blocked at {}", to);
            return Ok(false);
        }

        let player = self.player_id;
        let (map, entities) = self.world.current_parts_mut()?;
        let mut opened = false;
        for id in &occupants {
            if let Some(door) = entities.get_mut::<Door>(*id).filter(|door| !door.open) {
                door.open();
                opened = true;
            }
        }
        map.move_entity(entities, player, to)?;
        self.statistics.steps_taken += 1;

        if opened {
            self.statistics.doors_opened += 1;
            self.message("You open the door.");
            self.rebuild_transparency()?;
        }
        self.refresh_visibility()?;
        Ok(true)
    }

    fn player_attack(&mut self, target: EntityId) -> DelveResult<()> {
        let name = self.world.entities.get_entity(target)?.display_name.clone();
        let outcome = resolve_attack(&mut self.world.entities, self.player_id, target, &mut self.rng)?;

        if outcome.hit {
            self.statistics.damage_dealt += outcome.damage.max(0) as u64;
            self.message(format!(
                "You hit the {} for {} damage ({} left)",
                name, outcome.damage, outcome.remaining_hp
            ));
        } else {
            self.message(format!("You miss the {} ({}%)", name, outcome.chance as i32));
        }

        if outcome.defender_dead {
            self.message(format!("{} is dead", name));
            self.world.destroy_entity(target)?;
            self.statistics.enemies_defeated += 1;
        }
        Ok(())
    }

    fn monster_attack(&mut self, monster: EntityId, target: EntityId) -> DelveResult<()> {
        if !self.world.entities.has_component(monster, ComponentKind::Combat) {
            debug!("{} has nothing to fight with", monster);
            return Ok(());
        }
        let name = self.world.entities.get_entity(monster)?.display_name.clone();
        let outcome = resolve_attack(&mut self.world.entities, monster, target, &mut self.rng)?;

        if outcome.hit {
            self.statistics.damage_taken += outcome.damage.max(0) as u64;
            self.message(format!("the {} hits you for {} damage", name, outcome.damage));
        } else {
            self.message(format!("the {} misses you", name));
        }

        if outcome.defender_dead && target == self.player_id {
            self.message("You are dead!");
            self.player_dead = true;
            self.statistics.deaths += 1;
            info!("Player killed by {} on turn {}", name, self.turn_number);
        }
        Ok(())
    }

    /// Lets every monster on the current map act once, in registry order.
    fn enemies_turn(&mut self) -> DelveResult<()> {
        for id in self.world.entities.ids_with(ComponentKind::MonsterAi) {
            if self.player_dead {
                break;
            }
            // Skip monsters destroyed this turn or standing on another level.
            let position = self
                .world
                .entities
                .get_entity(id)
                .ok()
                .and_then(|entity| entity.position);
            let map = self.world.current_map()?;
            let on_map = position
                .and_then(|pos| map.get(pos))
                .is_some_and(|cell| cell.entities.contains(&id));
            if !on_map {
                continue;
            }

            let action = {
                let (map, entities) = self.world.current_parts_mut()?;
                let mut ctx = AiContext {
                    map,
                    entities,
                    transparency: &self.transparency,
                    player: self.player_id,
                    tuning: &self.ai,
                };
                take_turn(&mut ctx, id, &mut self.rng)?
            };

            if let MonsterAction::Attack(target) = action {
                self.monster_attack(id, target)?;
            }
        }
        Ok(())
    }

    /// Takes the potions in the player's cell.
    ///
    /// Spends a turn only if something was taken.
    fn pickup(&mut self) -> DelveResult<bool> {
        let pos = self.player_position()?;
        let entities = &self.world.entities;
        let potions: Vec<(EntityId, PotionType)> = self
            .world
            .current_map()?
            .entities_at(pos)
            .filter_map(|id| entities.get::<Potion>(id).map(|p| (id, p.potion_type)))
            .collect();

        if potions.is_empty() {
            self.message("There is nothing here.");
            return Ok(false);
        }

        let mut taken = 0;
        for (id, potion_type) in potions {
            let player = self.player_id;
            let (map, entities) = self.world.current_parts_mut()?;
            let stored = entities
                .get_mut::<Inventory>(player)
                .ok_or_else(|| DelveError::InvalidState("the player cannot carry items".to_string()))?
                .take_item(id);
            if !stored {
                self.message("Your inventory is full.");
                break;
            }
            map.remove_entity(entities, id)?;

            let name = self.potions.name_for(potion_type);
            self.message(format!("You took a {} potion", name));
            self.statistics.items_collected += 1;
            taken += 1;
        }
        Ok(taken > 0)
    }

    /// Drinks the potion carried the longest, which identifies its kind for
    /// the rest of the run.
    ///
    /// Spends a turn only if there was something to drink.
    fn quaff(&mut self) -> DelveResult<bool> {
        let oldest = self
            .world
            .entities
            .get_mut::<Inventory>(self.player_id)
            .and_then(|inventory| inventory.take_oldest());
        let Some(id) = oldest else {
            self.message("You have nothing to drink.");
            return Ok(false);
        };

        let potion_type = self
            .world
            .entities
            .get::<Potion>(id)
            .map(|potion| potion.potion_type)
            .ok_or_else(|| DelveError::InvalidState(format!("{} is not a potion", id)))?;
        let color = self.potions.name_for(potion_type);
        self.world.destroy_entity(id)?;

        if self.potions.is_discovered(potion_type) {
            self.message(format!("You drink a {} potion", potion_type.name()));
        } else {
            self.potions.set_discovered(potion_type);
            self.message(format!(
                "You drink the {} potion. It was a {} potion!",
                color,
                potion_type.name()
            ));
        }
        Ok(true)
    }

    /// Describes what the player knows about a cell.
    ///
    /// Returns `None` for cells never seen or with nothing to tell. Entities in
    /// a remembered cell are listed only when they are always visible.
    pub fn look_at(&self, pos: Vector2) -> Option<String> {
        if !self.is_visited(pos) {
            return None;
        }
        let cell = self.world.current_map().ok()?.get(pos)?;
        let visible = self.is_visible(pos);
        let prefix = if visible { "You see" } else { "You remember seeing" };

        let mut descriptions = Vec::new();
        for id in &cell.entities {
            let Ok(entity) = self.world.entities.get_entity(*id) else {
                continue;
            };
            if !visible && !entity.always_visible {
                continue;
            }
            if let Some(potion) = self.world.entities.get::<Potion>(*id) {
                descriptions.push(format!("a {} potion", self.potions.name_for(potion.potion_type)));
            } else if !entity.description.is_empty() {
                descriptions.push(entity.description.clone());
            }
        }
        let mut text = descriptions.join(", ");

        let feature = cell
            .feature
            .and_then(|feature| self.world.content.feature(feature.name()).ok());
        if let Some(def) = feature.filter(|def| !def.description.is_empty()) {
            if !text.is_empty() {
                text.push_str("; ");
            }
            text.push_str(&format!("{} {}", prefix, def.description));
        }

        (!text.is_empty()).then_some(text)
    }

    /// Recomputes the player's field of view and remembers every lit cell.
    pub fn refresh_visibility(&mut self) -> DelveResult<()> {
        let origin = self.player_position()?;
        self.visible = compute_fov(&self.transparency, origin, self.fov_radius);
        self.visited.extend(self.visible.iter().copied());
        Ok(())
    }

    /// Rebuilds the transparency snapshot after doors changed.
    pub fn rebuild_transparency(&mut self) -> DelveResult<()> {
        self.transparency = TransparencyMap::from_map(self.world.current_map()?, &self.world.entities);
        Ok(())
    }

    pub fn current_map(&self) -> DelveResult<&GameMap> {
        self.world.current_map()
    }

    pub fn player_position(&self) -> DelveResult<Vector2> {
        self.world
            .entities
            .get_entity(self.player_id)?
            .position
            .ok_or_else(|| DelveError::InvalidState("the player is not on the map".to_string()))
    }

    pub fn player_hp(&self) -> Option<i32> {
        self.world.entities.get::<Health>(self.player_id).map(|h| h.hp)
    }

    /// Items the player carries, in pickup order.
    pub fn inventory(&self) -> &[EntityId] {
        self.world
            .entities
            .get::<Inventory>(self.player_id)
            .map(|inventory| inventory.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn transparency(&self) -> &TransparencyMap {
        &self.transparency
    }

    pub fn visible(&self) -> &HashSet<Vector2> {
        &self.visible
    }

    pub fn is_visible(&self, pos: Vector2) -> bool {
        self.visible.contains(&pos)
    }

    pub fn is_visited(&self, pos: Vector2) -> bool {
        self.visited.contains(&pos)
    }

    /// The message log, oldest first.
    pub fn messages(&self) -> &VecDeque<String> {
        &self.messages
    }

    /// Hands the message log to the caller and clears it.
    pub fn drain_messages(&mut self) -> Vec<String> {
        self.messages.drain(..).collect()
    }

    fn message(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!("message: {}", text);
        if self.messages.len() == MAX_MESSAGES {
            warn!("Message log full, dropping the oldest message");
            self.messages.pop_front();
        }
        self.messages.push_back(text);
    }
}
