//! # Entity Registry
//!
//! Entities are plain records identified by [`EntityId`]. Their capabilities live
//! in per-kind component tables owned by the [`EntityManager`], so "every entity
//! with a monster brain" is a single table walk in ID order.

use crate::{
    Component, ComponentData, ComponentKind, ContentData, DelveError, DelveResult,
    EntityTemplate, Potion, PotionType, Vector2,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for an entity. Never reused within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An RGB colour, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Default for Color {
    fn default() -> Self {
        DEFAULT_ENTITY_COLOR
    }
}

pub const DEFAULT_ENTITY_COLOR: Color = Color(255, 127, 36);

pub const POTION_GLYPH: char = '¡';
pub const POTION_COLOR: Color = Color(72, 209, 204);

/// Draw order. Higher layers are drawn on top of lower ones.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Floor,
    Items,
    #[default]
    Creatures,
}

/// Anything that lives on the map: the player, monsters, items, doors, stairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Template name, e.g. "goblin" or "stairs_down".
    pub name: String,
    pub display_name: String,
    pub glyph: char,
    pub color: Color,
    pub layer: Layer,
    /// `None` while the entity is off the grid (e.g. carried).
    pub position: Option<Vector2>,
    pub always_visible: bool,
    pub description: String,
}

impl Entity {
    pub fn position(&self) -> Option<Vector2> {
        self.position
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} {} at {}", self.name, self.id, pos),
            None => write!(f, "{} {}", self.name, self.id),
        }
    }
}

/// Owns every entity and component of a run.
#[derive(Debug, Clone, Default)]
pub struct EntityManager {
    next_id: u64,
    entities: BTreeMap<EntityId, Entity>,
    tables: [BTreeMap<EntityId, Component>; ComponentKind::COUNT],
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, strictly increasing ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Creates an entity from a content template.
    ///
    /// All capability strings are parsed before anything is registered, so a
    /// malformed template leaves the registry untouched.
    pub fn create_entity(&mut self, template: &EntityTemplate) -> DelveResult<EntityId> {
        let components = template
            .can
            .iter()
            .map(|line| Component::from_capability(line))
            .collect::<Result<Vec<_>, _>>()?;

        let id = self.next_id();
        let entity = Entity {
            id,
            name: template.name.clone(),
            display_name: template
                .display_name
                .clone()
                .unwrap_or_else(|| template.name.clone()),
            glyph: template.avatar,
            color: template.color,
            layer: template.layer,
            position: None,
            always_visible: template.always_visible,
            description: template.description.clone(),
        };
        self.entities.insert(id, entity);

        for component in components {
            self.register_component(id, component)?;
        }

        debug!("Created {} {}", template.name, id);
        Ok(id)
    }

    /// Looks up the template called `name` and creates an entity from it.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{ContentData, EntityManager, Health};
    ///
    /// let content = ContentData::builtin().unwrap();
    /// let mut entities = EntityManager::new();
    /// let player = entities.spawn(&content, "player").unwrap();
    /// assert!(entities.get::<Health>(player).is_some());
    /// assert!(entities.spawn(&content, "dragon-king").is_err());
    /// ```
    pub fn spawn(&mut self, content: &ContentData, name: &str) -> DelveResult<EntityId> {
        let template = content.entity(name)?;
        self.create_entity(template)
    }

    /// Creates an unowned potion of the given type.
    pub fn create_potion(&mut self, potion_type: PotionType) -> EntityId {
        let id = self.next_id();
        let entity = Entity {
            id,
            name: "potion".to_string(),
            display_name: "potion".to_string(),
            glyph: POTION_GLYPH,
            color: POTION_COLOR,
            layer: crate::Layer::Items,
            position: None,
            always_visible: false,
            description: format!("A {} potion.", potion_type.name()),
        };
        self.entities.insert(id, entity);
        self.tables[ComponentKind::Potion.index()]
            .insert(id, Component::Potion(Potion { potion_type }));
        id
    }

    /// Attaches a component, replacing any existing one of the same kind.
    pub fn register_component(&mut self, id: EntityId, component: Component) -> DelveResult<()> {
        if !self.entities.contains_key(&id) {
            return Err(DelveError::EntityNotFound(id));
        }
        self.tables[component.kind().index()].insert(id, component);
        Ok(())
    }

    pub fn get_entity(&self, id: EntityId) -> DelveResult<&Entity> {
        self.entities.get(&id).ok_or(DelveError::EntityNotFound(id))
    }

    pub fn get_entity_mut(&mut self, id: EntityId) -> DelveResult<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or(DelveError::EntityNotFound(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Removes the entity and every component it owns.
    ///
    /// The entity is not removed from any grid cell; callers holding a map do
    /// that first (see [`crate::World::destroy_entity`]).
    pub fn destroy_entity(&mut self, id: EntityId) -> DelveResult<Entity> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(DelveError::EntityNotFound(id))?;
        for table in self.tables.iter_mut() {
            table.remove(&id);
        }
        debug!("Destroyed {}", entity);
        Ok(entity)
    }

    /// Typed component lookup.
    pub fn get<C: ComponentData>(&self, id: EntityId) -> Option<&C> {
        self.tables[C::KIND.index()]
            .get(&id)
            .and_then(C::from_component)
    }

    pub fn get_mut<C: ComponentData>(&mut self, id: EntityId) -> Option<&mut C> {
        self.tables[C::KIND.index()]
            .get_mut(&id)
            .and_then(C::from_component_mut)
    }

    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.tables[kind.index()].contains_key(&id)
    }

    /// IDs of every entity carrying `kind`, in creation order.
    pub fn ids_with(&self, kind: ComponentKind) -> Vec<EntityId> {
        self.tables[kind.index()].keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
