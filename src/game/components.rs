//! # Components
//!
//! The closed set of capabilities an entity can carry, and the parser that builds
//! them from `name:ATTR:VALUE:...` capability strings found in content templates.

use crate::{config, ConfigError, Direction, EntityId, PotionType, Vector2};
use serde::{Deserialize, Serialize};

/// Discriminant for each component variant. Doubles as the index into the
/// registry's per-kind tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Health,
    Combat,
    Door,
    Potion,
    Inventory,
    MonsterAi,
}

impl ComponentKind {
    pub const COUNT: usize = 6;

    pub const ALL: [ComponentKind; ComponentKind::COUNT] = [
        ComponentKind::Health,
        ComponentKind::Combat,
        ComponentKind::Door,
        ComponentKind::Potion,
        ComponentKind::Inventory,
        ComponentKind::MonsterAi,
    ];

    /// Name used in capability strings.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Health => "health",
            ComponentKind::Combat => "combat",
            ComponentKind::Door => "door",
            ComponentKind::Potion => "potion",
            ComponentKind::Inventory => "inventory",
            ComponentKind::MonsterAi => "monster_ai",
        }
    }

    pub fn from_name(name: &str) -> Option<ComponentKind> {
        ComponentKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Hit points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub hp: i32,
}

impl Health {
    pub fn new(hp: i32) -> Self {
        Self { hp }
    }

    /// Subtracts `amount` and returns what is left.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.hp -= amount;
        self.hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Offensive and defensive stats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    pub damage: i32,
    pub defense: i32,
    pub accuracy: i32,
}

/// A door. Closed doors block sight but not movement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub open: bool,
}

impl Door {
    pub fn open(&mut self) {
        self.open = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Potion {
    pub potion_type: PotionType,
}

/// Carried items, stored as entity IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<EntityId>,
    pub max_items: usize,
}

impl Inventory {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            max_items,
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_items
    }

    /// Stores an item. Returns false when the inventory is full.
    pub fn take_item(&mut self, item: EntityId) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Takes out the item carried the longest.
    pub fn take_oldest(&mut self) -> Option<EntityId> {
        (!self.items.is_empty()).then(|| self.items.remove(0))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(config::DEFAULT_INVENTORY_SIZE)
    }
}

/// Per-monster behaviour settings and chase memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAi {
    pub fov_radius: i32,
    pub can_move_diagonal: bool,
    pub aggressive: bool,
    pub chasing: bool,
    pub last_player_pos: Option<Vector2>,
    /// Direction of the last successful wander step.
    pub heading: Option<Direction>,
}

impl MonsterAi {
    /// Drops the chase memory.
    pub fn forget_player(&mut self) {
        self.chasing = false;
        self.last_player_pos = None;
    }

    /// Records a sighting of the player.
    pub fn spot_player(&mut self, pos: Vector2) {
        self.chasing = true;
        self.last_player_pos = Some(pos);
    }
}

impl Default for MonsterAi {
    fn default() -> Self {
        Self {
            fov_radius: config::MONSTER_FOV_RADIUS,
            can_move_diagonal: true,
            aggressive: true,
            chasing: false,
            last_player_pos: None,
            heading: None,
        }
    }
}

/// A single capability attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    Health(Health),
    Combat(Combat),
    Door(Door),
    Potion(Potion),
    Inventory(Inventory),
    MonsterAi(MonsterAi),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Health(_) => ComponentKind::Health,
            Component::Combat(_) => ComponentKind::Combat,
            Component::Door(_) => ComponentKind::Door,
            Component::Potion(_) => ComponentKind::Potion,
            Component::Inventory(_) => ComponentKind::Inventory,
            Component::MonsterAi(_) => ComponentKind::MonsterAi,
        }
    }

    /// A component of `kind` with its default settings.
    pub fn default_for(kind: ComponentKind) -> Component {
        match kind {
            ComponentKind::Health => Component::Health(Health::default()),
            ComponentKind::Combat => Component::Combat(Combat::default()),
            ComponentKind::Door => Component::Door(Door::default()),
            ComponentKind::Potion => Component::Potion(Potion {
                potion_type: PotionType::Health,
            }),
            ComponentKind::Inventory => Component::Inventory(Inventory::default()),
            ComponentKind::MonsterAi => Component::MonsterAi(MonsterAi::default()),
        }
    }

    /// Builds a component from a capability string.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Combat, Component};
    ///
    /// let component = Component::from_capability("combat:DAMAGE:3:DEFENSE:1:ACCURACY:80").unwrap();
    /// assert_eq!(
    ///     component,
    ///     Component::Combat(Combat { damage: 3, defense: 1, accuracy: 80 })
    /// );
    /// assert!(Component::from_capability("combat:SPEED:3").is_err());
    /// ```
    pub fn from_capability(line: &str) -> Result<Component, ConfigError> {
        let (name, values) = parse_capability(line);
        let kind = ComponentKind::from_name(&name)
            .ok_or_else(|| ConfigError::UnknownCapability(name.clone()))?;

        let mut component = Component::default_for(kind);
        for pair in values.chunks(2) {
            let attribute = pair[0].as_str();
            let value = pair.get(1).ok_or_else(|| ConfigError::MissingValue {
                capability: name.clone(),
                attribute: attribute.to_string(),
            })?;
            component.configure(&name, attribute, value)?;
        }
        Ok(component)
    }

    fn configure(&mut self, capability: &str, attribute: &str, value: &str) -> Result<(), ConfigError> {
        match (self, attribute) {
            (Component::Health(health), "HP") => health.hp = parse_int(attribute, value)?,
            (Component::Combat(combat), "DAMAGE") => combat.damage = parse_int(attribute, value)?,
            (Component::Combat(combat), "DEFENSE") => {
                combat.defense = parse_int(attribute, value)?
            }
            (Component::Combat(combat), "ACCURACY") => {
                combat.accuracy = parse_int(attribute, value)?
            }
            (Component::Door(door), "OPEN") => door.open = parse_flag(attribute, value)?,
            (Component::Potion(potion), "TYPE") => {
                potion.potion_type =
                    PotionType::from_name(value).ok_or_else(|| ConfigError::InvalidValue {
                        attribute: attribute.to_string(),
                        value: value.to_string(),
                    })?
            }
            (Component::Inventory(inventory), "MAX_ITEMS") => {
                let max = parse_int(attribute, value)?;
                inventory.max_items = usize::try_from(max).map_err(|_| ConfigError::InvalidValue {
                    attribute: attribute.to_string(),
                    value: value.to_string(),
                })?;
            }
            (Component::MonsterAi(ai), "FOV_RADIUS") => ai.fov_radius = parse_int(attribute, value)?,
            (Component::MonsterAi(ai), "DIAGONAL") => {
                ai.can_move_diagonal = parse_flag(attribute, value)?
            }
            (Component::MonsterAi(ai), "AGGRESSIVE") => ai.aggressive = parse_flag(attribute, value)?,
            _ => {
                return Err(ConfigError::UnknownAttribute {
                    capability: capability.to_string(),
                    attribute: attribute.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Splits a capability string on unescaped colons.
///
/// A backslash makes the following character literal, so `\:` yields a colon
/// inside a token and `\\` yields a backslash.
///
/// # Examples
///
/// ```
/// use delve::parse_capability;
///
/// let (name, values) = parse_capability(r"sign:TEXT:a\:b");
/// assert_eq!(name, "sign");
/// assert_eq!(values, vec!["TEXT".to_string(), "a:b".to_string()]);
/// ```
pub fn parse_capability(line: &str) -> (String, Vec<String>) {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                } else {
                    current.push('\\');
                }
            }
            ':' => tokens.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    tokens.push(current);

    let name = tokens.remove(0);
    (name, tokens)
}

fn parse_int(attribute: &str, value: &str) -> Result<i32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        attribute: attribute.to_string(),
        value: value.to_string(),
    })
}

/// Flags are integers in content files; "true"/"false" are accepted too.
fn parse_flag(attribute: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => parse_int(attribute, other).map(|v| v != 0),
    }
}

/// Typed access to one variant of [`Component`].
pub trait ComponentData: Sized {
    const KIND: ComponentKind;

    fn from_component(component: &Component) -> Option<&Self>;

    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! component_data {
    ($ty:ident) => {
        impl ComponentData for $ty {
            const KIND: ComponentKind = ComponentKind::$ty;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                match component {
                    Component::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Component {
            fn from(inner: $ty) -> Self {
                Component::$ty(inner)
            }
        }
    };
}

component_data!(Health);
component_data!(Combat);
component_data!(Door);
component_data!(Potion);
component_data!(Inventory);
component_data!(MonsterAi);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capability_plain() {
        let (name, values) = parse_capability("health:HP:30");
        assert_eq!(name, "health");
        assert_eq!(values, vec!["HP", "30"]);

        let (name, values) = parse_capability("door");
        assert_eq!(name, "door");
        assert!(values.is_empty());
    }

    #[test]
    fn test_parse_capability_escapes() {
        let (_, values) = parse_capability(r"x:A:c\\:B");
        assert_eq!(values, vec!["A", r"c\", "B"]);
    }

    #[test]
    fn test_monster_ai_flags() {
        let component =
            Component::from_capability("monster_ai:FOV_RADIUS:6:DIAGONAL:0:AGGRESSIVE:1").unwrap();
        let ai = MonsterAi::from_component(&component).unwrap();
        assert_eq!(ai.fov_radius, 6);
        assert!(!ai.can_move_diagonal);
        assert!(ai.aggressive);
        assert!(!ai.chasing);
    }

    #[test]
    fn test_unknown_capability_and_attribute() {
        assert_eq!(
            Component::from_capability("flying:SPEED:2"),
            Err(ConfigError::UnknownCapability("flying".to_string()))
        );
        assert_eq!(
            Component::from_capability("health:MANA:2"),
            Err(ConfigError::UnknownAttribute {
                capability: "health".to_string(),
                attribute: "MANA".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_and_invalid_values() {
        assert!(matches!(
            Component::from_capability("health:HP"),
            Err(ConfigError::MissingValue { .. })
        ));
        assert!(matches!(
            Component::from_capability("health:HP:lots"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_inventory_capacity() {
        let mut inventory = Inventory::new(1);
        assert!(inventory.take_item(EntityId(1)));
        assert!(!inventory.take_item(EntityId(2)));
        assert_eq!(inventory.items, vec![EntityId(1)]);
        assert_eq!(inventory.take_oldest(), Some(EntityId(1)));
        assert_eq!(inventory.take_oldest(), None);
    }

    #[test]
    fn test_door_state() {
        let mut door = Door::default();
        assert!(!door.open);
        door.open();
        assert!(door.open);
    }
}
