//! # Content Data
//!
//! Entity templates, terrain features and per-level population tables. The
//! built-in pack is embedded from `assets/content.json`; other packs can be
//! loaded from JSON at runtime.

use crate::{Color, ConfigError, DelveResult, Layer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_CONTENT: &str = include_str!("../../assets/content.json");

/// Blueprint for creating an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTemplate {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub avatar: char,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub layer: Layer,
    #[serde(default)]
    pub always_visible: bool,
    #[serde(default = "missing_description")]
    pub description: String,
    /// Capability strings, e.g. `"combat:DAMAGE:2:ACCURACY:70"`.
    #[serde(default)]
    pub can: Vec<String>,
}

fn missing_description() -> String {
    "<MISSING DESCRIPTION>".to_string()
}

/// Appearance of a named terrain feature such as water or grass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    pub avatar: char,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub description: String,
}

/// Creature population for one dungeon level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorConfig {
    /// Template name to number of creatures to place.
    #[serde(default)]
    pub monsters: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentData {
    #[serde(default)]
    pub entities: Vec<EntityTemplate>,
    #[serde(default)]
    pub features: Vec<FeatureDef>,
    /// Index 0 is level 1.
    #[serde(default)]
    pub floors: Vec<FloorConfig>,
}

impl ContentData {
    /// The content pack shipped with the crate.
    pub fn builtin() -> DelveResult<Self> {
        Self::from_json_str(BUILTIN_CONTENT)
    }

    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> DelveResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn entity(&self, name: &str) -> Result<&EntityTemplate, ConfigError> {
        self.entities
            .iter()
            .find(|template| template.name == name)
            .ok_or_else(|| ConfigError::MissingTemplate(name.to_string()))
    }

    pub fn feature(&self, name: &str) -> Result<&FeatureDef, ConfigError> {
        self.features
            .iter()
            .find(|feature| feature.name == name)
            .ok_or_else(|| ConfigError::MissingFeature(name.to_string()))
    }

    /// Population table for a 1-based level.
    pub fn floor(&self, level: u32) -> Result<&FloorConfig, ConfigError> {
        level
            .checked_sub(1)
            .and_then(|index| self.floors.get(index as usize))
            .ok_or(ConfigError::MissingFloor(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Component;

    #[test]
    fn test_builtin_pack_loads() {
        let content = ContentData::builtin().unwrap();
        for name in ["player", "door", "stairs_up", "stairs_down"] {
            assert!(content.entity(name).is_ok(), "missing template {}", name);
        }
        for name in ["water", "grass", "dirt", "floor"] {
            assert!(content.feature(name).is_ok(), "missing feature {}", name);
        }
        assert!(!content.floor(1).unwrap().monsters.is_empty());
    }

    #[test]
    fn test_builtin_capabilities_parse() {
        let content = ContentData::builtin().unwrap();
        for template in &content.entities {
            for line in &template.can {
                assert!(
                    Component::from_capability(line).is_ok(),
                    "{}: bad capability {}",
                    template.name,
                    line
                );
            }
        }
        for floor in &content.floors {
            for name in floor.monsters.keys() {
                assert!(content.entity(name).is_ok(), "floor references {}", name);
            }
        }
    }

    #[test]
    fn test_missing_lookups_fail_loudly() {
        let content = ContentData::builtin().unwrap();
        assert_eq!(
            content.entity("lich").unwrap_err(),
            ConfigError::MissingTemplate("lich".to_string())
        );
        assert_eq!(content.floor(0).unwrap_err(), ConfigError::MissingFloor(0));
        assert_eq!(content.floor(999).unwrap_err(), ConfigError::MissingFloor(999));
    }

    #[test]
    fn test_template_defaults() {
        let content = ContentData::from_json_str(
            r#"{ "entities": [ { "name": "rock", "avatar": "*" } ] }"#,
        )
        .unwrap();
        let rock = content.entity("rock").unwrap();
        assert_eq!(rock.layer, Layer::Creatures);
        assert_eq!(rock.color, Color(255, 127, 36));
        assert!(rock.can.is_empty());
        assert!(content.floors.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(&path, r#"{ "floors": [ { "monsters": { "rat": 3 } } ] }"#).unwrap();
        let content = ContentData::from_path(&path).unwrap();
        assert_eq!(content.floor(1).unwrap().monsters.get("rat"), Some(&3));
    }
}
