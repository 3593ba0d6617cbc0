//! Founding charters - the one-time perk a player picks at game start

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::city::resource::Resource;
use crate::core::error::{HearthError, Result};
use crate::modifiers::ModifierBundle;

/// An immutable set of perks chosen once per game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_multipliers: BTreeMap<Resource, f64>,
    #[serde(default)]
    pub building_multipliers: BTreeMap<String, f64>,
    #[serde(default)]
    pub global_building_multiplier: Option<f64>,
    #[serde(default)]
    pub global_resource_multiplier: Option<f64>,
    #[serde(default)]
    pub route_coin_multiplier: Option<f64>,
    #[serde(default)]
    pub patrol_upkeep_multiplier: Option<f64>,
    #[serde(default)]
    pub building_input_multiplier: Option<f64>,
    #[serde(default)]
    pub upkeep_delta: f64,
    #[serde(default)]
    pub tick_adjustments: BTreeMap<Resource, f64>,
}

impl Charter {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            resource_multipliers: BTreeMap::new(),
            building_multipliers: BTreeMap::new(),
            global_building_multiplier: None,
            global_resource_multiplier: None,
            route_coin_multiplier: None,
            patrol_upkeep_multiplier: None,
            building_input_multiplier: None,
            upkeep_delta: 0.0,
            tick_adjustments: BTreeMap::new(),
        }
    }

    /// View the charter as a modifier bundle
    pub fn modifiers(&self) -> ModifierBundle {
        let raw = ModifierBundle {
            resource_multipliers: self.resource_multipliers.clone(),
            building_multipliers: self.building_multipliers.clone(),
            global_building_multiplier: self.global_building_multiplier.unwrap_or(1.0),
            global_resource_multiplier: self.global_resource_multiplier.unwrap_or(1.0),
            route_coin_multiplier: self.route_coin_multiplier.unwrap_or(1.0),
            patrol_upkeep_multiplier: self.patrol_upkeep_multiplier.unwrap_or(1.0),
            building_input_multiplier: self.building_input_multiplier.unwrap_or(1.0),
            upkeep_delta: self.upkeep_delta,
            tick_adjustments: self.tick_adjustments.clone(),
        };
        raw.sanitized()
    }
}

/// Catalog of selectable charters
#[derive(Debug, Clone, Default)]
pub struct CharterCatalog {
    charters: AHashMap<String, Charter>,
}

impl CharterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default charters (mirrors data/charters.toml)
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(Charter {
            description: "Rich soil along the river: farms and grain flourish.".into(),
            resource_multipliers: BTreeMap::from([(Resource::Grain, 1.1)]),
            building_multipliers: BTreeMap::from([("farm".into(), 1.25)]),
            ..Charter::new("fertile_valley", "Fertile Valley")
        });

        catalog.add(Charter {
            description: "Master builders waste less timber in every workshop.".into(),
            building_input_multiplier: Some(0.8),
            building_multipliers: BTreeMap::from([("sawmill".into(), 1.1)]),
            ..Charter::new("architects_legacy", "Architect's Legacy")
        });

        catalog.add(Charter {
            description: "A pact with the ley lines grants a trickle of mana.".into(),
            resource_multipliers: BTreeMap::from([(Resource::Mana, 1.1)]),
            tick_adjustments: BTreeMap::from([(Resource::Mana, 3.0)]),
            ..Charter::new("arcane_covenant", "Arcane Covenant")
        });

        catalog.add(Charter {
            description: "Caravans pay better and patrols cost less.".into(),
            route_coin_multiplier: Some(1.25),
            patrol_upkeep_multiplier: Some(0.5),
            ..Charter::new("merchant_league", "Merchant League")
        });

        catalog.add(Charter {
            description: "Shared hearths feed more mouths and earn the gods' notice.".into(),
            upkeep_delta: -0.05,
            tick_adjustments: BTreeMap::from([(Resource::Favor, 1.0)]),
            ..Charter::new("frugal_hearth", "Frugal Hearth")
        });

        catalog
    }

    /// Add a charter, replacing any previous one with the same id
    pub fn add(&mut self, charter: Charter) {
        self.charters.insert(charter.id.clone(), charter);
    }

    /// Get a charter by id
    pub fn get(&self, id: &str) -> Option<&Charter> {
        self.charters.get(id)
    }

    /// Resolve an optional charter reference; unknown ids are inert
    pub fn resolve(&self, id: Option<&str>) -> Option<&Charter> {
        let id = id?;
        let charter = self.get(id);
        if charter.is_none() {
            tracing::warn!("Unknown charter '{}' ignored", id);
        }
        charter
    }

    pub fn len(&self) -> usize {
        self.charters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charters.is_empty()
    }

    /// Charter ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.charters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Load charters from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse charters from TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let file: TomlCharters = toml::from_str(content)?;

        let mut catalog = Self::new();
        for charter in file.charters {
            if catalog.get(&charter.id).is_some() {
                return Err(HearthError::DuplicateId {
                    kind: "charter",
                    id: charter.id,
                });
            }
            catalog.add(charter);
        }
        Ok(catalog)
    }
}

#[derive(Debug, Deserialize)]
struct TomlCharters {
    #[serde(default)]
    charters: Vec<Charter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charter_modifiers() {
        let catalog = CharterCatalog::with_defaults();
        let legacy = catalog.get("architects_legacy").expect("charter exists");
        let bundle = legacy.modifiers();
        assert_eq!(bundle.building_input_multiplier, 0.8);
        assert_eq!(bundle.building_multiplier("sawmill"), 1.1);
        assert_eq!(bundle.route_coin_multiplier, 1.0);
    }

    #[test]
    fn test_charter_modifiers_drop_bad_values() {
        let charter = Charter {
            building_input_multiplier: Some(-1.0),
            resource_multipliers: BTreeMap::from([(Resource::Coin, 0.0)]),
            ..Charter::new("broken", "Broken")
        };
        let bundle = charter.modifiers();
        assert_eq!(bundle.building_input_multiplier, 1.0);
        assert!(bundle.resource_multipliers.is_empty());
    }

    #[test]
    fn test_resolve_unknown_is_inert() {
        let catalog = CharterCatalog::with_defaults();
        assert!(catalog.resolve(Some("no_such_charter")).is_none());
        assert!(catalog.resolve(None).is_none());
        assert!(catalog.resolve(Some("merchant_league")).is_some());
    }

    #[test]
    fn test_charter_toml_parsing() {
        let toml_content = r#"
[[charters]]
id = "river_lords"
name = "River Lords"
route_coin_multiplier = 1.4
upkeep_delta = 0.05

[charters.tick_adjustments]
coin = 2
"#;
        let catalog = CharterCatalog::parse_toml(toml_content).expect("should parse");
        let charter = catalog.get("river_lords").expect("charter");
        assert_eq!(charter.route_coin_multiplier, Some(1.4));
        assert_eq!(charter.upkeep_delta, 0.05);
        assert_eq!(charter.tick_adjustments.get(&Resource::Coin), Some(&2.0));
        assert!(charter.description.is_empty());
    }

    #[test]
    fn test_load_charters_from_file() {
        let catalog = CharterCatalog::load_from_toml(Path::new("data/charters.toml"))
            .expect("Should load data/charters.toml");
        let defaults = CharterCatalog::with_defaults();
        assert_eq!(catalog.ids(), defaults.ids());
        for id in defaults.ids() {
            assert_eq!(catalog.get(id), defaults.get(id), "charter {} differs", id);
        }
    }
}
