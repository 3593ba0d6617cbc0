//! Building catalog - static definitions of what each building type does
//!
//! Definitions specify worker capacity, per-cycle inputs and outputs, optional
//! recipe variants, adjacency bonuses and passive effects. The engine only
//! reads the catalog; an id missing from it makes a building inert.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::city::resource::Resource;
use crate::core::error::{HearthError, Result};
use crate::core::types::round_whole;

/// Per-resource multipliers selected by a building's recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeVariant {
    /// Multiplier on the need for each listed input
    #[serde(default)]
    pub inputs: BTreeMap<Resource, f64>,
    /// Multiplier on the base yield of each listed output
    #[serde(default)]
    pub outputs: BTreeMap<Resource, f64>,
}

impl RecipeVariant {
    pub fn input_multiplier(&self, resource: Resource) -> f64 {
        positive_or_one(self.inputs.get(&resource).copied())
    }

    pub fn output_multiplier(&self, resource: Resource) -> f64 {
        positive_or_one(self.outputs.get(&resource).copied())
    }
}

fn positive_or_one(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 1.0,
    }
}

/// Flat output bonus per unit of a building trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyBonus {
    /// Trait name looked up on the building instance
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Output the bonus is added to
    pub resource: Resource,
    pub per_unit: f64,
    /// Largest total bonus a single building can receive
    pub cap: f64,
}

impl AdjacencyBonus {
    /// Bonus for the given number of trait units
    pub fn bonus(&self, units: f64) -> f64 {
        let raw = units * self.per_unit;
        if !raw.is_finite() || raw <= 0.0 {
            return 0.0;
        }
        raw.min(self.cap.max(0.0))
    }
}

/// Modifiers a building grants while it stands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassiveEffects {
    #[serde(default)]
    pub resource_multipliers: BTreeMap<Resource, f64>,
    #[serde(default)]
    pub building_multipliers: BTreeMap<String, f64>,
    #[serde(default)]
    pub global_building_multiplier: Option<f64>,
    #[serde(default)]
    pub global_resource_multiplier: Option<f64>,
    /// Flat per-cycle ledger adjustments
    #[serde(default)]
    pub tick_adjustments: BTreeMap<Resource, f64>,
    /// Counted once no matter how many copies are built
    #[serde(default)]
    pub unique: bool,
}

/// Static definition of a building type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub id: String,
    pub name: String,
    /// Worker slots at level 1; defaults to the `workers` input
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub inputs: BTreeMap<Resource, f64>,
    #[serde(default)]
    pub outputs: BTreeMap<Resource, f64>,
    #[serde(default)]
    pub recipes: BTreeMap<String, RecipeVariant>,
    #[serde(default)]
    pub adjacency: Option<AdjacencyBonus>,
    #[serde(default)]
    pub passive: Option<PassiveEffects>,
}

impl BuildingDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity: None,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            recipes: BTreeMap::new(),
            adjacency: None,
            passive: None,
        }
    }

    pub fn input(mut self, resource: Resource, amount: f64) -> Self {
        self.inputs.insert(resource, amount);
        self
    }

    pub fn output(mut self, resource: Resource, amount: f64) -> Self {
        self.outputs.insert(resource, amount);
        self
    }

    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn recipe(mut self, name: impl Into<String>, variant: RecipeVariant) -> Self {
        self.recipes.insert(name.into(), variant);
        self
    }

    pub fn adjacency(mut self, bonus: AdjacencyBonus) -> Self {
        self.adjacency = Some(bonus);
        self
    }

    pub fn passive(mut self, passive: PassiveEffects) -> Self {
        self.passive = Some(passive);
        self
    }

    /// Worker capacity at level 1
    pub fn base_capacity(&self) -> u32 {
        self.capacity.unwrap_or_else(|| {
            let declared = self.inputs.get(&Resource::Workers).copied().unwrap_or(0.0);
            if declared.is_finite() && declared > 0.0 {
                round_whole(declared) as u32
            } else {
                0
            }
        })
    }

    /// Recipe variant by name, if this type declares it
    pub fn recipe_variant(&self, name: Option<&str>) -> Option<&RecipeVariant> {
        name.and_then(|n| self.recipes.get(n))
    }
}

/// Catalog of all building types
#[derive(Debug, Clone, Default)]
pub struct BuildingCatalog {
    defs: AHashMap<String, BuildingDef>,
}

impl BuildingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default catalog (mirrors data/buildings.toml)
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(
            BuildingDef::new("farm", "Farm")
                .input(Resource::Workers, 2.0)
                .output(Resource::Grain, 10.0)
                .adjacency(AdjacencyBonus {
                    trait_name: "river".into(),
                    resource: Resource::Grain,
                    per_unit: 2.0,
                    cap: 6.0,
                }),
        );

        catalog.add(
            BuildingDef::new("lumber_camp", "Lumber Camp")
                .input(Resource::Workers, 2.0)
                .output(Resource::Wood, 8.0)
                .adjacency(AdjacencyBonus {
                    trait_name: "forest".into(),
                    resource: Resource::Wood,
                    per_unit: 1.0,
                    cap: 4.0,
                }),
        );

        catalog.add(
            BuildingDef::new("sawmill", "Sawmill")
                .input(Resource::Workers, 2.0)
                .input(Resource::Wood, 6.0)
                .output(Resource::Planks, 4.0)
                .recipe(
                    "fine",
                    RecipeVariant {
                        inputs: BTreeMap::from([(Resource::Wood, 4.0 / 3.0)]),
                        outputs: BTreeMap::from([(Resource::Planks, 1.25)]),
                    },
                ),
        );

        catalog.add(
            BuildingDef::new("house", "House")
                .capacity(0)
                .input(Resource::Grain, 3.0)
                .output(Resource::Workers, 1.0),
        );

        catalog.add(
            BuildingDef::new("market", "Market")
                .input(Resource::Workers, 1.0)
                .output(Resource::Coin, 4.0),
        );

        catalog.add(
            BuildingDef::new("shrine", "Shrine")
                .input(Resource::Workers, 1.0)
                .input(Resource::Grain, 2.0)
                .output(Resource::Favor, 2.0)
                .output(Resource::Mana, 1.0),
        );

        catalog.add(
            BuildingDef::new("mage_tower", "Mage Tower")
                .input(Resource::Workers, 2.0)
                .input(Resource::Coin, 2.0)
                .output(Resource::Mana, 6.0),
        );

        catalog.add(
            BuildingDef::new("watchtower", "Watchtower")
                .input(Resource::Workers, 1.0)
                .input(Resource::Coin, 1.0)
                .output(Resource::Defense, 3.0),
        );

        catalog.add(BuildingDef::new("storehouse", "Storehouse").capacity(0));

        catalog.add(
            BuildingDef::new("sun_temple", "Sun Temple")
                .input(Resource::Workers, 4.0)
                .input(Resource::Coin, 5.0)
                .output(Resource::Favor, 5.0)
                .passive(PassiveEffects {
                    resource_multipliers: BTreeMap::from([(Resource::Grain, 1.1)]),
                    tick_adjustments: BTreeMap::from([(Resource::Favor, 1.0)]),
                    unique: true,
                    ..PassiveEffects::default()
                }),
        );

        catalog.add(
            BuildingDef::new("arcane_spire", "Arcane Spire")
                .input(Resource::Workers, 3.0)
                .input(Resource::Mana, 4.0)
                .output(Resource::Mana, 2.0)
                .passive(PassiveEffects {
                    resource_multipliers: BTreeMap::from([(Resource::Mana, 1.2)]),
                    building_multipliers: BTreeMap::from([("mage_tower".into(), 1.25)]),
                    global_resource_multiplier: Some(1.05),
                    unique: true,
                    ..PassiveEffects::default()
                }),
        );

        catalog.add(
            BuildingDef::new("guild_hall", "Guild Hall")
                .input(Resource::Workers, 2.0)
                .output(Resource::Coin, 3.0)
                .passive(PassiveEffects {
                    global_building_multiplier: Some(1.05),
                    ..PassiveEffects::default()
                }),
        );

        catalog
    }

    /// Add a definition, replacing any previous one with the same id
    pub fn add(&mut self, def: BuildingDef) {
        self.defs.insert(def.id.clone(), def);
    }

    /// Get a definition by type id
    pub fn get(&self, id: &str) -> Option<&BuildingDef> {
        self.defs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Type ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Load a catalog from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a catalog from TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let file: TomlBuildings = toml::from_str(content)?;

        let mut catalog = Self::new();
        for def in file.buildings {
            if catalog.contains(&def.id) {
                return Err(HearthError::DuplicateId {
                    kind: "building",
                    id: def.id,
                });
            }
            catalog.add(def);
        }
        Ok(catalog)
    }
}

/// TOML representation of the buildings file
#[derive(Debug, Deserialize)]
struct TomlBuildings {
    #[serde(default)]
    buildings: Vec<BuildingDef>,
}
