//! Placed building instances and their level/condition scaling

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::types::{BuildingId, GridPos};

/// A constructed building in the city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingInstance {
    pub id: BuildingId,
    /// Catalog id of the building type; unknown ids are inert
    #[serde(rename = "type")]
    pub type_id: String,
    /// Upgrade level, 1 for a fresh building
    #[serde(default = "default_level")]
    pub level: u32,
    /// Workers assigned by the labor market
    #[serde(default)]
    pub workers: u32,
    /// Selected recipe variant (e.g. "fine" for a sawmill)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    /// Named trait counts such as adjacency units
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub traits: BTreeMap<String, f64>,
    /// Maintenance condition, 0..=100; absent means fully maintained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<f64>,
    #[serde(default)]
    pub pos: GridPos,
}

fn default_level() -> u32 {
    1
}

impl BuildingInstance {
    pub fn new(id: u64, type_id: impl Into<String>) -> Self {
        Self {
            id: BuildingId(id),
            type_id: type_id.into(),
            level: 1,
            workers: 0,
            recipe: None,
            traits: BTreeMap::new(),
            condition: None,
            pos: GridPos::default(),
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipe = Some(recipe.into());
        self
    }

    pub fn with_trait(mut self, name: impl Into<String>, units: f64) -> Self {
        self.traits.insert(name.into(), units);
        self
    }

    pub fn with_condition(mut self, condition: f64) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.pos = GridPos::new(x, y);
        self
    }

    /// Level with the >= 1 floor applied
    pub fn effective_level(&self) -> u32 {
        self.level.max(1)
    }

    /// Output multiplier from upgrades: `1 + step * (level - 1)`
    pub fn level_output_scale(&self, config: &EngineConfig) -> f64 {
        1.0 + config.level_output_step * f64::from(self.effective_level() - 1)
    }

    /// Capacity multiplier from upgrades: `1 + step * (level - 1)`
    pub fn level_capacity_scale(&self, config: &EngineConfig) -> f64 {
        1.0 + config.level_capacity_step * f64::from(self.effective_level() - 1)
    }

    /// Number of trait units, 0 when the trait is missing or malformed
    pub fn trait_units(&self, name: &str) -> f64 {
        self.traits
            .get(name)
            .copied()
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0)
    }

    /// A building whose condition has fallen to zero is broken
    pub fn is_broken(&self) -> bool {
        matches!(self.condition, Some(c) if !c.is_finite() || c <= 0.0)
    }

    /// Output scale from maintenance: 0.5 at condition 0 up to 1.0 at 100
    pub fn condition_factor(&self) -> f64 {
        match self.condition {
            None => 1.0,
            Some(c) if !c.is_finite() || c <= 0.0 => 0.0,
            Some(c) => 0.5 + 0.5 * c.min(100.0) / 100.0,
        }
    }
}
