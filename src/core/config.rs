//! Engine configuration with documented constants
//!
//! All magic numbers used by the per-cycle engine are collected here with
//! explanations of their purpose and how they interact with each other.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::city::resource::Resource;
use crate::core::error::{HearthError, Result};

/// Threshold and penalty of one crisis kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisRule {
    /// Ledger value at or above which the crisis fires
    pub threshold: f64,
    /// Amounts removed from the ledger when the crisis fires
    pub penalty: BTreeMap<Resource, f64>,
}

/// Configuration for the tick engine
///
/// These values have been tuned against the default building catalog.
/// Changing them will affect pacing of the whole economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === BUILDINGS ===
    /// Extra output per level above 1
    ///
    /// At 0.5, a level 3 building produces 2x its base output.
    pub level_output_step: f64,

    /// Extra worker capacity per level above 1
    ///
    /// Capacity grows slower than output so upgrades also raise
    /// output per worker.
    pub level_capacity_step: f64,

    /// Building type id that acts as a storehouse for route connectivity
    pub storehouse_type: String,

    /// Multiplier on raw-material output for buildings routed to a storehouse
    pub storehouse_bonus: f64,

    /// Outputs that count as raw materials for the storehouse bonus
    pub raw_materials: Vec<Resource>,

    // === ROUTES ===
    /// Longest route length that still earns more coin
    pub route_length_cap: f64,

    /// Coin earned per unit of route length before multipliers
    pub route_coin_per_length: f64,

    /// Coin floor per route after multipliers
    pub route_min_coin: f64,

    /// Tariff edict level at or above which routes add one unrest
    pub tariff_unrest_threshold: f64,

    /// Coin cost of the patrols edict per cycle before multipliers
    pub patrol_coin_upkeep: f64,

    // === UPKEEP ===
    /// Grain eaten per worker per cycle before skill and charter deltas
    pub base_grain_upkeep: f64,

    // === CRISIS ===
    /// Checked first; wins when both crises qualify
    pub unrest_crisis: CrisisRule,

    /// Checked only when the unrest crisis does not fire
    pub threat_crisis: CrisisRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            level_output_step: 0.5,
            level_capacity_step: 0.25,
            storehouse_type: "storehouse".into(),
            storehouse_bonus: 1.15,
            raw_materials: vec![Resource::Grain, Resource::Wood, Resource::Planks],

            route_length_cap: 20.0,
            route_coin_per_length: 0.5,
            route_min_coin: 1.0,
            tariff_unrest_threshold: 60.0,
            patrol_coin_upkeep: 2.0,

            base_grain_upkeep: 0.2,

            unrest_crisis: CrisisRule {
                threshold: 80.0,
                penalty: BTreeMap::from([
                    (Resource::Grain, 10.0),
                    (Resource::Coin, 10.0),
                    (Resource::Favor, 5.0),
                ]),
            },
            threat_crisis: CrisisRule {
                threshold: 70.0,
                penalty: BTreeMap::from([(Resource::Mana, 10.0), (Resource::Favor, 5.0)]),
            },
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("level_output_step", self.level_output_step),
            ("level_capacity_step", self.level_capacity_step),
            ("route_length_cap", self.route_length_cap),
            ("route_coin_per_length", self.route_coin_per_length),
            ("route_min_coin", self.route_min_coin),
            ("tariff_unrest_threshold", self.tariff_unrest_threshold),
            ("patrol_coin_upkeep", self.patrol_coin_upkeep),
            ("base_grain_upkeep", self.base_grain_upkeep),
            ("unrest_crisis.threshold", self.unrest_crisis.threshold),
            ("threat_crisis.threshold", self.threat_crisis.threshold),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(HearthError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        if !self.storehouse_bonus.is_finite() || self.storehouse_bonus < 1.0 {
            return Err(HearthError::InvalidConfig(format!(
                "storehouse_bonus ({}) should be >= 1",
                self.storehouse_bonus
            )));
        }

        let penalties = self
            .unrest_crisis
            .penalty
            .values()
            .chain(self.threat_crisis.penalty.values());
        for amount in penalties {
            if !amount.is_finite() || *amount < 0.0 {
                return Err(HearthError::InvalidConfig(
                    "crisis penalties must be finite and non-negative".into(),
                ));
            }
        }

        Ok(())
    }
}
