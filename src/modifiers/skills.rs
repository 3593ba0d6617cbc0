//! Skill effect bundle - aggregated output of the skill tree
//!
//! The skill tree itself lives outside the engine. What arrives here is the
//! already-folded numeric effect of every unlocked skill.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::city::resource::Resource;
use crate::modifiers::ModifierBundle;

/// Numeric effect of a set of unlocked skills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillEffects {
    pub res_mul: BTreeMap<Resource, f64>,
    pub bld_mul: BTreeMap<String, f64>,
    pub global_building_multiplier: f64,
    pub global_resource_multiplier: f64,
    pub route_coin_multiplier: f64,
    pub patrol_coin_upkeep_multiplier: f64,
    pub building_input_multiplier: f64,
    pub upkeep_delta: f64,
}

impl Default for SkillEffects {
    fn default() -> Self {
        Self {
            res_mul: BTreeMap::new(),
            bld_mul: BTreeMap::new(),
            global_building_multiplier: 1.0,
            global_resource_multiplier: 1.0,
            route_coin_multiplier: 1.0,
            patrol_coin_upkeep_multiplier: 1.0,
            building_input_multiplier: 1.0,
            upkeep_delta: 0.0,
        }
    }
}

impl SkillEffects {
    /// View these effects as a modifier bundle
    pub fn modifiers(&self) -> ModifierBundle {
        ModifierBundle {
            resource_multipliers: self.res_mul.clone(),
            building_multipliers: self.bld_mul.clone(),
            global_building_multiplier: self.global_building_multiplier,
            global_resource_multiplier: self.global_resource_multiplier,
            route_coin_multiplier: self.route_coin_multiplier,
            patrol_upkeep_multiplier: self.patrol_coin_upkeep_multiplier,
            building_input_multiplier: self.building_input_multiplier,
            upkeep_delta: self.upkeep_delta,
            tick_adjustments: BTreeMap::new(),
        }
    }
}

/// Fixed per-skill effects, folded for a list of unlocked skill ids
///
/// Stands in for the generated skill tree in tools and tests.
#[derive(Debug, Clone, Default)]
pub struct SkillTable {
    skills: AHashMap<String, SkillEffects>,
}

impl SkillTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.add(
            "crop_rotation",
            SkillEffects {
                res_mul: BTreeMap::from([(Resource::Grain, 1.1)]),
                ..SkillEffects::default()
            },
        );
        table.add(
            "caravan_charts",
            SkillEffects {
                route_coin_multiplier: 1.2,
                ..SkillEffects::default()
            },
        );
        table.add(
            "joinery",
            SkillEffects {
                building_input_multiplier: 0.9,
                bld_mul: BTreeMap::from([("sawmill".into(), 1.1)]),
                ..SkillEffects::default()
            },
        );
        table.add(
            "communal_kitchens",
            SkillEffects {
                upkeep_delta: -0.05,
                ..SkillEffects::default()
            },
        );
        table.add(
            "militia_drills",
            SkillEffects {
                patrol_coin_upkeep_multiplier: 0.5,
                ..SkillEffects::default()
            },
        );
        table
    }

    pub fn add(&mut self, id: impl Into<String>, effects: SkillEffects) {
        self.skills.insert(id.into(), effects);
    }

    /// Fold the effects of the unlocked skills; unknown ids contribute nothing
    pub fn effects_for(&self, unlocked: &[String]) -> SkillEffects {
        let folded = unlocked
            .iter()
            .filter_map(|id| self.skills.get(id))
            .fold(ModifierBundle::identity(), |acc, s| acc.merge(&s.modifiers()));

        SkillEffects {
            res_mul: folded.resource_multipliers,
            bld_mul: folded.building_multipliers,
            global_building_multiplier: folded.global_building_multiplier,
            global_resource_multiplier: folded.global_resource_multiplier,
            route_coin_multiplier: folded.route_coin_multiplier,
            patrol_coin_upkeep_multiplier: folded.patrol_upkeep_multiplier,
            building_input_multiplier: folded.building_input_multiplier,
            upkeep_delta: folded.upkeep_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_effects_are_identity() {
        assert_eq!(SkillEffects::default().modifiers(), ModifierBundle::identity());
    }

    #[test]
    fn test_deserialize_camel_case_contract() {
        let json = r#"{
            "resMul": {"grain": 1.2},
            "routeCoinMultiplier": 1.5,
            "patrolCoinUpkeepMultiplier": 0.5,
            "upkeepDelta": -0.1
        }"#;
        let effects: SkillEffects = serde_json::from_str(json).unwrap();
        assert_eq!(effects.res_mul.get(&Resource::Grain), Some(&1.2));
        assert_eq!(effects.route_coin_multiplier, 1.5);
        assert_eq!(effects.patrol_coin_upkeep_multiplier, 0.5);
        assert_eq!(effects.upkeep_delta, -0.1);
        // Omitted fields stay neutral
        assert_eq!(effects.global_building_multiplier, 1.0);
        assert_eq!(effects.building_input_multiplier, 1.0);
    }

    #[test]
    fn test_skill_table_folds_unlocked() {
        let table = SkillTable::with_defaults();
        let unlocked = vec![
            "crop_rotation".to_string(),
            "joinery".to_string(),
            "not_a_skill".to_string(),
        ];
        let effects = table.effects_for(&unlocked);
        assert_eq!(effects.res_mul.get(&Resource::Grain), Some(&1.1));
        assert_eq!(effects.bld_mul.get("sawmill"), Some(&1.1));
        assert_eq!(effects.building_input_multiplier, 0.9);
        assert_eq!(effects.route_coin_multiplier, 1.0);
    }

    #[test]
    fn test_skill_table_no_skills() {
        let table = SkillTable::with_defaults();
        assert_eq!(table.effects_for(&[]), SkillEffects::default());
    }
}
