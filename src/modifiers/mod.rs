//! Modifier aggregation - charter, skills and building passives in one bundle
//!
//! Each source is turned into its own [`ModifierBundle`] and the three are
//! folded with [`ModifierBundle::merge`]: multipliers combine multiplicatively
//! per key, flat adjustments and upkeep deltas combine additively. Entries
//! that are non-finite (or non-positive, for multipliers) are dropped.

pub mod charter;
pub mod passives;
pub mod skills;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::city::resource::Resource;

pub use charter::{Charter, CharterCatalog};
pub use passives::collect_passive_effects;
pub use skills::{SkillEffects, SkillTable};

/// Normalized multipliers and adjustments applied during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierBundle {
    /// Output multiplier per resource
    pub resource_multipliers: BTreeMap<Resource, f64>,
    /// Output multiplier per building type id
    pub building_multipliers: BTreeMap<String, f64>,
    pub global_building_multiplier: f64,
    pub global_resource_multiplier: f64,
    pub route_coin_multiplier: f64,
    pub patrol_upkeep_multiplier: f64,
    /// Scales every non-worker building input
    pub building_input_multiplier: f64,
    /// Added to the base grain eaten per worker
    pub upkeep_delta: f64,
    /// Flat per-cycle ledger changes
    pub tick_adjustments: BTreeMap<Resource, f64>,
}

impl Default for ModifierBundle {
    fn default() -> Self {
        Self {
            resource_multipliers: BTreeMap::new(),
            building_multipliers: BTreeMap::new(),
            global_building_multiplier: 1.0,
            global_resource_multiplier: 1.0,
            route_coin_multiplier: 1.0,
            patrol_upkeep_multiplier: 1.0,
            building_input_multiplier: 1.0,
            upkeep_delta: 0.0,
            tick_adjustments: BTreeMap::new(),
        }
    }
}

/// A multiplier that can be applied, or `None` if it must be discarded
fn valid_multiplier(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn valid_flat(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn merge_multipliers<K: Ord + Clone>(
    into: &mut BTreeMap<K, f64>,
    from: &BTreeMap<K, f64>,
) {
    for (key, value) in from {
        let Some(value) = valid_multiplier(*value) else {
            continue;
        };
        let entry = into.entry(key.clone()).or_insert(1.0);
        *entry *= value;
    }
}

fn merge_flats<K: Ord + Clone>(into: &mut BTreeMap<K, f64>, from: &BTreeMap<K, f64>) {
    for (key, value) in from {
        let Some(value) = valid_flat(*value) else {
            continue;
        };
        *into.entry(key.clone()).or_insert(0.0) += value;
    }
}

impl ModifierBundle {
    /// The bundle that changes nothing
    pub fn identity() -> Self {
        Self::default()
    }

    /// Copy with every invalid entry dropped
    pub fn sanitized(&self) -> Self {
        Self::identity().merge(self)
    }

    /// Combine two bundles: multiplicative per key, additive for flat values
    pub fn merge(&self, other: &ModifierBundle) -> ModifierBundle {
        let mut out = self.clone();

        merge_multipliers(&mut out.resource_multipliers, &other.resource_multipliers);
        merge_multipliers(&mut out.building_multipliers, &other.building_multipliers);
        merge_flats(&mut out.tick_adjustments, &other.tick_adjustments);

        let scalars = [
            (&mut out.global_building_multiplier, other.global_building_multiplier),
            (&mut out.global_resource_multiplier, other.global_resource_multiplier),
            (&mut out.route_coin_multiplier, other.route_coin_multiplier),
            (&mut out.patrol_upkeep_multiplier, other.patrol_upkeep_multiplier),
            (&mut out.building_input_multiplier, other.building_input_multiplier),
        ];
        for (slot, value) in scalars {
            if let Some(value) = valid_multiplier(value) {
                *slot *= value;
            }
        }

        if let Some(delta) = valid_flat(other.upkeep_delta) {
            out.upkeep_delta += delta;
        }

        out
    }

    /// Output multiplier for a resource (1 when absent)
    pub fn resource_multiplier(&self, resource: Resource) -> f64 {
        self.resource_multipliers
            .get(&resource)
            .copied()
            .and_then(valid_multiplier)
            .unwrap_or(1.0)
    }

    /// Output multiplier for a building type (1 when absent)
    pub fn building_multiplier(&self, type_id: &str) -> f64 {
        self.building_multipliers
            .get(type_id)
            .copied()
            .and_then(valid_multiplier)
            .unwrap_or(1.0)
    }
}

/// Fold the three modifier sources into the bundle used for one tick
///
/// `combined[k] = skill[k] * charter[k] * passive[k]`
pub fn aggregate_modifiers(
    charter: Option<&Charter>,
    skills: &SkillEffects,
    passives: &ModifierBundle,
) -> ModifierBundle {
    let charter = charter.map(Charter::modifiers).unwrap_or_default();
    skills.modifiers().sanitized().merge(&charter).merge(passives)
}
