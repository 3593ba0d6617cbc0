//! Passive effects of standing buildings

use std::collections::BTreeSet;

use crate::city::building::BuildingInstance;
use crate::city::catalog::{BuildingCatalog, PassiveEffects};
use crate::modifiers::ModifierBundle;

impl PassiveEffects {
    /// View a passive block as a modifier bundle
    pub fn modifiers(&self) -> ModifierBundle {
        ModifierBundle {
            resource_multipliers: self.resource_multipliers.clone(),
            building_multipliers: self.building_multipliers.clone(),
            global_building_multiplier: self.global_building_multiplier.unwrap_or(1.0),
            global_resource_multiplier: self.global_resource_multiplier.unwrap_or(1.0),
            tick_adjustments: self.tick_adjustments.clone(),
            ..ModifierBundle::default()
        }
    }
}

/// Fold the passive effects of every active building, in list order
///
/// A building is active when its type is in the catalog and it is not broken.
/// A `unique` passive counts once per type.
pub fn collect_passive_effects(
    buildings: &[BuildingInstance],
    catalog: &BuildingCatalog,
) -> ModifierBundle {
    let mut seen_unique: BTreeSet<&str> = BTreeSet::new();
    let mut bundle = ModifierBundle::identity();

    for building in buildings {
        let Some(def) = catalog.get(&building.type_id) else {
            continue;
        };
        let Some(passive) = &def.passive else {
            continue;
        };
        if building.is_broken() {
            continue;
        }
        if passive.unique && !seen_unique.insert(def.id.as_str()) {
            continue;
        }
        bundle = bundle.merge(&passive.modifiers());
    }

    bundle
}
