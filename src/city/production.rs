//! Production system - resolves building production each tick
//!
//! Buildings are processed in list order. For each one:
//! - Unknown types and broken buildings are inert
//! - Staffing sets a ratio that scales inputs and outputs
//! - All non-worker inputs must be affordable, or nothing is consumed
//! - Inputs are deducted, the worker requirement leaves the worker pool
//! - Outputs are scaled by level, recipe, adjacency, storehouse access and
//!   the aggregated modifiers, then rounded and added to the ledger

use std::collections::BTreeMap;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::city::building::BuildingInstance;
use crate::city::catalog::{BuildingCatalog, BuildingDef};
use crate::city::resource::{Resource, ResourceLedger};
use crate::city::routes::Route;
use crate::core::config::EngineConfig;
use crate::core::types::{non_negative, round_whole, BuildingId};
use crate::modifiers::ModifierBundle;

/// Why a building did or did not produce this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildingStatus {
    Produced,
    /// Type id not in the catalog
    Inert,
    /// Condition fell to zero
    Broken,
    /// An input could not be paid in full
    Unaffordable {
        resource: Resource,
        need: f64,
        available: f64,
    },
}

/// Result of resolving one building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingReport {
    pub building: BuildingId,
    pub type_id: String,
    #[serde(flatten)]
    pub status: BuildingStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub consumed: BTreeMap<Resource, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub produced: BTreeMap<Resource, f64>,
    #[serde(default)]
    pub workers_used: u32,
}

impl BuildingReport {
    fn skipped(building: &BuildingInstance, status: BuildingStatus) -> Self {
        Self {
            building: building.id,
            type_id: building.type_id.clone(),
            status,
            consumed: BTreeMap::new(),
            produced: BTreeMap::new(),
            workers_used: 0,
        }
    }
}

/// Ledger and worker pool after all buildings have produced
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionOutcome {
    pub ledger: ResourceLedger,
    pub workers: u32,
    pub reports: Vec<BuildingReport>,
}

/// Ids of buildings directly linked by a route to a storehouse
pub fn storehouse_connected(
    buildings: &[BuildingInstance],
    routes: &[Route],
    config: &EngineConfig,
) -> AHashSet<BuildingId> {
    let storehouses: AHashSet<BuildingId> = buildings
        .iter()
        .filter(|b| b.type_id == config.storehouse_type)
        .map(|b| b.id)
        .collect();

    let mut connected = AHashSet::new();
    for route in routes {
        if storehouses.contains(&route.from) {
            connected.insert(route.to);
        }
        if storehouses.contains(&route.to) {
            connected.insert(route.from);
        }
    }
    connected
}

/// Share of level-scaled capacity that is staffed (1 for unstaffed types)
fn staffing_ratio(building: &BuildingInstance, def: &BuildingDef, config: &EngineConfig) -> f64 {
    let capacity =
        round_whole(f64::from(def.base_capacity()) * building.level_capacity_scale(config)) as u32;
    let assigned = building.workers.min(capacity);
    if capacity == 0 {
        1.0
    } else {
        f64::from(assigned) / f64::from(capacity)
    }
}

/// Process production for all buildings
pub fn produce_buildings(
    ledger: &ResourceLedger,
    workers: u32,
    buildings: &[BuildingInstance],
    routes: &[Route],
    catalog: &BuildingCatalog,
    modifiers: &ModifierBundle,
    config: &EngineConfig,
) -> ProductionOutcome {
    let mut ledger = ledger.clone();
    let mut workers = workers;
    let mut reports = Vec::with_capacity(buildings.len());

    let connected = storehouse_connected(buildings, routes, config);

    for building in buildings {
        let Some(def) = catalog.get(&building.type_id) else {
            tracing::trace!("Building {} has unknown type '{}'", building.id, building.type_id);
            reports.push(BuildingReport::skipped(building, BuildingStatus::Inert));
            continue;
        };
        if building.is_broken() {
            reports.push(BuildingReport::skipped(building, BuildingStatus::Broken));
            continue;
        }

        let ratio = staffing_ratio(building, def, config);
        let recipe = def.recipe_variant(building.recipe.as_deref());

        // Inputs
        let mut worker_need = 0u32;
        let mut requirements: Vec<(Resource, f64)> = Vec::with_capacity(def.inputs.len());
        for (&resource, &base) in &def.inputs {
            if resource.is_workers() {
                worker_need = round_whole(non_negative(base) * ratio) as u32;
                continue;
            }
            let recipe_mult = recipe.map_or(1.0, |r| r.input_multiplier(resource));
            let need = round_whole(
                non_negative(base) * ratio * recipe_mult * modifiers.building_input_multiplier,
            );
            requirements.push((resource, non_negative(need)));
        }

        if let Some(&(resource, need)) = requirements
            .iter()
            .find(|(res, need)| *need > ledger.get(*res))
        {
            let available = ledger.get(resource);
            tracing::debug!(
                "Building {} ({}) skipped: needs {} {}, has {}",
                building.id,
                building.type_id,
                need,
                resource,
                available
            );
            reports.push(BuildingReport::skipped(
                building,
                BuildingStatus::Unaffordable {
                    resource,
                    need,
                    available,
                },
            ));
            continue;
        }

        ledger.consume_materials(&requirements);
        workers = workers.saturating_sub(worker_need);

        // Outputs
        let level_scale = building.level_output_scale(config);
        let condition = building.condition_factor();
        let storehouse_linked = connected.contains(&building.id);
        let building_mult =
            modifiers.global_building_multiplier * modifiers.building_multiplier(&def.id);

        let mut produced = BTreeMap::new();
        for (&resource, &base) in &def.outputs {
            let recipe_mult = recipe.map_or(1.0, |r| r.output_multiplier(resource));
            let mut out = non_negative(base) * ratio * level_scale * recipe_mult * condition;

            if let Some(adjacency) = def.adjacency.as_ref().filter(|a| a.resource == resource) {
                out += adjacency.bonus(building.trait_units(&adjacency.trait_name));
            }
            if storehouse_linked && config.raw_materials.contains(&resource) {
                out *= config.storehouse_bonus;
            }
            out *= building_mult;
            if !resource.is_workers() {
                out *= modifiers.global_resource_multiplier
                    * modifiers.resource_multiplier(resource);
            }
            let amount = non_negative(round_whole(out));

            if resource.is_workers() {
                workers = workers.saturating_add(amount as u32);
            } else {
                ledger.add(resource, amount);
            }
            produced.insert(resource, amount);
        }

        reports.push(BuildingReport {
            building: building.id,
            type_id: building.type_id.clone(),
            status: BuildingStatus::Produced,
            consumed: requirements.into_iter().collect(),
            produced,
            workers_used: worker_need,
        });
    }

    ProductionOutcome {
        ledger,
        workers,
        reports,
    }
}
