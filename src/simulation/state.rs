//! Game state carried between cycles and the proposals applied to it

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::city::building::BuildingInstance;
use crate::city::resource::{Resource, ResourceLedger};
use crate::city::routes::{Edicts, Route};
use crate::core::types::{round_whole, Tick};
use crate::era::{EraStatus, Milestones};

/// Complete per-session state; only the tick engine mutates it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub cycle: Tick,
    /// Highest cycle this session has reached
    pub max_cycle: Tick,
    pub resources: ResourceLedger,
    /// Free workers available to staff buildings
    pub workers: u32,
    pub buildings: Vec<BuildingInstance>,
    pub routes: Vec<Route>,
    /// Founding charter id, chosen once
    pub charter: Option<String>,
    /// Unlocked skill ids
    pub skills: Vec<String>,
    pub quests_completed: u32,
    pub edicts: Edicts,
    /// Era projection from the previous tick
    pub era: Option<EraStatus>,
    pub milestones: Option<Milestones>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, resource: Resource, amount: f64) -> Self {
        apply_delta(&mut self.resources, &mut self.workers, resource, amount);
        self
    }

    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_building(mut self, building: BuildingInstance) -> Self {
        self.buildings.push(building);
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_charter(mut self, charter: impl Into<String>) -> Self {
        self.charter = Some(charter.into());
        self
    }

    /// Number of buildings, used as city size by the era engine
    pub fn city_size(&self) -> u32 {
        u32::try_from(self.buildings.len()).unwrap_or(u32::MAX)
    }

    /// Id one past the highest building id in use
    pub fn next_building_id(&self) -> u64 {
        self.buildings
            .iter()
            .map(|b| b.id.0 + 1)
            .max()
            .unwrap_or(1)
    }
}

/// A pre-validated player action, reduced to its predicted resource change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub delta: BTreeMap<Resource, f64>,
}

impl Proposal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            delta: BTreeMap::new(),
        }
    }

    pub fn with_delta(mut self, resource: Resource, amount: f64) -> Self {
        *self.delta.entry(resource).or_insert(0.0) += amount;
        self
    }
}

/// Apply a signed change to the ledger, or to the worker pool for workers
///
/// Both sides are clamped at zero; non-finite deltas are ignored.
pub fn apply_delta(
    ledger: &mut ResourceLedger,
    workers: &mut u32,
    resource: Resource,
    delta: f64,
) {
    if !delta.is_finite() {
        return;
    }
    if resource.is_workers() {
        let next = (f64::from(*workers) + round_whole(delta)).max(0.0);
        *workers = if next >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            next as u32
        };
    } else {
        ledger.add(resource, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_delta_routes_workers_to_pool() {
        let mut ledger = ResourceLedger::new();
        let mut workers = 3;

        apply_delta(&mut ledger, &mut workers, Resource::Workers, 2.4);
        assert_eq!(workers, 5);
        apply_delta(&mut ledger, &mut workers, Resource::Workers, -2.5);
        assert_eq!(workers, 3);
        apply_delta(&mut ledger, &mut workers, Resource::Workers, -9.0);
        assert_eq!(workers, 0);
        assert_eq!(ledger.get(Resource::Workers), 0.0);

        apply_delta(&mut ledger, &mut workers, Resource::Coin, 4.0);
        apply_delta(&mut ledger, &mut workers, Resource::Coin, f64::NAN);
        assert_eq!(ledger.get(Resource::Coin), 4.0);
    }

    #[test]
    fn test_next_building_id() {
        let state = GameState::new();
        assert_eq!(state.next_building_id(), 1);
        let state = state
            .with_building(BuildingInstance::new(4, "farm"))
            .with_building(BuildingInstance::new(2, "farm"));
        assert_eq!(state.next_building_id(), 5);
        assert_eq!(state.city_size(), 2);
    }

    #[test]
    fn test_state_deserializes_with_missing_fields() {
        let state: GameState = serde_json::from_str(
            r#"{"cycle": 3, "resources": {"grain": 12}, "buildings": [{"id": 1, "type": "farm"}]}"#,
        )
        .unwrap();
        assert_eq!(state.cycle, 3);
        assert_eq!(state.max_cycle, 0);
        assert_eq!(state.resources.get(Resource::Grain), 12.0);
        assert_eq!(state.buildings.len(), 1);
        assert!(state.charter.is_none());
        assert!(!state.edicts.patrols);
    }

    #[test]
    fn test_proposal_builder_accumulates() {
        let p = Proposal::new("feast")
            .with_delta(Resource::Grain, -5.0)
            .with_delta(Resource::Grain, -1.0)
            .with_delta(Resource::Favor, 2.0);
        assert_eq!(p.delta.get(&Resource::Grain), Some(&-6.0));
        assert_eq!(p.delta.get(&Resource::Favor), Some(&2.0));
    }
}
