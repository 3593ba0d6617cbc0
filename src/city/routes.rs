//! Trade routes and edicts
//!
//! Routes link two buildings. After every building has produced, each route
//! earns coin by length; the route network and the tariff/patrol edicts then
//! move unrest and coin in one pass.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::city::building::BuildingInstance;
use crate::city::resource::{Resource, ResourceLedger};
use crate::core::config::EngineConfig;
use crate::core::types::{round_whole, BuildingId, GridPos};
use crate::modifiers::ModifierBundle;

/// An edge between two buildings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub from: BuildingId,
    pub to: BuildingId,
    /// Declared length; the Manhattan distance between endpoints when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

impl Route {
    pub fn new(from: u64, to: u64) -> Self {
        Self {
            from: BuildingId(from),
            to: BuildingId(to),
            length: None,
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Length used for income, capped by config
    ///
    /// Unknown endpoints with no declared length give length 0.
    pub fn effective_length(
        &self,
        positions: &AHashMap<BuildingId, GridPos>,
        config: &EngineConfig,
    ) -> f64 {
        let declared = self
            .length
            .filter(|l| l.is_finite() && *l >= 0.0);
        let length = declared.unwrap_or_else(|| {
            match (positions.get(&self.from), positions.get(&self.to)) {
                (Some(a), Some(b)) => f64::from(a.manhattan(b)),
                _ => 0.0,
            }
        });
        length.min(config.route_length_cap)
    }
}

/// Standing city policies that touch routes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edicts {
    /// Tariff level, 0..=100
    #[serde(default)]
    pub tariffs: f64,
    #[serde(default)]
    pub patrols: bool,
}

/// What the route pass did to the ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteOutcome {
    pub coin_income: f64,
    pub unrest_delta: f64,
    pub patrol_upkeep: f64,
}

/// Coin earned by one route of the given length
pub fn route_coin(length: f64, modifiers: &ModifierBundle, config: &EngineConfig) -> f64 {
    let raw = length
        * config.route_coin_per_length
        * modifiers.route_coin_multiplier
        * modifiers.global_resource_multiplier
        * modifiers.resource_multiplier(Resource::Coin);
    let raw = if raw.is_finite() { raw } else { 0.0 };
    round_whole(raw.max(config.route_min_coin))
}

/// Resolve route income, route unrest and edict costs into the ledger
pub fn resolve_routes(
    ledger: &mut ResourceLedger,
    routes: &[Route],
    buildings: &[BuildingInstance],
    edicts: &Edicts,
    modifiers: &ModifierBundle,
    config: &EngineConfig,
) -> RouteOutcome {
    let positions: AHashMap<BuildingId, GridPos> =
        buildings.iter().map(|b| (b.id, b.pos)).collect();

    let coin_income: f64 = routes
        .iter()
        .map(|route| route_coin(route.effective_length(&positions, config), modifiers, config))
        .sum();

    let mut unrest_delta = (routes.len() / 2) as f64;
    if edicts.tariffs >= config.tariff_unrest_threshold {
        unrest_delta += 1.0;
    }
    if edicts.patrols {
        unrest_delta -= 1.0;
    }

    let patrol_upkeep = if edicts.patrols {
        round_whole(config.patrol_coin_upkeep * modifiers.patrol_upkeep_multiplier)
    } else {
        0.0
    };

    ledger.add(Resource::Coin, coin_income);
    ledger.add(Resource::Unrest, unrest_delta);
    ledger.add(Resource::Coin, -patrol_upkeep);

    tracing::trace!(
        "Routes: {} routes earned {} coin, unrest {:+}, patrol upkeep {}",
        routes.len(),
        coin_income,
        unrest_delta,
        patrol_upkeep
    );

    RouteOutcome {
        coin_income,
        unrest_delta,
        patrol_upkeep,
    }
}
