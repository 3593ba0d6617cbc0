//! City layer - resources, buildings, production and trade routes

pub mod building;
pub mod catalog;
pub mod production;
pub mod resource;
pub mod routes;

pub use building::BuildingInstance;
pub use catalog::{AdjacencyBonus, BuildingCatalog, BuildingDef, PassiveEffects, RecipeVariant};
pub use production::{
    produce_buildings, storehouse_connected, BuildingReport, BuildingStatus, ProductionOutcome,
};
pub use resource::{Resource, ResourceLedger};
pub use routes::{resolve_routes, route_coin, Edicts, Route, RouteOutcome};
