//! Resource ledger - the city's economic state carried between cycles
//!
//! Every write path clamps to zero, so a ledger value can never go negative.
//! The ledger is backed by a `BTreeMap` so serialized output is ordered the
//! same way on every run.

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::non_negative;

/// Kinds of resource tracked by the city
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    #[display(fmt = "grain")]
    Grain,
    #[display(fmt = "coin")]
    Coin,
    #[display(fmt = "mana")]
    Mana,
    #[display(fmt = "favor")]
    Favor,
    #[display(fmt = "wood")]
    Wood,
    #[display(fmt = "planks")]
    Planks,
    /// Pseudo-resource: building inputs/outputs of workers move the worker pool
    #[display(fmt = "workers")]
    Workers,
    #[display(fmt = "unrest")]
    Unrest,
    #[display(fmt = "threat")]
    Threat,
    #[display(fmt = "defense")]
    Defense,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::Grain,
        Resource::Coin,
        Resource::Mana,
        Resource::Favor,
        Resource::Wood,
        Resource::Planks,
        Resource::Workers,
        Resource::Unrest,
        Resource::Threat,
        Resource::Defense,
    ];

    /// Whether this is the worker pseudo-resource
    pub fn is_workers(self) -> bool {
        self == Resource::Workers
    }
}

/// Non-negative mapping from resource to amount
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLedger {
    amounts: BTreeMap<Resource, f64>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from (resource, amount) pairs, clamping each amount
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Resource, f64)>) -> Self {
        let mut ledger = Self::new();
        for (resource, amount) in pairs {
            ledger.set(resource, amount);
        }
        ledger
    }

    /// Current amount of a resource (missing keys read as 0)
    pub fn get(&self, resource: Resource) -> f64 {
        self.amounts.get(&resource).copied().unwrap_or(0.0)
    }

    /// Overwrite an amount, clamped to zero
    pub fn set(&mut self, resource: Resource, amount: f64) {
        self.amounts.insert(resource, non_negative(amount));
    }

    /// Apply a signed delta, clamped to zero. Non-finite deltas are ignored.
    pub fn add(&mut self, resource: Resource, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let current = self.get(resource);
        self.set(resource, current + delta);
    }

    /// Remove up to `amount`, returns the amount actually removed
    pub fn remove(&mut self, resource: Resource, amount: f64) -> f64 {
        let current = self.get(resource);
        let removed = non_negative(amount).min(current);
        self.set(resource, current - removed);
        removed
    }

    /// Check if the ledger holds at least each required amount
    pub fn has_materials(&self, requirements: &[(Resource, f64)]) -> bool {
        requirements
            .iter()
            .all(|(res, amount)| self.get(*res) >= *amount)
    }

    /// Consume all requirements, or nothing if any one is short
    pub fn consume_materials(&mut self, requirements: &[(Resource, f64)]) -> bool {
        if !self.has_materials(requirements) {
            return false;
        }
        for (res, amount) in requirements {
            self.remove(*res, *amount);
        }
        true
    }

    /// Iterate entries in resource order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, f64)> + '_ {
        self.amounts.iter().map(|(r, a)| (*r, *a))
    }

    /// True when every stored amount is finite and non-negative
    pub fn is_well_formed(&self) -> bool {
        self.amounts.values().all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_add_remove() {
        let mut ledger = ResourceLedger::new();
        ledger.add(Resource::Wood, 30.0);
        assert_eq!(ledger.get(Resource::Wood), 30.0);

        // Removal is capped at what is held
        assert_eq!(ledger.remove(Resource::Wood, 50.0), 30.0);
        assert_eq!(ledger.get(Resource::Wood), 0.0);

        // Missing key reads as zero
        assert_eq!(ledger.get(Resource::Mana), 0.0);
    }

    #[test]
    fn test_ledger_clamps_negative_writes() {
        let mut ledger = ResourceLedger::from_pairs([(Resource::Coin, 5.0)]);
        ledger.add(Resource::Coin, -12.0);
        assert_eq!(ledger.get(Resource::Coin), 0.0);

        ledger.set(Resource::Grain, -3.0);
        assert_eq!(ledger.get(Resource::Grain), 0.0);

        ledger.add(Resource::Grain, f64::NAN);
        assert_eq!(ledger.get(Resource::Grain), 0.0);
        assert!(ledger.is_well_formed());
    }

    #[test]
    fn test_ledger_consume_all_or_nothing() {
        let mut ledger = ResourceLedger::from_pairs([(Resource::Wood, 50.0), (Resource::Coin, 3.0)]);

        let too_much = vec![(Resource::Wood, 20.0), (Resource::Coin, 10.0)];
        assert!(!ledger.consume_materials(&too_much));
        assert_eq!(ledger.get(Resource::Wood), 50.0, "nothing consumed on failure");

        let fine = vec![(Resource::Wood, 20.0), (Resource::Coin, 3.0)];
        assert!(ledger.consume_materials(&fine));
        assert_eq!(ledger.get(Resource::Wood), 30.0);
        assert_eq!(ledger.get(Resource::Coin), 0.0);
    }

    #[test]
    fn test_resource_serde_names() {
        let ledger = ResourceLedger::from_pairs([(Resource::Planks, 4.0), (Resource::Grain, 1.0)]);
        let json = serde_json::to_string(&ledger).unwrap();
        assert_eq!(json, r#"{"grain":1.0,"planks":4.0}"#);
        assert_eq!(Resource::Planks.to_string(), "planks");
    }
}
