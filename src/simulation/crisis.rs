//! Crisis detection - one-shot penalties when unrest or threat boils over

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::city::resource::{Resource, ResourceLedger};
use crate::core::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum CrisisKind {
    #[display(fmt = "unrest")]
    Unrest,
    #[display(fmt = "threat")]
    Threat,
}

/// A crisis that fired this tick and the penalty it took
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crisis {
    #[serde(rename = "type")]
    pub kind: CrisisKind,
    pub message: String,
    pub penalty: BTreeMap<Resource, f64>,
}

/// Check for a crisis; unrest takes priority over threat
pub fn detect_crisis(ledger: &ResourceLedger, config: &EngineConfig) -> Option<Crisis> {
    let unrest = ledger.get(Resource::Unrest);
    let threat = ledger.get(Resource::Threat);

    if unrest >= config.unrest_crisis.threshold {
        return Some(Crisis {
            kind: CrisisKind::Unrest,
            message: format!("Riots in the streets: unrest reached {:.1}", unrest),
            penalty: config.unrest_crisis.penalty.clone(),
        });
    }
    if threat >= config.threat_crisis.threshold {
        return Some(Crisis {
            kind: CrisisKind::Threat,
            message: format!("Raiders at the walls: threat reached {:.1}", threat),
            penalty: config.threat_crisis.penalty.clone(),
        });
    }
    None
}

/// Remove a crisis penalty from the ledger, clamped at zero
pub fn apply_crisis(ledger: &mut ResourceLedger, crisis: &Crisis) {
    for (resource, amount) in &crisis.penalty {
        ledger.add(*resource, -amount);
    }
}
