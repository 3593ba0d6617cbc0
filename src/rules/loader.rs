//! Load rule content from a data directory

use std::path::Path;

use crate::city::catalog::BuildingCatalog;
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::era::EraTable;
use crate::modifiers::CharterCatalog;
use crate::rules::Rules;

/// File names looked up inside the data directory
pub const RULE_FILES: [&str; 4] = ["buildings.toml", "charters.toml", "eras.toml", "engine.toml"];

/// Load all rule files from `dir`
///
/// A missing file falls back to the built-in defaults for that part;
/// a present but malformed file is an error.
pub fn load_rules(dir: &Path) -> Result<Rules> {
    let mut rules = Rules::with_defaults();

    let path = dir.join(RULE_FILES[0]);
    if path.exists() {
        rules.buildings = BuildingCatalog::load_from_toml(&path)?;
    }

    let path = dir.join(RULE_FILES[1]);
    if path.exists() {
        rules.charters = CharterCatalog::load_from_toml(&path)?;
    }

    let path = dir.join(RULE_FILES[2]);
    if path.exists() {
        rules.eras = EraTable::load_from_toml(&path)?;
    }

    let path = dir.join(RULE_FILES[3]);
    if path.exists() {
        rules.config = EngineConfig::load_from_toml(&path)?;
    }

    tracing::debug!(
        "Loaded rules from {}: {} building types, {} charters, {} eras",
        dir.display(),
        rules.buildings.len(),
        rules.charters.len(),
        rules.eras.len()
    );

    Ok(rules)
}
