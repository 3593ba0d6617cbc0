//! Static rule content loaded from TOML: catalog, charters, eras and engine constants

mod loader;

pub use loader::{load_rules, RULE_FILES};

use crate::city::catalog::BuildingCatalog;
use crate::core::config::EngineConfig;
use crate::era::EraTable;
use crate::modifiers::{CharterCatalog, SkillTable};

/// Everything the tick engine reads but never writes
#[derive(Debug, Clone)]
pub struct Rules {
    pub buildings: BuildingCatalog,
    pub charters: CharterCatalog,
    pub eras: EraTable,
    pub skills: SkillTable,
    pub config: EngineConfig,
}

impl Rules {
    /// Built-in content, identical to the files shipped under `data/`
    pub fn with_defaults() -> Self {
        Self {
            buildings: BuildingCatalog::with_defaults(),
            charters: CharterCatalog::with_defaults(),
            eras: EraTable::with_defaults(),
            skills: SkillTable::with_defaults(),
            config: EngineConfig::default(),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::with_defaults()
    }
}
