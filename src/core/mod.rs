pub mod config;
pub mod error;
pub mod types;

pub use config::{CrisisRule, EngineConfig};
pub use error::{HearthError, Result};
pub use types::{BuildingId, GridPos, Tick};
