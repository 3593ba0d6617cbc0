//! Simulation layer - game state and the per-cycle tick engine

pub mod crisis;
pub mod state;
pub mod tick;

pub use crisis::{apply_crisis, detect_crisis, Crisis, CrisisKind};
pub use state::{apply_delta, GameState, Proposal};
pub use tick::{process_tick, TickOutcome, TickPhase, TickReport};
