//! Era progression - difficulty stages driven by city size and quests

pub mod definitions;
pub mod evaluate;

pub use definitions::{
    AscensionCondition, EraDefinition, EraGoal, EraMetric, EraTable, Mitigation, Pressure,
};
pub use evaluate::{
    evaluate_era, stability, AscensionStatus, EraInputs, EraMetrics, EraStatus, GoalStatus,
    Milestones, MitigationStatus, NextEraPreview,
};
