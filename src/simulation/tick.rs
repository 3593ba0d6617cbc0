//! Tick system - orchestrates one simulation cycle
//!
//! Phases run in a fixed order:
//! proposals -> production and routes -> era evaluation -> pressure and upkeep
//! -> crisis detection -> cycle advance
//!
//! The era snapshot is taken from the post-production ledger, before this
//! cycle's pressure is subtracted, so milestones show progress at the start
//! of the cycle.

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::city::production::{produce_buildings, BuildingReport};
use crate::city::resource::Resource;
use crate::city::routes::{resolve_routes, RouteOutcome};
use crate::core::types::{non_negative, round_cents, round_whole};
use crate::era::{evaluate_era, EraInputs, Pressure};
use crate::modifiers::{aggregate_modifiers, collect_passive_effects, ModifierBundle, SkillEffects};
use crate::rules::Rules;
use crate::simulation::crisis::{apply_crisis, detect_crisis, Crisis};
use crate::simulation::state::{apply_delta, GameState, Proposal};

/// Phase the orchestrator is in; a tick walks through every phase once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TickPhase {
    #[display(fmt = "idle")]
    Idle,
    #[display(fmt = "applying proposals")]
    ApplyingProposals,
    #[display(fmt = "resolving production")]
    ResolvingProduction,
    #[display(fmt = "evaluating era")]
    EvaluatingEra,
    #[display(fmt = "applying pressure")]
    ApplyingPressure,
    #[display(fmt = "detecting crisis")]
    DetectingCrisis,
    #[display(fmt = "advancing cycle")]
    AdvancingCycle,
}

impl TickPhase {
    /// The phase that follows this one
    pub fn next(self) -> TickPhase {
        match self {
            TickPhase::Idle => TickPhase::ApplyingProposals,
            TickPhase::ApplyingProposals => TickPhase::ResolvingProduction,
            TickPhase::ResolvingProduction => TickPhase::EvaluatingEra,
            TickPhase::EvaluatingEra => TickPhase::ApplyingPressure,
            TickPhase::ApplyingPressure => TickPhase::DetectingCrisis,
            TickPhase::DetectingCrisis => TickPhase::AdvancingCycle,
            TickPhase::AdvancingCycle => TickPhase::Idle,
        }
    }
}

/// Step to the next phase and log the transition
fn advance(phase: TickPhase, cycle: u64) -> TickPhase {
    let next = phase.next();
    tracing::trace!("cycle {}: {} -> {}", cycle, phase, next);
    next
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub proposals_applied: usize,
    /// Folded passive effects of all active buildings
    pub passive_effects: ModifierBundle,
    /// Skill, charter and passive effects merged
    pub modifiers: ModifierBundle,
    pub buildings: Vec<BuildingReport>,
    pub routes: RouteOutcome,
    /// Pressure as applied, at two-decimal precision
    pub pressure_applied: Pressure,
    pub grain_upkeep: f64,
    /// Flat adjustments as applied, after rounding
    pub tick_adjustments: BTreeMap<Resource, f64>,
    /// Previous and new era id, when the era changed this tick
    pub era_changed: Option<(String, String)>,
}

/// The next state plus everything observers may want to show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub state: GameState,
    pub crisis: Option<Crisis>,
    pub report: TickReport,
}

/// Advance a game state by one cycle
///
/// Pure: the input state is not touched, and identical inputs always
/// produce identical output. Unknown building types and charter ids are
/// skipped rather than reported as errors.
pub fn process_tick(
    state: &GameState,
    proposals: &[Proposal],
    rules: &Rules,
    skills: &SkillEffects,
) -> TickOutcome {
    let cycle = state.cycle;
    let config = &rules.config;
    let mut next = state.clone();
    let mut report = TickReport::default();
    let mut phase = advance(TickPhase::Idle, cycle);

    // Phase 1: proposals
    for proposal in proposals {
        for (&resource, &delta) in &proposal.delta {
            apply_delta(&mut next.resources, &mut next.workers, resource, delta);
        }
    }
    report.proposals_applied = proposals.len();
    phase = advance(phase, cycle);

    // Phase 2: production and routes
    let charter = rules.charters.resolve(next.charter.as_deref());
    let passives = collect_passive_effects(&next.buildings, &rules.buildings);
    let modifiers = aggregate_modifiers(charter, skills, &passives);

    let production = produce_buildings(
        &next.resources,
        next.workers,
        &next.buildings,
        &next.routes,
        &rules.buildings,
        &modifiers,
        config,
    );
    next.resources = production.ledger;
    next.workers = production.workers;
    report.buildings = production.reports;

    report.routes = resolve_routes(
        &mut next.resources,
        &next.routes,
        &next.buildings,
        &next.edicts,
        &modifiers,
        config,
    );
    phase = advance(phase, cycle);

    // Phase 3: era projection from pre-pressure values
    let inputs = EraInputs {
        cycle,
        city_size: next.city_size(),
        quests_completed: next.quests_completed,
        unrest: next.resources.get(Resource::Unrest),
        threat: next.resources.get(Resource::Threat),
        mana: next.resources.get(Resource::Mana),
        favor: next.resources.get(Resource::Favor),
    };
    let era = evaluate_era(&rules.eras, &inputs);

    if let Some(previous) = state.era.as_ref().filter(|prev| prev.era_id != era.era_id) {
        tracing::info!(
            "Cycle {}: era changed from {} to {}",
            cycle,
            previous.era_name,
            era.era_name
        );
        report.era_changed = Some((previous.era_id.clone(), era.era_id.clone()));
    }
    phase = advance(phase, cycle);

    // Phase 4: pressure, upkeep, flat adjustments
    let pressure = Pressure {
        unrest: round_cents(era.pressure.unrest),
        threat: round_cents(era.pressure.threat),
        mana_upkeep: round_cents(era.pressure.mana_upkeep),
    };
    next.resources.add(Resource::Mana, -pressure.mana_upkeep);
    next.resources.add(Resource::Unrest, pressure.unrest);
    next.resources.add(Resource::Threat, pressure.threat);
    report.pressure_applied = pressure;

    let rate = non_negative(config.base_grain_upkeep + modifiers.upkeep_delta);
    let upkeep = round_whole(f64::from(next.workers) * rate);
    next.resources.add(Resource::Grain, -upkeep);
    report.grain_upkeep = upkeep;

    for (&resource, &amount) in &modifiers.tick_adjustments {
        let amount = round_whole(amount);
        apply_delta(&mut next.resources, &mut next.workers, resource, amount);
        report.tick_adjustments.insert(resource, amount);
    }
    phase = advance(phase, cycle);

    // Phase 5: crisis
    let crisis = detect_crisis(&next.resources, config);
    if let Some(crisis) = &crisis {
        tracing::info!("Cycle {}: {} crisis - {}", cycle, crisis.kind, crisis.message);
        apply_crisis(&mut next.resources, crisis);
    }
    phase = advance(phase, cycle);

    // Phase 6: advance
    next.cycle = cycle + 1;
    next.max_cycle = next.max_cycle.max(next.cycle);
    next.milestones = Some(era.milestones());
    next.era = Some(era);
    report.passive_effects = passives;
    report.modifiers = modifiers;
    advance(phase, cycle);

    tracing::debug!(
        "Cycle {} done: {} buildings, {} coin from routes, grain upkeep {}",
        cycle,
        report.buildings.len(),
        report.routes.coin_income,
        report.grain_upkeep
    );

    TickOutcome {
        state: next,
        crisis,
        report,
    }
}
