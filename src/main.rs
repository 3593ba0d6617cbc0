//! Hearthhold - headless session runner
//!
//! Seeds a starter city, feeds it random pre-validated proposals and runs
//! the tick engine for a number of cycles. Independent sessions run in
//! parallel; each one is deterministic for its seed.

use std::path::PathBuf;

use clap::Parser;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use hearthhold::city::{BuildingInstance, Edicts, Resource, Route};
use hearthhold::core::error::{HearthError, Result};
use hearthhold::rules::{load_rules, Rules};
use hearthhold::simulation::{process_tick, CrisisKind, GameState, Proposal};

/// Run headless city sessions and report how they ended
#[derive(Parser, Debug)]
#[command(name = "hearthhold")]
#[command(about = "Run the city economy engine headless")]
struct Args {
    /// Cycles to simulate per session
    #[arg(long, default_value_t = 50)]
    ticks: u64,

    /// Founding charter id (see data/charters.toml)
    #[arg(long)]
    charter: Option<String>,

    /// Directory holding buildings/charters/eras/engine TOML files
    #[arg(long, default_value = "data")]
    data: PathBuf,

    /// Base random seed; session i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Number of independent sessions
    #[arg(long, default_value_t = 1)]
    sessions: u64,

    /// Print final states as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct SessionResult {
    seed: u64,
    crises: usize,
    unrest_crises: usize,
    threat_crises: usize,
    era_changes: Vec<(u64, String, String)>,
    state: GameState,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hearthhold=info")),
        )
        .init();

    let args = Args::parse();
    let rules = load_rules(&args.data)?;

    if let Some(charter) = &args.charter {
        if rules.charters.get(charter).is_none() {
            return Err(HearthError::UnknownCharter(charter.clone()));
        }
    }

    let base_seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(
        "Running {} session(s) of {} cycles, base seed {}",
        args.sessions,
        args.ticks,
        base_seed
    );

    let results: Vec<SessionResult> = (0..args.sessions)
        .into_par_iter()
        .map(|i| {
            let seed = base_seed.wrapping_add(i);
            run_session(&rules, args.charter.as_deref(), args.ticks, seed)
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_summary(result);
        }
    }

    Ok(())
}

/// A small working village: food, timber, a market and a storehouse
fn starter_city(charter: Option<&str>) -> GameState {
    let mut state = GameState::new()
        .with_workers(12)
        .with_resource(Resource::Grain, 40.0)
        .with_resource(Resource::Coin, 20.0)
        .with_resource(Resource::Wood, 10.0)
        .with_resource(Resource::Mana, 20.0)
        .with_resource(Resource::Favor, 5.0)
        .with_building(
            BuildingInstance::new(1, "farm")
                .with_workers(2)
                .with_trait("river", 2.0)
                .at(0, 0),
        )
        .with_building(
            BuildingInstance::new(2, "lumber_camp")
                .with_workers(2)
                .with_trait("forest", 3.0)
                .at(6, 1),
        )
        .with_building(BuildingInstance::new(3, "sawmill").with_workers(2).at(4, 2))
        .with_building(BuildingInstance::new(4, "house").at(2, 5))
        .with_building(BuildingInstance::new(5, "market").with_workers(1).at(8, 6))
        .with_building(BuildingInstance::new(6, "shrine").with_workers(1).at(3, 8))
        .with_building(BuildingInstance::new(7, "storehouse").at(2, 2))
        .with_route(Route::new(7, 1))
        .with_route(Route::new(7, 2))
        .with_route(Route::new(5, 4));
    state.edicts = Edicts {
        tariffs: 20.0,
        patrols: false,
    };
    if let Some(charter) = charter {
        state = state.with_charter(charter);
    }
    state
}

/// Canned player actions, already checked for affordability by the caller
fn random_proposals(rng: &mut ChaCha8Rng, state: &GameState) -> Vec<Proposal> {
    let menu = [
        Proposal::new("festival")
            .with_delta(Resource::Grain, -6.0)
            .with_delta(Resource::Unrest, -4.0)
            .with_delta(Resource::Favor, 1.0),
        Proposal::new("hire_hands")
            .with_delta(Resource::Coin, -5.0)
            .with_delta(Resource::Workers, 2.0),
        Proposal::new("buy_timber")
            .with_delta(Resource::Coin, -4.0)
            .with_delta(Resource::Wood, 6.0),
        Proposal::new("arm_the_watch")
            .with_delta(Resource::Coin, -6.0)
            .with_delta(Resource::Threat, -5.0),
        Proposal::new("offering")
            .with_delta(Resource::Grain, -3.0)
            .with_delta(Resource::Favor, 2.0)
            .with_delta(Resource::Mana, 1.0),
    ];

    let count = rng.gen_range(0..=2);
    menu.choose_multiple(rng, count)
        .filter(|p| {
            p.delta.iter().all(|(&res, &amount)| {
                amount >= 0.0 || !affects_stock(res) || state.resources.get(res) >= -amount
            })
        })
        .cloned()
        .collect()
}

/// Costs in these resources must be affordable
fn affects_stock(resource: Resource) -> bool {
    !matches!(resource, Resource::Unrest | Resource::Threat)
}

fn run_session(rules: &Rules, charter: Option<&str>, ticks: u64, seed: u64) -> SessionResult {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = starter_city(charter);
    let mut result = SessionResult {
        seed,
        crises: 0,
        unrest_crises: 0,
        threat_crises: 0,
        era_changes: Vec::new(),
        state: GameState::new(),
    };

    for _ in 0..ticks {
        let skills = rules.skills.effects_for(&state.skills);
        let proposals = random_proposals(&mut rng, &state);
        let outcome = process_tick(&state, &proposals, rules, &skills);

        if let Some(crisis) = &outcome.crisis {
            result.crises += 1;
            match crisis.kind {
                CrisisKind::Unrest => result.unrest_crises += 1,
                CrisisKind::Threat => result.threat_crises += 1,
            }
        }
        if let Some((from, to)) = outcome.report.era_changed {
            result.era_changes.push((outcome.state.cycle, from, to));
        }

        state = outcome.state;
        grow_city(&mut rng, &mut state);
    }

    result.state = state;
    result
}

/// Outside the engine: quests finish and new buildings go up now and then
fn grow_city(rng: &mut ChaCha8Rng, state: &mut GameState) {
    if rng.gen_bool(0.1) {
        state.quests_completed += 1;
    }
    if rng.gen_bool(0.15) && state.resources.get(Resource::Planks) >= 4.0 {
        let kinds = ["farm", "house", "market", "watchtower", "lumber_camp"];
        let Some(kind) = kinds.choose(rng) else {
            return;
        };
        let id = state.next_building_id();
        let x = rng.gen_range(0..16);
        let y = rng.gen_range(0..16);
        state.resources.add(Resource::Planks, -4.0);
        state
            .buildings
            .push(BuildingInstance::new(id, *kind).with_workers(2).at(x, y));
        tracing::debug!("Cycle {}: built {} #{}", state.cycle, kind, id);
    }
}

fn print_summary(result: &SessionResult) {
    let state = &result.state;
    println!("=== Session seed {} ===", result.seed);
    println!(
        "Cycle {} | {} buildings | {} quests | {} free workers",
        state.cycle,
        state.buildings.len(),
        state.quests_completed,
        state.workers
    );
    if let Some(era) = &state.era {
        println!(
            "Era: {} ({:.0}% to next, stability {:.1})",
            era.era_name,
            era.progress_to_next_era * 100.0,
            era.metrics.stability
        );
        if let Some(ascension) = &era.ascension {
            println!(
                "Ascension: {} ({:.0}%)",
                if ascension.ready { "ready" } else { "not ready" },
                ascension.progress * 100.0
            );
        }
    }
    let ledger: Vec<String> = state
        .resources
        .iter()
        .map(|(res, amount)| format!("{}={}", res, amount))
        .collect();
    println!("Ledger: {}", ledger.join(" "));
    println!(
        "Crises: {} (unrest {}, threat {})",
        result.crises, result.unrest_crises, result.threat_crises
    );
    for (cycle, from, to) in &result.era_changes {
        println!("  cycle {}: {} -> {}", cycle, from, to);
    }
    println!();
}
