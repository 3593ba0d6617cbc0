//! Property tests for the tick engine invariants

use proptest::prelude::*;

use hearthhold::city::{BuildingInstance, Edicts, Resource, Route};
use hearthhold::era::{evaluate_era, EraInputs, EraTable};
use hearthhold::modifiers::SkillEffects;
use hearthhold::rules::Rules;
use hearthhold::simulation::{process_tick, GameState, Proposal};

const KINDS: [&str; 13] = [
    "farm",
    "lumber_camp",
    "sawmill",
    "house",
    "market",
    "shrine",
    "mage_tower",
    "watchtower",
    "storehouse",
    "sun_temple",
    "arcane_spire",
    "guild_hall",
    "ruined_tower",
];

const CHARTERS: [&str; 6] = [
    "fertile_valley",
    "architects_legacy",
    "arcane_covenant",
    "merchant_league",
    "frugal_hearth",
    "lost_charter",
];

fn resource() -> impl Strategy<Value = Resource> {
    prop::sample::select(Resource::ALL.to_vec())
}

fn building() -> impl Strategy<Value = (usize, u32, u32, Option<f64>, i32, i32)> {
    (
        0..KINDS.len(),
        1u32..4,
        0u32..6,
        prop::option::of(-10.0..120.0f64),
        0i32..12,
        0i32..12,
    )
}

fn proposal() -> impl Strategy<Value = Proposal> {
    prop::collection::vec((resource(), -50.0..50.0f64), 0..4).prop_map(|deltas| {
        deltas
            .into_iter()
            .fold(Proposal::new("random"), |p, (res, amount)| p.with_delta(res, amount))
    })
}

prop_compose! {
    fn game_state()(
        amounts in prop::collection::vec((resource(), 0.0..150.0f64), 0..10),
        workers in 0u32..40,
        buildings in prop::collection::vec(building(), 0..12),
        route_pairs in prop::collection::vec((1u64..14, 1u64..14), 0..6),
        charter in prop::option::of(0..CHARTERS.len()),
        quests in 0u32..25,
        tariffs in 0.0..100.0f64,
        patrols in any::<bool>(),
    ) -> GameState {
        let mut state = GameState::new().with_workers(workers);
        for (res, amount) in amounts {
            state = state.with_resource(res, amount);
        }
        for (i, (kind, level, staff, condition, x, y)) in buildings.into_iter().enumerate() {
            let mut b = BuildingInstance::new(i as u64 + 1, KINDS[kind])
                .with_level(level)
                .with_workers(staff)
                .with_trait("river", 1.0)
                .at(x, y);
            if let Some(c) = condition {
                b = b.with_condition(c);
            }
            state = state.with_building(b);
        }
        for (from, to) in route_pairs {
            state = state.with_route(Route::new(from, to));
        }
        if let Some(c) = charter {
            state = state.with_charter(CHARTERS[c]);
        }
        state.quests_completed = quests;
        state.edicts = Edicts { tariffs, patrols };
        state
    }
}

proptest! {
    #[test]
    fn prop_ledger_never_negative(
        state in game_state(),
        proposals in prop::collection::vec(proposal(), 0..4),
    ) {
        let rules = Rules::with_defaults();
        let outcome = process_tick(&state, &proposals, &rules, &SkillEffects::default());

        prop_assert!(outcome.state.resources.is_well_formed());
        for (_, amount) in outcome.state.resources.iter() {
            prop_assert!(amount >= 0.0);
        }
    }

    #[test]
    fn prop_tick_is_deterministic(
        state in game_state(),
        proposals in prop::collection::vec(proposal(), 0..3),
    ) {
        let rules = Rules::with_defaults();
        let skills = rules
            .skills
            .effects_for(&["crop_rotation".to_string(), "joinery".to_string()]);

        let a = process_tick(&state, &proposals, &rules, &skills);
        let b = process_tick(&state, &proposals, &rules, &skills);

        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn prop_cycle_advances_by_one(state in game_state(), ticks in 1usize..8) {
        let rules = Rules::with_defaults();
        let skills = SkillEffects::default();
        let mut current = state;

        for _ in 0..ticks {
            let next = process_tick(&current, &[], &rules, &skills).state;
            prop_assert_eq!(next.cycle, current.cycle + 1);
            prop_assert!(next.max_cycle >= current.max_cycle);
            prop_assert!(next.max_cycle >= next.cycle);
            current = next;
        }
    }

    #[test]
    fn prop_era_progress_in_unit_range(
        city_size in 0u32..80,
        quests_completed in 0u32..40,
        unrest in 0.0..200.0f64,
        threat in 0.0..200.0f64,
        mana in 0.0..1000.0f64,
        favor in 0.0..500.0f64,
    ) {
        let table = EraTable::with_defaults();
        let inputs = EraInputs {
            cycle: 0,
            city_size,
            quests_completed,
            unrest,
            threat,
            mana,
            favor,
        };
        let status = evaluate_era(&table, &inputs);

        prop_assert!((0.0..=1.0).contains(&status.progress_to_next_era));
        prop_assert!((0.0..=2.0).contains(&status.goal_progress));
        if status.next_era.is_none() {
            prop_assert_eq!(status.progress_to_next_era, 1.0);
        }
        prop_assert!(status.pressure.unrest >= 0.0);
        prop_assert!(status.pressure.threat >= 0.0);
        prop_assert!(status.pressure.mana_upkeep >= 0.0);
    }
}
