//! Era evaluation - a pure projection of the city's standing
//!
//! Nothing here is stored as authoritative state; the status is recomputed
//! from the same inputs every cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{non_negative, Tick};
use crate::era::definitions::{EraMetric, EraTable, Pressure};

/// Everything the era engine looks at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EraInputs {
    pub cycle: Tick,
    pub city_size: u32,
    pub quests_completed: u32,
    pub unrest: f64,
    pub threat: f64,
    pub mana: f64,
    pub favor: f64,
}

/// Derived metrics the era thresholds are compared against
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EraMetrics {
    pub city_size: f64,
    pub quests_completed: f64,
    pub stability: f64,
    pub unrest: f64,
    pub threat: f64,
    pub mana: f64,
    pub favor: f64,
}

impl EraMetrics {
    pub fn from_inputs(inputs: &EraInputs) -> Self {
        let unrest = non_negative(inputs.unrest);
        let threat = non_negative(inputs.threat);
        Self {
            city_size: f64::from(inputs.city_size),
            quests_completed: f64::from(inputs.quests_completed),
            stability: stability(unrest, threat),
            unrest,
            threat,
            mana: non_negative(inputs.mana),
            favor: non_negative(inputs.favor),
        }
    }

    pub fn get(&self, metric: EraMetric) -> f64 {
        match metric {
            EraMetric::CitySize => self.city_size,
            EraMetric::Quests => self.quests_completed,
            EraMetric::Stability => self.stability,
            EraMetric::Mana => self.mana,
            EraMetric::Favor => self.favor,
        }
    }
}

/// `100 - 0.6 * unrest - 0.4 * threat`, each input capped at 100
pub fn stability(unrest: f64, threat: f64) -> f64 {
    let unrest = unrest.clamp(0.0, 100.0);
    let threat = threat.clamp(0.0, 100.0);
    (100.0 - 0.6 * unrest - 0.4 * threat).clamp(0.0, 100.0)
}

/// Fraction of a threshold reached; a non-positive threshold counts as met
fn threshold_ratio(value: f64, threshold: f64) -> f64 {
    if !threshold.is_finite() || threshold <= 0.0 {
        1.0
    } else {
        value / threshold
    }
}

/// Weakest ratio across all gates; no gates counts as met
fn gate_ratio(requires: &BTreeMap<EraMetric, f64>, metrics: &EraMetrics) -> f64 {
    requires
        .iter()
        .map(|(metric, threshold)| threshold_ratio(metrics.get(*metric), *threshold))
        .reduce(f64::min)
        .unwrap_or(1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationStatus {
    pub id: String,
    pub name: String,
    /// Weakest gate ratio, capped to 0..=1 for display
    pub progress: f64,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalStatus {
    pub id: String,
    pub metric: EraMetric,
    pub target: f64,
    pub value: f64,
    /// `value / target`, clamped to 0..=2
    pub progress: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextEraPreview {
    pub id: String,
    pub name: String,
    pub min_city_size: u32,
    pub min_quests_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AscensionStatus {
    pub progress: f64,
    pub ready: bool,
}

/// Full era projection for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraStatus {
    pub cycle: Tick,
    pub era_id: String,
    pub era_name: String,
    pub era_index: usize,
    pub metrics: EraMetrics,
    /// Era pressure after growth scaling, before mitigations
    pub base_pressure: Pressure,
    pub mitigation_offset: Pressure,
    /// Pressure to apply this cycle, floored at zero per axis
    pub pressure: Pressure,
    pub mitigations: Vec<MitigationStatus>,
    pub goals: Vec<GoalStatus>,
    pub goal_progress: f64,
    pub next_era: Option<NextEraPreview>,
    pub progress_to_next_era: f64,
    pub ascension: Option<AscensionStatus>,
}

/// Goal snapshot carried on the game state between cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    pub era_id: String,
    pub goals: Vec<GoalStatus>,
    pub goal_progress: f64,
    pub progress_to_next_era: f64,
}

impl EraStatus {
    pub fn milestones(&self) -> Milestones {
        Milestones {
            era_id: self.era_id.clone(),
            goals: self.goals.clone(),
            goal_progress: self.goal_progress,
            progress_to_next_era: self.progress_to_next_era,
        }
    }
}

/// Evaluate the city's era, pressures, mitigations and goals
pub fn evaluate_era(table: &EraTable, inputs: &EraInputs) -> EraStatus {
    let metrics = EraMetrics::from_inputs(inputs);
    let city_size = inputs.city_size;
    let quests = inputs.quests_completed;

    let (era_index, era) = table.current(city_size, quests);

    // Pressure
    let base_pressure = era.scaled_pressure(city_size, quests);

    let mitigations: Vec<MitigationStatus> = era
        .mitigations
        .iter()
        .map(|m| {
            let ratio = gate_ratio(&m.requires, &metrics);
            MitigationStatus {
                id: m.id.clone(),
                name: m.name.clone(),
                progress: ratio.clamp(0.0, 1.0),
                unlocked: ratio >= 1.0,
            }
        })
        .collect();

    let mitigation_offset = era
        .mitigations
        .iter()
        .zip(&mitigations)
        .filter(|(_, status)| status.unlocked)
        .fold(Pressure::default(), |acc, (m, _)| acc + m.effect);

    let pressure = (base_pressure + mitigation_offset).floored();

    // Goals
    let goals: Vec<GoalStatus> = era
        .goals
        .iter()
        .map(|g| {
            let value = metrics.get(g.metric);
            let progress = threshold_ratio(value, g.target).clamp(0.0, 2.0);
            GoalStatus {
                id: g.id.clone(),
                metric: g.metric,
                target: g.target,
                value,
                progress,
                completed: progress >= 1.0,
            }
        })
        .collect();

    let goal_progress = if goals.is_empty() {
        1.0
    } else {
        goals.iter().map(|g| g.progress).sum::<f64>() / goals.len() as f64
    };

    // Next era or ascension
    let (next_era, progress_to_next_era, ascension) = match table.get(era_index + 1) {
        Some(next) => {
            let size_ratio = threshold_ratio(metrics.city_size, f64::from(next.min_city_size));
            let quest_ratio =
                threshold_ratio(metrics.quests_completed, f64::from(next.min_quests_completed));
            let preview = NextEraPreview {
                id: next.id.clone(),
                name: next.name.clone(),
                min_city_size: next.min_city_size,
                min_quests_completed: next.min_quests_completed,
            };
            (
                Some(preview),
                ((size_ratio + quest_ratio) / 2.0).clamp(0.0, 1.0),
                None,
            )
        }
        None => {
            let ascension = era.ascension.as_ref().map(|cond| {
                let ratio = gate_ratio(&cond.requires, &metrics);
                AscensionStatus {
                    progress: ratio.clamp(0.0, 1.0),
                    ready: ratio >= 1.0,
                }
            });
            (None, 1.0, ascension)
        }
    };

    EraStatus {
        cycle: inputs.cycle,
        era_id: era.id.clone(),
        era_name: era.name.clone(),
        era_index,
        metrics,
        base_pressure,
        mitigation_offset,
        pressure,
        mitigations,
        goals,
        goal_progress,
        next_era,
        progress_to_next_era,
        ascension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::era::definitions::{EraDefinition, Mitigation};

    fn inputs(city_size: u32, quests: u32) -> EraInputs {
        EraInputs {
            cycle: 7,
            city_size,
            quests_completed: quests,
            ..EraInputs::default()
        }
    }

    #[test]
    fn test_stability_formula() {
        assert_eq!(stability(0.0, 0.0), 100.0);
        assert_eq!(stability(50.0, 25.0), 60.0);
        // Inputs are capped at 100 before weighting
        assert_eq!(stability(500.0, 500.0), 0.0);
        assert_eq!(stability(-10.0, 0.0), 100.0);
    }

    #[test]
    fn test_fresh_city_is_founding_era() {
        let table = EraTable::with_defaults();
        let status = evaluate_era(&table, &inputs(0, 0));

        assert_eq!(status.era_id, "founding");
        assert_eq!(status.era_index, 0);
        assert_eq!(status.cycle, 7);
        assert_eq!(status.pressure, Pressure::new(1.0, 0.5, 5.0));
        assert!(status.mitigations.iter().all(|m| !m.unlocked));
        assert_eq!(status.next_era.as_ref().map(|n| n.id.as_str()), Some("settlement"));
        assert_eq!(status.progress_to_next_era, 0.0);
        assert!(status.ascension.is_none());
    }

    #[test]
    fn test_mitigation_unlocks_at_full_ratio() {
        let table = EraTable::with_defaults();
        // watch_patrols: city_size 6, stability 60
        let mut i = inputs(6, 0);
        i.unrest = 20.0; // stability 88
        let status = evaluate_era(&table, &i);

        let patrols = status
            .mitigations
            .iter()
            .find(|m| m.id == "watch_patrols")
            .expect("mitigation listed");
        assert!(patrols.unlocked);
        assert_eq!(patrols.progress, 1.0);
        assert_eq!(status.mitigation_offset, Pressure::new(-0.5, 0.0, 0.0));

        // base 1.0 + 0.1 * (6 - 4) = 1.2, minus 0.5
        assert!((status.pressure.unrest - 0.7).abs() < 1e-9);

        let wards = status
            .mitigations
            .iter()
            .find(|m| m.id == "ward_stones")
            .expect("mitigation listed");
        assert!(!wards.unlocked);
        assert_eq!(wards.progress, 0.0);
    }

    #[test]
    fn test_pressure_floored_at_zero() {
        let mut era = EraTable::with_defaults().get(0).cloned().expect("era");
        era.mitigations = vec![Mitigation {
            id: "miracle".into(),
            name: "Miracle".into(),
            requires: BTreeMap::new(),
            effect: Pressure::new(-10.0, -10.0, -10.0),
        }];
        let table = EraTable::from_eras(vec![era]).expect("table");
        let status = evaluate_era(&table, &inputs(0, 0));

        assert!(status.mitigations[0].unlocked, "no gates means unlocked");
        assert_eq!(status.pressure, Pressure::default());
    }

    #[test]
    fn test_goal_progress_clamped_and_averaged() {
        let table = EraTable::with_defaults();
        // first_streets 8 -> 16/8 = 2 (clamped); first_deeds 2 -> 1/2; stability 100/60 -> 1.67
        let status = evaluate_era(&table, &inputs(16, 1));

        assert_eq!(status.era_id, "founding");
        let streets = &status.goals[0];
        assert_eq!(streets.progress, 2.0);
        assert!(streets.completed);
        let deeds = &status.goals[1];
        assert_eq!(deeds.progress, 0.5);
        assert!(!deeds.completed);

        let expected = (2.0 + 0.5 + 100.0 / 60.0) / 3.0;
        assert!((status.goal_progress - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_goals_means_full_progress() {
        let mut era = EraTable::with_defaults().get(0).cloned().expect("era");
        era.goals.clear();
        let table = EraTable::from_eras(vec![era]).expect("table");
        assert_eq!(evaluate_era(&table, &inputs(3, 0)).goal_progress, 1.0);
    }

    #[test]
    fn test_progress_to_next_era() {
        let table = EraTable::with_defaults();
        // settlement needs 8 buildings, 2 quests
        let status = evaluate_era(&table, &inputs(4, 1));
        assert!((status.progress_to_next_era - 0.5).abs() < 1e-12);

        // Raw ratios are averaged, then clamped
        let status = evaluate_era(&table, &inputs(7, 10));
        assert_eq!(status.era_id, "founding");
        assert_eq!(status.progress_to_next_era, 1.0);
    }

    #[test]
    fn test_final_era_exposes_ascension() {
        let table = EraTable::with_defaults();
        let mut i = inputs(60, 25);
        i.mana = 250.0;
        i.favor = 600.0;
        let status = evaluate_era(&table, &i);

        assert_eq!(status.era_id, "ascendancy");
        assert!(status.next_era.is_none());
        assert_eq!(status.progress_to_next_era, 1.0);
        let ascension = status.ascension.expect("final era has ascension");
        // mana 250 / 500 is the weakest gate
        assert_eq!(ascension.progress, 0.5);
        assert!(!ascension.ready);

        i.mana = 500.0;
        let ascension = evaluate_era(&table, &i).ascension.expect("ascension");
        assert!(ascension.ready);
    }

    #[test]
    fn test_final_era_without_ascension() {
        let era = EraDefinition {
            ascension: None,
            ..EraTable::with_defaults().get(0).cloned().expect("era")
        };
        let table = EraTable::from_eras(vec![era]).expect("table");
        let status = evaluate_era(&table, &inputs(0, 0));
        assert!(status.ascension.is_none());
        assert_eq!(status.progress_to_next_era, 1.0);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let table = EraTable::with_defaults();
        let mut i = inputs(13, 4);
        i.unrest = 33.3;
        i.threat = 12.0;
        i.mana = 140.0;
        i.favor = 25.0;
        assert_eq!(evaluate_era(&table, &i), evaluate_era(&table, &i));
    }

    #[test]
    fn test_milestones_mirror_status() {
        let table = EraTable::with_defaults();
        let status = evaluate_era(&table, &inputs(9, 3));
        let milestones = status.milestones();
        assert_eq!(milestones.era_id, status.era_id);
        assert_eq!(milestones.goals, status.goals);
        assert_eq!(milestones.goal_progress, status.goal_progress);
        assert_eq!(milestones.progress_to_next_era, status.progress_to_next_era);
    }
}
