//! Era definitions - thresholds, pressures, mitigations and goals per era

use std::collections::BTreeMap;
use std::path::Path;

use derive_more::Add;
use serde::{Deserialize, Serialize};

use crate::core::error::{HearthError, Result};

/// Metric an era threshold, mitigation gate or goal can track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraMetric {
    CitySize,
    Quests,
    Stability,
    Mana,
    Favor,
}

/// Per-cycle pressure on the three era axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Add)]
#[serde(default)]
pub struct Pressure {
    pub unrest: f64,
    pub threat: f64,
    pub mana_upkeep: f64,
}

impl Pressure {
    pub fn new(unrest: f64, threat: f64, mana_upkeep: f64) -> Self {
        Self {
            unrest,
            threat,
            mana_upkeep,
        }
    }

    /// Scale every axis by the same factor
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(
            self.unrest * factor,
            self.threat * factor,
            self.mana_upkeep * factor,
        )
    }

    /// Floor every axis at zero
    pub fn floored(self) -> Self {
        Self::new(
            self.unrest.max(0.0),
            self.threat.max(0.0),
            self.mana_upkeep.max(0.0),
        )
    }
}

/// Pressure relief unlocked once every gate is met
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mitigation {
    pub id: String,
    pub name: String,
    /// Metric thresholds; all must be reached
    #[serde(default)]
    pub requires: BTreeMap<EraMetric, f64>,
    /// Added to the scaled pressure, usually negative
    pub effect: Pressure,
}

/// A target shown to the player for the current era
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraGoal {
    pub id: String,
    pub metric: EraMetric,
    pub target: f64,
}

/// Condition for ascending out of the final era
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AscensionCondition {
    pub requires: BTreeMap<EraMetric, f64>,
}

/// One civilization era
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub min_city_size: u32,
    #[serde(default)]
    pub min_quests_completed: u32,
    /// Pressure before any scaling
    pub base_pressure: Pressure,
    /// City size past which `per_city_size` starts to apply
    #[serde(default)]
    pub city_size_start: u32,
    /// Quest count past which `per_quest` starts to apply
    #[serde(default)]
    pub quest_start: u32,
    #[serde(default)]
    pub per_city_size: Pressure,
    #[serde(default)]
    pub per_quest: Pressure,
    #[serde(default)]
    pub mitigations: Vec<Mitigation>,
    #[serde(default)]
    pub goals: Vec<EraGoal>,
    #[serde(default)]
    pub ascension: Option<AscensionCondition>,
}

impl EraDefinition {
    /// Whether a city of this size and quest count qualifies for the era
    pub fn is_reached(&self, city_size: u32, quests: u32) -> bool {
        city_size >= self.min_city_size && quests >= self.min_quests_completed
    }

    /// Base pressure scaled by growth past the era's start thresholds
    pub fn scaled_pressure(&self, city_size: u32, quests: u32) -> Pressure {
        let size_past = f64::from(city_size.saturating_sub(self.city_size_start));
        let quests_past = f64::from(quests.saturating_sub(self.quest_start));
        self.base_pressure + self.per_city_size.scaled(size_past) + self.per_quest.scaled(quests_past)
    }
}

/// Ordered list of eras, least advanced first. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct EraTable {
    eras: Vec<EraDefinition>,
}

fn gates(pairs: &[(EraMetric, f64)]) -> BTreeMap<EraMetric, f64> {
    pairs.iter().copied().collect()
}

fn mitigation(id: &str, name: &str, requires: &[(EraMetric, f64)], effect: Pressure) -> Mitigation {
    Mitigation {
        id: id.into(),
        name: name.into(),
        requires: gates(requires),
        effect,
    }
}

fn goal(id: &str, metric: EraMetric, target: f64) -> EraGoal {
    EraGoal {
        id: id.into(),
        metric,
        target,
    }
}

impl EraTable {
    /// Build a table from an ordered list of eras
    pub fn from_eras(eras: Vec<EraDefinition>) -> Result<Self> {
        if eras.is_empty() {
            return Err(HearthError::InvalidConfig("era table is empty".into()));
        }
        for (i, era) in eras.iter().enumerate() {
            if eras[..i].iter().any(|e| e.id == era.id) {
                return Err(HearthError::DuplicateId {
                    kind: "era",
                    id: era.id.clone(),
                });
            }
        }
        Ok(Self { eras })
    }

    /// Default eras (mirrors data/eras.toml)
    pub fn with_defaults() -> Self {
        use EraMetric::*;

        let eras = vec![
            EraDefinition {
                id: "founding".into(),
                name: "Age of Founding".into(),
                min_city_size: 0,
                min_quests_completed: 0,
                base_pressure: Pressure::new(1.0, 0.5, 5.0),
                city_size_start: 4,
                quest_start: 1,
                per_city_size: Pressure::new(0.1, 0.05, 0.2),
                per_quest: Pressure::new(0.05, 0.1, 0.1),
                mitigations: vec![
                    mitigation(
                        "watch_patrols",
                        "Watch Patrols",
                        &[(CitySize, 6.0), (Stability, 60.0)],
                        Pressure::new(-0.5, 0.0, 0.0),
                    ),
                    mitigation(
                        "ward_stones",
                        "Ward Stones",
                        &[(Mana, 80.0), (Quests, 2.0)],
                        Pressure::new(0.0, -0.25, -1.0),
                    ),
                ],
                goals: vec![
                    goal("first_streets", CitySize, 8.0),
                    goal("first_deeds", Quests, 2.0),
                    goal("steady_hearths", Stability, 60.0),
                ],
                ascension: None,
            },
            EraDefinition {
                id: "settlement".into(),
                name: "Age of Settlement".into(),
                min_city_size: 8,
                min_quests_completed: 2,
                base_pressure: Pressure::new(1.5, 1.0, 7.0),
                city_size_start: 10,
                quest_start: 3,
                per_city_size: Pressure::new(0.1, 0.08, 0.25),
                per_quest: Pressure::new(0.1, 0.1, 0.15),
                mitigations: vec![
                    mitigation(
                        "town_watch",
                        "Town Watch",
                        &[(CitySize, 12.0), (Stability, 55.0)],
                        Pressure::new(-0.75, 0.0, 0.0),
                    ),
                    mitigation(
                        "ley_anchor",
                        "Ley Anchor",
                        &[(Mana, 120.0), (Favor, 20.0)],
                        Pressure::new(0.0, 0.0, -2.0),
                    ),
                ],
                goals: vec![
                    goal("growing_town", CitySize, 16.0),
                    goal("renowned_deeds", Quests, 5.0),
                    goal("blessed_town", Favor, 30.0),
                ],
                ascension: None,
            },
            EraDefinition {
                id: "crowns".into(),
                name: "Age of Crowns".into(),
                min_city_size: 16,
                min_quests_completed: 5,
                base_pressure: Pressure::new(2.0, 1.5, 10.0),
                city_size_start: 20,
                quest_start: 6,
                per_city_size: Pressure::new(0.12, 0.1, 0.3),
                per_quest: Pressure::new(0.1, 0.15, 0.2),
                mitigations: vec![
                    mitigation(
                        "royal_courts",
                        "Royal Courts",
                        &[(Stability, 60.0), (Favor, 60.0)],
                        Pressure::new(-1.0, 0.0, 0.0),
                    ),
                    mitigation(
                        "bastion_wards",
                        "Bastion Wards",
                        &[(Mana, 200.0), (CitySize, 24.0)],
                        Pressure::new(0.0, -1.0, -2.0),
                    ),
                ],
                goals: vec![
                    goal("walled_city", CitySize, 28.0),
                    goal("heroic_deeds", Quests, 9.0),
                    goal("deep_reserves", Mana, 200.0),
                ],
                ascension: None,
            },
            EraDefinition {
                id: "arcana".into(),
                name: "Age of Arcana".into(),
                min_city_size: 28,
                min_quests_completed: 9,
                base_pressure: Pressure::new(2.5, 2.5, 14.0),
                city_size_start: 32,
                quest_start: 10,
                per_city_size: Pressure::new(0.15, 0.12, 0.35),
                per_quest: Pressure::new(0.12, 0.2, 0.25),
                mitigations: vec![
                    mitigation(
                        "archmage_council",
                        "Archmage Council",
                        &[(Mana, 300.0), (Quests, 12.0)],
                        Pressure::new(0.0, 0.0, -4.0),
                    ),
                    mitigation(
                        "grand_pact",
                        "Grand Pact",
                        &[(Favor, 120.0), (Stability, 65.0)],
                        Pressure::new(-1.0, -1.0, 0.0),
                    ),
                ],
                goals: vec![
                    goal("wellspring", Mana, 400.0),
                    goal("divine_favor", Favor, 150.0),
                    goal("calm_streets", Stability, 70.0),
                ],
                ascension: None,
            },
            EraDefinition {
                id: "ascendancy".into(),
                name: "Age of Ascendancy".into(),
                min_city_size: 40,
                min_quests_completed: 14,
                base_pressure: Pressure::new(3.0, 3.0, 18.0),
                city_size_start: 44,
                quest_start: 15,
                per_city_size: Pressure::new(0.2, 0.15, 0.4),
                per_quest: Pressure::new(0.15, 0.25, 0.3),
                mitigations: vec![mitigation(
                    "celestial_harmony",
                    "Celestial Harmony",
                    &[(Stability, 75.0), (Favor, 200.0)],
                    Pressure::new(-1.5, -1.5, -5.0),
                )],
                goals: vec![
                    goal("golden_peace", Stability, 80.0),
                    goal("chosen_city", Favor, 250.0),
                    goal("living_legend", Quests, 20.0),
                ],
                ascension: Some(AscensionCondition {
                    requires: gates(&[
                        (Stability, 80.0),
                        (Mana, 500.0),
                        (Favor, 300.0),
                        (Quests, 20.0),
                    ]),
                }),
            },
        ];

        Self { eras }
    }

    pub fn len(&self) -> usize {
        self.eras.len()
    }

    /// Always false; kept for the `len` convention
    pub fn is_empty(&self) -> bool {
        self.eras.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EraDefinition> {
        self.eras.get(index)
    }

    /// Index of the most advanced era whose thresholds are both met
    ///
    /// Falls back to the first era.
    pub fn classify(&self, city_size: u32, quests: u32) -> usize {
        self.eras
            .iter()
            .rposition(|era| era.is_reached(city_size, quests))
            .unwrap_or(0)
    }

    /// Classified era and its index
    pub fn current(&self, city_size: u32, quests: u32) -> (usize, &EraDefinition) {
        let index = self.classify(city_size, quests);
        (index, &self.eras[index])
    }

    /// Load eras from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse eras from TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let file: TomlEras = toml::from_str(content)?;
        Self::from_eras(file.eras)
    }
}

#[derive(Debug, Deserialize)]
struct TomlEras {
    #[serde(default)]
    eras: Vec<EraDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_picks_most_advanced_reached() {
        let table = EraTable::with_defaults();
        assert_eq!(table.classify(0, 0), 0);
        assert_eq!(table.classify(8, 2), 1);
        // Size alone is not enough
        assert_eq!(table.classify(50, 1), 0);
        assert_eq!(table.classify(20, 6), 2);
        assert_eq!(table.classify(100, 100), 4);
    }

    #[test]
    fn test_scaled_pressure_past_start() {
        let table = EraTable::with_defaults();
        let founding = table.get(0).expect("first era");

        assert_eq!(founding.scaled_pressure(0, 0), Pressure::new(1.0, 0.5, 5.0));
        assert_eq!(founding.scaled_pressure(4, 1), Pressure::new(1.0, 0.5, 5.0));

        // 6 buildings past start 4, 3 quests past start 1
        let p = founding.scaled_pressure(10, 4);
        assert!((p.unrest - (1.0 + 0.6 + 0.15)).abs() < 1e-9);
        assert!((p.threat - (0.5 + 0.3 + 0.3)).abs() < 1e-9);
        assert!((p.mana_upkeep - (5.0 + 1.2 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_floor() {
        let p = Pressure::new(1.0, -0.5, 2.0) + Pressure::new(-2.0, 0.0, -1.0);
        assert_eq!(p.floored(), Pressure::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(matches!(
            EraTable::from_eras(vec![]),
            Err(HearthError::InvalidConfig(_))
        ));
        assert!(EraTable::parse_toml("").is_err());
    }

    #[test]
    fn test_duplicate_era_rejected() {
        let era = EraTable::with_defaults().get(0).cloned().expect("first era");
        assert!(matches!(
            EraTable::from_eras(vec![era.clone(), era]),
            Err(HearthError::DuplicateId { kind: "era", .. })
        ));
    }

    #[test]
    fn test_era_toml_parsing() {
        let toml_content = r#"
[[eras]]
id = "dawn"
name = "Dawn"
base_pressure = { unrest = 1.0, threat = 0.0, mana_upkeep = 2.0 }

[[eras.mitigations]]
id = "lamps"
name = "Lamps"
requires = { stability = 50.0 }
effect = { unrest = -0.5 }

[[eras.goals]]
id = "grow"
metric = "city_size"
target = 5.0

[[eras]]
id = "dusk"
name = "Dusk"
min_city_size = 5
base_pressure = { unrest = 2.0, threat = 1.0, mana_upkeep = 3.0 }

[eras.ascension.requires]
favor = 10.0
"#;
        let table = EraTable::parse_toml(toml_content).expect("should parse");
        assert_eq!(table.len(), 2);

        let dawn = table.get(0).expect("dawn");
        assert_eq!(dawn.mitigations[0].effect, Pressure::new(-0.5, 0.0, 0.0));
        assert_eq!(dawn.mitigations[0].requires.get(&EraMetric::Stability), Some(&50.0));
        assert_eq!(dawn.goals[0].metric, EraMetric::CitySize);

        let dusk = table.get(1).expect("dusk");
        assert_eq!(dusk.min_city_size, 5);
        assert!(dusk.ascension.is_some());
        assert_eq!(table.classify(5, 0), 1);
    }

    #[test]
    fn test_load_eras_from_file() {
        let table = EraTable::load_from_toml(Path::new("data/eras.toml"))
            .expect("Should load data/eras.toml");
        assert_eq!(table, EraTable::with_defaults());
    }
}
