//! Rule tables driving the turn engine and upgrades.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{Inventory, RvStats, Stats};

const DEFAULT_RULES_DATA: &str = include_str!("../data/rules.json");

/// Errors raised when rule configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum RulesConfigError {
    #[error("rules could not be parsed: {0}")]
    Parse(String),
    #[error("{field} range is empty (min {min} >= max {max})")]
    EmptyRange {
        field: &'static str,
        min: i32,
        max: i32,
    },
    #[error("{field} must be between 0.00 and 1.00 (got {value:.2})")]
    Probability { field: &'static str, value: f64 },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: i64 },
}

/// Fixed decay applied at the start of every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepCfg {
    pub hunger: i32,
    pub thirst: i32,
    pub sanity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceCfg {
    pub base_distance: u32,
    pub power_multiplier: u32,
    pub sanity_cost: i32,
}

/// Scavenge rolls. Ranges are half-open: `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScavengeCfg {
    pub materials_min: i32,
    pub materials_max: i32,
    pub food_chance: f64,
    pub water_chance: f64,
    pub risk_max: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestCfg {
    pub health: i32,
    pub sanity: i32,
    pub hunger: i32,
    pub thirst: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioCfg {
    pub sanity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeCfg {
    pub chance: f64,
    #[serde(default = "NarrativeCfg::default_timeout_secs")]
    pub timeout_secs: u64,
    pub fallback_text: String,
    pub fallback_materials: i32,
}

impl NarrativeCfg {
    const fn default_timeout_secs() -> u64 {
        15
    }

    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeCfg {
    pub vehicle_cost: i32,
    pub vehicle_power: u32,
    pub vehicle_defense: u32,
    pub weapon_cost: i32,
    pub weapon_damage: u32,
}

/// Win threshold and ending selection thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryCfg {
    pub total_distance: u32,
    pub best_ending_samples: i32,
    pub hope_ending_sanity: i32,
}

/// Template every new run starts from, before city flavour is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCfg {
    pub stats: Stats,
    pub rv: RvStats,
    pub weapon_damage: u32,
    pub materials: i32,
    pub inventory: Inventory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    pub upkeep: UpkeepCfg,
    pub advance: AdvanceCfg,
    pub scavenge: ScavengeCfg,
    pub rest: RestCfg,
    pub radio: RadioCfg,
    pub narrative: NarrativeCfg,
    pub upgrades: UpgradeCfg,
    pub victory: VictoryCfg,
    pub start: StartCfg,
    #[serde(default = "RulesConfig::default_log_capacity")]
    pub log_capacity: usize,
}

impl RulesConfig {
    const fn default_log_capacity() -> usize {
        crate::constants::LOG_CAPACITY
    }

    /// Load the rules bundled with the crate, falling back to compiled defaults.
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_RULES_DATA).unwrap_or_default()
    }

    /// Parse and validate a rules document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a rule violates its bounds.
    pub fn from_json(json: &str) -> Result<Self, RulesConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| RulesConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        let scavenge = &self.scavenge;
        if scavenge.materials_min >= scavenge.materials_max {
            return Err(RulesConfigError::EmptyRange {
                field: "scavenge.materials",
                min: scavenge.materials_min,
                max: scavenge.materials_max,
            });
        }
        if scavenge.risk_max <= 0 {
            return Err(RulesConfigError::EmptyRange {
                field: "scavenge.risk",
                min: 0,
                max: scavenge.risk_max,
            });
        }
        check_probability("scavenge.food_chance", scavenge.food_chance)?;
        check_probability("scavenge.water_chance", scavenge.water_chance)?;
        check_probability("narrative.chance", self.narrative.chance)?;
        check_positive("narrative.timeout_secs", self.narrative.timeout_secs)?;
        check_positive("upgrades.vehicle_cost", self.upgrades.vehicle_cost)?;
        check_positive("upgrades.weapon_cost", self.upgrades.weapon_cost)?;
        check_positive("victory.total_distance", self.victory.total_distance)?;
        check_positive("log_capacity", self.log_capacity)?;
        Ok(())
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), RulesConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RulesConfigError::Probability { field, value })
    }
}

fn check_positive<T>(field: &'static str, value: T) -> Result<(), RulesConfigError>
where
    T: TryInto<i64> + Copy,
{
    let value = value.try_into().unwrap_or(i64::MAX);
    if value > 0 {
        Ok(())
    } else {
        Err(RulesConfigError::NonPositive { field, value })
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            upkeep: UpkeepCfg {
                hunger: 5,
                thirst: 8,
                sanity: 2,
            },
            advance: AdvanceCfg {
                base_distance: 50,
                power_multiplier: 2,
                sanity_cost: 5,
            },
            scavenge: ScavengeCfg {
                materials_min: 5,
                materials_max: 20,
                food_chance: 0.4,
                water_chance: 0.4,
                risk_max: 10,
            },
            rest: RestCfg {
                health: 20,
                sanity: 15,
                hunger: 30,
                thirst: 40,
            },
            radio: RadioCfg { sanity: 25 },
            narrative: NarrativeCfg {
                chance: 0.5,
                timeout_secs: NarrativeCfg::default_timeout_secs(),
                fallback_text: crate::constants::NARRATIVE_FALLBACK_TEXT.to_string(),
                fallback_materials: 5,
            },
            upgrades: UpgradeCfg {
                vehicle_cost: 30,
                vehicle_power: 5,
                vehicle_defense: 5,
                weapon_cost: 20,
                weapon_damage: 10,
            },
            victory: VictoryCfg {
                total_distance: crate::constants::SURVIVAL_TARGET,
                best_ending_samples: 3,
                hope_ending_sanity: 80,
            },
            start: StartCfg {
                stats: Stats::full(),
                rv: RvStats {
                    level: 1,
                    power: 10,
                    defense: 10,
                    storage: 20,
                    medical: false,
                    water_purifier: false,
                },
                weapon_damage: 15,
                materials: 20,
                inventory: Inventory {
                    food: 5,
                    water: 5,
                    meds: 2,
                    samples: 0,
                },
            },
            log_capacity: Self::default_log_capacity(),
        }
    }
}
