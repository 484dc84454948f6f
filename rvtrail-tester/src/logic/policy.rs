use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rvtrail_game::{Action, GameState, RulesConfig};
use serde::{Deserialize, Serialize};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub action: Action,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(action: Action, rationale: Option<String>) -> Self {
        Self { action, rationale }
    }
}

/// Which upgrade a policy wants to buy before its next turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeTarget {
    Vehicle,
    Weapon,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Choose the action for the coming day.
    fn pick_action(&mut self, state: &GameState, rules: &RulesConfig) -> PolicyDecision;

    /// Optionally spend materials before acting.
    fn pick_upgrade(&mut self, _state: &GameState, _rules: &RulesConfig) -> Option<UpgradeTarget> {
        None
    }
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameplayStrategy {
    Cautious,
    Sprinter,
    Balanced,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Sprinter, Self::Balanced, Self::Random];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Sprinter => "Sprinter",
            Self::Balanced => "Balanced",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Sprinter => Box::new(SprinterPolicy),
            Self::Balanced => Box::new(BalancedPolicy::default()),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(&lowered))
            .ok_or_else(|| format!("unknown strategy '{s}'"))
    }
}

struct CautiousPolicy;
struct SprinterPolicy;

/// Scores every action by need; alternates upgrade targets.
#[derive(Default)]
struct BalancedPolicy {
    upgrades: u32,
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_action(&mut self, state: &GameState, _rules: &RulesConfig) -> PolicyDecision {
        let stats = state.stats;
        let inv = state.inventory;
        let lowest = stats.health.min(stats.hunger).min(stats.thirst);
        if lowest < 50 && (inv.food > 0 || inv.water > 0 || stats.health < 50) {
            return PolicyDecision::new(Action::Rest, Some(format!("lowest stat {lowest}")));
        }
        if inv.food < 2 || inv.water < 2 {
            return PolicyDecision::new(Action::Scavenge, Some("restocking".to_string()));
        }
        if stats.sanity < 40 {
            return PolicyDecision::new(Action::Radio, Some(format!("sanity {}", stats.sanity)));
        }
        PolicyDecision::new(Action::Advance, None)
    }
}

impl PlayerPolicy for SprinterPolicy {
    fn name(&self) -> &'static str {
        "Sprinter"
    }

    fn pick_action(&mut self, state: &GameState, _rules: &RulesConfig) -> PolicyDecision {
        let stats = state.stats;
        if stats.thirst < 20 || stats.hunger < 20 || stats.health < 20 {
            return PolicyDecision::new(Action::Rest, Some("about to collapse".to_string()));
        }
        if stats.sanity < 15 {
            return PolicyDecision::new(Action::Radio, Some("about to snap".to_string()));
        }
        PolicyDecision::new(Action::Advance, None)
    }

    fn pick_upgrade(&mut self, state: &GameState, rules: &RulesConfig) -> Option<UpgradeTarget> {
        (state.materials >= rules.upgrades.vehicle_cost).then_some(UpgradeTarget::Vehicle)
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_action(&mut self, state: &GameState, rules: &RulesConfig) -> PolicyDecision {
        let (action, score) = Action::ALL
            .into_iter()
            .map(|action| (action, balanced_score(state, rules, action)))
            .max_by_key(|(_, score)| *score)
            .unwrap_or((Action::Advance, 0));
        PolicyDecision::new(action, Some(format!("score {score}")))
    }

    fn pick_upgrade(&mut self, state: &GameState, rules: &RulesConfig) -> Option<UpgradeTarget> {
        let cfg = &rules.upgrades;
        let target = if self.upgrades % 2 == 0 {
            UpgradeTarget::Vehicle
        } else {
            UpgradeTarget::Weapon
        };
        let cost = match target {
            UpgradeTarget::Vehicle => cfg.vehicle_cost,
            UpgradeTarget::Weapon => cfg.weapon_cost,
        };
        // keep a reserve for the next upgrade
        if state.materials >= cost + 10 {
            self.upgrades += 1;
            Some(target)
        } else {
            None
        }
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_action(&mut self, _state: &GameState, _rules: &RulesConfig) -> PolicyDecision {
        let idx = self.rng.gen_range(0..Action::ALL.len());
        PolicyDecision::new(Action::ALL[idx], None)
    }

    fn pick_upgrade(&mut self, state: &GameState, rules: &RulesConfig) -> Option<UpgradeTarget> {
        if state.materials < rules.upgrades.weapon_cost || self.rng.r#gen::<f64>() < 0.7 {
            return None;
        }
        Some(if self.rng.gen_bool(0.5) {
            UpgradeTarget::Vehicle
        } else {
            UpgradeTarget::Weapon
        })
    }
}

fn deficiency(value: i32, floor: i32) -> i32 {
    floor.saturating_sub(value).max(0)
}

fn balanced_score(state: &GameState, rules: &RulesConfig, action: Action) -> i32 {
    let stats = state.stats;
    let inv = state.inventory;
    match action {
        Action::Advance => {
            let mut score = 40;
            score -= deficiency(stats.thirst, 35) * 3;
            score -= deficiency(stats.hunger, 35) * 2;
            score -= deficiency(stats.sanity, 25) * 2;
            score
        }
        Action::Rest => {
            let mut score = deficiency(stats.health, 60) * 2;
            if inv.water > 0 {
                score += deficiency(stats.thirst, 50) * 3;
            }
            if inv.food > 0 {
                score += deficiency(stats.hunger, 50) * 2;
            }
            score
        }
        Action::Scavenge => {
            if stats.health <= rules.scavenge.risk_max + 15 {
                return i32::MIN / 2;
            }
            let mut score = 10;
            score += deficiency(inv.water, 2) * 15;
            score += deficiency(inv.food, 2) * 12;
            score += deficiency(state.materials, rules.upgrades.vehicle_cost) / 3;
            score
        }
        Action::Radio => deficiency(stats.sanity, 45) * 3,
    }
}
