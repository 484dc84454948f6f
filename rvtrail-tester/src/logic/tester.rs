use anyhow::Result;
use colored::Colorize;
use rvtrail_game::{CityCatalog, CityKey, RulesConfig};

use crate::logic::narrators::NarratorSource;
use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::{SeedInfo, replay_code};
use crate::logic::simulation::{RunRecord, SimulationConfig, run_simulation};

/// Every combination to play, in a stable order.
#[must_use]
pub fn build_plan(
    cities: &[CityKey],
    seeds: &[SeedInfo],
    strategies: &[GameplayStrategy],
    iterations: usize,
    max_days: u32,
) -> Vec<SimulationConfig> {
    let mut plan = Vec::new();
    for seed_info in seeds {
        for city in seed_info.cities(cities) {
            for &strategy in strategies {
                for i in 0..iterations.max(1) {
                    let seed = seed_info
                        .seed
                        .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                    plan.push(
                        SimulationConfig::new(city, strategy, seed)
                            .with_max_days(max_days)
                            .with_iteration(i)
                            .with_run_code(replay_code(city, seed)),
                    );
                }
            }
        }
    }
    plan
}

/// Plays a plan against one rule set and narrator source.
pub struct BalanceTester {
    rules: RulesConfig,
    catalog: CityCatalog,
    narrators: NarratorSource,
    verbose: bool,
}

impl BalanceTester {
    #[must_use]
    pub fn new(
        rules: RulesConfig,
        catalog: CityCatalog,
        narrators: NarratorSource,
        verbose: bool,
    ) -> Self {
        Self {
            rules,
            catalog,
            narrators,
            verbose,
        }
    }

    pub async fn run_plan(&self, plan: &[SimulationConfig]) -> Result<Vec<RunRecord>> {
        let mut records = Vec::with_capacity(plan.len());
        for config in plan {
            let narrator = self.narrators.narrator_for(config.seed);
            let record = run_simulation(config, &self.rules, &self.catalog, narrator).await?;
            if self.verbose {
                let status = if !record.violations.is_empty() {
                    "❌".to_string()
                } else if record.is_victory() {
                    "🏁".green().to_string()
                } else {
                    "💀".to_string()
                };
                println!(
                    "{status} {} / {} seed {}: {} on day {} ({} km)",
                    config.city.to_string().bright_white(),
                    config.strategy,
                    config.seed,
                    record.outcome_label(),
                    record.days,
                    record.distance
                );
            }
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::narrators::NarratorKind;
    use crate::logic::seeds::resolve_seed_inputs;

    #[test]
    fn plan_fans_out_plain_seeds_only() {
        let seeds = resolve_seed_inputs(&["7".to_string(), "CQ-FERRY05".to_string()]).unwrap();
        let cities = [CityKey::Beijing, CityKey::Harbin];
        let strategies = [GameplayStrategy::Balanced, GameplayStrategy::Random];
        let plan = build_plan(&cities, &seeds, &strategies, 2, 50);

        // seed 7: 2 cities x 2 strategies x 2 iterations; run code: 1 x 2 x 2
        assert_eq!(plan.len(), 12);
        assert!(plan.iter().all(|c| c.max_days == 50));
        let coded: Vec<_> = plan.iter().filter(|c| c.city == CityKey::Chongqing).collect();
        assert_eq!(coded.len(), 4);
        assert_eq!(coded[0].run_code.as_deref(), Some("CQ-FERRY05"));
        assert_eq!(coded[1].seed, coded[0].seed + 1);
    }

    #[tokio::test]
    async fn runs_a_small_plan() {
        let tester = BalanceTester::new(
            RulesConfig::load_from_static(),
            CityCatalog::load_from_static(),
            NarratorSource::from_kind(NarratorKind::Scripted).unwrap(),
            false,
        );
        let seeds = resolve_seed_inputs(&["99".to_string()]).unwrap();
        let plan = build_plan(&[CityKey::Guangzhou], &seeds, &[GameplayStrategy::Sprinter], 3, 200);
        let records = tester.run_plan(&plan).await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.violations.is_empty()));
        assert!(records.iter().all(|r| r.finished));
    }
}
