use rvtrail_game::RunOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::util::{mean, std_dev};
use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::RunRecord;

/// Per-strategy roll-up of many runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAggregate {
    pub strategy: GameplayStrategy,
    pub runs: usize,
    pub victories: usize,
    pub defeats: usize,
    pub unfinished: usize,
    pub win_rate: f64,
    pub mean_days: f64,
    pub std_days: f64,
    pub mean_distance: f64,
    pub mean_upgrades: f64,
    pub fallback_rate: f64,
    /// Ending or loss label to count
    pub outcomes: BTreeMap<String, usize>,
    pub violations: usize,
}

#[derive(Default)]
struct AggregateBuilder {
    runs: usize,
    victories: usize,
    defeats: usize,
    days: Vec<f64>,
    distance: Vec<f64>,
    upgrades: Vec<f64>,
    narrative_events: u64,
    narrative_fallbacks: u64,
    outcomes: BTreeMap<String, usize>,
    violations: usize,
}

impl AggregateBuilder {
    fn ingest(&mut self, record: &RunRecord) {
        self.runs += 1;
        match record.outcome {
            RunOutcome::Victory(_) => self.victories += 1,
            RunOutcome::Defeat(_) => self.defeats += 1,
            RunOutcome::InProgress => {}
        }
        self.days.push(f64::from(record.days));
        self.distance.push(f64::from(record.distance));
        self.upgrades.push(f64::from(record.upgrades));
        self.narrative_events += u64::from(record.narrative_events);
        self.narrative_fallbacks += u64::from(record.narrative_fallbacks);
        *self.outcomes.entry(record.outcome_label()).or_default() += 1;
        self.violations += record.violations.len();
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self, strategy: GameplayStrategy) -> StrategyAggregate {
        let ratio = |num: u64, den: u64| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };
        StrategyAggregate {
            strategy,
            runs: self.runs,
            victories: self.victories,
            defeats: self.defeats,
            unfinished: self.runs - self.victories - self.defeats,
            win_rate: ratio(self.victories as u64, self.runs as u64),
            mean_days: mean(&self.days),
            std_days: std_dev(&self.days),
            mean_distance: mean(&self.distance),
            mean_upgrades: mean(&self.upgrades),
            fallback_rate: ratio(self.narrative_fallbacks, self.narrative_events),
            outcomes: self.outcomes,
            violations: self.violations,
        }
    }
}

/// Group records by strategy, in strategy order.
#[must_use]
pub fn aggregate_records(records: &[RunRecord]) -> Vec<StrategyAggregate> {
    let mut builders: BTreeMap<GameplayStrategy, AggregateBuilder> = BTreeMap::new();
    for record in records {
        builders.entry(record.strategy).or_default().ingest(record);
    }
    builders
        .into_iter()
        .map(|(strategy, builder)| builder.finish(strategy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvtrail_game::{CityKey, Ending, LossCause, Stats};

    fn record(strategy: GameplayStrategy, outcome: RunOutcome, days: u32) -> RunRecord {
        RunRecord {
            city: CityKey::Beijing,
            strategy,
            seed: 1,
            run_code: None,
            iteration: 0,
            outcome,
            finished: outcome.is_finished(),
            days,
            distance: 500,
            total_distance: 1000,
            progress_pct: 50,
            final_stats: Stats::full(),
            materials: 0,
            samples: 0,
            narrative_events: 4,
            narrative_fallbacks: 1,
            upgrades: 1,
            violations: Vec::new(),
            elapsed_ms: 0,
        }
    }

    #[test]
    fn groups_by_strategy_and_counts_outcomes() {
        let records = vec![
            record(
                GameplayStrategy::Balanced,
                RunOutcome::Victory(Ending::RebuildHope),
                20,
            ),
            record(
                GameplayStrategy::Balanced,
                RunOutcome::Defeat(LossCause::Wounds),
                10,
            ),
            record(GameplayStrategy::Cautious, RunOutcome::InProgress, 200),
        ];
        let aggregates = aggregate_records(&records);
        assert_eq!(aggregates.len(), 2);

        let cautious = &aggregates[0];
        assert_eq!(cautious.strategy, GameplayStrategy::Cautious);
        assert_eq!(cautious.unfinished, 1);

        let balanced = &aggregates[1];
        assert_eq!(balanced.runs, 2);
        assert!((balanced.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((balanced.mean_days - 15.0).abs() < f64::EPSILON);
        assert!((balanced.fallback_rate - 0.25).abs() < f64::EPSILON);
        assert_eq!(balanced.outcomes.get("Lost (wounds)"), Some(&1));
    }
}
