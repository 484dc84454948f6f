use std::time::Instant;

use anyhow::Result;
use rvtrail_game::{
    CityCatalog, CityKey, GameSession, GameState, NarrativeCollaborator, NarrativeOutcome,
    RulesConfig, RunOutcome, Stats, TurnOutcome, TurnResolution,
};
use serde::{Deserialize, Serialize};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy, UpgradeTarget};

pub const DEFAULT_MAX_DAYS: u32 = 200;

/// Configuration for one simulated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub city: CityKey,
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub max_days: u32,
    pub iteration: usize,
    pub run_code: Option<String>,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(city: CityKey, strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            city,
            seed,
            strategy,
            max_days: DEFAULT_MAX_DAYS,
            iteration: 0,
            run_code: None,
        }
    }

    #[must_use]
    pub const fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = max_days;
        self
    }

    #[must_use]
    pub const fn with_iteration(mut self, iteration: usize) -> Self {
        self.iteration = iteration;
        self
    }

    #[must_use]
    pub fn with_run_code(mut self, code: Option<String>) -> Self {
        self.run_code = code;
        self
    }
}

/// Everything the reports need to know about one finished (or abandoned) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub city: CityKey,
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub run_code: Option<String>,
    pub iteration: usize,
    pub outcome: RunOutcome,
    /// False when the run hit the day cap before ending
    pub finished: bool,
    pub days: u32,
    pub distance: u32,
    pub total_distance: u32,
    pub progress_pct: u32,
    pub final_stats: Stats,
    pub materials: i32,
    pub samples: i32,
    pub narrative_events: u32,
    pub narrative_fallbacks: u32,
    pub upgrades: u32,
    pub violations: Vec<String>,
    pub elapsed_ms: u64,
}

impl RunRecord {
    #[must_use]
    pub const fn is_victory(&self) -> bool {
        matches!(self.outcome, RunOutcome::Victory(_))
    }

    #[must_use]
    pub const fn is_defeat(&self) -> bool {
        matches!(self.outcome, RunOutcome::Defeat(_))
    }

    #[must_use]
    pub fn outcome_label(&self) -> String {
        match self.outcome {
            RunOutcome::Victory(ending) => ending.title().to_string(),
            RunOutcome::Defeat(cause) => format!("Lost ({cause})"),
            RunOutcome::InProgress => "Unfinished".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    narrative_events: u32,
    narrative_fallbacks: u32,
    upgrades: u32,
    violations: Vec<String>,
}

/// Play one run to completion (or the day cap) and audit every turn.
pub async fn run_simulation(
    config: &SimulationConfig,
    rules: &RulesConfig,
    catalog: &CityCatalog,
    narrator: Box<dyn NarrativeCollaborator>,
) -> Result<RunRecord> {
    let started = Instant::now();
    let mut session = GameSession::new(
        config.city,
        config.seed,
        rules.clone(),
        catalog.clone(),
        narrator,
    );
    let mut policy = config.strategy.create_policy(config.seed);
    let mut counters = RunCounters::default();
    let mut turns = 0_u32;

    while !session.is_over() && turns < config.max_days {
        counters.upgrades += apply_upgrade(&mut session, policy.as_mut(), rules);

        let before = session.state().clone();
        let decision = policy.pick_action(&before, rules);
        log::trace!(
            "[{} {} seed {}] day {}: {} ({})",
            config.city,
            policy.name(),
            config.seed,
            before.day,
            decision.action,
            decision.rationale.as_deref().unwrap_or("-")
        );
        let resolution = session.take_turn(decision.action).await?;
        turns += 1;

        match &resolution.narrative {
            NarrativeOutcome::Skipped => {}
            NarrativeOutcome::Delivered(_) => counters.narrative_events += 1,
            NarrativeOutcome::Fallback { .. } => {
                counters.narrative_events += 1;
                counters.narrative_fallbacks += 1;
            }
        }
        for violation in audit_turn(&before, &resolution, rules) {
            log::error!("invariant violated on day {}: {violation}", before.day);
            counters.violations.push(format!("day {}: {violation}", before.day));
        }
    }

    let state = session.state();
    let outcome = RunOutcome::of(state);
    log::debug!(
        "[{} {} seed {}] finished after {turns} turns: {outcome:?}",
        config.city,
        config.strategy,
        config.seed
    );

    Ok(RunRecord {
        city: config.city,
        strategy: config.strategy,
        seed: config.seed,
        run_code: config.run_code.clone(),
        iteration: config.iteration,
        outcome,
        finished: outcome.is_finished(),
        days: state.day,
        distance: state.distance,
        total_distance: state.total_distance,
        progress_pct: state.progress_pct(),
        final_stats: state.stats,
        materials: state.materials,
        samples: state.inventory.samples,
        narrative_events: counters.narrative_events,
        narrative_fallbacks: counters.narrative_fallbacks,
        upgrades: counters.upgrades,
        violations: counters.violations,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

fn apply_upgrade<N: NarrativeCollaborator>(
    session: &mut GameSession<N>,
    policy: &mut (dyn PlayerPolicy + Send),
    rules: &RulesConfig,
) -> u32 {
    let Some(target) = policy.pick_upgrade(session.state(), rules) else {
        return 0;
    };
    let outcome = match target {
        UpgradeTarget::Vehicle => session.upgrade_vehicle(),
        UpgradeTarget::Weapon => session.upgrade_weapon(),
    };
    u32::from(outcome.applied())
}

/// Check the per-turn guarantees of the engine. Returns one line per breach.
#[must_use]
pub fn audit_turn(
    before: &GameState,
    resolution: &TurnResolution,
    rules: &RulesConfig,
) -> Vec<String> {
    let after = &resolution.state;
    let mut violations = Vec::new();

    if after.day != before.day + 1 {
        violations.push(format!("day went from {} to {}", before.day, after.day));
    }
    if after.log.len() > rules.log_capacity {
        violations.push(format!("log holds {} entries", after.log.len()));
    }
    if after.log.latest() != Some(resolution.message.as_str()) {
        violations.push("newest log entry is not this turn's message".to_string());
    }

    let stats = after.stats;
    let values = [stats.health, stats.hunger, stats.thirst, stats.sanity];
    if values.iter().any(|v| *v < 0) {
        violations.push(format!("negative stat in {stats:?}"));
    }
    // only the narrative merge may push a stat past the cap
    if matches!(resolution.narrative, NarrativeOutcome::Skipped) && values.iter().any(|v| *v > 100)
    {
        violations.push(format!("stat above 100 without narrative in {stats:?}"));
    }

    match resolution.outcome {
        TurnOutcome::Victory(ending) => {
            if after.ending != Some(ending) || !after.is_game_over {
                violations.push("victory without a recorded ending".to_string());
            }
            if after.distance < after.total_distance {
                violations.push(format!(
                    "victory at {} of {} km",
                    after.distance, after.total_distance
                ));
            }
        }
        TurnOutcome::Defeat(_) => {
            if after.ending.is_some() || !after.is_game_over {
                violations.push("defeat left an ending or an open run".to_string());
            }
        }
        TurnOutcome::Continue => {
            if after.is_game_over {
                violations.push("run ended without an outcome".to_string());
            }
        }
    }

    violations
}
