//! End of run: ending selection and the summary shown on the result screen.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::VictoryCfg;
use crate::state::{Ending, GameState, Stats};

/// Why a run was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossCause {
    /// Health ran out
    Wounds,
    /// Hunger, thirst or sanity ran out
    Exhaustion,
}

impl LossCause {
    #[must_use]
    pub const fn from_stats(stats: &Stats) -> Self {
        if stats.health <= 0 {
            Self::Wounds
        } else {
            Self::Exhaustion
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wounds => "wounds",
            Self::Exhaustion => "exhaustion",
        }
    }
}

impl fmt::Display for LossCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RunOutcome {
    InProgress,
    Victory(Ending),
    Defeat(LossCause),
}

impl RunOutcome {
    /// Read the outcome off a state.
    #[must_use]
    pub const fn of(state: &GameState) -> Self {
        if let Some(ending) = state.ending {
            Self::Victory(ending)
        } else if state.is_game_over {
            Self::Defeat(LossCause::from_stats(&state.stats))
        } else {
            Self::InProgress
        }
    }

    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Pick the ending for a run that reached its destination.
///
/// Strict priority: samples first, then sanity, then the default.
#[must_use]
pub const fn select_ending(state: &GameState, cfg: &VictoryCfg) -> Ending {
    if state.inventory.samples >= cfg.best_ending_samples {
        Ending::UltimateRedemption
    } else if state.stats.sanity > cfg.hope_ending_sanity {
        Ending::RebuildHope
    } else {
        Ending::LonelyTraveler
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub headline: String,
    pub epilogue: String,
    pub day: u32,
    pub distance: u32,
    pub total_distance: u32,
    pub samples: i32,
}

#[must_use]
pub fn run_summary(state: &GameState) -> RunSummary {
    let outcome = RunOutcome::of(state);
    let (headline, epilogue) = match outcome {
        RunOutcome::Victory(ending) => (
            format!("Survived: {}", ending.title()),
            format!(
                "You drove {} km through the wasteland. {}",
                state.distance,
                victory_epilogue(ending)
            ),
        ),
        RunOutcome::Defeat(cause) => (
            "You did not make it".to_string(),
            format!("You fell on day {}. {}", state.day, defeat_epilogue(cause)),
        ),
        RunOutcome::InProgress => (
            "Still on the road".to_string(),
            format!(
                "Day {}: {} of {} km behind you.",
                state.day, state.distance, state.total_distance
            ),
        ),
    };
    RunSummary {
        outcome,
        headline,
        epilogue,
        day: state.day,
        distance: state.distance,
        total_distance: state.total_distance,
        samples: state.inventory.samples,
    }
}

const fn victory_epilogue(ending: Ending) -> &'static str {
    match ending {
        Ending::UltimateRedemption => {
            "You brought the virus samples home and the scientists built a vaccine from them. Humanity owes you everything."
        }
        Ending::RebuildHope => {
            "You led the survivors into the safe zone. On that untouched ground a new civilisation is taking root."
        }
        Ending::LonelyTraveler => {
            "You drifted alone until you found the island. It is lonely, but you are alive."
        }
    }
}

const fn defeat_epilogue(cause: LossCause) -> &'static str {
    match cause {
        LossCause::Wounds => "Infected wounds finally took you.",
        LossCause::Exhaustion => "With nothing left, you could not keep going.",
    }
}
