//! Turn resolution.
//!
//! A turn runs in two phases. The deterministic phase applies upkeep and the
//! chosen action from pre-rolled [`ActionDraws`]. The asynchronous phase
//! optionally consults the narrator on the post-action state. The narrative
//! effect is then merged, the day advances and terminal conditions are
//! evaluated exactly once, so no partial state is ever observable.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{NarrativeCfg, RulesConfig, ScavengeCfg, VictoryCfg};
use crate::constants::NARRATIVE_EVENT_PREFIX;
use crate::narrative::{
    NarrativeCollaborator, NarrativeEffect, NarrativeError, NarrativeEvent, NarrativeRequest,
};
use crate::numbers::shift_stat;
use crate::result::{LossCause, select_ending};
use crate::rng::RngBundle;
use crate::state::{Ending, GameState, StatDeltas};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Advance,
    Scavenge,
    Rest,
    Radio,
}

impl Action {
    pub const ALL: [Self; 4] = [Self::Advance, Self::Scavenge, Self::Rest, Self::Radio];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Scavenge => "scavenge",
            Self::Rest => "rest",
            Self::Radio => "radio",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("run already ended on day {day}")]
    GameOver { day: u32 },
}

/// Random values consumed by one action, rolled before any state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionDraws {
    pub materials: i32,
    pub found_food: bool,
    pub found_water: bool,
    pub risk: i32,
}

impl ActionDraws {
    /// Draws for actions with no random component.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            materials: 0,
            found_food: false,
            found_water: false,
            risk: 0,
        }
    }

    /// Roll whatever `action` needs. Only scavenging consumes the stream.
    pub fn roll<R: Rng + ?Sized>(action: Action, rng: &mut R, cfg: &ScavengeCfg) -> Self {
        if action != Action::Scavenge {
            return Self::none();
        }
        Self {
            materials: roll_range(rng, cfg.materials_min, cfg.materials_max),
            found_food: rng.r#gen::<f64>() < cfg.food_chance,
            found_water: rng.r#gen::<f64>() < cfg.water_chance,
            risk: roll_range(rng, 0, cfg.risk_max),
        }
    }
}

fn roll_range<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// What the narrator contributed to a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeOutcome {
    /// The narrator was not consulted this turn
    Skipped,
    /// The narrator produced an event
    Delivered(NarrativeEvent),
    /// The narrator failed and the fixed fallback event was used
    Fallback {
        event: NarrativeEvent,
        error: NarrativeError,
    },
}

impl NarrativeOutcome {
    #[must_use]
    pub const fn event(&self) -> Option<&NarrativeEvent> {
        match self {
            Self::Skipped => None,
            Self::Delivered(event) | Self::Fallback { event, .. } => Some(event),
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Terminal condition triggered by a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnOutcome {
    Continue,
    Victory(Ending),
    Defeat(LossCause),
}

/// Everything one resolved turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResolution {
    pub state: GameState,
    pub action: Action,
    pub message: String,
    pub narrative: NarrativeOutcome,
    pub outcome: TurnOutcome,
}

/// Resolve one turn, rolling randomness from `rng`.
///
/// The input state is left untouched; the next state is returned in the
/// resolution.
///
/// # Errors
///
/// Returns [`TurnError::GameOver`] if `state` has already ended.
pub async fn resolve_turn<N>(
    state: &GameState,
    action: Action,
    rng: &mut RngBundle,
    narrator: &N,
    rules: &RulesConfig,
) -> Result<TurnResolution, TurnError>
where
    N: NarrativeCollaborator + ?Sized,
{
    if state.is_game_over {
        return Err(TurnError::GameOver { day: state.day });
    }
    let draws = ActionDraws::roll(action, rng.scavenge(), &rules.scavenge);
    let consult = rng.narrative().r#gen::<f64>() < rules.narrative.chance;
    resolve_turn_with(state, action, draws, consult, narrator, rules).await
}

/// Resolve one turn from explicit draws.
///
/// # Errors
///
/// Returns [`TurnError::GameOver`] if `state` has already ended.
pub async fn resolve_turn_with<N>(
    state: &GameState,
    action: Action,
    draws: ActionDraws,
    consult_narrator: bool,
    narrator: &N,
    rules: &RulesConfig,
) -> Result<TurnResolution, TurnError>
where
    N: NarrativeCollaborator + ?Sized,
{
    if state.is_game_over {
        return Err(TurnError::GameOver { day: state.day });
    }

    let mut next = state.clone();
    let mut message = apply_action(&mut next, action, &draws, rules);

    let narrative = if consult_narrator {
        consult(&next, narrator, &rules.narrative).await
    } else {
        NarrativeOutcome::Skipped
    };
    if let Some(event) = narrative.event() {
        message.push('\n');
        message.push_str(NARRATIVE_EVENT_PREFIX);
        message.push_str(&event.text);
        merge_narrative(&mut next, &event.effect);
    }

    next.day = next.day.saturating_add(1);
    let outcome = evaluate_terminal(&mut next, &rules.victory);
    next.log.push(message.clone());

    log::debug!(
        "day {} {action}: distance {}/{} stats {:?} materials {} outcome {outcome:?}",
        next.day,
        next.distance,
        next.total_distance,
        next.stats,
        next.materials,
    );
    if next.is_game_over {
        log::info!("run ended on day {} with {outcome:?}", next.day);
    }

    Ok(TurnResolution {
        state: next,
        action,
        message,
        narrative,
        outcome,
    })
}

/// Deterministic phase: upkeep then the action itself. Returns the log line.
pub fn apply_action(
    state: &mut GameState,
    action: Action,
    draws: &ActionDraws,
    rules: &RulesConfig,
) -> String {
    apply_upkeep(state, rules);
    match action {
        Action::Advance => {
            let gained = advance_distance(state, rules);
            state.distance = state.distance.saturating_add(gained);
            state.stats.sanity = shift_stat(state.stats.sanity, -rules.advance.sanity_cost);
            format!("You pushed the RV {gained} km further down the road.")
        }
        Action::Scavenge => {
            state.materials = state.materials.saturating_add(draws.materials.max(0));
            if draws.found_food {
                state.inventory.food = state.inventory.food.saturating_add(1);
            }
            if draws.found_water {
                state.inventory.water = state.inventory.water.saturating_add(1);
            }
            state.stats.health = shift_stat(state.stats.health, -draws.risk.max(0));
            let food_note = if draws.found_food {
                " and some food"
            } else {
                ""
            };
            format!(
                "You searched an abandoned supermarket nearby and came away with {} parts{food_note}.",
                draws.materials.max(0)
            )
        }
        Action::Rest => {
            let cfg = &rules.rest;
            state.stats.health = shift_stat(state.stats.health, cfg.health);
            state.stats.sanity = shift_stat(state.stats.sanity, cfg.sanity);
            if state.inventory.take_food() {
                state.stats.hunger = shift_stat(state.stats.hunger, cfg.hunger);
            }
            if state.inventory.take_water() {
                state.stats.thirst = shift_stat(state.stats.thirst, cfg.thirst);
            }
            "You spent the night resting in the RV and got some strength back.".to_string()
        }
        Action::Radio => {
            state.stats.sanity = shift_stat(state.stats.sanity, rules.radio.sanity);
            "You tuned the radio and caught a faint survivor broadcast. It steadied your nerves."
                .to_string()
        }
    }
}

fn apply_upkeep(state: &mut GameState, rules: &RulesConfig) {
    let upkeep = &rules.upkeep;
    state.stats.shift(StatDeltas {
        health: 0,
        hunger: -upkeep.hunger,
        thirst: -upkeep.thirst,
        sanity: -upkeep.sanity,
    });
}

async fn consult<N>(state: &GameState, narrator: &N, cfg: &NarrativeCfg) -> NarrativeOutcome
where
    N: NarrativeCollaborator + ?Sized,
{
    let request = NarrativeRequest::from_state(state);
    let timeout = cfg.timeout();
    let result = match tokio::time::timeout(timeout, narrator.generate(&request)).await {
        Ok(result) => result,
        Err(_) => Err(NarrativeError::Timeout(timeout)),
    };
    match result {
        Ok(event) => NarrativeOutcome::Delivered(event),
        Err(error) => {
            log::warn!(
                "narrator '{}' failed, using fallback event: {error}",
                narrator.name()
            );
            NarrativeOutcome::Fallback {
                event: fallback_event(cfg),
                error,
            }
        }
    }
}

/// The fixed event substituted whenever the narrator fails.
#[must_use]
pub fn fallback_event(cfg: &NarrativeCfg) -> NarrativeEvent {
    NarrativeEvent::new(
        cfg.fallback_text.clone(),
        NarrativeEffect::materials_only(cfg.fallback_materials),
    )
}

/// Merge a narrative effect.
///
/// Stats are floored at zero but not capped; materials and inventory take
/// the raw delta.
pub fn merge_narrative(state: &mut GameState, effect: &NarrativeEffect) {
    state.stats.shift_floored(effect.stats);
    state.materials = state.materials.saturating_add(effect.materials);
    state.inventory.add(effect.inventory);
}

/// Check win then loss. A loss in the same turn never clears the ending.
pub fn evaluate_terminal(state: &mut GameState, cfg: &VictoryCfg) -> TurnOutcome {
    let mut outcome = TurnOutcome::Continue;
    if state.reached_destination() {
        let ending = select_ending(state, cfg);
        state.ending = Some(ending);
        state.is_game_over = true;
        outcome = TurnOutcome::Victory(ending);
    }
    if state.stats.any_depleted() {
        state.is_game_over = true;
        if outcome == TurnOutcome::Continue {
            outcome = TurnOutcome::Defeat(LossCause::from_stats(&state.stats));
        }
    }
    outcome
}

/// Distance an advance would cover with the current RV.
#[must_use]
pub const fn advance_distance(state: &GameState, rules: &RulesConfig) -> u32 {
    let cfg = &rules.advance;
    cfg.base_distance
        .saturating_add(cfg.power_multiplier.saturating_mul(state.rv.power))
}
