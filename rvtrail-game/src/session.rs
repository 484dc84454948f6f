use crate::cities::{CityCatalog, CityKey};
use crate::config::RulesConfig;
use crate::narrative::NarrativeCollaborator;
use crate::result::{RunSummary, run_summary};
use crate::rng::RngBundle;
use crate::state::GameState;
use crate::turn::{Action, TurnError, TurnResolution, resolve_turn};
use crate::upgrade::{UpgradeOutcome, upgrade_vehicle, upgrade_weapon};

/// One player's run: the current state plus everything needed to advance it.
///
/// A turn is resolved against a snapshot and only committed once the
/// narrator (if consulted) has answered, so dropping a pending
/// [`GameSession::take_turn`] future leaves the state as it was.
#[derive(Debug)]
pub struct GameSession<N> {
    state: GameState,
    rng: RngBundle,
    rules: RulesConfig,
    catalog: CityCatalog,
    narrator: N,
    turns: u64,
}

impl<N: NarrativeCollaborator> GameSession<N> {
    #[must_use]
    pub fn new(
        city: CityKey,
        seed: u64,
        rules: RulesConfig,
        catalog: CityCatalog,
        narrator: N,
    ) -> Self {
        let state = GameState::new(city, &rules, &catalog);
        log::debug!("new run from {city} with seed {seed:#x}");
        Self {
            state,
            rng: RngBundle::from_user_seed(seed),
            rules,
            catalog,
            narrator,
            turns: 0,
        }
    }

    /// Session with the bundled rules and city catalogue.
    #[must_use]
    pub fn with_defaults(city: CityKey, seed: u64, narrator: N) -> Self {
        Self::new(
            city,
            seed,
            RulesConfig::load_from_static(),
            CityCatalog::load_from_static(),
            narrator,
        )
    }

    /// Resolve one turn and commit the result.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::GameOver`] once the run has ended.
    pub async fn take_turn(&mut self, action: Action) -> Result<TurnResolution, TurnError> {
        let resolution = resolve_turn(
            &self.state,
            action,
            &mut self.rng,
            &self.narrator,
            &self.rules,
        )
        .await?;
        self.state = resolution.state.clone();
        self.turns = self.turns.saturating_add(1);
        Ok(resolution)
    }

    pub fn upgrade_vehicle(&mut self) -> UpgradeOutcome {
        upgrade_vehicle(&mut self.state, &self.rules.upgrades)
    }

    pub fn upgrade_weapon(&mut self) -> UpgradeOutcome {
        upgrade_weapon(&mut self.state, &self.rules.upgrades)
    }

    /// Throw the current run away and start over.
    pub fn restart(&mut self, city: CityKey, seed: u64) {
        self.state = GameState::new(city, &self.rules, &self.catalog);
        self.rng = RngBundle::from_user_seed(seed);
        self.turns = 0;
        log::debug!("restarted from {city} with seed {seed:#x}");
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        run_summary(&self.state)
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Turns committed since the run started.
    #[must_use]
    pub const fn turns(&self) -> u64 {
        self.turns
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.state.is_game_over
    }
}
