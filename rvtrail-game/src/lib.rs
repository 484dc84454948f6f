//! RV Trail Game Engine
//!
//! Platform-agnostic turn engine for a wasteland RV survival run. One action
//! per day resolves deterministically, then an optional narrative
//! collaborator may layer an unscheduled event on top. No UI lives here.

pub mod cities;
pub mod config;
pub mod constants;
#[cfg(feature = "http")]
pub mod http;
pub mod narrative;
pub mod numbers;
pub mod result;
pub mod rng;
pub mod seed;
pub mod session;
pub mod state;
pub mod turn;
pub mod upgrade;

// Re-export commonly used types
pub use cities::{CityCatalog, CityData, CityKey};
pub use config::{
    AdvanceCfg, NarrativeCfg, RadioCfg, RestCfg, RulesConfig, RulesConfigError, ScavengeCfg,
    StartCfg, UpgradeCfg, UpkeepCfg, VictoryCfg,
};
#[cfg(feature = "http")]
pub use http::{GeminiConfig, GeminiNarrator};
pub use narrative::{
    NarrativeCollaborator, NarrativeEffect, NarrativeError, NarrativeEvent, NarrativeRequest,
    ScriptedNarrator, SilentNarrator, parse_reply,
};
pub use result::{LossCause, RunOutcome, RunSummary, run_summary, select_ending};
pub use rng::{CountingRng, RngBundle};
pub use seed::{decode_run_code, encode_run_code, generate_code_from_entropy};
pub use session::GameSession;
pub use state::{
    Ending, EventLog, GameState, Inventory, InventoryDeltas, RvStats, StatDeltas, Stats, Weapon,
    WeaponKind,
};
pub use turn::{
    Action, ActionDraws, NarrativeOutcome, TurnError, TurnOutcome, TurnResolution, apply_action,
    evaluate_terminal, merge_narrative, resolve_turn, resolve_turn_with,
};
pub use upgrade::{UpgradeOutcome, upgrade_vehicle, upgrade_weapon};
