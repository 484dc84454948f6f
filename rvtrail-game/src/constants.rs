//! Centralized fixed values for RV Trail game logic.
//!
//! Tunable balance numbers live in `data/rules.json` (see [`crate::config`]);
//! the values here are structural and do not change between rule sets.

// Stat bounds --------------------------------------------------------------
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;

// Journey ------------------------------------------------------------------
pub const SURVIVAL_TARGET: u32 = 1_000;
pub const FIRST_DAY: u32 = 1;
pub const LOG_CAPACITY: usize = 10;

// Narrative ----------------------------------------------------------------
pub const NARRATIVE_EVENT_PREFIX: &str = "[Event] ";
pub const NARRATIVE_FALLBACK_TEXT: &str =
    "You pick through the ruins. No infected, but not much worth taking either.";
pub(crate) const NARRATIVE_EMPTY_REPLY_TEXT: &str =
    "You spot a row of abandoned shipping containers by the roadside.";
pub(crate) const NARRATIVE_TEXT_LABELS: [&str; 2] = ["Description:", "Text:"];
pub(crate) const NARRATIVE_JSON_LABELS: [&str; 2] = ["JSON:", "JSON："];
