//! Contract with the text generator that injects unscheduled road events.
//!
//! The engine only ever sees a [`NarrativeEvent`]: free text plus a numeric
//! effect made of deltas. Generators reply in a loose "description then JSON"
//! format which [`parse_reply`] turns into an event, tolerating missing,
//! partial or broken JSON.
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::cities::CityKey;
use crate::constants::{NARRATIVE_EMPTY_REPLY_TEXT, NARRATIVE_JSON_LABELS, NARRATIVE_TEXT_LABELS};
use crate::numbers::round_f64_to_i32;
use crate::state::{GameState, InventoryDeltas, StatDeltas, Stats};

/// Ways a narrator call can fail. None of these reach the player.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NarrativeError {
    #[error("narrator unavailable: {0}")]
    Unavailable(String),
    #[error("missing narrator API key ({0})")]
    MissingApiKey(&'static str),
    #[error("narrator transport failure: {0}")]
    Transport(String),
    #[error("narrator returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("narrator timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed narrator payload: {0}")]
    Malformed(String),
}

/// Snapshot of the run sent to the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub city: CityKey,
    pub distance_remaining: u32,
    pub stats: Stats,
    pub rv_level: u32,
    pub weapon_name: String,
}

impl NarrativeRequest {
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        Self {
            city: state.city,
            distance_remaining: state.distance_remaining(),
            stats: state.stats,
            rv_level: state.rv.level,
            weapon_name: state.weapon.name.clone(),
        }
    }
}

/// Numeric side effect of a narrative event. Every field is a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NarrativeEffect {
    #[serde(default, deserialize_with = "lenient_stats")]
    pub stats: StatDeltas,
    #[serde(default, deserialize_with = "lenient_delta")]
    pub materials: i32,
    #[serde(default, deserialize_with = "lenient_inventory")]
    pub inventory: InventoryDeltas,
}

impl NarrativeEffect {
    #[must_use]
    pub const fn materials_only(materials: i32) -> Self {
        Self {
            stats: StatDeltas {
                health: 0,
                hunger: 0,
                thirst: 0,
                sanity: 0,
            },
            materials,
            inventory: InventoryDeltas {
                food: 0,
                water: 0,
                meds: 0,
                samples: 0,
            },
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stats.is_zero() && self.materials == 0 && self.inventory.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeEvent {
    pub text: String,
    #[serde(default)]
    pub effect: NarrativeEffect,
}

impl NarrativeEvent {
    #[must_use]
    pub fn new(text: impl Into<String>, effect: NarrativeEffect) -> Self {
        Self {
            text: text.into(),
            effect,
        }
    }
}

/// External generator of unscheduled events.
///
/// Implementations may fail freely; the turn engine converts every error
/// into its fixed fallback event.
#[async_trait]
pub trait NarrativeCollaborator: Send + Sync {
    /// Name used for logging.
    fn name(&self) -> &'static str;

    /// Produce an event for the supplied run snapshot.
    async fn generate(&self, request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError>;
}

#[async_trait]
impl<T: NarrativeCollaborator + ?Sized> NarrativeCollaborator for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        (**self).generate(request).await
    }
}

/// Split a generator reply into event text and effect.
///
/// The first `{` through the last `}` is treated as the effect payload. A
/// payload that fails to parse yields an empty effect; an empty reply yields
/// a stock roadside description.
#[must_use]
pub fn parse_reply(raw: &str) -> NarrativeEvent {
    let trimmed = raw.trim();
    let (text, effect) = match json_span(trimmed) {
        Some((start, end)) => {
            let payload = &trimmed[start..=end];
            let effect = serde_json::from_str::<NarrativeEffect>(payload).unwrap_or_else(|err| {
                log::warn!("discarding unparseable narrative effect: {err}");
                NarrativeEffect::default()
            });
            let mut text = String::with_capacity(trimmed.len());
            text.push_str(&trimmed[..start]);
            text.push_str(&trimmed[end + 1..]);
            (text, effect)
        }
        None => (before_json_label(trimmed).to_string(), NarrativeEffect::default()),
    };

    let text = clean_text(&text);
    let text = if text.is_empty() {
        NARRATIVE_EMPTY_REPLY_TEXT.to_string()
    } else {
        text
    };
    NarrativeEvent { text, effect }
}

fn json_span(text: &str) -> Option<(usize, usize)> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then_some((start, end))
}

fn before_json_label(text: &str) -> &str {
    NARRATIVE_JSON_LABELS
        .iter()
        .filter_map(|label| text.find(label))
        .min()
        .map_or(text, |idx| &text[..idx])
}

fn clean_text(text: &str) -> String {
    let mut cleaned = text.trim();
    for label in NARRATIVE_JSON_LABELS {
        if let Some(stripped) = cleaned.strip_suffix(label) {
            cleaned = stripped.trim_end();
        }
    }
    for label in NARRATIVE_TEXT_LABELS {
        if let Some(stripped) = cleaned.strip_prefix(label) {
            cleaned = stripped.trim_start();
        }
    }
    cleaned.trim().to_string()
}

fn delta_from_value(value: &serde_json::Value) -> i32 {
    match value {
        serde_json::Value::Number(number) => number.as_f64().map_or(0, round_f64_to_i32),
        serde_json::Value::String(text) => text.trim().parse::<f64>().map_or(0, round_f64_to_i32),
        _ => 0,
    }
}

fn lenient_delta<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(delta_from_value(&value))
}

fn field(map: &serde_json::Map<String, serde_json::Value>, key: &str) -> i32 {
    map.get(key).map_or(0, delta_from_value)
}

fn lenient_stats<'de, D>(deserializer: D) -> Result<StatDeltas, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let Some(map) = value.as_object() else {
        return Ok(StatDeltas::default());
    };
    Ok(StatDeltas {
        health: field(map, "health"),
        hunger: field(map, "hunger"),
        thirst: field(map, "thirst"),
        sanity: field(map, "sanity"),
    })
}

fn lenient_inventory<'de, D>(deserializer: D) -> Result<InventoryDeltas, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let Some(map) = value.as_object() else {
        return Ok(InventoryDeltas::default());
    };
    Ok(InventoryDeltas {
        food: field(map, "food"),
        water: field(map, "water"),
        meds: field(map, "meds"),
        samples: field(map, "samples"),
    })
}

const SCRIPTED_REPLIES: [&str; 8] = [
    r#"Description: A stranded convoy waves you down and trades a crate of canned food for fuel.
JSON: {"inventory": {"food": 2}, "materials": -3}"#,
    r#"Description: A horde spills out of a tunnel mouth. You floor it, but something hits the hull hard.
JSON: {"stats": {"health": -12, "sanity": -6}}"#,
    r#"Description: An abandoned field lab still has a sealed cold box. Inside: a labelled virus sample.
JSON: {"inventory": {"samples": 1}, "stats": {"sanity": -3}}"#,
    r#"Description: Rain collects in a tarp you rigged on the roof overnight.
JSON: {"inventory": {"water": 2}}"#,
    r#"Description: A wrecked bus yields a toolbox and a box of bandages.
JSON: {"materials": 8, "inventory": {"meds": 1}}"#,
    r#"Description: A child's drawing taped to a road sign reads "we made it north". You feel lighter.
JSON: {"stats": {"sanity": 10}}"#,
    r#"Description: The heat is brutal and the cab turns into an oven.
JSON: {"stats": {"thirst": -10, "hunger": -4}}"#,
    "Description: Nothing but wind and empty road for hours.",
];

/// Offline narrator replaying a fixed set of generator-style replies.
#[derive(Debug)]
pub struct ScriptedNarrator {
    rng: Mutex<ChaCha20Rng>,
}

impl ScriptedNarrator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl NarrativeCollaborator for ScriptedNarrator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        let idx = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| NarrativeError::Unavailable("scripted narrator poisoned".into()))?;
            rng.gen_range(0..SCRIPTED_REPLIES.len())
        };
        Ok(parse_reply(SCRIPTED_REPLIES[idx]))
    }
}

/// Narrator that always declines, forcing the engine's fallback event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNarrator;

#[async_trait]
impl NarrativeCollaborator for SilentNarrator {
    fn name(&self) -> &'static str {
        "silent"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        Err(NarrativeError::Unavailable("narration disabled".into()))
    }
}
