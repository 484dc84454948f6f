use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::cities::{CityCatalog, CityKey};
use crate::config::RulesConfig;
use crate::constants::{FIRST_DAY, LOG_CAPACITY, STAT_MAX};
use crate::numbers::{floor_stat, shift_stat};

/// Survivor vitals, each a percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub health: i32,
    pub hunger: i32,
    pub thirst: i32,
    pub sanity: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self::full()
    }
}

impl Stats {
    #[must_use]
    pub const fn full() -> Self {
        Self {
            health: STAT_MAX,
            hunger: STAT_MAX,
            thirst: STAT_MAX,
            sanity: STAT_MAX,
        }
    }

    /// Add signed deltas, clamping every stat into `[0, 100]`.
    pub fn shift(&mut self, deltas: StatDeltas) {
        self.health = shift_stat(self.health, deltas.health);
        self.hunger = shift_stat(self.hunger, deltas.hunger);
        self.thirst = shift_stat(self.thirst, deltas.thirst);
        self.sanity = shift_stat(self.sanity, deltas.sanity);
    }

    /// Add signed deltas with a floor of zero and no ceiling.
    pub fn shift_floored(&mut self, deltas: StatDeltas) {
        self.health = floor_stat(self.health, deltas.health);
        self.hunger = floor_stat(self.hunger, deltas.hunger);
        self.thirst = floor_stat(self.thirst, deltas.thirst);
        self.sanity = floor_stat(self.sanity, deltas.sanity);
    }

    /// True when any vital has run out.
    #[must_use]
    pub const fn any_depleted(&self) -> bool {
        self.health <= 0 || self.hunger <= 0 || self.thirst <= 0 || self.sanity <= 0
    }
}

/// Signed adjustments to [`Stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatDeltas {
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub hunger: i32,
    #[serde(default)]
    pub thirst: i32,
    #[serde(default)]
    pub sanity: i32,
}

impl StatDeltas {
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.health == 0 && self.hunger == 0 && self.thirst == 0 && self.sanity == 0
    }
}

/// The RV: drivetrain, armour and fitted modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RvStats {
    pub level: u32,
    pub power: u32,
    pub defense: u32,
    pub storage: u32,
    #[serde(default)]
    pub medical: bool,
    #[serde(default)]
    pub water_purifier: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    #[default]
    Melee,
    Firearm,
}

impl WeaponKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Firearm => "firearm",
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub kind: WeaponKind,
    pub damage: u32,
    pub level: u32,
}

/// Consumables carried in the RV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub food: i32,
    pub water: i32,
    pub meds: i32,
    pub samples: i32,
}

impl Inventory {
    /// Add deltas without any clamping.
    pub fn add(&mut self, deltas: InventoryDeltas) {
        self.food = self.food.saturating_add(deltas.food);
        self.water = self.water.saturating_add(deltas.water);
        self.meds = self.meds.saturating_add(deltas.meds);
        self.samples = self.samples.saturating_add(deltas.samples);
    }

    /// Take one food if any is left.
    pub fn take_food(&mut self) -> bool {
        take_one(&mut self.food)
    }

    /// Take one water if any is left.
    pub fn take_water(&mut self) -> bool {
        take_one(&mut self.water)
    }
}

fn take_one(counter: &mut i32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

/// Signed adjustments to [`Inventory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryDeltas {
    #[serde(default)]
    pub food: i32,
    #[serde(default)]
    pub water: i32,
    #[serde(default)]
    pub meds: i32,
    #[serde(default)]
    pub samples: i32,
}

impl InventoryDeltas {
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.food == 0 && self.water == 0 && self.meds == 0 && self.samples == 0
    }
}

/// Possible winning endings, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// Reached safety carrying enough virus samples for a vaccine
    UltimateRedemption,
    /// Reached safety with a clear head
    RebuildHope,
    /// Reached safety, alone
    LonelyTraveler,
}

impl Ending {
    pub const ALL: [Self; 3] = [
        Self::UltimateRedemption,
        Self::RebuildHope,
        Self::LonelyTraveler,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UltimateRedemption => "ultimate_redemption",
            Self::RebuildHope => "rebuild_hope",
            Self::LonelyTraveler => "lonely_traveler",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::UltimateRedemption => "Ultimate Redemption",
            Self::RebuildHope => "Rebuild Hope",
            Self::LonelyTraveler => "Lonely Traveler",
        }
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrative log holding the newest entries first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EventLogRepr", into = "EventLogRepr")]
pub struct EventLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl EventLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend an entry, dropping the oldest ones past capacity.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_front(entry.into());
        self.entries.truncate(self.capacity);
    }

    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Wire form of [`EventLog`]: the capacity travels with the entries.
#[derive(Serialize, Deserialize)]
struct EventLogRepr {
    #[serde(default = "default_log_capacity")]
    capacity: usize,
    #[serde(default)]
    entries: Vec<String>,
}

const fn default_log_capacity() -> usize {
    LOG_CAPACITY
}

impl From<EventLogRepr> for EventLog {
    fn from(repr: EventLogRepr) -> Self {
        let mut log = Self::with_capacity(repr.capacity);
        log.entries = repr.entries.into_iter().take(log.capacity).collect();
        log
    }
}

impl From<EventLog> for EventLogRepr {
    fn from(log: EventLog) -> Self {
        Self {
            capacity: log.capacity,
            entries: log.entries.into(),
        }
    }
}

/// Complete state of one run; the session owns exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub day: u32,
    pub distance: u32,
    pub total_distance: u32,
    pub city: CityKey,
    pub stats: Stats,
    pub rv: RvStats,
    pub weapon: Weapon,
    pub materials: i32,
    pub inventory: Inventory,
    pub log: EventLog,
    pub is_game_over: bool,
    pub ending: Option<Ending>,
}

impl GameState {
    /// Build the opening state for a run starting in `city`.
    #[must_use]
    pub fn new(city: CityKey, rules: &RulesConfig, catalog: &CityCatalog) -> Self {
        let data = catalog.get_safe(city);
        let start = &rules.start;
        let mut log = EventLog::with_capacity(rules.log_capacity);
        log.push(format!(
            "Setting out from {}. The world has ended; this {} is how we stay alive.",
            data.name, data.initial_rv
        ));
        Self {
            day: FIRST_DAY,
            distance: 0,
            total_distance: rules.victory.total_distance,
            city,
            stats: start.stats,
            rv: start.rv.clone(),
            weapon: Weapon {
                name: data.initial_weapon,
                kind: data.weapon_kind,
                damage: start.weapon_damage,
                level: 1,
            },
            materials: start.materials,
            inventory: start.inventory,
            log,
            is_game_over: false,
            ending: None,
        }
    }

    #[must_use]
    pub const fn distance_remaining(&self) -> u32 {
        self.total_distance.saturating_sub(self.distance)
    }

    #[must_use]
    pub const fn reached_destination(&self) -> bool {
        self.distance >= self.total_distance
    }

    /// Percentage of the trip covered, capped at 100.
    #[must_use]
    pub fn progress_pct(&self) -> u32 {
        if self.total_distance == 0 {
            return 100;
        }
        let pct = u64::from(self.distance) * 100 / u64::from(self.total_distance);
        u32::try_from(pct.min(100)).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_applies_start_template_and_city_flavour() {
        let rules = RulesConfig::default();
        let catalog = CityCatalog::load_from_static();
        let state = GameState::new(CityKey::Harbin, &rules, &catalog);

        assert_eq!(state.day, 1);
        assert_eq!(state.distance, 0);
        assert_eq!(state.total_distance, 1000);
        assert_eq!(state.stats, Stats::full());
        assert_eq!(state.rv.level, 1);
        assert_eq!(state.rv.power, 10);
        assert_eq!(state.weapon.name, "hunting shotgun");
        assert_eq!(state.weapon.kind, WeaponKind::Firearm);
        assert_eq!(state.weapon.damage, 15);
        assert_eq!(state.materials, 20);
        assert_eq!(state.inventory.food, 5);
        assert_eq!(state.inventory.meds, 2);
        assert_eq!(state.log.len(), 1);
        assert!(state.log.latest().unwrap().contains("Harbin"));
        assert!(!state.is_game_over);
        assert!(state.ending.is_none());
    }

    #[test]
    fn stat_shifts_clamp_or_floor() {
        let mut stats = Stats {
            health: 95,
            hunger: 4,
            thirst: 50,
            sanity: 99,
        };
        stats.shift(StatDeltas {
            health: 20,
            hunger: -5,
            ..StatDeltas::default()
        });
        assert_eq!(stats.health, 100);
        assert_eq!(stats.hunger, 0);
        assert!(stats.any_depleted());

        stats.shift_floored(StatDeltas {
            sanity: 10,
            thirst: -80,
            ..StatDeltas::default()
        });
        assert_eq!(stats.sanity, 109);
        assert_eq!(stats.thirst, 0);
    }

    #[test]
    fn event_log_keeps_newest_first_within_capacity() {
        let mut log = EventLog::with_capacity(3);
        for i in 0..5 {
            log.push(format!("entry {i}"));
        }
        let entries: Vec<&str> = log.iter().collect();
        assert_eq!(entries, vec!["entry 4", "entry 3", "entry 2"]);
    }

    #[test]
    fn event_log_serializes_capacity_with_entries() {
        let mut log = EventLog::default();
        log.push("older");
        log.push("newer");
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"{"capacity":10,"entries":["newer","older"]}"#);
        let back: EventLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);

        let legacy: EventLog = serde_json::from_str(r#"{"entries":["a"]}"#).unwrap();
        assert_eq!(legacy.capacity(), LOG_CAPACITY);
    }

    #[test]
    fn state_round_trips_with_custom_log_capacity() {
        let rules = RulesConfig {
            log_capacity: 20,
            ..RulesConfig::default()
        };
        let mut state = GameState::new(CityKey::Chengdu, &rules, &CityCatalog::load_from_static());
        for i in 0..15 {
            state.log.push(format!("entry {i}"));
        }
        assert_eq!(state.log.len(), 16);

        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.log.capacity(), 20);
        assert_eq!(back.log.len(), 16);
        assert_eq!(back, state);
    }

    #[test]
    fn inventory_takes_only_what_exists() {
        let mut inventory = Inventory {
            food: 1,
            ..Inventory::default()
        };
        assert!(inventory.take_food());
        assert!(!inventory.take_food());
        assert!(!inventory.take_water());
        assert_eq!(inventory.food, 0);
        assert_eq!(inventory.water, 0);
    }

    #[test]
    fn progress_is_capped() {
        let rules = RulesConfig::default();
        let mut state = GameState::new(CityKey::Wuhan, &rules, &CityCatalog::default());
        state.distance = 1_060;
        assert_eq!(state.progress_pct(), 100);
        assert_eq!(state.distance_remaining(), 0);
        assert!(state.reached_destination());
    }
}
