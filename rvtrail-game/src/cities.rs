//! Starting cities and the flavour they lend a new run.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::state::WeaponKind;

const DEFAULT_CITY_DATA: &str = include_str!("../data/cities.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityKey {
    Beijing,
    Shanghai,
    Chengdu,
    Harbin,
    Xian,
    Guangzhou,
    Wuhan,
    Chongqing,
}

impl CityKey {
    pub const ALL: [Self; 8] = [
        Self::Beijing,
        Self::Shanghai,
        Self::Chengdu,
        Self::Harbin,
        Self::Xian,
        Self::Guangzhou,
        Self::Wuhan,
        Self::Chongqing,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beijing => "beijing",
            Self::Shanghai => "shanghai",
            Self::Chengdu => "chengdu",
            Self::Harbin => "harbin",
            Self::Xian => "xian",
            Self::Guangzhou => "guangzhou",
            Self::Wuhan => "wuhan",
            Self::Chongqing => "chongqing",
        }
    }

    /// Two-letter prefix used by run codes.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Beijing => "BJ",
            Self::Shanghai => "SH",
            Self::Chengdu => "CD",
            Self::Harbin => "HB",
            Self::Xian => "XA",
            Self::Guangzhou => "GZ",
            Self::Wuhan => "WH",
            Self::Chongqing => "CQ",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|city| city.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CityKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|city| city.as_str() == lowered)
            .or_else(|| Self::from_code(&lowered))
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityData {
    pub name: String,
    pub description: String,
    pub initial_rv: String,
    pub initial_weapon: String,
    #[serde(default)]
    pub weapon_kind: WeaponKind,
    #[serde(default)]
    pub bonus_item: String,
    #[serde(default)]
    pub terrain: String,
}

impl CityData {
    /// Generic profile used when a catalogue lacks an entry.
    #[must_use]
    pub fn placeholder(city: CityKey) -> Self {
        Self {
            name: city.as_str().to_string(),
            description: String::new(),
            initial_rv: "camper".to_string(),
            initial_weapon: "crowbar".to_string(),
            weapon_kind: WeaponKind::Melee,
            bonus_item: String::new(),
            terrain: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CityCatalog(HashMap<CityKey, CityData>);

impl CityCatalog {
    /// Load cities from a JSON object keyed by city id.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into city data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }

    /// Load the catalogue bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CITY_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, city: CityKey) -> Option<&CityData> {
        self.0.get(&city)
    }

    #[must_use]
    pub fn get_safe(&self, city: CityKey) -> CityData {
        self.get(city)
            .cloned()
            .unwrap_or_else(|| CityData::placeholder(city))
    }

    /// Cities in menu order.
    pub fn iter(&self) -> impl Iterator<Item = (CityKey, &CityData)> {
        CityKey::ALL
            .into_iter()
            .filter_map(|city| self.0.get(&city).map(|data| (city, data)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
