use anyhow::{Result, bail};
use rvtrail_game::{CityKey, decode_run_code, encode_run_code};
use std::collections::HashMap;

pub const DEFAULT_SEED: u64 = 1337;

/// A seed from the command line and, for run codes, the city it pins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_city: Option<CityKey>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_city: None,
        }
    }

    #[must_use]
    pub fn from_run_code(seed: u64, city: CityKey, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_city: Some(city),
        }
    }

    /// Cities this seed should be played from. Run codes only replay their
    /// own city; plain integers fan out over `selected`.
    #[must_use]
    pub fn cities(&self, selected: &[CityKey]) -> Vec<CityKey> {
        match self.source_city {
            Some(city) => vec![city],
            None => selected.to_vec(),
        }
    }
}

/// Run code that decodes back to exactly `(city, seed)`, if one exists.
///
/// Codes only carry 16 bits of the seed, so arbitrary integers and
/// iteration offsets usually have none.
#[must_use]
pub fn replay_code(city: CityKey, seed: u64) -> Option<String> {
    let code = encode_run_code(city, seed);
    (decode_run_code(&code) == Some((city, seed))).then_some(code)
}

/// Resolve CLI seed tokens: integers (negative ones use their magnitude) or
/// run codes such as `BJ-DIESEL42`. Duplicates collapse, preferring the
/// entry that carries a code.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Some((city, seed)) = decode_run_code(token) {
            pending.push(SeedInfo::from_run_code(seed, city, token.trim().to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<CityKey>), usize> = HashMap::new();

    for info in pending {
        let key = (info.seed, info.source_city);
        if let Some(entry) = index.get(&key).and_then(|idx| deduped.get_mut(*idx)) {
            if entry.code.is_none() && info.code.is_some() {
                *entry = info;
            }
        } else {
            index.insert(key, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}
