//! Shareable run codes.
//!
//! Format: `<CITY>-<WORD><NN>`, e.g. `BJ-DIESEL42`. The city prefix is one of
//! the two-letter [`CityKey::code`] values. The low 16 bits of the seed carry
//! the word index and number; the rest is a hash so nearby codes still land
//! on unrelated runs.

use crate::cities::CityKey;

const WORD_MASK: u16 = 0x01FF;
const NUMBER_MASK: u16 = 0x7F;

pub const WORD_LIST: [&str; 64] = [
    "DIESEL", "RUST", "ASHES", "BUNKER", "CANTEEN", "RADIO", "STATIC", "BEACON", "CONVOY",
    "DUSK", "EMBER", "FUEL", "GASKET", "HAVEN", "INFECT", "JERRY", "KETTLE", "LANTERN", "MEDKIT",
    "NOMAD", "OUTPOST", "PANTRY", "QUARRY", "RATION", "SALVAGE", "TARP", "UPLINK", "VACCINE",
    "WINCH", "WRENCH", "YONDER", "ZONE", "ANTENNA", "BARREL", "CAMPER", "DRIFTER", "ENGINE",
    "FLARE", "GRAVEL", "HIGHWAY", "IRON", "JUNK", "KEROSENE", "LADDER", "MAPS", "NEEDLE",
    "OASIS", "PISTON", "QUIET", "RELAY", "SCRAP", "TIRES", "UMBRA", "VALVE", "WALKER", "AXLE",
    "BRIDGE", "CRATE", "DEPOT", "EXODUS", "FERRY", "GARAGE", "HORDE", "ISLAND",
];

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    (word_index & WORD_MASK) | ((u16::from(nn) & NUMBER_MASK) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    let nn = u8::try_from((packed >> 9) & NUMBER_MASK).unwrap_or(0);
    (packed & WORD_MASK, nn)
}

fn compose_seed(city: CityKey, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let code = city.code().as_bytes();
    let [lo, hi] = packed.to_le_bytes();
    let mut buf = [0u8; 11];
    buf[..6].copy_from_slice(b"RVTRL-");
    buf[6] = code.first().copied().unwrap_or(b'?');
    buf[7] = code.get(1).copied().unwrap_or(b'?');
    buf[8] = lo;
    buf[9] = hi;
    buf[10] = 0x5A;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render a seed as a run code for `city`.
#[must_use]
pub fn encode_run_code(city: CityKey, seed: u64) -> String {
    let packed = u16::try_from(seed & 0xFFFF).unwrap_or(0);
    let (wi, nn) = unpack(packed);
    let word = WORD_LIST[usize::from(wi) % WORD_LIST.len()];
    format!("{}-{word}{:02}", city.code(), nn % 100)
}

/// Parse a run code back into its city and seed.
///
/// Case and stray punctuation in the word are ignored.
#[must_use]
pub fn decode_run_code(code: &str) -> Option<(CityKey, u64)> {
    let (prefix, rest) = code.trim().split_once('-')?;
    let city = CityKey::from_code(prefix.trim())?;
    if rest.len() < 3 || !rest.is_char_boundary(rest.len() - 2) {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    if !nn_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| *w == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some((city, compose_seed(city, wi, nn)))
}

/// Mint a fresh run code for `city` from arbitrary entropy.
#[must_use]
pub fn generate_code_from_entropy(city: CityKey, entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_run_code(city, compose_seed(city, wi, nn))
}
