//! Numeric helpers centralizing clamps and lossy casts.

use num_traits::cast::cast;

use crate::constants::{STAT_MAX, STAT_MIN};

/// Clamp a percentage stat into `[0, 100]`.
#[must_use]
pub const fn clamp_stat(value: i32) -> i32 {
    if value < STAT_MIN {
        STAT_MIN
    } else if value > STAT_MAX {
        STAT_MAX
    } else {
        value
    }
}

/// Apply a signed delta to a stat, clamping on both ends.
#[must_use]
pub const fn shift_stat(value: i32, delta: i32) -> i32 {
    clamp_stat(value.saturating_add(delta))
}

/// Apply a signed delta to a stat, flooring at zero only.
#[must_use]
pub fn floor_stat(value: i32, delta: i32) -> i32 {
    value.saturating_add(delta).max(STAT_MIN)
}

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}
