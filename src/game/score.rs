//! Score Calculator
//!
//! Combines a base entity value with the combo and effect multipliers
//! into a score delta, and clamps the running score to a non-negative
//! floor. Scores never go below zero, no matter how large the penalty.

use crate::core::fixed::{Fixed, fixed_mul, fixed_scale_int};

/// Compute the signed delta for one collection:
/// `floor(base_value * combo_multiplier * effect_multiplier)`.
pub fn scored_delta(base_value: i32, combo_multiplier: Fixed, effect_multiplier: Fixed) -> i64 {
    // Combined multiplier stays far below the Q16.16 ceiling:
    // combo caps at 2.5x and the effect product at 9.0x.
    let combined = fixed_mul(combo_multiplier, effect_multiplier);
    fixed_scale_int(base_value as i64, combined)
}

/// Apply one collection to the running score.
///
/// Returns the new score and the delta that was applied. The result is
/// clamped at zero; the reported delta is the raw computed one so hosts
/// can still display "-25" on a score of 10.
pub fn apply(
    current: u32,
    base_value: i32,
    combo_multiplier: Fixed,
    effect_multiplier: Fixed,
) -> (u32, i64) {
    let delta = scored_delta(base_value, combo_multiplier, effect_multiplier);
    let new = (current as i64 + delta).clamp(0, u32::MAX as i64) as u32;
    (new, delta)
}
