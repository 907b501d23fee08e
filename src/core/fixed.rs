//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for session simulation.
//! All scoring and placement arithmetic uses integer operations only,
//! so a session replays identically on every platform whether it is
//! driven locally or mirrored from a remote authority.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ───┘└──── 16 bits ───┘                   │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

/// Maximum positive value
pub const FIXED_MAX: Fixed = i32::MAX;

/// Minimum negative value
pub const FIXED_MIN: Fixed = i32::MIN;

// =============================================================================
// ENGINE CLOCK
// =============================================================================

/// Engine tick rate (Hz). All windows and lifetimes are tick counts.
pub const TICK_RATE: u32 = 20;

/// Convert whole seconds to ticks at [`TICK_RATE`].
#[inline]
pub const fn seconds_to_ticks(seconds: u32) -> u32 {
    seconds * TICK_RATE
}

// =============================================================================
// WORLD CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// World half-extent on the ground plane: 20.0 = 20 * 65536
pub const WORLD_HALF_EXTENT: Fixed = 1310720;

/// Minimum spawn height above the ground plane: 0.8 * 65536
pub const SPAWN_HEIGHT_MIN: Fixed = 52429;

/// Maximum spawn height above the ground plane: 1.8 * 65536
pub const SPAWN_HEIGHT_MAX: Fixed = 117965;

/// Near distance band: 1.5 .. 4.0 units from the anchor
pub const BAND_NEAR_MIN: Fixed = 98304;
/// Near band outer edge: 4.0 * 65536
pub const BAND_NEAR_MAX: Fixed = 262144;
/// Far distance band: 4.0 .. 12.0 units from the anchor
pub const BAND_FAR_MIN: Fixed = 262144;
/// Far band outer edge: 12.0 * 65536
pub const BAND_FAR_MAX: Fixed = 786432;

// =============================================================================
// DIFFICULTY CONSTANTS
// =============================================================================

/// Initial collectible scale: 1.0
pub const SCALE_INITIAL: Fixed = FIXED_ONE;

/// Per-step scale factor: 0.92 * 65536
pub const SCALE_STEP_FACTOR: Fixed = 60293;

/// Scale floor: 0.55 * 65536
pub const SCALE_FLOOR: Fixed = 36044;

/// Ticks between difficulty steps (15 seconds)
pub const DIFFICULTY_STEP_TICKS: u32 = 15 * TICK_RATE;

// =============================================================================
// COMBO MULTIPLIER CURVE
// =============================================================================

/// Combo multiplier below the first tier: 1.0
pub const COMBO_MULT_BASE: Fixed = FIXED_ONE;

/// Combo multiplier for streaks of 3-4: 1.2 * 65536
pub const COMBO_MULT_TIER1: Fixed = 78643;

/// Combo multiplier for streaks of 5-9: 1.5 * 65536
pub const COMBO_MULT_TIER2: Fixed = 98304;

/// Combo multiplier for streaks of 10-19: 2.0 * 65536
pub const COMBO_MULT_TIER3: Fixed = 131072;

/// Combo multiplier for streaks of 20+: 2.5 * 65536
pub const COMBO_MULT_TIER4: Fixed = 163840;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in a periodic process.
///
/// # Example
/// ```
/// use coindash::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display/logging.
///
/// # Warning
/// Only use for output. NEVER feed the result back into session logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then truncates.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Returns 0 on divide-by-zero (deterministic, never panics).
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Square root using Newton-Raphson iteration.
///
/// Returns 0 for non-positive inputs. Uses exactly 6 iterations so every
/// platform converges to the same value.
#[inline]
pub fn fixed_sqrt(x: Fixed) -> Fixed {
    if x <= 0 {
        return 0;
    }

    let mut guess = (x >> 1).max(1);

    for _ in 0..6 {
        let div = fixed_div(x, guess);
        guess = (guess.wrapping_add(div)) >> 1;

        if guess == 0 {
            guess = 1;
        }
    }

    guess
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Minimum of two fixed-point numbers.
#[inline]
pub fn fixed_min(a: Fixed, b: Fixed) -> Fixed {
    if a < b { a } else { b }
}

/// Maximum of two fixed-point numbers.
#[inline]
pub fn fixed_max(a: Fixed, b: Fixed) -> Fixed {
    if a > b { a } else { b }
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    fixed_max(min, fixed_min(max, value))
}

/// Ceiling of a fixed-point number as an integer.
///
/// `fixed_ceil_to_int(to_fixed(2.0)) == 2`, `fixed_ceil_to_int(to_fixed(2.01)) == 3`.
/// Used by the elimination quota, which rounds up before clamping.
#[inline]
pub fn fixed_ceil_to_int(x: Fixed) -> i32 {
    let whole = x >> FIXED_SCALE;
    if x & (FIXED_ONE - 1) != 0 && x > 0 {
        whole + 1
    } else {
        whole
    }
}

/// Floor of `value * multiplier` where `value` is a plain integer and
/// `multiplier` is fixed-point. Truncates toward negative infinity so a
/// penalty (negative base) never rounds toward zero.
#[inline]
pub fn fixed_scale_int(value: i64, multiplier: Fixed) -> i64 {
    let wide = value * multiplier as i64;
    // Arithmetic shift floors for negative values as well.
    wide >> FIXED_SCALE
}

// =============================================================================
// TESTS
// =============================================================================
