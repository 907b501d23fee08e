//! Deterministic Random Number Generator
//!
//! Xorshift128+ for fast, high-quality, deterministic randomness.
//! Given the same seed, produces the identical spawn stream on all
//! platforms, which is what makes a mirrored multiplayer session agree
//! with the authority byte for byte.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use super::fixed::{
    Fixed, FIXED_ONE,
    SPAWN_HEIGHT_MIN, SPAWN_HEIGHT_MAX,
};
use super::vec3::FixedVec3;

/// Deterministic PRNG using Xorshift128+.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG produces the exact same sequence of
/// random numbers on any platform.
///
/// # Example
///
/// ```
/// use coindash::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // State must never be all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random u32.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random Fixed in range [0, max).
    #[inline]
    pub fn next_fixed(&mut self, max: Fixed) -> Fixed {
        if max <= 0 {
            return 0;
        }
        // Use upper 32 bits to avoid overflow in multiplication
        let raw = (self.next_u64() >> 32) as u32;
        ((raw as i64 * max as i64) >> 32) as Fixed
    }

    /// Generate a random Fixed in range [min, max).
    #[inline]
    pub fn next_fixed_range(&mut self, min: Fixed, max: Fixed) -> Fixed {
        if min >= max {
            return min;
        }
        let range = max.wrapping_sub(min);
        min.wrapping_add(self.next_fixed(range))
    }

    /// Generate a random boolean with given probability.
    ///
    /// probability is in range [0, FIXED_ONE] where FIXED_ONE = 100%
    #[inline]
    pub fn next_bool(&mut self, probability: Fixed) -> bool {
        self.next_fixed(FIXED_ONE) < probability
    }

    /// Pick an index according to a weight table.
    ///
    /// Zero-weight entries are never picked. An all-zero table returns 0.
    pub fn weighted_index(&mut self, weights: &[u32]) -> usize {
        let total: u64 = weights.iter().map(|w| *w as u64).sum();
        if total == 0 {
            return 0;
        }
        let mut roll = self.next_u64() % total;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w as u64 {
                return i;
            }
            roll -= *w as u64;
        }
        weights.len() - 1
    }

    /// Generate a random unit direction on the ground plane (XZ).
    ///
    /// Rejection sampling keeps only vectors in the annulus between
    /// radius 0.5 and 1.0: the angle stays uniform, and the fixed-point
    /// normalize operates in the range where its sqrt has converged.
    pub fn random_ground_direction(&mut self) -> FixedVec3 {
        // 0.25 and 1.0 as squared-length bounds
        const MIN_LEN_SQ: Fixed = FIXED_ONE / 4;

        loop {
            let x = self.next_fixed_range(-FIXED_ONE, FIXED_ONE);
            let z = self.next_fixed_range(-FIXED_ONE, FIXED_ONE);
            let vec = FixedVec3::new(x, 0, z);

            let len_sq = vec.length_squared();
            if len_sq >= MIN_LEN_SQ && len_sq <= FIXED_ONE {
                return vec.normalize();
            }
        }
    }

    /// Generate a spawn position in a horizontal ring around an anchor.
    ///
    /// Distance is uniform in [min_dist, max_dist) on the ground plane;
    /// height is uniform in the spawn height range. The result is clamped
    /// into world bounds.
    pub fn position_in_band(
        &mut self,
        anchor: FixedVec3,
        min_dist: Fixed,
        max_dist: Fixed,
    ) -> FixedVec3 {
        let dir = self.random_ground_direction();
        let dist = self.next_fixed_range(min_dist, max_dist);
        let height = self.next_fixed_range(SPAWN_HEIGHT_MIN, SPAWN_HEIGHT_MAX);

        let offset = dir.scale(dist);
        FixedVec3::new(
            anchor.x.wrapping_add(offset.x),
            height,
            anchor.z.wrapping_add(offset.z),
        )
        .clamp_to_world()
    }

    /// Shuffle a slice in place using Fisher-Yates.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_int((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let idx = self.next_int(slice.len() as u32) as usize;
            Some(&slice[idx])
        }
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a session seed from host-verifiable parameters.
///
/// The seed:
/// 1. Cannot be predicted before the host entropy is known
/// 2. Cannot be manipulated by any single participant
/// 3. Is recomputable after the session for replay verification
///
/// # Parameters
///
/// - `host_entropy`: 32 bytes of host-supplied entropy
/// - `session_id`: unique session identifier
/// - `player_ids`: all participant ids (MUST be sorted for determinism)
pub fn derive_session_seed(
    host_entropy: &[u8; 32],
    session_id: &[u8; 16],
    player_ids: &[[u8; 16]],
) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"COINDASH_SEED_V1");

    hasher.update(host_entropy);
    hasher.update(session_id);

    // IMPORTANT: caller must ensure player_ids is sorted!
    for pid in player_ids {
        hasher.update(pid);
    }

    let hash = hasher.finalize();

    u64::from_le_bytes(hash[0..8].try_into().unwrap())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, fixed_sqrt, BAND_NEAR_MIN, BAND_NEAR_MAX};

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        // Very unlikely to match
        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_rng_known_values() {
        // Regression guard: if these change, recorded sessions replay wrong.
        let mut rng = DeterministicRng::new(42);
        assert_eq!(rng.next_u64(), 16629283624882167704);
        assert_eq!(rng.next_u64(), 1420492921613871959);
        assert_eq!(rng.next_u64(), 9768315062676884790);
    }

    #[test]
    fn test_next_int() {
        let mut rng = DeterministicRng::new(1234);

        for _ in 0..1000 {
            assert!(rng.next_int(100) < 100);
        }

        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_next_fixed() {
        let mut rng = DeterministicRng::new(9999);

        let max = to_fixed(100.0);
        for _ in 0..1000 {
            let val = rng.next_fixed(max);
            assert!(val >= 0 && val < max);
        }
    }

    #[test]
    fn test_weighted_index() {
        let mut rng = DeterministicRng::new(777);

        // Zero-weight entries are never picked
        let weights = [0, 10, 0, 30];
        for _ in 0..500 {
            let idx = rng.weighted_index(&weights);
            assert!(idx == 1 || idx == 3);
        }

        // All-zero table falls back to 0
        assert_eq!(rng.weighted_index(&[0, 0, 0]), 0);

        // Single entry
        assert_eq!(rng.weighted_index(&[5]), 0);
    }

    #[test]
    fn test_position_in_band() {
        let mut rng = DeterministicRng::new(7777);
        let anchor = FixedVec3::ZERO;

        for _ in 0..200 {
            let pos = rng.position_in_band(anchor, BAND_NEAR_MIN, BAND_NEAR_MAX);
            assert!(pos.is_in_world());

            let dist = fixed_sqrt(pos.horizontal_distance_squared(anchor));
            // Normalization error allows a little slack on both edges.
            assert!(dist >= BAND_NEAR_MIN - 2000, "too close: {dist}");
            assert!(dist <= BAND_NEAR_MAX + 2000, "too far: {dist}");
        }
    }

    #[test]
    fn test_shuffle_determinism() {
        let mut rng1 = DeterministicRng::new(1111);
        let mut rng2 = DeterministicRng::new(1111);

        let mut arr1 = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let mut arr2 = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        rng1.shuffle(&mut arr1);
        rng2.shuffle(&mut arr2);

        assert_eq!(arr1, arr2);
    }

    #[test]
    fn test_derive_session_seed() {
        let entropy = [0u8; 32];
        let session_id = [1u8; 16];
        let player_ids = [[2u8; 16], [3u8; 16]];

        let seed1 = derive_session_seed(&entropy, &session_id, &player_ids);
        let seed2 = derive_session_seed(&entropy, &session_id, &player_ids);
        assert_eq!(seed1, seed2);

        let different_session = [99u8; 16];
        let seed3 = derive_session_seed(&entropy, &different_session, &player_ids);
        assert_ne!(seed1, seed3);
    }

    #[test]
    fn test_state_checkpoint() {
        let mut rng = DeterministicRng::new(5555);

        for _ in 0..50 {
            rng.next_u64();
        }

        let saved_state = rng.state();
        let next_values: Vec<u64> = (0..10).map(|_| rng.next_u64()).collect();

        rng.set_state(saved_state);
        for expected in next_values {
            assert_eq!(rng.next_u64(), expected);
        }
    }
}
