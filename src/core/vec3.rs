//! Fixed-Point 3D Vector
//!
//! Deterministic 3D vector operations for entity placement.
//! All operations use fixed-point arithmetic. The Y axis is height above
//! the ground plane; placement distances are measured on the XZ plane.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::{
    Fixed, FIXED_SCALE,
    fixed_mul, fixed_div, fixed_sqrt, fixed_clamp,
    WORLD_HALF_EXTENT,
};

/// 3D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec3 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component, height above ground (Q16.16 fixed-point)
    pub y: Fixed,
    /// Z component (Q16.16 fixed-point)
    pub z: Fixed,
}

impl FixedVec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
            z: z << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
            z: self.z.wrapping_add(other.z),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
            z: self.z.wrapping_sub(other.z),
        }
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
            z: fixed_mul(self.z, scalar),
        }
    }

    /// Squared length (avoids sqrt - prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> Fixed {
        fixed_mul(self.x, self.x)
            .wrapping_add(fixed_mul(self.y, self.y))
            .wrapping_add(fixed_mul(self.z, self.z))
    }

    /// Length (magnitude). Prefer `length_squared` when possible.
    #[inline]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.length_squared())
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> Fixed {
        self.sub(other).length_squared()
    }

    /// Squared distance on the ground plane only, ignoring height.
    ///
    /// Placement bands are horizontal rings, so reachability checks use
    /// this instead of the full 3D distance.
    #[inline]
    pub fn horizontal_distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.wrapping_sub(other.x);
        let dz = self.z.wrapping_sub(other.z);
        fixed_mul(dx, dx).wrapping_add(fixed_mul(dz, dz))
    }

    /// Normalize to unit length. Returns ZERO for the zero vector.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0 {
            return Self::ZERO;
        }
        Self {
            x: fixed_div(self.x, len),
            y: fixed_div(self.y, len),
            z: fixed_div(self.z, len),
        }
    }

    /// Clamp X and Z into world bounds. Height is left untouched.
    pub fn clamp_to_world(self) -> Self {
        Self {
            x: fixed_clamp(self.x, -WORLD_HALF_EXTENT, WORLD_HALF_EXTENT),
            y: self.y,
            z: fixed_clamp(self.z, -WORLD_HALF_EXTENT, WORLD_HALF_EXTENT),
        }
    }

    /// Check whether X and Z are within world bounds.
    pub fn is_in_world(self) -> bool {
        self.x >= -WORLD_HALF_EXTENT
            && self.x <= WORLD_HALF_EXTENT
            && self.z >= -WORLD_HALF_EXTENT
            && self.z <= WORLD_HALF_EXTENT
    }

    /// Convert to floats for display/logging only.
    pub fn to_floats(self) -> (f32, f32, f32) {
        (
            super::fixed::to_float(self.x),
            super::fixed::to_float(self.y),
            super::fixed::to_float(self.z),
        )
    }
}

impl fmt::Debug for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_floats();
        write!(f, "Vec3({x:.3}, {y:.3}, {z:.3})")
    }
}

impl fmt::Display for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_floats();
        write!(f, "({x:.2}, {y:.2}, {z:.2})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{FIXED_ONE, to_fixed};

    #[test]
    fn test_basic_ops() {
        let a = FixedVec3::from_ints(1, 2, 3);
        let b = FixedVec3::from_ints(4, 5, 6);

        let sum = a.add(b);
        assert_eq!(sum, FixedVec3::from_ints(5, 7, 9));

        let diff = b.sub(a);
        assert_eq!(diff, FixedVec3::from_ints(3, 3, 3));
    }

    #[test]
    fn test_scale() {
        let v = FixedVec3::from_ints(2, 4, 6);
        let half = v.scale(to_fixed(0.5));
        assert_eq!(half, FixedVec3::from_ints(1, 2, 3));
    }

    #[test]
    fn test_length() {
        // 3-4-0 triangle on the ground plane
        let v = FixedVec3::from_ints(3, 0, 4);
        let len = v.length();
        assert!((len - to_fixed(5.0)).abs() < 200, "length should be ~5.0");
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = FixedVec3::new(0, to_fixed(10.0), 0);
        let b = FixedVec3::new(to_fixed(3.0), 0, to_fixed(4.0));

        // Full 3D distance includes the 10-unit height difference.
        assert!(a.distance_squared(b) > a.horizontal_distance_squared(b));
        // Horizontal: 3^2 + 4^2 = 25
        let h = a.horizontal_distance_squared(b);
        assert!((h - to_fixed(25.0)).abs() < 2000);
    }

    #[test]
    fn test_normalize() {
        let v = FixedVec3::new(to_fixed(3.0), 0, to_fixed(4.0));
        let n = v.normalize();
        let len = n.length();
        assert!((len - FIXED_ONE).abs() < 600, "normalized length should be ~1.0");

        assert_eq!(FixedVec3::ZERO.normalize(), FixedVec3::ZERO);
    }

    #[test]
    fn test_world_bounds() {
        let inside = FixedVec3::from_ints(5, 1, -5);
        assert!(inside.is_in_world());

        let outside = FixedVec3::from_ints(100, 1, 0);
        assert!(!outside.is_in_world());
        assert!(outside.clamp_to_world().is_in_world());
    }
}
