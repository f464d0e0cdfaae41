//! Interpolation helpers and easing curves.
//!
//! Vectors and scalars blend linearly; rotations use spherical linear
//! interpolation on unit quaternions.

pub mod functions;

use serde::{Deserialize, Serialize};

/// Monotonic easing curve mapping `[0, 1]` onto `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// `4t³` below one half, `1 - (-2t + 2)³ / 2` above.
    #[default]
    CubicInOut,
}

impl Easing {
    /// Apply the curve. Input is clamped to `[0, 1]`.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => functions::ease_cubic_in_out(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_in_out_endpoints_and_midpoint() {
        assert_eq!(Easing::CubicInOut.apply(0.0), 0.0);
        assert_eq!(Easing::CubicInOut.apply(1.0), 1.0);
        assert!((Easing::CubicInOut.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::CubicInOut.apply(0.25) - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn easing_clamps_input() {
        assert_eq!(Easing::Linear.apply(-3.0), 0.0);
        assert_eq!(Easing::Linear.apply(7.0), 1.0);
        assert_eq!(Easing::CubicInOut.apply(f32::NAN), 0.0);
    }
}
