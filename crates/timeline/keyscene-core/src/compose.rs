//! Transform composition: static base transform combined with the sampled
//! animated delta.
//!
//! - position: `base + animated`
//! - rotation: `normalize(base * animated)`; Euler input is converted first
//! - scale: `base ⊙ animated`, then `* (1 + factor * K)` inside the end window
//! - scalar: animated value (or the base scalar), optionally pulled toward an
//!   end target
//!
//! Scale is always multiplicative: a missing scale track means `(1, 1, 1)`.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::interp::functions::{
    add_vec3, euler_to_quat, lerp_f32, mul_quat, mul_vec3, normalize_quat, slerp_quat,
};
use crate::value::IDENTITY_QUAT;

/// Rotation tagged by representation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),
    /// Euler angles in radians, intrinsic XYZ order.
    Euler([f32; 3]),
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation::Quat(IDENTITY_QUAT);

    /// Unit quaternion for this rotation.
    pub fn to_quat(self) -> [f32; 4] {
        match self {
            Rotation::Quat(q) => normalize_quat(q),
            Rotation::Euler(e) => euler_to_quat(e),
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::IDENTITY
    }
}

/// Fully resolved position/rotation/scale(/scalar) at one instant.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformSnapshot {
    pub position: [f32; 3],
    pub rotation: Rotation,
    pub scale: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<f32>,
}

impl TransformSnapshot {
    /// Neutral animated delta: no offset, no rotation, unit scale.
    pub const IDENTITY: TransformSnapshot = TransformSnapshot {
        position: [0.0; 3],
        rotation: Rotation::IDENTITY,
        scale: [1.0; 3],
        scalar: None,
    };
}

impl Default for TransformSnapshot {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-object static transform authored once at setup.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseTransform {
    pub position: [f32; 3],
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Base value for the scalar channel (camera field of view).
    #[serde(default)]
    pub scalar: Option<f32>,
}

impl BaseTransform {
    pub const IDENTITY: BaseTransform = BaseTransform {
        position: [0.0; 3],
        rotation: IDENTITY_QUAT,
        scale: [1.0; 3],
        scalar: None,
    };

    /// The base transform as a snapshot, used when no animation applies.
    pub fn to_snapshot(&self) -> TransformSnapshot {
        TransformSnapshot {
            position: self.position,
            rotation: Rotation::Quat(normalize_quat(self.rotation)),
            scale: self.scale,
            scalar: self.scalar,
        }
    }
}

impl Default for BaseTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Object-specific emphasis layered on during the end window.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndAdjustment {
    /// Apply the uniform scale-up.
    pub scale_up: bool,
    /// Overrides the configured enlargement constant.
    pub scale_gain: Option<f32>,
    /// Scalar channel is pulled toward this value as the factor reaches 1.
    pub scalar_target: Option<f32>,
    /// Extra rotation (x, y, z, w) blended in by the factor, e.g. a camera re-aim.
    pub aim: Option<[f32; 4]>,
}

impl Default for EndAdjustment {
    fn default() -> Self {
        Self {
            scale_up: true,
            scale_gain: None,
            scalar_target: None,
            aim: None,
        }
    }
}

/// Combine `base` with the `animated` delta into a world transform.
///
/// `end_factor` is the end-window smoothing factor in `[0, 1]`; it only has an
/// effect for objects with an [`EndAdjustment`].
pub fn compose(
    base: &BaseTransform,
    animated: &TransformSnapshot,
    end_factor: f32,
    adjustment: Option<&EndAdjustment>,
    config: &Config,
) -> TransformSnapshot {
    let position = add_vec3(base.position, animated.position);
    let mut rotation = mul_quat(base.rotation, animated.rotation.to_quat());
    let mut scale = mul_vec3(base.scale, animated.scale);
    let mut scalar = animated.scalar.or(base.scalar);

    if let Some(adj) = adjustment.filter(|_| end_factor > 0.0) {
        if adj.scale_up {
            let k = adj.scale_gain.unwrap_or(config.end_scale_gain);
            let s = 1.0 + end_factor * k;
            scale = [scale[0] * s, scale[1] * s, scale[2] * s];
        }
        if let (Some(target), Some(current)) = (adj.scalar_target, scalar) {
            scalar = Some(lerp_f32(current, target, end_factor));
        }
        if let Some(aim) = adj.aim {
            let aimed = mul_quat(rotation, aim);
            rotation = slerp_quat(rotation, aimed, end_factor);
        }
    }

    TransformSnapshot {
        position,
        rotation: Rotation::Quat(rotation),
        scale,
        scalar,
    }
}
