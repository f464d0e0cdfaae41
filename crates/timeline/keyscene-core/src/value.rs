//! Property kinds and sampled values.

use serde::{Deserialize, Serialize};

pub const IDENTITY_QUAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Animated property a track drives.
///
/// `Rotation` holds Euler angles (radians, XYZ order); `Quaternion` holds
/// `(x, y, z, w)` and fills the same rotation slot of a clip.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Position,
    Rotation,
    Scale,
    Quaternion,
    Scalar,
}

impl PropertyKind {
    /// Number of floats per keyframe.
    #[inline]
    pub fn arity(self) -> usize {
        match self {
            PropertyKind::Position | PropertyKind::Rotation | PropertyKind::Scale => 3,
            PropertyKind::Quaternion => 4,
            PropertyKind::Scalar => 1,
        }
    }

    /// Recognize a track-name property suffix (`"<node>.<suffix>"`).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "position" => Some(PropertyKind::Position),
            "rotation" => Some(PropertyKind::Rotation),
            "quaternion" => Some(PropertyKind::Quaternion),
            "scale" => Some(PropertyKind::Scale),
            "fov" | "field-of-view" | "fieldOfView" => Some(PropertyKind::Scalar),
            _ => None,
        }
    }

    /// Value an empty track of this kind samples to.
    ///
    /// Scale is treated as an offset here (zero); multiplicative composition
    /// substitutes `(1, 1, 1)` for a missing scale track.
    pub fn neutral(self) -> SampledValue {
        match self {
            PropertyKind::Position | PropertyKind::Rotation | PropertyKind::Scale => {
                SampledValue::Vec3([0.0; 3])
            }
            PropertyKind::Quaternion => SampledValue::Quat(IDENTITY_QUAT),
            PropertyKind::Scalar => SampledValue::Scalar(0.0),
        }
    }
}

/// Result of sampling one track.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum SampledValue {
    Vec3([f32; 3]),
    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),
    Scalar(f32),
}

impl SampledValue {
    #[inline]
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            SampledValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_quat(&self) -> Option<[f32; 4]> {
        match self {
            SampledValue::Quat(q) => Some(*q),
            _ => None,
        }
    }

    #[inline]
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            SampledValue::Scalar(s) => Some(*s),
            _ => None,
        }
    }
}
