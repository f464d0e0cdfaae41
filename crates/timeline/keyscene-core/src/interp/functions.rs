//! Interpolation primitives:
//! - lerp_f32 / lerp_vec3 (component-wise)
//! - slerp_quat (shortest arc, renormalized)
//! - quaternion product and Euler conversion
//! - cubic ease-in-out

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::value::IDENTITY_QUAT;

const SLERP_EPSILON: f32 = 1.0e-6;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
pub fn add_vec3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn mul_vec3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2]]
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
pub fn quat_norm(q: [f32; 4]) -> f32 {
    dot4(q, q).sqrt()
}

/// Normalize (x,y,z,w); degenerate input becomes identity.
#[inline]
pub fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 && len2.is_finite() {
        let inv_len = len2.sqrt().recip();
        [q[0] * inv_len, q[1] * inv_len, q[2] * inv_len, q[3] * inv_len]
    } else {
        IDENTITY_QUAT
    }
}

#[inline]
fn to_unit(q: [f32; 4]) -> UnitQuaternion<f32> {
    let q = normalize_quat(q);
    UnitQuaternion::new_unchecked(Quaternion::new(q[3], q[0], q[1], q[2]))
}

#[inline]
fn from_unit(q: &UnitQuaternion<f32>) -> [f32; 4] {
    normalize_quat([q.i, q.j, q.k, q.w])
}

/// Quaternion NLERP with shortest-arc correction, used when SLERP degenerates.
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize_quat([
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ])
}

/// Spherical linear interpolation between two quaternions (x,y,z,w).
/// Takes the shortest arc; the result is unit length.
pub fn slerp_quat(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let qa = to_unit(a);
    let qb = to_unit(b);
    match qa.try_slerp(&qb, t, SLERP_EPSILON) {
        Some(q) => from_unit(&q),
        None => nlerp_quat(from_unit(&qa), from_unit(&qb), t),
    }
}

/// Hamilton product `a * b`, renormalized.
pub fn mul_quat(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    from_unit(&(to_unit(a) * to_unit(b)))
}

/// Euler angles (radians) applied in intrinsic X, Y, Z order.
pub fn euler_to_quat(e: [f32; 3]) -> [f32; 4] {
    let qx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), e[0]);
    let qy = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), e[1]);
    let qz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), e[2]);
    from_unit(&(qx * qy * qz))
}

/// Cubic ease-in-out on `t ∈ [0, 1]`.
#[inline]
pub fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}
