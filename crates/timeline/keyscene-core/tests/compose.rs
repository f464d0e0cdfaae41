use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

use approx::assert_abs_diff_eq;
use keyscene_core::{
    compose, interp::functions::quat_norm, BaseTransform, Config, EndAdjustment, Rotation,
    TransformSnapshot,
};

const QUARTER_TURN_Y: [f32; 4] = [0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2];

fn approx3(a: [f32; 3], b: [f32; 3]) {
    for i in 0..3 {
        assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-5);
    }
}

fn approx4(a: [f32; 4], b: [f32; 4]) {
    for i in 0..4 {
        assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-5);
    }
}

fn quat(s: &TransformSnapshot) -> [f32; 4] {
    s.rotation.to_quat()
}

fn base() -> BaseTransform {
    BaseTransform {
        position: [0.0, 1.0, 0.0],
        rotation: QUARTER_TURN_Y,
        scale: [2.0; 3],
        scalar: Some(50.0),
    }
}

/// it should return the base transform for a neutral delta
#[test]
fn identity_delta_keeps_base() {
    let out = compose(
        &base(),
        &TransformSnapshot::IDENTITY,
        0.0,
        None,
        &Config::default(),
    );
    approx3(out.position, [0.0, 1.0, 0.0]);
    approx4(quat(&out), QUARTER_TURN_Y);
    approx3(out.scale, [2.0; 3]);
    assert_eq!(out.scalar, Some(50.0));
}

/// it should add positions, multiply rotations and scales
#[test]
fn composes_each_channel() {
    let animated = TransformSnapshot {
        position: [1.0, 0.0, -1.0],
        rotation: Rotation::Quat(QUARTER_TURN_Y),
        scale: [1.0, 1.5, 1.0],
        scalar: Some(40.0),
    };
    let out = compose(&base(), &animated, 0.0, None, &Config::default());
    approx3(out.position, [1.0, 1.0, -1.0]);
    // Two quarter turns about Y make a half turn.
    approx4(quat(&out), [0.0, 1.0, 0.0, 0.0]);
    approx3(out.scale, [2.0, 3.0, 2.0]);
    assert_eq!(out.scalar, Some(40.0));
}

/// it should convert Euler deltas before composing and keep rotations unit length
#[test]
fn euler_delta_is_converted() {
    let animated = TransformSnapshot {
        rotation: Rotation::Euler([0.0, FRAC_PI_2, 0.0]),
        ..TransformSnapshot::IDENTITY
    };
    let out = compose(
        &BaseTransform::IDENTITY,
        &animated,
        0.0,
        None,
        &Config::default(),
    );
    approx4(quat(&out), QUARTER_TURN_Y);
    assert_abs_diff_eq!(quat_norm(quat(&out)), 1.0, epsilon = 1e-6);
}

/// it should ignore the end factor for objects without an end adjustment
#[test]
fn end_factor_needs_adjustment() {
    let out = compose(
        &base(),
        &TransformSnapshot::IDENTITY,
        1.0,
        None,
        &Config::default(),
    );
    approx3(out.scale, [2.0; 3]);
}

/// it should scale up by 1 + factor * K inside the end window
#[test]
fn end_adjustment_scales_up() {
    let adj = EndAdjustment::default();
    let cfg = Config::default();

    let full = compose(&base(), &TransformSnapshot::IDENTITY, 1.0, Some(&adj), &cfg);
    approx3(full.scale, [2.0 * 1.15; 3]);

    let half = compose(&base(), &TransformSnapshot::IDENTITY, 0.5, Some(&adj), &cfg);
    approx3(half.scale, [2.0 * 1.075; 3]);

    let none = compose(&base(), &TransformSnapshot::IDENTITY, 0.0, Some(&adj), &cfg);
    approx3(none.scale, [2.0; 3]);

    let custom = EndAdjustment {
        scale_gain: Some(1.0),
        ..EndAdjustment::default()
    };
    let out = compose(&base(), &TransformSnapshot::IDENTITY, 1.0, Some(&custom), &cfg);
    approx3(out.scale, [4.0; 3]);
}

/// it should pull the scalar toward its end target and blend in the aim rotation
#[test]
fn end_adjustment_scalar_and_aim() {
    let adj = EndAdjustment {
        scale_up: false,
        scalar_target: Some(35.0),
        aim: Some(QUARTER_TURN_Y),
        ..EndAdjustment::default()
    };
    let cfg = Config::default();
    let start = BaseTransform {
        rotation: [0.0, 0.0, 0.0, 1.0],
        ..base()
    };

    let half = compose(&start, &TransformSnapshot::IDENTITY, 0.5, Some(&adj), &cfg);
    assert_abs_diff_eq!(half.scalar.unwrap(), 42.5, epsilon = 1e-4);
    approx3(half.scale, [2.0; 3]);

    let full = compose(&start, &TransformSnapshot::IDENTITY, 1.0, Some(&adj), &cfg);
    assert_abs_diff_eq!(full.scalar.unwrap(), 35.0, epsilon = 1e-4);
    approx4(quat(&full), QUARTER_TURN_Y);
}
