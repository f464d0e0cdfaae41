use approx::assert_abs_diff_eq;
use keyscene_core::{
    interp::functions::quat_norm, sample_track, PropertyKind, SampledValue, Track,
};

fn approx3(a: [f32; 3], b: [f32; 3]) {
    for i in 0..3 {
        assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-5);
    }
}

fn vec3(v: SampledValue) -> [f32; 3] {
    v.as_vec3().expect("vec3 sample")
}

/// it should interpolate vector keyframes linearly
#[test]
fn position_midpoint_is_linear() {
    let track = Track::new(
        PropertyKind::Position,
        vec![0.0, 2.0],
        vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0],
    )
    .unwrap();
    approx3(vec3(sample_track(&track, 1.0)), [5.0, 0.0, 0.0]);
    approx3(vec3(sample_track(&track, 0.5)), [2.5, 0.0, 0.0]);
}

/// it should clamp queries outside the keyframe range instead of extrapolating
#[test]
fn clamps_to_first_and_last_keyframe() {
    let track = Track::new(
        PropertyKind::Scale,
        vec![1.0, 3.0],
        vec![1.0, 1.0, 1.0, 3.0, 3.0, 3.0],
    )
    .unwrap();
    approx3(vec3(sample_track(&track, -5.0)), [1.0; 3]);
    approx3(vec3(sample_track(&track, 99.0)), [3.0; 3]);
    approx3(vec3(sample_track(&track, f32::NAN)), [1.0; 3]);
}

/// it should return unit quaternions for rotation tracks, even with unnormalized keys
#[test]
fn quaternion_samples_are_unit_length() {
    let h = std::f32::consts::FRAC_1_SQRT_2;
    let track = Track::new(
        PropertyKind::Quaternion,
        vec![0.0, 1.0],
        vec![0.0, 0.0, 0.0, 2.0, 0.0, h, 0.0, h],
    )
    .unwrap();
    for t in [0.0, 0.1, 0.3, 0.5, 0.77, 1.0] {
        let q = sample_track(&track, t).as_quat().expect("quat sample");
        assert_abs_diff_eq!(quat_norm(q), 1.0, epsilon = 1e-5);
    }
    let start = sample_track(&track, 0.0).as_quat().unwrap();
    assert_abs_diff_eq!(start[3], 1.0, epsilon = 1e-6);
}

/// it should sample empty tracks to the kind's neutral value
#[test]
fn empty_tracks_are_neutral() {
    assert_eq!(
        sample_track(&Track::empty(PropertyKind::Scale), 1.0),
        SampledValue::Vec3([0.0; 3])
    );
    assert_eq!(
        sample_track(&Track::empty(PropertyKind::Quaternion), 1.0),
        SampledValue::Quat([0.0, 0.0, 0.0, 1.0])
    );
    assert_eq!(
        sample_track(&Track::empty(PropertyKind::Scalar), 1.0),
        SampledValue::Scalar(0.0)
    );
}

/// it should hold the only keyframe of a single-key track
#[test]
fn single_keyframe_is_constant() {
    let track = Track::new(PropertyKind::Scalar, vec![2.0], vec![45.0]).unwrap();
    assert_eq!(sample_track(&track, 0.0), SampledValue::Scalar(45.0));
    assert_eq!(sample_track(&track, 10.0), SampledValue::Scalar(45.0));
}

/// it should resolve a repeated breakpoint to the lower segment
#[test]
fn duplicate_breakpoint_is_a_step() {
    let track = Track::new(
        PropertyKind::Scalar,
        vec![0.0, 1.0, 1.0, 2.0],
        vec![0.0, 1.0, 5.0, 6.0],
    )
    .unwrap();
    assert_eq!(sample_track(&track, 1.0), SampledValue::Scalar(1.0));
    let after = sample_track(&track, 1.5).as_scalar().unwrap();
    assert_abs_diff_eq!(after, 5.5, epsilon = 1e-6);
}

/// it should produce bit-identical output for identical input
#[test]
fn sampling_is_deterministic() {
    let track = Track::new(
        PropertyKind::Quaternion,
        vec![0.0, 0.7, 1.9],
        vec![0.0, 0.0, 0.0, 1.0, 0.3, 0.1, 0.0, 0.9, 0.0, 0.8, 0.2, 0.5],
    )
    .unwrap();
    for t in [0.0, 0.33, 0.7, 1.21, 1.9, 4.0] {
        let a = sample_track(&track, t).as_quat().unwrap();
        let b = sample_track(&track, t).as_quat().unwrap();
        assert_eq!(a.map(f32::to_bits), b.map(f32::to_bits));
    }
}
