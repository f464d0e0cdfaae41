//! Track sampling at arbitrary times.
//!
//! Model:
//! - Query time is clamped to `[times[0], times[last]]`; nothing extrapolates.
//! - The bracketing segment `[t_i, t_{i+1}]` is found by binary search. A time
//!   sitting on a breakpoint shared by two segments picks the lower segment.
//! - Arity 3 and 1 blend linearly; arity 4 blends with SLERP and is renormalized.
//! - Empty tracks return the kind's neutral value.
//!
//! `sample_track` is pure: identical inputs give bit-identical output.

use crate::data::Track;
use crate::interp::functions::{lerp_f32, lerp_vec3, normalize_quat, slerp_quat};
use crate::value::SampledValue;

/// Resolved position of a query inside a track.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Segment {
    /// Return keyframe `i` as-is.
    Key(usize),
    /// Blend keyframes `i` and `i + 1` by `factor`.
    Between(usize, f32),
}

/// Find the segment containing `time`. `times` must be non-empty.
/// Edge cases:
/// - at or before the first key: Between(0, 0) or Key(0) for a single key
/// - at or beyond the last key: Key(last)
fn find_segment(times: &[f32], time: f32) -> Segment {
    let n = times.len();
    let last = n - 1;
    if n == 1 {
        return Segment::Key(0);
    }
    let (first_t, last_t) = (times[0], times[last]);
    let t = if time.is_nan() {
        first_t
    } else {
        time.clamp(first_t, last_t)
    };
    if t >= last_t {
        return Segment::Key(last);
    }
    // First index whose time is >= t; the segment ends there.
    let j = times.partition_point(|&x| x < t);
    segment_between(times, j.saturating_sub(1), t)
}

#[inline]
fn segment_between(times: &[f32], i: usize, t: f32) -> Segment {
    let t0 = times[i];
    let t1 = times[i + 1];
    let denom = t1 - t0;
    let factor = if denom > 0.0 {
        ((t - t0) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if factor >= 1.0 {
        Segment::Key(i + 1)
    } else {
        Segment::Between(i, factor)
    }
}

#[inline]
fn vec3_at(track: &Track, i: usize) -> [f32; 3] {
    let k = track.keyframe(i);
    [k[0], k[1], k[2]]
}

#[inline]
fn quat_at(track: &Track, i: usize) -> [f32; 4] {
    let k = track.keyframe(i);
    [k[0], k[1], k[2], k[3]]
}

fn key_value(track: &Track, i: usize) -> SampledValue {
    match track.arity() {
        4 => SampledValue::Quat(normalize_quat(quat_at(track, i))),
        3 => SampledValue::Vec3(vec3_at(track, i)),
        _ => SampledValue::Scalar(track.keyframe(i)[0]),
    }
}

/// Sample a single track at `time` (seconds).
pub fn sample_track(track: &Track, time: f32) -> SampledValue {
    if track.is_empty() {
        return track.kind().neutral();
    }
    match find_segment(track.times(), time) {
        Segment::Key(i) => key_value(track, i),
        Segment::Between(i, factor) => match track.arity() {
            4 => SampledValue::Quat(slerp_quat(
                quat_at(track, i),
                quat_at(track, i + 1),
                factor,
            )),
            3 => SampledValue::Vec3(lerp_vec3(vec3_at(track, i), vec3_at(track, i + 1), factor)),
            _ => SampledValue::Scalar(lerp_f32(
                track.keyframe(i)[0],
                track.keyframe(i + 1)[0],
                factor,
            )),
        },
    }
}
