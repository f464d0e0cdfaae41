//! Phase timeline: an ordered sequence of clip phases and synthetic blend
//! phases with a derived total duration.
//!
//! Durations are resolved once at build time. A clip phase takes the longest
//! clip bound to its source; when that is zero (clip missing, empty or failed
//! to extract) the configured fallback duration is used instead and a
//! `FallbackDuration` warning is emitted.
//!
//! All query methods are pure.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::compose::{Rotation, TransformSnapshot};
use crate::config::Config;
use crate::data::{Clip, TrackSlot};
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::extract::ClipLibrary;
use crate::ids::ObjectId;
use crate::interp::functions::{lerp_f32, lerp_vec3, slerp_quat};
use crate::interp::Easing;
use crate::sampling::sample_track;
use crate::value::SampledValue;

/// Blend endpoints that refer to other blends are followed at most this deep.
const MAX_ENDPOINT_DEPTH: usize = 8;

/// Where a blend phase takes one of its endpoint snapshots from.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Fixed(TransformSnapshot),
    /// First frame of the phase at this index.
    PhaseStart(usize),
    /// Last frame of the phase at this index.
    PhaseEnd(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendEndpoints {
    pub start: SnapshotSource,
    pub end: SnapshotSource,
}

/// Phase driven by the clips extracted from one source.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPhase {
    pub name: String,
    pub source_id: String,
    /// Wrap phase-local time by each clip's own duration instead of clamping.
    pub looping: bool,
    /// Overrides `Config::fallback_clip_duration` for this phase.
    pub fallback_duration: Option<f32>,
}

impl ClipPhase {
    pub fn new(name: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_id: source_id.into(),
            looping: false,
            fallback_duration: None,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_fallback(mut self, duration: f32) -> Self {
        self.fallback_duration = Some(duration);
        self
    }
}

/// Synthetic phase easing each object between two snapshots.
///
/// Objects without explicit endpoints blend from the end of the previous
/// phase to the start of the next one.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendPhase {
    pub name: String,
    pub duration: f32,
    pub easing: Easing,
    pub endpoints: HashMap<ObjectId, BlendEndpoints>,
}

impl BlendPhase {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            easing: Easing::default(),
            endpoints: HashMap::new(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_endpoints(
        mut self,
        object: ObjectId,
        start: SnapshotSource,
        end: SnapshotSource,
    ) -> Self {
        self.endpoints.insert(object, BlendEndpoints { start, end });
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhaseSpec {
    Clip(ClipPhase),
    Blend(BlendPhase),
}

impl PhaseSpec {
    pub fn name(&self) -> &str {
        match self {
            PhaseSpec::Clip(p) => &p.name,
            PhaseSpec::Blend(p) => &p.name,
        }
    }
}

impl From<ClipPhase> for PhaseSpec {
    fn from(p: ClipPhase) -> Self {
        PhaseSpec::Clip(p)
    }
}

impl From<BlendPhase> for PhaseSpec {
    fn from(p: BlendPhase) -> Self {
        PhaseSpec::Blend(p)
    }
}

/// Which node of which source animates an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectBinding {
    pub object: ObjectId,
    pub source_id: String,
    pub node: String,
}

impl ObjectBinding {
    pub fn new(object: ObjectId, source_id: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            object,
            source_id: source_id.into(),
            node: node.into(),
        }
    }
}

/// Active phase for a global time.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseResolution {
    pub phase_index: usize,
    /// Seconds since the phase started. Past the end of the timeline this
    /// keeps growing inside the last phase.
    pub phase_local_time: f32,
    /// `phase_local_time / duration` clamped to `[0, 1]`; 1 for zero-length phases.
    pub progress: f32,
}

#[derive(Clone, Debug)]
struct ResolvedPhase {
    spec: PhaseSpec,
    start: f32,
    end: f32,
    used_fallback: bool,
    clips: HashMap<ObjectId, Arc<Clip>>,
}

impl ResolvedPhase {
    #[inline]
    fn duration(&self) -> f32 {
        self.end - self.start
    }
}

#[derive(Clone, Debug)]
pub struct Timeline {
    phases: Vec<ResolvedPhase>,
    total_duration: f32,
    end_window: f32,
    end_easing: Easing,
}

fn sanitize_duration(d: f32) -> f32 {
    if d.is_finite() && d > 0.0 {
        d
    } else {
        0.0
    }
}

/// Euclidean remainder of `a / b` in `[0, b)`.
fn wrap_time(a: f32, b: f32) -> f32 {
    if b <= 0.0 {
        return 0.0;
    }
    let m = a.rem_euclid(b);
    if m >= b {
        0.0
    } else {
        m
    }
}

/// Left limit of a looping clip at `local`: a whole number of cycles ends
/// on the last keyframe rather than wrapping back to the first.
fn edge_time(local: f32, period: f32) -> f32 {
    let m = wrap_time(local, period);
    if m == 0.0 && local > 0.0 {
        period.max(0.0)
    } else {
        m
    }
}

/// Sample every present track of `clip` at `local_time`.
///
/// Looping wraps by the clip's own duration; otherwise time is clamped.
/// Missing or empty tracks contribute the neutral delta.
pub fn sample_clip(clip: &Clip, local_time: f32, looping: bool) -> TransformSnapshot {
    let local_time = if local_time.is_nan() { 0.0 } else { local_time };
    let t = if looping && clip.duration > 0.0 {
        wrap_time(local_time, clip.duration)
    } else {
        local_time.clamp(0.0, clip.duration.max(0.0))
    };
    let sample = |slot: TrackSlot| {
        clip.track(slot)
            .filter(|track| !track.is_empty())
            .map(|track| sample_track(track, t))
    };

    let rotation = match sample(TrackSlot::Rotation) {
        Some(SampledValue::Quat(q)) => Rotation::Quat(q),
        Some(SampledValue::Vec3(e)) => Rotation::Euler(e),
        _ => Rotation::IDENTITY,
    };
    TransformSnapshot {
        position: sample(TrackSlot::Position)
            .and_then(|v| v.as_vec3())
            .unwrap_or([0.0; 3]),
        rotation,
        scale: sample(TrackSlot::Scale)
            .and_then(|v| v.as_vec3())
            .unwrap_or([1.0; 3]),
        scalar: sample(TrackSlot::Scalar).and_then(|v| v.as_scalar()),
    }
}

/// Blend two snapshots by an already-eased factor. Rotations use SLERP on
/// their quaternion forms.
pub fn blend_snapshots(
    a: &TransformSnapshot,
    b: &TransformSnapshot,
    t: f32,
) -> TransformSnapshot {
    let scalar = match (a.scalar, b.scalar) {
        (Some(x), Some(y)) => Some(lerp_f32(x, y, t)),
        (x, y) => x.or(y),
    };
    TransformSnapshot {
        position: lerp_vec3(a.position, b.position, t),
        rotation: Rotation::Quat(slerp_quat(a.rotation.to_quat(), b.rotation.to_quat(), t)),
        scale: lerp_vec3(a.scale, b.scale, t),
        scalar,
    }
}

impl Timeline {
    /// Resolve phase durations against the extracted clips.
    pub fn build(
        specs: Vec<PhaseSpec>,
        library: &ClipLibrary,
        bindings: &[ObjectBinding],
        config: &Config,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut phases = Vec::with_capacity(specs.len());
        let mut cursor = 0.0_f32;

        for (index, spec) in specs.into_iter().enumerate() {
            let mut clips = HashMap::new();
            let mut used_fallback = false;
            let duration = match &spec {
                PhaseSpec::Clip(phase) => {
                    for binding in bindings.iter().filter(|b| b.source_id == phase.source_id) {
                        match library.clip(&binding.source_id, &binding.node) {
                            Some(clip) if !clip.is_absent() => {
                                clips.insert(binding.object, Arc::clone(clip));
                            }
                            _ => diagnostics.push(DiagnosticEvent::MissingClip {
                                object: binding.object,
                                source_id: binding.source_id.clone(),
                                node: binding.node.clone(),
                            }),
                        }
                    }
                    let longest = clips.values().map(|c| c.duration).fold(0.0_f32, f32::max);
                    if longest > 0.0 {
                        longest
                    } else {
                        used_fallback = true;
                        let fallback = sanitize_duration(
                            phase
                                .fallback_duration
                                .unwrap_or(config.fallback_clip_duration),
                        );
                        diagnostics.push(DiagnosticEvent::FallbackDuration {
                            phase: phase.name.clone(),
                            index,
                            duration: fallback,
                        });
                        fallback
                    }
                }
                PhaseSpec::Blend(phase) => sanitize_duration(phase.duration),
            };

            let start = cursor;
            cursor += duration;
            phases.push(ResolvedPhase {
                spec,
                start,
                end: cursor,
                used_fallback,
                clips,
            });
        }

        log::debug!(
            "timeline built: {} phases, {:.3}s total",
            phases.len(),
            cursor
        );
        Self {
            phases,
            total_duration: cursor,
            end_window: sanitize_duration(config.end_window),
            end_easing: Easing::CubicInOut,
        }
    }

    /// Sum of all phase durations.
    #[inline]
    pub fn total_duration(&self) -> f32 {
        self.total_duration
    }

    #[inline]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn phase_spec(&self, index: usize) -> Option<&PhaseSpec> {
        self.phases.get(index).map(|p| &p.spec)
    }

    pub fn phase_start(&self, index: usize) -> Option<f32> {
        self.phases.get(index).map(|p| p.start)
    }

    pub fn phase_duration(&self, index: usize) -> Option<f32> {
        self.phases.get(index).map(ResolvedPhase::duration)
    }

    /// Whether the phase fell back to the configured duration.
    pub fn used_fallback(&self, index: usize) -> bool {
        self.phases.get(index).is_some_and(|p| p.used_fallback)
    }

    /// Clip bound to `object` for a clip phase.
    pub fn clip_for(&self, index: usize, object: ObjectId) -> Option<&Arc<Clip>> {
        self.phases.get(index)?.clips.get(&object)
    }

    /// Find the active phase: the first whose cumulative end lies strictly
    /// after `global_time`, or the last phase once the timeline is exhausted.
    /// Negative and NaN times resolve to the start.
    pub fn resolve_phase(&self, global_time: f32) -> Option<PhaseResolution> {
        let last = self.phases.len().checked_sub(1)?;
        let t = if global_time.is_nan() {
            0.0
        } else {
            global_time.max(0.0)
        };
        let phase_index = self
            .phases
            .iter()
            .position(|p| p.end > t)
            .unwrap_or(last);
        let phase = &self.phases[phase_index];
        let phase_local_time = t - phase.start;
        let duration = phase.duration();
        let progress = if duration > 0.0 {
            (phase_local_time / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Some(PhaseResolution {
            phase_index,
            phase_local_time,
            progress,
        })
    }

    /// Animated delta for `object` at `global_time`.
    pub fn sample_at(&self, object: ObjectId, global_time: f32) -> TransformSnapshot {
        match self.resolve_phase(global_time) {
            Some(r) => self.sample_phase(r.phase_index, object, r.phase_local_time),
            None => TransformSnapshot::IDENTITY,
        }
    }

    /// Animated delta for `object` inside one phase at phase-local time.
    pub fn sample_phase(
        &self,
        index: usize,
        object: ObjectId,
        local_time: f32,
    ) -> TransformSnapshot {
        let Some(phase) = self.phases.get(index) else {
            return TransformSnapshot::IDENTITY;
        };
        match &phase.spec {
            PhaseSpec::Clip(spec) => phase
                .clips
                .get(&object)
                .map(|clip| sample_clip(clip, local_time, spec.looping))
                .unwrap_or(TransformSnapshot::IDENTITY),
            PhaseSpec::Blend(spec) => {
                let duration = phase.duration();
                let progress = if duration > 0.0 {
                    (local_time / duration).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                let (start, end) = self.blend_endpoints(index, spec, object, 0);
                blend_snapshots(&start, &end, spec.easing.apply(progress))
            }
        }
    }

    /// End-window smoothing factor: 0 up to `total - W`, eased up to 1 at `total`.
    pub fn end_adjust_factor(&self, global_time: f32) -> f32 {
        let window = self.end_window;
        let total = self.total_duration;
        if window <= 0.0 || total <= 0.0 || global_time.is_nan() {
            return 0.0;
        }
        let start = total - window;
        if global_time <= start {
            0.0
        } else if global_time >= total {
            1.0
        } else {
            self.end_easing.apply((global_time - start) / window)
        }
    }

    fn blend_endpoints(
        &self,
        index: usize,
        spec: &BlendPhase,
        object: ObjectId,
        depth: usize,
    ) -> (TransformSnapshot, TransformSnapshot) {
        match spec.endpoints.get(&object) {
            Some(ep) => (
                self.endpoint_snapshot(&ep.start, object, depth),
                self.endpoint_snapshot(&ep.end, object, depth),
            ),
            None => {
                let start = match index.checked_sub(1) {
                    Some(prev) => self.phase_edge(prev, object, true, depth + 1),
                    None => TransformSnapshot::IDENTITY,
                };
                let end = if index + 1 < self.phases.len() {
                    self.phase_edge(index + 1, object, false, depth + 1)
                } else {
                    start
                };
                (start, end)
            }
        }
    }

    fn endpoint_snapshot(
        &self,
        source: &SnapshotSource,
        object: ObjectId,
        depth: usize,
    ) -> TransformSnapshot {
        match source {
            SnapshotSource::Fixed(snapshot) => *snapshot,
            SnapshotSource::PhaseStart(i) => self.phase_edge(*i, object, false, depth + 1),
            SnapshotSource::PhaseEnd(i) => self.phase_edge(*i, object, true, depth + 1),
        }
    }

    /// First or last frame of a phase, as the phase itself plays it. A
    /// looping clip shorter than its phase ends wherever its last cycle
    /// stops, not on its final keyframe.
    fn phase_edge(
        &self,
        index: usize,
        object: ObjectId,
        at_end: bool,
        depth: usize,
    ) -> TransformSnapshot {
        if depth > MAX_ENDPOINT_DEPTH {
            return TransformSnapshot::IDENTITY;
        }
        let Some(phase) = self.phases.get(index) else {
            return TransformSnapshot::IDENTITY;
        };
        match &phase.spec {
            PhaseSpec::Clip(spec) => match phase.clips.get(&object) {
                Some(clip) if at_end => {
                    let local = phase.duration();
                    let t = if spec.looping {
                        edge_time(local, clip.duration)
                    } else {
                        local
                    };
                    sample_clip(clip, t, false)
                }
                Some(clip) => sample_clip(clip, 0.0, spec.looping),
                None => TransformSnapshot::IDENTITY,
            },
            PhaseSpec::Blend(spec) => {
                let (start, end) = self.blend_endpoints(index, spec, object, depth);
                if at_end {
                    end
                } else {
                    start
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_time_keeps_whole_cycles_on_the_last_key() {
        assert_eq!(edge_time(3.0, 2.0), 1.0);
        assert_eq!(edge_time(4.0, 2.0), 2.0);
        assert_eq!(edge_time(7.0, 7.0), 7.0);
        assert_eq!(edge_time(0.0, 2.0), 0.0);
    }

    #[test]
    fn wrap_time_is_euclidean() {
        assert_eq!(wrap_time(7.5, 2.0), 1.5);
        assert_eq!(wrap_time(-0.5, 2.0), 1.5);
        assert_eq!(wrap_time(4.0, 2.0), 0.0);
        assert_eq!(wrap_time(1.0, 0.0), 0.0);
    }

    #[test]
    fn empty_timeline_resolves_to_none() {
        let tl = Timeline::build(
            Vec::new(),
            &ClipLibrary::new(),
            &[],
            &Config::default(),
            &mut Diagnostics::default(),
        );
        assert_eq!(tl.total_duration(), 0.0);
        assert!(tl.resolve_phase(1.0).is_none());
        assert_eq!(tl.sample_at(ObjectId(0), 1.0), TransformSnapshot::IDENTITY);
        assert_eq!(tl.end_adjust_factor(1.0), 0.0);
    }
}
