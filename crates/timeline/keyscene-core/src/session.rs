//! Scene session: explicit owner of the clip library, timeline, playback
//! controller and per-object base transforms.
//!
//! Lifecycle: declare objects and phases, load sources, `initialize()`, then
//! drive with `tick(dt)` and the control surface.

use serde::{Deserialize, Serialize};

use crate::compose::{compose, BaseTransform, EndAdjustment, TransformSnapshot};
use crate::config::Config;
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::error::ConfigError;
use crate::extract::{CancelToken, ClipLibrary, ExtractionReport, SourceRequest};
use crate::ids::{IdAllocator, ObjectId};
use crate::outputs::{FrameOutputs, ObjectFrame};
use crate::playback::{sanitize_time, PlaybackController, PlaybackStatus, TimeSource};
use crate::scene::{PhaseConfig, SceneConfig, SnapshotSourceConfig};
use crate::source::{RawAnimationSet, SourceLoader};
use crate::timeline::{BlendPhase, ClipPhase, ObjectBinding, PhaseSpec, SnapshotSource, Timeline};

/// Node of one source that animates an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBinding {
    pub source_id: String,
    pub node: String,
}

/// Declaration of one tracked object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    pub base: BaseTransform,
    /// Follow the main clock modulo the total duration instead of holding
    /// the final pose.
    pub looping: bool,
    pub end_adjustment: Option<EndAdjustment>,
    pub bindings: Vec<SourceBinding>,
}

impl ObjectSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: BaseTransform::IDENTITY,
            looping: false,
            end_adjustment: None,
            bindings: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: BaseTransform) -> Self {
        self.base = base;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_end_adjustment(mut self, adjustment: EndAdjustment) -> Self {
        self.end_adjustment = Some(adjustment);
        self
    }

    pub fn bind(mut self, source_id: impl Into<String>, node: impl Into<String>) -> Self {
        self.bindings.push(SourceBinding {
            source_id: source_id.into(),
            node: node.into(),
        });
        self
    }
}

#[derive(Clone, Debug)]
struct SceneObject {
    id: ObjectId,
    spec: ObjectSpec,
}

#[derive(Debug)]
pub struct SceneSession {
    config: Config,
    ids: IdAllocator,
    objects: Vec<SceneObject>,
    phases: Vec<PhaseSpec>,
    library: ClipLibrary,
    timeline: Option<Timeline>,
    playback: PlaybackController,
    diagnostics: Diagnostics,
    outputs: FrameOutputs,
}

impl SceneSession {
    /// Create an empty session. The config is validated up front.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ids: IdAllocator::new(),
            objects: Vec::new(),
            phases: Vec::new(),
            library: ClipLibrary::new(),
            timeline: None,
            playback: PlaybackController::new(&config),
            diagnostics: Diagnostics::with_capacity(config.max_events),
            outputs: FrameOutputs::default(),
            config,
        })
    }

    /// Build a session (objects and phases, not yet loaded) from a scene
    /// description.
    pub fn from_scene_config(scene: SceneConfig) -> Result<Self, ConfigError> {
        scene.validate()?;
        let SceneConfig {
            config,
            objects,
            phases,
        } = scene;
        let mut session = Self::new(config)?;

        for obj in objects {
            let mut spec = ObjectSpec::new(obj.id)
                .with_base(obj.base.to_base())
                .looping(obj.looping);
            spec.end_adjustment = obj.end_adjustment;
            for source in obj.sources {
                spec = spec.bind(source, obj.node_name.clone());
            }
            session.add_object(spec);
        }

        let mut specs = Vec::with_capacity(phases.len());
        for phase in phases {
            let spec = match phase {
                PhaseConfig::Clip {
                    name,
                    source,
                    looping,
                    fallback_duration,
                } => {
                    let mut clip = ClipPhase::new(name, source).looping(looping);
                    clip.fallback_duration = fallback_duration;
                    PhaseSpec::Clip(clip)
                }
                PhaseConfig::Blend {
                    name,
                    duration,
                    easing,
                    endpoints,
                } => {
                    let mut blend = BlendPhase::new(name.clone(), duration).with_easing(easing);
                    for ep in endpoints {
                        let object = session.object_id(&ep.object).ok_or_else(|| {
                            ConfigError::UnknownObject {
                                phase: name.clone(),
                                object: ep.object.clone(),
                            }
                        })?;
                        blend = blend.with_endpoints(
                            object,
                            snapshot_source(&ep.start),
                            snapshot_source(&ep.end),
                        );
                    }
                    PhaseSpec::Blend(blend)
                }
            };
            specs.push(spec);
        }
        session.set_phases(specs);
        Ok(session)
    }

    /// Parse, validate and build a session from scene JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Self::from_scene_config(SceneConfig::from_json_str(s)?)
    }

    /// Register an object. Invalidates a previously built timeline.
    pub fn add_object(&mut self, spec: ObjectSpec) -> ObjectId {
        let id = self.ids.alloc_object();
        self.objects.push(SceneObject { id, spec });
        self.invalidate();
        id
    }

    /// Replace the phase list. Invalidates a previously built timeline.
    pub fn set_phases(&mut self, phases: Vec<PhaseSpec>) {
        self.phases = phases;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if self.timeline.take().is_some() {
            log::debug!("scene changed; timeline must be re-initialized");
        }
        self.playback.set_ready(false);
    }

    pub fn object_id(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|o| o.spec.name == name)
            .map(|o| o.id)
    }

    pub fn object_spec(&self, object: ObjectId) -> Option<&ObjectSpec> {
        self.object(object).map(|o| &o.spec)
    }

    fn object(&self, object: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == object)
    }

    /// Every (object, source, node) binding in declaration order.
    pub fn bindings(&self) -> Vec<ObjectBinding> {
        self.objects
            .iter()
            .flat_map(|o| {
                o.spec
                    .bindings
                    .iter()
                    .map(move |b| ObjectBinding::new(o.id, b.source_id.clone(), b.node.clone()))
            })
            .collect()
    }

    /// One request per source, listing the distinct nodes bound to it.
    pub fn source_requests(&self) -> Vec<SourceRequest> {
        let mut requests: Vec<SourceRequest> = Vec::new();
        for binding in self.bindings() {
            match requests.iter_mut().find(|r| r.source_id == binding.source_id) {
                Some(req) => {
                    if !req.nodes.contains(&binding.node) {
                        req.nodes.push(binding.node);
                    }
                }
                None => requests.push(SourceRequest::new(binding.source_id, vec![binding.node])),
            }
        }
        requests
    }

    /// Fetch and extract every bound source concurrently.
    pub fn load_sources<L>(&mut self, loader: &L, cancel: &CancelToken) -> ExtractionReport
    where
        L: SourceLoader + ?Sized,
    {
        let requests = self.source_requests();
        let report = self
            .library
            .load_sources(loader, &requests, cancel, &mut self.diagnostics);
        log::info!(
            "sources loaded: {} ok, {} cached, {} failed, {} cancelled",
            report.loaded.len(),
            report.cached.len(),
            report.failed.len(),
            report.cancelled.len()
        );
        report
    }

    /// Extract the bound nodes from an already-parsed set.
    pub fn insert_source(&mut self, set: &RawAnimationSet) {
        let nodes: Vec<String> = self
            .source_requests()
            .into_iter()
            .find(|r| r.source_id == set.source_id)
            .map(|r| r.nodes)
            .unwrap_or_default();
        self.library.insert_set(set, &nodes, &mut self.diagnostics);
    }

    /// Resolve phase durations and mark playback ready. Sources that failed
    /// or were never loaded leave their objects at the base transform.
    pub fn initialize(&mut self) {
        let bindings = self.bindings();
        let timeline = Timeline::build(
            self.phases.clone(),
            &self.library,
            &bindings,
            &self.config,
            &mut self.diagnostics,
        );
        log::info!(
            "session initialized: {} objects, {} phases, {:.3}s",
            self.objects.len(),
            timeline.phase_count(),
            timeline.total_duration()
        );
        self.timeline = Some(timeline);
        self.playback.set_ready(true);
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.playback.is_ready()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Start or resume. Returns false until `initialize()` has run.
    pub fn play(&mut self) -> bool {
        self.playback.play()
    }

    pub fn pause(&mut self) -> bool {
        self.playback.pause()
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    /// Returns the applied time.
    pub fn seek(&mut self, t: f32) -> f32 {
        let applied = self.playback.seek(t);
        if applied.to_bits() != t.to_bits() {
            self.diagnostics.push(DiagnosticEvent::TimeClamped {
                requested: t,
                applied,
            });
        }
        applied
    }

    /// Returns the applied speed.
    pub fn set_speed(&mut self, speed: f32) -> f32 {
        let applied = self.playback.set_speed(speed);
        if applied.to_bits() != speed.to_bits() {
            self.diagnostics.push(DiagnosticEvent::SpeedClamped {
                requested: speed,
                applied,
            });
        }
        applied
    }

    #[inline]
    pub fn current_time(&self) -> f32 {
        self.playback.current_time()
    }

    #[inline]
    pub fn status(&self) -> PlaybackStatus {
        self.playback.status()
    }

    /// Zero until initialized.
    pub fn total_duration(&self) -> f32 {
        self.timeline.as_ref().map_or(0.0, Timeline::total_duration)
    }

    pub fn progress(&self) -> f32 {
        self.playback.progress(self.total_duration())
    }

    /// Advance the clocks by `dt` seconds and compute every object's world
    /// transform. Pending diagnostics are moved into the outputs.
    pub fn tick(&mut self, dt: f32) -> &FrameOutputs {
        let applied = sanitize_time(dt);
        if applied.to_bits() != dt.to_bits() {
            self.diagnostics.push(DiagnosticEvent::TimeClamped {
                requested: dt,
                applied,
            });
        }
        self.playback.advance(applied);

        let frames: Vec<ObjectFrame> = self
            .objects
            .iter()
            .map(|o| self.object_frame(o))
            .collect();
        let source = self.playback.active_time_source();
        self.outputs.clear();
        self.outputs.clock = match source {
            TimeSource::Idle => self.playback.idle_time(),
            TimeSource::Main => self.playback.current_time(),
        };
        self.outputs.source = source;
        self.outputs.status = self.playback.status();
        self.outputs.frames = frames;
        self.outputs.events = self.diagnostics.drain();
        &self.outputs
    }

    /// Outputs of the last `tick`.
    pub fn outputs(&self) -> &FrameOutputs {
        &self.outputs
    }

    /// World transform of `object` at a main-clock time, without touching
    /// playback state. Invalid times are treated as 0.
    pub fn snapshot_at(&self, object: ObjectId, time: f32) -> Option<TransformSnapshot> {
        let obj = self.object(object)?;
        let Some(timeline) = &self.timeline else {
            return Some(obj.spec.base.to_snapshot());
        };
        let t = sanitize_time(time);
        let total = timeline.total_duration();
        let t = if obj.spec.looping && total > 0.0 {
            t.rem_euclid(total)
        } else {
            t
        };
        Some(self.compose_at(obj, timeline, t))
    }

    /// Take all pending diagnostics.
    pub fn drain_diagnostics(&mut self) -> Vec<DiagnosticEvent> {
        self.diagnostics.drain()
    }

    fn compose_at(&self, obj: &SceneObject, timeline: &Timeline, t: f32) -> TransformSnapshot {
        let animated = timeline.sample_at(obj.id, t);
        compose(
            &obj.spec.base,
            &animated,
            timeline.end_adjust_factor(t),
            obj.spec.end_adjustment.as_ref(),
            &self.config,
        )
    }

    fn object_frame(&self, obj: &SceneObject) -> ObjectFrame {
        let mut frame = ObjectFrame {
            object: obj.id,
            name: obj.spec.name.clone(),
            time: 0.0,
            phase_index: None,
            end_factor: 0.0,
            snapshot: obj.spec.base.to_snapshot(),
        };
        let Some(timeline) = &self.timeline else {
            return frame;
        };
        match self.playback.active_time_source() {
            TimeSource::Idle => {
                let t = self.playback.idle_time();
                let animated = timeline.sample_phase(0, obj.id, t);
                frame.time = t;
                frame.phase_index = (timeline.phase_count() > 0).then_some(0);
                frame.snapshot = compose(
                    &obj.spec.base,
                    &animated,
                    0.0,
                    obj.spec.end_adjustment.as_ref(),
                    &self.config,
                );
            }
            TimeSource::Main => {
                let t = self
                    .playback
                    .time_for(obj.spec.looping, timeline.total_duration());
                frame.time = t;
                frame.phase_index = timeline.resolve_phase(t).map(|r| r.phase_index);
                frame.end_factor = timeline.end_adjust_factor(t);
                frame.snapshot = self.compose_at(obj, timeline, t);
            }
        }
        frame
    }
}

fn snapshot_source(src: &SnapshotSourceConfig) -> SnapshotSource {
    match src {
        SnapshotSourceConfig::Fixed { transform } => {
            SnapshotSource::Fixed(transform.to_snapshot())
        }
        SnapshotSourceConfig::PhaseStart { phase } => SnapshotSource::PhaseStart(*phase),
        SnapshotSourceConfig::PhaseEnd { phase } => SnapshotSource::PhaseEnd(*phase),
    }
}
