use approx::assert_abs_diff_eq;
use keyscene_core::{
    BlendPhase, ClipLibrary, ClipPhase, Config, DiagnosticEvent, Diagnostics, ObjectBinding,
    ObjectId, PhaseSpec, RawAnimation, RawAnimationSet, RawTrack, SnapshotSource, Timeline,
    TransformSnapshot,
};

const OBJ: ObjectId = ObjectId(0);

fn position_set(source: &str, duration: f32, from: [f32; 3], to: [f32; 3]) -> RawAnimationSet {
    let mut values = from.to_vec();
    values.extend_from_slice(&to);
    RawAnimationSet::new(
        source,
        vec![RawAnimation {
            name: source.to_string(),
            duration,
            tracks: vec![RawTrack {
                name: "Box.position".to_string(),
                times: vec![0.0, duration],
                values,
            }],
        }],
    )
}

fn library(sets: &[RawAnimationSet]) -> ClipLibrary {
    let mut lib = ClipLibrary::new();
    let mut diagnostics = Diagnostics::default();
    for set in sets {
        lib.insert_set(set, &["Box".to_string()], &mut diagnostics);
    }
    lib
}

fn bindings() -> Vec<ObjectBinding> {
    vec![
        ObjectBinding::new(OBJ, "p1", "Box"),
        ObjectBinding::new(OBJ, "p3", "Box"),
    ]
}

fn scenario_phases() -> Vec<PhaseSpec> {
    vec![
        ClipPhase::new("idle", "p1").looping(true).into(),
        BlendPhase::new("bridge", 2.0).into(),
        ClipPhase::new("finale", "p3").into(),
    ]
}

fn scenario(lib: &ClipLibrary, diagnostics: &mut Diagnostics) -> Timeline {
    Timeline::build(
        scenario_phases(),
        lib,
        &bindings(),
        &Config::default(),
        diagnostics,
    )
}

fn full_library() -> ClipLibrary {
    library(&[
        position_set("p1", 7.0, [0.0; 3], [7.0, 0.0, 0.0]),
        position_set("p3", 5.0, [0.0; 3], [0.0, 5.0, 0.0]),
    ])
}

fn approx3(a: [f32; 3], b: [f32; 3]) {
    for i in 0..3 {
        assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-4);
    }
}

/// it should sum phase durations and resolve phase boundaries to the later phase
#[test]
fn scenario_total_and_boundaries() {
    let lib = full_library();
    let tl = scenario(&lib, &mut Diagnostics::default());
    assert_eq!(tl.phase_count(), 3);
    assert_eq!(tl.total_duration(), 14.0);

    let at7 = tl.resolve_phase(7.0).unwrap();
    assert_eq!(at7.phase_index, 1);
    assert_eq!(at7.phase_local_time, 0.0);

    let at9 = tl.resolve_phase(9.0).unwrap();
    assert_eq!(at9.phase_index, 2);
    assert_eq!(at9.phase_local_time, 0.0);

    assert_eq!(tl.resolve_phase(14.0 - 1e-3).unwrap().phase_index, 2);
    assert_eq!(tl.resolve_phase(30.0).unwrap().phase_index, 2);
}

/// it should expose each resolved phase's spec, start and bound clip
#[test]
fn resolved_phase_accessors() {
    let lib = full_library();
    let tl = scenario(&lib, &mut Diagnostics::default());

    let names: Vec<_> = (0..3)
        .filter_map(|i| tl.phase_spec(i).map(PhaseSpec::name))
        .collect();
    assert_eq!(names, ["idle", "bridge", "finale"]);
    assert_eq!(tl.phase_start(0), Some(0.0));
    assert_eq!(tl.phase_start(2), Some(9.0));
    assert_eq!(tl.phase_start(3), None);

    assert_eq!(tl.clip_for(0, OBJ).map(|c| c.duration), Some(7.0));
    assert_eq!(tl.clip_for(2, OBJ).map(|c| c.duration), Some(5.0));
    assert!(tl.clip_for(1, OBJ).is_none());
    assert!(tl.clip_for(0, ObjectId(9)).is_none());
}

/// it should resolve negative and NaN times to the start of the first phase
#[test]
fn invalid_times_resolve_to_start() {
    let lib = full_library();
    let tl = scenario(&lib, &mut Diagnostics::default());
    for t in [-3.0, f32::NAN, f32::NEG_INFINITY] {
        let r = tl.resolve_phase(t).unwrap();
        assert_eq!(r.phase_index, 0);
        assert_eq!(r.phase_local_time, 0.0);
    }
}

/// it should substitute the fallback duration for a missing clip
#[test]
fn missing_clip_uses_fallback_duration() {
    let lib = library(&[position_set("p3", 5.0, [0.0; 3], [0.0, 5.0, 0.0])]);
    let mut diagnostics = Diagnostics::default();
    let tl = scenario(&lib, &mut diagnostics);

    assert_eq!(tl.phase_duration(0), Some(7.0));
    assert_eq!(tl.total_duration(), 14.0);
    assert!(tl.used_fallback(0));
    assert!(!tl.used_fallback(2));

    let events = diagnostics.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::MissingClip { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        DiagnosticEvent::FallbackDuration { index: 0, duration, .. } if *duration == 7.0
    )));

    // Objects without a clip sample the neutral delta.
    assert_eq!(tl.sample_at(OBJ, 3.0), TransformSnapshot::IDENTITY);
}

/// it should honour a per-phase fallback override
#[test]
fn per_phase_fallback_override() {
    let tl = Timeline::build(
        vec![ClipPhase::new("idle", "p1").with_fallback(3.0).into()],
        &ClipLibrary::new(),
        &bindings(),
        &Config::default(),
        &mut Diagnostics::default(),
    );
    assert_eq!(tl.total_duration(), 3.0);
}

/// it should ramp the end factor only inside the end window
#[test]
fn end_window_factor() {
    let lib = full_library();
    let tl = scenario(&lib, &mut Diagnostics::default());

    assert_eq!(tl.end_adjust_factor(0.0), 0.0);
    assert_eq!(tl.end_adjust_factor(12.0), 0.0);
    assert_eq!(tl.end_adjust_factor(12.5), 0.0);
    assert_eq!(tl.end_adjust_factor(14.0), 1.0);

    let mut prev = 0.0;
    for i in 1..15 {
        let t = 12.5 + i as f32 * 0.1;
        let f = tl.end_adjust_factor(t);
        assert!(f > prev, "factor must increase at t={t}");
        assert!(f < 1.0);
        prev = f;
    }
}

/// it should repeat a looping phase with the period of its clip
#[test]
fn looping_law_holds() {
    let lib = library(&[position_set("loop", 2.0, [0.0; 3], [2.0, 0.0, 0.0])]);
    let tl = Timeline::build(
        vec![ClipPhase::new("spin", "loop").looping(true).into()],
        &lib,
        &[ObjectBinding::new(OBJ, "loop", "Box")],
        &Config::default(),
        &mut Diagnostics::default(),
    );
    assert_eq!(tl.total_duration(), 2.0);
    let t = 0.5;
    let base = tl.sample_at(OBJ, t);
    approx3(base.position, [0.5, 0.0, 0.0]);
    for k in 1..4 {
        assert_eq!(tl.sample_at(OBJ, t + k as f32 * 2.0), base);
    }
}

/// it should blend from the previous phase's end to the next phase's start by default
#[test]
fn blend_defaults_to_neighbouring_edges() {
    let lib = full_library();
    let tl = scenario(&lib, &mut Diagnostics::default());

    approx3(tl.sample_at(OBJ, 7.0).position, [7.0, 0.0, 0.0]);
    // Halfway through a cubic in-out blend is exactly halfway.
    approx3(tl.sample_at(OBJ, 8.0).position, [3.5, 0.0, 0.0]);
    approx3(tl.sample_at(OBJ, 9.0).position, [0.0, 0.0, 0.0]);
    approx3(tl.sample_at(OBJ, 14.0).position, [0.0, 5.0, 0.0]);
}

const OTHER: ObjectId = ObjectId(1);

/// A 2 s `Box` clip sharing a source with a 3 s `Other` clip, so a phase
/// over that source runs 3 s and `Box` loops one and a half times.
fn mixed_duration_timeline(blend: BlendPhase) -> Timeline {
    let set = RawAnimationSet::new(
        "mix",
        vec![RawAnimation {
            name: "mix".to_string(),
            duration: 2.0,
            tracks: vec![
                RawTrack {
                    name: "Box.position".to_string(),
                    times: vec![0.0, 2.0],
                    values: vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0],
                },
                RawTrack {
                    name: "Other.position".to_string(),
                    times: vec![0.0, 3.0],
                    values: vec![0.0, 0.0, 0.0, 0.0, 3.0, 0.0],
                },
            ],
        }],
    );
    let mut lib = ClipLibrary::new();
    let mut diagnostics = Diagnostics::default();
    lib.insert_set(&set, &["Box".to_string(), "Other".to_string()], &mut diagnostics);
    Timeline::build(
        vec![ClipPhase::new("loop", "mix").looping(true).into(), blend.into()],
        &lib,
        &[
            ObjectBinding::new(OBJ, "mix", "Box"),
            ObjectBinding::new(OTHER, "mix", "Other"),
        ],
        &Config::default(),
        &mut diagnostics,
    )
}

/// it should start a blend where a looping phase with shorter clips left off
#[test]
fn blend_after_looping_phase_is_continuous() {
    let tl = mixed_duration_timeline(BlendPhase::new("bridge", 2.0));
    assert_eq!(tl.phase_duration(0), Some(3.0));

    let before = tl.sample_at(OBJ, 3.0 - 1e-3);
    let start = tl.sample_at(OBJ, 3.0);
    assert_abs_diff_eq!(before.position[0], start.position[0], epsilon = 1e-2);
    approx3(start.position, [1.0, 0.0, 0.0]);

    // The longest clip finishes exactly one cycle and ends on its last key.
    approx3(tl.sample_at(OTHER, 3.0).position, [0.0, 3.0, 0.0]);
}

/// it should read a looping phase's end pose at the phase's own end time
#[test]
fn phase_end_endpoint_on_looping_phase() {
    let blend = BlendPhase::new("bridge", 2.0).with_endpoints(
        OBJ,
        SnapshotSource::PhaseEnd(0),
        SnapshotSource::Fixed(TransformSnapshot::IDENTITY),
    );
    let tl = mixed_duration_timeline(blend);
    approx3(tl.sample_at(OBJ, 3.0).position, [1.0, 0.0, 0.0]);
    approx3(tl.sample_at(OBJ, 5.0).position, [0.0, 0.0, 0.0]);
}

/// it should use explicit blend endpoints when configured
#[test]
fn explicit_blend_endpoints() {
    let lib = full_library();
    let fixed = TransformSnapshot {
        position: [0.0, 0.0, 10.0],
        ..TransformSnapshot::IDENTITY
    };
    let phases = vec![
        ClipPhase::new("idle", "p1").into(),
        BlendPhase::new("bridge", 2.0)
            .with_endpoints(OBJ, SnapshotSource::Fixed(fixed), SnapshotSource::PhaseEnd(2))
            .into(),
        ClipPhase::new("finale", "p3").into(),
    ];
    let tl = Timeline::build(
        phases,
        &lib,
        &bindings(),
        &Config::default(),
        &mut Diagnostics::default(),
    );
    approx3(tl.sample_at(OBJ, 7.0).position, [0.0, 0.0, 10.0]);
    approx3(tl.sample_at(OBJ, 8.0).position, [0.0, 2.5, 5.0]);
}

/// it should clamp a non-looping clip phase at its end
#[test]
fn non_looping_phase_holds_final_pose() {
    let lib = full_library();
    let tl = Timeline::build(
        vec![ClipPhase::new("finale", "p3").into()],
        &lib,
        &bindings(),
        &Config::default(),
        &mut Diagnostics::default(),
    );
    approx3(tl.sample_at(OBJ, 50.0).position, [0.0, 5.0, 0.0]);
}
