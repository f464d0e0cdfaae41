//! Keyscene core (engine-agnostic)
//!
//! Extracts per-object keyframe clips from raw animation sources, arranges
//! them into a phase timeline with synthetic blend phases, and composes the
//! sampled deltas with static base transforms under a two-clock playback
//! controller. Rendering and asset fetching stay with the host.

pub mod compose;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod ids;
pub mod interp;
pub mod outputs;
pub mod playback;
pub mod sampling;
pub mod scene;
pub mod session;
pub mod source;
pub mod source_json;
pub mod timeline;
pub mod value;

// Re-exports for hosts
pub use compose::{compose, BaseTransform, EndAdjustment, Rotation, TransformSnapshot};
pub use config::Config;
pub use data::{Clip, ClipTracks, Track, TrackSlot};
pub use diagnostics::{DiagnosticEvent, Diagnostics};
pub use error::{ConfigError, ExtractionError, KeysceneError};
pub use extract::{
    extract, CancelToken, ClipLibrary, ExtractionReport, SourceFailure, SourceRequest,
};
pub use ids::ObjectId;
pub use interp::Easing;
pub use outputs::{FrameOutputs, ObjectFrame};
pub use playback::{PlaybackController, PlaybackState, PlaybackStatus, TimeSource};
pub use sampling::sample_track;
pub use scene::SceneConfig;
pub use session::{ObjectSpec, SceneSession, SourceBinding};
pub use source::{JsonSourceLoader, RawAnimation, RawAnimationSet, RawTrack, SourceLoader};
pub use source_json::parse_raw_animation_set_json;
pub use timeline::{
    BlendPhase, ClipPhase, ObjectBinding, PhaseResolution, PhaseSpec, SnapshotSource, Timeline,
};
pub use value::{PropertyKind, SampledValue};

pub type Result<T> = std::result::Result<T, KeysceneError>;
