//! Per-frame outputs handed to the renderer / camera rig.

use serde::{Deserialize, Serialize};

use crate::compose::TransformSnapshot;
use crate::diagnostics::DiagnosticEvent;
use crate::ids::ObjectId;
use crate::playback::{PlaybackStatus, TimeSource};

/// World transform of one tracked object this frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectFrame {
    pub object: ObjectId,
    pub name: String,
    /// Time the object was sampled at, on the active clock.
    pub time: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_index: Option<usize>,
    pub end_factor: f32,
    pub snapshot: TransformSnapshot,
}

/// Outputs returned by `SceneSession::tick()`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameOutputs {
    pub clock: f32,
    pub source: TimeSource,
    pub status: PlaybackStatus,
    #[serde(default)]
    pub frames: Vec<ObjectFrame>,
    #[serde(default)]
    pub events: Vec<DiagnosticEvent>,
}

impl Default for FrameOutputs {
    fn default() -> Self {
        Self {
            clock: 0.0,
            source: TimeSource::Idle,
            status: PlaybackStatus::Stopped,
            frames: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl FrameOutputs {
    #[inline]
    pub fn clear(&mut self) {
        self.frames.clear();
        self.events.clear();
    }

    pub fn frame(&self, object: ObjectId) -> Option<&ObjectFrame> {
        self.frames.iter().find(|f| f.object == object)
    }

    pub fn frame_named(&self, name: &str) -> Option<&ObjectFrame> {
        self.frames.iter().find(|f| f.name == name)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.events.is_empty()
    }
}
