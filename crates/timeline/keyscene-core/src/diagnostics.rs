//! Structured diagnostic event stream.
//!
//! Events are logged through the `log` facade as they are recorded and kept in
//! a bounded queue until the host drains them.

use std::collections::VecDeque;

use log::Level;
use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;
use crate::value::PropertyKind;

/// Degraded-but-running conditions worth surfacing to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum DiagnosticEvent {
    /// An object has no usable clip for a phase's source; it renders at its base transform.
    MissingClip {
        object: ObjectId,
        source_id: String,
        node: String,
    },
    /// A raw track was dropped or truncated during extraction.
    MissingTrack {
        source_id: String,
        node: String,
        property: PropertyKind,
        reason: String,
    },
    /// A clip phase had no usable clip and was given the fallback duration.
    FallbackDuration {
        phase: String,
        index: usize,
        duration: f32,
    },
    ExtractionFailed {
        source_id: String,
        error: String,
    },
    ExtractionCancelled {
        source_id: String,
    },
    /// An invalid time query was clamped at the playback boundary.
    TimeClamped {
        requested: f32,
        applied: f32,
    },
    SpeedClamped {
        requested: f32,
        applied: f32,
    },
}

impl DiagnosticEvent {
    /// Log level the event is reported at.
    pub fn level(&self) -> Level {
        match self {
            DiagnosticEvent::MissingClip { .. }
            | DiagnosticEvent::FallbackDuration { .. }
            | DiagnosticEvent::ExtractionFailed { .. } => Level::Warn,
            DiagnosticEvent::ExtractionCancelled { .. } => Level::Info,
            DiagnosticEvent::MissingTrack { .. }
            | DiagnosticEvent::TimeClamped { .. }
            | DiagnosticEvent::SpeedClamped { .. } => Level::Debug,
        }
    }
}

/// Bounded event sink.
#[derive(Debug)]
pub struct Diagnostics {
    events: VecDeque<DiagnosticEvent>,
    capacity: usize,
    dropped: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}

impl Diagnostics {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Record and log an event, evicting the oldest when full.
    pub fn push(&mut self, event: DiagnosticEvent) {
        log::log!(event.level(), "{event:?}");
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn events(&self) -> impl Iterator<Item = &DiagnosticEvent> {
        self.events.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events evicted since creation because the queue was full.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn drain(&mut self) -> Vec<DiagnosticEvent> {
        self.events.drain(..).collect()
    }
}
