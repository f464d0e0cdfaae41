//! Normalized animation data model: keyframe tracks and per-object clips.

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::value::PropertyKind;

/// Single-property keyframe sequence.
///
/// Invariants: `times` is non-decreasing and finite, and
/// `values.len() == times.len() * kind.arity()`. An empty track is valid.
/// Deserialization goes through the same checks as [`Track::new`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "TrackData")]
pub struct Track {
    kind: PropertyKind,
    times: Vec<f32>,
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct TrackData {
    kind: PropertyKind,
    #[serde(default)]
    times: Vec<f32>,
    #[serde(default)]
    values: Vec<f32>,
}

impl TryFrom<TrackData> for Track {
    type Error = ExtractionError;

    fn try_from(data: TrackData) -> Result<Self, Self::Error> {
        Track::new(data.kind, data.times, data.values)
    }
}

impl Track {
    /// Build a track, checking the invariants.
    pub fn new(
        kind: PropertyKind,
        times: Vec<f32>,
        values: Vec<f32>,
    ) -> Result<Self, ExtractionError> {
        let track = Self {
            kind,
            times,
            values,
        };
        track.validate()?;
        Ok(track)
    }

    /// Track with no keyframes.
    pub fn empty(kind: PropertyKind) -> Self {
        Self {
            kind,
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ExtractionError> {
        let arity = self.kind.arity();
        if self.values.len() != self.times.len() * arity {
            return Err(self.invalid(format!(
                "expected {} values for {} keyframes of arity {}, got {}",
                self.times.len() * arity,
                self.times.len(),
                arity,
                self.values.len()
            )));
        }
        let mut last = f32::NEG_INFINITY;
        for &t in &self.times {
            if !t.is_finite() {
                return Err(self.invalid("keyframe times must be finite".into()));
            }
            if t < last {
                return Err(self.invalid("keyframe times must be non-decreasing".into()));
            }
            last = t;
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> ExtractionError {
        ExtractionError::InvalidTrack {
            track: format!("{:?}", self.kind),
            reason,
        }
    }

    #[inline]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    #[inline]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// Flat keyframe values, `arity` floats per keyframe.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.kind.arity()
    }

    /// Number of keyframes.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    pub fn is_quaternion(&self) -> bool {
        self.kind == PropertyKind::Quaternion
    }

    #[inline]
    pub fn last_time(&self) -> Option<f32> {
        self.times.last().copied()
    }

    /// Value slice of keyframe `i`.
    #[inline]
    pub fn keyframe(&self, i: usize) -> &[f32] {
        let arity = self.arity();
        &self.values[i * arity..(i + 1) * arity]
    }
}

/// Clip slot a track fills. Euler and quaternion rotations share `Rotation`.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackSlot {
    Position,
    Rotation,
    Scale,
    Scalar,
}

impl From<PropertyKind> for TrackSlot {
    fn from(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Position => TrackSlot::Position,
            PropertyKind::Rotation | PropertyKind::Quaternion => TrackSlot::Rotation,
            PropertyKind::Scale => TrackSlot::Scale,
            PropertyKind::Scalar => TrackSlot::Scalar,
        }
    }
}

/// Up to four tracks of one clip, one per slot.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClipTracks {
    #[serde(default)]
    pub position: Option<Track>,
    #[serde(default)]
    pub rotation: Option<Track>,
    #[serde(default)]
    pub scale: Option<Track>,
    #[serde(default)]
    pub scalar: Option<Track>,
}

impl ClipTracks {
    pub fn get(&self, slot: TrackSlot) -> Option<&Track> {
        match slot {
            TrackSlot::Position => self.position.as_ref(),
            TrackSlot::Rotation => self.rotation.as_ref(),
            TrackSlot::Scale => self.scale.as_ref(),
            TrackSlot::Scalar => self.scalar.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: TrackSlot) -> &mut Option<Track> {
        match slot {
            TrackSlot::Position => &mut self.position,
            TrackSlot::Rotation => &mut self.rotation,
            TrackSlot::Scale => &mut self.scale,
            TrackSlot::Scalar => &mut self.scalar,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        [&self.position, &self.rotation, &self.scale, &self.scalar]
            .into_iter()
            .filter_map(Option::as_ref)
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Normalized bundle of tracks for one node of one source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub source_id: String,
    pub target_node: String,
    pub tracks: ClipTracks,
    /// Seconds. Zero for a clip without tracks.
    pub duration: f32,
}

impl Clip {
    /// Clip for a node that matched nothing.
    pub fn empty(source_id: impl Into<String>, target_node: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_node: target_node.into(),
            tracks: ClipTracks::default(),
            duration: 0.0,
        }
    }

    /// Build a clip from tracks; duration is the latest keyframe time.
    pub fn from_tracks(
        source_id: impl Into<String>,
        target_node: impl Into<String>,
        tracks: ClipTracks,
    ) -> Self {
        let duration = tracks
            .iter()
            .filter_map(Track::last_time)
            .fold(0.0_f32, f32::max);
        Self {
            source_id: source_id.into(),
            target_node: target_node.into(),
            tracks,
            duration,
        }
    }

    /// Consumers treat a clip with no tracks or no length as absent.
    #[inline]
    pub fn is_absent(&self) -> bool {
        self.tracks.is_empty() || self.duration <= 0.0
    }

    #[inline]
    pub fn track(&self, slot: TrackSlot) -> Option<&Track> {
        self.tracks.get(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_rejects_mismatched_values() {
        let err = Track::new(PropertyKind::Position, vec![0.0, 1.0], vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidTrack { .. }));
    }

    #[test]
    fn track_rejects_decreasing_times() {
        assert!(Track::new(PropertyKind::Scalar, vec![1.0, 0.5], vec![0.0, 1.0]).is_err());
        assert!(Track::new(PropertyKind::Scalar, vec![0.5, 0.5], vec![0.0, 1.0]).is_ok());
    }

    #[test]
    fn deserialized_tracks_are_validated() {
        let bad = r#"{ "kind": "position", "times": [0.0, 1.0], "values": [0.0, 0.0, 0.0] }"#;
        assert!(serde_json::from_str::<Track>(bad).is_err());

        let good = r#"{ "kind": "scalar", "times": [0.0, 1.0], "values": [2.0, 4.0] }"#;
        let track: Track = serde_json::from_str(good).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.keyframe(1), &[4.0]);
        let back: Track = serde_json::from_str(&serde_json::to_string(&track).unwrap()).unwrap();
        assert_eq!(back, track);
    }

    #[test]
    fn clip_duration_from_tracks() {
        let tracks = ClipTracks {
            position: Some(
                Track::new(PropertyKind::Position, vec![0.0, 2.0], vec![0.0; 6]).unwrap(),
            ),
            scalar: Some(Track::new(PropertyKind::Scalar, vec![0.0, 3.5], vec![1.0, 2.0]).unwrap()),
            ..Default::default()
        };
        let clip = Clip::from_tracks("src", "node", tracks);
        assert_eq!(clip.duration, 3.5);
        assert_eq!(clip.tracks.count(), 2);
        assert!(!clip.is_absent());
        assert!(Clip::empty("src", "node").is_absent());
    }
}
