//! Clip extraction: normalize raw per-node keyframe tracks into [`Clip`]s and
//! cache them per `(source_id, node)`.
//!
//! Sources are fetched through a [`SourceLoader`]. `ClipLibrary::load_sources`
//! fans out one job per source on the rayon pool; a failure or cancellation
//! of one source never blocks the others, and an unfinished source leaves its
//! clips absent rather than partially populated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{Clip, ClipTracks, Track, TrackSlot};
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::error::ExtractionError;
use crate::source::{RawAnimationSet, RawTrack, SourceLoader};
use crate::value::PropertyKind;

/// Split `"<node>.<property>"` at the last dot. Node names may contain dots.
pub fn split_track_name(name: &str) -> Option<(&str, PropertyKind)> {
    let (node, suffix) = name.rsplit_once('.')?;
    PropertyKind::from_suffix(suffix).map(|kind| (node, kind))
}

/// Extract the clip for `target_node` from one raw animation set.
///
/// The first track found for a slot wins. The duration is the longest
/// declared animation duration (or latest keyframe, if later) when anything
/// matched, and zero otherwise.
pub fn extract(set: &RawAnimationSet, target_node: &str) -> Clip {
    extract_reporting(set, target_node, &mut |_| {})
}

fn extract_reporting(
    set: &RawAnimationSet,
    target_node: &str,
    report: &mut dyn FnMut(DiagnosticEvent),
) -> Clip {
    let mut tracks = ClipTracks::default();
    let mut matched = false;

    for anim in &set.animations {
        for raw in &anim.tracks {
            let Some((node, kind)) = split_track_name(&raw.name) else {
                continue;
            };
            if node != target_node {
                continue;
            }
            let slot = tracks.slot_mut(TrackSlot::from(kind));
            if slot.is_some() {
                continue;
            }
            if let Some(track) = normalize_track(set, target_node, kind, raw, report) {
                *slot = Some(track);
                matched = true;
            }
        }
    }

    if !matched {
        return Clip::empty(set.source_id.as_str(), target_node);
    }

    let declared = set
        .animations
        .iter()
        .map(|a| a.duration)
        .fold(0.0_f32, f32::max);
    let mut clip = Clip::from_tracks(set.source_id.as_str(), target_node, tracks);
    clip.duration = clip.duration.max(declared);
    clip
}

/// Convert one raw track; truncates trailing partial keyframes and drops
/// tracks whose times are not ordered.
fn normalize_track(
    set: &RawAnimationSet,
    node: &str,
    kind: PropertyKind,
    raw: &RawTrack,
    report: &mut dyn FnMut(DiagnosticEvent),
) -> Option<Track> {
    let arity = kind.arity();
    let keys = raw.times.len().min(raw.values.len() / arity);
    if keys != raw.times.len() || keys * arity != raw.values.len() {
        report(DiagnosticEvent::MissingTrack {
            source_id: set.source_id.clone(),
            node: node.to_string(),
            property: kind,
            reason: format!(
                "{} times / {} values do not match arity {arity}; kept {keys} keyframes",
                raw.times.len(),
                raw.values.len()
            ),
        });
    }
    let times = raw.times[..keys].to_vec();
    let values = raw.values[..keys * arity].to_vec();
    match Track::new(kind, times, values) {
        Ok(track) => Some(track),
        Err(err) => {
            report(DiagnosticEvent::MissingTrack {
                source_id: set.source_id.clone(),
                node: node.to_string(),
                property: kind,
                reason: err.to_string(),
            });
            None
        }
    }
}

/// Cooperative cancellation flag shared with in-flight extraction jobs.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Nodes wanted from one source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SourceRequest {
    pub source_id: String,
    pub nodes: Vec<String>,
}

impl SourceRequest {
    pub fn new(source_id: impl Into<String>, nodes: Vec<String>) -> Self {
        Self {
            source_id: source_id.into(),
            nodes,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: ExtractionError,
}

/// Per-source outcome of a fan-out load.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionReport {
    /// Sources fetched and extracted in this call.
    pub loaded: Vec<String>,
    /// Sources whose every requested node was already cached.
    pub cached: Vec<String>,
    pub failed: Vec<SourceFailure>,
    pub cancelled: Vec<String>,
}

impl ExtractionReport {
    /// True when no source failed or was cancelled.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }

    /// For hosts that treat any missing source as fatal: the first failure,
    /// or the first cancellation, as an error.
    pub fn ensure_complete(&self) -> crate::Result<()> {
        if let Some(failure) = self.failed.first() {
            return Err(failure.error.clone().into());
        }
        if let Some(source_id) = self.cancelled.first() {
            return Err(ExtractionError::Cancelled {
                source_id: source_id.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Cache key: `(source_id, node)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClipKey {
    pub source_id: String,
    pub node: String,
}

impl ClipKey {
    pub fn new(source_id: &str, node: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            node: node.to_string(),
        }
    }
}

/// Read-only clip cache built once during initialization.
#[derive(Debug, Default)]
pub struct ClipLibrary {
    clips: HashMap<ClipKey, Arc<Clip>>,
    scans: usize,
}

type JobOutput = (String, Result<(Vec<Clip>, Vec<DiagnosticEvent>), ExtractionError>);

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached clip for `(source_id, node)`, if extraction produced one.
    pub fn clip(&self, source_id: &str, node: &str) -> Option<&Arc<Clip>> {
        self.clips.get(&ClipKey::new(source_id, node))
    }

    pub fn contains(&self, source_id: &str, node: &str) -> bool {
        self.clips.contains_key(&ClipKey::new(source_id, node))
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Number of raw-set scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    /// Return the cached clip for `(set.source_id, node)`, scanning the set
    /// only on the first request.
    pub fn extract_cached(&mut self, set: &RawAnimationSet, node: &str) -> Arc<Clip> {
        let key = ClipKey::new(&set.source_id, node);
        if let Some(clip) = self.clips.get(&key) {
            return Arc::clone(clip);
        }
        self.scans += 1;
        let clip = Arc::new(extract(set, node));
        self.clips.insert(key, Arc::clone(&clip));
        clip
    }

    /// Insert an already-parsed set synchronously, reporting dropped tracks.
    pub fn insert_set(
        &mut self,
        set: &RawAnimationSet,
        nodes: &[String],
        diagnostics: &mut Diagnostics,
    ) {
        for node in nodes {
            if self.contains(&set.source_id, node) {
                continue;
            }
            self.scans += 1;
            let clip = extract_reporting(set, node, &mut |ev| diagnostics.push(ev));
            self.clips
                .insert(ClipKey::new(&set.source_id, node), Arc::new(clip));
        }
    }

    /// Fetch and extract every requested source concurrently.
    ///
    /// Fully cached sources are skipped. Results are committed only for
    /// sources that finished without error and before cancellation.
    pub fn load_sources<L>(
        &mut self,
        loader: &L,
        requests: &[SourceRequest],
        cancel: &CancelToken,
        diagnostics: &mut Diagnostics,
    ) -> ExtractionReport
    where
        L: SourceLoader + ?Sized,
    {
        let mut report = ExtractionReport::default();
        let mut pending: Vec<SourceRequest> = Vec::new();
        for req in requests {
            let nodes: Vec<String> = req
                .nodes
                .iter()
                .filter(|n| !self.contains(&req.source_id, n))
                .cloned()
                .collect();
            if nodes.is_empty() {
                report.cached.push(req.source_id.clone());
            } else {
                pending.push(SourceRequest::new(req.source_id.clone(), nodes));
            }
        }

        let results: Vec<JobOutput> = pending
            .par_iter()
            .map(|req| (req.source_id.clone(), fetch_and_extract(loader, req, cancel)))
            .collect();

        for (source_id, result) in results {
            match result {
                Ok((clips, events)) => {
                    self.scans += clips.len();
                    for ev in events {
                        diagnostics.push(ev);
                    }
                    for clip in clips {
                        let key = ClipKey::new(&clip.source_id, &clip.target_node);
                        self.clips.insert(key, Arc::new(clip));
                    }
                    log::debug!("extracted clips for source {source_id}");
                    report.loaded.push(source_id);
                }
                Err(ExtractionError::Cancelled { .. }) => {
                    diagnostics.push(DiagnosticEvent::ExtractionCancelled {
                        source_id: source_id.clone(),
                    });
                    report.cancelled.push(source_id);
                }
                Err(error) => {
                    diagnostics.push(DiagnosticEvent::ExtractionFailed {
                        source_id: source_id.clone(),
                        error: error.to_string(),
                    });
                    report.failed.push(SourceFailure { source_id, error });
                }
            }
        }
        report
    }
}

fn fetch_and_extract<L>(
    loader: &L,
    req: &SourceRequest,
    cancel: &CancelToken,
) -> Result<(Vec<Clip>, Vec<DiagnosticEvent>), ExtractionError>
where
    L: SourceLoader + ?Sized,
{
    let cancelled = || ExtractionError::Cancelled {
        source_id: req.source_id.clone(),
    };
    if cancel.is_cancelled() {
        return Err(cancelled());
    }
    let mut set = loader.load(&req.source_id)?;
    set.source_id = req.source_id.clone();

    let mut events = Vec::new();
    let clips = req
        .nodes
        .iter()
        .map(|node| extract_reporting(&set, node, &mut |ev| events.push(ev)))
        .collect();

    if cancel.is_cancelled() {
        return Err(cancelled());
    }
    Ok((clips, events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_uses_last_dot() {
        assert_eq!(
            split_track_name("Rig.Arm.L.quaternion"),
            Some(("Rig.Arm.L", PropertyKind::Quaternion))
        );
        assert_eq!(
            split_track_name("Camera.fov"),
            Some(("Camera", PropertyKind::Scalar))
        );
        assert_eq!(split_track_name("Camera.morphTargetInfluences"), None);
        assert_eq!(split_track_name("nodot"), None);
    }
}
