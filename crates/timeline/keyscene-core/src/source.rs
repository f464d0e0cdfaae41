//! Raw animation input as supplied by the host's scene loader, and the loader
//! seam the extractor fetches it through.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::source_json::parse_raw_animation_set_json;

/// One keyframe track as authored: `"<nodeName>.<property>"` plus flat arrays.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RawTrack {
    pub name: String,
    #[serde(default)]
    pub times: Vec<f32>,
    #[serde(default)]
    pub values: Vec<f32>,
}

/// One authored clip of a source.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RawAnimation {
    #[serde(default)]
    pub name: String,
    /// Declared clip length in seconds.
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub tracks: Vec<RawTrack>,
}

/// Every animation of one external asset.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RawAnimationSet {
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub animations: Vec<RawAnimation>,
}

impl RawAnimationSet {
    pub fn new(source_id: impl Into<String>, animations: Vec<RawAnimation>) -> Self {
        Self {
            source_id: source_id.into(),
            animations,
        }
    }
}

/// Host-provided fetch-and-parse step for one source.
///
/// Implementations may be called from several threads at once, one call per
/// source.
pub trait SourceLoader: Send + Sync {
    fn load(&self, source_id: &str) -> Result<RawAnimationSet, ExtractionError>;
}

/// In-memory loader holding JSON documents keyed by source id.
#[derive(Clone, Debug, Default)]
pub struct JsonSourceLoader {
    documents: HashMap<String, String>,
}

impl JsonSourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_id: impl Into<String>, json: impl Into<String>) {
        self.documents.insert(source_id.into(), json.into());
    }

    pub fn with_source(mut self, source_id: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(source_id, json);
        self
    }
}

impl SourceLoader for JsonSourceLoader {
    fn load(&self, source_id: &str) -> Result<RawAnimationSet, ExtractionError> {
        let doc = self
            .documents
            .get(source_id)
            .ok_or_else(|| ExtractionError::SourceUnavailable {
                source_id: source_id.to_string(),
                reason: "no document registered".into(),
            })?;
        parse_raw_animation_set_json(source_id, doc)
    }
}
