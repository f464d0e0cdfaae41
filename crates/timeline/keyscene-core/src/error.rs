//! Error types for clip extraction and scene configuration.
//!
//! Only hard failures are represented here. Recoverable conditions such as a
//! missing track, a zero-length clip or an out-of-range time query are
//! reported through [`crate::diagnostics`] and never surface as `Err`.

use serde::{Deserialize, Serialize};

/// Failure while fetching, parsing or normalizing one animation source.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExtractionError {
    /// The host loader could not provide the source.
    #[error("Source unavailable: {source_id} ({reason})")]
    SourceUnavailable { source_id: String, reason: String },

    /// The source payload could not be decoded.
    #[error("Failed to parse source {source_id}: {reason}")]
    Parse { source_id: String, reason: String },

    /// Extraction was cancelled before the clips were committed.
    #[error("Extraction cancelled for source {source_id}")]
    Cancelled { source_id: String },

    /// A keyframe track violates the track invariants.
    #[error("Invalid track {track}: {reason}")]
    InvalidTrack { track: String, reason: String },
}

impl ExtractionError {
    /// Source id the failure belongs to, if it is tied to one.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::SourceUnavailable { source_id, .. }
            | Self::Parse { source_id, .. }
            | Self::Cancelled { source_id } => Some(source_id),
            Self::InvalidTrack { .. } => None,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Invalid session or engine configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },

    /// A numeric setting is outside its accepted range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidRange { field: String, reason: String },

    /// A phase references a source that no object is bound to.
    #[error("Phase {phase} references unknown source {source_id}")]
    UnknownSource { phase: String, source_id: String },

    /// A phase references an object name that was never declared.
    #[error("Phase {phase} references unknown object {object}")]
    UnknownObject { phase: String, object: String },
}

/// Umbrella error for the public API.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum KeysceneError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl KeysceneError {
    /// Whether the session can keep running in a degraded state after this error.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }

    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Extraction(ExtractionError::Cancelled { .. }) => "cancelled",
            Self::Extraction(_) => "extraction",
            Self::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
