//! Engine configuration: named constants for timeline fallbacks, the
//! end-of-sequence window and playback speed limits.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default duration used for a clip phase whose clip is missing or empty.
pub const DEFAULT_FALLBACK_CLIP_DURATION: f32 = 7.0;
/// Default length of the end-of-timeline adjustment window, in seconds.
pub const DEFAULT_END_WINDOW: f32 = 1.5;
/// Default uniform enlargement applied at full end adjustment.
pub const DEFAULT_END_SCALE_GAIN: f32 = 0.15;
pub const DEFAULT_MIN_SPEED: f32 = 0.1;
pub const DEFAULT_MAX_SPEED: f32 = 5.0;

/// Engine configuration.
///
/// Every field has a default so hosts can deserialize partial JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Duration substituted for a clip phase whose clip is absent or zero length.
    pub fallback_clip_duration: f32,
    /// Length of the window before the end of the timeline in which the
    /// end adjustment factor ramps from 0 to 1.
    pub end_window: f32,
    /// Enlargement constant `K`: scale is multiplied by `1 + factor * K`.
    pub end_scale_gain: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Maximum diagnostic events retained between drains; oldest are dropped.
    pub max_events: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_clip_duration: DEFAULT_FALLBACK_CLIP_DURATION,
            end_window: DEFAULT_END_WINDOW,
            end_scale_gain: DEFAULT_END_SCALE_GAIN,
            min_speed: DEFAULT_MIN_SPEED,
            max_speed: DEFAULT_MAX_SPEED,
            max_events: 1024,
        }
    }
}

impl Config {
    /// Parse and validate a configuration from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check ranges. Durations and windows must be finite and non-negative,
    /// and the speed range must be positive and ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("fallback_clip_duration", self.fallback_clip_duration)?;
        non_negative("end_window", self.end_window)?;
        if !self.end_scale_gain.is_finite() {
            return Err(invalid("end_scale_gain", "must be finite"));
        }
        if !(self.min_speed.is_finite() && self.min_speed > 0.0) {
            return Err(invalid("min_speed", "must be finite and > 0"));
        }
        if !self.max_speed.is_finite() || self.max_speed < self.min_speed {
            return Err(invalid("max_speed", "must be finite and >= min_speed"));
        }
        Ok(())
    }

    /// Clamp a requested playback speed into `[min_speed, max_speed]`.
    /// Non-finite requests fall back to normal speed before clamping.
    #[inline]
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        let s = if speed.is_finite() { speed } else { 1.0 };
        s.clamp(self.min_speed, self.max_speed)
    }
}

fn non_negative(field: &str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and >= 0"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidRange {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
