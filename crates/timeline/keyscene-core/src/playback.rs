//! Playback controller: clock, speed and the play/pause/stop state machine.
//!
//! Two named clocks drive the timeline:
//! - `TimeSource::Idle` runs while stopped and animates the first phase as an
//!   idle loop before playback starts.
//! - `TimeSource::Main` is the playback clock used while playing or paused.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Playback status of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    #[inline]
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Paused | Self::Stopped)
    }

    #[inline]
    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Playing)
    }

    #[inline]
    pub fn can_stop(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl From<&str> for PlaybackStatus {
    fn from(s: &str) -> Self {
        match s {
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

/// Clock feeding the timeline for the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    Idle,
    Main,
}

/// Playback state owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub clock: f32,
    pub speed: f32,
    pub status: PlaybackStatus,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            clock: 0.0,
            speed: 1.0,
            status: PlaybackStatus::Stopped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    state: PlaybackState,
    idle_clock: f32,
    ready: bool,
    config: Config,
}

/// Clamp a time query to `[0, +inf)`; non-finite input becomes 0.
#[inline]
pub fn sanitize_time(t: f32) -> f32 {
    if t.is_finite() {
        t.max(0.0)
    } else {
        0.0
    }
}

impl PlaybackController {
    pub fn new(config: &Config) -> Self {
        Self {
            state: PlaybackState::default(),
            idle_clock: 0.0,
            ready: false,
            config: config.clone(),
        }
    }

    /// Mark initialization complete (or not). `play` is a no-op until ready.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
        if !ready && self.state.status.is_playing() {
            self.state.status = PlaybackStatus::Paused;
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Start or resume. Returns false when not ready.
    pub fn play(&mut self) -> bool {
        if !self.ready {
            return false;
        }
        self.state.status = PlaybackStatus::Playing;
        true
    }

    /// Freeze the clock. Only valid while playing.
    pub fn pause(&mut self) -> bool {
        if !self.state.status.can_pause() {
            return false;
        }
        self.state.status = PlaybackStatus::Paused;
        true
    }

    /// Stop and rewind the main clock.
    pub fn stop(&mut self) {
        self.state.status = PlaybackStatus::Stopped;
        self.state.clock = 0.0;
    }

    /// Set the main clock directly, independent of status. Returns the
    /// applied time.
    pub fn seek(&mut self, t: f32) -> f32 {
        self.state.clock = sanitize_time(t);
        self.state.clock
    }

    /// Returns the applied (clamped) speed.
    pub fn set_speed(&mut self, speed: f32) -> f32 {
        self.state.speed = self.config.clamp_speed(speed);
        self.state.speed
    }

    /// Per-tick update. The main clock advances by `dt * speed` while playing;
    /// the idle clock advances by `dt` while stopped. Invalid `dt` counts as 0.
    pub fn advance(&mut self, dt: f32) {
        let dt = sanitize_time(dt);
        match self.state.status {
            PlaybackStatus::Playing => self.state.clock += dt * self.state.speed,
            PlaybackStatus::Stopped => self.idle_clock += dt,
            PlaybackStatus::Paused => {}
        }
    }

    #[inline]
    pub fn active_time_source(&self) -> TimeSource {
        match self.state.status {
            PlaybackStatus::Stopped => TimeSource::Idle,
            PlaybackStatus::Playing | PlaybackStatus::Paused => TimeSource::Main,
        }
    }

    /// Unwrapped main clock.
    #[inline]
    pub fn current_time(&self) -> f32 {
        self.state.clock
    }

    /// Main clock for consumers that follow the timeline once and hold the
    /// final pose.
    #[inline]
    pub fn absolute_time(&self) -> f32 {
        self.state.clock
    }

    #[inline]
    pub fn idle_time(&self) -> f32 {
        self.idle_clock
    }

    /// Main clock wrapped into `[0, total)`, for looping consumers.
    pub fn looped_time(&self, total: f32) -> f32 {
        if total > 0.0 {
            self.state.clock.rem_euclid(total)
        } else {
            self.state.clock
        }
    }

    /// Main clock as seen by a looping or absolute-phase consumer.
    #[inline]
    pub fn time_for(&self, looping: bool, total: f32) -> f32 {
        if looping {
            self.looped_time(total)
        } else {
            self.absolute_time()
        }
    }

    /// Fraction of the timeline elapsed on the main clock, in `[0, 1]`.
    pub fn progress(&self, total: f32) -> f32 {
        if total > 0.0 {
            (self.state.clock / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.state.speed
    }

    #[inline]
    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }
}
