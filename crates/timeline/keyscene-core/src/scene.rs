//! Serializable scene description: objects, phases and engine constants.
//!
//! A host can build a complete [`crate::SceneSession`] from one JSON document:
//!
//! ```json
//! {
//!   "config": { "end_window": 1.5 },
//!   "objects": [
//!     { "id": "orb", "node_name": "Orb", "sources": ["intro"],
//!       "base": { "position": [0, 1, 0], "rotation": [0, 0.5, 0], "scale": 2.0 },
//!       "looping": true }
//!   ],
//!   "phases": [
//!     { "type": "clip", "name": "intro", "source": "intro", "looping": true },
//!     { "type": "blend", "name": "bridge", "duration": 2.0 }
//!   ]
//! }
//! ```

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::compose::{BaseTransform, EndAdjustment, TransformSnapshot};
use crate::config::Config;
use crate::error::ConfigError;
use crate::interp::functions::{euler_to_quat, normalize_quat};
use crate::interp::Easing;

/// Rotation as authored: quaternion `[x, y, z, w]` or Euler `[x, y, z]`
/// (radians, intrinsic XYZ).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RotationInput {
    Quat([f32; 4]),
    Euler([f32; 3]),
}

impl RotationInput {
    pub fn to_quat(self) -> [f32; 4] {
        match self {
            RotationInput::Quat(q) => normalize_quat(q),
            RotationInput::Euler(e) => euler_to_quat(e),
        }
    }
}

/// Scale as authored: per-axis or one uniform factor.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleInput {
    Uniform(f32),
    Vec3([f32; 3]),
}

impl ScaleInput {
    pub fn to_vec3(self) -> [f32; 3] {
        match self {
            ScaleInput::Uniform(s) => [s; 3],
            ScaleInput::Vec3(v) => v,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub position: [f32; 3],
    pub rotation: Option<RotationInput>,
    pub scale: Option<ScaleInput>,
    pub scalar: Option<f32>,
}

impl TransformConfig {
    pub fn to_base(&self) -> BaseTransform {
        BaseTransform {
            position: self.position,
            rotation: self
                .rotation
                .map(RotationInput::to_quat)
                .unwrap_or(BaseTransform::IDENTITY.rotation),
            scale: self.scale.map(ScaleInput::to_vec3).unwrap_or([1.0; 3]),
            scalar: self.scalar,
        }
    }

    pub fn to_snapshot(&self) -> TransformSnapshot {
        self.to_base().to_snapshot()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// Unique object name within the scene.
    pub id: String,
    /// Node name looked up in each source's tracks.
    pub node_name: String,
    /// Sources this object's node is extracted from.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub base: TransformConfig,
    #[serde(default)]
    pub looping: bool,
    #[serde(default)]
    pub end_adjustment: Option<EndAdjustment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum SnapshotSourceConfig {
    Fixed {
        #[serde(default)]
        transform: TransformConfig,
    },
    PhaseStart {
        phase: usize,
    },
    PhaseEnd {
        phase: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendEndpointConfig {
    pub object: String,
    pub start: SnapshotSourceConfig,
    pub end: SnapshotSourceConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseConfig {
    Clip {
        name: String,
        source: String,
        #[serde(default)]
        looping: bool,
        #[serde(default)]
        fallback_duration: Option<f32>,
    },
    Blend {
        name: String,
        duration: f32,
        #[serde(default)]
        easing: Easing,
        #[serde(default)]
        endpoints: Vec<BlendEndpointConfig>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

impl SceneConfig {
    /// Parse and validate a scene from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let scene: SceneConfig = serde_json::from_str(s)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check cross references: unique object ids, clip phases naming a bound
    /// source, blend endpoints naming declared objects and existing phases.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;

        let mut ids = HashSet::new();
        for obj in &self.objects {
            if !ids.insert(obj.id.as_str()) {
                return Err(ConfigError::InvalidRange {
                    field: "objects".to_string(),
                    reason: format!("duplicate object id {}", obj.id),
                });
            }
        }
        let sources: HashSet<&str> = self
            .objects
            .iter()
            .flat_map(|o| o.sources.iter().map(String::as_str))
            .collect();

        for phase in &self.phases {
            match phase {
                PhaseConfig::Clip {
                    name,
                    source,
                    fallback_duration,
                    ..
                } => {
                    if !sources.contains(source.as_str()) {
                        return Err(ConfigError::UnknownSource {
                            phase: name.clone(),
                            source_id: source.clone(),
                        });
                    }
                    if let Some(d) = fallback_duration {
                        check_duration(name, "fallback_duration", *d)?;
                    }
                }
                PhaseConfig::Blend {
                    name,
                    duration,
                    endpoints,
                    ..
                } => {
                    check_duration(name, "duration", *duration)?;
                    for ep in endpoints {
                        if !ids.contains(ep.object.as_str()) {
                            return Err(ConfigError::UnknownObject {
                                phase: name.clone(),
                                object: ep.object.clone(),
                            });
                        }
                        self.check_phase_ref(name, &ep.start)?;
                        self.check_phase_ref(name, &ep.end)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_phase_ref(&self, owner: &str, src: &SnapshotSourceConfig) -> Result<(), ConfigError> {
        let index = match src {
            SnapshotSourceConfig::Fixed { .. } => return Ok(()),
            SnapshotSourceConfig::PhaseStart { phase } => *phase,
            SnapshotSourceConfig::PhaseEnd { phase } => *phase,
        };
        if index < self.phases.len() {
            Ok(())
        } else {
            Err(ConfigError::InvalidRange {
                field: format!("phases.{owner}.endpoints"),
                reason: format!("phase index {index} out of range"),
            })
        }
    }
}

fn check_duration(phase: &str, field: &str, d: f32) -> Result<(), ConfigError> {
    if d.is_finite() && d >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            field: format!("phases.{phase}.{field}"),
            reason: "must be finite and >= 0".to_string(),
        })
    }
}
