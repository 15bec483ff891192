use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pose::{Pose, pose_from_xyz_rpy};
use crate::tsr::{Bounds, Tsr};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_max_sample_attempts() -> u32 {
    20
}
const fn default_max_iterations() -> u32 {
    200
}
const fn default_position_tolerance() -> f64 {
    1e-6
}
const fn default_angle_tolerance() -> f64 {
    1e-5
}
const fn default_damping() -> f64 {
    0.01
}

// ---------------------------------------------------------------------------
// PlannerConfig
// ---------------------------------------------------------------------------

/// Top-level configuration: goal sampling, the nearest-pose IK search and
/// optional chain definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Seed for goal sampling.
    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub goal: GoalConfig,

    /// Solver settings for multi-link chain distances.
    #[serde(default)]
    pub nearest_ik: DlsConfig,

    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

impl PlannerConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.goal.validate()?;
        self.nearest_ik.validate()?;
        for (i, chain) in self.chains.iter().enumerate() {
            if chain.tsrs.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("chains[{i}].tsrs"),
                    message: "a chain needs at least one TSR".into(),
                });
            }
            for tsr in &chain.tsrs {
                Tsr::try_from(tsr)?;
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// GoalConfig
// ---------------------------------------------------------------------------

/// Goal sampling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalConfig {
    /// Pose draws per `sample_goal` call before giving up (default: 20).
    #[serde(default = "default_max_sample_attempts")]
    pub max_sample_attempts: u32,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            max_sample_attempts: default_max_sample_attempts(),
        }
    }
}

impl GoalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sample_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "goal.max_sample_attempts".into(),
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DlsConfig
// ---------------------------------------------------------------------------

/// Configuration for the damped-least-squares solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DlsConfig {
    /// Maximum solver iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Position error tolerance (meters).
    #[serde(default = "default_position_tolerance")]
    pub position_tolerance: f64,
    /// Orientation error tolerance (radians).
    #[serde(default = "default_angle_tolerance")]
    pub angle_tolerance: f64,
    /// Damping factor (lambda). Higher = more robust near singularities,
    /// but slower convergence.
    #[serde(default = "default_damping")]
    pub damping: f64,
}

impl Default for DlsConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            position_tolerance: default_position_tolerance(),
            angle_tolerance: default_angle_tolerance(),
            damping: default_damping(),
        }
    }
}

impl DlsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: &str| ConfigError::InvalidValue {
            field: format!("nearest_ik.{field}"),
            message: message.into(),
        };
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be > 0"));
        }
        if !(self.position_tolerance > 0.0) {
            return Err(invalid("position_tolerance", "must be > 0"));
        }
        if !(self.angle_tolerance > 0.0) {
            return Err(invalid("angle_tolerance", "must be > 0"));
        }
        if !(self.damping >= 0.0) || !self.damping.is_finite() {
            return Err(invalid("damping", "must be finite and >= 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chain / TSR definitions
// ---------------------------------------------------------------------------

/// A frame given as translation plus roll-pitch-yaw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    #[serde(default)]
    pub xyz: [f64; 3],
    #[serde(default)]
    pub rpy: [f64; 3],
}

impl FrameConfig {
    pub fn to_pose(&self) -> Pose {
        pose_from_xyz_rpy(self.xyz, self.rpy)
    }
}

/// One TSR in a chain definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TsrConfig {
    #[serde(default)]
    pub manipulator_index: i32,
    #[serde(default)]
    pub relative_body: Option<String>,
    /// `T0_w`.
    #[serde(default)]
    pub origin: FrameConfig,
    /// `Tw_e`.
    #[serde(default)]
    pub ee_offset: FrameConfig,
    /// `[lower, upper]` per axis `[x, y, z, roll, pitch, yaw]`.
    #[serde(default)]
    pub bounds: Bounds,
}

/// A chain definition with its role flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub sample_start: bool,
    #[serde(default)]
    pub sample_goal: bool,
    #[serde(default)]
    pub constrain: bool,
    #[serde(default)]
    pub tsrs: Vec<TsrConfig>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
