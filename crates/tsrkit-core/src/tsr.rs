//! The single Task Space Region primitive.
//!
//! A [`Tsr`] is an origin frame `T0_w`, an end-effector offset `Tw_e`, and a
//! six-axis box `Bw` of permissible displacements of the end-effector frame
//! relative to the origin:
//!
//! ```text
//! pose = T0_w * D * Tw_e     with  D = Trans(x, y, z) * Rz(yaw) * Ry(pitch) * Rx(roll)
//! ```
//!
//! Each axis of `D` is bounded by `[lower, upper]` in `Bw`; a zero-width
//! axis pins that degree of freedom.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;

use rand::Rng;

use crate::config::TsrConfig;
use crate::error::{ParseError, TsrError};
use crate::pose::{
    Displacement, Pose, displacement_from_pose, pose_from_displacement, pose_from_text_values,
    pose_to_text_values,
};
use crate::tokens::TokenReader;

/// Per-axis `[lower, upper]` bounds, ordered `[x, y, z, roll, pitch, yaw]`.
pub type Bounds = [[f64; 2]; 6];

/// Number of whitespace tokens in one serialized TSR record.
pub const RECORD_TOKENS: usize = 2 + 12 + 12 + 12;

const AXIS_NAMES: [&str; 6] = ["x", "y", "z", "roll", "pitch", "yaw"];

const ROLL: usize = 3;
const PITCH: usize = 4;
const YAW: usize = 5;

/// A Task Space Region.
#[derive(Debug, Clone, PartialEq)]
pub struct Tsr {
    manipulator_index: i32,
    /// Body the origin is expressed relative to. `None` means world.
    relative_body: Option<String>,
    origin: Pose,
    origin_inv: Pose,
    ee_offset: Pose,
    ee_offset_inv: Pose,
    bounds: Bounds,
}

impl Default for Tsr {
    fn default() -> Self {
        Self {
            manipulator_index: 0,
            relative_body: None,
            origin: Pose::identity(),
            origin_inv: Pose::identity(),
            ee_offset: Pose::identity(),
            ee_offset_inv: Pose::identity(),
            bounds: [[0.0; 2]; 6],
        }
    }
}

impl Tsr {
    /// Create a TSR relative to the world for manipulator 0.
    ///
    /// # Errors
    ///
    /// Returns [`TsrError::InvalidBounds`] if any bound is non-finite or
    /// `lower > upper`.
    pub fn new(origin: Pose, ee_offset: Pose, bounds: Bounds) -> Result<Self, TsrError> {
        validate_bounds(&bounds)?;
        Ok(Self {
            manipulator_index: 0,
            relative_body: None,
            origin,
            origin_inv: origin.inverse(),
            ee_offset,
            ee_offset_inv: ee_offset.inverse(),
            bounds,
        })
    }

    /// Attach the manipulator index and relative body name.
    #[must_use]
    pub fn with_manipulator(mut self, index: i32, relative_body: Option<String>) -> Self {
        self.manipulator_index = index;
        self.relative_body = relative_body;
        self
    }

    pub const fn manipulator_index(&self) -> i32 {
        self.manipulator_index
    }

    pub fn relative_body(&self) -> Option<&str> {
        self.relative_body.as_deref()
    }

    /// `T0_w`: the TSR frame in world coordinates.
    pub const fn origin(&self) -> &Pose {
        &self.origin
    }

    /// `Tw_e`: the end-effector frame relative to the TSR frame.
    pub const fn ee_offset(&self) -> &Pose {
        &self.ee_offset
    }

    pub const fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Sample a displacement `D` uniformly from the bounds box.
    pub fn sample_displacement<R: Rng + ?Sized>(&self, rng: &mut R) -> Pose {
        let mut d = Displacement::zeros();
        for (axis, [lower, upper]) in self.bounds.iter().enumerate() {
            d[axis] = if lower < upper {
                rng.gen_range(*lower..=*upper)
            } else {
                *lower
            };
        }
        pose_from_displacement(&d)
    }

    /// Sample an end-effector pose `T0_w * D * Tw_e`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Pose {
        self.origin * self.sample_displacement(rng) * self.ee_offset
    }

    /// Displacement of `ee_pose` from the TSR frame, undoing the offset.
    pub fn displacement(&self, ee_pose: &Pose) -> Displacement {
        displacement_from_pose(&(self.origin_inv * ee_pose * self.ee_offset_inv))
    }

    /// Per-axis violation of the bounds; zero on axes inside the box.
    ///
    /// Roll and yaw are compared modulo 2π, so a bound such as
    /// `[3.0, 3.5]` contains the extracted angle `3.5 - 2π`.
    pub fn distance(&self, ee_pose: &Pose) -> Displacement {
        let d = self.displacement(ee_pose);
        let mut out = Displacement::zeros();
        for (axis, &[lower, upper]) in self.bounds.iter().enumerate() {
            out[axis] = if axis == ROLL || axis == YAW {
                angular_violation(d[axis], lower, upper)
            } else {
                linear_violation(d[axis], lower, upper)
            };
        }
        out
    }

    /// Read one record in the text format:
    /// `<manip_index> <relative_body|NULL> <T0_w x12> <Tw_e x12> <Bw x12>`.
    pub fn parse(tokens: &mut TokenReader<'_>) -> Result<Self, ParseError> {
        let manipulator_index = tokens.read_i32("manipulator index")?;
        let relative_body = match tokens.next_token("relative body name")? {
            "NULL" => None,
            name => Some(name.to_owned()),
        };
        let origin = pose_from_text_values(&tokens.read_f64_array::<12>("T0_w")?);
        let ee_offset = pose_from_text_values(&tokens.read_f64_array::<12>("Tw_e")?);
        let flat = tokens.read_f64_array::<12>("Bw")?;

        let mut bounds = [[0.0; 2]; 6];
        for (axis, pair) in bounds.iter_mut().enumerate() {
            *pair = [flat[2 * axis], flat[2 * axis + 1]];
        }

        Self::new(origin, ee_offset, bounds)
            .map(|tsr| tsr.with_manipulator(manipulator_index, relative_body))
            .map_err(|e| ParseError::InvalidRecord(e.to_string()))
    }
}

fn linear_violation(value: f64, lower: f64, upper: f64) -> f64 {
    if value < lower {
        value - lower
    } else if value > upper {
        value - upper
    } else {
        0.0
    }
}

/// Signed violation of `[lower, upper]` by an angle, taking the shorter way
/// around the circle.
fn angular_violation(angle: f64, lower: f64, upper: f64) -> f64 {
    // Representative of `angle` in [lower, lower + 2π)
    let wrapped = lower + (angle - lower).rem_euclid(TAU);
    if wrapped <= upper {
        return 0.0;
    }
    let above = wrapped - upper;
    let below = wrapped - TAU - lower;
    if above <= -below { above } else { below }
}

/// Finite, ordered bounds; pitch inside `[-π/2, π/2]`; roll and yaw no
/// wider than one turn.
fn validate_bounds(bounds: &Bounds) -> Result<(), TsrError> {
    for (axis, &[lower, upper]) in bounds.iter().enumerate() {
        let invalid = !lower.is_finite()
            || !upper.is_finite()
            || lower > upper
            || (axis == PITCH && (lower < -FRAC_PI_2 || upper > FRAC_PI_2))
            || ((axis == ROLL || axis == YAW) && upper - lower > TAU);
        if invalid {
            return Err(TsrError::InvalidBounds { axis, lower, upper });
        }
    }
    Ok(())
}

impl fmt::Display for Tsr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.manipulator_index,
            self.relative_body.as_deref().unwrap_or("NULL")
        )?;
        for v in pose_to_text_values(&self.origin)
            .iter()
            .chain(pose_to_text_values(&self.ee_offset).iter())
        {
            write!(f, " {v}")?;
        }
        for [lower, upper] in &self.bounds {
            write!(f, " {lower} {upper}")?;
        }
        Ok(())
    }
}

impl TryFrom<&TsrConfig> for Tsr {
    type Error = TsrError;

    fn try_from(config: &TsrConfig) -> Result<Self, Self::Error> {
        Ok(Self::new(config.origin.to_pose(), config.ee_offset.to_pose(), config.bounds)?
            .with_manipulator(config.manipulator_index, config.relative_body.clone()))
    }
}

/// Human-readable axis name for bounds index `axis`.
pub fn axis_name(axis: usize) -> &'static str {
    AXIS_NAMES.get(axis).copied().unwrap_or("?")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
