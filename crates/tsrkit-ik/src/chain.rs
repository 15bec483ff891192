//! Kinematic chain built from a list of TSRs.
//!
//! Each TSR becomes six joints, in the order prismatic X, Y, Z then
//! revolute Z (yaw), Y (pitch), X (roll), so that the joint product equals
//! the TSR displacement `Trans(x, y, z) * Rz(yaw) * Ry(pitch) * Rx(roll)`.
//! Joint limits are the TSR bounds. Zero-width axes are not actuated; their
//! transforms are folded into the next actuated joint's origin, the same way
//! fixed joints are handled in a robot description.
//!
//! The first joint's origin starts at the first TSR's `T0_w`. Each TSR's
//! `Tw_e`, except the last one's, is folded in after its joints. Forward
//! kinematics therefore reproduce a chain sample without the final
//! end-effector offset.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, UnitVector3, Vector3};

use tsrkit_core::tsr::{Tsr, axis_name};

use crate::error::IkError;

/// Bounds axes in joint order: x, y, z, yaw, pitch, roll.
const JOINT_AXIS_ORDER: [usize; 6] = [0, 1, 2, 5, 4, 3];

/// A single joint in the kinematic chain.
#[derive(Debug, Clone)]
pub struct ChainJoint {
    /// `tsr<index>_<axis>`, e.g. `tsr1_yaw`.
    pub name: String,
    /// Static transform from the previous joint frame to this joint frame.
    pub origin: Isometry3<f64>,
    /// Joint axis in the joint's local frame.
    pub axis: UnitVector3<f64>,
    /// Whether this is a prismatic joint (false = revolute).
    pub is_prismatic: bool,
    /// Lower position limit (rad or m).
    pub lower_limit: f64,
    /// Upper position limit (rad or m).
    pub upper_limit: f64,
}

/// An ordered kinematic chain through every TSR of a TSR chain.
#[derive(Debug, Clone)]
pub struct KinematicChain {
    /// Ordered actuated joints.
    joints: Vec<ChainJoint>,
    /// Fixed transform after the last actuated joint.
    ee_offset: Isometry3<f64>,
}

impl KinematicChain {
    /// Build the kinematic model for `tsrs`.
    ///
    /// # Errors
    ///
    /// [`IkError::EmptyTsrList`] if `tsrs` is empty, and
    /// [`IkError::InvalidLimits`] if any bound pair is non-finite or inverted.
    pub fn from_tsrs(tsrs: &[Tsr]) -> Result<Self, IkError> {
        let first = tsrs.first().ok_or(IkError::EmptyTsrList)?;

        let mut joints = Vec::new();
        let mut accumulated_fixed = *first.origin();

        for (index, tsr) in tsrs.iter().enumerate() {
            for axis_index in JOINT_AXIS_ORDER {
                let [lower, upper] = tsr.bounds()[axis_index];
                let name = format!("tsr{index}_{}", axis_name(axis_index));
                if !lower.is_finite() || !upper.is_finite() || lower > upper {
                    return Err(IkError::InvalidLimits {
                        joint: name,
                        lower,
                        upper,
                    });
                }

                let (axis, is_prismatic) = joint_axis(axis_index);
                if lower < upper {
                    joints.push(ChainJoint {
                        name,
                        origin: accumulated_fixed,
                        axis,
                        is_prismatic,
                        lower_limit: lower,
                        upper_limit: upper,
                    });
                    accumulated_fixed = Isometry3::identity();
                } else {
                    // Pinned axis: fold its constant transform
                    accumulated_fixed *= joint_transform(&axis, is_prismatic, lower);
                }
            }

            if index + 1 < tsrs.len() {
                accumulated_fixed *= tsr.ee_offset();
            }
        }

        Ok(Self {
            joints,
            ee_offset: accumulated_fixed,
        })
    }

    /// Number of actuated degrees of freedom.
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    /// Joint names in chain order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    /// Access the joint definitions.
    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    /// Fixed transform after the last actuated joint.
    pub fn ee_offset(&self) -> &Isometry3<f64> {
        &self.ee_offset
    }

    /// The configuration in the middle of every joint range.
    pub fn neutral_configuration(&self) -> Vec<f64> {
        self.joints
            .iter()
            .map(|j| 0.5 * (j.lower_limit + j.upper_limit))
            .collect()
    }

    /// Compute forward kinematics: joint positions -> final link pose.
    ///
    /// # Panics
    ///
    /// Panics if `q.len() != self.dof()`.
    pub fn forward_kinematics(&self, q: &[f64]) -> Isometry3<f64> {
        assert_eq!(q.len(), self.dof(), "q.len() must equal chain DOF");

        let mut transform = Isometry3::identity();
        for (joint, &position) in self.joints.iter().zip(q.iter()) {
            transform *= joint.origin;
            transform *= joint_transform(&joint.axis, joint.is_prismatic, position);
        }
        transform * self.ee_offset
    }

    /// Compute per-joint frames for Jacobian computation.
    ///
    /// Returns (joint_origins_in_base, joint_axes_in_base, final_pose).
    pub fn joint_frames(&self, q: &[f64]) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>, Isometry3<f64>) {
        assert_eq!(q.len(), self.dof());

        let mut transform = Isometry3::identity();
        let mut origins = Vec::with_capacity(self.dof());
        let mut axes = Vec::with_capacity(self.dof());

        for (joint, &position) in self.joints.iter().zip(q.iter()) {
            transform *= joint.origin;

            // Joint origin and axis in base frame, before the joint moves
            origins.push(transform.translation.vector);
            axes.push(transform.rotation * joint.axis.into_inner());

            transform *= joint_transform(&joint.axis, joint.is_prismatic, position);
        }

        (origins, axes, transform * self.ee_offset)
    }

    /// Clamp joint positions to their limits.
    pub fn clamp_joints(&self, q: &mut [f64]) {
        for (value, joint) in q.iter_mut().zip(self.joints.iter()) {
            *value = value.clamp(joint.lower_limit, joint.upper_limit);
        }
    }
}

/// Axis direction and joint kind for a bounds index.
fn joint_axis(axis_index: usize) -> (UnitVector3<f64>, bool) {
    match axis_index {
        0 => (Vector3::x_axis(), true),
        1 => (Vector3::y_axis(), true),
        2 => (Vector3::z_axis(), true),
        3 => (Vector3::x_axis(), false),
        4 => (Vector3::y_axis(), false),
        _ => (Vector3::z_axis(), false),
    }
}

/// Compute the transform for a single joint at a given position.
fn joint_transform(axis: &UnitVector3<f64>, is_prismatic: bool, position: f64) -> Isometry3<f64> {
    if is_prismatic {
        Isometry3::from_parts(
            Translation3::from(axis.into_inner() * position),
            UnitQuaternion::identity(),
        )
    } else {
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(axis, position),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
