//! Damped Least Squares (Levenberg-Marquardt) IK solver.
//!
//! Iteratively moves the joints of a [`KinematicChain`] toward a target
//! pose using the geometric Jacobian and the DLS pseudoinverse, clamping to
//! joint limits after every step. When the target lies outside the reachable
//! set the iteration settles on a nearby in-limit configuration instead of
//! converging.

use nalgebra::{DMatrix, DVector, Isometry3, UnitQuaternion, Vector3};

use tsrkit_core::config::DlsConfig;

use crate::chain::KinematicChain;

/// Result of an IK solve.
#[derive(Debug, Clone)]
pub struct IkResult {
    /// Solved joint positions.
    pub joint_positions: Vec<f64>,
    /// Whether the solver converged within tolerance.
    pub converged: bool,
    /// Number of iterations used.
    pub iterations: u32,
    /// Final position error (meters).
    pub position_error: f64,
    /// Final orientation error (radians).
    pub orientation_error: f64,
}

/// Damped Least Squares IK solver.
#[derive(Debug, Clone, Default)]
pub struct DlsSolver {
    config: DlsConfig,
}

impl DlsSolver {
    /// Create a new solver with the given configuration.
    pub const fn new(config: DlsConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &DlsConfig {
        &self.config
    }

    /// Solve IK for the given chain and target pose.
    ///
    /// `q_init` is the starting joint configuration.
    ///
    /// # Panics
    ///
    /// Panics if `q_init.len() != chain.dof()`.
    pub fn solve(&self, chain: &KinematicChain, target: &Isometry3<f64>, q_init: &[f64]) -> IkResult {
        assert_eq!(q_init.len(), chain.dof());

        let mut q: Vec<f64> = q_init.to_vec();
        chain.clamp_joints(&mut q);

        for iteration in 0..self.config.max_iterations {
            let (origins, axes, ee_pose) = chain.joint_frames(&q);
            let (pos_err, ori_err, error_vec) = compute_error(&ee_pose, target);

            if pos_err < self.config.position_tolerance && ori_err < self.config.angle_tolerance {
                return IkResult {
                    joint_positions: q,
                    converged: true,
                    iterations: iteration,
                    position_error: pos_err,
                    orientation_error: ori_err,
                };
            }

            if chain.dof() == 0 {
                // Nothing to move
                return IkResult {
                    joint_positions: q,
                    converged: false,
                    iterations: iteration,
                    position_error: pos_err,
                    orientation_error: ori_err,
                };
            }

            let jacobian = compute_jacobian(chain, &origins, &axes, &ee_pose);

            // DLS: dq = J^T (J J^T + lambda^2 I)^{-1} * error
            let jjt = &jacobian * jacobian.transpose();
            let damped = jjt + DMatrix::identity(6, 6) * (self.config.damping * self.config.damping);
            let Some(damped_inv) = damped.try_inverse() else {
                // Singular even with damping
                return IkResult {
                    joint_positions: q,
                    converged: false,
                    iterations: iteration,
                    position_error: pos_err,
                    orientation_error: ori_err,
                };
            };

            let dq = jacobian.transpose() * damped_inv * error_vec;
            for (value, step) in q.iter_mut().zip(dq.iter()) {
                *value += step;
            }
            chain.clamp_joints(&mut q);
        }

        // Didn't converge
        let ee_pose = chain.forward_kinematics(&q);
        let (pos_err, ori_err, _) = compute_error(&ee_pose, target);

        IkResult {
            joint_positions: q,
            converged: false,
            iterations: self.config.max_iterations,
            position_error: pos_err,
            orientation_error: ori_err,
        }
    }
}

/// Compute the error vector between the current pose and the target.
///
/// Returns (position_error_norm, orientation_error_norm, error_vector).
fn compute_error(ee_pose: &Isometry3<f64>, target: &Isometry3<f64>) -> (f64, f64, DVector<f64>) {
    let pos_err = target.translation.vector - ee_pose.translation.vector;

    // Orientation error as axis-angle, in the base frame
    let rot_err = target.rotation * ee_pose.rotation.inverse();
    let ori_err = orientation_error(&rot_err);

    let error = DVector::from_column_slice(&[
        pos_err.x, pos_err.y, pos_err.z, ori_err.x, ori_err.y, ori_err.z,
    ]);
    (pos_err.norm(), ori_err.norm(), error)
}

/// Extract orientation error as a 3-vector (axis * angle) from a unit quaternion.
fn orientation_error(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    q.axis()
        .map_or_else(Vector3::zeros, |axis| axis.into_inner() * q.angle())
}

/// Compute the 6xN geometric Jacobian (linear rows, then angular rows).
fn compute_jacobian(
    chain: &KinematicChain,
    origins: &[Vector3<f64>],
    axes: &[Vector3<f64>],
    ee_pose: &Isometry3<f64>,
) -> DMatrix<f64> {
    let ee_pos = ee_pose.translation.vector;
    let mut jacobian = DMatrix::zeros(6, chain.dof());

    for (i, joint) in chain.joints().iter().enumerate() {
        let z_i = &axes[i];

        if joint.is_prismatic {
            // Linear velocity along the axis, no rotation
            jacobian[(0, i)] = z_i.x;
            jacobian[(1, i)] = z_i.y;
            jacobian[(2, i)] = z_i.z;
        } else {
            // Linear velocity: z_i x (ee_pos - o_i)
            let cross = z_i.cross(&(ee_pos - origins[i]));
            jacobian[(0, i)] = cross.x;
            jacobian[(1, i)] = cross.y;
            jacobian[(2, i)] = cross.z;

            jacobian[(3, i)] = z_i.x;
            jacobian[(4, i)] = z_i.y;
            jacobian[(5, i)] = z_i.z;
        }
    }

    jacobian
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
