//! The auxiliary "TSR robot" used for multi-link chain distances.
//!
//! A [`TsrRobot`] mirrors the link structure of one TSR chain inside a
//! given environment. Its kinematic model is built lazily by
//! [`construct`](TsrRobot::construct), at most once, and reused by every
//! later [`find_nearest_feasible_transform`](TsrRobot::find_nearest_feasible_transform)
//! call. Construction is memoized behind a `OnceLock`, so a shared
//! `&TsrRobot` can be queried from several threads.

use std::sync::OnceLock;

use nalgebra::Isometry3;
use tracing::{debug, trace};

use tsrkit_core::config::DlsConfig;
use tsrkit_core::tsr::Tsr;
use tsrkit_core::types::EnvironmentId;

use crate::chain::KinematicChain;
use crate::error::IkError;
use crate::solver::DlsSolver;

/// Kinematic helper for one TSR chain bound to one environment.
#[derive(Debug, Clone)]
pub struct TsrRobot {
    tsrs: Vec<Tsr>,
    environment: EnvironmentId,
    solver: DlsSolver,
    model: OnceLock<Result<KinematicChain, IkError>>,
}

impl TsrRobot {
    /// Create an unconstructed helper for `tsrs` in `environment`.
    pub fn new(tsrs: Vec<Tsr>, environment: EnvironmentId) -> Self {
        Self {
            tsrs,
            environment,
            solver: DlsSolver::default(),
            model: OnceLock::new(),
        }
    }

    /// Use a specific solver configuration for nearest-pose searches.
    #[must_use]
    pub fn with_config(mut self, config: DlsConfig) -> Self {
        self.solver = DlsSolver::new(config);
        self
    }

    pub const fn environment(&self) -> EnvironmentId {
        self.environment
    }

    pub fn tsrs(&self) -> &[Tsr] {
        &self.tsrs
    }

    /// Build the kinematic model if it has not been built yet.
    ///
    /// Returns `true` once a model exists. The outcome is memoized: a
    /// failed construction is not retried.
    pub fn construct(&self) -> bool {
        self.try_construct().is_ok()
    }

    /// Like [`construct`](Self::construct) but reports why it failed.
    pub fn try_construct(&self) -> Result<&KinematicChain, IkError> {
        self.model
            .get_or_init(|| {
                let built = KinematicChain::from_tsrs(&self.tsrs);
                if let Ok(chain) = &built {
                    debug!(
                        environment = %self.environment,
                        tsrs = self.tsrs.len(),
                        dof = chain.dof(),
                        "constructed TSR robot"
                    );
                }
                built
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Whether a model has been successfully constructed.
    pub fn is_constructed(&self) -> bool {
        matches!(self.model.get(), Some(Ok(_)))
    }

    /// Find the pose reachable by the chain that is closest to `target`.
    ///
    /// `target` is the desired final-link frame, i.e. the end-effector pose
    /// with the last TSR's end-effector offset removed. The search starts
    /// from the middle of every joint range and returns the pose at the
    /// final configuration whether or not it reached `target`.
    ///
    /// # Errors
    ///
    /// [`IkError::NotConstructed`] if [`construct`](Self::construct) has
    /// not succeeded.
    pub fn find_nearest_feasible_transform(
        &self,
        target: &Isometry3<f64>,
    ) -> Result<Isometry3<f64>, IkError> {
        let model = match self.model.get() {
            Some(Ok(model)) => model,
            _ => return Err(IkError::NotConstructed),
        };

        let result = self
            .solver
            .solve(model, target, &model.neutral_configuration());
        trace!(
            converged = result.converged,
            iterations = result.iterations,
            position_error = result.position_error,
            orientation_error = result.orientation_error,
            "nearest feasible transform search"
        );

        Ok(model.forward_kinematics(&result.joint_positions))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tsrkit_core::pose::{Pose, pose_from_xyz_rpy};

    fn slide(axis: usize, half_width: f64, ee_offset: Pose) -> Tsr {
        let mut bounds = [[0.0; 2]; 6];
        bounds[axis] = [-half_width, half_width];
        Tsr::new(Pose::identity(), ee_offset, bounds).unwrap()
    }

    fn two_link() -> Vec<Tsr> {
        vec![
            slide(0, 0.1, Pose::identity()),
            slide(1, 0.2, pose_from_xyz_rpy([0.0, 0.0, 0.5], [0.0; 3])),
        ]
    }

    #[test]
    fn query_before_construct_fails() {
        let robot = TsrRobot::new(two_link(), EnvironmentId(1));
        assert!(!robot.is_constructed());
        assert_eq!(
            robot.find_nearest_feasible_transform(&Pose::identity()),
            Err(IkError::NotConstructed)
        );
    }

    #[test]
    fn construct_is_memoized() {
        let robot = TsrRobot::new(two_link(), EnvironmentId(1));
        assert!(robot.construct());
        let first: *const KinematicChain = robot.try_construct().unwrap();
        let second: *const KinematicChain = robot.try_construct().unwrap();
        assert_eq!(first, second);
        assert!(robot.is_constructed());
    }

    #[test]
    fn construct_fails_for_empty_chain() {
        let robot = TsrRobot::new(Vec::new(), EnvironmentId(2));
        assert!(!robot.construct());
        assert_eq!(robot.try_construct().unwrap_err(), IkError::EmptyTsrList);
        assert!(!robot.is_constructed());
    }

    #[test]
    fn nearest_transform_of_reachable_target_is_target() {
        let robot = TsrRobot::new(two_link(), EnvironmentId(3));
        assert!(robot.construct());

        let target = pose_from_xyz_rpy([0.05, -0.15, 0.0], [0.0; 3]);
        let near = robot.find_nearest_feasible_transform(&target).unwrap();
        assert_relative_eq!(near.translation.vector, target.translation.vector, epsilon = 1e-6);
    }

    #[test]
    fn nearest_transform_saturates_outside_bounds() {
        let robot = TsrRobot::new(two_link(), EnvironmentId(3));
        assert!(robot.construct());

        let target = pose_from_xyz_rpy([0.5, 0.1, 0.0], [0.0; 3]);
        let near = robot.find_nearest_feasible_transform(&target).unwrap();
        assert_relative_eq!(near.translation.vector, Vector3::new(0.1, 0.1, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn sampled_chain_poses_are_reachable() {
        let tsrs = two_link();
        let robot = TsrRobot::new(tsrs.clone(), EnvironmentId(4));
        assert!(robot.construct());

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..10 {
            // Serial composition without the last end-effector offset
            let mut pose = *tsrs[0].origin();
            pose *= tsrs[0].sample_displacement(&mut rng) * tsrs[0].ee_offset();
            pose *= tsrs[1].sample_displacement(&mut rng);

            let near = robot.find_nearest_feasible_transform(&pose).unwrap();
            assert_relative_eq!(near.translation.vector, pose.translation.vector, epsilon = 1e-5);
        }
    }
}
