//! Mock robots for goal-region tests.
//!
//! Both robots count their IK calls so tests can bound how often a goal
//! queries the solver.

use tsrkit_core::pose::{Displacement, Pose, displacement_from_pose, pose_from_displacement};
use tsrkit_planning::env::{IkFilter, RobotModel};

// ---------------------------------------------------------------------------
// CartesianArm
// ---------------------------------------------------------------------------

/// A 6-DOF arm whose joints are `[x, y, z, roll, pitch, yaw]` of the
/// end effector, so FK and IK are exact and closed-form.
#[derive(Debug, Clone, Default)]
pub struct CartesianArm {
    q: [f64; 6],
    ik_calls: usize,
    reject_collisions: bool,
}

impl CartesianArm {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arm whose every configuration is in collision: IK with
    /// [`IkFilter::CheckEnvCollisions`] never succeeds.
    pub fn in_collision() -> Self {
        Self {
            reject_collisions: true,
            ..Self::default()
        }
    }

    pub const fn ik_calls(&self) -> usize {
        self.ik_calls
    }
}

impl RobotModel for CartesianArm {
    fn active_dof(&self) -> usize {
        6
    }

    fn active_dof_values(&self) -> Vec<f64> {
        self.q.to_vec()
    }

    fn set_active_dof_values(&mut self, values: &[f64]) {
        for (q, v) in self.q.iter_mut().zip(values) {
            *q = *v;
        }
    }

    fn end_effector_transform(&self) -> Pose {
        pose_from_displacement(&Displacement::from_column_slice(&self.q))
    }

    fn find_ik_solution(&mut self, target: &Pose, filter: IkFilter) -> Option<Vec<f64>> {
        self.ik_calls += 1;
        let solution = displacement_from_pose(target);
        // The search leaves the arm at its last candidate.
        self.q.copy_from_slice(solution.as_slice());
        if self.reject_collisions && filter == IkFilter::CheckEnvCollisions {
            return None;
        }
        Some(solution.as_slice().to_vec())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CartesianArm"
    }
}

// ---------------------------------------------------------------------------
// FailingIkRobot
// ---------------------------------------------------------------------------

/// A robot whose IK always fails after scrambling its joints.
#[derive(Debug, Clone)]
pub struct FailingIkRobot {
    q: Vec<f64>,
    ik_calls: usize,
}

impl FailingIkRobot {
    pub fn new(dof: usize) -> Self {
        Self {
            q: vec![0.0; dof],
            ik_calls: 0,
        }
    }

    pub const fn ik_calls(&self) -> usize {
        self.ik_calls
    }
}

impl RobotModel for FailingIkRobot {
    fn active_dof(&self) -> usize {
        self.q.len()
    }

    fn active_dof_values(&self) -> Vec<f64> {
        self.q.clone()
    }

    fn set_active_dof_values(&mut self, values: &[f64]) {
        self.q = values.to_vec();
    }

    fn end_effector_transform(&self) -> Pose {
        Pose::identity()
    }

    fn find_ik_solution(&mut self, _target: &Pose, _filter: IkFilter) -> Option<Vec<f64>> {
        self.ik_calls += 1;
        self.q.fill(f64::from(u32::try_from(self.ik_calls).unwrap_or(u32::MAX)));
        None
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "FailingIkRobot"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
