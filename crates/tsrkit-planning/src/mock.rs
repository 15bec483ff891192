//! In-crate copy of the `CartesianArm` from `tsrkit-test-utils`, which
//! cannot be a dev-dependency of this crate's unit tests. Keep the two in
//! step.

use tsrkit_core::pose::{Displacement, Pose, displacement_from_pose, pose_from_displacement};

use crate::env::{IkFilter, RobotModel};

/// Six joints mapped one-to-one onto `[x, y, z, roll, pitch, yaw]`.
#[derive(Debug, Clone, Default)]
pub struct CartesianArm {
    q: [f64; 6],
    ik_calls: usize,
}

impl CartesianArm {
    pub fn new() -> Self {
        Self::default()
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

    fn find_ik_solution(&mut self, target: &Pose, _filter: IkFilter) -> Option<Vec<f64>> {
        self.ik_calls += 1;
        let solution = displacement_from_pose(target);
        // The search leaves the arm at its last candidate.
        self.q.copy_from_slice(solution.as_slice());
        Some(solution.as_slice().to_vec())
    }
}
