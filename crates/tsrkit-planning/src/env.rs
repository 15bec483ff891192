//! The robot and environment seam.
//!
//! Goal queries temporarily drive a shared robot into candidate
//! configurations. Every such query takes the environment lock with
//! [`Environment::lock`], snapshots the robot with [`RobotStateSaver`], and
//! lets the saver restore the snapshot when it goes out of scope. Drop runs
//! on every exit path, including `?` returns and unwinding panics, and the
//! saver is always dropped before the lock guard it borrows from.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tsrkit_core::pose::Pose;
use tsrkit_core::types::EnvironmentId;

// ---------------------------------------------------------------------------
// RobotModel
// ---------------------------------------------------------------------------

/// Collision handling for inverse kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IkFilter {
    /// Accept any kinematically valid solution.
    IgnoreCollisions,
    /// Reject solutions that collide with the environment.
    #[default]
    CheckEnvCollisions,
}

/// A robot whose active manipulator can be posed and solved for.
pub trait RobotModel: Send + 'static {
    /// Number of active degrees of freedom.
    fn active_dof(&self) -> usize;

    /// Current active joint values.
    fn active_dof_values(&self) -> Vec<f64>;

    /// Set the active joint values.
    fn set_active_dof_values(&mut self, values: &[f64]);

    /// Forward kinematics of the active manipulator at the current values.
    fn end_effector_transform(&self) -> Pose;

    /// Inverse kinematics for the active manipulator.
    ///
    /// May move the robot while searching; callers snapshot the robot first.
    fn find_ik_solution(&mut self, target: &Pose, filter: IkFilter) -> Option<Vec<f64>>;

    /// Human-readable name for this robot.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// A simulation environment holding one robot behind an exclusive lock.
pub struct Environment<R> {
    id: EnvironmentId,
    robot: Mutex<R>,
}

impl<R: RobotModel> Environment<R> {
    pub fn new(robot: R) -> Self {
        Self {
            id: EnvironmentId::next(),
            robot: Mutex::new(robot),
        }
    }

    pub const fn id(&self) -> EnvironmentId {
        self.id
    }

    /// Acquire exclusive access to the environment.
    ///
    /// A poisoned lock is recovered: the robot state was restored by its
    /// saver while the panicking thread unwound.
    pub fn lock(&self) -> MutexGuard<'_, R> {
        self.robot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R> fmt::Debug for Environment<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment").field("id", &self.id).finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// RobotStateSaver
// ---------------------------------------------------------------------------

/// Scoped snapshot of a robot's active configuration.
///
/// Restores the snapshot on drop.
pub struct RobotStateSaver<'a, R: RobotModel> {
    robot: &'a mut R,
    saved: Vec<f64>,
}

impl<'a, R: RobotModel> RobotStateSaver<'a, R> {
    pub fn new(robot: &'a mut R) -> Self {
        let saved = robot.active_dof_values();
        Self { robot, saved }
    }

    /// The configuration that will be restored.
    pub fn saved(&self) -> &[f64] {
        &self.saved
    }

    /// Restore the snapshot now; it is restored again on drop.
    pub fn restore(&mut self) {
        self.robot.set_active_dof_values(&self.saved);
    }
}

impl<R: RobotModel> Drop for RobotStateSaver<'_, R> {
    fn drop(&mut self) {
        self.restore();
    }
}

impl<R: RobotModel> Deref for RobotStateSaver<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.robot
    }
}

impl<R: RobotModel> DerefMut for RobotStateSaver<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.robot
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
