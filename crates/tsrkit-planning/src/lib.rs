//! TSR chains and goal regions for sampling-based planning.
//!
//! A [`TsrChain`] composes TSRs serially; a [`TsrGoal`] is a disjunction of
//! chains exposed through the [`GoalSampleableRegion`] contract. Queries
//! drive a shared robot through [`Environment::lock`] and a
//! [`RobotStateSaver`], so the robot's configuration is always restored.
//!
//! ```text
//! planner state ──► TsrGoal ──► robot FK ──► TsrChain::distance (min over chains)
//!                      └──► TsrChain::sample ──► robot IK ──► planner state
//! ```

pub mod chain;
pub mod env;
pub mod goal;
pub mod space;

#[cfg(test)]
mod mock;

pub use chain::TsrChain;
pub use env::{Environment, IkFilter, RobotModel, RobotStateSaver};
pub use goal::TsrGoal;
pub use space::{GoalRegion, GoalSampleableRegion, RealVectorState};

pub mod prelude {
    pub use crate::chain::TsrChain;
    pub use crate::env::{Environment, IkFilter, RobotModel, RobotStateSaver};
    pub use crate::goal::TsrGoal;
    pub use crate::space::{GoalRegion, GoalSampleableRegion, RealVectorState};
    pub use tsrkit_core::prelude::*;
}
