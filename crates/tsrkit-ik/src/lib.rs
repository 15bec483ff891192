//! Auxiliary kinematics for TSR chains.
//!
//! A chain of TSRs has no closed-form distance once it has more than one
//! link: the per-link displacements are latent. This crate turns the TSR
//! list into a serial kinematic model (three prismatic and three revolute
//! joints per TSR, limited by the TSR bounds) and searches it with Damped
//! Least Squares for the reachable pose closest to a target.
//!
//! # Architecture
//!
//! ```text
//! [Tsr] ──► KinematicChain ──► DlsSolver ──► nearest feasible pose
//!                 ▲
//!             TsrRobot (memoized construction)
//! ```

pub mod chain;
pub mod error;
pub mod robot;
pub mod solver;

pub use chain::KinematicChain;
pub use error::IkError;
pub use robot::TsrRobot;
pub use solver::{DlsSolver, IkResult};
pub use tsrkit_core::config::DlsConfig;
