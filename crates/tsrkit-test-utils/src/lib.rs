//! Shared test fixtures and utilities for tsrkit crates.
//!
//! Provides mock robots for the goal-region tests, canned TSRs and chain
//! records, and deterministic RNG setup.

pub mod fixtures;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{CartesianArm, FailingIkRobot};
pub use rng::seeded_rng;
