//! The planner-facing goal contract.
//!
//! A planner sees a goal as a region of its configuration space that it can
//! test membership of, measure distance to, and (for sampleable goals) draw
//! configurations from.

use tsrkit_core::error::TsrError;

/// A configuration in a real-vector state space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealVectorState {
    pub values: Vec<f64>,
}

impl RealVectorState {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// A zero state of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self {
            values: vec![0.0; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

impl From<Vec<f64>> for RealVectorState {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

/// A goal region the planner can test and measure against.
pub trait GoalRegion {
    /// Whether `state` lies inside the region.
    fn is_satisfied(&self, state: &RealVectorState) -> Result<bool, TsrError>;

    /// Distance from `state` to the region; zero inside it.
    fn distance_goal(&self, state: &RealVectorState) -> Result<f64, TsrError>;
}

/// A goal region that can also produce states inside itself.
pub trait GoalSampleableRegion: GoalRegion {
    /// Try to write a goal state into `state`.
    ///
    /// Returns `Ok(false)` when no sample was found; `state` is then left
    /// unchanged.
    fn sample_goal(&self, state: &mut RealVectorState) -> Result<bool, TsrError>;

    /// Upper bound on the number of distinct samples this region can yield.
    fn max_sample_count(&self) -> usize;

    fn could_sample(&self) -> bool {
        self.max_sample_count() > 0
    }
}
