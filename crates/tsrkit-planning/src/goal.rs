//! A goal region defined as a disjunction of TSR chains.
//!
//! A state is in the goal when the robot's end-effector pose at that state
//! lies in at least one chain. Goal states are drawn by sampling an
//! end-effector pose from a chain chosen uniformly at random and solving
//! inverse kinematics for it.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, trace};

use tsrkit_core::config::{GoalConfig, PlannerConfig};
use tsrkit_core::error::TsrError;
use tsrkit_core::pose::Pose;
use tsrkit_core::seed::SeedHierarchy;
use tsrkit_core::tsr::Tsr;

use crate::chain::TsrChain;
use crate::env::{Environment, IkFilter, RobotModel, RobotStateSaver};
use crate::space::{GoalRegion, GoalSampleableRegion, RealVectorState};

/// Goal region over one or more TSR chains.
///
/// Uses a seeded RNG for determinism. Thread-safe via [`Mutex`].
pub struct TsrGoal<R: RobotModel> {
    chains: Vec<Arc<TsrChain>>,
    env: Arc<Environment<R>>,
    rng: Mutex<ChaCha8Rng>,
    config: GoalConfig,
}

impl<R: RobotModel> TsrGoal<R> {
    /// Goal over `chains`, seeded with 0.
    ///
    /// Multi-TSR chains must already be bound to `env` with
    /// [`TsrChain::set_environment`].
    pub fn new(env: Arc<Environment<R>>, chains: Vec<Arc<TsrChain>>) -> Self {
        Self {
            chains,
            env,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(0)),
            config: GoalConfig::default(),
        }
    }

    pub fn from_chain(env: Arc<Environment<R>>, chain: Arc<TsrChain>) -> Self {
        Self::new(env, vec![chain])
    }

    /// Goal over a single TSR.
    pub fn from_tsr(env: Arc<Environment<R>>, tsr: Tsr) -> Self {
        let chain = TsrChain::new(true, false, false, vec![tsr]);
        Self::from_chain(env, Arc::new(chain))
    }

    /// Goal over every `sample_goal` chain of a configuration, bound to `env`.
    ///
    /// The sampling seed is the `"goal"` subsystem seed of query 0 under
    /// the configuration's root seed.
    pub fn from_config(env: Arc<Environment<R>>, config: &PlannerConfig) -> Result<Self, TsrError> {
        let mut chains = Vec::new();
        for chain_config in config.chains.iter().filter(|c| c.sample_goal) {
            let mut chain =
                TsrChain::from_config(chain_config)?.with_nearest_ik(config.nearest_ik.clone());
            chain.set_environment(&*env);
            chains.push(Arc::new(chain));
        }
        Ok(Self::new(env, chains)
            .with_seed(SeedHierarchy::new(config.seed).subsystem_seed(0, "goal"))
            .with_config(config.goal.clone()))
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(ChaCha8Rng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: GoalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chains(&self) -> &[Arc<TsrChain>] {
        &self.chains
    }

    pub fn environment(&self) -> &Arc<Environment<R>> {
        &self.env
    }

    pub const fn config(&self) -> &GoalConfig {
        &self.config
    }

    /// End-effector pose of the robot at `state`; the robot is restored.
    ///
    /// Only the leading `active_dof` values of the state are applied.
    fn end_effector_at(&self, state: &RealVectorState) -> Pose {
        let mut guard = self.env.lock();
        let mut robot = RobotStateSaver::new(&mut *guard);
        let dof = robot.active_dof().min(state.values.len());
        robot.set_active_dof_values(&state.values[..dof]);
        robot.end_effector_transform()
    }

    /// Pick a chain and sample an end-effector pose from it.
    ///
    /// The RNG is held only for this draw, not for the IK solve that follows.
    fn draw_pose(&self) -> Result<(usize, Pose), TsrError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let index = if self.chains.len() > 1 {
            rng.gen_range(0..self.chains.len())
        } else {
            0
        };
        let pose = self.chains[index].sample(&mut *rng)?;
        Ok((index, pose))
    }
}

impl<R: RobotModel> GoalRegion for TsrGoal<R> {
    /// Exact comparison: any nonzero residual is outside the goal.
    fn is_satisfied(&self, state: &RealVectorState) -> Result<bool, TsrError> {
        Ok(self.distance_goal(state)? == 0.0)
    }

    /// Smallest distance norm over all chains; `+inf` with no chains.
    fn distance_goal(&self, state: &RealVectorState) -> Result<f64, TsrError> {
        if self.chains.is_empty() {
            return Ok(f64::INFINITY);
        }

        let pose = self.end_effector_at(state);
        let mut best = f64::INFINITY;
        for chain in &self.chains {
            best = best.min(chain.distance(&pose)?.norm());
        }
        Ok(best)
    }
}

impl<R: RobotModel> GoalSampleableRegion for TsrGoal<R> {
    fn sample_goal(&self, state: &mut RealVectorState) -> Result<bool, TsrError> {
        if self.chains.is_empty() {
            error!("cannot sample a goal without TSR chains");
            return Ok(false);
        }

        for attempt in 0..self.config.max_sample_attempts {
            let (index, pose) = self.draw_pose()?;

            let solution = {
                let mut guard = self.env.lock();
                let mut robot = RobotStateSaver::new(&mut *guard);
                robot.find_ik_solution(&pose, IkFilter::CheckEnvCollisions)
            };
            trace!(attempt, chain = index, found = solution.is_some(), "goal sample attempt");

            if let Some(values) = solution {
                state.values = values;
                return Ok(true);
            }
        }

        error!(
            attempts = self.config.max_sample_attempts,
            "unable to find a valid IK solution for any sampled goal pose"
        );
        Ok(false)
    }

    /// Unbounded: every call may produce a new state.
    fn max_sample_count(&self) -> usize {
        usize::MAX
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::CartesianArm;
    use tsrkit_core::config::{ChainConfig, TsrConfig};

    fn box_tsr(half_width: f64) -> Tsr {
        Tsr::new(Pose::identity(), Pose::identity(), [[-half_width, half_width]; 6]).unwrap()
    }

    fn env() -> Arc<Environment<CartesianArm>> {
        Arc::new(Environment::new(CartesianArm::new()))
    }

    #[test]
    fn from_tsr_uses_single_chain() {
        let goal = TsrGoal::from_tsr(env(), box_tsr(0.1));
        assert_eq!(goal.chains().len(), 1);
        assert!(goal.chains()[0].sample_start());
        assert!(!goal.chains()[0].sample_goal());
        assert!(!goal.chains()[0].constrain());
    }

    #[test]
    fn state_inside_box_is_satisfied() {
        let goal = TsrGoal::from_tsr(env(), box_tsr(0.1));
        let inside = RealVectorState::new(vec![0.05, 0.0, -0.05, 0.0, 0.02, 0.0]);
        assert!(goal.is_satisfied(&inside).unwrap());

        let outside = RealVectorState::new(vec![0.3, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!((goal.distance_goal(&outside).unwrap() - 0.2).abs() < 1e-9);
        assert!(!goal.is_satisfied(&outside).unwrap());
    }

    #[test]
    fn no_chains_is_infinitely_far() {
        let goal = TsrGoal::new(env(), Vec::new());
        let state = RealVectorState::zeros(6);
        assert_eq!(goal.distance_goal(&state).unwrap(), f64::INFINITY);
        assert!(!goal.is_satisfied(&state).unwrap());
    }

    #[test]
    fn distance_restores_robot() {
        let env = env();
        env.lock().set_active_dof_values(&[0.5; 6]);
        let goal = TsrGoal::from_tsr(Arc::clone(&env), box_tsr(0.1));
        goal.distance_goal(&RealVectorState::zeros(6)).unwrap();
        assert_eq!(env.lock().active_dof_values(), vec![0.5; 6]);
    }

    #[test]
    fn distance_ignores_values_past_active_dof() {
        let goal = TsrGoal::from_tsr(env(), box_tsr(0.1));
        let long = RealVectorState::new(vec![0.05, 0.0, 0.0, 0.0, 0.0, 0.0, 42.0, -3.0]);
        assert!(goal.is_satisfied(&long).unwrap());
        assert_eq!(goal.environment().lock().active_dof_values(), vec![0.0; 6]);
    }

    #[test]
    fn concurrent_goal_samples_all_succeed() {
        let goal = Arc::new(TsrGoal::from_tsr(env(), box_tsr(0.1)).with_seed(2));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let goal = Arc::clone(&goal);
                std::thread::spawn(move || {
                    let mut state = RealVectorState::zeros(6);
                    (goal.sample_goal(&mut state).unwrap(), state)
                })
            })
            .collect();

        for worker in workers {
            let (found, state) = worker.join().unwrap();
            assert!(found);
            assert!(goal.distance_goal(&state).unwrap() < 1e-9);
        }
        assert!(goal.rng.try_lock().is_ok());
    }

    #[test]
    fn sample_goal_writes_satisfying_state() {
        let goal = TsrGoal::from_tsr(env(), box_tsr(0.1)).with_seed(9);
        let mut state = RealVectorState::zeros(6);
        assert!(goal.sample_goal(&mut state).unwrap());
        assert_eq!(state.dim(), 6);
        assert!(goal.distance_goal(&state).unwrap() < 1e-9);
    }

    #[test]
    fn sample_goal_solves_once_and_restores_robot() {
        let env = env();
        env.lock().set_active_dof_values(&[0.3; 6]);
        let goal = TsrGoal::from_tsr(Arc::clone(&env), box_tsr(0.1)).with_seed(1);

        let mut state = RealVectorState::zeros(6);
        assert!(goal.sample_goal(&mut state).unwrap());
        let robot = env.lock();
        assert_eq!(robot.ik_calls(), 1);
        assert_eq!(robot.active_dof_values(), vec![0.3; 6]);
    }

    #[test]
    fn sample_goal_with_no_chains_fails_softly() {
        let goal = TsrGoal::new(env(), Vec::new());
        let mut state = RealVectorState::new(vec![1.0; 6]);
        assert!(!goal.sample_goal(&mut state).unwrap());
        assert_eq!(state.values, vec![1.0; 6]);
    }

    #[test]
    fn sample_goal_propagates_empty_chain() {
        let chain = Arc::new(TsrChain::new(false, true, false, Vec::new()));
        let goal = TsrGoal::from_chain(env(), chain);
        let err = goal.sample_goal(&mut RealVectorState::zeros(6)).unwrap_err();
        assert_eq!(err, TsrError::EmptyChain);
    }

    #[test]
    fn max_sample_count_is_unbounded() {
        let goal = TsrGoal::from_tsr(env(), box_tsr(0.1));
        assert_eq!(goal.max_sample_count(), usize::MAX);
        assert!(goal.could_sample());
    }

    #[test]
    fn from_config_keeps_goal_chains_only() {
        let tsr = TsrConfig {
            bounds: [[-0.1, 0.1]; 6],
            ..Default::default()
        };
        let config = PlannerConfig {
            seed: 4,
            goal: GoalConfig {
                max_sample_attempts: 3,
            },
            chains: vec![
                ChainConfig {
                    sample_goal: true,
                    tsrs: vec![tsr.clone(), tsr.clone()],
                    ..Default::default()
                },
                ChainConfig {
                    sample_start: true,
                    tsrs: vec![tsr],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let goal = TsrGoal::from_config(env(), &config).unwrap();
        assert_eq!(goal.chains().len(), 1);
        assert!(goal.chains()[0].has_environment());
        assert_eq!(goal.config().max_sample_attempts, 3);
    }
}
