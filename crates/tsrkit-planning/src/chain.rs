//! Serial composition of TSRs.
//!
//! A [`TsrChain`] samples by composing each TSR's displacement onto the
//! first TSR's origin. Distance to a single-TSR chain is that TSR's bound
//! violation; distance to a multi-TSR chain has no closed form and is found
//! by an inverse-kinematics search over a [`TsrRobot`] bound to an
//! environment with [`TsrChain::set_environment`].

use std::fmt;

use rand::Rng;
use tracing::{debug, warn};

use tsrkit_core::config::{ChainConfig, DlsConfig};
use tsrkit_core::error::{ParseError, TsrError};
use tsrkit_core::pose::{Displacement, Pose, displacement_from_pose};
use tsrkit_core::tokens::TokenReader;
use tsrkit_core::tsr::{RECORD_TOKENS, Tsr};
use tsrkit_ik::TsrRobot;

use crate::env::{Environment, RobotModel};

/// An ordered list of TSRs plus the roles the chain plays in a query.
#[derive(Debug, Clone, Default)]
pub struct TsrChain {
    initialized: bool,
    sample_start: bool,
    sample_goal: bool,
    constrain: bool,
    tsrs: Vec<Tsr>,
    /// Present once an environment is bound. Rebuilt on every rebind.
    helper: Option<TsrRobot>,
    nearest_ik: DlsConfig,
}

struct Header {
    sample_start: bool,
    sample_goal: bool,
    constrain: bool,
    count: usize,
}

fn read_header(tokens: &mut TokenReader<'_>) -> Result<Header, ParseError> {
    let sample_start = tokens.read_flag("sample_start flag")?;
    let sample_goal = tokens.read_flag("sample_goal flag")?;
    let constrain = tokens.read_flag("constrain flag")?;
    let raw = tokens.read_i64("TSR count")?;
    let count = usize::try_from(raw).map_err(|_| ParseError::NegativeCount(raw))?;

    Ok(Header {
        sample_start,
        sample_goal,
        constrain,
        count,
    })
}

impl TsrChain {
    pub fn new(sample_start: bool, sample_goal: bool, constrain: bool, tsrs: Vec<Tsr>) -> Self {
        Self {
            initialized: true,
            sample_start,
            sample_goal,
            constrain,
            tsrs,
            helper: None,
            nearest_ik: DlsConfig::default(),
        }
    }

    /// Build a chain from its TOML definition.
    pub fn from_config(config: &ChainConfig) -> Result<Self, TsrError> {
        let tsrs = config
            .tsrs
            .iter()
            .map(Tsr::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(
            config.sample_start,
            config.sample_goal,
            config.constrain,
            tsrs,
        ))
    }

    /// Solver settings for multi-TSR distance queries.
    ///
    /// Takes effect at the next [`set_environment`](Self::set_environment).
    #[must_use]
    pub fn with_nearest_ik(mut self, config: DlsConfig) -> Self {
        self.nearest_ik = config;
        self
    }

    /// Replace this chain with one read from `tokens`.
    ///
    /// Reads three `0|1` flags, a TSR count and that many TSR records.
    /// Returns `true` only if every record parsed. A record that fails to
    /// parse is kept as a default placeholder so the list length still
    /// matches the count, up to the record at which the input runs out.
    /// A malformed header (bad flag or negative count) leaves the flags
    /// cleared and the list empty.
    ///
    /// Any bound environment is dropped; call
    /// [`set_environment`](Self::set_environment) again afterwards.
    pub fn deserialize(&mut self, tokens: &mut TokenReader<'_>) -> bool {
        self.helper = None;
        self.tsrs.clear();
        self.initialized = false;
        self.sample_start = false;
        self.sample_goal = false;
        self.constrain = false;

        let header = match read_header(tokens) {
            Ok(header) => header,
            Err(e) => {
                warn!(error = %e, "rejected TSR chain header");
                return false;
            }
        };

        self.sample_start = header.sample_start;
        self.sample_goal = header.sample_goal;
        self.constrain = header.constrain;
        self.initialized = true;

        let mut all_ok = true;
        self.tsrs
            .reserve(header.count.min(tokens.remaining() / RECORD_TOKENS + 1));
        for index in 0..header.count {
            match Tsr::parse(tokens) {
                Ok(tsr) => self.tsrs.push(tsr),
                Err(e) => {
                    warn!(index, count = header.count, error = %e, "failed to read TSR record");
                    self.tsrs.push(Tsr::default());
                    all_ok = false;
                    if tokens.remaining() == 0 {
                        break;
                    }
                }
            }
        }
        all_ok
    }

    /// Parse a chain, failing on the first malformed token or record.
    ///
    /// A count the remaining input cannot hold is rejected before any
    /// record is read. Tokens after the last record are ignored.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut tokens = TokenReader::new(input);
        let header = read_header(&mut tokens)?;
        let remaining = tokens.remaining();
        if header.count.saturating_mul(RECORD_TOKENS) > remaining {
            return Err(ParseError::CountExceedsInput {
                count: header.count,
                remaining,
            });
        }
        let tsrs = (0..header.count)
            .map(|_| Tsr::parse(&mut tokens))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(
            header.sample_start,
            header.sample_goal,
            header.constrain,
            tsrs,
        ))
    }

    pub const fn sample_start(&self) -> bool {
        self.sample_start
    }

    pub const fn sample_goal(&self) -> bool {
        self.sample_goal
    }

    pub const fn constrain(&self) -> bool {
        self.constrain
    }

    pub fn tsrs(&self) -> &[Tsr] {
        &self.tsrs
    }

    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub const fn has_environment(&self) -> bool {
        self.helper.is_some()
    }

    /// Draw an end-effector pose from the chain.
    ///
    /// # Errors
    ///
    /// [`TsrError::EmptyChain`] if the chain has no TSRs.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Pose, TsrError> {
        let first = self.tsrs.first().ok_or(TsrError::EmptyChain)?;
        let mut pose = *first.origin();
        for tsr in &self.tsrs {
            pose *= tsr.sample_displacement(rng) * tsr.ee_offset();
        }
        Ok(pose)
    }

    /// Per-axis distance from `ee_pose` to the chain.
    ///
    /// # Errors
    ///
    /// [`TsrError::EmptyChain`] for an empty chain. For chains of two or more
    /// TSRs, [`TsrError::EnvironmentNotSet`] if no environment is bound and
    /// [`TsrError::HelperConstruction`] if the kinematic helper cannot be
    /// built.
    pub fn distance(&self, ee_pose: &Pose) -> Result<Displacement, TsrError> {
        match self.tsrs.as_slice() {
            [] => Err(TsrError::EmptyChain),
            [tsr] => Ok(tsr.distance(ee_pose)),
            [.., last] => {
                let helper = self.helper.as_ref().ok_or(TsrError::EnvironmentNotSet)?;
                helper
                    .try_construct()
                    .map_err(|e| TsrError::HelperConstruction(e.to_string()))?;

                debug!(
                    environment = %helper.environment(),
                    tsrs = self.tsrs.len(),
                    "solving IK to compute distance"
                );
                let target = ee_pose * last.ee_offset().inverse();
                let nearest = helper
                    .find_nearest_feasible_transform(&target)
                    .map_err(|e| TsrError::Ik(e.to_string()))?;
                Ok(displacement_from_pose(&(nearest.inverse() * target)))
            }
        }
    }

    /// Bind the chain to `env`, replacing any previous binding.
    pub fn set_environment<R: RobotModel>(&mut self, env: &Environment<R>) {
        self.helper =
            Some(TsrRobot::new(self.tsrs.clone(), env.id()).with_config(self.nearest_ik.clone()));
    }
}

impl fmt::Display for TsrChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            u8::from(self.sample_start),
            u8::from(self.sample_goal),
            u8::from(self.constrain),
            self.tsrs.len()
        )?;
        for tsr in &self.tsrs {
            write!(f, " {tsr}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::CartesianArm;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tsrkit_core::pose::pose_from_xyz_rpy;

    fn slide(axis: usize, half_width: f64) -> Tsr {
        let mut bounds = [[0.0; 2]; 6];
        bounds[axis] = [-half_width, half_width];
        Tsr::new(Pose::identity(), Pose::identity(), bounds).unwrap()
    }

    fn grasp_tsr() -> Tsr {
        Tsr::new(
            pose_from_xyz_rpy([0.5, 0.1, 0.8], [0.0, 0.0, 0.4]),
            pose_from_xyz_rpy([0.0, 0.0, 0.15], [0.0, 0.0, 0.0]),
            [
                [-0.05, 0.05],
                [0.0, 0.0],
                [-0.1, 0.0],
                [0.0, 0.0],
                [0.0, 0.0],
                [-3.0, 3.0],
            ],
        )
        .unwrap()
    }

    fn two_link() -> TsrChain {
        TsrChain::new(false, true, false, vec![slide(0, 0.1), slide(1, 0.2)])
    }

    #[test]
    fn default_chain_is_empty_and_uninitialized() {
        let chain = TsrChain::default();
        assert!(!chain.is_initialized());
        assert!(chain.tsrs().is_empty());
        assert!(!chain.has_environment());
    }

    #[test]
    fn single_tsr_samples_have_zero_distance() {
        let chain = TsrChain::new(true, false, false, vec![grasp_tsr()]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let pose = chain.sample(&mut rng).unwrap();
            let d = chain.distance(&pose).unwrap();
            assert_relative_eq!(d, Displacement::zeros(), epsilon = 1e-9);
        }
    }

    #[test]
    fn sample_composes_displacements_and_offsets() {
        let first = Tsr::new(
            pose_from_xyz_rpy([1.0, 0.0, 0.0], [0.0; 3]),
            pose_from_xyz_rpy([0.0, 0.0, 0.5], [0.0; 3]),
            [[0.0; 2]; 6],
        )
        .unwrap();
        // Origins after the first are not part of the composition
        let second = Tsr::new(
            pose_from_xyz_rpy([9.0, 9.0, 9.0], [0.0; 3]),
            pose_from_xyz_rpy([0.0, 0.2, 0.0], [0.0; 3]),
            [[0.0; 2]; 6],
        )
        .unwrap();
        let chain = TsrChain::new(false, true, false, vec![first, second]);

        let pose = chain.sample(&mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        assert_relative_eq!(pose.translation.vector.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(pose.translation.vector.y, 0.2, epsilon = 1e-12);
        assert_relative_eq!(pose.translation.vector.z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn empty_chain_is_invalid_state() {
        let chain = TsrChain::new(false, true, false, Vec::new());
        let err = chain.sample(&mut ChaCha8Rng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, TsrError::EmptyChain);
        assert!(err.is_invalid_state());

        let err = chain.distance(&Pose::identity()).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn multi_tsr_distance_requires_environment() {
        let mut chain = two_link();
        let err = chain.distance(&Pose::identity()).unwrap_err();
        assert_eq!(err, TsrError::EnvironmentNotSet);
        assert!(err.is_invalid_state());

        let env = Environment::new(CartesianArm::new());
        chain.set_environment(&env);
        assert!(chain.has_environment());
        assert!(chain.distance(&Pose::identity()).is_ok());
    }

    #[test]
    fn multi_tsr_distance_reachable_is_zero() {
        let mut chain = two_link();
        chain.set_environment(&Environment::new(CartesianArm::new()));

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..5 {
            let pose = chain.sample(&mut rng).unwrap();
            let d = chain.distance(&pose).unwrap();
            assert!(d.norm() < 1e-5, "residual {}", d.norm());
        }
    }

    #[test]
    fn multi_tsr_distance_unreachable_is_residual() {
        let mut chain = two_link();
        chain.set_environment(&Environment::new(CartesianArm::new()));

        let d = chain
            .distance(&pose_from_xyz_rpy([0.5, 0.1, 0.0], [0.0; 3]))
            .unwrap();
        assert_relative_eq!(d[0], 0.4, epsilon = 1e-5);
        assert_relative_eq!(d[1], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn rebinding_replaces_helper() {
        let mut chain = two_link();
        let a = Environment::new(CartesianArm::new());
        let b = Environment::new(CartesianArm::new());
        chain.set_environment(&a);
        assert!(chain.distance(&Pose::identity()).is_ok());
        chain.set_environment(&b);
        assert!(chain.has_environment());
        assert!(chain.distance(&Pose::identity()).is_ok());
    }

    #[test]
    fn deserialize_reads_flags_and_records() {
        let text = format!("1 0 1 2 {} {}", grasp_tsr(), slide(5, 1.0));
        let mut chain = TsrChain::default();
        assert!(chain.deserialize(&mut TokenReader::new(&text)));

        assert!(chain.is_initialized());
        assert!(chain.sample_start());
        assert!(!chain.sample_goal());
        assert!(chain.constrain());
        assert_eq!(chain.tsrs().len(), 2);
        assert_eq!(chain.tsrs()[1].bounds()[5], [-1.0, 1.0]);
    }

    #[test]
    fn deserialize_bad_second_record_returns_false() {
        // Inverted yaw bound on the second record
        let bad = slide(5, 1.0).to_string().replace(" -1 1", " 1 -1");
        let text = format!("1 0 1 2 {} {bad}", grasp_tsr());
        let mut chain = TsrChain::default();
        assert!(!chain.deserialize(&mut TokenReader::new(&text)));

        assert!(chain.sample_start());
        assert!(chain.constrain());
        assert_eq!(chain.tsrs().len(), 2);
        assert_eq!(chain.tsrs()[1], Tsr::default());
    }

    #[test]
    fn deserialize_rejects_malformed_headers() {
        let record = grasp_tsr().to_string();
        for text in [
            format!("1 0 1 -1 {record}"),
            format!("1 0 2 1 {record}"),
            "1 0".to_owned(),
        ] {
            let mut chain = two_link();
            assert!(!chain.deserialize(&mut TokenReader::new(&text)), "{text}");
            assert!(chain.tsrs().is_empty());
        }
    }

    #[test]
    fn deserialize_truncated_last_record_keeps_header() {
        let second: Vec<String> = slide(5, 1.0)
            .to_string()
            .split_whitespace()
            .take(20)
            .map(str::to_owned)
            .collect();
        let text = format!("1 0 1 2 {} {}", grasp_tsr(), second.join(" "));
        let mut chain = two_link();
        assert!(!chain.deserialize(&mut TokenReader::new(&text)));

        assert!(chain.is_initialized());
        assert!(chain.sample_start());
        assert!(!chain.sample_goal());
        assert!(chain.constrain());
        assert_eq!(chain.tsrs().len(), 2);
        assert_eq!(chain.tsrs()[0].bounds(), grasp_tsr().bounds());
        assert_eq!(chain.tsrs()[1], Tsr::default());
    }

    #[test]
    fn deserialize_oversized_count_stops_at_end_of_input() {
        let text = format!("0 1 0 1000000000 {}", grasp_tsr());
        let mut chain = TsrChain::default();
        assert!(!chain.deserialize(&mut TokenReader::new(&text)));

        assert!(chain.sample_goal());
        assert_eq!(chain.tsrs().len(), 2);
        assert_eq!(chain.tsrs()[1], Tsr::default());
    }

    #[test]
    fn deserialize_drops_bound_environment() {
        let mut chain = two_link();
        chain.set_environment(&Environment::new(CartesianArm::new()));
        let text = format!("0 1 0 1 {}", grasp_tsr());
        assert!(chain.deserialize(&mut TokenReader::new(&text)));
        assert!(!chain.has_environment());
    }

    #[test]
    fn display_then_parse_preserves_chain() {
        let chain = TsrChain::new(true, true, false, vec![grasp_tsr(), slide(2, 0.3)]);
        let parsed = TsrChain::parse(&chain.to_string()).unwrap();

        assert_eq!(parsed.tsrs().len(), 2);
        assert_eq!(parsed.sample_start(), chain.sample_start());
        assert_eq!(parsed.sample_goal(), chain.sample_goal());
        assert_relative_eq!(
            parsed.tsrs()[0].origin().to_homogeneous(),
            chain.tsrs()[0].origin().to_homogeneous(),
            epsilon = 1e-9
        );
        assert_eq!(parsed.tsrs()[1].bounds(), chain.tsrs()[1].bounds());
    }

    #[test]
    fn parse_reports_count_overflow() {
        let err = TsrChain::parse("0 1 0 3").unwrap_err();
        assert_eq!(
            err,
            ParseError::CountExceedsInput {
                count: 3,
                remaining: 0
            }
        );
    }

    #[test]
    fn from_config_builds_tsrs() {
        let config = ChainConfig {
            sample_goal: true,
            tsrs: vec![tsrkit_core::config::TsrConfig {
                bounds: [[-0.1, 0.1], [0.0; 2], [0.0; 2], [0.0; 2], [0.0; 2], [0.0; 2]],
                ..Default::default()
            }],
            ..Default::default()
        };
        let chain = TsrChain::from_config(&config).unwrap();
        assert!(chain.sample_goal());
        assert_eq!(chain.tsrs().len(), 1);
    }
}
