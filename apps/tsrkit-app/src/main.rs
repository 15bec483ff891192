//! tsrkit command-line tool.
//!
//! Provides four modes of operation:
//! - `sample`: Draw goal poses from the chains in a file
//! - `distance`: Score an end-effector pose against the chains in a file
//! - `convert`: Rewrite a TOML chain definition in the text format
//! - `info`: Print workspace crate versions
//!
//! Chain files ending in `.toml` are read as a planner configuration; any
//! other file is read as a single chain in the text format.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tsrkit_core::pose::{Displacement, Pose, displacement_from_pose, pose_from_displacement};
use tsrkit_core::seed::SeedHierarchy;
use tsrkit_planning::prelude::*;

type CliResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Sample and score Task Space Region chains.
#[derive(Parser)]
#[command(name = "tsrkit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw goal poses from the goal chains in a file.
    Sample {
        /// Chain file (`.toml` configuration or text record).
        file: PathBuf,

        /// Number of poses to draw.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Random seed (overrides the configuration's seed).
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Distance from an end-effector pose to the chains in a file.
    Distance {
        /// Chain file (`.toml` configuration or text record).
        file: PathBuf,

        /// End-effector position.
        #[arg(long, required = true, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        xyz: Vec<f64>,

        /// End-effector roll, pitch and yaw in radians.
        #[arg(long, num_args = 3, value_names = ["R", "P", "Y"], allow_negative_numbers = true)]
        rpy: Option<Vec<f64>>,
    },

    /// Print the chains of a TOML configuration in the text format.
    Convert {
        /// Planner configuration.
        file: PathBuf,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// FloatingEffector
// ---------------------------------------------------------------------------

/// An end effector free to move anywhere: its six joints are the pose's
/// `[x, y, z, roll, pitch, yaw]`, so every pose has an exact IK solution.
#[derive(Debug, Default)]
struct FloatingEffector {
    q: Displacement,
}

impl RobotModel for FloatingEffector {
    fn active_dof(&self) -> usize {
        6
    }

    fn active_dof_values(&self) -> Vec<f64> {
        self.q.as_slice().to_vec()
    }

    fn set_active_dof_values(&mut self, values: &[f64]) {
        self.q = Displacement::from_iterator(values.iter().copied().chain(std::iter::repeat(0.0)));
    }

    fn end_effector_transform(&self) -> Pose {
        pose_from_displacement(&self.q)
    }

    fn find_ik_solution(&mut self, target: &Pose, _filter: IkFilter) -> Option<Vec<f64>> {
        Some(displacement_from_pose(target).as_slice().to_vec())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "FloatingEffector"
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

/// Build a goal over the chains in `path`, bound to a fresh environment.
fn load_goal(path: &Path) -> Result<TsrGoal<FloatingEffector>, Box<dyn Error>> {
    let env = Arc::new(Environment::new(FloatingEffector::default()));

    let goal = if is_toml(path) {
        let config = PlannerConfig::from_file(path)?;
        TsrGoal::from_config(Arc::clone(&env), &config)?
    } else {
        let text = std::fs::read_to_string(path)?;
        let mut chain = TsrChain::parse(&text)?;
        chain.set_environment(&*env);
        TsrGoal::from_chain(Arc::clone(&env), Arc::new(chain))
    };

    info!(
        file = %path.display(),
        environment = %env.id(),
        chains = goal.chains().len(),
        "loaded TSR chains"
    );
    Ok(goal)
}

fn format_displacement(d: &[f64]) -> String {
    d.iter()
        .map(|v| format!("{v:.6}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_sample(file: &Path, count: u32, seed: Option<u64>) -> CliResult {
    let mut goal = load_goal(file)?;
    if let Some(seed) = seed {
        goal = goal.with_seed(SeedHierarchy::new(seed).subsystem_seed(0, "goal"));
    }
    if goal.chains().is_empty() {
        return Err("no goal chains to sample from".into());
    }

    let mut state = RealVectorState::zeros(6);
    for i in 0..count {
        if goal.sample_goal(&mut state)? {
            println!("{i}: {}", format_displacement(&state.values));
        } else {
            println!("{i}: no sample");
        }
    }
    Ok(())
}

fn run_distance(file: &Path, xyz: &[f64], rpy: Option<&[f64]>) -> CliResult {
    let goal = load_goal(file)?;
    let rpy = rpy.unwrap_or(&[0.0; 3]);
    let state = RealVectorState::new(xyz.iter().chain(rpy).copied().collect());
    let pose = pose_from_displacement(&Displacement::from_column_slice(&state.values));

    for (i, chain) in goal.chains().iter().enumerate() {
        let d = chain.distance(&pose)?;
        println!(
            "chain {i}: |d|={:.6}  d=[{}]",
            d.norm(),
            format_displacement(d.as_slice())
        );
    }
    let best = goal.distance_goal(&state)?;
    println!("goal distance: {best:.6}");
    println!("satisfied: {}", goal.is_satisfied(&state)?);
    Ok(())
}

fn run_convert(file: &Path) -> CliResult {
    let config = PlannerConfig::from_file(file)?;
    for chain_config in &config.chains {
        println!("{}", TsrChain::from_config(chain_config)?);
    }
    Ok(())
}

fn run_info() {
    println!("tsrkit v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  tsrkit-core      {}", env!("CARGO_PKG_VERSION"));
    println!("  tsrkit-ik        {}", env!("CARGO_PKG_VERSION"));
    println!("  tsrkit-planning  {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sample { file, count, seed } => run_sample(&file, count, seed),
        Commands::Distance { file, xyz, rpy } => run_distance(&file, &xyz, rpy.as_deref()),
        Commands::Convert { file } => run_convert(&file),
        Commands::Info => {
            run_info();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
