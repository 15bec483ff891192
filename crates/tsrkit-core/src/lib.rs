// tsrkit-core: Pose algebra, TSR primitive, text tokens, errors, config for tsrkit.

pub mod config;
pub mod error;
pub mod pose;
pub mod seed;
pub mod tokens;
pub mod tsr;
pub mod types;

pub mod prelude {
    pub use crate::config::{ChainConfig, DlsConfig, FrameConfig, GoalConfig, PlannerConfig, TsrConfig};
    pub use crate::error::{ConfigError, ParseError, TsrError};
    pub use crate::pose::{Displacement, Pose, displacement_from_pose, rotation_from_rpy};
    pub use crate::tokens::TokenReader;
    pub use crate::tsr::{Bounds, Tsr};
    pub use crate::types::EnvironmentId;
}
