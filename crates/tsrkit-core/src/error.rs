use thiserror::Error;

/// Errors raised by TSR and TSR-chain operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TsrError {
    #[error("There are no TSRs in this TSR chain")]
    EmptyChain,

    #[error("No environment bound to TSR chain; call set_environment before computing multi-link distances")]
    EnvironmentNotSet,

    #[error("Failed to construct kinematic helper for TSR chain: {0}")]
    HelperConstruction(String),

    #[error("Invalid bounds on axis {axis}: lower={lower}, upper={upper}")]
    InvalidBounds { axis: usize, lower: f64, upper: f64 },

    #[error("IK error: {0}")]
    Ik(String),
}

impl TsrError {
    /// `true` for errors caused by using a chain before it is ready
    /// (no TSRs, or no environment for a multi-link query).
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::EmptyChain | Self::EnvironmentNotSet)
    }
}

/// Errors from reading the whitespace-delimited text format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("Invalid token for {expected}: {token:?}")]
    InvalidToken { expected: &'static str, token: String },

    #[error("Negative TSR count: {0}")]
    NegativeCount(i64),

    #[error("TSR count {count} exceeds remaining input ({remaining} tokens)")]
    CountExceedsInput { count: usize, remaining: usize },

    #[error("Invalid TSR record: {0}")]
    InvalidRecord(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid TSR: {0}")]
    Tsr(#[from] TsrError),
}
