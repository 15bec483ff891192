//! Error types for building and searching the auxiliary kinematic model.

/// Errors from the kinematic helper.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IkError {
    /// A kinematic model needs at least one TSR.
    #[error("cannot build a kinematic chain from an empty TSR list")]
    EmptyTsrList,

    /// A joint would get a non-finite or inverted range.
    #[error("invalid joint limits on {joint}: [{lower}, {upper}]")]
    InvalidLimits { joint: String, lower: f64, upper: f64 },

    /// The model was queried before a successful `construct`.
    #[error("kinematic helper has not been constructed")]
    NotConstructed,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
