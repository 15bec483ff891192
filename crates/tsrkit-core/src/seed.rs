//! Deterministic seeding for reproducible goal sampling.
//!
//! A single root seed fans out into one seed per planning query, and each
//! query seed into named subsystem seeds:
//!
//! ```text
//! Root seed
//! └── Query seed (per planning query)
//!     └── Subsystem seed ("goal", "start", ...)
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};

/// Derive a child seed from a parent seed and a string key.
///
/// # Example
///
/// ```
/// use tsrkit_core::seed::derive_seed;
///
/// let child = derive_seed(42, "goal");
/// assert_eq!(child, derive_seed(42, "goal"));
/// assert_ne!(child, derive_seed(42, "start"));
/// ```
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Root seed plus the derivation rules for query and subsystem seeds.
#[derive(Debug, Clone, Default)]
pub struct SeedHierarchy {
    root: u64,
}

impl SeedHierarchy {
    #[must_use]
    pub const fn new(root: u64) -> Self {
        Self { root }
    }

    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    #[must_use]
    pub fn query_seed(&self, query: u64) -> u64 {
        derive_seed_indexed(self.root, query)
    }

    #[must_use]
    pub fn subsystem_seed(&self, query: u64, subsystem: &str) -> u64 {
        derive_seed(self.query_seed(query), subsystem)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
