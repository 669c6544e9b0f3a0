//! Pad interpreter configuration

use serde::{Deserialize, Serialize};

/// Packages the simulated index can install by default
pub const DEFAULT_INSTALLABLE: [&str; 4] = ["numpy", "pandas", "requests", "scipy"];

/// Interpreter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    /// Packages `install` can fetch
    pub installable_packages: Vec<String>,
    /// Whether `install` is permitted at all
    pub allow_install: bool,
    /// Seed for the `random` module; `None` seeds from the OS
    pub random_seed: Option<u64>,
    /// Longest list `range()` may build
    pub max_range_len: usize,
    /// Most items a repeated string or list may hold
    pub max_sequence_len: usize,
}

impl PadConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With installable packages
    #[must_use]
    pub fn with_installable<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installable_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// With install permission
    #[inline]
    #[must_use]
    pub fn with_allow_install(mut self, allow: bool) -> Self {
        self.allow_install = allow;
        self
    }

    /// With a cap on repeated sequences
    #[inline]
    #[must_use]
    pub fn with_max_sequence_len(mut self, len: usize) -> Self {
        self.max_sequence_len = len;
        self
    }

    /// With a fixed random seed
    #[inline]
    #[must_use]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            installable_packages: DEFAULT_INSTALLABLE.iter().map(ToString::to_string).collect(),
            allow_install: true,
            random_seed: None,
            max_range_len: 1_000_000,
            max_sequence_len: 10_000_000,
        }
    }
}
