//! Error types for BranchPad Core
//!
//! Provides error handling for:
//! - Failures recorded on cells (package resolution, execution)
//! - Failures reported by an interpreter binding
//! - Rejected parameter sweeps
//! - Notebook persistence

use crate::types::CellId;

/// Failure recorded on a specific cell (or sweep result)
///
/// These never propagate out of the engine entry points; their `Display`
/// form is what ends up in `Cell::error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    /// An imported package could neither be loaded nor installed
    #[error("Error installing packages: {message}")]
    PackageResolution {
        /// Package that failed
        package: String,
        /// Interpreter message
        message: String,
    },

    /// The cell's code raised while running
    #[error("{0}")]
    Execution(String),
}

impl CellError {
    /// Stable short name for logs and reports
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PackageResolution { .. } => "PackageResolutionError",
            Self::Execution(_) => "ExecutionError",
        }
    }
}

/// Errors surfaced by an interpreter binding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpreterError {
    /// Code raised an exception
    #[error("{kind}: {message}")]
    Exception {
        /// Exception class, e.g. `NameError`
        kind: String,
        /// Exception message
        message: String,
    },

    /// Package is not loaded and cannot be imported
    #[error("No module named '{0}'")]
    PackageUnavailable(String),

    /// Package install step failed
    #[error("failed to install '{package}': {reason}")]
    InstallFailed {
        /// Package name
        package: String,
        /// Why the install failed
        reason: String,
    },

    /// Interpreter has not finished initialising
    #[error("interpreter is not ready")]
    NotReady,
}

impl InterpreterError {
    /// Create an exception error
    #[inline]
    pub fn exception(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Exception {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Parameter sweep rejected before any combination ran
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SweepError {
    /// A numeric range with a step that would never reach `max`
    #[error("parameter '{name}' has non-positive step {step}")]
    InvalidStep {
        /// Parameter name
        name: String,
        /// Offending step
        step: f64,
    },

    /// A numeric range bound is NaN or infinite
    #[error("parameter '{name}' has a non-finite range bound")]
    InvalidRange {
        /// Parameter name
        name: String,
    },

    /// The Cartesian product exceeds the configured limit
    #[error("sweep would run {requested} combinations (limit {limit})")]
    TooManyCombinations {
        /// Combinations the parameters describe
        requested: usize,
        /// Configured maximum
        limit: usize,
    },
}

/// Notebook persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed notebook JSON
    #[error("invalid notebook json: {0}")]
    Json(#[from] serde_json::Error),

    /// Cells do not form a single-rooted tree
    #[error("invalid cell tree: {0}")]
    InvalidTree(String),

    /// The same id appears twice
    #[error("duplicate cell id: {0}")]
    DuplicateCell(CellId),
}
