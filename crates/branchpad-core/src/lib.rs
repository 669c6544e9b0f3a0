//! BranchPad Core - branching notebook engine
//!
//! Cells form a tree. Each cell runs on top of a clone of its parent's
//! namespace, and this crate keeps that true as cells are:
//! - Run, re-deriving the ancestor chain and re-running the subtree
//! - Forked into two siblings with isolated contexts
//! - Snapshotted and restored
//! - Swept over parameter combinations
//!
//! The language runtime is abstracted behind [`Interpreter`].
//!
//! # Example
//!
//! ```rust,ignore
//! use branchpad_core::{CellEdit, CellId, Notebook, NotebookConfig};
//! use std::sync::Arc;
//!
//! # async fn example(interpreter: Arc<dyn branchpad_core::Interpreter>) {
//! let notebook = Notebook::new(interpreter, NotebookConfig::default());
//! let root = CellId::root();
//!
//! notebook.update_cell(&root, CellEdit::new().code("x = 1")).await;
//! notebook.run(&root).await;
//!
//! let [a, _b] = notebook.fork(&root).await.unwrap();
//! notebook.update_cell(&a, CellEdit::new().code("x = 2; print(x)")).await;
//! let report = notebook.run(&a).await;
//! println!("{} cells executed", report.executed.len());
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod export;
pub mod fork;
pub mod imports;
pub mod interpreter;
pub mod namespace;
pub mod notebook;
pub mod persist;
pub mod snapshot;
pub mod store;
pub mod sweep;
pub mod tree;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::NotebookConfig;
pub use diff::{CodeDiff, DiffLine};
pub use engine::{CellFailure, ExecutionEngine, RunReport};
pub use error::{CellError, InterpreterError, PersistError, SweepError};
pub use fork::ForkOperator;
pub use imports::scan_imports;
pub use interpreter::{Interpreter, OutputCapture, StdoutChannel};
pub use namespace::{Namespace, Value};
pub use notebook::Notebook;
pub use persist::{load_notebook, save_notebook, NotebookFile};
pub use store::{CellStore, StoreUpdate};
pub use sweep::{axis_values, combinations, SweepEngine};
pub use tree::{ancestor_chain, build_tree, descendants, TreeNode};
pub use types::{
    Cell, CellEdit, CellId, Combination, NumericRange, ParamValue, Parameter, ParameterKind,
    ParameterSweep, Snapshot, SnapshotId, SweepId, SweepRunResult,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with BranchPad Core
    pub use crate::{
        Cell, CellEdit, CellId, Interpreter, Namespace, Notebook, NotebookConfig, ParamValue,
        Parameter, RunReport, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
