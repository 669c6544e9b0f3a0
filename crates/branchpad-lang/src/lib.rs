//! Pad - a small statement language for BranchPad notebooks
//!
//! Pad is deliberately Python-flavoured so notebook cells read naturally:
//! assignments, `print`, imports of built-in and installable modules, and
//! exceptions with familiar class names. It has no user-defined functions
//! or control flow; branching lives in the notebook tree instead.
//!
//! The crate exposes:
//! - A parser that turns source into a [`Program`].
//! - [`PadInterpreter`], which implements [`branchpad_core::Interpreter`].
//! - A simulated [`PackageIndex`] behind `import` and package installs.
//!
//! # Example
//!
//! ```rust,ignore
//! use branchpad_core::{Notebook, NotebookConfig};
//! use branchpad_lang::PadInterpreter;
//! use std::sync::Arc;
//!
//! let notebook = Notebook::new(Arc::new(PadInterpreter::default()), NotebookConfig::default());
//! ```

#![warn(unreachable_pub)]

pub mod ast;
mod builtins;
pub mod config;
pub mod error;
mod eval;
pub mod interpreter;
mod lexer;
mod ops;
pub mod packages;
mod parser;

pub use ast::{BinOp, CmpOp, Expr, Program, Stmt, UnOp};
pub use builtins::{is_builtin, BUILTIN_FUNCTIONS};
pub use config::PadConfig;
pub use error::{PadError, PadResult};
pub use interpreter::PadInterpreter;
pub use packages::{InstallError, PackageIndex, BUILTIN_MODULES};
pub use parser::parse_program;

/// Version of the Pad language
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
