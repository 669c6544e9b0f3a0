//! BranchPad CLI
//!
//! Drives a notebook stored as a JSON file. Each invocation loads the file,
//! applies one action and, when the action changes anything, writes it back.
//!
//! # Quick Start
//!
//! ```text
//! branchpad init
//! branchpad edit root --code "x = 1"
//! branchpad run root
//! branchpad fork root
//! branchpad sweep root --param lr=0:4:2 --param layers=1,2
//! branchpad show
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod render;

pub use app::App;
pub use cli::{command, parse_param, Action, ParamSpecError};
pub use config::{CliConfig, ConfigError, DEFAULT_NOTEBOOK_FILE};
