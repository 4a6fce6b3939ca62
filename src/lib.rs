//! Runbook - a YAML-based named-task runner
//!
//! Tasks are declared in a runbook.yml file together with user-defined
//! variables. Variables may reference each other and embed shell commands;
//! once resolved they are interpolated into every task, which then runs as an
//! inline shell command, a script file, or a binary that replaces the process.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runbook;
pub mod runner;
pub mod vars;

// Re-export commonly used types
pub use error::{Result, RunbookError};
pub use runbook::Runbook;

/// Current version of Runbook
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
