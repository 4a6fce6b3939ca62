//! CLI interface and argument parsing
//!
//! This module handles command-line parsing, task listing and help output,
//! and dispatching a task run.

pub mod app;

// Re-export main types
pub use app::*;
