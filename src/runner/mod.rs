//! Task execution engine
//!
//! This module handles interpolating tasks with resolved variables and running
//! them: launch strategies, environment merging and the before/main/after
//! lifecycle.

pub mod env;
pub mod interpolate;
pub mod runnable;
pub mod task;

// Re-export main types
pub use env::*;
pub use interpolate::*;
pub use runnable::*;
pub use task::*;
