//! Task execution types and logic
//!
//! This module contains the runtime representation of tasks and the
//! before/main/after lifecycle.

use crate::config::{self, Example};
use crate::error::ExecutionError;
use crate::runner::Runnable;
use std::fmt;
use std::path::Path;

/// Runtime task representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Task name, taken from its key in the config
    pub name: String,

    /// One-line description
    pub summary: String,

    /// Argument synopsis
    pub usage: String,

    /// Usage examples
    pub examples: Vec<Example>,

    /// `KEY=VALUE` entries applied to every step
    pub env: Vec<String>,

    /// Steps run before the main runnable
    pub before: Vec<Runnable>,

    /// Steps run after the main runnable
    pub after: Vec<Runnable>,

    /// The main runnable
    pub runnable: Runnable,
}

/// Where in the lifecycle a step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before(usize),
    Main,
    After(usize),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before(i) => write!(f, "before step {}", i + 1),
            Phase::Main => write!(f, "main"),
            Phase::After(i) => write!(f, "after step {}", i + 1),
        }
    }
}

impl Task {
    /// Create a new task from configuration
    pub fn from_config(name: String, config: config::Task) -> Self {
        Task {
            name,
            summary: config.summary.unwrap_or_default(),
            usage: config.usage.unwrap_or_default(),
            examples: config.examples,
            env: config.env,
            before: config.before.into_iter().map(Runnable::from_step).collect(),
            after: config.after.into_iter().map(Runnable::from_step).collect(),
            runnable: Runnable::from_fields(config.command, config.script, config.exec),
        }
    }

    /// Run the before steps, the main runnable and the after steps
    ///
    /// A failing step does not stop the ones after it. Returns every failure in
    /// the order it happened; an empty list means the task succeeded. Only the
    /// main runnable receives `args`. Relative script paths resolve against
    /// `lookup_path`.
    pub fn run(&self, args: &[String], lookup_path: &Path) -> Vec<ExecutionError> {
        log::info!("Running task: {}", self.name);

        let mut errors = Vec::new();

        for (i, step) in self.before.iter().enumerate() {
            self.run_step(Phase::Before(i), step, &[], lookup_path, &mut errors);
        }

        self.run_step(Phase::Main, &self.runnable, args, lookup_path, &mut errors);

        for (i, step) in self.after.iter().enumerate() {
            self.run_step(Phase::After(i), step, &[], lookup_path, &mut errors);
        }

        if errors.is_empty() {
            log::debug!("Task completed: {}", self.name);
        } else {
            log::debug!("Task '{}' finished with {} failure(s)", self.name, errors.len());
        }

        errors
    }

    fn run_step(
        &self,
        phase: Phase,
        step: &Runnable,
        args: &[String],
        lookup_path: &Path,
        errors: &mut Vec<ExecutionError>,
    ) {
        log::debug!("Task '{}': {} ({})", self.name, phase, step.mode());

        if let Err(e) = step.run(lookup_path, args, &self.env) {
            log::debug!("Task '{}': {} failed: {}", self.name, phase, e);
            errors.push(ExecutionError::Step {
                phase: phase.to_string(),
                source: Box::new(e),
            });
        }
    }
}
