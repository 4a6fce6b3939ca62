//! Configuration validation
//!
//! This module provides validation logic for configuration files.

use crate::config::types::{Config, Step, Task, TEMPLATES_KEY};
use crate::error::{ConfigError, ConfigResult};

/// Task names the command line treats specially
pub const RESERVED_TASK_NAMES: &[&str] = &["help"];

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if config.templates.is_some() {
        log::warn!(
            "Custom output templates are not supported; ignoring '{}'",
            TEMPLATES_KEY
        );
    }
    for (name, task) in &config.tasks {
        validate_task(name, task)?;
    }
    Ok(())
}

/// Validate a single task
pub fn validate_task(name: &str, task: &Task) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid("task names cannot be empty".to_string()));
    }
    if name.starts_with('-') {
        return Err(ConfigError::Invalid(format!(
            "task '{}' cannot start with '-'",
            name
        )));
    }
    if RESERVED_TASK_NAMES.contains(&name) {
        return Err(ConfigError::Invalid(format!(
            "'{}' is reserved and cannot be used as a task name",
            name
        )));
    }

    warn_on_ambiguous_fields(name, "main", &task.command, &task.script, &task.exec);
    for (i, step) in task.before.iter().enumerate() {
        warn_on_ambiguous_step(name, &format!("before step {}", i + 1), step);
    }
    for (i, step) in task.after.iter().enumerate() {
        warn_on_ambiguous_step(name, &format!("after step {}", i + 1), step);
    }

    Ok(())
}

fn warn_on_ambiguous_step(task: &str, phase: &str, step: &Step) {
    warn_on_ambiguous_fields(task, phase, &step.command, &step.script, &step.exec);
}

// Only one of exec, script and command runs; say so when several are set.
fn warn_on_ambiguous_fields(
    task: &str,
    phase: &str,
    command: &Option<String>,
    script: &Option<String>,
    exec: &Option<String>,
) {
    let set = [command, script, exec]
        .iter()
        .filter(|field| field.as_deref().map_or(false, |s| !s.is_empty()))
        .count();
    if set > 1 {
        log::warn!(
            "Task '{}' {} sets more than one of exec, script and command; only the first of those runs",
            task,
            phase
        );
    }
}
