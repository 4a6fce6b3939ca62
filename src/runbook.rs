//! The loaded runbook
//!
//! A [`Runbook`] is built in two phases: the variable namespace is resolved
//! against itself, then every task is interpolated with the result. Once
//! built it is read-only.

use crate::config::{parse_config, parse_config_file, validate_config, Config};
use crate::error::{ConfigError, ExecutionError, Result};
use crate::runner::{interpolate_tasks, Task};
use crate::vars::{resolve_variables, Namespace};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved variables and interpolated tasks
#[derive(Debug, Clone)]
pub struct Runbook {
    path: Option<PathBuf>,
    variables: Namespace,
    tasks: BTreeMap<String, Task>,
}

impl Runbook {
    /// Load and build a runbook from a file
    pub fn load(path: &Path) -> Result<Self> {
        let config = parse_config_file(path)?;
        Self::build(config, Some(path))
    }

    /// Build a runbook from YAML text; `path` sets where scripts are looked up
    pub fn from_yaml(yaml: &str, path: Option<&Path>) -> Result<Self> {
        let config = parse_config(yaml)?;
        Self::build(config, path)
    }

    /// Resolve variables, then interpolate every task with them
    pub fn build(config: Config, path: Option<&Path>) -> Result<Self> {
        validate_config(&config)?;

        let variables = resolve_variables(&config.namespace()?)?;

        let mut tasks: BTreeMap<String, Task> = config
            .tasks
            .into_iter()
            .map(|(name, task)| (name.clone(), Task::from_config(name, task)))
            .collect();
        interpolate_tasks(&mut tasks, &variables)?;

        log::debug!(
            "Loaded {} task(s) and {} variable(s)",
            tasks.len(),
            variables.leaves().len()
        );

        Ok(Runbook {
            path: path.map(Path::to_path_buf),
            variables,
            tasks,
        })
    }

    /// The file this runbook was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolved variables
    pub fn variables(&self) -> &Namespace {
        &self.variables
    }

    /// Tasks in name order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Look up a task by name
    pub fn task(&self, name: &str) -> Result<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()).into())
    }

    /// Directory relative script paths resolve against
    ///
    /// This is the directory holding the runbook file, or `.` when there is none.
    pub fn lookup_path(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Run a task by name and collect its step failures
    pub fn run_task(&self, name: &str, args: &[String]) -> Result<Vec<ExecutionError>> {
        let task = self.task(name)?;
        Ok(task.run(args, &self.lookup_path()))
    }
}
