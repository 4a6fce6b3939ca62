//! Error types for Runbook

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Runbook operations
pub type Result<T> = std::result::Result<T, RunbookError>;

/// Main error type for Runbook
#[derive(Error, Debug)]
pub enum RunbookError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// Command substitution errors while resolving variables
    #[error("Command substitution error: {0}")]
    Substitution(#[from] SubstitutionError),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid variables at '{key}': {reason}")]
    NamespaceFormat { key: String, reason: String },

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),
}

/// Template and variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Variable '{0}' is a map, not a value")]
    NotScalar(String),

    #[error("Invalid interpolation syntax: {0}")]
    InvalidSyntax(String),

    #[error("Circular variable reference: {0}")]
    Cycle(String),

    #[error("Variable '{key}': {source}")]
    Variable {
        key: String,
        #[source]
        source: Box<InterpolationError>,
    },

    #[error("Task '{task}' {field}: {source}")]
    Field {
        task: String,
        field: String,
        #[source]
        source: Box<InterpolationError>,
    },
}

/// Errors raised while replacing `$(...)` markers with command output
#[derive(Error, Debug)]
pub enum SubstitutionError {
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' failed with exit code {code:?}")]
    Failed { command: String, code: Option<i32> },

    #[error("Command '{0}' produced output that was not valid UTF-8")]
    InvalidUtf8(String),
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("nothing to run (add script, command, or exec key)")]
    NothingToRun,

    #[error("Could not parse exec '{0}'")]
    Parse(String),

    #[error("Executable '{0}' not found in PATH")]
    Lookup(String),

    #[error("Cannot access script '{path}': {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("{phase}: {source}")]
    Step {
        phase: String,
        #[source]
        source: Box<ExecutionError>,
    },

    #[error("Task '{task}' finished with {failures} failed step(s)")]
    TaskFailed { task: String, failures: usize },
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

/// Specialized result type for command substitution
pub type SubstitutionResult<T> = std::result::Result<T, SubstitutionError>;

impl ExecutionError {
    /// The error underneath any lifecycle phase wrappers
    pub fn root(&self) -> &ExecutionError {
        match self {
            ExecutionError::Step { source, .. } => source.root(),
            other => other,
        }
    }
}
