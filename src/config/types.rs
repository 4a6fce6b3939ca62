//! Core configuration types
//!
//! This module defines the data structures that represent a runbook.yml file.
//! Every root key other than `variables` and `templates` names a task.

use crate::error::ConfigResult;
use crate::vars::Namespace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root key reserved for the variable namespace
pub const VARIABLES_KEY: &str = "variables";

/// Root key reserved for list/help templates, which are read and ignored
pub const TEMPLATES_KEY: &str = "templates";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// User-defined variables, resolved before any task is interpolated
    ///
    /// Kept as raw YAML so decode failures surface as `NamespaceFormat`.
    #[serde(default, skip_serializing_if = "serde_yaml::Value::is_null")]
    pub variables: serde_yaml::Value,

    /// Custom output templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<serde_yaml::Value>,

    /// Tasks keyed by name
    #[serde(flatten)]
    pub tasks: BTreeMap<String, Task>,
}

impl Config {
    /// Decode the `variables` section into a namespace
    pub fn namespace(&self) -> ConfigResult<Namespace> {
        Namespace::from_yaml(&self.variables)
    }
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    /// One-line description for task listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Argument synopsis for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Usage examples for help text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,

    /// Environment entries (`KEY=VALUE`) for every step of the task
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_env"
    )]
    pub env: Vec<String>,

    /// Steps run before the main command
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_steps"
    )]
    pub before: Vec<Step>,

    /// Steps run after the main command, even if earlier steps failed
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_steps"
    )]
    pub after: Vec<Step>,

    /// Shell command to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Script file to run, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// Binary to run in place of this process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,
}

/// A before or after step
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,
}

/// A usage example shown in task help
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Example {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub command: String,
}

/// Custom deserializer for steps that handles a single step or a list
///
/// A plain string is shorthand for `{ command: ... }`.
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<Step>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    fn step(value: Value) -> Result<Step, serde_yaml::Error> {
        match value {
            Value::String(s) => Ok(Step {
                command: Some(s),
                ..Step::default()
            }),
            other => Step::deserialize(other),
        }
    }

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(_) | Value::Mapping(_) => Ok(vec![step(value).map_err(D::Error::custom)?]),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| step(item).map_err(D::Error::custom))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("steps must be a string, object, or array")),
    }
}

/// Custom deserializer for env that accepts `KEY=VALUE` strings or a mapping
fn deserialize_env<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => Some(String::new()),
            _ => None,
        }
    }

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::Sequence(seq) => seq
            .iter()
            .map(|item| scalar(item).ok_or_else(|| D::Error::custom("env entries must be strings")))
            .collect(),
        Value::Mapping(map) => map
            .iter()
            .map(|(key, value)| match (scalar(key), scalar(value)) {
                (Some(key), Some(value)) => Ok(format!("{}={}", key, value)),
                _ => Err(D::Error::custom("env values must be strings")),
            })
            .collect(),
        Value::String(s) => Ok(vec![s]),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("env must be a list or a mapping")),
    }
}
