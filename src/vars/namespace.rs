//! The variable namespace
//!
//! A namespace is an ordered map of keys to either text or a nested namespace.
//! It is decoded from the `variables` section of a runbook file.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;

/// A possibly nested map of variable values
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Namespace {
    entries: BTreeMap<String, Value>,
    /// Set once every placeholder and command marker has been replaced;
    /// cleared by any change
    #[serde(skip)]
    resolved: bool,
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Namespace {}

/// A single namespace value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Map(Namespace),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Map(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Namespace> for Value {
    fn from(ns: Namespace) -> Self {
        Value::Map(ns)
    }
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a value at the top level, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.resolved = false;
        self.entries.insert(key.into(), value.into())
    }

    /// Whether this namespace is the unchanged output of resolution
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Get a top-level value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Follow a key path through nested maps
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let value = self.entries.get(first.as_ref())?;
        if rest.is_empty() {
            return Some(value);
        }
        match value {
            Value::Map(inner) => inner.lookup(rest),
            Value::Text(_) => None,
        }
    }

    /// Follow a key path and return the text found there
    pub fn lookup_text<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_text)
    }

    /// Replace the text at an existing or new key path, creating maps on the way
    pub fn set_text(&mut self, path: &[String], text: String) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        self.resolved = false;
        if rest.is_empty() {
            self.entries.insert(first.clone(), Value::Text(text));
            return;
        }
        let entry = self
            .entries
            .entry(first.clone())
            .or_insert_with(|| Value::Map(Namespace::new()));
        if let Value::Text(_) = entry {
            *entry = Value::Map(Namespace::new());
        }
        if let Value::Map(inner) = entry {
            inner.set_text(rest, text);
        }
    }

    /// All text values with their full key paths, depth first in key order
    pub fn leaves(&self) -> Vec<(Vec<String>, &str)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a str)>) {
        for (key, value) in &self.entries {
            prefix.push(key.clone());
            match value {
                Value::Text(text) => out.push((prefix.clone(), text.as_str())),
                Value::Map(inner) => inner.collect_leaves(prefix, out),
            }
            prefix.pop();
        }
    }

    /// Decode a namespace from a YAML mapping
    ///
    /// Numbers and booleans become their textual form and `null` becomes the
    /// empty string. Sequences are rejected.
    pub fn from_yaml(value: &Yaml) -> ConfigResult<Self> {
        Self::from_yaml_at(value, "variables")
    }

    fn from_yaml_at(value: &Yaml, at: &str) -> ConfigResult<Self> {
        let mapping = match value {
            Yaml::Mapping(mapping) => mapping,
            Yaml::Null => return Ok(Namespace::new()),
            _ => {
                return Err(ConfigError::NamespaceFormat {
                    key: at.to_string(),
                    reason: "expected a mapping".to_string(),
                })
            }
        };

        let mut ns = Namespace::new();
        for (key, value) in mapping {
            let key = scalar_text(key).ok_or_else(|| ConfigError::NamespaceFormat {
                key: at.to_string(),
                reason: "keys must be strings".to_string(),
            })?;
            let path = format!("{}.{}", at, key);
            let value = match value {
                Yaml::Mapping(_) => Value::Map(Self::from_yaml_at(value, &path)?),
                other => Value::Text(scalar_text(other).ok_or_else(|| {
                    ConfigError::NamespaceFormat {
                        key: path.clone(),
                        reason: "values must be strings or mappings".to_string(),
                    }
                })?),
            };
            ns.entries.insert(key, value);
        }
        Ok(ns)
    }
}

fn scalar_text(value: &Yaml) -> Option<String> {
    match value {
        Yaml::Null => Some(String::new()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::String(s) => Some(s.clone()),
        Yaml::Sequence(_) | Yaml::Mapping(_) | Yaml::Tagged(_) => None,
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Yaml::deserialize(deserializer)?;
        Namespace::from_yaml(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nested_variables() {
        let yaml = r#"
hosts:
  prod: bastion-prod
  stage: bastion-stage
port: 8080
debug: true
empty:
"#;
        let ns: Namespace = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ns.lookup_text(&["hosts", "prod"]), Some("bastion-prod"));
        assert_eq!(ns.lookup_text(&["port"]), Some("8080"));
        assert_eq!(ns.lookup_text(&["debug"]), Some("true"));
        assert_eq!(ns.lookup_text(&["empty"]), Some(""));
        assert!(matches!(ns.lookup(&["hosts"]), Some(Value::Map(_))));
    }

    #[test]
    fn test_decode_rejects_sequences() {
        let result: Result<Namespace, _> = serde_yaml::from_str("list: [a, b]");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("variables.list"), "unexpected error: {}", err);
    }

    #[test]
    fn test_lookup_through_text_is_none() {
        let mut ns = Namespace::new();
        ns.insert("a", "text");
        assert!(ns.lookup(&["a", "b"]).is_none());
        assert!(ns.lookup::<&str>(&[]).is_none());
    }

    #[test]
    fn test_leaves_are_ordered_depth_first() {
        let mut inner = Namespace::new();
        inner.insert("y", "2");
        inner.insert("x", "1");
        let mut ns = Namespace::new();
        ns.insert("b", inner);
        ns.insert("a", "0");

        let leaves: Vec<String> = ns
            .leaves()
            .into_iter()
            .map(|(path, text)| format!("{}={}", path.join("."), text))
            .collect();
        assert_eq!(leaves, vec!["a=0", "b.x=1", "b.y=2"]);
    }

    #[test]
    fn test_set_text_creates_maps() {
        let mut ns = Namespace::new();
        ns.set_text(&["a".to_string(), "b".to_string()], "v".to_string());
        assert_eq!(ns.lookup_text(&["a", "b"]), Some("v"));
    }
}
