//! Configuration file parsing and discovery

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, RunbookError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["runbook.yml", "runbook.yaml"];

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
///
/// The nearest directory wins; within one directory `runbook.yml` is
/// preferred over `runbook.yaml`.
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut searched = Vec::new();

    for dir in start_dir.ancestors() {
        for file_name in CONFIG_FILE_NAMES {
            let candidate = dir.join(file_name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }
    }

    Err(ConfigError::NotFound(searched.join(", ")))
}

/// Parse a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<Config, RunbookError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_config(&contents)
}

/// Parse configuration from a string
pub fn parse_config(yaml: &str) -> Result<Config, RunbookError> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(yaml)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_config() {
        let yaml = r#"
hello:
  summary: Say hello
  command: echo "hello"
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.tasks.len(), 1);
        assert!(config.tasks.contains_key("hello"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("\n").unwrap();
        assert!(config.tasks.is_empty());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_config("hello: [unclosed");
        assert!(matches!(result, Err(RunbookError::Yaml(_))));
    }

    fn write(path: &Path) {
        fs::write(path, "test:\n  command: echo test\n").unwrap();
    }

    #[test]
    fn test_find_prefers_yml_in_same_dir() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir.path().join("runbook.yaml"));
        write(&temp_dir.path().join("runbook.yml"));

        let found = find_config_file_from(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(found, temp_dir.path().join("runbook.yml"));
    }

    #[test]
    fn test_find_nearest_ancestor_wins() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        write(&temp_dir.path().join("runbook.yml"));
        write(&temp_dir.path().join("a").join("runbook.yaml"));

        let found = find_config_file_from(nested).unwrap();
        assert_eq!(found, temp_dir.path().join("a").join("runbook.yaml"));
    }

    #[test]
    fn test_missing_file_lists_searched_paths() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("empty");
        fs::create_dir(&nested).unwrap();

        match find_config_file_from(nested.clone()) {
            Err(ConfigError::NotFound(searched)) => {
                assert!(searched.contains(&nested.join("runbook.yml").display().to_string()));
            }
            // An ancestor of the temp dir may hold a runbook file
            Ok(found) => assert!(!found.starts_with(&nested)),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}
