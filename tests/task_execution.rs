//! Integration tests for task execution

mod common;

use common::{create_test_config, write_script};
use runbook::error::ExecutionError;
use runbook::Runbook;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn load(yaml: &str) -> (TempDir, Runbook) {
    let (dir, config_path) = create_test_config(yaml);
    let runbook = Runbook::load(&config_path).unwrap();
    (dir, runbook)
}

/// Load a runbook whose text refers to its own directory
fn load_with_dir(yaml: impl FnOnce(&Path) -> String) -> (TempDir, Runbook) {
    let (dir, config_path) = create_test_config("");
    fs::write(&config_path, yaml(dir.path())).unwrap();
    let runbook = Runbook::load(&config_path).unwrap();
    (dir, runbook)
}

#[test]
fn test_execute_simple_task() {
    let (_dir, runbook) = load(
        r#"
hello:
  command: echo "Hello, World!"
"#,
    );
    let errors = runbook.run_task("hello", &[]).unwrap();
    assert!(errors.is_empty());
}

#[test]
fn test_execute_task_with_variables() {
    let (dir, runbook) = load_with_dir(|dir| {
        format!(
            r#"
greet:
  command: echo "Hello, {{{{ .name }}}}!" > {{{{ .out }}}}
variables:
  name: Rust
  out: {}
"#,
            dir.join("greeting.txt").display()
        )
    });

    assert!(runbook.run_task("greet", &[]).unwrap().is_empty());
    let greeting = fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
    assert_eq!(greeting, "Hello, Rust!\n");
}

#[test]
fn test_execute_task_with_failing_command() {
    let (_dir, runbook) = load(
        r#"
fail:
  command: "false"
"#,
    );
    let errors = runbook.run_task("fail", &[]).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].root(),
        ExecutionError::CommandFailed(Some(1))
    ));
}

#[test]
fn test_after_runs_when_before_fails() {
    let (dir, runbook) = load_with_dir(|dir| {
        format!(
            r#"
lifecycle:
  before:
    - command: "true"
    - command: "false"
  command: "true"
  after:
    - command: echo done > {}
"#,
            dir.join("after_ran.txt").display()
        )
    });

    let errors = runbook.run_task("lifecycle", &[]).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("before step 2:"));
    assert!(dir.path().join("after_ran.txt").exists());
}

#[test]
fn test_after_runs_when_main_fails() {
    let (dir, runbook) = load_with_dir(|dir| {
        format!(
            r#"
fail_with_after:
  command: exit 7
  after: echo cleanup > {}
"#,
            dir.join("after_ran.txt").display()
        )
    });

    let errors = runbook.run_task("fail_with_after", &[]).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].root(),
        ExecutionError::CommandFailed(Some(7))
    ));
    assert!(dir.path().join("after_ran.txt").exists());
}

#[test]
fn test_task_without_runnable() {
    let (_dir, runbook) = load(
        r#"
empty:
  summary: Nothing here
"#,
    );
    let errors = runbook.run_task("empty", &[]).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].root(), ExecutionError::NothingToRun));
}

#[test]
fn test_script_relative_to_config_dir() {
    let (dir, config_path) = create_test_config("deploy:\n  script: deploy.sh\n");
    let out = dir.path().join("out.txt");
    write_script(
        dir.path(),
        "deploy.sh",
        &format!("echo \"deploying $1\" > {}\n", out.display()),
    );

    let runbook = Runbook::load(&config_path).unwrap();
    let errors = runbook.run_task("deploy", &["prod".to_string()]).unwrap();
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(fs::read_to_string(&out).unwrap(), "deploying prod\n");
}

#[test]
fn test_missing_script_is_filesystem_error() {
    let (_dir, runbook) = load(
        r#"
deploy:
  script: missing.sh
"#,
    );
    let errors = runbook.run_task("deploy", &[]).unwrap();
    assert!(matches!(errors[0].root(), ExecutionError::Filesystem { .. }));
}

#[test]
fn test_args_are_appended_to_command() {
    let (dir, runbook) = load_with_dir(|dir| {
        format!(
            r#"
echo_args:
  command: printf '%s|' > {}
"#,
            dir.join("args.txt").display()
        )
    });

    let args = vec!["one".to_string(), "two words".to_string()];
    assert!(runbook.run_task("echo_args", &args).unwrap().is_empty());
    assert_eq!(
        fs::read_to_string(dir.path().join("args.txt")).unwrap(),
        "one|two words|"
    );
}

#[test]
fn test_env_entries_reach_child() {
    let (dir, runbook) = load_with_dir(|dir| {
        format!(
            r#"
show_env:
  env:
    - "TARGET={{{{ .target }}}}"
  command: echo "$TARGET" > {}
variables:
  target: staging
"#,
            dir.join("env.txt").display()
        )
    });

    assert!(runbook.run_task("show_env", &[]).unwrap().is_empty());
    assert_eq!(
        fs::read_to_string(dir.path().join("env.txt")).unwrap(),
        "staging\n"
    );
}

#[test]
fn test_exec_lookup_failure_is_reported() {
    let (_dir, runbook) = load(
        r#"
remote:
  exec: runbook-test-missing-binary --flag
"#,
    );
    let errors = runbook.run_task("remote", &[]).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].root(), ExecutionError::Lookup(_)));
}
