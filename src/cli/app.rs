//! Main CLI application

use crate::config::find_config_file;
use crate::error::ExecutionError;
use crate::runner::Task;
use crate::Runbook;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "RUNBOOK_LOG";

/// CLI application
pub struct App {
    /// The loaded runbook
    runbook: Runbook,
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print every task
    List,
    /// Print help for one task
    Help(String),
    /// Run a task with arguments
    Run { task: String, args: Vec<String> },
}

impl App {
    /// Create app with a specific config file
    pub fn with_config_file(path: PathBuf) -> anyhow::Result<Self> {
        let runbook = Runbook::load(&path)?;
        Ok(App { runbook })
    }

    /// The loaded runbook
    pub fn runbook(&self) -> &Runbook {
        &self.runbook
    }

    /// Carry out an action, printing to stdout
    pub fn execute(&self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::List => {
                print!("{}", render_list(&self.runbook));
                Ok(())
            }
            Action::Help(name) => {
                let task = self.runbook.task(&name)?;
                print!("{}", render_help(task));
                Ok(())
            }
            Action::Run { task, args } => {
                let errors = self.runbook.run_task(&task, &args)?;
                if errors.is_empty() {
                    return Ok(());
                }
                for error in &errors {
                    eprintln!("{} {}", "error:".red().bold(), error);
                }
                Err(ExecutionError::TaskFailed {
                    task,
                    failures: errors.len(),
                }
                .into())
            }
        }
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("runbook")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A YAML-based named-task runner")
        .disable_help_subcommand(true)
        .disable_version_flag(true)
        .after_help("Run `runbook help <TASK>` for help on a task.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the runbook file (default: search for runbook.yml upwards)"),
        )
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Print version")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Print debug output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("task")
                .value_name("TASK")
                .help("Task to run, or `help`"),
        )
        .arg(
            Arg::new("args")
                .value_name("ARGS")
                .help("Arguments passed to the task")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        )
}

/// Work out the action from parsed arguments
pub fn action_from_matches(matches: &ArgMatches) -> Action {
    let mut args: Vec<String> = matches
        .get_many::<String>("args")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    match matches.get_one::<String>("task").map(String::as_str) {
        None => Action::List,
        Some("help") if args.is_empty() => Action::List,
        Some("help") => Action::Help(args.remove(0)),
        Some(task) => Action::Run {
            task: task.to_string(),
            args,
        },
    }
}

/// Render the task listing
pub fn render_list(runbook: &Runbook) -> String {
    let width = runbook.tasks().map(|t| t.name.len()).max().unwrap_or(0);

    let mut out = String::from("\n");
    for task in runbook.tasks() {
        let _ = writeln!(
            out,
            "  {} – {}",
            format!("{:width$}", task.name, width = width).cyan(),
            task.summary
        );
    }
    out.push('\n');
    out
}

/// Render help for a single task
pub fn render_help(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", "Usage:".cyan());
    let _ = writeln!(out);
    let _ = writeln!(out, "    {} {}", task.name, task.usage);
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", "Description:".cyan());
    let _ = writeln!(out);
    let _ = writeln!(out, "    {}", task.summary);

    if !task.examples.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {}", "Examples:".cyan());
        for example in &task.examples {
            let _ = writeln!(out);
            let _ = writeln!(out, "    {}", example.description);
            let _ = writeln!(out, "    $ {}", example.command);
        }
    }
    let _ = writeln!(out);
    out
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None);
    // A logger may already be installed when embedded
    let _ = builder.try_init();
}

/// Run the CLI application with the process arguments
pub fn run() -> anyhow::Result<()> {
    run_from(std::env::args_os())
}

/// Run the CLI application with explicit arguments
pub fn run_from<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);
    init_logging(matches.get_flag("verbose"));

    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path.clone(),
        None => find_config_file()?,
    };
    log::debug!("Using config file {}", config_path.display());

    let app = App::with_config_file(config_path)?;
    app.execute(action_from_matches(&matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(args: &[&str]) -> Action {
        let matches = build_command().get_matches_from(args.iter().copied());
        action_from_matches(&matches)
    }

    #[test]
    fn test_no_task_lists() {
        assert_eq!(action(&["runbook"]), Action::List);
        assert_eq!(action(&["runbook", "help"]), Action::List);
    }

    #[test]
    fn test_help_for_task() {
        assert_eq!(
            action(&["runbook", "help", "deploy"]),
            Action::Help("deploy".to_string())
        );
    }

    #[test]
    fn test_run_with_args() {
        assert_eq!(
            action(&["runbook", "-c", "x.yml", "deploy", "prod", "--force"]),
            Action::Run {
                task: "deploy".to_string(),
                args: vec!["prod".to_string(), "--force".to_string()],
            }
        );
    }

    #[test]
    fn test_config_flag() {
        let matches = build_command().get_matches_from(["runbook", "--config", "other.yml"]);
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("other.yml"))
        );
        assert!(!matches.get_flag("verbose"));
    }

    #[test]
    fn test_short_v_is_version() {
        let err = build_command()
            .try_get_matches_from(["runbook", "-v"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);

        let matches = build_command()
            .try_get_matches_from(["runbook", "--verbose", "deploy"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }

    #[test]
    fn test_render_list_and_help() {
        let yaml = r#"
build:
  summary: Build it
  command: make
deploy:
  summary: Ship it
  usage: "<env>"
  examples:
    - description: Deploy to stage
      command: runbook deploy stage
  command: ./deploy.sh
"#;
        let runbook = Runbook::from_yaml(yaml, None).unwrap();

        let list = render_list(&runbook);
        assert!(list.contains("build"));
        assert!(list.contains("– Build it"));
        assert!(list.contains("– Ship it"));

        let help = render_help(runbook.task("deploy").unwrap());
        assert!(help.contains("deploy <env>"));
        assert!(help.contains("Ship it"));
        assert!(help.contains("$ runbook deploy stage"));

        let plain = render_help(runbook.task("build").unwrap());
        assert!(!plain.contains("$ "));
    }
}
