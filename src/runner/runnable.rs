//! Runnable units
//!
//! A runnable is one of three ways of launching a process: inline shell text,
//! a script file, or a binary that replaces the current process.

use crate::config;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::process_env;
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs::{self, File, Metadata};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

/// Shell used for inline commands and non-executable scripts
pub const SCRIPT_SHELL: &str = "sh";

/// A single executable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runnable {
    /// Binary invocation that replaces the current process
    Exec(String),
    /// Script file, relative to the lookup path unless absolute
    Script(String),
    /// Inline shell text
    Command(String),
    /// Nothing was configured
    Invalid,
}

/// How a prepared process is launched
#[derive(Debug)]
pub enum Launch {
    /// Replace the current process image
    Replace(StdCommand),
    /// Run as a child and wait for it
    Spawn(StdCommand),
}

impl Launch {
    pub fn command(&self) -> &StdCommand {
        match self {
            Launch::Replace(cmd) | Launch::Spawn(cmd) => cmd,
        }
    }
}

impl Runnable {
    /// Pick the runnable from its optional fields
    ///
    /// Exec takes precedence over script, script over command. Empty strings
    /// count as unset.
    pub fn from_fields(
        command: Option<String>,
        script: Option<String>,
        exec: Option<String>,
    ) -> Self {
        let set = |field: Option<String>| field.filter(|s| !s.is_empty());

        if let Some(exec) = set(exec) {
            Runnable::Exec(exec)
        } else if let Some(script) = set(script) {
            Runnable::Script(script)
        } else if let Some(command) = set(command) {
            Runnable::Command(command)
        } else {
            Runnable::Invalid
        }
    }

    /// Create from a before/after step in the config
    pub fn from_step(step: config::Step) -> Self {
        Self::from_fields(step.command, step.script, step.exec)
    }

    /// Short name of the launch strategy
    pub fn mode(&self) -> &'static str {
        match self {
            Runnable::Exec(_) => "exec",
            Runnable::Script(_) => "script",
            Runnable::Command(_) => "command",
            Runnable::Invalid => "invalid",
        }
    }

    /// The configured text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Runnable::Exec(s) | Runnable::Script(s) | Runnable::Command(s) => Some(s),
            Runnable::Invalid => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            Runnable::Exec(s) | Runnable::Script(s) | Runnable::Command(s) => Some(s),
            Runnable::Invalid => None,
        }
    }

    /// Run with caller `args` and declared `env` entries
    ///
    /// Blocks until the child exits. A successful exec never returns.
    pub fn run(&self, lookup_path: &Path, args: &[String], env: &[String]) -> ExecutionResult<()> {
        let launch = self.prepare(lookup_path, args)?;
        let vars = process_env(env);

        log::debug!(
            "Running {} '{}'",
            self.mode(),
            self.text().unwrap_or_default()
        );

        match launch {
            Launch::Replace(cmd) => replace_process(cmd, vars),
            Launch::Spawn(cmd) => spawn_and_wait(cmd, vars),
        }
    }

    /// Build the process to launch without starting it
    pub fn prepare(&self, lookup_path: &Path, args: &[String]) -> ExecutionResult<Launch> {
        match self {
            Runnable::Exec(line) => exec_command(line, args).map(Launch::Replace),
            Runnable::Script(script) => script_command(script, lookup_path, args).map(Launch::Spawn),
            Runnable::Command(command) => shell_command(command, args).map(Launch::Spawn),
            Runnable::Invalid => Err(ExecutionError::NothingToRun),
        }
    }
}

fn shell_command(command: &str, args: &[String]) -> ExecutionResult<StdCommand> {
    let line = if args.is_empty() {
        command.to_string()
    } else {
        let quoted = shlex::try_join(args.iter().map(String::as_str))
            .map_err(|_| ExecutionError::Parse(args.join(" ")))?;
        format!("{} {}", command, quoted)
    };

    let mut cmd = StdCommand::new(SCRIPT_SHELL);
    cmd.arg("-c").arg(line);
    Ok(cmd)
}

fn script_command(script: &str, lookup_path: &Path, args: &[String]) -> ExecutionResult<StdCommand> {
    let path = resolve_script_path(script, lookup_path);
    let fs_error = |source| ExecutionError::Filesystem {
        path: path.clone(),
        source,
    };

    let metadata = fs::metadata(&path).map_err(fs_error)?;
    if !metadata.is_file() {
        return Err(fs_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    File::open(&path).map_err(fs_error)?;

    let cmd = if is_executable(&metadata) {
        let mut cmd = StdCommand::new(&path);
        cmd.args(args);
        cmd
    } else {
        let mut cmd = StdCommand::new(SCRIPT_SHELL);
        cmd.arg(&path).args(args);
        cmd
    };
    Ok(cmd)
}

/// Resolve a script path against the lookup path
pub fn resolve_script_path(script: &str, lookup_path: &Path) -> PathBuf {
    let script = Path::new(script);
    if script.is_absolute() {
        return script.to_path_buf();
    }
    let joined = lookup_path.join(script);
    // A bare file name would be searched on PATH when launched directly
    if joined.components().count() == 1 {
        return Path::new(".").join(joined);
    }
    joined
}

fn exec_command(line: &str, args: &[String]) -> ExecutionResult<StdCommand> {
    let tokens = shlex::split(line)
        .filter(|tokens| !tokens.is_empty())
        .ok_or_else(|| ExecutionError::Parse(line.to_string()))?;
    let (bin, rest) = tokens
        .split_first()
        .ok_or_else(|| ExecutionError::Parse(line.to_string()))?;

    let path = lookup_executable(bin).ok_or_else(|| ExecutionError::Lookup(bin.clone()))?;

    let mut cmd = StdCommand::new(path);
    set_arg0(&mut cmd, bin);
    cmd.args(rest).args(args);
    Ok(cmd)
}

/// Find `name` on `PATH`; names containing a separator are checked as paths
pub fn lookup_executable(name: &str) -> Option<PathBuf> {
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(name);
        return is_launchable(&path).then_some(path);
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| {
            // An empty PATH entry means the current directory
            if dir.as_os_str().is_empty() {
                PathBuf::from(".").join(name)
            } else {
                dir.join(name)
            }
        })
        .find(|candidate| is_launchable(candidate))
}

fn is_launchable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && (is_executable(&metadata) || cfg!(not(unix))),
        Err(_) => false,
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    false
}

#[cfg(unix)]
fn set_arg0(cmd: &mut StdCommand, arg0: &str) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(arg0);
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut StdCommand, _arg0: &str) {}

fn program_name(cmd: &StdCommand) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

fn spawn_and_wait(mut cmd: StdCommand, vars: BTreeMap<OsString, OsString>) -> ExecutionResult<()> {
    cmd.env_clear()
        .envs(vars)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let status = cmd.status().map_err(|source| ExecutionError::Spawn {
        program: program_name(&cmd),
        source,
    })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed(status.code()));
    }

    Ok(())
}

#[cfg(unix)]
fn replace_process(mut cmd: StdCommand, vars: BTreeMap<OsString, OsString>) -> ExecutionResult<()> {
    use std::os::unix::process::CommandExt;

    cmd.env_clear().envs(vars);
    // Only returns if the image could not be replaced
    let source = cmd.exec();
    Err(ExecutionError::Spawn {
        program: program_name(&cmd),
        source,
    })
}

// Without exec(2), run the binary as a foreground child and exit with its code.
#[cfg(not(unix))]
fn replace_process(mut cmd: StdCommand, vars: BTreeMap<OsString, OsString>) -> ExecutionResult<()> {
    cmd.env_clear()
        .envs(vars)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let status = cmd.status().map_err(|source| ExecutionError::Spawn {
        program: program_name(&cmd),
        source,
    })?;
    std::process::exit(status.code().unwrap_or(1));
}
