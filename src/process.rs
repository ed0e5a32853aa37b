//! Child process invocation.
//!
//! [`Cmd`] describes a program, its arguments, environment overrides and
//! working directory. A [`CommandRunner`] executes it. The orchestrator only
//! ever talks to the trait, so tests can swap in
//! [`ScriptedRunner`](crate::fakes::ScriptedRunner).
//!
//! Every run is synchronous: the caller blocks until the child exits. There
//! is no timeout, so a child that never exits stalls the build.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BuildError;

/// Builder for a child process invocation.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<String>,
    envs: Vec<(String, OsString)>,
    cwd: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child only.
    pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.envs.push((key.into(), value.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_envs(&self) -> &[(String, OsString)] {
        &self.envs
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Program followed by its arguments. A non-UTF-8 program path is
    /// rendered lossily here; [`run`](Self::run) still spawns the exact path.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Shell-like rendering for log lines.
    pub fn display(&self) -> String {
        self.argv().join(" ")
    }

    /// Run with the system runner.
    pub fn run(&self) -> Result<CommandOutput, BuildError> {
        SystemRunner.run(self)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Captured output of a successful child, both streams trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// stdout followed by stderr, for tools (like `clang -v`) that report on stderr.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Executes [`Cmd`]s.
pub trait CommandRunner {
    /// Run to completion. Non-zero exit is an error.
    fn run(&self, cmd: &Cmd) -> Result<CommandOutput, BuildError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, cmd: &Cmd) -> Result<CommandOutput, BuildError> {
        (**self).run(cmd)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &Cmd) -> Result<CommandOutput, BuildError> {
        tracing::debug!("Execute command: \"{}\"", cmd.display());

        let output = cmd
            .to_command()
            .output()
            .map_err(|source| {
                tracing::debug!(
                    "failed to spawn `{}`: {}",
                    cmd.program().to_string_lossy(),
                    source
                );
                BuildError::Spawn {
                    argv: cmd.argv(),
                    source,
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            tracing::debug!("failed ({})", output.status);
            eprintln!("Command failed with error:\n {}", stderr);
            return Err(BuildError::CommandExecution {
                argv: cmd.argv(),
                code: output.status.code(),
                stderr,
            });
        }

        tracing::debug!("result: ok");
        Ok(CommandOutput { stdout, stderr })
    }
}
